//! modelsync core library
//!
//! Client-side models kept in sync with JSON endpoints: a model fetches a
//! payload, parses it into attributes, validates local changes on request,
//! saves them back, and notifies observers along the way.
//!
//! # Quick Start
//!
//! ```text
//! let transport = transport::from_config(&Config::load()?)?;
//! let mut model = Model::new(user::mutant_user(), transport);
//!
//! model.on(EventKind::Change, |m, _| println!("{}", m.to_json()));
//! model.fetch(FetchOptions::default()).await?;
//! ```
//!
//! # Modules
//!
//! - `model`: the model and its fetch/set/save operations (main entry point)
//! - `kind`: per-type behavior (location, parse, validate)
//! - `user`: the user record and user kinds
//! - `attributes`: attribute mapping
//! - `events`: observer registry and event types
//! - `transport`: HTTP, directory and in-memory transports
//! - `router`: literal / splat route dispatch
//! - `config`: application configuration
//! - `error`: error types

pub mod attributes;
pub mod config;
pub mod error;
pub mod events;
pub mod kind;
pub mod model;
pub mod router;
pub mod transport;
pub mod user;

pub use attributes::Attributes;
pub use config::Config;
pub use error::{ParseError, SyncError, SyncResult, TransportError, ValidationError};
pub use events::{ChangeDetail, EventKind, ModelEvent, Origin, Subscription};
pub use kind::{Envelope, ModelKind, Required, Resource};
pub use model::{FetchOptions, Model, SaveOptions, SetOptions, SharedModel, SyncStatus};
pub use router::{RouteEvent, Router};
pub use transport::{DirTransport, HttpTransport, MemoryTransport, Transport, WriteMethod};
pub use user::User;
