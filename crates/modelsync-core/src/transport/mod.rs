//! Transport boundary
//!
//! Models never talk to the network directly. They read and write JSON
//! payloads at a location string (e.g. `/data/user.json`) through a
//! [`Transport`]:
//!
//! - [`HttpTransport`]: GET / POST / PUT against a base URL
//! - [`DirTransport`]: JSON files below a root directory
//! - [`MemoryTransport`]: in-process map, for tests and offline use

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::TransportError;

mod dir;
mod http;
mod memory;

pub use dir::DirTransport;
pub use http::HttpTransport;
pub use memory::MemoryTransport;

/// How a write should be applied on the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    /// Entity has no server id yet
    Create,
    /// Entity already exists remotely
    Update,
}

impl fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMethod::Create => write!(f, "create"),
            WriteMethod::Update => write!(f, "update"),
        }
    }
}

/// Read/write access to remote payloads
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the payload stored at `location`
    async fn read(&self, location: &str) -> Result<Value, TransportError>;

    /// Persist `payload` at `location`, returning the server's response body
    async fn write(
        &self,
        location: &str,
        method: WriteMethod,
        payload: &Value,
    ) -> Result<Value, TransportError>;

    /// Short description for logs and status output
    fn describe(&self) -> String;
}

/// Build the transport selected by the configuration
///
/// A configured `base_url` selects HTTP; otherwise payloads are served from
/// `data_dir`.
pub fn from_config(config: &Config) -> Result<Arc<dyn Transport>, TransportError> {
    match config.base_url {
        Some(ref base_url) => Ok(Arc::new(HttpTransport::new(base_url, config.timeout())?)),
        None => Ok(Arc::new(DirTransport::new(&config.data_dir))),
    }
}
