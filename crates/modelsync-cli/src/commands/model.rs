//! Fetch, set and save command handlers

use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use serde_json::Value;
use tracing::{debug, info};

use modelsync_core::user::{invalid_user, mutant_user, user};
use modelsync_core::{
    transport, Attributes, Config, EventKind, FetchOptions, Model, ModelEvent, ModelKind,
    SaveOptions, SetOptions, SyncError,
};

use crate::output::Output;

type DynModel = Model<Box<dyn ModelKind>>;

/// Model kinds selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Plain user record at /data/user.json
    User,
    /// User wrapped in a `data` envelope at /data/mutant_user.json
    MutantUser,
    /// User that requires a non-blank firstname
    InvalidUser,
}

impl KindArg {
    pub fn build(self) -> Box<dyn ModelKind> {
        match self {
            KindArg::User => Box::new(user()),
            KindArg::MutantUser => Box::new(mutant_user()),
            KindArg::InvalidUser => Box::new(invalid_user()),
        }
    }
}

/// Fetch a model and print it
pub async fn fetch(
    config: &Config,
    kind: KindArg,
    location: Option<String>,
    validate: bool,
    output: &Output,
) -> Result<()> {
    let mut model = open(config, kind)?;

    let mut options = FetchOptions::new().validate(validate);
    if let Some(location) = location {
        options = options.location(location);
    }
    model.fetch(options).await.map_err(sync_failure)?;

    output.print_model(&model);
    Ok(())
}

/// Fetch a model, apply `pairs`, then save unless `save` is false
pub async fn set(
    config: &Config,
    kind: KindArg,
    pairs: &[String],
    location: Option<String>,
    validate: bool,
    save: bool,
    output: &Output,
) -> Result<()> {
    let partial = parse_pairs(pairs)?;
    let mut model = open(config, kind)?;

    let mut fetch = FetchOptions::new();
    if let Some(ref location) = location {
        fetch = fetch.location(location.clone());
    }
    model.fetch(fetch).await.map_err(sync_failure)?;

    let options = if validate {
        SetOptions::validated()
    } else {
        SetOptions::default()
    };
    model
        .set(partial, options)
        .map_err(|e| anyhow!("Rejected: {}", e))?;

    if save {
        let mut options = SaveOptions::new();
        if let Some(location) = location {
            options = options.location(location);
        }
        model.save(options).await.map_err(sync_failure)?;
    }

    output.print_model(&model);
    Ok(())
}

/// Build a new model from `pairs` and save it
pub async fn save(
    config: &Config,
    kind: KindArg,
    pairs: &[String],
    location: Option<String>,
    validate: bool,
    output: &Output,
) -> Result<()> {
    let attributes = parse_pairs(pairs)?;
    let mut model = open(config, kind)?.with_attributes(attributes);

    let mut options = SaveOptions::new().validate(validate);
    if let Some(location) = location {
        options = options.location(location);
    }
    model.save(options).await.map_err(sync_failure)?;

    output.print_model(&model);
    Ok(())
}

/// Create a model over the configured transport, with log observers attached
fn open(config: &Config, kind: KindArg) -> Result<DynModel> {
    let transport = transport::from_config(config)?;
    debug!("Using {}", transport.describe());

    let model = Model::new(kind.build(), transport);
    model.on(EventKind::Change, |m, event| {
        if let ModelEvent::Change(detail) = event {
            debug!(
                "{} changed by {}: {:?}",
                m.kind().name(),
                detail.origin,
                detail.changed
            );
        }
    });
    model.on(EventKind::Invalid, |m, event| {
        if let ModelEvent::Invalid { origin, reason } = event {
            info!("{} rejected on {}: {}", m.kind().name(), origin, reason);
        }
    });
    Ok(model)
}

/// Attach the recovery hint to a sync failure
fn sync_failure(error: SyncError) -> anyhow::Error {
    match error.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n  {}", error, hint),
        None => error.into(),
    }
}

/// Parse `key=value` arguments into attributes
///
/// Values that parse as JSON keep their type (`age=31`, `tags=["a"]`,
/// `nick=null`); anything else is taken as a string.
pub fn parse_pairs(pairs: &[String]) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Expected key=value, got '{}'", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Missing attribute name in '{}'", pair);
        }
        let value = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        attributes.insert(key, value);
    }
    Ok(attributes)
}
