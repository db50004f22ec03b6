//! Models
//!
//! A [`Model`] is the client-side copy of one remote record. It owns its
//! attributes, pulls remote state with [`fetch`](Model::fetch), pushes local
//! state with [`save`](Model::save), and notifies observers through
//! `change`, `invalid` and `error` events.
//!
//! ## Usage
//!
//! ```ignore
//! let transport = Arc::new(MemoryTransport::new());
//! let mut model = Model::new(user::user(), transport);
//! model.on(EventKind::Change, |m, _| println!("{:?}", m.attributes()));
//!
//! model.fetch(FetchOptions::default()).await?;
//! model.set(Attributes::new().with("age", 29), SetOptions::default())?;
//! model.save(SaveOptions::default()).await?;
//! ```
//!
//! ## Sync status
//!
//! `Unsynced -> (fetch) -> Synced -> (set/unset) -> Dirty -> (save) -> Synced`.
//! Failed operations leave the status untouched.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attributes::{Attributes, ID_ATTRIBUTE};
use crate::error::{ParseError, SyncError, SyncResult, ValidationError};
use crate::events::{ChangeDetail, EventKind, ModelEvent, Observers, Origin, Subscription};
use crate::kind::ModelKind;
use crate::transport::{Transport, WriteMethod};

/// A model shared between tasks
///
/// Holding the lock across `fetch`/`save` serializes them.
pub type SharedModel<K> = Arc<tokio::sync::Mutex<Model<K>>>;

/// Where a model stands relative to the remote copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Never fetched or saved
    Unsynced,
    /// Matches the last fetch or save
    Synced,
    /// Changed locally since the last fetch or save
    Dirty,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Unsynced => "unsynced",
            SyncStatus::Synced => "synced",
            SyncStatus::Dirty => "dirty",
        };
        write!(f, "{}", s)
    }
}

/// Options for `set` and `unset`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Run the kind's validation before applying
    pub validate: bool,
    /// Apply without emitting `change`
    pub silent: bool,
}

impl SetOptions {
    pub fn validated() -> Self {
        Self {
            validate: true,
            silent: false,
        }
    }

    pub fn silent() -> Self {
        Self {
            validate: false,
            silent: true,
        }
    }
}

/// Options for `fetch`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Read from here instead of the kind's url
    pub location: Option<String>,
    /// Validate the fetched attributes before applying them
    pub validate: bool,
    /// Merge into existing attributes instead of replacing them
    pub merge: bool,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }
}

/// Options for `save`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Write here instead of the kind's url
    pub location: Option<String>,
    /// Validate the current attributes before writing (on by default)
    pub validate: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            location: None,
            validate: true,
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Client-side representation of a remote record
pub struct Model<K: ModelKind> {
    cid: Uuid,
    kind: K,
    transport: Arc<dyn Transport>,
    attributes: Attributes,
    changed: Vec<String>,
    status: SyncStatus,
    validation_error: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
    observers: Observers<Model<K>, ModelEvent>,
}

impl<K: ModelKind + 'static> Model<K> {
    /// Create an empty model
    pub fn new(kind: K, transport: Arc<dyn Transport>) -> Self {
        Self {
            cid: Uuid::new_v4(),
            kind,
            transport,
            attributes: Attributes::new(),
            changed: Vec::new(),
            status: SyncStatus::Unsynced,
            validation_error: None,
            last_synced_at: None,
            observers: Observers::new(),
        }
    }

    /// Start from initial attributes (no validation, no events)
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Client-side identifier
    pub fn cid(&self) -> Uuid {
        self.cid
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Default remote location
    pub fn url(&self) -> &str {
        self.kind.url()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.has(key)
    }

    /// Server-side identifier, if the record has been created remotely
    pub fn id(&self) -> Option<&Value> {
        self.attributes.get(ID_ATTRIBUTE).filter(|v| !v.is_null())
    }

    /// True until the server assigns an id
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Reason recorded by the last failed validation
    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// Attributes changed by the last successful mutation
    pub fn changed(&self) -> &[String] {
        &self.changed
    }

    pub fn has_changed(&self, key: &str) -> bool {
        self.changed.iter().any(|k| k == key)
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Attributes as a JSON object
    pub fn to_json(&self) -> Value {
        self.attributes.to_value()
    }

    /// Attributes as a typed record
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        self.attributes.to_record()
    }

    /// Register an observer
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&Model<K>, &ModelEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(kind, handler)
    }

    /// Transform a payload into attributes using this model's kind
    pub fn parse(&self, payload: Value) -> Result<Attributes, ParseError> {
        self.kind.parse(payload)
    }

    /// Check a candidate attribute set against this model's kind
    pub fn validate(&self, candidate: &Attributes) -> Option<String> {
        self.kind.validate(candidate)
    }

    /// Merge attributes
    ///
    /// With `validate`, a rejected candidate leaves the attributes unchanged,
    /// records the reason and emits `invalid` instead of `change`.
    pub fn set(&mut self, partial: Attributes, options: SetOptions) -> Result<(), ValidationError> {
        if options.validate {
            let mut candidate = self.attributes.clone();
            candidate.merge(&partial);
            self.run_validation(&candidate, Origin::Set)?;
        }

        let changed = self.attributes.merge(&partial);
        self.after_local_change(Origin::Set, changed, options);
        Ok(())
    }

    /// Remove one attribute, under the same rules as `set`
    pub fn unset(&mut self, key: &str, options: SetOptions) -> Result<(), ValidationError> {
        if options.validate {
            let mut candidate = self.attributes.clone();
            candidate.remove(key);
            self.run_validation(&candidate, Origin::Unset)?;
        }

        let changed = match self.attributes.remove(key) {
            Some(_) => vec![key.to_string()],
            None => Vec::new(),
        };
        self.after_local_change(Origin::Unset, changed, options);
        Ok(())
    }

    /// Validate the current attributes, emitting `invalid` on failure
    pub fn is_valid(&mut self) -> bool {
        let current = self.attributes.clone();
        self.run_validation(&current, Origin::Check).is_ok()
    }

    /// Pull remote state
    ///
    /// Reads the payload, parses it, and replaces the attributes (or merges
    /// into them with `merge`). Nothing changes if the read, the parse or a
    /// requested validation fails.
    pub async fn fetch(&mut self, options: FetchOptions) -> SyncResult<()> {
        let location = self.location_for(options.location.as_deref());
        debug!("Fetching {} from {}", self.kind.name(), location);

        let transport = Arc::clone(&self.transport);
        let payload = match transport.read(&location).await {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(Origin::Fetch, &location, e.into())),
        };

        let parsed = match self.kind.parse(payload) {
            Ok(attrs) => attrs,
            Err(e) => return Err(self.fail(Origin::Fetch, &location, e.into())),
        };

        let next = if options.merge {
            let mut merged = self.attributes.clone();
            merged.merge(&parsed);
            merged
        } else {
            parsed
        };

        if options.validate {
            self.run_validation(&next, Origin::Fetch)?;
        }

        let changed = self.attributes.diff_keys(&next);
        self.attributes = next;
        self.changed = changed.clone();
        self.mark_synced();
        info!(
            "Fetched {} from {} ({} attributes)",
            self.kind.name(),
            location,
            self.attributes.len()
        );

        self.emit(&ModelEvent::Change(ChangeDetail {
            origin: Origin::Fetch,
            location: Some(location),
            validate: options.validate,
            changed,
        }));
        Ok(())
    }

    /// Push local state
    ///
    /// Creates the record when it has no id, updates it otherwise. The
    /// attributes are written in the shape the kind's `parse` reads. A
    /// response that differs from what was sent is parsed and merged, so
    /// server-assigned fields (like `id`) land in the attributes.
    pub async fn save(&mut self, options: SaveOptions) -> SyncResult<()> {
        let location = self.location_for(options.location.as_deref());

        if options.validate {
            let current = self.attributes.clone();
            self.run_validation(&current, Origin::Save)?;
        }

        let method = if self.is_new() {
            WriteMethod::Create
        } else {
            WriteMethod::Update
        };
        let payload = self.kind.to_payload(&self.attributes);
        debug!("Saving {} to {} ({})", self.kind.name(), location, method);

        let transport = Arc::clone(&self.transport);
        let response = match transport.write(&location, method, &payload).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(Origin::Save, &location, e.into())),
        };

        let changed = match self.server_attributes(response, &payload, &location) {
            Some(server) => self.attributes.merge(&server),
            None => Vec::new(),
        };
        self.changed = changed.clone();
        self.mark_synced();
        info!("Saved {} to {}", self.kind.name(), location);

        self.emit(&ModelEvent::Change(ChangeDetail {
            origin: Origin::Save,
            location: Some(location),
            validate: options.validate,
            changed,
        }));
        Ok(())
    }

    /// Wrap for sharing between tasks
    pub fn into_shared(self) -> SharedModel<K> {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    fn location_for(&self, location: Option<&str>) -> String {
        location.unwrap_or_else(|| self.kind.url()).to_string()
    }

    fn run_validation(&mut self, candidate: &Attributes, origin: Origin) -> Result<(), ValidationError> {
        match self.kind.validate(candidate) {
            Some(reason) => {
                debug!("{} rejected on {}: {}", self.kind.name(), origin, reason);
                self.validation_error = Some(reason.clone());
                self.emit(&ModelEvent::Invalid {
                    origin,
                    reason: reason.clone(),
                });
                Err(ValidationError::new(reason))
            }
            None => {
                self.validation_error = None;
                Ok(())
            }
        }
    }

    fn after_local_change(&mut self, origin: Origin, changed: Vec<String>, options: SetOptions) {
        self.changed = changed.clone();
        if self.status == SyncStatus::Synced {
            self.status = SyncStatus::Dirty;
        }
        if !options.silent {
            self.emit(&ModelEvent::Change(ChangeDetail {
                origin,
                location: None,
                validate: options.validate,
                changed,
            }));
        }
    }

    /// Attributes to merge from a save response, if any
    fn server_attributes(&self, response: Value, sent: &Value, location: &str) -> Option<Attributes> {
        if response == *sent || response.as_object().map_or(true, |o| o.is_empty()) {
            return None;
        }
        match self.kind.parse(response) {
            Ok(attrs) => Some(attrs),
            Err(e) => {
                warn!("Ignoring unparseable save response from {}: {}", location, e);
                None
            }
        }
    }

    fn mark_synced(&mut self) {
        self.status = SyncStatus::Synced;
        self.last_synced_at = Some(Utc::now());
    }

    fn fail(&self, origin: Origin, location: &str, error: SyncError) -> SyncError {
        warn!("{} of {} failed: {}", origin, self.kind.name(), error);
        self.emit(&ModelEvent::Error {
            origin,
            location: location.to_string(),
            message: error.to_string(),
        });
        error
    }

    fn emit(&self, event: &ModelEvent) {
        self.observers.emit(self, event);
    }
}

impl<K: ModelKind> fmt::Debug for Model<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("cid", &self.cid)
            .field("kind", &self.kind.name())
            .field("attributes", &self.attributes)
            .field("status", &self.status)
            .field("validation_error", &self.validation_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use crate::user::{invalid_user, mutant_user, user, User};
    use serde_json::json;
    use std::sync::Mutex;

    /// Collects every event a model emits
    fn record<K: ModelKind + 'static>(model: &Model<K>) -> Arc<Mutex<Vec<ModelEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::Change, EventKind::Invalid, EventKind::Error] {
            let events = Arc::clone(&events);
            model.on(kind, move |_, event| events.lock().unwrap().push(event.clone()));
        }
        events
    }

    fn memory() -> Arc<MemoryTransport> {
        Arc::new(MemoryTransport::new())
    }

    #[test]
    fn test_new_model() {
        let model = Model::new(user(), memory());
        assert!(model.attributes().is_empty());
        assert_eq!(model.status(), SyncStatus::Unsynced);
        assert!(model.is_new());
        assert!(model.validation_error().is_none());
        assert_eq!(model.url(), "/data/user.json");
    }

    #[test]
    fn test_with_attributes() {
        let model = Model::new(user(), memory()).with_attributes(
            Attributes::new()
                .with("firstname", "hello")
                .with("lastname", "world")
                .with("age", 31),
        );
        let record: User = model.to_record().unwrap();
        assert_eq!(record, User::new("hello", "world").with_age(31));
    }

    #[test]
    fn test_cids_are_unique() {
        let a = Model::new(user(), memory());
        let b = Model::new(user(), memory());
        assert_ne!(a.cid(), b.cid());
    }

    #[test]
    fn test_set_emits_change() {
        let mut model = Model::new(user(), memory());
        let events = record(&model);

        model
            .set(Attributes::new().with("firstname", "a"), SetOptions::default())
            .unwrap();

        assert_eq!(model.get("firstname"), Some(&json!("a")));
        assert!(model.has_changed("firstname"));
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ModelEvent::Change(ChangeDetail { origin: Origin::Set, .. })
        ));
    }

    #[test]
    fn test_set_silent() {
        let mut model = Model::new(user(), memory());
        let events = record(&model);

        model
            .set(Attributes::new().with("firstname", "a"), SetOptions::silent())
            .unwrap();

        assert_eq!(model.get("firstname"), Some(&json!("a")));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_validated_rejects() {
        let mut model = Model::new(invalid_user(), memory());
        let events = record(&model);

        let err = model
            .set(
                Attributes::new().with("firstname", "").with("lastname", "x"),
                SetOptions::validated(),
            )
            .unwrap_err();

        assert_eq!(err.reason, "firstname cannot be blank");
        assert!(model.attributes().is_empty());
        assert_eq!(model.validation_error(), Some("firstname cannot be blank"));
        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![ModelEvent::Invalid {
                origin: Origin::Set,
                reason: "firstname cannot be blank".to_string()
            }]
        );
    }

    #[test]
    fn test_set_unvalidated_skips_policy() {
        let mut model = Model::new(invalid_user(), memory());

        model
            .set(Attributes::new().with("firstname", ""), SetOptions::default())
            .unwrap();

        assert_eq!(model.get("firstname"), Some(&json!("")));
        assert!(model.validation_error().is_none());
    }

    #[test]
    fn test_passing_validation_clears_error() {
        let mut model = Model::new(invalid_user(), memory());
        let _ = model.set(Attributes::new().with("firstname", " "), SetOptions::validated());
        assert!(model.validation_error().is_some());

        model
            .set(Attributes::new().with("firstname", "ok"), SetOptions::validated())
            .unwrap();
        assert!(model.validation_error().is_none());
    }

    #[test]
    fn test_invalid_handler_sees_recorded_reason() {
        let mut model = Model::new(invalid_user(), memory());
        let seen = Arc::new(Mutex::new(None));

        let s = Arc::clone(&seen);
        model.on(EventKind::Invalid, move |m, _| {
            *s.lock().unwrap() = m.validation_error().map(str::to_string);
        });
        let _ = model.set(Attributes::new().with("lastname", "x"), SetOptions::validated());

        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("firstname cannot be blank")
        );
    }

    #[test]
    fn test_unset() {
        let mut model = Model::new(invalid_user(), memory())
            .with_attributes(Attributes::new().with("firstname", "a").with("age", 3));

        model.unset("age", SetOptions::default()).unwrap();
        assert!(!model.has("age"));
        assert_eq!(model.changed().to_vec(), vec!["age".to_string()]);

        let err = model.unset("firstname", SetOptions::validated()).unwrap_err();
        assert_eq!(err.reason, "firstname cannot be blank");
        assert!(model.has("firstname"));
    }

    #[test]
    fn test_is_valid() {
        let mut model = Model::new(invalid_user(), memory());
        let events = record(&model);

        assert!(!model.is_valid());
        assert_eq!(events.lock().unwrap().len(), 1);

        model
            .set(Attributes::new().with("firstname", "a"), SetOptions::silent())
            .unwrap();
        assert!(model.is_valid());
    }

    #[tokio::test]
    async fn test_fetch_replaces_attributes() {
        let transport = memory();
        transport.insert("/data/user.json", json!({"firstname": "hello"}));
        let mut model = Model::new(user(), transport)
            .with_attributes(Attributes::new().with("stale", true));

        model.fetch(FetchOptions::default()).await.unwrap();

        assert_eq!(model.to_json(), json!({"firstname": "hello"}));
        assert_eq!(model.status(), SyncStatus::Synced);
        assert!(model.last_synced_at().is_some());
    }

    #[tokio::test]
    async fn test_fetch_merge() {
        let transport = memory();
        transport.insert("/data/user.json", json!({"firstname": "hello"}));
        let mut model = Model::new(user(), transport)
            .with_attributes(Attributes::new().with("local", true));

        model
            .fetch(FetchOptions::new().merge(true))
            .await
            .unwrap();

        assert_eq!(model.to_json(), json!({"firstname": "hello", "local": true}));
    }

    #[tokio::test]
    async fn test_fetch_custom_location() {
        let transport = memory();
        transport.insert("/api/users/7", json!({"data": {"id": 7}}));
        let mut model = Model::new(mutant_user(), transport);

        model
            .fetch(FetchOptions::new().location("/api/users/7"))
            .await
            .unwrap();

        assert_eq!(model.id(), Some(&json!(7)));
        assert!(!model.is_new());
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        let transport = memory();
        transport.set_offline(true);
        let mut model = Model::new(user(), transport.clone())
            .with_attributes(Attributes::new().with("firstname", "keep"));
        let events = record(&model);

        let err = model.fetch(FetchOptions::default()).await.unwrap_err();

        assert!(matches!(err, SyncError::Transport(_)));
        assert_eq!(model.to_json(), json!({"firstname": "keep"}));
        assert_eq!(model.status(), SyncStatus::Unsynced);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ModelEvent::Error { origin: Origin::Fetch, .. }
        ));
    }

    #[tokio::test]
    async fn test_fetch_parse_failure() {
        let transport = memory();
        transport.insert("/data/mutant_user.json", json!({"firstname": "unwrapped"}));
        let mut model = Model::new(mutant_user(), transport);
        let events = record(&model);

        let err = model.fetch(FetchOptions::default()).await.unwrap_err();

        assert!(matches!(err, SyncError::Parse(ParseError::MissingField { .. })));
        assert!(model.attributes().is_empty());
        assert!(matches!(
            events.lock().unwrap()[0],
            ModelEvent::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_fetch_validated_discards_payload() {
        let transport = memory();
        transport.insert("/data/invalid_user.json", json!({"firstname": "", "lastname": "x"}));
        let mut model = Model::new(invalid_user(), transport);
        let events = record(&model);

        let err = model
            .fetch(FetchOptions::new().validate(true))
            .await
            .unwrap_err();

        assert_eq!(err.validation_reason(), Some("firstname cannot be blank"));
        assert!(model.attributes().is_empty());
        assert_eq!(model.status(), SyncStatus::Unsynced);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ModelEvent::Invalid { origin: Origin::Fetch, .. }));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let transport = memory();
        transport.insert("/data/user.json", json!({"firstname": "a"}));
        let mut model = Model::new(user(), transport);

        model
            .set(Attributes::new().with("x", 1), SetOptions::default())
            .unwrap();
        assert_eq!(model.status(), SyncStatus::Unsynced);

        model.fetch(FetchOptions::default()).await.unwrap();
        assert_eq!(model.status(), SyncStatus::Synced);

        model
            .set(Attributes::new().with("lastname", "b"), SetOptions::default())
            .unwrap();
        assert_eq!(model.status(), SyncStatus::Dirty);

        model.save(SaveOptions::default()).await.unwrap();
        assert_eq!(model.status(), SyncStatus::Synced);
    }

    #[tokio::test]
    async fn test_save_create_then_update() {
        let transport = memory();
        transport.respond_with("/data/user.json", json!({"id": 1}));
        let mut model = Model::new(user(), transport.clone())
            .with_attributes(Attributes::new().with("firstname", "a"));

        model.save(SaveOptions::default()).await.unwrap();
        assert_eq!(model.id(), Some(&json!(1)));
        assert!(model.has_changed("id"));

        model.save(SaveOptions::default()).await.unwrap();

        let writes = transport.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].method, WriteMethod::Create);
        assert_eq!(writes[0].payload, json!({"firstname": "a"}));
        assert_eq!(writes[1].method, WriteMethod::Update);
        assert_eq!(writes[1].payload, json!({"firstname": "a", "id": 1}));
    }

    #[tokio::test]
    async fn test_save_echo_on_envelope_kind() {
        let transport = memory();
        let mut model = Model::new(mutant_user(), transport.clone())
            .with_attributes(Attributes::new().with("firstname", "a"));

        model.save(SaveOptions::default()).await.unwrap();
        assert_eq!(model.to_json(), json!({"firstname": "a"}));
        assert_eq!(transport.writes()[0].payload, json!({"data": {"firstname": "a"}}));
    }

    #[tokio::test]
    async fn test_save_validation_blocks_write() {
        let transport = memory();
        let mut model = Model::new(invalid_user(), transport.clone())
            .with_attributes(Attributes::new().with("lastname", "x"));
        let events = record(&model);

        let err = model.save(SaveOptions::default()).await.unwrap_err();

        assert!(matches!(err, SyncError::Invalid(_)));
        assert!(transport.writes().is_empty());
        assert!(matches!(
            events.lock().unwrap()[0],
            ModelEvent::Invalid { origin: Origin::Save, .. }
        ));
    }

    #[tokio::test]
    async fn test_save_without_validation() {
        let transport = memory();
        let mut model = Model::new(invalid_user(), transport.clone())
            .with_attributes(Attributes::new().with("lastname", "x"));

        model
            .save(SaveOptions::new().validate(false))
            .await
            .unwrap();
        assert_eq!(transport.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_save_transport_failure() {
        let transport = memory();
        transport.set_offline(true);
        let mut model = Model::new(user(), transport)
            .with_attributes(Attributes::new().with("firstname", "a"));
        let events = record(&model);

        let err = model.save(SaveOptions::default()).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(model.status(), SyncStatus::Unsynced);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ModelEvent::Error { origin: Origin::Save, .. }));
    }

    #[tokio::test]
    async fn test_shared_model() {
        let transport = memory();
        transport.insert("/data/user.json", json!({"firstname": "a"}));
        let shared = Model::new(user(), transport).into_shared();

        let task = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                let mut model = shared.lock().await;
                model.fetch(FetchOptions::default()).await
            })
        };
        task.await.unwrap().unwrap();

        assert_eq!(shared.lock().await.get("firstname"), Some(&json!("a")));
    }
}
