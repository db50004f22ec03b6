//! In-memory transport
//!
//! Holds payloads in a map keyed by location. Writes are recorded so tests
//! can inspect what a model sent, and the transport can be taken offline to
//! simulate an unreachable server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{Transport, WriteMethod};
use crate::error::TransportError;

/// A write received by the memory transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub location: String,
    pub method: WriteMethod,
    pub payload: Value,
}

#[derive(Debug, Default)]
struct State {
    payloads: HashMap<String, Value>,
    responses: HashMap<String, Value>,
    writes: Vec<RecordedWrite>,
    reads: usize,
}

/// Transport backed by an in-process map
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
    offline: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `insert`
    pub fn with_payload(self, location: impl Into<String>, payload: Value) -> Self {
        self.insert(location, payload);
        self
    }

    /// Store a payload at a location
    pub fn insert(&self, location: impl Into<String>, payload: Value) {
        self.lock().payloads.insert(location.into(), payload);
    }

    /// Payload currently stored at a location
    pub fn get(&self, location: &str) -> Option<Value> {
        self.lock().payloads.get(location).cloned()
    }

    /// Answer writes to `location` with `response` instead of echoing
    pub fn respond_with(&self, location: impl Into<String>, response: Value) {
        self.lock().responses.insert(location.into(), response);
    }

    /// Make every request fail with [`TransportError::Offline`]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Writes received so far, oldest first
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }

    /// Number of reads served
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    fn check_online(&self, location: &str) -> Result<(), TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Offline {
                location: location.to_string(),
            });
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read(&self, location: &str) -> Result<Value, TransportError> {
        self.check_online(location)?;
        let mut state = self.lock();
        state.reads += 1;
        state
            .payloads
            .get(location)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                location: location.to_string(),
            })
    }

    async fn write(
        &self,
        location: &str,
        method: WriteMethod,
        payload: &Value,
    ) -> Result<Value, TransportError> {
        self.check_online(location)?;
        let mut state = self.lock();
        state.writes.push(RecordedWrite {
            location: location.to_string(),
            method,
            payload: payload.clone(),
        });
        state.payloads.insert(location.to_string(), payload.clone());

        Ok(state
            .responses
            .get(location)
            .cloned()
            .unwrap_or_else(|| payload.clone()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
