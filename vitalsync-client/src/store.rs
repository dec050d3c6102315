//! Per-resource observable state, one slot per tracked resource.
//!
//! Each slot is mutated only by its own sync task; a failed refresh records
//! the error but never clears the last good value.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use vitalsync_model::{EfficiencyScore, TelemetryRecord};

use crate::blob::GraphHandle;
use crate::error::ErrorKind;

/// Latest value, loading flag, and error state for one resource.
#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    pub value: Option<T>,
    pub loading: bool,
    pub error: Option<ErrorKind>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
            error: None,
            last_updated: None,
        }
    }
}

/// A shared, independently mutable slot holding one [`ResourceState`].
#[derive(Debug)]
pub struct ResourceSlot<T> {
    state: Arc<RwLock<ResourceState<T>>>,
}

impl<T> Clone for ResourceSlot<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for ResourceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ResourceState::default())),
        }
    }

    /// Mark a refresh in progress. The current value stays visible.
    pub async fn begin_load(&self) {
        self.state.write().await.loading = true;
    }

    /// Record a successful refresh.
    pub async fn commit(&self, value: T) {
        let mut state = self.state.write().await;
        state.value = Some(value);
        state.error = None;
        state.loading = false;
        state.last_updated = Some(Utc::now());
    }

    /// Record a failed refresh. The last good value is left untouched.
    pub async fn fail(&self, kind: ErrorKind) {
        let mut state = self.state.write().await;
        state.error = Some(kind);
        state.loading = false;
    }
}

impl<T: Clone> ResourceSlot<T> {
    /// Cheap cloned snapshot for presentation-layer reads.
    pub async fn snapshot(&self) -> ResourceState<T> {
        self.state.read().await.clone()
    }
}

/// The sole mutable state surface: one slot per tracked resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    pub telemetry: ResourceSlot<Vec<TelemetryRecord>>,
    pub prediction: ResourceSlot<EfficiencyScore>,
    pub graph: ResourceSlot<GraphHandle>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}
