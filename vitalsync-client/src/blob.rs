//! Lifecycle of the single live graph-image handle.
//!
//! Invariant: at most one handle is live at any time, and the previous one
//! is released strictly before its replacement is installed.

use std::sync::Arc;
use tokio::sync::Mutex;

/// Opaque reference to rendered graph image bytes.
///
/// Valid until the lifecycle manager releases it in favor of a newer one.
#[derive(Debug, Clone)]
pub struct GraphHandle {
    id: u64,
    bytes: Arc<Vec<u8>>,
}

impl GraphHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Default)]
struct BlobInner {
    current: Option<GraphHandle>,
    next_id: u64,
    released: u64,
}

/// Tracks the single live [`GraphHandle`] and guarantees the previous one is
/// released before a new one is installed.
#[derive(Debug, Clone, Default)]
pub struct BlobLifecycleManager {
    inner: Arc<Mutex<BlobInner>>,
}

impl BlobLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the previous handle, then install a new one over `bytes`.
    ///
    /// Returns the newly installed handle.
    pub async fn install(&self, bytes: Vec<u8>) -> GraphHandle {
        let mut inner = self.inner.lock().await;
        if let Some(previous) = inner.current.take() {
            log::debug!("[Blob] Releasing graph handle {}", previous.id());
            inner.released += 1;
            drop(previous);
        }
        let handle = GraphHandle {
            id: inner.next_id,
            bytes: Arc::new(bytes),
        };
        inner.next_id += 1;
        inner.current = Some(handle.clone());
        handle
    }

    /// Release the live handle without installing a replacement.
    pub async fn release(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(previous) = inner.current.take() {
            log::debug!("[Blob] Releasing graph handle {}", previous.id());
            inner.released += 1;
        }
    }

    /// The currently live handle, if any.
    pub async fn live(&self) -> Option<GraphHandle> {
        self.inner.lock().await.current.clone()
    }

    /// How many handles have been released since creation.
    pub async fn released_count(&self) -> u64 {
        self.inner.lock().await.released
    }
}
