//! The three sync tasks and the engine that wires them to the session.
//!
//! Each tick follows the same pipeline: mark the resource loading, issue an
//! authenticated fetch tagged with the issuing generation, then commit (or
//! record the failure) only if that generation is still current. Responses
//! from a superseded generation are discarded silently.

use std::sync::Arc;
use std::time::Duration;

use crate::api_client::VitalsApi;
use crate::blob::BlobLifecycleManager;
use crate::error::{ErrorKind, SyncResult};
use crate::scheduler::PollScheduler;
use crate::session::{Generation, SessionManager};
use crate::store::ResourceStore;

/// Default polling cadence for all three resources.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

async fn telemetry_tick(
    api: Arc<dyn VitalsApi>,
    store: ResourceStore,
    sessions: SessionManager,
    generation: Generation,
) {
    if sessions.current().generation != generation {
        return;
    }
    store.telemetry.begin_load().await;

    let result = match api.fetch_telemetry().await {
        Ok(columns) => columns.into_records().map_err(Into::into),
        Err(err) => Err(err),
    };

    if sessions.current().generation != generation {
        log::debug!("[Sync] Discarding stale telemetry response (generation {generation})");
        return;
    }
    match result {
        Ok(records) => {
            log::debug!("[Sync] Committing {} telemetry records", records.len());
            store.telemetry.commit(records).await;
        }
        Err(err) => {
            log::warn!("[Sync] Telemetry refresh failed: {err}");
            store
                .telemetry
                .fail(err.kind().unwrap_or(ErrorKind::Network))
                .await;
        }
    }
}

async fn prediction_tick(
    api: Arc<dyn VitalsApi>,
    store: ResourceStore,
    sessions: SessionManager,
    generation: Generation,
) {
    if sessions.current().generation != generation {
        return;
    }
    store.prediction.begin_load().await;

    let result = match api.fetch_prediction().await {
        Ok(payload) => payload.score().map_err(Into::into),
        Err(err) => Err(err),
    };

    if sessions.current().generation != generation {
        log::debug!("[Sync] Discarding stale prediction response (generation {generation})");
        return;
    }
    match result {
        Ok(score) => store.prediction.commit(score).await,
        Err(err) => {
            log::warn!("[Sync] Prediction refresh failed: {err}");
            store
                .prediction
                .fail(err.kind().unwrap_or(ErrorKind::Network))
                .await;
        }
    }
}

async fn graph_tick(
    api: Arc<dyn VitalsApi>,
    store: ResourceStore,
    blobs: BlobLifecycleManager,
    sessions: SessionManager,
    generation: Generation,
) {
    if sessions.current().generation != generation {
        return;
    }
    store.graph.begin_load().await;

    let result = api.fetch_plot().await;

    if sessions.current().generation != generation {
        // Stale bytes never reach the lifecycle manager, so the live handle
        // is untouched.
        log::debug!("[Sync] Discarding stale graph response (generation {generation})");
        return;
    }
    match result {
        Ok(bytes) => {
            let handle = blobs.install(bytes).await;
            store.graph.commit(handle).await;
        }
        Err(err) => {
            log::warn!("[Sync] Graph refresh failed: {err}");
            store
                .graph
                .fail(err.kind().unwrap_or(ErrorKind::Network))
                .await;
        }
    }
}

/// The authenticated polling engine.
///
/// Owns the session, the per-resource state, the graph-handle lifecycle, and
/// the scheduler; login/logout transitions drive schedule teardown and
/// startup for all three resources.
#[derive(Clone)]
pub struct SyncEngine {
    api: Arc<dyn VitalsApi>,
    sessions: SessionManager,
    store: ResourceStore,
    blobs: BlobLifecycleManager,
    scheduler: Arc<PollScheduler>,
    poll_interval: Duration,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("session", &self.sessions.current())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl SyncEngine {
    pub fn new(api: Arc<dyn VitalsApi>, poll_interval: Duration) -> Self {
        Self {
            api,
            sessions: SessionManager::new(),
            store: ResourceStore::new(),
            blobs: BlobLifecycleManager::new(),
            scheduler: Arc::new(PollScheduler::new()),
            poll_interval,
        }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn blobs(&self) -> &BlobLifecycleManager {
        &self.blobs
    }

    /// Log in and start polling all three resources under the new
    /// generation.
    ///
    /// Previous-generation schedules are stopped before the new ones start.
    /// A rejected login starts no scheduling.
    pub async fn login(&self, username: &str, password: &str) -> SyncResult<()> {
        let previous = self.sessions.current().generation;
        self.sessions
            .login(self.api.as_ref(), username, password)
            .await?;
        self.scheduler.stop(previous).await;
        let generation = self.sessions.current().generation;
        self.start_schedules(generation).await;
        Ok(())
    }

    /// Log out and halt all scheduled polling.
    ///
    /// Requests already in flight are not aborted; their responses die at
    /// the generation guard.
    pub async fn logout(&self) {
        let previous = self.sessions.current().generation;
        self.sessions.logout(self.api.as_ref()).await;
        self.scheduler.stop(previous).await;
    }

    async fn start_schedules(&self, generation: Generation) {
        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let sessions = self.sessions.clone();
        self.scheduler
            .start(generation, self.poll_interval, move |generation| {
                telemetry_tick(
                    Arc::clone(&api),
                    store.clone(),
                    sessions.clone(),
                    generation,
                )
            })
            .await;

        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let sessions = self.sessions.clone();
        self.scheduler
            .start(generation, self.poll_interval, move |generation| {
                prediction_tick(
                    Arc::clone(&api),
                    store.clone(),
                    sessions.clone(),
                    generation,
                )
            })
            .await;

        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let blobs = self.blobs.clone();
        let sessions = self.sessions.clone();
        self.scheduler
            .start(generation, self.poll_interval, move |generation| {
                graph_tick(
                    Arc::clone(&api),
                    store.clone(),
                    blobs.clone(),
                    sessions.clone(),
                    generation,
                )
            })
            .await;
    }
}
