//! VitalSync client: an authenticated polling engine that keeps three
//! independently refreshed views of server state (telemetry records, an
//! efficiency prediction, a rendered graph image) current on fixed timers.
//!
//! The engine exposes value/loading/error per view through
//! [`store::ResourceStore`]; presentation is an external collaborator that
//! only reads that state.

pub mod api_client;
pub mod blob;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod sync;

pub use api_client::{ApiClient, VitalsApi};
pub use blob::{BlobLifecycleManager, GraphHandle};
pub use config::Config;
pub use error::{ErrorKind, SyncError, SyncResult};
pub use scheduler::PollScheduler;
pub use session::{Generation, Session, SessionManager};
pub use store::{ResourceSlot, ResourceState, ResourceStore};
pub use sync::{DEFAULT_POLL_INTERVAL, SyncEngine};
