//! Session-aware HTTP client for the Chama Frete freight marketplace.
//!
//! Every view performing network I/O goes through [`ApiClient`]. It attaches
//! the stored bearer token to non-public requests and, on a 401, clears the
//! session and forces the user back to the login page.

pub mod net;
pub mod state;
pub mod util;

pub use net::api::{ApiClient, ApiRequest, create_client};
pub use net::config::ClientConfig;
pub use net::guard::{GuardOutcome, SessionGuard};
pub use net::types::ApiError;
pub use state::session::{Session, SessionState};
pub use util::navigation::{MemoryNavigator, Navigator};
pub use util::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

#[cfg(feature = "web")]
pub use util::navigation::BrowserNavigator;
#[cfg(feature = "web")]
pub use util::storage::WebStorage;
