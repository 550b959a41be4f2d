//! # GiveHub client core
//!
//! Session and authorization controller for the GiveHub donation platform,
//! plus the typed API surface the rest of the client renders from.
//!
//! - **Credential Store** (`store`): durable, synchronous persistence for
//!   the active session. Malformed state reads as "no session", never as an
//!   error.
//! - **API Gateway** (`gateway`): the single chokepoint for remote calls.
//!   Attaches the stored token at send time and normalizes every failure
//!   into [`ApiError`].
//! - **Session Controller** (`session`): hydration at startup, the
//!   login/register/logout/update transactions, and state publication.
//! - **Role Router** (`routes`): role→dashboard mapping and page guards.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gh_client::{ApiGateway, FileCredentialStore, SessionController};
//! use gh_config::ClientConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load()?;
//! let store = Arc::new(FileCredentialStore::new(config.storage.credentials_path()));
//! let gateway = ApiGateway::new(&config.api, store.clone())?;
//! let controller = SessionController::new(gateway, store);
//!
//! controller.hydrate().await;
//! let state = controller.current();
//! println!("authenticated: {}", state.is_authenticated);
//! # Ok(())
//! # }
//! ```

pub mod dto;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod session;
pub mod store;

// Re-export main types
pub use dto::{
    AuthSession, CharityApplicationRequest, Credentials, NewDonation, NewStory, Registration,
    UserUpdate,
};
pub use error::{ApiError, Result};
pub use gateway::ApiGateway;
pub use routes::{can_access, dashboard_path, guard, Access};
pub use session::{SessionController, SessionPhase, SessionState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredSession};
