pub mod coordinator;
pub mod credentials;
pub mod refresher;
pub mod session;

// Re-export the pieces the pipeline wires together so we can do "use crate::auth::*;"
pub use coordinator::{RefreshCoordinator, RefreshFailure};
pub use credentials::CredentialStore;
pub use refresher::{HttpRefresher, Refresher};
pub use session::{LoginResult, Registration, SessionService};
