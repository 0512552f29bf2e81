pub mod credential;
pub mod request;
pub mod tenant;

pub use credential::Credential;
pub use request::{ApiRequest, ApiResponse, Location};
pub use tenant::TenantDescriptor;
