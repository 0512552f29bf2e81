//! Thin typed wrappers over the backend's REST resources. All calls go
//! through [`ApiClient`](crate::pipeline::ApiClient), so they inherit the
//! auth, tenant and retry behaviour.

pub mod catalog;
pub mod dashboard;
pub mod resources;

pub use catalog::CatalogService;
pub use dashboard::DashboardService;
pub use resources::{ListParams, Resource, ResourceService};
