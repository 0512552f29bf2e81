//! The assembled client.
//!
//! Everything a caller of the library needs, built once by
//! [`crate::startup::build`] and cheap to clone.

use crate::auth::SessionService;
use crate::config::ConfigV1;
use crate::pipeline::ApiClient;
use crate::services::{CatalogService, DashboardService, Resource, ResourceService};
use crate::tenant::TenantResolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The pipeline every call goes through.
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionService>,
    pub tenant: Arc<TenantResolver>,
}

impl AppState {
    pub fn resource(&self, resource: Resource) -> ResourceService {
        ResourceService::new(self.client.clone(), resource)
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.client.clone())
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.client.clone())
    }
}
