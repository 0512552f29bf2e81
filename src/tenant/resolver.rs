use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::remote::RemoteStrategy;
use super::strategies::{
    HostnameStrategy, PathStrategy, QueryStrategy, SubdomainStrategy, TenantStrategy, TenantTable,
};
use crate::auth::CredentialStore;
use crate::config::TenantSettings;
use crate::models::request::Location;
use crate::models::tenant::TenantDescriptor;
use crate::navigation::Navigator;
use crate::storage::{keys, Storage};

/// Builds the strategy chain in its fixed order.
pub fn create_strategies(
    settings: &TenantSettings,
    table: Arc<TenantTable>,
    base_url: &str,
) -> Vec<Box<dyn TenantStrategy>> {
    let mut strategies: Vec<Box<dyn TenantStrategy>> = vec![
        Box::new(HostnameStrategy::new(table.clone())),
        Box::new(SubdomainStrategy::new(table.clone(), &settings.code_suffix)),
        Box::new(PathStrategy::new(
            table.clone(),
            &settings.path_prefix,
            &settings.code_suffix,
        )),
        Box::new(QueryStrategy::new(table, &settings.query_param)),
    ];
    if settings.remote_enabled {
        strategies.push(Box::new(RemoteStrategy::new(base_url, &settings.resolve_path)));
    }
    strategies
}

/// Resolves the session's tenant once and remembers it.
pub struct TenantResolver {
    strategies: Vec<Box<dyn TenantStrategy>>,
    table: Arc<TenantTable>,
    default: TenantDescriptor,
    /// A query parameter with this name beats a tenant saved by an earlier session.
    query_param: String,
    current: RwLock<Option<TenantDescriptor>>,
    storage: Arc<dyn Storage>,
}

impl TenantResolver {
    pub fn new(
        strategies: Vec<Box<dyn TenantStrategy>>,
        table: Arc<TenantTable>,
        default: TenantDescriptor,
        query_param: &str,
        storage: Arc<dyn Storage>,
    ) -> Self {
        TenantResolver {
            strategies,
            table,
            default,
            query_param: query_param.to_string(),
            current: RwLock::new(None),
            storage,
        }
    }

    pub fn from_settings(
        settings: &TenantSettings,
        base_url: &str,
        storage: Arc<dyn Storage>,
    ) -> Self {
        info!("Creating tenant strategies...");
        let table = Arc::new(TenantTable::new(settings.domains.clone()));
        let strategies = create_strategies(settings, table.clone(), base_url);
        Self::new(
            strategies,
            table,
            settings.default.clone(),
            &settings.query_param,
            storage,
        )
    }

    /// The session's tenant. A tenant saved by an earlier session (e.g. by
    /// `switch_tenant` before a reload) is reused unless the location names
    /// one in its query; otherwise the chain runs, on first use only.
    pub async fn resolve(&self, location: &Location) -> TenantDescriptor {
        if let Some(tenant) = self.current() {
            return tenant;
        }

        let explicit = location
            .query_value(&self.query_param)
            .is_some_and(|v| !v.trim().is_empty());
        if !explicit {
            if let Some(saved) = self.persisted() {
                info!("Reusing saved tenant '{}'", saved.code);
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(saved.clone());
                return saved;
            }
        }

        for strategy in &self.strategies {
            match strategy.resolve(location).await {
                Some(tenant) => {
                    info!(
                        "Strategy '{}' resolved tenant '{}' for '{}'",
                        strategy.get_name(),
                        tenant.code,
                        location.hostname
                    );
                    self.apply(tenant.clone());
                    return tenant;
                }
                None => debug!("Strategy '{}' did not match", strategy.get_name()),
            }
        }

        warn!(
            "No strategy resolved a tenant for '{}'; using default '{}'",
            location.hostname, self.default.code
        );
        self.apply(self.default.clone());
        self.default.clone()
    }

    pub fn current(&self) -> Option<TenantDescriptor> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Code for the tenant header; the default until resolution has run.
    pub fn current_code(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.code.clone())
            .unwrap_or_else(|| self.default.code.clone())
    }

    /// Last descriptor written to storage, possibly by an earlier session.
    pub fn persisted(&self) -> Option<TenantDescriptor> {
        let raw = self.storage.get(keys::TENANT).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// Switch to another tenant. This is a hard reset: the session's
    /// credentials are dropped and the navigator reloads.
    pub fn switch_tenant(
        &self,
        code: &str,
        credentials: &CredentialStore,
        navigator: &dyn Navigator,
    ) -> TenantDescriptor {
        let code = code.trim().to_uppercase();
        let tenant = self
            .table
            .by_code(&code)
            .cloned()
            .unwrap_or_else(|| TenantDescriptor::synthesized(code, None));

        info!("Switching tenant to '{}'", tenant.code);
        self.apply(tenant.clone());
        credentials.clear();
        navigator.reload();
        tenant
    }

    fn apply(&self, tenant: TenantDescriptor) {
        match serde_json::to_string(&tenant) {
            Ok(serialized) => {
                if let Err(e) = self.storage.set(keys::TENANT, &serialized) {
                    warn!("Failed to persist tenant '{}': {}", tenant.code, e);
                }
            }
            Err(e) => warn!("Failed to serialize tenant '{}': {}", tenant.code, e),
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(tenant);
    }
}
