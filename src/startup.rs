//! Client assembly.
//!
//! Wires storage, credentials, the refresher, tenant resolution and the
//! transport into one [`ApiClient`] according to the configuration.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::auth::{CredentialStore, HttpRefresher, RefreshCoordinator, SessionService};
use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::navigation::Navigator;
use crate::pipeline::{ApiClient, ClientState, HttpTransport, TokioSleeper};
use crate::state::AppState;
use crate::storage::create_storage;
use crate::tenant::TenantResolver;

/// Builds the client described by `config`.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be opened or the HTTP
/// clients cannot be constructed (e.g. an invalid base URL).
pub fn build(config: Arc<ConfigV1>, navigator: Arc<dyn Navigator>) -> Result<AppState, String> {
    let timeout = Duration::from_millis(config.api.timeout_in_ms);
    let base_url = config.api.base_url.as_str();

    let storage = create_storage(&config.storage)?;
    let credentials = Arc::new(CredentialStore::new(storage.clone()));

    let refresher = HttpRefresher::new(base_url, &config.auth.refresh_path, timeout)?;
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(refresher),
        credentials.clone(),
        config.auth.dedupe_refresh,
    ));

    let tenant = Arc::new(TenantResolver::from_settings(
        &config.tenant,
        base_url,
        storage.clone(),
    ));

    let metrics = Metrics::try_new().map_err(|e| format!("Failed to register metrics: {}", e))?;

    info!("Creating API client for {}", base_url);
    let state = ClientState {
        transport: Arc::new(HttpTransport::new(base_url, timeout)?),
        credentials,
        refresher: coordinator,
        tenant: tenant.clone(),
        navigator,
        storage,
        sleeper: Arc::new(TokioSleeper),
        metrics,
    };
    let client = Arc::new(ApiClient::new(
        state,
        config.retry.clone(),
        config.auth.clone(),
    ));
    let session = Arc::new(SessionService::new(client.clone(), &config.auth));

    Ok(AppState {
        config,
        client,
        session,
        tenant,
    })
}
