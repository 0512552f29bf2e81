use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use super::refresher::Refresher;

type RefreshFuture = Shared<BoxFuture<'static, Result<String, String>>>;

/// A refresh that did not produce a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub reason: String,
    /// The caller waited on a refresh another request started. Only the
    /// starter acts on the failure; joiners just report it.
    pub joined: bool,
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Runs token refreshes and stores their result.
///
/// With `dedupe` on, unauthorized responses arriving while a refresh is
/// already running wait for that refresh instead of starting their own.
/// With it off, every caller refreshes independently.
pub struct RefreshCoordinator {
    refresher: Arc<dyn Refresher>,
    credentials: Arc<CredentialStore>,
    dedupe: bool,
    in_flight: Mutex<Option<RefreshFuture>>,
}

impl RefreshCoordinator {
    pub fn new(refresher: Arc<dyn Refresher>, credentials: Arc<CredentialStore>, dedupe: bool) -> Self {
        info!(
            "Creating refresh coordinator using '{}' (dedupe={})",
            refresher.get_name(),
            dedupe
        );
        RefreshCoordinator {
            refresher,
            credentials,
            dedupe,
            in_flight: Mutex::new(None),
        }
    }

    /// Obtain and store a new access token, returning it.
    pub async fn refresh(&self, tenant_code: &str) -> Result<String, RefreshFailure> {
        if !self.dedupe {
            return run_refresh(
                self.refresher.clone(),
                self.credentials.clone(),
                tenant_code.to_string(),
            )
            .await
            .map_err(|reason| RefreshFailure {
                reason,
                joined: false,
            });
        }

        let mut joined = false;
        let future = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(running) if running.peek().is_none() => {
                    debug!("Joining refresh already in flight");
                    joined = true;
                    running.clone()
                }
                _ => {
                    let fresh = run_refresh(
                        self.refresher.clone(),
                        self.credentials.clone(),
                        tenant_code.to_string(),
                    )
                    .boxed()
                    .shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let result = future.await;

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|f| f.peek().is_some()) {
            *slot = None;
        }
        result.map_err(|reason| RefreshFailure { reason, joined })
    }
}

async fn run_refresh(
    refresher: Arc<dyn Refresher>,
    credentials: Arc<CredentialStore>,
    tenant_code: String,
) -> Result<String, String> {
    let refresh_token = credentials
        .refresh_token()
        .ok_or_else(|| "No refresh token available".to_string())?;

    let mut credential = refresher.refresh(&refresh_token, &tenant_code).await?;
    if !credential.is_usable() {
        warn!("Refresher '{}' returned an unusable token", refresher.get_name());
        return Err("Refresh returned an unusable access token".to_string());
    }
    // The backend only rotates the access token.
    if credential.refresh_token.is_none() {
        credential.refresh_token = Some(refresh_token);
    }

    let token = credential.access_token.clone();
    credentials.set(credential);
    info!("Access token refreshed by '{}'", refresher.get_name());
    Ok(token)
}
