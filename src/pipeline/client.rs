use std::sync::Arc;
use std::time::Instant;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::interceptor::prepare_request;
use super::retry::{
    backoff_delay, is_idempotent, is_retryable_status, is_retryable_transport, random_jitter,
    Sleeper,
};
use super::transport::{RawResponse, Transport, TransportFailure};
use crate::auth::{CredentialStore, RefreshCoordinator};
use crate::config::{AuthConfig, RetryConfig};
use crate::error::{ApiError, UNKNOWN_ERROR, UNKNOWN_ERROR_MESSAGE};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::request::{ApiRequest, ApiResponse};
use crate::navigation::Navigator;
use crate::storage::{keys, Storage};
use crate::tenant::TenantResolver;

/// Everything the pipeline collaborates with, injected at construction.
#[derive(Clone)]
pub struct ClientState {
    pub transport: Arc<dyn Transport>,
    pub credentials: Arc<CredentialStore>,
    pub refresher: Arc<RefreshCoordinator>,
    pub tenant: Arc<TenantResolver>,
    pub navigator: Arc<dyn Navigator>,
    pub storage: Arc<dyn Storage>,
    pub sleeper: Arc<dyn Sleeper>,
    pub metrics: Metrics,
}

/// Per-call bookkeeping; lives only inside `execute`.
#[derive(Debug, Default)]
struct AttemptState {
    /// Set before the refresh starts and never cleared.
    auth_retried: bool,
    /// `None` until the first transient failure.
    retry_count: Option<u32>,
    /// Token obtained by a refresh, sent on the replay.
    replay_token: Option<String>,
}

enum Failure {
    Status(RawResponse),
    Transport(TransportFailure),
}

impl Failure {
    fn status(&self) -> Option<u16> {
        match self {
            Failure::Status(raw) => Some(raw.status.as_u16()),
            Failure::Transport(_) => None,
        }
    }

    fn reason(&self) -> String {
        match self {
            Failure::Status(raw) => raw.status.as_u16().to_string(),
            Failure::Transport(failure) => format!("{:?}", failure.kind).to_lowercase(),
        }
    }

    fn into_error(self) -> ApiError {
        match self {
            Failure::Status(raw) => ApiError::from_response(raw.status.as_u16(), &raw.body),
            // The status line arrived but the body did not.
            Failure::Transport(TransportFailure {
                status: Some(status),
                ..
            }) => ApiError::new(UNKNOWN_ERROR_MESSAGE, UNKNOWN_ERROR, status.as_u16()),
            Failure::Transport(_) => ApiError::network(),
        }
    }
}

enum Next {
    Replay(String),
    Retry,
    Fail(ApiError),
}

/// The one HTTP client every service calls through.
pub struct ApiClient {
    state: ClientState,
    retry: RetryConfig,
    auth: AuthConfig,
}

impl ApiClient {
    pub fn new(state: ClientState, retry: RetryConfig, auth: AuthConfig) -> Self {
        ApiClient { state, retry, auth }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Send `request`, applying the auth, forbidden and retry policies,
    /// and return the first 2xx response or the normalized error.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let started = Instant::now();
        let mut attempt = AttemptState::default();

        let result = loop {
            let tenant_code = self.state.tenant.current_code();
            let token = attempt
                .replay_token
                .clone()
                .or_else(|| self.state.credentials.access_token());
            let outgoing = prepare_request(&request, token.as_deref(), &tenant_code);

            let failure = match self.state.transport.send(&outgoing).await {
                Ok(raw) if raw.status.is_success() => {
                    break Ok(ApiResponse {
                        status: raw.status,
                        headers: raw.headers,
                        body: raw.body,
                    })
                }
                Ok(raw) => Failure::Status(raw),
                Err(e) => {
                    debug!(request_id = %request.id, "Transport failure: {}", e.detail);
                    Failure::Transport(e)
                }
            };

            match self.on_failure(&request, &mut attempt, &tenant_code, failure).await {
                Next::Replay(token) => attempt.replay_token = Some(token),
                Next::Retry => {}
                Next::Fail(err) => break Err(err),
            }
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) if e.is_network() => "network_error",
            Err(_) => "http_error",
        };
        let method = request.method.as_str();
        self.state.metrics.record_request(method, outcome);
        self.state
            .metrics
            .record_request_duration(method, started.elapsed().as_secs_f64());

        match &result {
            Ok(response) => debug!(
                request_id = %request.id,
                "{} {} -> {}", request.method, request.path, response.status
            ),
            Err(err) => info!(
                request_id = %request.id,
                "{} {} failed: {}", request.method, request.path, err
            ),
        }
        result
    }

    async fn on_failure(
        &self,
        request: &ApiRequest,
        attempt: &mut AttemptState,
        tenant_code: &str,
        failure: Failure,
    ) -> Next {
        let status = failure.status();

        if status == Some(401) && !attempt.auth_retried && self.refresh_applies(request) {
            attempt.auth_retried = true;
            return match self.state.refresher.refresh(tenant_code).await {
                Ok(token) => {
                    self.state.metrics.record_refresh("success");
                    info!(request_id = %request.id, "Token refreshed; replaying {} {}", request.method, request.path);
                    Next::Replay(token)
                }
                Err(e) => {
                    self.state.metrics.record_refresh("failure");
                    warn!(request_id = %request.id, "Token refresh failed: {}", e);
                    // Requests that joined someone else's refresh leave the redirect to its starter.
                    if !e.joined {
                        self.end_session();
                    }
                    Next::Fail(failure.into_error())
                }
            };
        }

        if status == Some(403) {
            self.redirect_forbidden();
            return Next::Fail(failure.into_error());
        }

        if self.retry_applies(&request.method, &failure) {
            let count = attempt.retry_count.get_or_insert(0);
            if *count < self.retry.max_retries {
                *count += 1;
                let delay = backoff_delay(*count, &self.retry, random_jitter(&self.retry));
                let reason = failure.reason();
                self.state
                    .metrics
                    .record_retry(request.method.as_str(), &reason);
                warn!(
                    request_id = %request.id,
                    "{} {} failed ({}); retry {}/{} in {:?}",
                    request.method, request.path, reason, count, self.retry.max_retries, delay
                );
                self.state.sleeper.sleep(delay).await;
                return Next::Retry;
            }
            warn!(
                request_id = %request.id,
                "{} {} still failing after {} retries",
                request.method, request.path, self.retry.max_retries
            );
        }

        Next::Fail(failure.into_error())
    }

    /// The login and refresh calls report their own 401s.
    fn refresh_applies(&self, request: &ApiRequest) -> bool {
        request.path != self.auth.login_path && request.path != self.auth.refresh_path
    }

    fn retry_applies(&self, method: &Method, failure: &Failure) -> bool {
        if !is_idempotent(method) {
            return false;
        }
        match failure {
            Failure::Status(raw) => is_retryable_status(raw.status.as_u16(), &self.retry),
            Failure::Transport(e) => is_retryable_transport(e),
        }
    }

    /// The refresh failed: drop the credential and send the user to log in.
    fn end_session(&self) {
        self.state.credentials.clear();
        self.remember_current_path();
        self.state.metrics.record_redirect("session_expired");
        self.state.navigator.redirect(&self.auth.login_page);
    }

    fn redirect_forbidden(&self) {
        let current = self.state.navigator.current_path();
        if current.starts_with(&self.auth.login_page) {
            debug!("Forbidden response while on the login page; not redirecting");
            return;
        }
        self.remember_current_path();
        self.state.metrics.record_redirect("forbidden");
        self.state
            .navigator
            .redirect(&format!("{}?error=forbidden", self.auth.login_page));
    }

    fn remember_current_path(&self) {
        let current = self.state.navigator.current_path();
        if let Err(e) = self.state.storage.set(keys::REDIRECT_AFTER_LOGIN, &current) {
            warn!("Failed to remember '{}' for after login: {}", current, e);
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::post(path).with_json(body)?).await?.json()
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::put(path).with_json(body)?).await?.json()
    }

    pub async fn delete_json(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(ApiRequest::delete(path)).await?.json()
    }
}
