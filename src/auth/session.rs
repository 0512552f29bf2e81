use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::credentials::CredentialStore;
use super::refresher::extract_credential;
use crate::config::AuthConfig;
use crate::error::{ApiError, UNKNOWN_ERROR};
use crate::models::request::ApiRequest;
use crate::pipeline::ApiClient;
use crate::storage::{keys, Storage};

#[derive(Debug, Clone, PartialEq)]
pub struct LoginResult {
    pub user: Value,
    /// Page the user was on when the session ended, if one was remembered.
    pub redirect_to: Option<String>,
}

/// A new account. The backend expects camelCase keys.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// Account and session operations on top of the pipeline.
pub struct SessionService {
    client: Arc<ApiClient>,
    credentials: Arc<CredentialStore>,
    storage: Arc<dyn Storage>,
    login_path: String,
    register_path: String,
}

impl SessionService {
    pub fn new(client: Arc<ApiClient>, auth: &AuthConfig) -> Self {
        let state = client.state();
        SessionService {
            credentials: state.credentials.clone(),
            storage: state.storage.clone(),
            login_path: auth.login_path.clone(),
            register_path: auth.register_path.clone(),
            client,
        }
    }

    /// Creates the account and returns the new user. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        let body: Value = self
            .client
            .post_json(&self.register_path, registration)
            .await?;
        info!("Registered '{}'", registration.email);
        Ok(user_of(&body).unwrap_or(body))
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<Value, ApiError> {
        let path = format!("/users/{}/change-password", user_id.trim_matches('/'));
        self.client
            .post_json(
                &path,
                &json!({ "currentPassword": current_password, "newPassword": new_password }),
            )
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError> {
        let request = ApiRequest::post(self.login_path.as_str())
            .with_json(&json!({ "email": email, "password": password }))?;
        let body: Value = self.client.execute(request).await?.json()?;

        let credential = extract_credential(&body).ok_or_else(|| {
            ApiError::new("Login response did not contain a token", UNKNOWN_ERROR, 200)
        })?;
        self.credentials.set(credential);

        let user = user_of(&body).unwrap_or(Value::Null);
        info!("Logged in as '{}'", email);

        Ok(LoginResult {
            user,
            redirect_to: self.take_redirect(),
        })
    }

    /// Local only: the backend keeps no session to tear down.
    pub fn logout(&self) {
        self.credentials.clear();
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    fn take_redirect(&self) -> Option<String> {
        let target = self.storage.get(keys::REDIRECT_AFTER_LOGIN).ok().flatten()?;
        if let Err(e) = self.storage.remove(keys::REDIRECT_AFTER_LOGIN) {
            warn!("Failed to clear remembered redirect: {}", e);
        }
        Some(target)
    }
}

fn user_of(body: &Value) -> Option<Value> {
    body.get("user")
        .or_else(|| body.pointer("/data/user"))
        .cloned()
}
