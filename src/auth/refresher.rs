use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::models::credential::Credential;
use crate::pipeline::interceptor::TENANT_HEADER;

/// Exchanges a refresh token for a new credential.
#[async_trait]
pub trait Refresher: Send + Sync {
    fn get_name(&self) -> &str;
    async fn refresh(&self, refresh_token: &str, tenant_code: &str) -> Result<Credential, String>;
}

/// Calls the backend's refresh endpoint directly, outside the pipeline,
/// so a failing refresh can never trigger another refresh.
pub struct HttpRefresher {
    client: reqwest::Client,
    url: String,
}

impl HttpRefresher {
    pub fn new(base_url: &str, refresh_path: &str, timeout: Duration) -> Result<Self, String> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), refresh_path);
        info!("Creating HttpRefresher for '{}'", url);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build refresh client: {}", e))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Refresher for HttpRefresher {
    fn get_name(&self) -> &str {
        "http-refresh"
    }

    async fn refresh(&self, refresh_token: &str, tenant_code: &str) -> Result<Credential, String> {
        debug!("Refreshing access token via '{}'", self.url);

        let resp = self
            .client
            .post(&self.url)
            .header(TENANT_HEADER, tenant_code)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| format!("Failed to call refresh endpoint: {}", e))?;

        let status = resp.status();
        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| format!("Failed to parse refresh response: {}", e))?;

        if !status.is_success() {
            let reason = body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("no reason given");
            return Err(format!("Refresh rejected with status {}: {}", status, reason));
        }

        extract_credential(&body)
            .ok_or_else(|| "Refresh response did not contain an access token".to_string())
    }
}

/// Pulls tokens out of the shapes the backend has used over time:
/// `{ accessToken, refreshToken }`, `{ tokens: {...} }` and `{ data: {...} }`.
pub fn extract_credential(body: &Value) -> Option<Credential> {
    let candidates = [
        Some(body),
        body.get("tokens"),
        body.get("data"),
        body.pointer("/data/tokens"),
    ];
    candidates.into_iter().flatten().find_map(|node| {
        let access = token_field(node, &["accessToken", "access_token", "token"])?;
        let refresh = token_field(node, &["refreshToken", "refresh_token"]);
        Some(Credential::new(access, refresh))
    })
}

fn token_field(node: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| node.get(*name).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn refresher(url: &str) -> HttpRefresher {
        HttpRefresher::new(url, "/auth/refresh", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/refresh")
            .match_header("x-tenant-code", "DEMO")
            .match_body(Matcher::Json(json!({ "refreshToken": "r-1" })))
            .with_status(200)
            .with_body(r#"{"success": true, "accessToken": "a-2"}"#)
            .create_async()
            .await;

        let credential = refresher(&server.url()).refresh("r-1", "DEMO").await.unwrap();

        m.assert_async().await;
        assert_eq!(credential.access_token, "a-2");
        assert_eq!(credential.refresh_token, None);
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(403)
            .with_body(r#"{"error": "Invalid or expired refresh token"}"#)
            .create_async()
            .await;

        let err = refresher(&server.url()).refresh("r-1", "DEMO").await.unwrap_err();
        assert!(err.contains("403"), "{}", err);
        assert!(err.contains("Invalid or expired refresh token"), "{}", err);
    }

    #[tokio::test]
    async fn test_refresh_without_token_in_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let err = refresher(&server.url()).refresh("r-1", "DEMO").await.unwrap_err();
        assert!(err.contains("did not contain"), "{}", err);
    }

    #[test]
    fn test_extract_credential_shapes() {
        let login = json!({
            "user": { "id": "u-1" },
            "tokens": { "accessToken": "a", "refreshToken": "r" }
        });
        assert_eq!(
            extract_credential(&login),
            Some(Credential::new("a", Some("r".to_string())))
        );

        let wrapped = json!({ "data": { "access_token": "b" } });
        assert_eq!(extract_credential(&wrapped), Some(Credential::new("b", None)));

        assert_eq!(extract_credential(&json!({ "user": {} })), None);
    }
}
