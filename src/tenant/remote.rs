use std::time::Duration;

use async_trait::async_trait;
use cached::Return;
#[allow(unused_imports)]
use cached::proc_macro::cached;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::strategies::TenantStrategy;
use crate::models::request::Location;
use crate::models::tenant::TenantDescriptor;
use crate::utils::log_throttle::should_emit;

const CACHE_HIT_LOG_WINDOW: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ResolveResponse {
    data: TenantDescriptor,
}

/// Asks the backend which tenant owns a hostname/path. Last resort
/// before the default, so a failure here is logged and skipped.
pub struct RemoteStrategy {
    url: String,
}

impl RemoteStrategy {
    pub fn new(base_url: &str, resolve_path: &str) -> Self {
        let url = format!("{}{}", base_url.trim_end_matches('/'), resolve_path);
        info!("Creating remote tenant strategy for '{}'", url);
        Self { url }
    }
}

/// Calls the resolve endpoint. Results are cached for 300 seconds per (url, domain, path).
#[cfg_attr(
    not(test),
    cached(
        time = 300,
        result = true,
        with_cached_flag = true,
        sync_writes = "default"
    )
)]
async fn resolve_remote(
    url: String,
    domain: String,
    path: String,
) -> Result<Return<TenantDescriptor>, String> {
    debug!("Resolving tenant for domain='{}' path='{}' via '{}'", domain, path, url);

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "domain": domain, "path": path }))
        .send()
        .await
        .map_err(|e| format!("Failed to call tenant resolve endpoint: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("Tenant resolve endpoint returned {}", resp.status()));
    }

    let body = resp
        .json::<ResolveResponse>()
        .await
        .map_err(|e| format!("Failed to parse tenant resolve response: {}", e))?;

    Ok(Return::new(body.data))
}

#[async_trait]
impl TenantStrategy for RemoteStrategy {
    fn get_name(&self) -> &str {
        "remote"
    }

    async fn resolve(&self, location: &Location) -> Option<TenantDescriptor> {
        match resolve_remote(
            self.url.clone(),
            location.hostname.clone(),
            location.path.clone(),
        )
        .await
        {
            Ok(resolved) => {
                if resolved.was_cached {
                    if let Some(suppressed_count) =
                        should_emit("tenant.remote.cache.hit", CACHE_HIT_LOG_WINDOW)
                    {
                        debug!(
                            event_name = "tenant.remote.cache.hit",
                            event_domain = "tenant",
                            hostname = location.hostname.as_str(),
                            cache_result = "hit",
                            cache_ttl_seconds = 300,
                            suppressed_count,
                            "tenant resolution served from cache"
                        );
                    }
                }
                Some(resolved.value)
            }
            Err(e) => {
                debug!("Remote tenant resolution failed: {}", e);
                None
            }
        }
    }
}
