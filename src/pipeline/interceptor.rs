use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION};
use http::{HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::models::credential::is_usable_token;
use crate::models::request::ApiRequest;
use crate::models::tenant::DEFAULT_TENANT_CODE;
use crate::utils::log_throttle::should_emit;

pub const TENANT_HEADER: &str = "x-tenant-code";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const ANONYMOUS_LOG_WINDOW: Duration = Duration::from_secs(60);

/// Shape an outgoing request: bearer token when one is usable (and no stale
/// `Authorization` otherwise), the tenant code, a request id. Never fails.
pub fn prepare_request(request: &ApiRequest, token: Option<&str>, tenant_code: &str) -> ApiRequest {
    let mut outgoing = request.clone();
    let headers = &mut outgoing.headers;

    match token.filter(|t| is_usable_token(t)).map(bearer_value) {
        Some(Ok(value)) => {
            headers.insert(AUTHORIZATION, value);
        }
        Some(Err(_)) => {
            warn!(request_id = %request.id, "Stored token is not a valid header value; sending without it");
            headers.remove(AUTHORIZATION);
        }
        None => {
            headers.remove(AUTHORIZATION);
            if let Some(suppressed_count) =
                should_emit("pipeline.request.anonymous", ANONYMOUS_LOG_WINDOW)
            {
                debug!(
                    event_name = "pipeline.request.anonymous",
                    event_domain = "pipeline",
                    suppressed_count,
                    "no token available for API request"
                );
            }
        }
    }

    let tenant = HeaderValue::from_str(tenant_code).unwrap_or_else(|_| {
        warn!("Tenant code '{}' is not a valid header value", tenant_code);
        HeaderValue::from_static(DEFAULT_TENANT_CODE)
    });
    headers.insert(HeaderName::from_static(TENANT_HEADER), tenant);

    if let Ok(id) = HeaderValue::from_str(&request.id.to_string()) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), id);
    }
    headers
        .entry(ACCEPT)
        .or_insert(HeaderValue::from_static("application/json"));

    outgoing
}

fn bearer_value(token: &str) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(request: &'a ApiRequest, name: &str) -> Option<&'a str> {
        request.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_token_and_tenant_are_attached() {
        let request = ApiRequest::get("/customers");
        let outgoing = prepare_request(&request, Some("abc"), "PEPSI_SA");

        assert_eq!(header(&outgoing, "authorization"), Some("Bearer abc"));
        assert_eq!(header(&outgoing, "x-tenant-code"), Some("PEPSI_SA"));
        assert_eq!(
            header(&outgoing, "x-request-id"),
            Some(request.id.to_string().as_str())
        );
        // The descriptor itself is untouched.
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_stale_authorization_is_removed() {
        let request = ApiRequest::get("/customers")
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer old"));

        for token in [None, Some(""), Some("null"), Some("undefined")] {
            let outgoing = prepare_request(&request, token, "DEMO");
            assert_eq!(header(&outgoing, "authorization"), None, "{:?}", token);
            assert_eq!(header(&outgoing, "x-tenant-code"), Some("DEMO"));
        }
    }

    #[test]
    fn test_same_inputs_give_same_headers() {
        let request = ApiRequest::get("/orders");
        let first = prepare_request(&request, Some("abc"), "DEMO");
        let second = prepare_request(&first, Some("abc"), "DEMO");
        assert_eq!(first.headers, second.headers);
    }

    #[test]
    fn test_invalid_tenant_code_falls_back_to_default() {
        let outgoing = prepare_request(&ApiRequest::get("/orders"), None, "bad\ncode");
        assert_eq!(header(&outgoing, "x-tenant-code"), Some(DEFAULT_TENANT_CODE));
    }

    #[test]
    fn test_token_with_newline_is_dropped() {
        let outgoing = prepare_request(&ApiRequest::get("/orders"), Some("a\nb"), "DEMO");
        assert_eq!(header(&outgoing, "authorization"), None);
    }
}
