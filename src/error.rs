//! The single error shape every failed API call is reported in.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// `{ message, code, status, data? }`. `status` is 0 when no response arrived.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message} ({code}, status {status})")]
pub struct ApiError {
    pub message: String,
    pub code: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, code: impl Into<String>, status: u16) -> Self {
        ApiError {
            message: message.into(),
            code: code.into(),
            status,
            data: None,
        }
    }

    /// No response was received, whatever the transport said.
    pub fn network() -> Self {
        ApiError::new(NETWORK_ERROR_MESSAGE, NETWORK_ERROR, 0)
    }

    pub fn serialization(detail: impl Into<String>) -> Self {
        ApiError::new(detail, SERIALIZATION_ERROR, 0)
    }

    /// Normalize a non-2xx response. The server's `message` (or legacy `error`)
    /// and `code` win when present; the body is kept as `data`.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let data = parse_body(body);

        let message = data
            .as_ref()
            .and_then(|d| string_field(d, "message").or_else(|| string_field(d, "error")))
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        let code = data
            .as_ref()
            .and_then(|d| string_field(d, "code"))
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

        ApiError {
            message,
            code,
            status,
            data,
        }
    }

    pub fn is_network(&self) -> bool {
        self.code == NETWORK_ERROR
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }
}

fn parse_body(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_message_and_code_pass_through() {
        let body = json!({ "message": "X", "code": "Y" });
        let err = ApiError::from_response(422, body.to_string().as_bytes());
        assert_eq!(
            err,
            ApiError {
                message: "X".to_string(),
                code: "Y".to_string(),
                status: 422,
                data: Some(body),
            }
        );
    }

    #[test]
    fn test_legacy_error_field_is_used_as_message() {
        let err = ApiError::from_response(403, br#"{"error": "Invalid refresh token"}"#);
        assert_eq!(err.message, "Invalid refresh token");
        assert_eq!(err.code, UNKNOWN_ERROR);
        assert_eq!(err.status, 403);
    }

    #[test]
    fn test_fallbacks_for_empty_and_non_json_bodies() {
        let empty = ApiError::from_response(500, b"");
        assert_eq!(empty.message, UNKNOWN_ERROR_MESSAGE);
        assert_eq!(empty.code, UNKNOWN_ERROR);
        assert_eq!(empty.data, None);

        let html = ApiError::from_response(502, b"<h1>Bad Gateway</h1>");
        assert_eq!(html.code, UNKNOWN_ERROR);
        assert_eq!(html.data, Some(Value::String("<h1>Bad Gateway</h1>".to_string())));
    }

    #[test]
    fn test_network_error_shape() {
        let err = ApiError::network();
        assert!(err.message.starts_with("Network error"));
        assert_eq!(err.code, NETWORK_ERROR);
        assert_eq!(err.status, 0);
        assert!(err.is_network());
        let serialized = serde_json::to_value(&err).unwrap();
        assert!(serialized.get("data").is_none());
    }
}
