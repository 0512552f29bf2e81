use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// One logical API call. The pipeline never mutates it: headers added by the
/// interceptor and attempt counters live alongside, per attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub id: Uuid,
    pub method: Method,
    /// Path relative to the configured base URL, e.g. "/customers/42".
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::serialization(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A successful (2xx) response, body kept as raw bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        // Empty 2xx bodies (204, DELETE) read as null.
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(Value::Null)
                .map_err(|e| ApiError::serialization(e.to_string()));
        }
        serde_json::from_slice(&self.body).map_err(|e| ApiError::serialization(e.to_string()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The page the user is on: what tenant heuristics and redirects look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub hostname: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn new(hostname: impl Into<String>, path: impl Into<String>) -> Self {
        Location {
            hostname: hostname.into(),
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn parse(url: &str) -> Result<Self, String> {
        let url = Url::parse(url).map_err(|e| format!("Invalid location URL '{}': {}", url, e))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| format!("Location URL '{}' has no host", url))?
            .to_ascii_lowercase();
        Ok(Location {
            hostname,
            path: url.path().to_string(),
            query: url.query_pairs().into_owned().collect(),
        })
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse() {
        let location = Location::parse("https://Acme.Example.com/tenant/acme/orders?tenant=PEPSI_SA&x=1")
            .expect("valid url");
        assert_eq!(location.hostname, "acme.example.com");
        assert_eq!(location.path, "/tenant/acme/orders");
        assert_eq!(location.query_value("tenant"), Some("PEPSI_SA"));
        assert_eq!(location.query_value("missing"), None);
    }

    #[test]
    fn test_location_parse_rejects_garbage() {
        assert!(Location::parse("not a url").is_err());
    }

    #[test]
    fn test_response_json_on_empty_body() {
        let response = ApiResponse {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: Vec::new(),
        };
        let value: Value = response.json().expect("null body");
        assert!(value.is_null());
    }

    #[test]
    fn test_response_json_invalid_body() {
        let response = ApiResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: b"<html>".to_vec(),
        };
        let err = response.json::<Value>().unwrap_err();
        assert_eq!(err.code, crate::error::SERIALIZATION_ERROR);
    }
}
