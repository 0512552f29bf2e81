use serde::{Deserialize, Serialize};

/// Values that have leaked into storage in place of a real token.
const SENTINEL_TOKENS: [&str; 3] = ["", "null", "undefined"];

/// An access token and, when the backend issued one, the token that renews it.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Credential {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// False for empty strings and stringified nulls.
    pub fn is_usable(&self) -> bool {
        is_usable_token(&self.access_token)
    }

    /// The value of an `Authorization` header carrying this credential.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

pub fn is_usable_token(token: &str) -> bool {
    !SENTINEL_TOKENS.contains(&token.trim())
}

// Tokens never end up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}
