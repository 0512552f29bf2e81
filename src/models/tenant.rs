use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Code sent when nothing has been resolved yet.
pub const DEFAULT_TENANT_CODE: &str = "DEMO";

/// The tenant a session talks to. Only `code` travels with requests;
/// the rest is what the backend's resolve endpoint hands back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
pub struct TenantDescriptor {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

impl TenantDescriptor {
    pub fn new(code: &str, name: &str, domain: Option<&str>) -> Self {
        TenantDescriptor {
            code: code.to_string(),
            name: name.to_string(),
            domain: domain.map(str::to_string),
            features: BTreeMap::new(),
        }
    }

    /// The SalesSync demo tenant.
    pub fn default_tenant() -> Self {
        TenantDescriptor::new(DEFAULT_TENANT_CODE, "SalesSync Demo", Some("demo.salessync.com"))
    }

    /// A descriptor for a code no table knows about.
    pub fn synthesized(code: String, domain: Option<&str>) -> Self {
        TenantDescriptor {
            name: code.clone(),
            code,
            domain: domain.map(str::to_string),
            features: BTreeMap::new(),
        }
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.get(feature).copied().unwrap_or(false)
    }
}

#[test]
fn test_descriptor_deserializes_without_optional_fields() {
    let tenant: TenantDescriptor =
        serde_json::from_str(r#"{"code": "PEPSI_SA", "name": "Pepsi South Africa"}"#).unwrap();
    assert_eq!(tenant.code, "PEPSI_SA");
    assert_eq!(tenant.domain, None);
    assert!(tenant.features.is_empty());
    assert!(!tenant.has_feature("vanLoading"));
}

#[test]
fn test_synthesized_descriptor_uses_code_as_name() {
    let tenant = TenantDescriptor::synthesized("ACME_SA".to_string(), Some("acme.example.com"));
    assert_eq!(tenant.name, "ACME_SA");
    assert_eq!(tenant.domain.as_deref(), Some("acme.example.com"));
}
