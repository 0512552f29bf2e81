use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::tenant::TenantDescriptor;

/// Tenant resolution settings: the static table plus the knobs of each heuristic.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct TenantSettings {
    /// Hostname -> tenant table consulted first.
    #[serde(default = "default_domains")]
    pub domains: Vec<TenantDomain>,
    #[serde(default = "TenantDescriptor::default_tenant")]
    pub default: TenantDescriptor,
    /// Appended to a derived slug, so "acme" becomes "ACME_SA".
    #[serde(default = "default_code_suffix")]
    pub code_suffix: String,
    /// First path segment announcing a tenant slug, as in "/tenant/acme/...".
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    #[serde(default = "default_resolve_path")]
    pub resolve_path: String,
    #[serde(default = "default_remote_enabled")]
    pub remote_enabled: bool,
}

/// One row of the static hostname table.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq)]
pub struct TenantDomain {
    pub hostname: String,
    pub tenant: TenantDescriptor,
}

fn default_code_suffix() -> String {
    "_SA".to_string()
}

fn default_path_prefix() -> String {
    "tenant".to_string()
}

fn default_query_param() -> String {
    "tenant".to_string()
}

fn default_resolve_path() -> String {
    "/tenant/resolve".to_string()
}

fn default_remote_enabled() -> bool {
    true
}

/// The built-in table: the demo tenant on its own domain and on localhost,
/// plus the Pepsi South Africa tenant.
pub fn default_domains() -> Vec<TenantDomain> {
    let demo = TenantDescriptor::default_tenant();
    let pepsi = TenantDescriptor::new("PEPSI_SA", "Pepsi South Africa", Some("pepsi.salessync.com"));
    vec![
        TenantDomain {
            hostname: "demo.salessync.com".to_string(),
            tenant: demo.clone(),
        },
        TenantDomain {
            hostname: "localhost".to_string(),
            tenant: demo,
        },
        TenantDomain {
            hostname: "pepsi.salessync.com".to_string(),
            tenant: pepsi,
        },
    ]
}

impl Default for TenantSettings {
    fn default() -> Self {
        TenantSettings {
            domains: default_domains(),
            default: TenantDescriptor::default_tenant(),
            code_suffix: default_code_suffix(),
            path_prefix: default_path_prefix(),
            query_param: default_query_param(),
            resolve_path: default_resolve_path(),
            remote_enabled: default_remote_enabled(),
        }
    }
}
