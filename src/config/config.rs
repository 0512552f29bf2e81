use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::client::{ApiConfig, AuthConfig, RetryConfig};
use super::logging::LoggingConfig;
use super::storage::StorageConfig;
use super::tenant::TenantSettings;

/// Environment variables with this prefix override the YAML file,
/// nested keys separated by "__" (e.g. SALESSYNC_API__BASE_URL).
pub const ENV_PREFIX: &str = "SALESSYNC_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: backend location, retry/auth policy, tenant table, storage, logging.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub tenant: TenantSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigV1 {
    /// A configuration with every section at its default, pointed at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        ConfigV1 {
            api: ApiConfig {
                base_url: base_url.into(),
                timeout_in_ms: 30_000,
            },
            retry: RetryConfig::default(),
            auth: AuthConfig::default(),
            tenant: TenantSettings::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn extract(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load config from a YAML file, letting `SALESSYNC_*` environment variables override it.
pub fn load_config(path: &str) -> Result<ConfigV1, figment::Error> {
    let figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    extract(figment)
}

/// Parse a YAML document directly, without consulting the environment.
pub fn parse_config(yaml: &str) -> Result<ConfigV1, figment::Error> {
    extract(Figment::new().merge(Yaml::string(yaml)))
}

/// Render the JSON schema for the configuration.
pub fn config_schema() -> String {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

pub fn print_schema() {
    println!("{}", config_schema());
}
