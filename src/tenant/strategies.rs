use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::TenantDomain;
use crate::models::request::Location;
use crate::models::tenant::TenantDescriptor;

/// One way of telling the tenant from where the user is.
#[async_trait]
pub trait TenantStrategy: Send + Sync {
    fn get_name(&self) -> &str;
    async fn resolve(&self, location: &Location) -> Option<TenantDescriptor>;
}

/// The static hostname table, searchable by hostname or by code.
#[derive(Debug, Clone, Default)]
pub struct TenantTable {
    domains: Vec<TenantDomain>,
}

impl TenantTable {
    pub fn new(domains: Vec<TenantDomain>) -> Self {
        TenantTable { domains }
    }

    pub fn by_hostname(&self, hostname: &str) -> Option<&TenantDescriptor> {
        self.domains
            .iter()
            .find(|d| d.hostname.eq_ignore_ascii_case(hostname))
            .map(|d| &d.tenant)
    }

    pub fn by_code(&self, code: &str) -> Option<&TenantDescriptor> {
        self.domains
            .iter()
            .map(|d| &d.tenant)
            .find(|t| t.code.eq_ignore_ascii_case(code))
    }

    /// "acme" -> the table's ACME_SA entry if there is one, else a new ACME_SA.
    pub fn derive(&self, slug: &str, suffix: &str, domain: Option<&str>) -> Option<TenantDescriptor> {
        let slug = slug.trim();
        if slug.is_empty() {
            return None;
        }
        let code = format!("{}{}", slug.to_uppercase(), suffix);
        Some(
            self.by_code(&code)
                .cloned()
                .unwrap_or_else(|| TenantDescriptor::synthesized(code, domain)),
        )
    }
}

pub struct HostnameStrategy {
    table: Arc<TenantTable>,
}

impl HostnameStrategy {
    pub fn new(table: Arc<TenantTable>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl TenantStrategy for HostnameStrategy {
    fn get_name(&self) -> &str {
        "hostname"
    }

    async fn resolve(&self, location: &Location) -> Option<TenantDescriptor> {
        self.table.by_hostname(&location.hostname).cloned()
    }
}

/// `acme.example.com` -> ACME_SA. Needs at least three labels; IP addresses never match.
pub struct SubdomainStrategy {
    table: Arc<TenantTable>,
    suffix: String,
}

impl SubdomainStrategy {
    pub fn new(table: Arc<TenantTable>, suffix: &str) -> Self {
        Self {
            table,
            suffix: suffix.to_string(),
        }
    }
}

#[async_trait]
impl TenantStrategy for SubdomainStrategy {
    fn get_name(&self) -> &str {
        "subdomain"
    }

    async fn resolve(&self, location: &Location) -> Option<TenantDescriptor> {
        let hostname = location.hostname.as_str();
        if hostname.parse::<IpAddr>().is_ok() {
            return None;
        }
        let labels: Vec<&str> = hostname.split('.').collect();
        if labels.len() < 3 {
            return None;
        }
        self.table.derive(labels[0], &self.suffix, Some(hostname))
    }
}

/// `/tenant/acme/...` -> ACME_SA.
pub struct PathStrategy {
    table: Arc<TenantTable>,
    prefix: String,
    suffix: String,
}

impl PathStrategy {
    pub fn new(table: Arc<TenantTable>, prefix: &str, suffix: &str) -> Self {
        Self {
            table,
            prefix: prefix.trim_matches('/').to_string(),
            suffix: suffix.to_string(),
        }
    }
}

#[async_trait]
impl TenantStrategy for PathStrategy {
    fn get_name(&self) -> &str {
        "path"
    }

    async fn resolve(&self, location: &Location) -> Option<TenantDescriptor> {
        let mut segments = location.path.trim_start_matches('/').split('/');
        if segments.next()? != self.prefix {
            return None;
        }
        let slug = segments.next()?;
        self.table.derive(slug, &self.suffix, None)
    }
}

/// `?tenant=PEPSI_SA` names the code outright.
pub struct QueryStrategy {
    table: Arc<TenantTable>,
    param: String,
}

impl QueryStrategy {
    pub fn new(table: Arc<TenantTable>, param: &str) -> Self {
        Self {
            table,
            param: param.to_string(),
        }
    }
}

#[async_trait]
impl TenantStrategy for QueryStrategy {
    fn get_name(&self) -> &str {
        "query"
    }

    async fn resolve(&self, location: &Location) -> Option<TenantDescriptor> {
        let code = location.query_value(&self.param)?.trim().to_uppercase();
        if code.is_empty() {
            return None;
        }
        Some(
            self.table
                .by_code(&code)
                .cloned()
                .unwrap_or_else(|| TenantDescriptor::synthesized(code, None)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_domains;

    fn table() -> Arc<TenantTable> {
        Arc::new(TenantTable::new(default_domains()))
    }

    fn at(url: &str) -> Location {
        Location::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_hostname_exact_match() {
        let strategy = HostnameStrategy::new(table());
        let demo = strategy.resolve(&at("https://demo.salessync.com/")).await.unwrap();
        assert_eq!(demo, TenantDescriptor::default_tenant());
        assert!(strategy.resolve(&at("https://acme.example.com/")).await.is_none());
    }

    #[tokio::test]
    async fn test_subdomain_synthesizes_code() {
        let strategy = SubdomainStrategy::new(table(), "_SA");
        let acme = strategy.resolve(&at("https://acme.example.com/")).await.unwrap();
        assert_eq!(acme.code, "ACME_SA");
        assert_eq!(acme.domain.as_deref(), Some("acme.example.com"));
    }

    #[tokio::test]
    async fn test_subdomain_prefers_table_entry_with_same_code() {
        let strategy = SubdomainStrategy::new(table(), "_SA");
        let pepsi = strategy.resolve(&at("https://pepsi.other-host.net/")).await.unwrap();
        assert_eq!(pepsi.name, "Pepsi South Africa");
        assert_eq!(pepsi.domain.as_deref(), Some("pepsi.salessync.com"));
    }

    #[tokio::test]
    async fn test_subdomain_needs_three_labels_and_no_ip() {
        let strategy = SubdomainStrategy::new(table(), "_SA");
        assert!(strategy.resolve(&at("https://salessync.com/")).await.is_none());
        assert!(strategy.resolve(&at("http://localhost:3000/")).await.is_none());
        assert!(strategy.resolve(&at("http://192.168.1.10/")).await.is_none());
    }

    #[tokio::test]
    async fn test_path_slug() {
        let strategy = PathStrategy::new(table(), "tenant", "_SA");
        let acme = strategy
            .resolve(&at("http://localhost/tenant/acme/orders"))
            .await
            .unwrap();
        assert_eq!(acme.code, "ACME_SA");
        assert!(strategy.resolve(&at("http://localhost/tenant/")).await.is_none());
        assert!(strategy.resolve(&at("http://localhost/orders/acme")).await.is_none());
    }

    #[tokio::test]
    async fn test_query_code() {
        let strategy = QueryStrategy::new(table(), "tenant");
        let pepsi = strategy
            .resolve(&at("http://localhost/?tenant=pepsi_sa"))
            .await
            .unwrap();
        assert_eq!(pepsi.name, "Pepsi South Africa");
        let other = strategy
            .resolve(&at("http://localhost/?tenant=NEWCO"))
            .await
            .unwrap();
        assert_eq!(other.code, "NEWCO");
        assert!(strategy.resolve(&at("http://localhost/?tenant=")).await.is_none());
    }
}
