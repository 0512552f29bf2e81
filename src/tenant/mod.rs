//! Working out which tenant a session belongs to.
//!
//! Strategies are tried in a fixed order and the first hit wins:
//! exact hostname, subdomain, `/tenant/<slug>` path, query parameter,
//! the backend's resolve endpoint, and finally the configured default.

pub mod remote;
pub mod resolver;
pub mod strategies;

pub use remote::RemoteStrategy;
pub use resolver::{create_strategies, TenantResolver};
pub use strategies::{
    HostnameStrategy, PathStrategy, QueryStrategy, SubdomainStrategy, TenantStrategy, TenantTable,
};
