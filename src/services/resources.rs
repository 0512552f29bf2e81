use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::request::ApiRequest;
use crate::pipeline::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Customers,
    Products,
    Orders,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Users => "/users",
            Resource::Customers => "/customers",
            Resource::Products => "/products",
            Resource::Orders => "/orders",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path()[1..])
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "users" => Ok(Resource::Users),
            "customers" => Ok(Resource::Customers),
            "products" => Ok(Resource::Products),
            "orders" => Ok(Resource::Orders),
            other => Err(format!("Unknown resource '{}'", other)),
        }
    }
}

/// Query parameters for list endpoints. Unset fields are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    /// Resource-specific filters such as `role` or `category`.
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(page) = self.page {
            request = request.with_query("page", page.to_string());
        }
        if let Some(limit) = self.limit {
            request = request.with_query("limit", limit.to_string());
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            request = request.with_query("search", search);
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            request = request.with_query("status", status);
        }
        for (key, value) in &self.filters {
            request = request.with_query(key.as_str(), value.as_str());
        }
        request
    }
}

/// CRUD over one REST collection. Responses are returned as the backend's
/// JSON, envelope included.
pub struct ResourceService {
    client: Arc<ApiClient>,
    resource: Resource,
}

impl ResourceService {
    pub fn new(client: Arc<ApiClient>, resource: Resource) -> Self {
        ResourceService { client, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub async fn list(&self, params: &ListParams) -> Result<Value, ApiError> {
        let request = params.apply(ApiRequest::get(self.resource.path()));
        self.client.execute(request).await?.json()
    }

    /// Aggregates for the collection (`/users/stats`, `/orders/stats`, ...).
    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.client
            .get_json(&format!("{}/stats", self.resource.path()))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        self.client.get_json(&self.item_path(id)).await
    }

    pub async fn create<B: Serialize>(&self, body: &B) -> Result<Value, ApiError> {
        self.client.post_json(self.resource.path(), body).await
    }

    pub async fn update<B: Serialize>(&self, id: &str, body: &B) -> Result<Value, ApiError> {
        self.client.put_json(&self.item_path(id), body).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.client.delete_json(&self.item_path(id)).await
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.resource.path(), id.trim_matches('/'))
    }
}
