use std::sync::Arc;

use serde::Deserialize;

use crate::error::ApiError;
use crate::pipeline::ApiClient;

#[derive(Deserialize)]
struct Categories {
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct Brands {
    #[serde(default)]
    brands: Vec<String>,
}

/// Product lookup lists used to fill filters and forms.
pub struct CatalogService {
    client: Arc<ApiClient>,
}

impl CatalogService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        CatalogService { client }
    }

    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let body: Categories = self.client.get_json("/products/categories").await?;
        Ok(body.categories)
    }

    pub async fn brands(&self) -> Result<Vec<String>, ApiError> {
        let body: Brands = self.client.get_json("/products/brands").await?;
        Ok(body.brands)
    }
}
