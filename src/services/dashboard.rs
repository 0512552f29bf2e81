use std::sync::Arc;

use serde_json::Value;

use crate::error::ApiError;
use crate::models::request::ApiRequest;
use crate::pipeline::ApiClient;

pub struct DashboardService {
    client: Arc<ApiClient>,
}

impl DashboardService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        DashboardService { client }
    }

    pub async fn overview(&self) -> Result<Value, ApiError> {
        self.client.get_json("/dashboard").await
    }

    /// `period` is passed through as-is, e.g. "7d" or "month".
    pub async fn stats(&self, period: Option<&str>) -> Result<Value, ApiError> {
        let mut request = ApiRequest::get("/dashboard/stats");
        if let Some(period) = period {
            request = request.with_query("period", period);
        }
        self.client.execute(request).await?.json()
    }

    pub async fn activities(&self, limit: Option<u32>) -> Result<Value, ApiError> {
        let mut request = ApiRequest::get("/dashboard/activities");
        if let Some(limit) = limit {
            request = request.with_query("limit", limit.to_string());
        }
        self.client.execute(request).await?.json()
    }
}
