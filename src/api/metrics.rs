//! Metrics resource: `/metrics/*`.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::{Resource, Result};
use crate::models::{CurrentMonthMetrics, DeltaMetrics, MetricsSummary};

/// Remote metrics queries. Range bounds are `"YYYY-MM"` strings and are not
/// validated here.
#[async_trait]
pub trait MetricsService: Send + Sync {
    async fn current_month(&self) -> Result<CurrentMonthMetrics>;

    async fn delta(&self, start: &str, end: &str) -> Result<DeltaMetrics>;

    async fn summary(&self, start: &str, end: &str) -> Result<MetricsSummary>;
}

/// HTTP implementation of [`MetricsService`].
#[derive(Debug, Clone)]
pub struct MetricsApi {
    client: ApiClient,
}

impl MetricsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricsService for MetricsApi {
    async fn current_month(&self) -> Result<CurrentMonthMetrics> {
        self.client
            .get_json(Resource::Metrics, "/metrics/current-month/", &[])
            .await
    }

    async fn delta(&self, start: &str, end: &str) -> Result<DeltaMetrics> {
        self.client
            .get_json(
                Resource::Metrics,
                "/metrics/delta/",
                &[("start", start), ("end", end)],
            )
            .await
    }

    async fn summary(&self, start: &str, end: &str) -> Result<MetricsSummary> {
        self.client
            .get_json(
                Resource::Metrics,
                "/metrics/summary/",
                &[("start", start), ("end", end)],
            )
            .await
    }
}
