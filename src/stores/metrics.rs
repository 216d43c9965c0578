//! Metrics dashboard state.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};

use super::{Busy, Generation};
use crate::api::MetricsService;
use crate::error::{DomainError, ValidationError};
use crate::models::{CurrentMonthMetrics, DeltaMetrics, MetricsSummary};
use crate::reactive::Signal;

/// Six months back from `today` (first of that month) through `today`'s
/// month, as `"YYYY-MM"` strings.
pub fn default_range(today: NaiveDate) -> (String, String) {
    let first = today.with_day(1).unwrap_or(today);
    let start = first.checked_sub_months(Months::new(6)).unwrap_or(first);
    (
        start.format("%Y-%m").to_string(),
        today.format("%Y-%m").to_string(),
    )
}

/// Month strings are zero-padded `"YYYY-MM"`, so string order is
/// chronological order.
fn check_range(start: &str, end: &str) -> Result<(), ValidationError> {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err(ValidationError::MissingRange);
    }
    if start > end {
        return Err(ValidationError::InvertedRange);
    }
    Ok(())
}

/// Errors from [`MetricsStore::load`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] DomainError),
}

/// State for the metrics dashboard.
///
/// Delta and summary are fetched as a joined pair over the selected range;
/// the current-month snapshot is independent and its failures stay silent.
pub struct MetricsStore {
    service: Arc<dyn MetricsService>,
    start: Signal<String>,
    end: Signal<String>,
    current_month: Signal<Option<CurrentMonthMetrics>>,
    delta: Signal<Option<DeltaMetrics>>,
    summary: Signal<Option<MetricsSummary>>,
    loading: Signal<bool>,
    error: Signal<Option<String>>,
    generation: Generation,
}

impl MetricsStore {
    pub fn new(service: Arc<dyn MetricsService>) -> Self {
        Self {
            service,
            start: Signal::default(),
            end: Signal::default(),
            current_month: Signal::new(None),
            delta: Signal::new(None),
            summary: Signal::new(None),
            loading: Signal::new(false),
            error: Signal::new(None),
            generation: Generation::default(),
        }
    }

    pub fn start(&self) -> &Signal<String> {
        &self.start
    }

    pub fn end(&self) -> &Signal<String> {
        &self.end
    }

    pub fn current_month(&self) -> &Signal<Option<CurrentMonthMetrics>> {
        &self.current_month
    }

    pub fn delta(&self) -> &Signal<Option<DeltaMetrics>> {
        &self.delta
    }

    pub fn summary(&self) -> &Signal<Option<MetricsSummary>> {
        &self.summary
    }

    pub fn loading(&self) -> &Signal<bool> {
        &self.loading
    }

    pub fn error(&self) -> &Signal<Option<String>> {
        &self.error
    }

    /// True once either range result is present.
    pub fn has_data(&self) -> bool {
        self.delta.with(Option::is_some) || self.summary.with(Option::is_some)
    }

    /// Select the range without loading it.
    pub fn set_range(&self, start: impl Into<String>, end: impl Into<String>) {
        self.start.set(start.into());
        self.end.set(end.into());
    }

    /// Select the default range for `today` and fetch everything.
    pub async fn init(&self, today: NaiveDate) -> Result<(), LoadError> {
        let (start, end) = default_range(today);
        self.set_range(start, end);
        let ((), result) = tokio::join!(self.load_current_month(), self.load());
        result
    }

    /// Fetch the current-month snapshot. Failures are logged only.
    pub async fn load_current_month(&self) {
        match self.service.current_month().await {
            Ok(metrics) => self.current_month.set(Some(metrics)),
            Err(err) => {
                tracing::error!(name: "metrics.current_month.failed", error = %err, status = ?err.status, "Error loading current month metrics");
            }
        }
    }

    /// Select `start..=end` and load it.
    pub async fn load_range(
        &self,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Result<(), LoadError> {
        self.set_range(start, end);
        self.load().await
    }

    /// Load delta and summary for the selected range.
    ///
    /// An invalid range sets the error and sends nothing. Both calls must
    /// succeed for either cell to change.
    pub async fn load(&self) -> Result<(), LoadError> {
        let start = self.start.get();
        let end = self.end.get();
        if let Err(invalid) = check_range(&start, &end) {
            self.error.set(Some(invalid.to_string()));
            return Err(invalid.into());
        }

        let ticket = self.generation.next();
        let _busy = Busy::raise_for(&self.loading, &self.generation, ticket);
        self.error.set(None);

        let result = tokio::try_join!(
            self.service.delta(&start, &end),
            self.service.summary(&start, &end)
        );

        if !self.generation.is_current(ticket) {
            tracing::debug!(name: "metrics.load.stale", ticket, "discarding superseded response");
            return result.map(|_| ()).map_err(LoadError::from);
        }

        match result {
            Ok((delta, summary)) => {
                tracing::debug!(name: "metrics.load.ok", start = %start, end = %end, months = delta.items.len(), "metrics loaded");
                self.delta.set(Some(delta));
                self.summary.set(Some(summary));
                Ok(())
            }
            Err(err) => {
                tracing::error!(name: "metrics.load.failed", start = %start, end = %end, error = %err, "Error loading metrics");
                self.error.set(Some(err.message.clone()));
                Err(err.into())
            }
        }
    }
}

impl fmt::Debug for MetricsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsStore")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
