use std::future::Future;
use std::pin::Pin;

use crate::error::BackendError;

/// One instantaneous reading from a metric source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    /// Unix time in seconds, as reported by the source.
    pub timestamp: f64,
    pub value: f64,
}

impl MetricSample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A time-series backend that can evaluate a query at the current instant.
///
/// Implementations return every sample the backend produced. Deciding what
/// an empty or multi-sample answer means is up to the caller.
pub trait MetricSource: Send + Sync {
    fn query_instant<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MetricSample>, BackendError>> + Send + 'a>>;
}
