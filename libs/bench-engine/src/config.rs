use std::time::Duration;

use crate::error::EngineError;

/// Topic that receives benchmark results unless configured otherwise.
pub const DEFAULT_RESULT_TOPIC: &str = "benchmarks.results.v0";

/// Fixed cadence of metric queries.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything one run needs besides its backends.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Identity of the benchmark execution; becomes the result record key.
    pub benchmark_id: String,
    /// Instant query evaluated by the metric source on every tick.
    pub query: String,
    /// Value the metric must reach, compared exactly.
    pub expected_value: f64,
    pub timeout: Duration,
    pub result_topic: String,
    /// Base location of the dashboard linked from the result record.
    pub dashboard_url: String,
    /// Log every raw metric response at `info`.
    pub verbose: bool,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.benchmark_id.trim().is_empty() {
            return Err(EngineError::Config("benchmark id must not be empty".into()));
        }
        if self.query.trim().is_empty() {
            return Err(EngineError::Config("metric query must not be empty".into()));
        }
        if !self.expected_value.is_finite() {
            return Err(EngineError::Config("expected value must be a finite number".into()));
        }
        if self.timeout.is_zero() {
            return Err(EngineError::Config("timeout must be greater than zero".into()));
        }
        if self.expected_value.fract() != 0.0 {
            // Exact comparison against a fractional target rarely matches a
            // float sample; callers are expected to pre-round.
            tracing::warn!(
                expected = self.expected_value,
                "expected value is not integral; it must be matched exactly"
            );
        }
        Ok(())
    }
}
