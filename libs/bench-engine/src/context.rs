use std::time::Duration;

use tokio::time::Instant;

use bench_api::now_ms;

/// Identity and timing of one benchmark execution.
///
/// The wall-clock start is read once and only feeds the timestamps written
/// to the result record. Elapsed time comes from a monotonic baseline.
#[derive(Debug, Clone)]
pub struct RunContext {
    benchmark_id: String,
    start_ms: i64,
    started: Instant,
}

impl RunContext {
    pub fn start(benchmark_id: impl Into<String>) -> Self {
        Self::with_start_ms(benchmark_id, now_ms())
    }

    pub fn with_start_ms(benchmark_id: impl Into<String>, start_ms: i64) -> Self {
        Self {
            benchmark_id: benchmark_id.into(),
            start_ms,
            started: Instant::now(),
        }
    }

    pub fn benchmark_id(&self) -> &str {
        &self.benchmark_id
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock time, in ms, `elapsed` after the start of the run.
    pub fn end_ms(&self, elapsed: Duration) -> i64 {
        self.start_ms + elapsed.as_millis() as i64
    }
}
