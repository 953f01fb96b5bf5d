use serde::{Deserialize, Serialize};

/// Dashboard linked from every result record.
pub const DASHBOARD_PATH: &str = "/d/benchmark-overview/benchmark-overview";

/// Padding added on both sides of the run when building the dashboard window.
pub const DASHBOARD_MARGIN_MS: i64 = 30_000;

/// Key of a result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkKey {
    pub benchmark_id: String,
}

/// Value of a result record. Exactly one is published per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub passed: bool,
    pub rows_per_second: u64,
    pub start_ms: i64,
    pub end_ms: i64,
    pub dashboard_url: String,
}

impl BenchmarkResult {
    pub fn passed(rows_per_second: u64, start_ms: i64, end_ms: i64, dashboard_base: &str) -> Self {
        Self {
            passed: true,
            rows_per_second,
            start_ms,
            end_ms,
            dashboard_url: dashboard_url(dashboard_base, start_ms, end_ms),
        }
    }

    pub fn failed(start_ms: i64, end_ms: i64, dashboard_base: &str) -> Self {
        Self {
            passed: false,
            rows_per_second: 0,
            start_ms,
            end_ms,
            dashboard_url: dashboard_url(dashboard_base, start_ms, end_ms),
        }
    }
}

/// Link to the dashboard covering the run, padded by 30 s on each side.
pub fn dashboard_url(base: &str, start_ms: i64, end_ms: i64) -> String {
    format!(
        "{}{DASHBOARD_PATH}?from={}&to={}&tz=UTC",
        base.trim_end_matches('/'),
        start_ms - DASHBOARD_MARGIN_MS,
        end_ms + DASHBOARD_MARGIN_MS,
    )
}
