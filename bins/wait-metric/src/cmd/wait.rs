use std::sync::Arc;

use bench_api::EventLog;
use bench_engine::Engine;
use log_file::FileLog;
use log_memory::MemoryLog;
use log_rest_proxy::RestProxyLog;
use source_prometheus::PrometheusSource;

use super::config::{Effective, LogBackend};
use super::error::WaitError;

fn build_log(eff: &Effective) -> Result<Arc<dyn EventLog>, WaitError> {
    let log: Arc<dyn EventLog> = match &eff.log {
        LogBackend::RestProxy { url } => Arc::new(RestProxyLog::new(url, eff.http_timeout)?),
        LogBackend::File { dir } => Arc::new(FileLog::new(dir.clone())),
        LogBackend::Memory => {
            tracing::warn!("memory event log selected; the result will not outlive this process");
            Arc::new(MemoryLog::new())
        }
    };
    Ok(log)
}

/// Wait for the metric and record the result. Returns the process exit code
/// of a recorded run.
pub async fn run(eff: &Effective) -> Result<i32, WaitError> {
    let log = build_log(eff)?;
    let engine = Engine::bootstrap(&eff.schema_dir, log)?;
    let source = PrometheusSource::new(&eff.prometheus_url, eff.http_timeout)?;

    let report = engine.execute(&eff.run, &source).await?;
    tracing::info!(
        benchmark_id = %eff.run.benchmark_id,
        passed = report.passed(),
        partition = ?report.ack.partition,
        offset = ?report.ack.offset,
        "result recorded"
    );
    Ok(report.exit_code())
}
