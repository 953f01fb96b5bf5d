use std::time::Duration;

use bench_api::{LogAck, MetricSource};

use crate::config::RunConfig;
use crate::context::RunContext;
use crate::error::EngineError;
use crate::poller::{MetricPoller, PollOutcome};
use crate::result::{BenchmarkKey, BenchmarkResult};
use crate::sink::{ResultSink, SinkTable};

/// How the poll phase of a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(PollOutcome),
    /// Polling aborted with an error. The failure result is still published
    /// before `cause` is returned.
    Fault { cause: EngineError, elapsed: Duration },
}

impl RunOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            RunOutcome::Completed(outcome) => outcome.elapsed(),
            RunOutcome::Fault { elapsed, .. } => *elapsed,
        }
    }
}

/// A run whose result record was published.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: PollOutcome,
    pub result: BenchmarkResult,
    pub ack: LogAck,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.result.passed
    }

    /// 0 when the metric matched, 1 on ambiguity or timeout.
    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Orchestrator
// ═══════════════════════════════════════════════════════════════

/// Drives one run: poll, decide, record.
///
/// Every path through `execute` makes exactly one publish attempt.
pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    sink: &'a ResultSink,
    source: &'a dyn MetricSource,
}

impl<'a> Orchestrator<'a> {
    /// Validates `config` and resolves the result topic. Both happen before
    /// the metric source is touched.
    pub fn new(
        config: &'a RunConfig,
        sinks: &'a SinkTable,
        source: &'a dyn MetricSource,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let sink = sinks.get(&config.result_topic)?;
        Ok(Self { config, sink, source })
    }

    pub async fn execute(&self) -> Result<RunReport, EngineError> {
        let ctx = RunContext::start(&self.config.benchmark_id);
        tracing::info!(
            benchmark_id = %ctx.benchmark_id(),
            query = %self.config.query,
            expected = self.config.expected_value,
            timeout_s = self.config.timeout.as_secs(),
            topic = %self.sink.topic(),
            "waiting for metric"
        );

        let outcome = match MetricPoller::new(self.source, self.config).run(&ctx).await {
            Ok(outcome) => RunOutcome::Completed(outcome),
            Err(cause) => RunOutcome::Fault {
                cause,
                elapsed: ctx.elapsed(),
            },
        };

        self.record(&ctx, outcome).await
    }

    async fn record(
        &self,
        ctx: &RunContext,
        outcome: RunOutcome,
    ) -> Result<RunReport, EngineError> {
        let start_ms = ctx.start_ms();
        let end_ms = ctx.end_ms(outcome.elapsed());
        let base = &self.config.dashboard_url;

        match outcome {
            RunOutcome::Completed(outcome) => {
                let result = match &outcome {
                    PollOutcome::Matched { rows_per_second, .. } => {
                        BenchmarkResult::passed(*rows_per_second, start_ms, end_ms, base)
                    }
                    _ => BenchmarkResult::failed(start_ms, end_ms, base),
                };
                self.report(&outcome);

                // A delivery error here is the run's error; there is no
                // second attempt.
                let ack = self.publish(ctx, &result).await?;
                println!("Dashboard: {}", result.dashboard_url);
                Ok(RunReport { outcome, result, ack })
            }
            RunOutcome::Fault { cause, elapsed } => {
                let result = BenchmarkResult::failed(start_ms, end_ms, base);
                tracing::error!(
                    benchmark_id = %ctx.benchmark_id(),
                    elapsed_s = elapsed.as_secs_f64(),
                    error = %cause,
                    "run aborted"
                );
                println!(
                    "FAILED! Run aborted after {:.1}s: {cause}",
                    elapsed.as_secs_f64()
                );

                match self.publish(ctx, &result).await {
                    Ok(_) => {
                        println!("Dashboard: {}", result.dashboard_url);
                        Err(cause)
                    }
                    Err(publish) => {
                        tracing::error!(error = %publish, "failure result not recorded");
                        Err(EngineError::Unrecorded {
                            cause: Box::new(cause),
                            publish: Box::new(publish),
                        })
                    }
                }
            }
        }
    }

    async fn publish(
        &self,
        ctx: &RunContext,
        result: &BenchmarkResult,
    ) -> Result<LogAck, EngineError> {
        let key = BenchmarkKey {
            benchmark_id: ctx.benchmark_id().to_string(),
        };
        self.sink.publish_as(&key, result).await
    }

    fn report(&self, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Matched {
                value,
                rows_per_second,
                elapsed,
            } => {
                tracing::info!(
                    value,
                    rows_per_second,
                    elapsed_s = elapsed.as_secs_f64(),
                    "metric matched"
                );
                println!(
                    "SUCCESS! Reached {value} after {:.1}s: {rows_per_second} rows/s",
                    elapsed.as_secs_f64()
                );
            }
            PollOutcome::Ambiguous { samples, elapsed } => {
                tracing::warn!(
                    samples,
                    query = %self.config.query,
                    "query returned more than one sample"
                );
                println!(
                    "FAILED! Query returned {samples} samples after {:.1}s, expected at most one",
                    elapsed.as_secs_f64()
                );
            }
            PollOutcome::TimedOut { last_value, elapsed } => {
                let last = last_value.map_or_else(|| "no value".to_string(), |v| v.to_string());
                tracing::warn!(last = %last, elapsed_s = elapsed.as_secs_f64(), "timed out");
                println!(
                    "FAILED! Timed out after {:.1}s, last value: {last}, expected: {}",
                    elapsed.as_secs_f64(),
                    self.config.expected_value
                );
            }
        }
    }
}
