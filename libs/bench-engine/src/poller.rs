use std::time::Duration;

use bench_api::{MetricSample, MetricSource};

use crate::config::{RunConfig, POLL_INTERVAL};
use crate::context::RunContext;
use crate::error::EngineError;

/// Terminal state of the poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The metric reported exactly the expected value.
    Matched {
        value: f64,
        rows_per_second: u64,
        elapsed: Duration,
    },
    /// A single query returned more than one sample. The query selects
    /// several series, which no amount of waiting fixes.
    Ambiguous { samples: usize, elapsed: Duration },
    /// The timeout passed without a match.
    TimedOut {
        last_value: Option<f64>,
        elapsed: Duration,
    },
}

impl PollOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Matched { elapsed, .. }
            | PollOutcome::Ambiguous { elapsed, .. }
            | PollOutcome::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

/// What one metric response means for the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Keep polling; carries the sample value if there was one.
    Pending(Option<f64>),
    Terminal(PollOutcome),
}

/// Rate achieved when `value` was reached after `elapsed`.
///
/// Elapsed time is floored at one second, so sub-second completions do not
/// report inflated rates. The result is capped at `i64::MAX`, the largest
/// rate an Avro `long` holds.
pub fn rows_per_second(value: f64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64().max(1.0);
    let rate = (value / secs).round().max(0.0) as u64;
    rate.min(i64::MAX as u64)
}

// ═══════════════════════════════════════════════════════════════
//  MetricPoller
// ═══════════════════════════════════════════════════════════════

/// Polling → {Matched, Ambiguous, TimedOut}.
///
/// Queries the source once per `POLL_INTERVAL`. A failing query is not a
/// state of the machine: it aborts the loop with the error.
pub struct MetricPoller<'a> {
    source: &'a dyn MetricSource,
    query: &'a str,
    expected: f64,
    timeout: Duration,
    verbose: bool,
}

impl<'a> MetricPoller<'a> {
    pub fn new(source: &'a dyn MetricSource, config: &'a RunConfig) -> Self {
        Self {
            source,
            query: &config.query,
            expected: config.expected_value,
            timeout: config.timeout,
            verbose: config.verbose,
        }
    }

    pub async fn run(&self, ctx: &RunContext) -> Result<PollOutcome, EngineError> {
        let mut last_value = None;
        let mut tick = 0u64;

        loop {
            let samples = self
                .source
                .query_instant(self.query)
                .await
                .map_err(|e| {
                    EngineError::MetricSource(e.with_context(format!("query '{}'", self.query)))
                })?;
            let elapsed = ctx.elapsed();
            self.log_response(tick, elapsed, &samples);

            match self.observe(&samples, elapsed) {
                Observation::Terminal(outcome) => return Ok(outcome),
                Observation::Pending(Some(value)) => last_value = Some(value),
                Observation::Pending(None) => {}
            }

            tokio::time::sleep(POLL_INTERVAL).await;
            tick += 1;

            let elapsed = ctx.elapsed();
            if elapsed >= self.timeout {
                return Ok(PollOutcome::TimedOut { last_value, elapsed });
            }
        }
    }

    /// Classify one response. Exact equality, no tolerance.
    pub fn observe(&self, samples: &[MetricSample], elapsed: Duration) -> Observation {
        match samples {
            [] => Observation::Pending(None),
            [sample] if sample.value == self.expected => {
                Observation::Terminal(PollOutcome::Matched {
                    value: sample.value,
                    rows_per_second: rows_per_second(sample.value, elapsed),
                    elapsed,
                })
            }
            [sample] => Observation::Pending(Some(sample.value)),
            many => Observation::Terminal(PollOutcome::Ambiguous {
                samples: many.len(),
                elapsed,
            }),
        }
    }

    fn log_response(&self, tick: u64, elapsed: Duration, samples: &[MetricSample]) {
        let elapsed_s = elapsed.as_secs_f64();
        if self.verbose {
            tracing::info!(
                tick,
                elapsed_s,
                query = %self.query,
                ?samples,
                "metric response"
            );
        } else {
            tracing::debug!(tick, elapsed_s, samples = samples.len(), "metric response");
        }
    }
}
