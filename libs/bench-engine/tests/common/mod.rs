#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bench_api::{BackendError, EventLog, LogAck, LogRecord, MetricSample, MetricSource};
use bench_engine::catalog::{KEY_SCHEMA_FILE, VALUE_SCHEMA_FILE};
use bench_engine::config::DEFAULT_RESULT_TOPIC;
use bench_engine::{Engine, EngineError, RunConfig, RunReport};
use codec_avro::AvroCodec;

pub type Response = Result<Vec<MetricSample>, BackendError>;

/// Answers queries from a script, one entry per call. Once the script runs
/// out every query returns no samples.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Response>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Response>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Script of plain values: `None` is an empty response.
    pub fn values(values: &[Option<f64>]) -> Self {
        Self::new(values.iter().map(|v| Ok(v.map(sample).into_iter().collect())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetricSource for ScriptedSource {
    fn query_instant<'a>(
        &'a self,
        _query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        Box::pin(async move { next.unwrap_or_else(|| Ok(Vec::new())) })
    }
}

pub fn sample(value: f64) -> MetricSample {
    MetricSample::new(1_700_000_000.0, value)
}

/// Event log that refuses every append.
#[derive(Default)]
pub struct RejectingLog {
    attempts: AtomicUsize,
}

impl RejectingLog {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl EventLog for RejectingLog {
    fn append(
        &self,
        _record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogAck, BackendError>> + Send + '_>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(BackendError::io("broker unavailable")) })
    }
}

/// Schemas shipped with the repository.
pub fn schema_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schemas")
}

pub fn result_codecs() -> (AvroCodec, AvroCodec) {
    let dir = schema_dir().join(DEFAULT_RESULT_TOPIC);
    (
        AvroCodec::from_file(&dir.join(KEY_SCHEMA_FILE)).unwrap(),
        AvroCodec::from_file(&dir.join(VALUE_SCHEMA_FILE)).unwrap(),
    )
}

/// Decode a published result record into (key, value) JSON.
pub fn decode(record: &LogRecord) -> (serde_json::Value, serde_json::Value) {
    let (key, value) = result_codecs();
    (key.decode(&record.key).unwrap(), value.decode(&record.value).unwrap())
}

pub fn config(expected: f64, timeout_secs: u64) -> RunConfig {
    RunConfig {
        benchmark_id: "bench-42".into(),
        query: "sum(rows_ingested_total)".into(),
        expected_value: expected,
        timeout: Duration::from_secs(timeout_secs),
        result_topic: DEFAULT_RESULT_TOPIC.into(),
        dashboard_url: "http://grafana:3000".into(),
        verbose: false,
    }
}

/// Bootstrap an engine from `schema_root` and run `config` against `source`.
pub async fn bootstrap_and_execute(
    schema_root: &Path,
    log: Arc<dyn EventLog>,
    config: &RunConfig,
    source: &dyn MetricSource,
) -> Result<RunReport, EngineError> {
    Engine::bootstrap(schema_root, log)?.execute(config, source).await
}
