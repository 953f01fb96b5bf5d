use std::path::Path;
use std::sync::Arc;

use bench_api::{EventLog, MetricSource};

use crate::catalog::SchemaCatalog;
use crate::config::RunConfig;
use crate::error::EngineError;
use crate::run::{Orchestrator, RunReport};
use crate::sink::SinkTable;

/// Loaded schemas bound to an event log. Built once, then shared read-only
/// by every run.
pub struct Engine {
    sinks: SinkTable,
}

impl Engine {
    /// Load the schema catalog under `schema_dir` and bind every topic to
    /// `log`. A bad schema fails here, before any metric is queried.
    pub fn bootstrap(schema_dir: &Path, log: Arc<dyn EventLog>) -> Result<Self, EngineError> {
        let catalog = SchemaCatalog::load(schema_dir)?;
        if catalog.is_empty() {
            tracing::warn!(dir = %schema_dir.display(), "no topics found in schema directory");
        }
        let sinks = SinkTable::new(catalog, log);
        tracing::info!(topics = ?sinks.topic_names(), "engine ready");
        Ok(Self { sinks })
    }

    /// Run one benchmark wait against `source` and record its result.
    pub async fn execute(
        &self,
        config: &RunConfig,
        source: &dyn MetricSource,
    ) -> Result<RunReport, EngineError> {
        Orchestrator::new(config, &self.sinks, source)?.execute().await
    }
}
