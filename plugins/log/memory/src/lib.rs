use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;

use bench_api::{BackendError, EventLog, LogAck, LogRecord};

// ═══════════════════════════════════════════════════════════════
//  MemoryLog
// ═══════════════════════════════════════════════════════════════

/// In-memory `EventLog`. Для dry-run запусков и тестов: ничего не
/// переживает процесс, offsets — позиция записи в общем журнале.
#[derive(Default)]
pub struct MemoryLog {
    records: RwLock<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every appended record, in append order.
    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.read().await.clone()
    }

    pub async fn records_for(&self, topic: &str) -> Vec<LogRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.topic == topic)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl EventLog for MemoryLog {
    fn append(
        &self,
        record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogAck, BackendError>> + Send + '_>> {
        Box::pin(async move {
            let mut buf = self.records.write().await;
            let offset = buf.len() as i64;
            tracing::debug!(topic = %record.topic, offset, "record appended (memory)");
            buf.push(record);
            Ok(LogAck {
                partition: None,
                offset: Some(offset),
            })
        })
    }
}
