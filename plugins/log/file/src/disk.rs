use base64::Engine;
use bench_api::{BackendError, LogRecord};

// ════════════════════════════════════════════════════════════════
//  On-disk record format
// ════════════════════════════════════════════════════════════════

/// Одна строка `{topic}.jsonl`. Key/value — Avro datums в base64.
#[derive(serde::Serialize, serde::Deserialize)]
pub(crate) struct DiskRecord {
    pub ts_ms: i64,
    pub key: String,
    pub value: String,
}

impl DiskRecord {
    pub(crate) fn from_record(record: &LogRecord) -> Self {
        let engine = base64::engine::general_purpose::STANDARD;
        Self {
            ts_ms: record.ts_ms,
            key: engine.encode(&record.key),
            value: engine.encode(&record.value),
        }
    }

    pub(crate) fn into_record(self, topic: &str) -> Result<LogRecord, BackendError> {
        let engine = base64::engine::general_purpose::STANDARD;
        let decode = |field: &str, data: &str| {
            engine
                .decode(data)
                .map_err(|e| BackendError::format_err(format!("{field}: base64 decode: {e}")))
        };
        Ok(LogRecord {
            topic: topic.to_string(),
            ts_ms: self.ts_ms,
            key: decode("key", &self.key)?,
            value: decode("value", &self.value)?,
        })
    }
}
