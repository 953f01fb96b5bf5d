use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use bench_api::{now_ms, BackendError, EventLog, LogAck, LogRecord};

use crate::catalog::{SchemaCatalog, TopicSchemaPair};
use crate::error::EngineError;

// ═══════════════════════════════════════════════════════════════
//  ResultSink
// ═══════════════════════════════════════════════════════════════

pub struct ResultSink {
    schemas: TopicSchemaPair,
    log: Arc<dyn EventLog>,
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink").field("topic", &self.topic()).finish()
    }
}

impl ResultSink {
    pub fn new(schemas: TopicSchemaPair, log: Arc<dyn EventLog>) -> Self {
        Self { schemas, log }
    }

    pub fn topic(&self) -> &str {
        self.schemas.topic()
    }

    /// Encode `key` and `value` against the topic schemas and append them
    /// as one record.
    ///
    /// Returns once the log acknowledged the record durably. Nothing is
    /// sent when either half fails to encode; a rejected append is never
    /// retried.
    pub async fn publish(
        &self,
        key: &serde_json::Value,
        value: &serde_json::Value,
    ) -> Result<LogAck, EngineError> {
        let topic = self.topic();
        let key = self
            .schemas
            .key()
            .encode(key)
            .map_err(|e| encode_error(topic, "key", e))?;
        let value = self
            .schemas
            .value()
            .encode(value)
            .map_err(|e| encode_error(topic, "value", e))?;

        let record = LogRecord {
            topic: topic.to_string(),
            ts_ms: now_ms(),
            key,
            value,
        };
        let ack = self
            .log
            .append(record)
            .await
            .map_err(|source| EngineError::Delivery {
                topic: topic.to_string(),
                source,
            })?;

        tracing::info!(
            topic = %topic,
            partition = ?ack.partition,
            offset = ?ack.offset,
            "record published"
        );
        Ok(ack)
    }

    /// `publish` for any serializable key/value pair.
    pub async fn publish_as<K: Serialize, V: Serialize>(
        &self,
        key: &K,
        value: &V,
    ) -> Result<LogAck, EngineError> {
        let key = serde_json::to_value(key)
            .map_err(|e| encode_error(self.topic(), "key", e.into()))?;
        let value = serde_json::to_value(value)
            .map_err(|e| encode_error(self.topic(), "value", e.into()))?;
        self.publish(&key, &value).await
    }
}

fn encode_error(topic: &str, part: &str, source: BackendError) -> EngineError {
    EngineError::Encode {
        topic: topic.to_string(),
        source: source.with_context(part),
    }
}

// ═══════════════════════════════════════════════════════════════
//  SinkTable
// ═══════════════════════════════════════════════════════════════

/// One `ResultSink` per catalog topic, built once before any polling and
/// read-only afterwards. Lookups of unknown topics fail.
#[derive(Debug)]
pub struct SinkTable {
    sinks: HashMap<String, ResultSink>,
}

impl SinkTable {
    pub fn new(catalog: SchemaCatalog, log: Arc<dyn EventLog>) -> Self {
        let sinks = catalog
            .into_topics()
            .map(|pair| (pair.topic().to_string(), ResultSink::new(pair, log.clone())))
            .collect();
        Self { sinks }
    }

    pub fn get(&self, topic: &str) -> Result<&ResultSink, EngineError> {
        self.sinks
            .get(topic)
            .ok_or_else(|| EngineError::UnknownTopic(topic.to_string()))
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &serde_json::Value,
        value: &serde_json::Value,
    ) -> Result<LogAck, EngineError> {
        self.get(topic)?.publish(key, value).await
    }

    pub fn topic_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sinks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec_avro::AvroCodec;
    use log_memory::MemoryLog;

    fn catalog() -> SchemaCatalog {
        let key = AvroCodec::parse(
            r#"{"type":"record","name":"Key","namespace":"t",
                "fields":[{"name":"id","type":"string"}]}"#,
        )
        .unwrap();
        let value = AvroCodec::parse(
            r#"{"type":"record","name":"Value","namespace":"t",
                "fields":[{"name":"n","type":"long"}]}"#,
        )
        .unwrap();
        let mut catalog = SchemaCatalog::default();
        catalog.insert(TopicSchemaPair::new("t", key, value).unwrap());
        catalog
    }

    #[tokio::test]
    async fn publish_appends_one_encoded_record() {
        let log = Arc::new(MemoryLog::new());
        let table = SinkTable::new(catalog(), log.clone());

        let ack = table
            .publish("t", &serde_json::json!({"id": "a"}), &serde_json::json!({"n": 3}))
            .await
            .unwrap();
        assert_eq!(ack.offset, Some(0));

        let records = log.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].topic, "t");

        let schemas = catalog();
        let pair = schemas.get("t").unwrap();
        assert_eq!(pair.key().decode(&records[0].key).unwrap(), serde_json::json!({"id": "a"}));
        assert_eq!(pair.value().decode(&records[0].value).unwrap(), serde_json::json!({"n": 3}));
    }

    #[tokio::test]
    async fn unknown_topic_fails_closed() {
        let log = Arc::new(MemoryLog::new());
        let table = SinkTable::new(catalog(), log.clone());

        let err = table
            .publish("nope", &serde_json::json!({"id": "a"}), &serde_json::json!({"n": 3}))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownTopic(t) if t == "nope"));
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_value_is_not_sent() {
        let log = Arc::new(MemoryLog::new());
        let table = SinkTable::new(catalog(), log.clone());

        let err = table
            .publish("t", &serde_json::json!({"id": "a"}), &serde_json::json!({"n": "three"}))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Encode { .. }));
        assert!(err.to_string().contains("value"), "{err}");
        assert!(log.is_empty().await);
    }
}
