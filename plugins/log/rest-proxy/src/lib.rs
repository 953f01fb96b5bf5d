use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use base64::Engine;
use bench_api::{BackendError, EventLog, LogAck, LogRecord};

const CONTENT_TYPE: &str = "application/vnd.kafka.binary.v2+json";
const ACCEPT: &str = "application/vnd.kafka.v2+json";

/// Kafka REST Proxy `EventLog`.
///
/// Produces one record per request using the v2 binary embedded format.
/// The proxy answers only after the broker acknowledged the write, so a
/// successful `append` means the record is in the log.
pub struct RestProxyLog {
    http: reqwest::Client,
    base_url: String,
}

impl RestProxyLog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn produce(&self, record: LogRecord) -> Result<LogAck, BackendError> {
        let url = format!("{}/topics/{}", self.base_url, record.topic);
        let body = produce_body(&record)?;

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .body(body)
            .send()
            .await
            .map_err(|e| BackendError::io(format!("rest proxy request: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BackendError::io(format!("rest proxy read: {e}")))?;

        if !status.is_success() {
            return Err(BackendError::protocol(format!("rest proxy returned {status}: {text}")));
        }

        let ack = parse_produce_response(&text)?;
        tracing::debug!(
            topic = %record.topic,
            partition = ?ack.partition,
            offset = ?ack.offset,
            "record acknowledged"
        );
        Ok(ack)
    }
}

impl EventLog for RestProxyLog {
    fn append(
        &self,
        record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogAck, BackendError>> + Send + '_>> {
        Box::pin(self.produce(record))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Wire model
// ═══════════════════════════════════════════════════════════════

#[derive(serde::Serialize)]
struct ProduceRequest {
    records: Vec<ProduceRecord>,
}

#[derive(serde::Serialize)]
struct ProduceRecord {
    key: String,
    value: String,
}

#[derive(serde::Deserialize)]
struct ProduceResponse {
    #[serde(default)]
    offsets: Vec<ProduceOffset>,
}

#[derive(serde::Deserialize)]
struct ProduceOffset {
    #[serde(default)]
    partition: Option<i32>,
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

fn produce_body(record: &LogRecord) -> Result<String, BackendError> {
    let engine = base64::engine::general_purpose::STANDARD;
    let req = ProduceRequest {
        records: vec![ProduceRecord {
            key: engine.encode(&record.key),
            value: engine.encode(&record.value),
        }],
    };
    Ok(serde_json::to_string(&req)?)
}

/// Extract the acknowledgement for the single record of a produce request.
fn parse_produce_response(body: &str) -> Result<LogAck, BackendError> {
    let resp: ProduceResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::format_err(format!("rest proxy response: {e}")))?;

    let [offset] = resp.offsets.as_slice() else {
        return Err(BackendError::protocol(format!(
            "rest proxy acknowledged {} records, expected 1",
            resp.offsets.len()
        )));
    };

    if let Some(err) = &offset.error {
        return Err(BackendError::protocol(format!(
            "rest proxy rejected record (code {}): {err}",
            offset.error_code.map_or_else(|| "?".to_string(), |c| c.to_string()),
        )));
    }

    Ok(LogAck {
        partition: offset.partition,
        offset: offset.offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_api::ErrorKind;

    #[test]
    fn body_carries_base64_key_and_value() {
        let record = LogRecord {
            topic: "t".into(),
            ts_ms: 0,
            key: vec![0x02, 0x61],
            value: vec![0xff],
        };
        let body: serde_json::Value =
            serde_json::from_str(&produce_body(&record).unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"records": [{"key": "AmE=", "value": "/w=="}]}));
    }

    #[test]
    fn accepted_record_returns_position() {
        let body = r#"{"key_schema_id":null,"value_schema_id":null,
            "offsets":[{"partition":2,"offset":41,"error_code":null,"error":null}]}"#;
        assert_eq!(
            parse_produce_response(body).unwrap(),
            LogAck { partition: Some(2), offset: Some(41) }
        );
    }

    #[test]
    fn per_record_error_fails_append() {
        let body = r#"{"offsets":[{"partition":null,"offset":null,"error_code":50002,"error":"Kafka error: timed out"}]}"#;
        let err = parse_produce_response(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.message().contains("50002"));
    }

    #[test]
    fn missing_offsets_fail_append() {
        assert_eq!(
            parse_produce_response(r#"{"offsets":[]}"#).unwrap_err().kind(),
            ErrorKind::Protocol
        );
    }
}
