use std::future::Future;
use std::pin::Pin;

use crate::error::BackendError;

/// One encoded key/value pair bound for a topic.
///
/// `key` and `value` are already encoded against the topic's schemas;
/// event log backends treat them as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub topic: String,
    /// Timestamp in milliseconds at which the record was produced.
    pub ts_ms: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Position the backend assigned to an accepted record, when it has one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogAck {
    pub partition: Option<i32>,
    pub offset: Option<i64>,
}

/// Durable, append-only event log.
///
/// `append` must not resolve with `Ok` before the backend has accepted the
/// record durably. There is no batching across calls: one call, one record.
pub trait EventLog: Send + Sync {
    fn append(
        &self,
        record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogAck, BackendError>> + Send + '_>>;
}
