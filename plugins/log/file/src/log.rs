use std::future::Future;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bench_api::{BackendError, EventLog, LogAck, LogRecord};

use super::disk::DiskRecord;

// ════════════════════════════════════════════════════════════════
//  FileLog
// ════════════════════════════════════════════════════════════════

/// Append-only `EventLog` on the local filesystem.
///
/// Каждый topic — отдельный файл `{data_dir}/{topic}.jsonl`. A record is
/// acknowledged only after the file has been synced, and the returned
/// offset is the record's line number within the topic file.
#[derive(Clone)]
pub struct FileLog {
    data_dir: PathBuf,
}

impl FileLog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn topic_path(&self, topic: &str) -> PathBuf {
        self.data_dir.join(format!("{topic}.jsonl"))
    }

    fn do_append(&self, record: &LogRecord) -> Result<LogAck, BackendError> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| BackendError::io(format!("mkdir {}: {e}", self.data_dir.display())))?;

        let path = self.topic_path(&record.topic);
        let offset = count_lines(&path)?;
        let line = serde_json::to_string(&DiskRecord::from_record(record))?;

        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BackendError::io(format!("open {}: {e}", path.display())))?;
        writeln!(f, "{line}").map_err(|e| BackendError::io(format!("write: {e}")))?;
        f.sync_all()
            .map_err(|e| BackendError::io(format!("fsync {}: {e}", path.display())))?;

        tracing::debug!(topic = %record.topic, offset, path = %path.display(), "record appended");
        Ok(LogAck {
            partition: None,
            offset: Some(offset),
        })
    }

    /// Read back every record of a topic, oldest first.
    ///
    /// A topic that was never written reads as empty.
    pub fn read_topic(&self, topic: &str) -> Result<Vec<LogRecord>, BackendError> {
        let path = self.topic_path(topic);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let f = std::fs::File::open(&path)
            .map_err(|e| BackendError::io(format!("open {}: {e}", path.display())))?;

        let mut records = Vec::new();
        for line in std::io::BufReader::new(f).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let disk: DiskRecord = serde_json::from_str(&line)?;
            records.push(disk.into_record(topic)?);
        }
        Ok(records)
    }
}

fn count_lines(path: &Path) -> Result<i64, BackendError> {
    if !path.exists() {
        return Ok(0);
    }
    let f = std::fs::File::open(path)
        .map_err(|e| BackendError::io(format!("open {}: {e}", path.display())))?;
    let mut n = 0;
    for line in std::io::BufReader::new(f).lines() {
        if !line?.is_empty() {
            n += 1;
        }
    }
    Ok(n)
}

impl EventLog for FileLog {
    fn append(
        &self,
        record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogAck, BackendError>> + Send + '_>> {
        Box::pin(async move { self.do_append(&record) })
    }
}
