pub mod error;
pub mod log;
pub mod metric;
pub mod util;

pub use error::{BackendError, ErrorKind};
pub use log::{EventLog, LogAck, LogRecord};
pub use metric::{MetricSample, MetricSource};
pub use util::now_ms;
