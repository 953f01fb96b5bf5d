mod disk;
mod log;

pub use log::FileLog;
