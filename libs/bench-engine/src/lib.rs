pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod poller;
pub mod result;
pub mod run;
pub mod sink;

pub use bootstrap::Engine;
pub use config::RunConfig;
pub use error::EngineError;
pub use run::RunReport;
