use bench_api::BackendError;
use bench_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Backend(#[from] BackendError),
}
