use bench_api::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("schema for topic '{topic}': {source}")]
    Schema { topic: String, source: BackendError },

    #[error(
        "schema namespace mismatch for topic '{topic}': key namespace '{key_namespace}', value namespace '{value_namespace}'"
    )]
    SchemaMismatch {
        topic: String,
        key_namespace: String,
        value_namespace: String,
    },

    #[error("topic not found: {0}")]
    UnknownTopic(String),

    #[error("encode for topic '{topic}': {source}")]
    Encode { topic: String, source: BackendError },

    #[error("delivery to topic '{topic}' failed: {source}")]
    Delivery { topic: String, source: BackendError },

    #[error("metric source: {0}")]
    MetricSource(#[source] BackendError),

    /// A run fault whose failure result could not be published either.
    /// `cause` is the original fault and stays the primary error.
    #[error("{cause} (failure result not recorded: {publish})")]
    Unrecorded {
        #[source]
        cause: Box<EngineError>,
        publish: Box<EngineError>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
