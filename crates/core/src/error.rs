use thiserror::Error;

/// Failure to decode run-model bytes handed to the engine.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid run model json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a live-mode transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("transport: {0}")]
    Other(String),
}
