/// Failures reported by a persistence bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode session state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("write to {0} was rejected")]
    Rejected(String),
}

impl BridgeError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            BridgeError::NotFound(path)
        } else {
            BridgeError::Io { path, source }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no buffer with id `{0}`")]
    UnknownBuffer(String),
    #[error("a buffer with id `{0}` is already open")]
    IdTaken(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
