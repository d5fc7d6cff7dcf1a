use thiserror::Error;

/// Errors raised by the HTTP server collaborator
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server stopped with an error: {0}")]
    Serve(#[source] std::io::Error),
}
