use thiserror::Error;

use crate::utils::AppError;

/// Startup and serving failures
///
/// Request-level errors use [`AppError`]; these only end the process.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to prepare working directory: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("Initialization failed: {0}")]
    Init(#[from] AppError),

    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
