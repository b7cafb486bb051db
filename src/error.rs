//! Errors from the crate's fallible edges: config and score files, and the
//! terminal.  The simulation itself never fails.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed score file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(#[from] ron::error::SpannedError),
    #[error("could not serialise config: {0}")]
    ConfigWrite(#[from] ron::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
