//! Core error types for level loading and saving

#[derive(thiserror::Error, Debug)]
pub enum LevelError {
    /// Tile text did not parse, or the decoded byte buffer is not a whole
    /// number of 32-bit words
    #[error("Malformed tile payload: {0}")]
    MalformedPayload(String),

    #[error("Unsupported tile encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Unsupported tile compression: {0}")]
    UnsupportedCompression(String),

    /// Container-level syntax or shape error (XML/JSON/text)
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The level cannot be expressed in the target format
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Format is read-only: {0}")]
    ReadOnlyFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LevelError>;
