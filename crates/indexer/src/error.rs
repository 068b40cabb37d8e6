use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Document not found: {0}")]
    DocumentMissing(String),

    #[error("{0}")]
    Other(String),
}
