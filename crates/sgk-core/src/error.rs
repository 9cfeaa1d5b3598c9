use thiserror::Error;

#[derive(Debug, Error)]
pub enum SgkError {
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Tolerance violation: {0}")]
    Tolerance(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Version mismatch: expected major version {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

pub type Result<T> = std::result::Result<T, SgkError>;
