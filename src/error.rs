use thiserror::Error;

/// Discriminator the transport maps onto a response without reading messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InvalidType,
    Validation,
    Conflict,
    NotFound,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexisError {
    /// Required input missing or empty
    #[error("{0}")]
    InvalidInput(String),

    /// Input present but of the wrong type
    #[error("{0}")]
    InvalidType(String),

    /// Well-formed filter parameter out of range
    #[error("{0}")]
    Validation(String),

    #[error("String already exists in the system.")]
    Conflict,

    #[error("String does not exist in the system.")]
    NotFound,
}

impl LexisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LexisError::InvalidInput(_) => ErrorKind::InvalidInput,
            LexisError::InvalidType(_) => ErrorKind::InvalidType,
            LexisError::Validation(_) => ErrorKind::Validation,
            LexisError::Conflict => ErrorKind::Conflict,
            LexisError::NotFound => ErrorKind::NotFound,
        }
    }
}

pub type Result<T> = std::result::Result<T, LexisError>;
