use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MpConfError {
    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}

impl MpConfError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, MpConfError::Configuration(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, MpConfError::InvalidArgument(_))
    }

    pub fn message(&self) -> &str {
        match self {
            MpConfError::Configuration(msg) | MpConfError::InvalidArgument(msg) => msg,
        }
    }
}

pub type MpConfResult<T> = error_stack::Result<T, MpConfError>;
