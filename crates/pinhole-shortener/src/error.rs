use pinhole_core::CoreError;
use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("alias already exists: {0}")]
    AliasAlreadyExists(String),
    #[error("url already exists: {0}")]
    UrlAlreadyExists(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("no free short code after {attempts} attempts")]
    RetryExhausted { attempts: usize },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::InvalidArgument(message),
        }
    }
}

impl From<ShortenerError> for Status {
    fn from(error: ShortenerError) -> Self {
        match error {
            ShortenerError::InvalidArgument(message) => Status::new(Code::InvalidArgument, message),
            ShortenerError::AliasAlreadyExists(_) => {
                Status::new(Code::AlreadyExists, "custom alias already exists")
            }
            ShortenerError::UrlAlreadyExists(_) => {
                Status::new(Code::AlreadyExists, "url already exists")
            }
            ShortenerError::NotFound(_) => Status::new(Code::NotFound, "short_url not found"),
            ShortenerError::RetryExhausted { .. } => Status::new(
                Code::ResourceExhausted,
                "could not allocate a unique short_url",
            ),
            ShortenerError::Internal(_) => Status::new(Code::Internal, "internal error"),
        }
    }
}
