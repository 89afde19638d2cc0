use lodestar_api::{ApiError, ScopeId};
use lodestar_plugin::ScopeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LodestarError {
    #[error("Duplicate registration: {scope} is already published")]
    DuplicateRegistration { scope: ScopeId },
    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, LodestarError>;
