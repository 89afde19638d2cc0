#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Malformed type: {input} ({reason})")]
    MalformedType { input: String, reason: String },
}

impl ApiError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        ApiError::MalformedType {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
