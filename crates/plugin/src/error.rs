use lodestar_api::ScopeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("scope {scope} is closed")]
    Closed { scope: ScopeId },
    #[error("lookup failed in {scope}: {reason}")]
    Lookup { scope: ScopeId, reason: String },
}
