pub mod error;
pub mod locator;
pub mod models;
pub mod ranking;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use locator::{BindingPublisher, BindingSubscriber};
pub use models::*;
pub use ranking::RankingFunction;
