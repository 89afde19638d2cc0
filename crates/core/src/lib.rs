pub mod class_table;
pub mod config;
pub mod error;
pub mod locator;
pub mod logging;
pub mod publisher;
pub mod ranking;
pub mod scope;
pub mod subscriber;
pub mod tracker;

pub use class_table::ClassTable;
pub use config::{DuplicatePolicy, LocatorConfig, ReplayOrder};
pub use error::{LodestarError, Result};
pub use locator::{BindingLocator, Located, Registration};
pub use publisher::ScopePublisher;
pub use ranking::{DefaultRankingFunction, RankAllocator};
pub use scope::InjectorScope;
pub use subscriber::{BindingListener, LiveBindings};
pub use tracker::ScopeTracker;
