pub mod binding;
pub mod key;
pub mod types;

pub use binding::*;
pub use key::*;
pub use types::*;
