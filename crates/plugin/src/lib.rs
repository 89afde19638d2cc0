pub mod error;
pub mod scope;
pub mod selector;
pub mod substitution;
pub mod subtyping;
pub mod type_system;

pub use error::ScopeError;
pub use scope::{Scope, ScopePtr};
pub use selector::{DefaultScopeSelector, ScopeCandidate, ScopeSelector};
pub use substitution::Substitution;
pub use type_system::{ClassDecl, FlatHierarchy, TypeHierarchy, TypeHierarchyPtr};
