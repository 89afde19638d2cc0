use crate::error::ScopeError;
use crate::type_system::TypeHierarchyPtr;
use lodestar_api::models::{Binding, Key, ScopeId, TypeRef};
use std::sync::Arc;

/// One independently managed collection of bindings (e.g., one plugin's injector).
///
/// Publishers only read from a scope; mutation is up to the implementation.
pub trait Scope: Send + Sync {
    fn id(&self) -> ScopeId;

    /// Name for logging/debugging.
    fn name(&self) -> &str;

    /// All bindings whose key type equals `ty` exactly, any qualifier, in declaration order.
    fn find_bindings_by_type(&self, ty: &TypeRef) -> Result<Vec<Arc<Binding>>, ScopeError>;

    /// The binding currently registered under `key`, if any.
    fn binding(&self, key: &Key) -> Option<Arc<Binding>>;

    /// Class hierarchy visible from this scope.
    fn hierarchy(&self) -> TypeHierarchyPtr;
}

/// Pointer type for scopes.
pub type ScopePtr = Arc<dyn Scope>;
