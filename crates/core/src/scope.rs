use indexmap::IndexMap;
use lodestar_api::{Binding, Key, ScopeId, Target, TypeRef};
use lodestar_plugin::{Scope, ScopeError, TypeHierarchyPtr};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory injection scope.
///
/// Bindings are kept in declaration order, one per key. Rebinding a key
/// keeps its position but installs a new binding identity. Once closed,
/// lookups fail with [`ScopeError::Closed`].
pub struct InjectorScope {
    id: ScopeId,
    name: String,
    bindings: RwLock<IndexMap<Key, Arc<Binding>>>,
    hierarchy: TypeHierarchyPtr,
    closed: AtomicBool,
}

impl InjectorScope {
    pub fn new(name: impl Into<String>, hierarchy: TypeHierarchyPtr) -> Self {
        Self {
            id: ScopeId::next(),
            name: name.into(),
            bindings: RwLock::new(IndexMap::new()),
            hierarchy,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn bind(&self, key: Key, target: Target) -> Arc<Binding> {
        self.bind_with(key, target, |b| b)
    }

    /// Bind with extra configuration (visibility, priority) applied to the binding.
    pub fn bind_with<F>(&self, key: Key, target: Target, configure: F) -> Arc<Binding>
    where
        F: FnOnce(Binding) -> Binding,
    {
        let binding = Arc::new(configure(Binding::new(self.id, key.clone(), target)));
        self.bindings.write().insert(key, Arc::clone(&binding));
        binding
    }

    pub fn unbind(&self, key: &Key) -> Option<Arc<Binding>> {
        self.bindings.write().shift_remove(key)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }
}

impl Scope for InjectorScope {
    fn id(&self) -> ScopeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn find_bindings_by_type(&self, ty: &TypeRef) -> Result<Vec<Arc<Binding>>, ScopeError> {
        if self.is_closed() {
            return Err(ScopeError::Closed { scope: self.id });
        }
        Ok(self
            .bindings
            .read()
            .iter()
            .filter(|(key, _)| key.ty == *ty)
            .map(|(_, binding)| Arc::clone(binding))
            .collect())
    }

    fn binding(&self, key: &Key) -> Option<Arc<Binding>> {
        self.bindings.read().get(key).cloned()
    }

    fn hierarchy(&self) -> TypeHierarchyPtr {
        Arc::clone(&self.hierarchy)
    }
}
