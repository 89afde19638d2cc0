use super::key::Key;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Priority of a binding. Higher ranks are returned first.
pub type Rank = i32;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one injection scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Allocate a process-unique scope identity.
    pub fn next() -> Self {
        Self(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Whether a binding takes part in cross-scope discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    /// Hidden from every subscriber; only usable inside its own scope
    Internal,
}

/// Resolves the implementation class of a provider-backed binding.
pub type ImplementationResolver = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// How a binding produces its instances.
#[derive(Clone)]
pub enum Target {
    /// Constructed directly from the key's own raw class
    Constructor,
    /// Linked to another key; the implementation is that key's raw class
    Linked(Key),
    /// Pre-built instance of a known class
    Instance(String),
    /// Provider whose product class is only known once asked
    Provider(ImplementationResolver),
    /// Nothing is known about the implementation
    Untyped,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Constructor => write!(f, "Constructor"),
            Target::Linked(key) => f.debug_tuple("Linked").field(key).finish(),
            Target::Instance(fqn) => f.debug_tuple("Instance").field(fqn).finish(),
            Target::Provider(_) => write!(f, "Provider(..)"),
            Target::Untyped => write!(f, "Untyped"),
        }
    }
}

/// One association between a key and an implementation inside a scope.
///
/// Bindings are shared as `Arc<Binding>` and compared by pointer identity:
/// two bindings with the same content in different scopes are different
/// bindings.
pub struct Binding {
    key: Key,
    target: Target,
    scope: ScopeId,
    visibility: Visibility,
    priority: Option<Rank>,
    implementation: OnceCell<Option<String>>,
}

impl Binding {
    pub fn new(scope: ScopeId, key: Key, target: Target) -> Self {
        Self {
            key,
            target,
            scope,
            visibility: Visibility::Public,
            priority: None,
            implementation: OnceCell::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Explicit priority; ranking functions use it instead of the scope's default rank.
    pub fn with_priority(mut self, priority: Rank) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_internal(&self) -> bool {
        self.visibility == Visibility::Internal
    }

    pub fn priority(&self) -> Option<Rank> {
        self.priority
    }

    /// Raw implementation class, resolved on first use and cached.
    pub fn implementation(&self) -> Option<&str> {
        self.implementation
            .get_or_init(|| match &self.target {
                Target::Constructor => self.key.ty.raw_class().map(str::to_string),
                Target::Linked(linked) => linked.ty.raw_class().map(str::to_string),
                Target::Instance(fqn) => Some(fqn.clone()),
                Target::Provider(resolve) => resolve(),
                Target::Untyped => None,
            })
            .as_deref()
    }

    /// Pointer identity of two shared bindings.
    pub fn same(a: &Arc<Binding>, b: &Arc<Binding>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("target", &self.target)
            .field("scope", &self.scope)
            .field("visibility", &self.visibility)
            .field("priority", &self.priority)
            .finish()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.key, self.scope)
    }
}

/// A binding together with the rank it was published at.
#[derive(Debug, Clone)]
pub struct RankedBinding {
    pub binding: Arc<Binding>,
    pub rank: Rank,
}
