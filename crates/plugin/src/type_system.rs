use crate::subtyping;
use lodestar_api::models::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Declaration of one class: its type parameters and direct supertypes.
///
/// Supertypes are written over the class's own type parameters, e.g.
/// `java.util.ArrayList<E>` declares `java.util.List<E>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub fqn: String,
    pub type_params: Vec<String>,
    pub supertypes: Vec<TypeRef>,
}

impl ClassDecl {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            type_params: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn extends(mut self, supertype: TypeRef) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// The class viewed with its own type parameters as arguments (`ArrayList<E>`).
    pub fn self_type(&self) -> TypeRef {
        if self.type_params.is_empty() {
            TypeRef::id(self.fqn.clone())
        } else {
            TypeRef::generic(
                self.fqn.clone(),
                self.type_params.iter().map(TypeRef::variable).collect(),
            )
        }
    }
}

/// Class graph knowledge needed to match implementations against requested types.
pub trait TypeHierarchy: Send + Sync {
    /// Declaration of a class, if known.
    fn declaration(&self, fqn: &str) -> Option<Arc<ClassDecl>>;

    /// Walk all ancestor raw classes in BFS order. Cycles are ignored.
    fn walk_ancestors(&self, fqn: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut out = Vec::new();
        visited.insert(fqn.to_string());
        queue.push_back(fqn.to_string());

        while let Some(current) = queue.pop_front() {
            let Some(decl) = self.declaration(&current) else {
                continue;
            };
            for parent in decl.supertypes.iter().filter_map(TypeRef::raw_class) {
                if visited.insert(parent.to_string()) {
                    out.push(parent.to_string());
                    queue.push_back(parent.to_string());
                }
            }
        }

        out
    }

    /// Checks if raw class `sub` is `sup` or one of its descendants.
    fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == TypeRef::OBJECT_FQN {
            return true;
        }
        self.walk_ancestors(sub).iter().any(|a| a == sup)
    }

    /// Checks if a value of raw class `implementation` can be used where `target` is requested.
    ///
    /// Delegates to `subtyping::is_assignable` logic.
    fn is_assignable(&self, target: &TypeRef, implementation: &str) -> bool {
        subtyping::is_assignable(target, implementation, self)
    }
}

/// Pointer type for the type hierarchy.
pub type TypeHierarchyPtr = Arc<dyn TypeHierarchy>;

/// Hierarchy that knows no classes: only identity and the top type match.
pub struct FlatHierarchy;

impl TypeHierarchy for FlatHierarchy {
    fn declaration(&self, _fqn: &str) -> Option<Arc<ClassDecl>> {
        None
    }
}
