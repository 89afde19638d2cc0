use dashmap::DashMap;
use lodestar_plugin::{ClassDecl, TypeHierarchy, TypeHierarchyPtr};
use std::sync::Arc;

/// Concurrent table of class declarations.
///
/// A table may sit on top of a parent hierarchy: local declarations shadow
/// the parent's, everything else is looked up there. This lets each scope
/// carry its own classes while sharing the platform ones.
#[derive(Default)]
pub struct ClassTable {
    decls: DashMap<String, Arc<ClassDecl>>,
    parent: Option<TypeHierarchyPtr>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: TypeHierarchyPtr) -> Self {
        Self {
            decls: DashMap::new(),
            parent: Some(parent),
        }
    }

    /// Declare a class, replacing any earlier local declaration of the same name.
    pub fn declare(&self, decl: ClassDecl) -> Option<Arc<ClassDecl>> {
        self.decls.insert(decl.fqn.clone(), Arc::new(decl))
    }

    pub fn declare_all<I: IntoIterator<Item = ClassDecl>>(&self, decls: I) {
        for decl in decls {
            self.declare(decl);
        }
    }

    pub fn remove(&self, fqn: &str) -> Option<Arc<ClassDecl>> {
        self.decls.remove(fqn).map(|(_, decl)| decl)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.decls.contains_key(fqn)
    }

    /// Number of local declarations.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl TypeHierarchy for ClassTable {
    fn declaration(&self, fqn: &str) -> Option<Arc<ClassDecl>> {
        if let Some(entry) = self.decls.get(fqn) {
            return Some(Arc::clone(entry.value()));
        }
        self.parent.as_ref().and_then(|p| p.declaration(fqn))
    }
}
