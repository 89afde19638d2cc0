use lodestar_api::{Binding, BindingPublisher, Key, Rank, Target, TypeRef};
use lodestar_core::{ClassTable, InjectorScope, Located, ScopePublisher};
use lodestar_plugin::ClassDecl;
use std::sync::Arc;

pub fn ty(s: &str) -> TypeRef {
    TypeRef::parse(s).unwrap()
}

/// Platform classes shared by every scope in these tests.
#[allow(dead_code)]
pub fn platform() -> Arc<ClassTable> {
    let table = ClassTable::new();
    table.declare_all([
        ClassDecl::new("java.util.Collection").with_params(["E"]),
        ClassDecl::new("java.util.List")
            .with_params(["E"])
            .extends(ty("java.util.Collection<E>")),
        ClassDecl::new("java.util.ArrayList")
            .with_params(["E"])
            .extends(ty("java.util.List<E>")),
        ClassDecl::new("app.Names").extends(ty("java.util.ArrayList<java.lang.String>")),
        ClassDecl::new("app.Ints").extends(ty("java.util.ArrayList<java.lang.Integer>")),
        ClassDecl::new("app.FastService").extends(ty("app.Service")),
        ClassDecl::new("app.SlowService").extends(ty("app.Service")),
    ]);
    Arc::new(table)
}

#[allow(dead_code)]
pub fn new_scope(name: &str) -> Arc<InjectorScope> {
    Arc::new(InjectorScope::new(name, platform()))
}

#[allow(dead_code)]
pub fn publisher(scope: &Arc<InjectorScope>, rank: Rank) -> Arc<dyn BindingPublisher> {
    Arc::new(ScopePublisher::with_primary_rank(scope.clone(), rank))
}

#[allow(dead_code)]
pub fn bind_instance(scope: &InjectorScope, key: Key, fqn: &str) -> Arc<Binding> {
    scope.bind(key, Target::Instance(fqn.to_string()))
}

/// Implementation class names in ranked order.
#[allow(dead_code)]
pub fn impls(located: &Located) -> Vec<String> {
    located
        .iter()
        .map(|r| r.binding.implementation().unwrap_or("?").to_string())
        .collect()
}

#[allow(dead_code)]
pub fn holds(located: &Located, binding: &Arc<Binding>) -> bool {
    located.iter().any(|r| Arc::ptr_eq(&r.binding, binding))
}

/// No binding identity appears twice.
#[allow(dead_code)]
pub fn assert_unique(located: &Located) {
    let all = located.snapshot();
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert!(!Arc::ptr_eq(&a.binding, &b.binding), "duplicate {}", a.binding);
        }
    }
}

/// Ranks are non-increasing.
#[allow(dead_code)]
pub fn assert_ranked(located: &Located) {
    let ranks: Vec<Rank> = located.iter().map(|r| r.rank).collect();
    assert!(ranks.windows(2).all(|w| w[0] >= w[1]), "unordered ranks {:?}", ranks);
}
