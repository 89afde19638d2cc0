use lodestar_api::TypeRef;
use lodestar_core::{BindingLocator, ClassTable, InjectorScope, LocatorConfig, ScopeTracker};
use lodestar_plugin::{ClassDecl, DefaultScopeSelector, ScopeCandidate, ScopeSelector};
use std::sync::Arc;

/// A locator, its scope tracker, and the platform classes every scope sees.
pub struct Runtime {
    tracker: ScopeTracker,
    classes: Arc<ClassTable>,
}

impl Runtime {
    pub fn new(config: LocatorConfig, selector: Arc<dyn ScopeSelector>) -> Self {
        let classes = Arc::new(ClassTable::new());
        classes.declare_all(platform_classes());
        tracing::debug!("Runtime starting with {} platform classes", classes.len());
        Self {
            tracker: ScopeTracker::from_config(config, selector),
            classes,
        }
    }

    pub fn locator(&self) -> &BindingLocator {
        self.tracker.locator()
    }

    pub fn tracker(&self) -> &ScopeTracker {
        &self.tracker
    }

    /// Classes shared by every scope.
    pub fn classes(&self) -> &Arc<ClassTable> {
        &self.classes
    }

    /// Create a scope whose own classes sit on top of the platform classes.
    pub fn new_scope<I>(&self, name: &str, classes: I) -> Arc<InjectorScope>
    where
        I: IntoIterator<Item = ClassDecl>,
    {
        let local = ClassTable::with_parent(self.classes.clone());
        local.declare_all(classes);
        tracing::trace!("Scope {} declares {} classes", name, local.len());
        Arc::new(InjectorScope::new(name, Arc::new(local)))
    }

    pub fn load(
        &self,
        candidate: &ScopeCandidate,
        scope: Arc<InjectorScope>,
    ) -> lodestar_core::Result<bool> {
        self.tracker.scope_loaded(candidate, scope)
    }

    /// Withdraw and close a scope.
    pub fn unload(&self, scope: &InjectorScope) -> bool {
        let tracked = self.tracker.scope_unloaded(scope.id());
        scope.close();
        if !tracked {
            tracing::debug!("Closed untracked scope {}", scope.id());
        }
        tracked
    }
}

/// Bootstraps a runtime with the default scope selector.
pub fn build_default_runtime(config: LocatorConfig) -> Runtime {
    Runtime::new(config, Arc::new(DefaultScopeSelector::default()))
}

/// Declarations of the JDK types bindings are most often requested through.
pub fn platform_classes() -> Vec<ClassDecl> {
    let generic = |fqn: &str, params: &[&str]| ClassDecl::new(fqn).with_params(params.to_vec());
    let over = |fqn: &str, params: &[&str]| {
        TypeRef::generic(fqn, params.iter().map(|p| TypeRef::variable(*p)).collect())
    };

    vec![
        generic("java.lang.Iterable", &["T"]),
        generic("java.util.Collection", &["E"]).extends(over("java.lang.Iterable", &["E"])),
        generic("java.util.List", &["E"]).extends(over("java.util.Collection", &["E"])),
        generic("java.util.Set", &["E"]).extends(over("java.util.Collection", &["E"])),
        generic("java.util.ArrayList", &["E"]).extends(over("java.util.List", &["E"])),
        generic("java.util.LinkedList", &["E"]).extends(over("java.util.List", &["E"])),
        generic("java.util.HashSet", &["E"]).extends(over("java.util.Set", &["E"])),
        generic("java.util.Map", &["K", "V"]),
        generic("java.util.HashMap", &["K", "V"]).extends(over("java.util.Map", &["K", "V"])),
        generic("java.util.function.Supplier", &["T"]),
        ClassDecl::new("java.lang.Number"),
        ClassDecl::new("java.lang.Integer").extends(TypeRef::id("java.lang.Number")),
        ClassDecl::new("java.lang.Long").extends(TypeRef::id("java.lang.Number")),
        ClassDecl::new("java.lang.CharSequence"),
        ClassDecl::new("java.lang.String").extends(TypeRef::id("java.lang.CharSequence")),
    ]
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str) -> Option<impl Drop> {
    match lodestar_core::logging::init_logging(component, None, false) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    }
}
