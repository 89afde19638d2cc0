//! Binding publisher backed by one injection scope.
//!
//! A subscriber asking for type `T` is offered, in order:
//! 1. every binding whose key type is exactly `T`
//! 2. for a parameterized `T`, bindings keyed by the raw class of `T`
//!    whose implementation is assignable to `T`
//! 3. unless `T` is the top type, bindings keyed by `java.lang.Object`
//!    whose implementation is assignable to `T`
//!
//! Tiers 2 and 3 skip internal bindings, bindings with no known
//! implementation, and bindings whose implementation is the raw class of `T`
//! itself (those are already covered by an explicit binding).

use crate::ranking::DefaultRankingFunction;
use lodestar_api::{
    Binding, BindingPublisher, BindingSubscriber, Rank, RankingFunction, ScopeId, TypeRef,
};
use lodestar_plugin::ScopePtr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub struct ScopePublisher {
    scope: ScopePtr,
    ranking: Arc<dyn RankingFunction>,
}

impl ScopePublisher {
    pub fn new(scope: ScopePtr, ranking: Arc<dyn RankingFunction>) -> Self {
        Self { scope, ranking }
    }

    /// Publisher ranking every default binding at `primary_rank`.
    pub fn with_primary_rank(scope: ScopePtr, primary_rank: Rank) -> Self {
        Self::new(scope, Arc::new(DefaultRankingFunction::new(primary_rank)))
    }

    pub fn scope(&self) -> &ScopePtr {
        &self.scope
    }

    fn lookup(&self, ty: &TypeRef) -> Vec<Arc<Binding>> {
        match self.scope.find_bindings_by_type(ty) {
            Ok(bindings) => bindings,
            Err(err) => {
                tracing::warn!("Binding lookup for {} failed in {}: {}", ty, self.describe(), err);
                Vec::new()
            }
        }
    }

    fn offer(&self, subscriber: &dyn BindingSubscriber, binding: Arc<Binding>) {
        let rank = self.ranking.rank(&binding);
        subscriber.add(binding, rank);
    }

    fn publish_exact_matches(&self, ty: &TypeRef, subscriber: &dyn BindingSubscriber) {
        for binding in self.lookup(ty) {
            if !binding.is_internal() {
                self.offer(subscriber, binding);
            }
        }
    }

    fn publish_generic_matches(&self, ty: &TypeRef, raw: &str, subscriber: &dyn BindingSubscriber) {
        for binding in self.lookup(&TypeRef::id(raw)) {
            if self.is_assignable_from(ty, raw, &binding) {
                self.offer(subscriber, binding);
            }
        }
    }

    fn publish_wildcard_matches(
        &self,
        ty: &TypeRef,
        raw: &str,
        subscriber: &dyn BindingSubscriber,
    ) {
        for binding in self.lookup(&TypeRef::object()) {
            if self.is_assignable_from(ty, raw, &binding) {
                self.offer(subscriber, binding);
            }
        }
    }

    fn is_assignable_from(&self, ty: &TypeRef, raw: &str, binding: &Binding) -> bool {
        if binding.is_internal() {
            return false;
        }
        match binding.implementation() {
            Some(implementation) if implementation != raw => {
                self.scope.hierarchy().is_assignable(ty, implementation)
            }
            _ => false,
        }
    }
}

impl BindingPublisher for ScopePublisher {
    fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    fn subscribe(&self, subscriber: &dyn BindingSubscriber) {
        let ty = subscriber.requested();
        self.publish_exact_matches(ty, subscriber);

        // Arrays, wildcards and variables only ever match exactly
        let Some(raw) = ty.raw_class() else {
            tracing::debug!("No raw class for {}; exact matches only", ty);
            return;
        };

        if !ty.is_raw() {
            self.publish_generic_matches(ty, raw, subscriber);
        }
        if raw != TypeRef::OBJECT_FQN {
            self.publish_wildcard_matches(ty, raw, subscriber);
        }
    }

    fn unsubscribe(&self, subscriber: &dyn BindingSubscriber) {
        let scope = self.scope.id();
        for binding in subscriber.bindings() {
            if binding.scope() != scope {
                continue;
            }
            // Only withdraw what this scope still holds under that key
            let current = self.scope.binding(binding.key());
            if current.is_some_and(|c| Arc::ptr_eq(&c, &binding)) {
                subscriber.remove(&binding);
            } else {
                tracing::trace!("Skipping stale {} on unsubscribe", binding);
            }
        }
    }

    fn max_binding_rank(&self) -> Rank {
        self.ranking.max_rank()
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.scope.name(), self.scope.id())
    }
}

impl PartialEq for ScopePublisher {
    fn eq(&self, other: &Self) -> bool {
        self.scope.id() == other.scope.id()
    }
}

impl Eq for ScopePublisher {}

impl Hash for ScopePublisher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scope.id().hash(state);
    }
}

impl fmt::Debug for ScopePublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopePublisher")
            .field("scope", &self.scope.id())
            .field("name", &self.scope.name())
            .field("max_rank", &self.ranking.max_rank())
            .finish()
    }
}

impl fmt::Display for ScopePublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
