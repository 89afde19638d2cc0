use crate::models::{Binding, Rank, ScopeId, TypeRef};
use std::sync::Arc;

/// A live query for every binding matching one requested type.
///
/// Publishers push matches through `add` and withdraw them through `remove`.
/// Callbacks are made synchronously on the thread driving the replay.
pub trait BindingSubscriber {
    /// The type this subscriber asked for.
    fn requested(&self) -> &TypeRef;

    /// Offer a matching binding at the given rank.
    fn add(&self, binding: Arc<Binding>, rank: Rank);

    /// Withdraw a binding by identity. Returns false when it was not held.
    fn remove(&self, binding: &Arc<Binding>) -> bool;

    /// Bindings currently held, in ranked order.
    fn bindings(&self) -> Vec<Arc<Binding>>;
}

/// Source of bindings backed by one injection scope.
pub trait BindingPublisher: Send + Sync {
    /// Identity of the wrapped scope. Publishers over the same scope are equal.
    fn scope_id(&self) -> ScopeId;

    /// Offer every matching binding of this scope to the subscriber.
    fn subscribe(&self, subscriber: &dyn BindingSubscriber);

    /// Withdraw every binding of this scope that the subscriber holds.
    fn unsubscribe(&self, subscriber: &dyn BindingSubscriber);

    /// Upper bound of the ranks this publisher hands out.
    fn max_binding_rank(&self) -> Rank;

    /// Human readable name for logs.
    fn describe(&self) -> String {
        self.scope_id().to_string()
    }
}
