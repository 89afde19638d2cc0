//! Dynamic binding locator.
//!
//! Keeps every registered publisher paired with every live subscriber. Adding
//! either side replays it against a snapshot of the other side; removing
//! either side withdraws it from the other side. Nothing is rescanned on
//! lookup.
//!
//! The registry lock only covers the tables. Pairings run after it is
//! released, each under the lock of the subscriber involved.

use crate::config::{DuplicatePolicy, LocatorConfig, ReplayOrder};
use crate::error::{LodestarError, Result};
use crate::subscriber::{LiveBindings, Origin};
use lodestar_api::{BindingPublisher, Rank, ScopeId, TypeRef};
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Outcome of `add_publisher`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// An equal publisher was already registered and kept
    Unchanged,
    /// An equal publisher was withdrawn and the new one took its place
    Replaced,
}

struct PublisherEntry {
    origin: Origin,
    publisher: Arc<dyn BindingPublisher>,
}

impl PublisherEntry {
    fn new(origin: Origin, publisher: Arc<dyn BindingPublisher>) -> Self {
        Self { origin, publisher }
    }

    fn ordinal(&self) -> u64 {
        self.origin.ordinal()
    }

    /// Offer this publisher's matches, unless it was retired in the meantime.
    fn replay(&self, view: &LiveBindings) {
        view.pair(&self.origin, |subscriber| {
            if self.origin.is_live() {
                self.publisher.subscribe(subscriber);
            }
        });
    }

    /// Remove what this registration offered. Offers since taken over by a
    /// newer registration of the same scope stay.
    fn withdraw(&self, view: &LiveBindings) {
        view.pair(&self.origin, |subscriber| self.publisher.unsubscribe(subscriber));
    }
}

/// A publisher taken out of the registry, not yet withdrawn from its subscribers.
struct Detached {
    entry: Arc<PublisherEntry>,
    subscribers: Vec<Arc<LiveBindings>>,
}

impl Detached {
    fn withdraw(self) {
        for view in &self.subscribers {
            self.entry.withdraw(view);
        }
        tracing::debug!(
            "Removed publisher {} from {} subscribers",
            self.entry.publisher.describe(),
            self.subscribers.len()
        );
    }
}

#[derive(Default)]
struct Registry {
    publishers: Vec<Arc<PublisherEntry>>,
    subscribers: Vec<Arc<LiveBindings>>,
    next_ordinal: u64,
    next_token: u64,
    next_subscriber: u64,
}

impl Registry {
    fn position(&self, scope: ScopeId) -> Option<usize> {
        self.publishers
            .iter()
            .position(|e| e.publisher.scope_id() == scope)
    }

    fn origin(&mut self, ordinal: u64) -> Origin {
        let token = self.next_token;
        self.next_token += 1;
        Origin::new(token, ordinal)
    }
}

struct LocatorInner {
    config: LocatorConfig,
    registry: RwLock<Registry>,
}

impl LocatorInner {
    fn remove_subscriber(&self, view: &Arc<LiveBindings>) -> bool {
        let publishers = {
            let mut registry = self.registry.write();
            let Some(idx) = registry
                .subscribers
                .iter()
                .position(|s| Arc::ptr_eq(s, view))
            else {
                tracing::trace!("Subscriber for {} already removed", view.requested());
                return false;
            };
            registry.subscribers.remove(idx);
            registry.publishers.clone()
        };

        view.close(|subscriber| {
            for entry in &publishers {
                entry.publisher.unsubscribe(subscriber);
            }
        });
        tracing::debug!("Removed subscriber #{} for {}", view.id(), view.requested());
        true
    }
}

/// Registry of binding publishers and live binding queries.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct BindingLocator {
    inner: Arc<LocatorInner>,
}

impl Default for BindingLocator {
    fn default() -> Self {
        Self::new(LocatorConfig::default())
    }
}

impl BindingLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self {
            inner: Arc::new(LocatorInner {
                config,
                registry: RwLock::new(Registry::default()),
            }),
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.inner.config
    }

    /// Register a publisher and replay it into every live subscriber.
    pub fn add_publisher(&self, publisher: Arc<dyn BindingPublisher>) -> Result<Registration> {
        let scope = publisher.scope_id();
        let (entry, previous, subscribers) = {
            let mut registry = self.inner.registry.write();
            match registry.position(scope) {
                Some(idx) => match self.inner.config.duplicate_policy {
                    DuplicatePolicy::Ignore => {
                        tracing::debug!("Publisher for {} already registered; ignoring", scope);
                        return Ok(Registration::Unchanged);
                    }
                    DuplicatePolicy::Reject => {
                        return Err(LodestarError::DuplicateRegistration { scope });
                    }
                    DuplicatePolicy::Replace => {
                        let previous = Arc::clone(&registry.publishers[idx]);
                        previous.origin.retire();
                        let origin = registry.origin(previous.ordinal());
                        let entry = Arc::new(PublisherEntry::new(origin, publisher));
                        registry.publishers[idx] = Arc::clone(&entry);
                        (entry, Some(previous), registry.subscribers.clone())
                    }
                },
                None => {
                    let ordinal = registry.next_ordinal;
                    registry.next_ordinal += 1;
                    let origin = registry.origin(ordinal);
                    let entry = Arc::new(PublisherEntry::new(origin, publisher));
                    registry.publishers.push(Arc::clone(&entry));
                    (entry, None, registry.subscribers.clone())
                }
            }
        };

        for view in &subscribers {
            if let Some(previous) = &previous {
                previous.withdraw(view);
            }
            entry.replay(view);
        }

        tracing::debug!(
            "Registered publisher {} (ordinal {}) into {} subscribers",
            entry.publisher.describe(),
            entry.ordinal(),
            subscribers.len()
        );
        Ok(match previous {
            Some(_) => Registration::Replaced,
            None => Registration::Added,
        })
    }

    pub fn register(&self, publisher: Arc<dyn BindingPublisher>) -> Result<Registration> {
        self.add_publisher(publisher)
    }

    /// Withdraw the publisher of `scope` from every subscriber and drop it.
    pub fn remove_publisher(&self, scope: ScopeId) -> bool {
        match self.detach(scope) {
            Some(detached) => {
                detached.withdraw();
                true
            }
            None => false,
        }
    }

    /// Take the publisher of `scope` out of the registry and retire it.
    ///
    /// From here on the scope may be registered again, even before the
    /// returned withdrawal has run.
    fn detach(&self, scope: ScopeId) -> Option<Detached> {
        let mut registry = self.inner.registry.write();
        let Some(idx) = registry.position(scope) else {
            tracing::trace!("No publisher registered for {}", scope);
            return None;
        };
        let entry = registry.publishers.remove(idx);
        entry.origin.retire();
        Some(Detached {
            entry,
            subscribers: registry.subscribers.clone(),
        })
    }

    pub fn deregister(&self, publisher: &dyn BindingPublisher) -> bool {
        self.remove_publisher(publisher.scope_id())
    }

    /// Start a live query for `requested`, populated from every current publisher.
    pub fn add_subscriber(&self, requested: TypeRef) -> Located {
        let (view, publishers) = {
            let mut registry = self.inner.registry.write();
            let id = registry.next_subscriber;
            registry.next_subscriber += 1;
            let view = Arc::new(LiveBindings::with_id(id, requested));
            registry.subscribers.push(Arc::clone(&view));
            (view, registry.publishers.clone())
        };

        for entry in self.replay_order(publishers) {
            entry.replay(&view);
        }

        tracing::debug!(
            "Added subscriber #{} for {} with {} bindings",
            view.id(),
            view.requested(),
            view.len()
        );
        Located {
            view,
            locator: Arc::downgrade(&self.inner),
        }
    }

    pub fn locate(&self, requested: TypeRef) -> Located {
        self.add_subscriber(requested)
    }

    /// `locate` for a type written in source form, e.g. `java.util.List<java.lang.String>`.
    pub fn locate_str(&self, requested: &str) -> Result<Located> {
        Ok(self.add_subscriber(TypeRef::parse(requested)?))
    }

    /// Stop a live query. Returns false if it was already removed.
    pub fn remove_subscriber(&self, located: &Located) -> bool {
        self.inner.remove_subscriber(&located.view)
    }

    /// Highest rank any registered publisher can hand out.
    pub fn max_rank(&self) -> Option<Rank> {
        self.inner
            .registry
            .read()
            .publishers
            .iter()
            .map(|e| e.publisher.max_binding_rank())
            .max()
    }

    pub fn max_rank_of(&self, scope: ScopeId) -> Option<Rank> {
        let registry = self.inner.registry.read();
        registry
            .position(scope)
            .map(|idx| registry.publishers[idx].publisher.max_binding_rank())
    }

    /// Registered publishers in registration order.
    pub fn publishers(&self) -> Vec<Arc<dyn BindingPublisher>> {
        self.inner
            .registry
            .read()
            .publishers
            .iter()
            .map(|e| Arc::clone(&e.publisher))
            .collect()
    }

    pub fn contains(&self, scope: ScopeId) -> bool {
        self.inner.registry.read().position(scope).is_some()
    }

    pub fn publisher_count(&self) -> usize {
        self.inner.registry.read().publishers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.read().subscribers.len()
    }

    fn replay_order(&self, mut publishers: Vec<Arc<PublisherEntry>>) -> Vec<Arc<PublisherEntry>> {
        if self.inner.config.replay_order == ReplayOrder::MaxRank {
            publishers.sort_by_key(|e| Reverse(e.publisher.max_binding_rank()));
        }
        publishers
    }
}

/// Handle on a live query.
///
/// Dereferences to the underlying [`LiveBindings`]. Dropping the handle does
/// not stop the query; call [`Located::release`] or
/// [`BindingLocator::remove_subscriber`].
#[derive(Clone)]
pub struct Located {
    view: Arc<LiveBindings>,
    locator: Weak<LocatorInner>,
}

impl Located {
    /// Stop this query. Returns false if it was already stopped or the locator is gone.
    pub fn release(&self) -> bool {
        match self.locator.upgrade() {
            Some(inner) => inner.remove_subscriber(&self.view),
            None => false,
        }
    }
}

impl Deref for Located {
    type Target = LiveBindings;

    fn deref(&self) -> &LiveBindings {
        &self.view
    }
}
