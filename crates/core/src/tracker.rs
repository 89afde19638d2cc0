use crate::config::LocatorConfig;
use crate::error::Result;
use crate::locator::{BindingLocator, Registration};
use crate::publisher::ScopePublisher;
use crate::ranking::RankAllocator;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lodestar_api::ScopeId;
use lodestar_plugin::{ScopeCandidate, ScopePtr, ScopeSelector};
use std::sync::Arc;

/// Bridges the scope lifecycle to the locator.
///
/// Selected scopes are published with a freshly allocated primary rank, so
/// scopes loaded later rank below earlier ones.
pub struct ScopeTracker {
    locator: BindingLocator,
    selector: Arc<dyn ScopeSelector>,
    ranks: RankAllocator,
    tracked: DashMap<ScopeId, ScopeCandidate>,
}

impl ScopeTracker {
    pub fn new(locator: BindingLocator, selector: Arc<dyn ScopeSelector>) -> Self {
        let config = locator.config();
        let ranks = RankAllocator::below(locator.max_rank(), config.base_rank, config.rank_step);
        Self::with_allocator(locator, selector, ranks)
    }

    pub fn with_allocator(
        locator: BindingLocator,
        selector: Arc<dyn ScopeSelector>,
        ranks: RankAllocator,
    ) -> Self {
        Self {
            locator,
            selector,
            ranks,
            tracked: DashMap::new(),
        }
    }

    pub fn locator(&self) -> &BindingLocator {
        &self.locator
    }

    /// Publish `scope` if its candidate is selected. Returns whether it was registered.
    pub fn scope_loaded(&self, candidate: &ScopeCandidate, scope: ScopePtr) -> Result<bool> {
        if !self.selector.select(candidate) {
            tracing::debug!("Skipping unselected scope {}", candidate.name);
            return Ok(false);
        }

        let id = scope.id();
        match self.tracked.entry(id) {
            Entry::Occupied(_) => {
                tracing::trace!("Scope {} already tracked", candidate.name);
                return Ok(false);
            }
            Entry::Vacant(slot) => {
                slot.insert(candidate.clone());
            }
        }

        let ranking = self.ranks.next_function();
        let publisher = ScopePublisher::new(scope, Arc::new(ranking));
        match self.locator.add_publisher(Arc::new(publisher)) {
            Ok(Registration::Added | Registration::Replaced) => {
                tracing::info!(
                    "Tracking scope {} at rank {}",
                    candidate.name,
                    ranking.primary_rank()
                );
                Ok(true)
            }
            Ok(Registration::Unchanged) => {
                self.tracked.remove(&id);
                Ok(false)
            }
            Err(err) => {
                self.tracked.remove(&id);
                Err(err)
            }
        }
    }

    /// Withdraw a tracked scope. Returns false if it was not tracked.
    pub fn scope_unloaded(&self, scope: ScopeId) -> bool {
        match self.tracked.remove(&scope) {
            Some((_, candidate)) => {
                tracing::info!("Untracking scope {}", candidate.name);
                self.locator.remove_publisher(scope);
                true
            }
            None => false,
        }
    }

    pub fn is_tracked(&self, scope: ScopeId) -> bool {
        self.tracked.contains_key(&scope)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Tracker with a fresh locator built from `config`.
    pub fn from_config(config: LocatorConfig, selector: Arc<dyn ScopeSelector>) -> Self {
        Self::new(BindingLocator::new(config), selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_table::ClassTable;
    use crate::scope::InjectorScope;
    use lodestar_api::{Key, Target, TypeRef};
    use lodestar_plugin::DefaultScopeSelector;

    fn plugin_scope(name: &str) -> Arc<InjectorScope> {
        let scope = Arc::new(InjectorScope::new(name, Arc::new(ClassTable::new())));
        scope.bind(
            Key::of(TypeRef::id("a.Service")),
            Target::Instance(format!("{name}.Impl")),
        );
        scope
    }

    fn candidate(name: &str) -> ScopeCandidate {
        ScopeCandidate::new(name).importing(DefaultScopeSelector::DEFAULT_MARKER)
    }

    #[test]
    fn test_unselected_scope_is_not_published() {
        let tracker = ScopeTracker::from_config(
            LocatorConfig::default(),
            Arc::new(DefaultScopeSelector::default()),
        );
        let scope = plugin_scope("plain");
        assert!(!tracker.scope_loaded(&ScopeCandidate::new("plain"), scope.clone()).unwrap());
        assert_eq!(tracker.locator().publisher_count(), 0);
        assert!(!tracker.scope_unloaded(scope.id()));
    }

    #[test]
    fn test_later_scopes_rank_lower() {
        let tracker = ScopeTracker::from_config(
            LocatorConfig::default().with_base_rank(10).with_rank_step(5),
            Arc::new(DefaultScopeSelector::default()),
        );
        let first = plugin_scope("first");
        let second = plugin_scope("second");
        assert!(tracker.scope_loaded(&candidate("first"), first.clone()).unwrap());
        assert!(tracker.scope_loaded(&candidate("second"), second.clone()).unwrap());
        assert!(!tracker.scope_loaded(&candidate("first"), first.clone()).unwrap());

        let locator = tracker.locator();
        assert_eq!(locator.max_rank_of(first.id()), Some(10));
        assert_eq!(locator.max_rank_of(second.id()), Some(5));
        assert_eq!(tracker.tracked_count(), 2);

        assert!(tracker.scope_unloaded(first.id()));
        assert!(!tracker.is_tracked(first.id()));
        assert!(!locator.contains(first.id()));
    }

    #[test]
    fn test_allocator_seeds_below_existing_publishers() {
        let locator = BindingLocator::default();
        let existing = plugin_scope("existing");
        locator
            .add_publisher(Arc::new(ScopePublisher::with_primary_rank(existing, 3)))
            .unwrap();

        let tracker = ScopeTracker::new(locator.clone(), Arc::new(DefaultScopeSelector::default()));
        let scope = plugin_scope("late");
        tracker.scope_loaded(&candidate("late"), scope.clone()).unwrap();
        assert_eq!(locator.max_rank_of(scope.id()), Some(0));
    }
}
