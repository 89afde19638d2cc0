//! Ranking functions.
//!
//! Every scope gets a primary rank. Default (unqualified) bindings are ranked
//! at the primary rank, qualified ones far below it so that any scope's
//! default binding wins over every qualified alternative. Bindings carrying an
//! explicit priority use it verbatim.

use lodestar_api::{Binding, Rank, RankingFunction};
use std::sync::atomic::{AtomicI32, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultRankingFunction {
    primary_rank: Rank,
}

impl DefaultRankingFunction {
    pub fn new(primary_rank: Rank) -> Self {
        Self { primary_rank }
    }

    pub fn primary_rank(&self) -> Rank {
        self.primary_rank
    }
}

impl RankingFunction for DefaultRankingFunction {
    fn max_rank(&self) -> Rank {
        self.primary_rank
    }

    /// Qualified bindings rank at `primary_rank + Rank::MIN`, saturating. For any
    /// negative primary rank that is `Rank::MIN`, so qualified bindings of such
    /// scopes tie with each other and fall back to registration order.
    fn rank(&self, binding: &Binding) -> Rank {
        if let Some(priority) = binding.priority() {
            return priority;
        }
        if binding.key().is_default() {
            self.primary_rank
        } else {
            self.primary_rank.saturating_add(Rank::MIN)
        }
    }
}

/// Hands out descending primary ranks, one per newly tracked scope.
#[derive(Debug)]
pub struct RankAllocator {
    next: AtomicI32,
    step: Rank,
}

impl RankAllocator {
    pub fn new(base_rank: Rank, step: Rank) -> Self {
        Self {
            next: AtomicI32::new(base_rank),
            step: step.max(0),
        }
    }

    /// Start one step below `ceiling` (e.g. the locator's current max rank), or at `base_rank`.
    pub fn below(ceiling: Option<Rank>, base_rank: Rank, step: Rank) -> Self {
        let start = match ceiling {
            Some(max) => max.saturating_sub(step.max(0)).min(base_rank),
            None => base_rank,
        };
        Self::new(start, step)
    }

    pub fn peek(&self) -> Rank {
        self.next.load(Ordering::Acquire)
    }

    pub fn next_rank(&self) -> Rank {
        let step = self.step;
        match self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| Some(r.saturating_sub(step)))
        {
            Ok(prev) | Err(prev) => prev,
        }
    }

    pub fn next_function(&self) -> DefaultRankingFunction {
        DefaultRankingFunction::new(self.next_rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_api::{Key, ScopeId, Target, TypeRef};

    fn binding(key: Key) -> Binding {
        Binding::new(ScopeId::next(), key, Target::Constructor)
    }

    #[test]
    fn test_default_and_qualified_ranks() {
        let f = DefaultRankingFunction::new(10);
        let service = TypeRef::id("a.Service");
        assert_eq!(f.max_rank(), 10);
        assert_eq!(f.rank(&binding(Key::of(service.clone()))), 10);
        assert_eq!(f.rank(&binding(Key::named(service.clone(), "fast"))), 10 + Rank::MIN);
        assert_eq!(
            f.rank(&binding(Key::named(service, "fast")).with_priority(42)),
            42
        );
    }

    #[test]
    fn test_qualified_rank_saturates_for_negative_primary() {
        let f = DefaultRankingFunction::new(-5);
        let qualified = binding(Key::named(TypeRef::id("a.Service"), "x"));
        assert_eq!(f.rank(&qualified), Rank::MIN);
        assert_eq!(DefaultRankingFunction::new(-100).rank(&qualified), Rank::MIN);
        // Still below every default binding
        assert!(f.rank(&qualified) < DefaultRankingFunction::new(Rank::MIN + 1).max_rank());
    }

    #[test]
    fn test_allocator_descends() {
        let alloc = RankAllocator::new(0, 10);
        assert_eq!(alloc.next_rank(), 0);
        assert_eq!(alloc.next_rank(), -10);
        assert_eq!(alloc.next_function().primary_rank(), -20);
        assert_eq!(alloc.peek(), -30);
    }

    #[test]
    fn test_allocator_below_ceiling() {
        assert_eq!(RankAllocator::below(Some(5), 0, 1).peek(), 0);
        assert_eq!(RankAllocator::below(Some(-3), 0, 1).peek(), -4);
        assert_eq!(RankAllocator::below(None, 7, 1).peek(), 7);
    }
}
