use lodestar_api::Rank;
use serde::{Deserialize, Serialize};

/// What to do when a publisher for an already published scope is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the existing publisher; the call is a no-op
    #[default]
    Ignore,
    /// Fail with `DuplicateRegistration`
    Reject,
    /// Withdraw the existing publisher and replay the new one in its place
    Replace,
}

/// Order in which publishers are replayed into a new subscriber.
///
/// Results are ranked identically under both orders; `MaxRank` only lets
/// higher-priority scopes populate first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOrder {
    #[default]
    Registration,
    MaxRank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub replay_order: ReplayOrder,
    /// Primary rank handed to the first tracked scope
    pub base_rank: Rank,
    /// Decrement between consecutively tracked scopes
    pub rank_step: Rank,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            replay_order: ReplayOrder::default(),
            base_rank: 0,
            rank_step: 1,
        }
    }
}

impl LocatorConfig {
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_replay_order(mut self, order: ReplayOrder) -> Self {
        self.replay_order = order;
        self
    }

    pub fn with_base_rank(mut self, base_rank: Rank) -> Self {
        self.base_rank = base_rank;
        self
    }

    pub fn with_rank_step(mut self, rank_step: Rank) -> Self {
        self.rank_step = rank_step;
        self
    }
}
