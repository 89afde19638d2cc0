use crate::models::{Binding, Rank};

/// Assigns ranks to the bindings of one scope.
pub trait RankingFunction: Send + Sync {
    /// Highest rank this function can hand out.
    fn max_rank(&self) -> Rank;

    fn rank(&self, binding: &Binding) -> Rank;
}
