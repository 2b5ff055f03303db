//! Weighted random choice over a cumulative weight table.

use rand::Rng;

/// Cumulative weights for a fixed list of options. Sampling costs one draw.
#[derive(Debug, Clone)]
pub struct WeightedTable {
    cumulative: Vec<u64>,
}

impl WeightedTable {
    /// Returns `None` if there are no options or every weight is zero.
    pub fn new(weights: impl IntoIterator<Item = u64>) -> Option<Self> {
        let mut total: u64 = 0;
        let cumulative: Vec<u64> = weights
            .into_iter()
            .map(|weight| {
                total = total.saturating_add(weight);
                total
            })
            .collect();

        if total == 0 {
            return None;
        }
        Some(Self { cumulative })
    }

    pub fn total(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Index of the option owning `ticket`, where `ticket < total()`.
    pub fn index_for(&self, ticket: u64) -> usize {
        debug_assert!(ticket < self.total());
        self.cumulative.partition_point(|&upper| upper <= ticket)
    }

    /// Pick an option index with probability proportional to its weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let ticket = rng.gen_range(0..self.total());
        self.index_for(ticket)
    }
}
