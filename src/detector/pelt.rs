use crate::detector::{Search, cost::CostTable};

/// Pruned exact linear time search ([PELT][1]).
///
/// Optimal partitioning by dynamic programming over the last changepoint position,
/// with candidates pruned once they can no longer start the optimal last segment.
/// The result is the exact minimum of `Σ cost + penalty × segments`.
///
/// [1]: https://doi.org/10.1080/01621459.2012.737745
#[derive(Copy, Clone, Debug, Default)]
pub struct Pelt;

impl Search for Pelt {
    fn search(&self, costs: &CostTable, penalty: f64, min_segment_length: usize) -> Vec<usize> {
        let n = costs.len();
        let min_size = min_segment_length.max(1);
        if n < 2 * min_size {
            return Vec::new();
        }

        // `best[t]`: optimal cost of `[0, t)`, with the first segment not penalized twice.
        let mut best = vec![f64::INFINITY; n + 1];
        best[0] = -penalty;
        let mut last_change = vec![0_usize; n + 1];
        let mut candidates = vec![0_usize];

        for end in min_size..=n {
            // The newest start able to open a segment ending here:
            let newest = end - min_size;
            if newest >= min_size {
                candidates.push(newest);
            }

            let (start, cost) = candidates
                .iter()
                .map(|&start| (start, best[start] + costs.cost(start, end) + penalty))
                .fold((0, f64::INFINITY), |(best_start, best_cost), (start, cost)| {
                    if cost < best_cost { (start, cost) } else { (best_start, best_cost) }
                });
            best[end] = cost;
            last_change[end] = start;

            // Every later end is at least `min_size` past `newest`, so `newest` is an admissible
            // last changepoint for all of them and may witness the pruning:
            candidates.retain(|&start| best[start] + costs.cost(start, newest) <= best[newest]);
        }

        let mut breakpoints = Vec::new();
        let mut end = n;
        while end > 0 {
            end = last_change[end];
            if end > 0 {
                breakpoints.push(end);
            }
        }
        breakpoints.reverse();
        breakpoints
    }
}
