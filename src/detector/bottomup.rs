use itertools::Itertools;

use crate::detector::{Search, binseg::best_split, cost::CostTable};

/// Bottom-up segmentation.
///
/// Grows the finest partition the minimum segment length allows by splitting every segment at its
/// best split, then repeatedly merges the adjacent pair whose merge costs the least, while that
/// cost does not exceed the penalty. Approximate, like [`super::BinarySegmentation`], but a weak
/// early split cannot hide a stronger one nearby.
#[derive(Copy, Clone, Debug, Default)]
pub struct BottomUp;

impl Search for BottomUp {
    fn search(&self, costs: &CostTable, penalty: f64, min_segment_length: usize) -> Vec<usize> {
        let min_size = min_segment_length.max(1);
        let n = costs.len();

        let mut bounds = vec![0, n];
        let mut segments = vec![(0, n)];
        while let Some((start, end)) = segments.pop() {
            if let Some((split, _)) = best_split(costs, start, end, min_size) {
                bounds.push(split);
                segments.extend([(start, split), (split, end)]);
            }
        }
        bounds.sort_unstable();

        loop {
            // Index of the bound to drop and the cost of dropping it, the lowest index winning ties:
            let cheapest = bounds
                .iter()
                .tuple_windows()
                .enumerate()
                .map(|(index, (&start, &split, &end))| (index + 1, costs.gain(start, split, end)))
                .fold(None, |best: Option<(usize, f64)>, candidate| match best {
                    Some(best) if best.1 <= candidate.1 => Some(best),
                    _ => Some(candidate),
                });
            match cheapest {
                Some((index, gain)) if gain <= penalty => {
                    bounds.remove(index);
                }
                _ => break,
            }
        }

        bounds.into_iter().filter(|&bound| 0 < bound && bound < n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::cost::CostModel;

    fn search(values: &[f64], penalty: f64, min_segment_length: usize) -> Vec<usize> {
        BottomUp.search(&CostTable::new(values, CostModel::MeanShift), penalty, min_segment_length)
    }

    #[test]
    fn test_two_steps() {
        let values = [1.0, 1.0, 1.0, 1.0, 7.0, 7.0, 7.0, 7.0, 7.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(search(&values, 3.0, 2), [4, 9]);
    }

    #[test]
    fn test_constant() {
        assert!(search(&[2.0; 12], 0.5, 2).is_empty());
    }

    #[test]
    fn test_three_levels() {
        let mut values = vec![0.0; 10];
        values.extend([10.0; 10]);
        values.extend([4.0; 10]);
        assert_eq!(search(&values, 2.0, 3), [10, 20]);
    }

    #[test]
    fn test_short_series() {
        assert!(search(&[1.0, 9.0, 1.0], 0.1, 2).is_empty());
        assert!(search(&[], 0.1, 2).is_empty());
    }

    #[test]
    fn test_high_penalty_merges_everything() {
        let mut values = vec![0.0; 10];
        values.extend([100.0; 10]);
        assert!(search(&values, 100_000.0, 2).is_empty());
    }

    #[test]
    fn test_segments_hold_min_length() {
        let values = [0.3, 7.1, 0.2, 7.6, 7.2, 0.4, 0.1, 11.0, 11.4, 0.5, 7.3];
        let breakpoints = search(&values, 0.5, 2);
        let bounds: Vec<_> =
            std::iter::once(0).chain(breakpoints).chain(std::iter::once(values.len())).collect();
        assert!(bounds.windows(2).all(|pair| pair[1] - pair[0] >= 2));
    }
}
