use itertools::Itertools;

use crate::detector::{Search, cost::CostTable};

/// Sliding-window search: compares two adjacent windows around every position.
///
/// Linear time. Approximate: only local maxima of the split gain whose gain exceeds the
/// penalty are kept, strongest first, at least the minimum segment length apart.
#[derive(Copy, Clone, Debug)]
pub struct SlidingWindow {
    /// Samples on each side of the candidate position.
    pub width: usize,
}

impl Search for SlidingWindow {
    fn search(&self, costs: &CostTable, penalty: f64, min_segment_length: usize) -> Vec<usize> {
        let n = costs.len();
        let min_size = min_segment_length.max(1);
        let width = self.width.max(1);
        if n < 2 * min_size {
            return Vec::new();
        }

        let gains = (min_size..=n - min_size)
            .map(|split| (split, costs.gain(split.saturating_sub(width), split, (split + width).min(n))))
            .collect_vec();
        let peaks = gains
            .iter()
            .enumerate()
            .filter(|(index, (_, gain))| {
                let previous = index.checked_sub(1).map_or(f64::NEG_INFINITY, |index| gains[index].1);
                let next = gains.get(index + 1).map_or(f64::NEG_INFINITY, |(_, gain)| *gain);
                *gain > previous && *gain >= next && *gain > penalty
            })
            .map(|(_, peak)| *peak)
            .sorted_by(|(lhs_split, lhs_gain), (rhs_split, rhs_gain)| {
                rhs_gain.total_cmp(lhs_gain).then(lhs_split.cmp(rhs_split))
            });

        let mut breakpoints: Vec<usize> = Vec::new();
        for (split, _) in peaks {
            if breakpoints.iter().all(|breakpoint| breakpoint.abs_diff(split) >= min_size) {
                breakpoints.push(split);
            }
        }
        breakpoints.sort_unstable();
        breakpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::cost::CostModel;

    fn search(values: &[f64], width: usize, penalty: f64) -> Vec<usize> {
        SlidingWindow { width }.search(&CostTable::new(values, CostModel::MeanShift), penalty, 2)
    }

    #[test]
    fn test_two_steps() {
        let values = [1.0, 1.0, 1.0, 1.0, 7.0, 7.0, 7.0, 7.0, 7.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(search(&values, 10, 3.0), [4, 9]);
        assert_eq!(search(&values, 2, 3.0), [4, 9]);
    }

    #[test]
    fn test_step_with_noise() {
        let values = (0..40)
            .map(|index| {
                let noise = if index % 2 == 0 { 0.1 } else { -0.1 };
                if index < 20 { 0.5 + noise } else { 7.5 + noise }
            })
            .collect_vec();
        assert_eq!(search(&values, 5, 3.0), [20]);
    }

    #[test]
    fn test_constant() {
        assert!(search(&[1.0; 30], 5, 0.1).is_empty());
    }
}
