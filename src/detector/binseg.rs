use crate::detector::{Search, cost::CostTable};

/// Greedy binary segmentation.
///
/// Repeatedly splits the segment whose best split reduces the cost the most, while the
/// reduction exceeds the penalty. Approximate: a split is never revisited.
#[derive(Copy, Clone, Debug, Default)]
pub struct BinarySegmentation;

impl Search for BinarySegmentation {
    fn search(&self, costs: &CostTable, penalty: f64, min_segment_length: usize) -> Vec<usize> {
        let min_size = min_segment_length.max(1);
        let mut segments = vec![(0, costs.len())];
        let mut breakpoints = Vec::new();

        loop {
            let best = segments
                .iter()
                .enumerate()
                .filter_map(|(index, &(start, end))| {
                    best_split(costs, start, end, min_size).map(|(split, gain)| (index, split, gain))
                })
                .fold(None, |best: Option<(usize, usize, f64)>, candidate| match best {
                    Some(best) if best.2 >= candidate.2 => Some(best),
                    _ => Some(candidate),
                });
            match best {
                Some((index, split, gain)) if gain > penalty => {
                    let (start, end) = segments[index];
                    segments.splice(index..=index, [(start, split), (split, end)]);
                    breakpoints.push(split);
                }
                _ => break,
            }
        }

        breakpoints.sort_unstable();
        breakpoints
    }
}

/// Best admissible split of `[start, end)` and its gain, the lowest index winning ties.
pub(super) fn best_split(
    costs: &CostTable,
    start: usize,
    end: usize,
    min_size: usize,
) -> Option<(usize, f64)> {
    if end - start < 2 * min_size {
        return None;
    }
    (start + min_size..=end - min_size).map(|split| (split, costs.gain(start, split, end))).fold(
        None,
        |best, (split, gain)| match best {
            Some((_, best_gain)) if best_gain >= gain => best,
            _ => Some((split, gain)),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::cost::CostModel;

    fn search(values: &[f64], penalty: f64, min_segment_length: usize) -> Vec<usize> {
        BinarySegmentation.search(
            &CostTable::new(values, CostModel::MeanShift),
            penalty,
            min_segment_length,
        )
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
}
