//! Segment costs over prefix sums, so that any `[start, end)` mean-based cost is `O(1)`.

use serde::{Deserialize, Serialize};

/// Variance floor for [`CostModel::MeanVarShift`], in kW².
///
/// Perfectly flat segments would otherwise have an unbounded negative log-likelihood.
pub const VARIANCE_FLOOR: f64 = 1e-4;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CostModel {
    /// Sum of squared deviations from the segment mean.
    #[default]
    MeanShift,

    /// Gaussian negative log-likelihood with a per-segment mean and variance.
    MeanVarShift,

    /// Sum of absolute deviations from the segment median (L1), robust to spikes.
    ///
    /// Costs `O(n)` per segment instead of `O(1)`.
    #[serde(alias = "l1")]
    #[value(alias = "l1")]
    MedianShift,
}

#[must_use]
pub struct CostTable {
    model: CostModel,
    values: Vec<f64>,
    sum: Vec<f64>,
    sum_squared: Vec<f64>,
}

impl CostTable {
    pub fn new(values: &[f64], model: CostModel) -> Self {
        let mut sum = Vec::with_capacity(values.len() + 1);
        let mut sum_squared = Vec::with_capacity(values.len() + 1);
        sum.push(0.0);
        sum_squared.push(0.0);
        for value in values {
            sum.push(sum[sum.len() - 1] + value);
            sum_squared.push(sum_squared[sum_squared.len() - 1] + value * value);
        }
        Self { model, values: values.to_vec(), sum, sum_squared }
    }

    /// Number of samples covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.sum.len() - 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cost of modelling `[start, end)` as a single homogeneous segment.
    #[must_use]
    pub fn cost(&self, start: usize, end: usize) -> f64 {
        if end <= start {
            return 0.0;
        }
        if self.model == CostModel::MedianShift {
            return self.absolute_deviation(start, end);
        }
        #[expect(clippy::cast_precision_loss)]
        let n = (end - start) as f64;
        let sum = self.sum[end] - self.sum[start];
        let squared_error = (self.sum_squared[end] - self.sum_squared[start] - sum * sum / n).max(0.0);
        match self.model {
            CostModel::MeanShift | CostModel::MedianShift => squared_error,
            CostModel::MeanVarShift => {
                // Profile likelihood with the variance constrained to the floor:
                let variance = squared_error / n;
                if variance >= VARIANCE_FLOOR {
                    n * (1.0 + variance.ln())
                } else {
                    squared_error / VARIANCE_FLOOR + n * VARIANCE_FLOOR.ln()
                }
            }
        }
    }

    /// Any median minimizes the absolute deviation, so the lower one is as good as the mean
    /// of the two middle values.
    fn absolute_deviation(&self, start: usize, end: usize) -> f64 {
        let mut segment = self.values[start..end].to_vec();
        let middle = segment.len() / 2;
        let (_, &mut median, _) = segment.select_nth_unstable_by(middle, f64::total_cmp);
        segment.iter().map(|value| (value - median).abs()).sum()
    }

    /// Cost reduction from splitting `[start, end)` at `split`.
    #[must_use]
    pub fn gain(&self, start: usize, split: usize, end: usize) -> f64 {
        self.cost(start, end) - self.cost(start, split) - self.cost(split, end)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_mean_shift_cost() {
        let table = CostTable::new(&[1.0, 2.0, 3.0, 10.0], CostModel::MeanShift);
        assert_eq!(table.len(), 4);
        assert_abs_diff_eq!(table.cost(0, 3), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(table.cost(3, 4), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(table.cost(2, 2), 0.0);
    }

    #[test]
    fn test_mean_shift_gain() {
        let table = CostTable::new(&[1.0, 1.0, 7.0, 7.0], CostModel::MeanShift);
        assert_abs_diff_eq!(table.gain(0, 2, 4), 36.0, epsilon = 1e-9);
        assert!(table.gain(0, 1, 4) < table.gain(0, 2, 4));
    }

    #[test]
    fn test_mean_var_shift_prefers_variance_split() {
        let mut values = vec![5.0; 8];
        values.extend([1.0, 9.0, 1.0, 9.0, 1.0, 9.0, 1.0, 9.0]);
        let table = CostTable::new(&values, CostModel::MeanVarShift);
        assert!(table.gain(0, 8, 16) > 0.0);

        // The mean is the same on both sides, the squared error does not see the change:
        let table = CostTable::new(&values, CostModel::MeanShift);
        assert_abs_diff_eq!(table.gain(0, 8, 16), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mean_var_shift_flat_segment() {
        let table = CostTable::new(&[3.0; 4], CostModel::MeanVarShift);
        assert_abs_diff_eq!(table.cost(0, 4), 4.0 * VARIANCE_FLOOR.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_median_shift_cost() {
        let table = CostTable::new(&[1.0, 2.0, 3.0, 10.0], CostModel::MedianShift);
        assert_abs_diff_eq!(table.cost(0, 4), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(table.cost(0, 3), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(table.cost(1, 1), 0.0);
    }

    #[test]
    fn test_median_shift_discounts_spike() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 25.0, 1.0, 1.0];
        let squared = CostTable::new(&values, CostModel::MeanShift);
        let absolute = CostTable::new(&values, CostModel::MedianShift);
        assert_abs_diff_eq!(absolute.cost(0, 8), 24.0, epsilon = 1e-9);
        assert!(squared.cost(0, 8) > 20.0 * absolute.cost(0, 8));
    }

    #[test]
    fn test_median_shift_alias() -> Result<(), toml::de::Error> {
        #[derive(Deserialize)]
        struct Config {
            model: CostModel,
        }
        assert_eq!(toml::from_str::<Config>(r#"model = "l1""#)?.model, CostModel::MedianShift);
        assert_eq!(toml::from_str::<Config>(r#"model = "median-shift""#)?.model, CostModel::MedianShift);
        Ok(())
    }
}
