mod binseg;
mod bottomup;
pub mod cost;
mod level;
mod pelt;
mod window;

use bon::Builder;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use self::{
    binseg::BinarySegmentation,
    bottomup::BottomUp,
    cost::{CostModel, CostTable},
    level::LevelEstimator,
    pelt::Pelt,
    window::SlidingWindow,
};
use crate::{
    error::{Error, Result},
    quantity::power::Kilowatts,
    series::SeriesWindow,
};

/// Segmentation backend.
///
/// Implementations must be deterministic and return strictly increasing breakpoints
/// inside `(0, costs.len())`, each segment holding at least `min_segment_length` samples.
/// A breakpoint is the index of the first sample of a new segment.
pub trait Search {
    fn search(&self, costs: &CostTable, penalty: f64, min_segment_length: usize) -> Vec<usize>;
}

/// Configurable choice of the built-in [`Search`] backends.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMethod {
    /// Exact dynamic programming.
    #[default]
    Pelt,

    /// Greedy binary segmentation, approximate.
    Binseg,

    /// Linear-time sliding window, approximate.
    Window,

    /// Greedy bottom-up merging of a fine partition, approximate.
    #[serde(alias = "bottomup")]
    #[value(alias = "bottomup")]
    BottomUp,
}

#[derive(Copy, Clone, Debug)]
pub enum Strategy {
    Pelt(Pelt),
    BinarySegmentation(BinarySegmentation),
    SlidingWindow(SlidingWindow),
    BottomUp(BottomUp),
}

impl Strategy {
    pub const fn new(method: SearchMethod, window_width: usize) -> Self {
        match method {
            SearchMethod::Pelt => Self::Pelt(Pelt),
            SearchMethod::Binseg => Self::BinarySegmentation(BinarySegmentation),
            SearchMethod::Window => Self::SlidingWindow(SlidingWindow { width: window_width }),
            SearchMethod::BottomUp => Self::BottomUp(BottomUp),
        }
    }
}

impl Search for Strategy {
    fn search(&self, costs: &CostTable, penalty: f64, min_segment_length: usize) -> Vec<usize> {
        match self {
            Self::Pelt(search) => search.search(costs, penalty, min_segment_length),
            Self::BinarySegmentation(search) => search.search(costs, penalty, min_segment_length),
            Self::SlidingWindow(search) => search.search(costs, penalty, min_segment_length),
            Self::BottomUp(search) => search.search(costs, penalty, min_segment_length),
        }
    }
}

/// Detected level shift.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Changepoint {
    /// Index of the first sample after the shift.
    pub index: usize,

    pub timestamp: DateTime<Utc>,
    pub level_before: Kilowatts,
    pub level_after: Kilowatts,
}

impl Changepoint {
    #[must_use]
    pub fn delta(&self) -> Kilowatts {
        self.level_after - self.level_before
    }
}

#[derive(Builder)]
pub struct ChangepointDetector<S> {
    search: S,

    /// Cost of every additional segment: the higher, the fewer changepoints.
    penalty: f64,

    /// Minimum number of samples between breakpoints and the window bounds.
    #[builder(default = 2)]
    min_segment_length: usize,

    #[builder(default)]
    cost_model: CostModel,

    /// Maximum number of samples on each side used to estimate the levels.
    #[builder(default = 2)]
    level_window: usize,

    #[builder(default)]
    level_estimator: LevelEstimator,
}

impl<S: Search> ChangepointDetector<S> {
    /// Segment the series and estimate the levels around every breakpoint.
    ///
    /// Returns an empty sequence when no segmentation beats the single-segment model.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientData`] when the series is shorter than two minimal segments.
    #[instrument(skip_all, fields(household = %series.household(), len = series.len()))]
    pub fn detect(&self, series: &SeriesWindow) -> Result<Vec<Changepoint>> {
        let min_segment_length = self.min_segment_length.max(1);
        let needed = 2 * min_segment_length;
        if series.len() < needed {
            return Err(Error::InsufficientData { needed, got: series.len() });
        }

        let costs = CostTable::new(&series.values(), self.cost_model);
        let breakpoints = self.search.search(&costs, self.penalty, min_segment_length);
        debug_assert!(breakpoints.iter().tuple_windows().all(|(lhs, rhs)| lhs < rhs));
        debug_assert!(breakpoints.iter().all(|&index| 0 < index && index < series.len()));

        let level_window = self.level_window.max(1);
        let changepoints = std::iter::once(0)
            .chain(breakpoints)
            .chain(std::iter::once(series.len()))
            .tuple_windows()
            .filter_map(|(previous, index, next)| {
                let (level_before, level_after) = self.level_estimator.estimate(
                    series,
                    index.saturating_sub(level_window).max(previous)..index,
                    index..(index + level_window).min(next),
                );
                Some(Changepoint {
                    index,
                    timestamp: series.timestamp(index)?,
                    level_before,
                    level_after,
                })
            })
            .collect_vec();
        debug!(n_changepoints = changepoints.len(), "segmented");
        Ok(changepoints)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeDelta;

    use super::*;
    use crate::series::tests::{start, window};

    const SCENARIO: [f64; 13] = [1.0, 1.0, 1.0, 1.0, 7.0, 7.0, 7.0, 7.0, 7.0, 1.0, 1.0, 1.0, 1.0];

    fn detector(method: SearchMethod) -> ChangepointDetector<Strategy> {
        ChangepointDetector::builder()
            .search(Strategy::new(method, 10))
            .penalty(3.0)
            .min_segment_length(2)
            .build()
    }

    #[test]
    fn test_scenario() -> Result {
        for method in
            [SearchMethod::Pelt, SearchMethod::Binseg, SearchMethod::Window, SearchMethod::BottomUp]
        {
            let changepoints = detector(method).detect(&window("a", &SCENARIO))?;
            assert_eq!(changepoints.len(), 2, "{method:?}");

            assert_eq!(changepoints[0].index, 4);
            assert_eq!(changepoints[0].timestamp, start() + TimeDelta::hours(4));
            assert_abs_diff_eq!(changepoints[0].delta().0, 6.0);

            assert_eq!(changepoints[1].index, 9);
            assert_abs_diff_eq!(changepoints[1].delta().0, -6.0);
        }
        Ok(())
    }

    #[test]
    fn test_single_step() -> Result {
        let mut values = vec![0.4; 24];
        values.extend([7.8; 24]);
        let changepoints = detector(SearchMethod::Pelt).detect(&window("a", &values))?;
        assert_eq!(changepoints.len(), 1);
        assert_eq!(changepoints[0].index, 24);
        assert_abs_diff_eq!(changepoints[0].level_before.0, 0.4);
        assert_abs_diff_eq!(changepoints[0].level_after.0, 7.8);
        Ok(())
    }

    #[test]
    fn test_no_changepoint() -> Result {
        assert!(detector(SearchMethod::Pelt).detect(&window("a", &[2.0; 10]))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_insufficient_data() {
        assert_eq!(
            detector(SearchMethod::Pelt).detect(&window("a", &[1.0, 2.0, 3.0])),
            Err(Error::InsufficientData { needed: 4, got: 3 }),
        );
        assert_eq!(
            detector(SearchMethod::Pelt).detect(&window("a", &[])),
            Err(Error::InsufficientData { needed: 4, got: 0 }),
        );
    }

    #[test]
    fn test_robust_levels_ignore_spike() -> Result {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 7.0, 7.0, 12.0, 7.0, 7.0, 7.0];
        let detector = ChangepointDetector::builder()
            .search(Pelt)
            .penalty(20.0)
            .min_segment_length(3)
            .level_window(3)
            .build();
        let changepoints = detector.detect(&window("a", &values))?;
        assert_eq!(changepoints.len(), 1);
        assert_eq!(changepoints[0].index, 6);
        assert_abs_diff_eq!(changepoints[0].level_after.0, 7.0);
        Ok(())
    }

    #[test]
    fn test_mean_var_shift() -> Result {
        let mut values = vec![3.0; 12];
        values.extend([1.0, 5.0].repeat(6));
        let detector = ChangepointDetector::builder()
            .search(Pelt)
            .penalty(5.0)
            .min_segment_length(4)
            .cost_model(CostModel::MeanVarShift)
            .build();
        let changepoints = detector.detect(&window("a", &values))?;
        assert_eq!(changepoints.iter().map(|changepoint| changepoint.index).collect_vec(), [12]);
        Ok(())
    }

    #[test]
    fn test_median_shift_ignores_spike() -> Result {
        let mut values = vec![0.5; 12];
        values[3] = 9.0;
        values.extend([7.5; 12]);
        for method in [SearchMethod::Pelt, SearchMethod::BottomUp] {
            let detector = ChangepointDetector::builder()
                .search(Strategy::new(method, 10))
                .penalty(10.0)
                .min_segment_length(2)
                .cost_model(CostModel::MedianShift)
                .build();
            let changepoints = detector.detect(&window("a", &values))?;
            assert_eq!(
                changepoints.iter().map(|changepoint| changepoint.index).collect_vec(),
                [12],
                "{method:?}",
            );
        }
        Ok(())
    }
}
