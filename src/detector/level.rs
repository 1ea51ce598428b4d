use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{
    quantity::power::Kilowatts,
    series::{Median, SeriesWindow},
};

/// How the levels on either side of a breakpoint are estimated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LevelEstimator {
    /// Median of the adjacent samples.
    #[default]
    Median,

    /// Extremes of the adjacent samples in the direction of the step: the lowest load before
    /// and the highest after a rise, the other way around for a drop.
    Envelope,
}

impl LevelEstimator {
    /// Estimate `(level_before, level_after)` from the `before` and `after` sample ranges.
    #[must_use]
    pub fn estimate(
        self,
        series: &SeriesWindow,
        before: Range<usize>,
        after: Range<usize>,
    ) -> (Kilowatts, Kilowatts) {
        let median_before = series.powers(before.start, before.end).median().unwrap_or_default();
        let median_after = series.powers(after.start, after.end).median().unwrap_or_default();
        match self {
            Self::Median => (median_before, median_after),
            Self::Envelope if median_after >= median_before => (
                series.powers(before.start, before.end).min().unwrap_or_default(),
                series.powers(after.start, after.end).max().unwrap_or_default(),
            ),
            Self::Envelope => (
                series.powers(before.start, before.end).max().unwrap_or_default(),
                series.powers(after.start, after.end).min().unwrap_or_default(),
            ),
        }
    }
}
