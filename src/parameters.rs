use bon::Builder;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use crate::{
    assembler::SessionAssembler,
    classifier::EventClassifier,
    detector::{ChangepointDetector, CostModel, LevelEstimator, SearchMethod, Strategy},
    error::{Error, Result},
    quantity::power::Kilowatts,
};

/// Per-run detection parameters.
#[serde_as]
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Segmentation sensitivity: the higher, the fewer changepoints.
    #[builder(default = 3.0)]
    pub penalty: f64,

    #[builder(default = 2)]
    pub min_segment_length: usize,

    #[builder(default)]
    pub cost_model: CostModel,

    #[builder(default)]
    pub search: SearchMethod,

    /// Width of each of the two adjacent windows of [`SearchMethod::Window`].
    #[builder(default = 10)]
    pub window_width: usize,

    /// Number of samples on each side of a breakpoint used to estimate its levels.
    #[builder(default = 2)]
    pub level_window: usize,

    #[builder(default)]
    pub level_estimator: LevelEstimator,

    #[builder(default = Kilowatts::from(1.0))]
    pub start_threshold: Kilowatts,

    #[builder(default = Kilowatts::from(1.0))]
    pub end_threshold: Kilowatts,

    /// Sessions separated by a shorter idle gap are merged. Inside a window this happens while
    /// assembling, across window boundaries only in [`crate::batch::ResultTable::stitched`].
    #[serde_as(as = "DurationSeconds<i64>")]
    #[serde(rename = "min_gap_secs")]
    #[builder(default = TimeDelta::zero())]
    pub min_gap: TimeDelta,

    #[serde_as(as = "DurationSeconds<i64>")]
    #[serde(rename = "max_duration_secs")]
    #[builder(default = TimeDelta::hours(24))]
    pub max_duration: TimeDelta,

    #[builder(default)]
    pub multi_session_per_household: bool,

    /// Worker pool size, all available cores when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Parameters {
    /// Reject systemic misconfiguration before any household gets processed.
    pub fn validate(&self) -> Result {
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(Error::invalid_parameter(
                "penalty",
                format!("must be finite and non-negative, got {}", self.penalty),
            ));
        }
        if self.min_segment_length == 0 {
            return Err(Error::invalid_parameter("min_segment_length", "must be positive"));
        }
        if self.level_window == 0 {
            return Err(Error::invalid_parameter("level_window", "must be positive"));
        }
        if self.search == SearchMethod::Window && self.window_width < self.min_segment_length {
            return Err(Error::invalid_parameter(
                "window_width",
                format!("must be at least `min_segment_length` ({})", self.min_segment_length),
            ));
        }
        for (name, threshold) in
            [("start_threshold", self.start_threshold), ("end_threshold", self.end_threshold)]
        {
            if !threshold.is_finite() || threshold <= Kilowatts::ZERO {
                return Err(Error::invalid_parameter(
                    name,
                    format!("must be finite and positive, got {threshold}"),
                ));
            }
        }
        if self.min_gap < TimeDelta::zero() {
            return Err(Error::invalid_parameter("min_gap", "must not be negative"));
        }
        if self.max_duration <= TimeDelta::zero() {
            return Err(Error::invalid_parameter("max_duration", "must be positive"));
        }
        if self.workers == Some(0) {
            return Err(Error::invalid_parameter("workers", "must be positive"));
        }
        Ok(())
    }

    pub fn detector(&self) -> ChangepointDetector<Strategy> {
        ChangepointDetector::builder()
            .search(Strategy::new(self.search, self.window_width))
            .penalty(self.penalty)
            .min_segment_length(self.min_segment_length)
            .cost_model(self.cost_model)
            .level_window(self.level_window)
            .level_estimator(self.level_estimator)
            .build()
    }

    pub const fn classifier(&self) -> EventClassifier {
        EventClassifier::new(self.start_threshold, self.end_threshold)
    }

    pub fn assembler(&self) -> SessionAssembler {
        SessionAssembler::builder()
            .min_gap(self.min_gap)
            .max_duration(self.max_duration)
            .multi_session(self.multi_session_per_household)
            .build()
    }
}
