mod median;
mod samples;
mod split;

use std::fmt::{Debug, Display, Formatter};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub use self::{median::Median, samples::Samples, split::WindowSpec};
use crate::{
    error::{Error, Result},
    ops::Interval,
    quantity::power::Kilowatts,
};

pub type Point = (DateTime<Utc>, Kilowatts);

/// Opaque household (meter) identifier.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, derive_more::From)]
#[serde(transparent)]
pub struct HouseholdId(pub String);

impl From<&str> for HouseholdId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl Display for HouseholdId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for HouseholdId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Clean, uniformly sampled load series of one household over one analysis window.
///
/// Gaps must be resolved upstream: timestamps are strictly increasing and exactly
/// [`SeriesWindow::sampling`] apart.
#[must_use]
#[derive(Clone, Debug)]
pub struct SeriesWindow {
    household: HouseholdId,
    interval: Interval,
    sampling: TimeDelta,
    points: Vec<Point>,
}

impl SeriesWindow {
    pub fn try_new(
        household: HouseholdId,
        interval: Interval,
        sampling: TimeDelta,
        points: Vec<Point>,
    ) -> Result<Self> {
        if sampling <= TimeDelta::zero() {
            return Err(Error::invalid_series(0, format!("non-positive sampling interval {sampling}")));
        }
        if interval.end < interval.start {
            return Err(Error::invalid_series(0, format!("inverted window {interval}")));
        }
        for (index, (timestamp, power)) in points.iter().enumerate() {
            if !power.is_finite() {
                return Err(Error::invalid_series(index, format!("non-finite power {power:?}")));
            }
            if !interval.contains(*timestamp) {
                return Err(Error::invalid_series(
                    index,
                    format!("{timestamp} is outside of the window {interval}"),
                ));
            }
            if index != 0 {
                let spacing = *timestamp - points[index - 1].0;
                if spacing != sampling {
                    return Err(Error::invalid_series(
                        index,
                        format!("spacing {spacing} differs from the sampling interval {sampling}"),
                    ));
                }
            }
        }
        Ok(Self { household, interval, sampling, points })
    }

    /// Build a window from consecutive values starting at `start`.
    ///
    /// The window ends one sampling interval after the last value.
    pub fn try_from_values(
        household: HouseholdId,
        start: DateTime<Utc>,
        sampling: TimeDelta,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<Self> {
        let points: Vec<Point> = (0..)
            .zip(values)
            .map(|(index, value)| (start + sampling * index, Kilowatts::from(value)))
            .collect();
        let length = i32::try_from(points.len())
            .map_err(|_| Error::invalid_series(points.len(), "series is too long"))?;
        let interval = Interval::new(start, start + sampling * length);
        Self::try_new(household, interval, sampling, points)
    }

    /// Build a window spanning exactly the given samples.
    pub fn try_from_samples(
        household: HouseholdId,
        sampling: TimeDelta,
        samples: Samples,
    ) -> Result<Self> {
        let interval = samples.interval(sampling);
        Self::try_new(household, interval, sampling, samples.0)
    }

    pub const fn household(&self) -> &HouseholdId {
        &self.household
    }

    pub const fn interval(&self) -> Interval {
        self.interval
    }

    #[must_use]
    pub const fn sampling(&self) -> TimeDelta {
        self.sampling
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Raw power values in kilowatts.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, power)| power.0).collect()
    }

    #[must_use]
    pub fn timestamp(&self, index: usize) -> Option<DateTime<Utc>> {
        self.points.get(index).map(|(timestamp, _)| *timestamp)
    }

    /// Powers of the samples in the half-open index range.
    pub fn powers(&self, from: usize, to: usize) -> impl Iterator<Item = Kilowatts> + '_ {
        self.points[from..to].iter().map(|(_, power)| *power)
    }
}
