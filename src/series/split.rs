use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use crate::{
    error::{Error, Result},
    ops::Interval,
    series::SeriesWindow,
};

/// Chunks a continuous household series into consecutive, non-overlapping analysis windows.
#[serde_as]
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    #[serde_as(as = "DurationSeconds<i64>")]
    #[serde(rename = "window_secs")]
    pub length: TimeDelta,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self { length: TimeDelta::weeks(1) }
    }
}

impl WindowSpec {
    pub const fn new(length: TimeDelta) -> Self {
        Self { length }
    }

    /// Check that every window can hold at least one sample.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] when the windows are shorter than the sampling interval.
    pub fn validate(self, sampling: TimeDelta) -> Result {
        if self.length < sampling {
            return Err(Error::invalid_parameter(
                "window",
                format!("{} is shorter than the sampling interval {sampling}", self.length),
            ));
        }
        Ok(())
    }

    /// Split the series into windows aligned on the series start.
    ///
    /// An empty series yields itself as the only window, so that it is still accounted for.
    pub fn split(self, series: SeriesWindow) -> Result<Vec<SeriesWindow>> {
        self.validate(series.sampling())?;
        if series.is_empty() {
            return Ok(vec![series]);
        }

        let household = series.household().clone();
        let sampling = series.sampling();
        let end = series.interval().end;
        let mut windows = Vec::new();
        let mut interval = Interval::new(series.interval().start, series.interval().start);
        let mut points = series.points.into_iter().peekable();
        while interval.start < end {
            interval = interval.with_end((interval.start + self.length).min(end));
            let mut chunk = Vec::new();
            while let Some(point) = points.next_if(|(timestamp, _)| interval.contains(*timestamp)) {
                chunk.push(point);
            }
            windows.push(SeriesWindow::try_new(household.clone(), interval, sampling, chunk)?);
            interval = Interval::new(interval.end, interval.end);
        }
        Ok(windows)
    }
}
