use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{detector::Changepoint, quantity::power::Kilowatts};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    /// Candidate charging onset.
    Start,

    /// Candidate charging cessation.
    End,

    /// Below-threshold regime change, for example another appliance cycling.
    Noise,
}

/// Classified changepoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Event {
    pub label: Label,
    pub changepoint: Changepoint,
}

impl Event {
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.changepoint.timestamp
    }

    #[must_use]
    pub fn magnitude(&self) -> Kilowatts {
        self.changepoint.delta().abs()
    }
}

/// Labels changepoints by the direction and size of their level shift.
///
/// Thresholds are separate because ramp-up and ramp-down need not be symmetric,
/// for example when charging tapers off at a high state of charge.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct EventClassifier {
    pub start_threshold: Kilowatts,
    pub end_threshold: Kilowatts,
}

impl EventClassifier {
    pub const fn new(start_threshold: Kilowatts, end_threshold: Kilowatts) -> Self {
        Self { start_threshold, end_threshold }
    }

    #[must_use]
    pub fn label(&self, changepoint: &Changepoint) -> Label {
        let delta = changepoint.delta();
        if delta >= self.start_threshold {
            Label::Start
        } else if delta <= -self.end_threshold {
            Label::End
        } else {
            Label::Noise
        }
    }

    /// Label every changepoint, preserving the order and dropping the noise.
    ///
    /// Consecutive events with the same label are all kept; pairing decides about them.
    #[must_use]
    pub fn classify(&self, changepoints: &[Changepoint]) -> Vec<Event> {
        let events: Vec<_> = changepoints
            .iter()
            .map(|changepoint| Event { label: self.label(changepoint), changepoint: *changepoint })
            .filter(|event| event.label != Label::Noise)
            .collect();
        debug!(n_events = events.len(), n_noise = changepoints.len() - events.len(), "classified");
        events
    }
}
