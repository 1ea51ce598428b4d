use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_with::{DurationSeconds, serde_as};

use crate::{
    assembler::{carry::PendingStart, diagnostic::DiagnosticKind},
    quantity::{energy::KilowattHours, power::Kilowatts},
    series::HouseholdId,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Closed,

    /// Still charging when the window ended, the end is unknown.
    OpenAtWindowEnd,

    /// Started in an earlier window and continued from its carry state.
    OpenAtWindowStart,
}

/// One charging session.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    pub household: HouseholdId,
    pub start: DateTime<Utc>,

    /// [`None`] while the session is open at the window end.
    pub end: Option<DateTime<Utc>>,

    /// Estimated charging power, net of the base load.
    pub power: Kilowatts,

    #[serde_as(as = "Option<DurationSeconds<i64>>")]
    #[serde(rename = "duration_secs")]
    pub duration: Option<TimeDelta>,

    pub energy: Option<KilowattHours>,
    pub status: SessionStatus,
    pub diagnostics: Vec<DiagnosticKind>,
}

impl Session {
    /// Session still charging at the window end.
    pub(super) fn open(household: HouseholdId, start: PendingStart) -> Self {
        Self {
            household,
            start: start.timestamp,
            end: None,
            power: start.onset,
            duration: None,
            energy: None,
            status: SessionStatus::OpenAtWindowEnd,
            diagnostics: Vec::new(),
        }
    }

    pub(super) fn closed(
        household: HouseholdId,
        start: PendingStart,
        end: DateTime<Utc>,
        power: Kilowatts,
    ) -> Self {
        let duration = end - start.timestamp;
        Self {
            household,
            start: start.timestamp,
            end: Some(end),
            power,
            duration: Some(duration),
            energy: Some(power * duration),
            status: if start.carried {
                SessionStatus::OpenAtWindowStart
            } else {
                SessionStatus::Closed
            },
            diagnostics: Vec::new(),
        }
    }

    /// Extend the session over a short gap up to the end of the `next` one.
    ///
    /// The power becomes the mean of both weighted by their durations.
    pub(crate) fn absorb(&mut self, next: Self, gap: TimeDelta) {
        let (Some(end), Some(duration), Some(next_duration)) = (next.end, self.duration, next.duration)
        else {
            return;
        };
        let energy = self.energy.unwrap_or_default() + next.energy.unwrap_or_default();
        self.power = (energy / (duration + next_duration)).unwrap_or(self.power);
        self.energy = Some(energy);
        self.end = Some(end);
        self.duration = Some(end - self.start);
        self.diagnostics.push(DiagnosticKind::Merged { gap });
        self.diagnostics.extend(next.diagnostics);
    }

    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.diagnostics.contains(&DiagnosticKind::ForcedClose)
    }
}
