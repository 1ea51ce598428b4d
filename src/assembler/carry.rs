use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::quantity::power::Kilowatts;

/// Start event still waiting for its end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingStart {
    pub timestamp: DateTime<Utc>,

    /// Size of the onset step, the charging power estimate until the end is known.
    pub onset: Kilowatts,

    /// Whether the start was handed over from a previous window.
    pub carried: bool,
}

/// Pending starts handed from one window's assembly to the next window of the same household.
///
/// Empty when the household was idle at the end of the window.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CarryState(Vec<PendingStart>);

impl CarryState {
    pub const fn idle() -> Self {
        Self(Vec::new())
    }

    pub(super) fn new(pending: impl IntoIterator<Item = PendingStart>) -> Self {
        Self(pending.into_iter().map(|start| PendingStart { carried: true, ..start }).collect())
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn pending(&self) -> &[PendingStart] {
        &self.0
    }

    pub(super) fn into_pending(self) -> Vec<PendingStart> {
        self.0
    }
}
