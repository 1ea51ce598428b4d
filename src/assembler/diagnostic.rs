use std::fmt::{Display, Formatter};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_with::{DurationSeconds, serde_as};

/// Non-fatal anomaly met while pairing events.
#[serde_as]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// A pending start was superseded by another start before any end.
    DroppedUnmatchedStart,

    /// An end arrived with no pending start.
    DroppedUnmatchedEnd,

    /// A session ran past the maximum duration and was closed there.
    ForcedClose,

    /// A session was folded into the preceding one across a short gap.
    Merged {
        #[serde_as(as = "DurationSeconds<i64>")]
        #[serde(rename = "gap_secs")]
        gap: TimeDelta,
    },
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DroppedUnmatchedStart => f.write_str("dropped unmatched start"),
            Self::DroppedUnmatchedEnd => f.write_str("dropped unmatched end"),
            Self::ForcedClose => f.write_str("forced close"),
            Self::Merged { gap } => write!(f, "merged across {} min", gap.num_minutes()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// When the anomaly happened: the dropped event, the forced end, or the merged start.
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub const fn new(timestamp: DateTime<Utc>, kind: DiagnosticKind) -> Self {
        Self { timestamp, kind }
    }
}
