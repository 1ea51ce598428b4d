use std::collections::HashSet;

use chrono::TimeDelta;
use itertools::Itertools;
use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    assembler::{Diagnostic, DiagnosticKind, Session, SessionStatus},
    error::Error,
    ops::Interval,
    series::HouseholdId,
};

/// Household window that could not be processed.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub household: HouseholdId,
    pub window: Interval,

    #[serde_as(as = "DisplayFromStr")]
    pub error: Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HouseholdDiagnostic {
    pub household: HouseholdId,

    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

/// Sessions, window diagnostics, and failures of a batch run.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    pub sessions: Vec<Session>,
    pub diagnostics: Vec<HouseholdDiagnostic>,
    pub failures: Vec<Failure>,
}

impl ResultTable {
    /// Concatenate two partial tables.
    pub fn merge(mut self, other: Self) -> Self {
        self.sessions.extend(other.sessions);
        self.diagnostics.extend(other.diagnostics);
        self.failures.extend(other.failures);
        self
    }

    /// Order everything by household and then by time.
    ///
    /// The sort is stable, so records of one household keep their window order.
    pub fn sorted(mut self) -> Self {
        self.sessions.sort_by(|lhs, rhs| {
            (&lhs.household, lhs.start).cmp(&(&rhs.household, rhs.start))
        });
        self.diagnostics.sort_by(|lhs, rhs| {
            (&lhs.household, lhs.diagnostic.timestamp)
                .cmp(&(&rhs.household, rhs.diagnostic.timestamp))
        });
        self.failures.sort_by(|lhs, rhs| {
            (&lhs.household, lhs.window.start).cmp(&(&rhs.household, rhs.window.start))
        });
        self
    }

    /// Collapse the per-window records of sessions crossing window boundaries.
    ///
    /// Records of one household sharing the same start are one logical session: the latest
    /// record carries the final end, duration, and energy. The logical session is closed when
    /// that record has an end, and still open at the last window end otherwise. A start that a
    /// later window dropped as unmatched leaves no logical session behind.
    ///
    /// Windows are assembled independently, so a session closing near a window end and the next
    /// one starting after the boundary are merged here when the idle gap is shorter than
    /// `min_gap`, with the same rules as inside a window.
    #[must_use]
    pub fn stitched(&self, min_gap: TimeDelta) -> Vec<Session> {
        let dropped: HashSet<_> = self
            .diagnostics
            .iter()
            .filter(|record| record.diagnostic.kind == DiagnosticKind::DroppedUnmatchedStart)
            .map(|record| (&record.household, record.diagnostic.timestamp))
            .collect();

        self.sessions
            .iter()
            .sorted_by(|lhs, rhs| (&lhs.household, lhs.start).cmp(&(&rhs.household, rhs.start)))
            .chunk_by(|session| (session.household.clone(), session.start))
            .into_iter()
            .filter_map(|(_, records)| {
                let records = records.collect_vec();
                let mut session = (*records.last()?).clone();
                if session.end.is_none() && dropped.contains(&(&session.household, session.start)) {
                    return None;
                }
                if records.len() > 1 && session.end.is_some() {
                    session.status = SessionStatus::Closed;
                }
                session.diagnostics = records
                    .iter()
                    .flat_map(|record| record.diagnostics.iter().copied())
                    .collect();
                Some(session)
            })
            .fold(Vec::new(), |mut sessions: Vec<Session>, session| {
                if let Some(previous) = sessions.last_mut()
                    && previous.household == session.household
                    && !previous.is_forced()
                    && session.end.is_some()
                    && let Some(previous_end) = previous.end
                    && previous_end <= session.start
                    && session.start - previous_end < min_gap
                {
                    let gap = session.start - previous_end;
                    previous.absorb(session, gap);
                    previous.status = SessionStatus::Closed;
                } else {
                    sessions.push(session);
                }
                sessions
            })
    }
}
