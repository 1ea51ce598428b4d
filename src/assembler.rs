mod carry;
mod diagnostic;
mod session;

use bon::Builder;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, instrument, warn};

pub use self::{
    carry::{CarryState, PendingStart},
    diagnostic::{Diagnostic, DiagnosticKind},
    session::{Session, SessionStatus},
};
use crate::{
    classifier::{Event, Label},
    ops::Interval,
    series::HouseholdId,
};

/// Pairs start and end events of one household into charging sessions.
///
/// The scan is a two-state machine: idle, or open with one or more pending starts.
/// Whatever is still pending at the window end is handed over as [`CarryState`].
#[must_use]
#[derive(Copy, Clone, Debug, Builder)]
pub struct SessionAssembler {
    /// Sessions separated by a strictly shorter idle gap are merged.
    #[builder(default = TimeDelta::zero())]
    min_gap: TimeDelta,

    /// Sessions still open after this long are closed at exactly this duration.
    #[builder(default = TimeDelta::hours(24))]
    max_duration: TimeDelta,

    /// Keep overlapping starts pending instead of dropping the earlier one,
    /// for households charging more than one vehicle.
    #[builder(default)]
    multi_session: bool,
}

/// Output of one window.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct Assembly {
    /// Ordered by start.
    pub sessions: Vec<Session>,

    /// Ordered by timestamp.
    pub diagnostics: Vec<Diagnostic>,

    pub carry: CarryState,
}

impl SessionAssembler {
    /// Scan the time-ordered `events` of the `window`, continuing from the previous window's `carry`.
    #[instrument(skip_all, fields(household = %household, n_events = events.len()))]
    pub fn assemble(
        &self,
        household: &HouseholdId,
        window: Interval,
        events: &[Event],
        carry: CarryState,
    ) -> Assembly {
        let scan = Scan {
            assembler: self,
            household,
            pending: carry.into_pending(),
            sessions: Vec::new(),
            diagnostics: Vec::new(),
        };
        events.iter().fold(scan, Scan::step).finish(window.end)
    }
}

struct Scan<'a> {
    assembler: &'a SessionAssembler,
    household: &'a HouseholdId,

    /// Empty when idle.
    pending: Vec<PendingStart>,

    sessions: Vec<Session>,
    diagnostics: Vec<Diagnostic>,
}

impl Scan<'_> {
    fn step(mut self, event: &Event) -> Self {
        self.expire(event.timestamp());
        match event.label {
            Label::Start => self.on_start(event),
            Label::End => self.on_end(event),
            Label::Noise => {}
        }
        self
    }

    fn on_start(&mut self, event: &Event) {
        if !self.assembler.multi_session {
            for dropped in self.pending.drain(..) {
                debug!(start = ?dropped.timestamp, "superseded by another start");
                self.diagnostics
                    .push(Diagnostic::new(dropped.timestamp, DiagnosticKind::DroppedUnmatchedStart));
            }
        }
        self.pending.push(PendingStart {
            timestamp: event.timestamp(),
            onset: event.magnitude(),
            carried: false,
        });
    }

    fn on_end(&mut self, event: &Event) {
        let magnitude = event.magnitude();

        // Closest onset wins, the latest one on a tie.
        let matched = self
            .pending
            .iter()
            .enumerate()
            .rev()
            .min_by_key(|(_, start)| (start.onset - magnitude).abs())
            .map(|(index, _)| index);

        let Some(index) = matched else {
            debug!(end = ?event.timestamp(), "no pending start");
            self.diagnostics
                .push(Diagnostic::new(event.timestamp(), DiagnosticKind::DroppedUnmatchedEnd));
            return;
        };
        let start = self.pending.remove(index);
        let power = (start.onset + magnitude) / 2.0;
        self.push_closed(Session::closed(self.household.clone(), start, event.timestamp(), power));
    }

    fn push_closed(&mut self, session: Session) {
        if let Some(previous) = self.sessions.last_mut()
            && !previous.is_forced()
            && let Some(previous_end) = previous.end
            && previous_end <= session.start
            && session.start - previous_end < self.assembler.min_gap
        {
            let gap = session.start - previous_end;
            debug!(start = ?session.start, ?gap, "merging into the previous session");
            self.diagnostics.push(Diagnostic::new(session.start, DiagnosticKind::Merged { gap }));
            previous.absorb(session, gap);
        } else {
            self.sessions.push(session);
        }
    }

    /// Force-close the pending starts that would run longer than the maximum duration by `now`.
    fn expire(&mut self, now: DateTime<Utc>) {
        let max_duration = self.assembler.max_duration;
        let (expired, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|start| now - start.timestamp > max_duration);
        self.pending = pending;

        for start in expired {
            let end = start.timestamp + max_duration;
            warn!(household = %self.household, start = ?start.timestamp, "forcing the session to close");
            let mut session = Session::closed(self.household.clone(), start, end, start.onset);
            session.status = SessionStatus::Closed;
            session.diagnostics.push(DiagnosticKind::ForcedClose);
            self.diagnostics.push(Diagnostic::new(end, DiagnosticKind::ForcedClose));
            self.sessions.push(session);
        }
    }

    fn finish(mut self, window_end: DateTime<Utc>) -> Assembly {
        self.expire(window_end);
        self.sessions.extend(
            self.pending.iter().map(|start| Session::open(self.household.clone(), *start)),
        );
        self.sessions.sort_by_key(|session| session.start);
        self.diagnostics.sort_by_key(|diagnostic| diagnostic.timestamp);
        debug!(
            n_sessions = self.sessions.len(),
            n_diagnostics = self.diagnostics.len(),
            n_pending = self.pending.len(),
            "assembled",
        );
        Assembly {
            sessions: self.sessions,
            diagnostics: self.diagnostics,
            carry: CarryState::new(self.pending),
        }
    }
}
