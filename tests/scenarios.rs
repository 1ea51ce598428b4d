//! End-to-end scenarios through the public pipeline.

use approx::assert_abs_diff_eq;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use ev_sessions::{
    assembler::{DiagnosticKind, SessionStatus},
    batch::{BatchRunner, Household},
    parameters::Parameters,
    quantity::power::Kilowatts,
    series::{SeriesWindow, WindowSpec},
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap()
}

fn household(id: &str, values: &[f64], window: TimeDelta) -> Household {
    let series = SeriesWindow::try_from_values(
        id.into(),
        start(),
        TimeDelta::hours(1),
        values.iter().copied(),
    )
    .unwrap();
    Household::try_split(series, WindowSpec::new(window)).unwrap()
}

fn runner(parameters: Parameters) -> BatchRunner {
    BatchRunner::try_new(&parameters).unwrap()
}

#[test]
fn single_step_stays_open_until_window_end() {
    let mut values = vec![0.5; 12];
    values.extend([7.9; 12]);
    let table = runner(Parameters::default())
        .run(&[household("a", &values, TimeDelta::days(1))])
        .unwrap();

    assert!(table.failures.is_empty());
    assert_eq!(table.sessions.len(), 1);
    let session = &table.sessions[0];
    assert_eq!(session.start, start() + TimeDelta::hours(12));
    assert_eq!(session.end, None);
    assert_eq!(session.energy, None);
    assert_eq!(session.status, SessionStatus::OpenAtWindowEnd);
}

#[test]
fn two_step_scenario() {
    let values = [1.0, 1.0, 1.0, 1.0, 7.0, 7.0, 7.0, 7.0, 7.0, 1.0, 1.0, 1.0, 1.0];
    let parameters = Parameters::builder()
        .start_threshold(Kilowatts::from(3.0))
        .end_threshold(Kilowatts::from(3.0))
        .build();
    let table =
        runner(parameters).run(&[household("a", &values, TimeDelta::days(1))]).unwrap();

    assert_eq!(table.sessions.len(), 1);
    let session = &table.sessions[0];
    assert_eq!(session.start, start() + TimeDelta::hours(4));
    assert_eq!(session.end, Some(start() + TimeDelta::hours(9)));
    assert_eq!(session.duration, Some(TimeDelta::hours(5)));
    assert_eq!(session.status, SessionStatus::Closed);
    assert_abs_diff_eq!(session.power.0, 6.0, epsilon = 1e-9);
}

#[test]
fn overnight_session_is_stitched_across_windows() {
    let mut values = vec![0.4; 20];
    values.extend([11.4; 8]);
    values.extend([0.4; 20]);
    let table = runner(Parameters::default())
        .run(&[household("a", &values, TimeDelta::days(1))])
        .unwrap();

    let statuses: Vec<_> = table.sessions.iter().map(|session| session.status).collect();
    assert_eq!(statuses, [SessionStatus::OpenAtWindowEnd, SessionStatus::OpenAtWindowStart]);

    let stitched = table.stitched(TimeDelta::zero());
    assert_eq!(stitched.len(), 1);
    assert_eq!(stitched[0].start, start() + TimeDelta::hours(20));
    assert_eq!(stitched[0].end, Some(start() + TimeDelta::hours(28)));
    assert_eq!(stitched[0].duration, Some(TimeDelta::hours(8)));
    assert_eq!(stitched[0].status, SessionStatus::Closed);
    assert_abs_diff_eq!(stitched[0].energy.unwrap().0, 88.0, epsilon = 1e-9);
}

#[test]
fn stuck_start_is_force_closed() {
    let mut values = vec![0.4; 6];
    values.extend([7.4; 30]);
    let parameters = Parameters::builder().max_duration(TimeDelta::hours(10)).build();
    let table = runner(parameters)
        .run(&[household("a", &values, TimeDelta::days(2))])
        .unwrap();

    assert_eq!(table.sessions.len(), 1);
    let session = &table.sessions[0];
    assert_eq!(session.duration, Some(TimeDelta::hours(10)));
    assert_eq!(session.status, SessionStatus::Closed);
    assert_eq!(session.diagnostics, [DiagnosticKind::ForcedClose]);
    assert_eq!(table.diagnostics.len(), 1);
    assert_eq!(table.diagnostics[0].diagnostic.kind, DiagnosticKind::ForcedClose);
}

#[test]
fn superseded_carried_start_is_not_stitched() {
    let mut values = vec![1.0, 1.0, 1.0, 1.0, 7.0, 7.0, 7.0, 7.0];
    values.extend([7.0, 7.0, 14.0, 14.0, 14.0, 14.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0]);
    let table = runner(Parameters::default())
        .run(&[household("a", &values, TimeDelta::hours(8))])
        .unwrap();

    assert_eq!(table.sessions.len(), 2);
    assert_eq!(table.sessions[0].start, start() + TimeDelta::hours(4));
    assert_eq!(table.sessions[0].status, SessionStatus::OpenAtWindowEnd);
    assert_eq!(table.diagnostics.len(), 1);
    assert_eq!(table.diagnostics[0].diagnostic.kind, DiagnosticKind::DroppedUnmatchedStart);
    assert_eq!(table.diagnostics[0].diagnostic.timestamp, start() + TimeDelta::hours(4));

    let stitched = table.stitched(TimeDelta::zero());
    assert_eq!(stitched.len(), 1);
    assert_eq!(stitched[0].start, start() + TimeDelta::hours(10));
    assert_eq!(stitched[0].end, Some(start() + TimeDelta::hours(14)));
    assert_eq!(stitched[0].status, SessionStatus::Closed);
    assert_abs_diff_eq!(stitched[0].power.0, 7.0, epsilon = 1e-9);
}

#[test]
fn short_gap_across_window_boundary_is_merged_when_stitched() {
    let values = [1.0, 1.0, 7.0, 7.0, 7.0, 7.0, 1.0, 1.0].repeat(2);
    let parameters = Parameters::builder().min_gap(TimeDelta::hours(5)).build();
    let table = runner(parameters)
        .run(&[household("a", &values, TimeDelta::hours(8))])
        .unwrap();

    // Every window is assembled on its own:
    assert_eq!(table.sessions.len(), 2);
    assert!(table.diagnostics.is_empty());

    let stitched = table.stitched(parameters.min_gap);
    assert_eq!(stitched.len(), 1);
    assert_eq!(stitched[0].start, start() + TimeDelta::hours(2));
    assert_eq!(stitched[0].end, Some(start() + TimeDelta::hours(14)));
    assert_eq!(stitched[0].diagnostics, [DiagnosticKind::Merged { gap: TimeDelta::hours(4) }]);
    assert_abs_diff_eq!(stitched[0].energy.unwrap().0, 48.0, epsilon = 1e-9);
}

