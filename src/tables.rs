use chrono::TimeDelta;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    assembler::{Session, SessionStatus},
    batch::{Failure, HouseholdDiagnostic},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn format_duration(duration: TimeDelta) -> String {
    duration
        .to_std()
        .map_or_else(|_| duration.to_string(), |duration| humantime::format_duration(duration).to_string())
}

#[must_use]
pub fn build_sessions_table(sessions: &[Session]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Household",
        "Start",
        "End",
        "Duration",
        "Power",
        "Energy",
        "Status",
        "Diagnostics",
    ]);
    for session in sessions {
        table.add_row(vec![
            Cell::new(&session.household).add_attribute(Attribute::Bold),
            Cell::new(session.start.format(TIMESTAMP_FORMAT)),
            Cell::new(session.end.map_or_else(String::new, |end| end.format(TIMESTAMP_FORMAT).to_string()))
                .add_attribute(Attribute::Dim),
            Cell::new(session.duration.map_or_else(String::new, format_duration))
                .set_alignment(CellAlignment::Right),
            Cell::new(session.power).set_alignment(CellAlignment::Right),
            Cell::new(session.energy.map_or_else(String::new, |energy| energy.to_string()))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:?}", session.status)).fg(match session.status {
                SessionStatus::Closed => Color::Green,
                SessionStatus::OpenAtWindowEnd => Color::DarkYellow,
                SessionStatus::OpenAtWindowStart => Color::Cyan,
            }),
            Cell::new(
                session.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            )
            .fg(if session.diagnostics.is_empty() { Color::Reset } else { Color::Red }),
        ]);
    }
    table
}

#[must_use]
pub fn build_diagnostics_table(diagnostics: &[HouseholdDiagnostic]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Household", "Timestamp", "Diagnostic"]);
    for HouseholdDiagnostic { household, diagnostic } in diagnostics {
        table.add_row(vec![
            Cell::new(household).add_attribute(Attribute::Bold),
            Cell::new(diagnostic.timestamp.format(TIMESTAMP_FORMAT)),
            Cell::new(diagnostic.kind).fg(Color::DarkYellow),
        ]);
    }
    table
}

#[must_use]
pub fn build_failures_table(failures: &[Failure]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Household", "Start", "End", "Error"]);
    for failure in failures {
        table.add_row(vec![
            Cell::new(&failure.household).add_attribute(Attribute::Bold),
            Cell::new(failure.window.start.format(TIMESTAMP_FORMAT)),
            Cell::new(failure.window.end.format(TIMESTAMP_FORMAT)).add_attribute(Attribute::Dim),
            Cell::new(&failure.error).fg(Color::Red),
        ]);
    }
    table
}
