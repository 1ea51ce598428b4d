use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use chrono::TimeDelta;
use clap::Parser;
use ev_sessions::{
    assembler::Session,
    batch::{BatchRunner, Failure, Household, HouseholdDiagnostic, ResultTable},
    detector::{CostModel, LevelEstimator, SearchMethod},
    parameters::Parameters,
    quantity::power::Kilowatts,
    series::{HouseholdId, Samples, WindowSpec},
    tables::{build_diagnostics_table, build_failures_table, build_sessions_table},
};
use itertools::Itertools;
use serde::Serialize;

use crate::prelude::*;

#[derive(Parser)]
pub struct DetectArgs {
    /// JSON object mapping household identifiers to ordered maps of RFC 3339 timestamps to kilowatts.
    #[clap(long, short, env = "INPUT_PATH")]
    input: PathBuf,

    /// TOML file with detection parameters. Missing keys take the defaults.
    #[clap(long, env = "PARAMETERS")]
    parameters: Option<PathBuf>,

    #[clap(flatten)]
    overrides: ParameterArgs,

    /// Sampling interval of the input series.
    #[clap(long, env = "SAMPLING", default_value = "15m")]
    sampling: humantime::Duration,

    /// Length of the analysis windows each household series is split into.
    #[clap(long = "window", env = "WINDOW_LENGTH", default_value = "7d")]
    window: humantime::Duration,

    /// Write the result table as JSON.
    #[clap(long, short, env = "OUTPUT_PATH")]
    output: Option<PathBuf>,

    /// Report sessions crossing window boundaries once.
    #[clap(long)]
    stitch: bool,
}

/// Command-line overrides of the parameter file.
#[derive(Parser)]
struct ParameterArgs {
    #[clap(long, env = "PENALTY")]
    penalty: Option<f64>,

    #[clap(long, env = "MIN_SEGMENT_LENGTH")]
    min_segment_length: Option<usize>,

    #[clap(long, env = "COST_MODEL")]
    cost_model: Option<CostModel>,

    #[clap(long, env = "SEARCH_METHOD")]
    search: Option<SearchMethod>,

    #[clap(long, env = "WINDOW_WIDTH")]
    window_width: Option<usize>,

    #[clap(long, env = "LEVEL_WINDOW")]
    level_window: Option<usize>,

    #[clap(long, env = "LEVEL_ESTIMATOR")]
    level_estimator: Option<LevelEstimator>,

    #[clap(long = "start-threshold-kilowatts", env = "START_THRESHOLD_KILOWATTS")]
    start_threshold: Option<Kilowatts>,

    #[clap(long = "end-threshold-kilowatts", env = "END_THRESHOLD_KILOWATTS")]
    end_threshold: Option<Kilowatts>,

    /// Merge sessions separated by a shorter idle gap.
    #[clap(long, env = "MIN_GAP")]
    min_gap: Option<humantime::Duration>,

    /// Force-close sessions running longer than this.
    #[clap(long, env = "MAX_DURATION")]
    max_duration: Option<humantime::Duration>,

    /// Allow concurrent sessions, for households charging several vehicles.
    #[clap(long, env = "MULTI_SESSION_PER_HOUSEHOLD")]
    multi_session_per_household: bool,

    /// Worker pool size, defaults to the number of available cores.
    #[clap(long, env = "WORKERS")]
    workers: Option<usize>,
}

impl ParameterArgs {
    fn apply(&self, mut parameters: Parameters) -> Result<Parameters> {
        if let Some(penalty) = self.penalty {
            parameters.penalty = penalty;
        }
        if let Some(min_segment_length) = self.min_segment_length {
            parameters.min_segment_length = min_segment_length;
        }
        if let Some(cost_model) = self.cost_model {
            parameters.cost_model = cost_model;
        }
        if let Some(search) = self.search {
            parameters.search = search;
        }
        if let Some(window_width) = self.window_width {
            parameters.window_width = window_width;
        }
        if let Some(level_window) = self.level_window {
            parameters.level_window = level_window;
        }
        if let Some(level_estimator) = self.level_estimator {
            parameters.level_estimator = level_estimator;
        }
        if let Some(start_threshold) = self.start_threshold {
            parameters.start_threshold = start_threshold;
        }
        if let Some(end_threshold) = self.end_threshold {
            parameters.end_threshold = end_threshold;
        }
        if let Some(min_gap) = self.min_gap {
            parameters.min_gap = TimeDelta::from_std(min_gap.into()).context("`--min-gap` is too long")?;
        }
        if let Some(max_duration) = self.max_duration {
            parameters.max_duration =
                TimeDelta::from_std(max_duration.into()).context("`--max-duration` is too long")?;
        }
        if self.multi_session_per_household {
            parameters.multi_session_per_household = true;
        }
        if self.workers.is_some() {
            parameters.workers = self.workers;
        }
        Ok(parameters)
    }
}

impl DetectArgs {
    fn parameters(&self) -> Result<Parameters> {
        let parameters = match &self.parameters {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("failed to parse `{}`", path.display()))?
            }
            None => Parameters::default(),
        };
        self.overrides.apply(parameters)
    }
}

/// Serialized result table.
#[derive(Serialize)]
struct Report<'a> {
    sessions: &'a [Session],
    diagnostics: &'a [HouseholdDiagnostic],
    failures: &'a [Failure],
}

#[instrument(skip_all)]
pub fn detect(args: &DetectArgs) -> Result {
    let parameters = args.parameters()?;
    debug!(?parameters, "loaded the parameters");
    let runner = BatchRunner::try_new(&parameters)?;

    let sampling = TimeDelta::from_std(args.sampling.into()).context("`--sampling` is too long")?;
    let window_spec =
        WindowSpec::new(TimeDelta::from_std(args.window.into()).context("`--window` is too long")?);
    let (households, rejected) = load_households(&args.input, sampling, window_spec)?;
    info!(
        n_households = households.len(),
        n_rejected = rejected.len(),
        n_windows = households.iter().map(|household| household.windows.len()).sum::<usize>(),
        "loaded the input",
    );

    let table = runner
        .run(&households)?
        .merge(ResultTable { failures: rejected, ..ResultTable::default() })
        .sorted();
    let sessions =
        if args.stitch { table.stitched(parameters.min_gap) } else { table.sessions.clone() };
    println!("{}", build_sessions_table(&sessions));
    if !table.diagnostics.is_empty() {
        println!("{}", build_diagnostics_table(&table.diagnostics));
    }
    if !table.failures.is_empty() {
        warn!(n_failures = table.failures.len(), "some windows could not be processed");
        println!("{}", build_failures_table(&table.failures));
    }

    if let Some(path) = &args.output {
        let report =
            Report { sessions: &sessions, diagnostics: &table.diagnostics, failures: &table.failures };
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("failed to create `{}`", path.display()))?,
        );
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()?;
        info!(path = %path.display(), "saved the report");
    }
    Ok(())
}

fn load_households(
    path: &Path,
    sampling: TimeDelta,
    window_spec: WindowSpec,
) -> Result<(Vec<Household>, Vec<Failure>)> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    read_households(BufReader::new(file), sampling, window_spec)
        .with_context(|| format!("failed to load `{}`", path.display()))
}

/// Read the households, setting aside those whose series cannot be windowed.
fn read_households(
    reader: impl Read,
    sampling: TimeDelta,
    window_spec: WindowSpec,
) -> Result<(Vec<Household>, Vec<Failure>)> {
    window_spec.validate(sampling)?;
    let input: BTreeMap<HouseholdId, Samples> = serde_json::from_reader(reader)?;
    Ok(input
        .into_iter()
        .map(|(id, samples)| Household::try_from_samples(id, sampling, samples, window_spec))
        .partition_result())
}
