mod table;

use std::time::Instant;

use chrono::TimeDelta;
use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::{debug, info, instrument, warn};

pub use self::table::{Failure, HouseholdDiagnostic, ResultTable};
use crate::{
    assembler::{Assembly, CarryState, SessionAssembler},
    classifier::EventClassifier,
    detector::{ChangepointDetector, Strategy},
    error::{Error, Result},
    parameters::Parameters,
    series::{HouseholdId, Samples, SeriesWindow, WindowSpec},
};

/// Chronologically ordered analysis windows of one household.
#[must_use]
#[derive(Clone, Debug)]
pub struct Household {
    pub id: HouseholdId,
    pub windows: Vec<SeriesWindow>,
}

impl Household {
    /// Chunk the household's continuous series into windows.
    pub fn try_split(series: SeriesWindow, window_spec: WindowSpec) -> Result<Self> {
        Ok(Self { id: series.household().clone(), windows: window_spec.split(series)? })
    }

    /// Build the household windows from its raw samples.
    ///
    /// # Errors
    ///
    /// A series breaking the sampling contract is rejected as a [`Failure`] spanning all of its
    /// samples, so that one bad household never holds the others back.
    pub fn try_from_samples(
        id: HouseholdId,
        sampling: TimeDelta,
        samples: Samples,
        window_spec: WindowSpec,
    ) -> Result<Self, Failure> {
        let window = samples.interval(sampling);
        SeriesWindow::try_from_samples(id.clone(), sampling, samples)
            .and_then(|series| Self::try_split(series, window_spec))
            .map_err(|error| {
                warn!(household = %id, %error, "rejected the household series");
                Failure { household: id, window, error }
            })
    }
}

/// Runs the detection pipeline over many households in parallel.
///
/// Households are independent units of work. Windows of one household are processed
/// sequentially in order, threading the carry state from one window to the next.
#[must_use]
pub struct BatchRunner {
    workers: Option<usize>,
    detector: ChangepointDetector<Strategy>,
    classifier: EventClassifier,
    assembler: SessionAssembler,
}

impl BatchRunner {
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] when the parameters are misconfigured.
    pub fn try_new(parameters: &Parameters) -> Result<Self> {
        parameters.validate()?;
        Ok(Self {
            workers: parameters.workers,
            detector: parameters.detector(),
            classifier: parameters.classifier(),
            assembler: parameters.assembler(),
        })
    }

    /// Process all households and merge their results.
    ///
    /// Per-window errors are recorded as [`Failure`]s and never abort the batch.
    /// The returned table is sorted by household and time regardless of the scheduling.
    #[instrument(skip_all, fields(n_households = households.len()))]
    pub fn run(&self, households: &[Household]) -> Result<ResultTable> {
        let start_time = Instant::now();
        let table = match self.workers {
            Some(n_workers) => ThreadPoolBuilder::new()
                .num_threads(n_workers)
                .build()
                .map_err(|error| Error::invalid_parameter("workers", error.to_string()))?
                .install(|| self.run_all(households)),
            None => self.run_all(households),
        };
        let table = table.sorted();
        info!(
            elapsed = ?start_time.elapsed(),
            n_sessions = table.sessions.len(),
            n_failures = table.failures.len(),
            "batch completed",
        );
        Ok(table)
    }

    fn run_all(&self, households: &[Household]) -> ResultTable {
        households
            .par_iter()
            .map(|household| self.run_household(household))
            .reduce(ResultTable::default, ResultTable::merge)
    }

    #[instrument(skip_all, fields(household = %household.id, n_windows = household.windows.len()))]
    fn run_household(&self, household: &Household) -> ResultTable {
        let mut table = ResultTable::default();
        let mut carry = CarryState::idle();
        for window in &household.windows {
            match self.run_window(window, carry.clone()) {
                Ok(assembly) => {
                    table.sessions.extend(assembly.sessions);
                    table.diagnostics.extend(assembly.diagnostics.into_iter().map(|diagnostic| {
                        HouseholdDiagnostic { household: household.id.clone(), diagnostic }
                    }));
                    carry = assembly.carry;
                }
                Err(error) => {
                    // The carry state passes through the failed window unchanged.
                    warn!(window = %window.interval(), %error, "failed to process the window");
                    table.failures.push(Failure {
                        household: household.id.clone(),
                        window: window.interval(),
                        error,
                    });
                }
            }
        }
        debug!(n_sessions = table.sessions.len(), n_failures = table.failures.len(), "done");
        table
    }

    fn run_window(&self, window: &SeriesWindow, carry: CarryState) -> Result<Assembly> {
        let changepoints = self.detector.detect(window)?;
        let events = self.classifier.classify(&changepoints);
        Ok(self.assembler.assemble(window.household(), window.interval(), &events, carry))
    }
}
