use crate::error::{WealthError, WealthResult};
use crate::model::Population;
use crate::stats::{Accumulator, Histogram, percentile};
use serde::{Deserialize, Serialize};

/// Ensemble average of one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleRow {
    pub timestep: usize,
    pub ensemble_average: f64,
}

/// Terminal wealth of one individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalRow {
    pub individual_id: usize,
    pub terminal_wealth: f64,
}

/// Wealth of one individual at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub timestep: usize,
    pub individual_id: usize,
    pub wealth: f64,
}

/// Summary statistics of one experiment.
#[derive(Debug, Clone)]
pub struct EnsembleSummary {
    /// Cross-sectional mean wealth at every timestep, including step 0.
    pub ensemble_average: Vec<f64>,
    /// Final wealth of every individual, in input order.
    pub terminal_distribution: Vec<TerminalRow>,

    pub terminal_min: f64,
    pub terminal_p75: f64,
    pub terminal_max: f64,

    pub terminal_mean: f64,
    pub terminal_std_dev: f64,

    /// Observed share of fast-growth events, when the events are known.
    pub fast_event_share: Option<f64>,
}

impl EnsembleSummary {
    /// Ensemble average as `(timestep, ensemble_average)` rows.
    pub fn ensemble_rows(&self) -> impl Iterator<Item = EnsembleRow> + '_ {
        self.ensemble_average
            .iter()
            .enumerate()
            .map(|(timestep, &ensemble_average)| EnsembleRow {
                timestep,
                ensemble_average,
            })
    }

    /// Bin the terminal distribution over `[terminal_min, terminal_max]`.
    ///
    /// Overflowed (infinite) terminal values do not widen the range; they
    /// are clamped into the edge bins.
    ///
    /// # Errors
    /// Returns an error if no terminal value is finite or `n_bins` is zero.
    pub fn histogram(&self, n_bins: usize) -> WealthResult<Histogram> {
        let (lower, upper) = self
            .terminal_distribution
            .iter()
            .map(|row| row.terminal_wealth)
            .filter(|val| val.is_finite())
            .fold(None, |bounds, val| match bounds {
                None => Some((val, val)),
                Some((lower, upper)) => Some((f64::min(lower, val), f64::max(upper, val))),
            })
            .ok_or(WealthError::EmptyInput("no finite terminal wealth to bin"))?;

        log::debug!("binning terminal wealth over [{lower}, {upper}] into {n_bins} bins");

        let vals: Vec<_> = self
            .terminal_distribution
            .iter()
            .map(|row| row.terminal_wealth)
            .collect();
        Histogram::new(&vals, lower, upper, n_bins)
    }
}

/// Streaming aggregator of wealth trajectories.
///
/// Trajectories are added one at a time; all of them must have the same
/// length as the first one.
pub struct Analyzer {
    acc_vec: Vec<Accumulator>,
    terminal_distribution: Vec<TerminalRow>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            acc_vec: Vec::new(),
            terminal_distribution: Vec::new(),
        }
    }

    /// Add the trajectory of individual `id`.
    ///
    /// # Errors
    /// Returns an error if the trajectory is empty or its length differs
    /// from the trajectories already added.
    pub fn add_trajectory(&mut self, id: usize, wealth: &[f64]) -> WealthResult<()> {
        let &terminal_wealth = wealth
            .last()
            .ok_or(WealthError::EmptyInput("zero-length trajectory"))?;

        if self.terminal_distribution.is_empty() {
            self.acc_vec.resize_with(wealth.len(), Accumulator::new);
        } else if wealth.len() != self.acc_vec.len() {
            return Err(WealthError::TrajectoryLength {
                id,
                expected: self.acc_vec.len(),
                got: wealth.len(),
            });
        }

        // NaN (an overflowed wealth hit by a total loss) is skipped in every mean.
        for (acc, &val) in self.acc_vec.iter_mut().zip(wealth) {
            if !val.is_nan() {
                acc.add(val);
            }
        }
        self.terminal_distribution.push(TerminalRow {
            individual_id: id,
            terminal_wealth,
        });
        Ok(())
    }

    /// Compute the summary of every trajectory added so far.
    ///
    /// # Errors
    /// Returns [`WealthError::EmptyInput`] if no trajectory was added.
    pub fn finish(self) -> WealthResult<EnsembleSummary> {
        if self.terminal_distribution.is_empty() {
            return Err(WealthError::EmptyInput("no individuals to summarize"));
        }

        let ensemble_average = self.acc_vec.iter().map(Accumulator::mean).collect();

        let mut terminal_acc = Accumulator::new();
        let mut sorted: Vec<_> = self
            .terminal_distribution
            .iter()
            .map(|row| row.terminal_wealth)
            .filter(|val| !val.is_nan())
            .inspect(|&val| terminal_acc.add(val))
            .collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let terminal_report = terminal_acc.report();

        let quantile = |p: f64| {
            if sorted.is_empty() {
                f64::NAN
            } else {
                percentile(&sorted, p)
            }
        };

        let summary = EnsembleSummary {
            ensemble_average,
            terminal_min: quantile(0.0),
            terminal_p75: quantile(75.0),
            terminal_max: quantile(100.0),
            terminal_distribution: self.terminal_distribution,
            terminal_mean: terminal_report.mean,
            terminal_std_dev: terminal_report.std_dev,
            fast_event_share: None,
        };

        log::debug!(
            "terminal wealth: min {}, p75 {}, max {}, mean {}",
            summary.terminal_min,
            summary.terminal_p75,
            summary.terminal_max,
            summary.terminal_mean
        );

        Ok(summary)
    }
}

/// Summarize trajectories given as `(individual_id, wealth_trajectory)` pairs.
///
/// # Errors
/// Returns [`WealthError::EmptyInput`] for zero individuals or zero-length
/// trajectories and [`WealthError::TrajectoryLength`] for trajectories of
/// unequal length.
pub fn summarize<'a, I>(trajectories: I) -> WealthResult<EnsembleSummary>
where
    I: IntoIterator<Item = (usize, &'a [f64])>,
{
    let mut analyzer = Analyzer::new();
    for (id, wealth) in trajectories {
        analyzer.add_trajectory(id, wealth)?;
    }
    analyzer.finish()
}

/// Summarize a simulated population, including its observed fast-event share.
pub fn summarize_population(pop: &Population) -> WealthResult<EnsembleSummary> {
    let mut summary = summarize(pop.individuals.iter().map(|ind| (ind.id(), ind.wealth())))?;
    summary.fast_event_share = fast_event_share(pop);
    Ok(summary)
}

/// Fraction of all events of the population that were fast-growth events.
///
/// Returns `None` if the population has no events.
pub fn fast_event_share(pop: &Population) -> Option<f64> {
    let (n_fast, n_events) = pop
        .individuals
        .iter()
        .map(|ind| {
            let events = ind.events();
            (events.iter().filter(|&&fast| fast).count(), events.len())
        })
        .fold((0, 0), |(n_fast, n_events), (fast, len)| (n_fast + fast, n_events + len));
    if n_events == 0 {
        return None;
    }
    Some(n_fast as f64 / n_events as f64)
}

/// Full trajectory table, individual by individual.
pub fn trajectory_rows(pop: &Population) -> impl Iterator<Item = TrajectoryRow> + '_ {
    pop.individuals.iter().flat_map(|ind| {
        ind.wealth()
            .iter()
            .enumerate()
            .map(move |(timestep, &wealth)| TrajectoryRow {
                timestep,
                individual_id: ind.id(),
                wealth,
            })
    })
}
