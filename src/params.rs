use crate::error::{WealthError, WealthResult};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, ops::RangeBounds};

/// Experiment parameters.
///
/// Supplied by the caller as an immutable value and validated before any
/// simulation work starts. Growth rates are percentages per step.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExperimentParameters {
    /// Wealth of every individual at step 0.
    pub initial_wealth: f64,

    /// Growth rate applied on a fast-growth event.
    pub fast_growth_rate: f64,
    /// Growth rate applied on a slow-growth event (may be negative).
    pub slow_growth_rate: f64,

    /// Probability that a step is a fast-growth event.
    pub fast_event_probability: f64,

    /// Number of steps per trajectory.
    #[serde(default = "default_time_steps")]
    pub time_steps: usize,
    /// Number of simulated individuals.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
}

fn default_time_steps() -> usize {
    60
}

fn default_population_size() -> usize {
    1000
}

impl Default for ExperimentParameters {
    fn default() -> Self {
        Self {
            initial_wealth: 1000.0,
            fast_growth_rate: 20.0,
            slow_growth_rate: 2.0,
            fast_event_probability: 0.05,
            time_steps: default_time_steps(),
            population_size: default_population_size(),
        }
    }
}

impl ExperimentParameters {
    /// Check the logical preconditions of the simulator.
    ///
    /// Only the logical constraints are enforced here. Wealth reaching zero
    /// or going negative (`slow_growth_rate <= -100`) is a valid outcome.
    ///
    /// # Errors
    /// Returns [`WealthError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> WealthResult<()> {
        check_finite("initial_wealth", self.initial_wealth)?;
        check_num("initial_wealth", self.initial_wealth, f64::MIN_POSITIVE..)?;
        check_finite("fast_growth_rate", self.fast_growth_rate)?;
        check_finite("slow_growth_rate", self.slow_growth_rate)?;
        check_num(
            "fast_event_probability",
            self.fast_event_probability,
            0.0..=1.0,
        )?;
        check_num("time_steps", self.time_steps, 1..)?;
        check_num("population_size", self.population_size, 1..)?;
        Ok(())
    }

    /// Multiplicative factor applied to wealth for one step.
    pub fn growth_factor(&self, fast: bool) -> f64 {
        let rate = if fast {
            self.fast_growth_rate
        } else {
            self.slow_growth_rate
        };
        1.0 + rate / 100.0
    }
}

fn check_num<T, R>(name: &'static str, num: T, range: R) -> WealthResult<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(WealthError::InvalidParameter {
            name,
            reason: format!("number must be in the range {range:?}, but is {num:?}"),
        });
    }
    Ok(())
}

fn check_finite(name: &'static str, num: f64) -> WealthResult<()> {
    if !num.is_finite() {
        return Err(WealthError::InvalidParameter {
            name,
            reason: format!("number must be finite, but is {num:?}"),
        });
    }
    Ok(())
}
