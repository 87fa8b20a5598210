use crate::error::{WealthError, WealthResult};
use crate::model::{Individual, Population};
use crate::params::ExperimentParameters;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Bernoulli;
use rayon::prelude::*;

/// Simulation engine.
///
/// Holds the validated parameters and the base seed of one experiment.
/// Every individual draws its events from its own ChaCha stream, selected by
/// its index, so the outcome depends only on the parameters and the seed and
/// never on how the work is split across threads.
#[derive(Debug)]
pub struct Engine {
    params: ExperimentParameters,
    seed: u64,
}

impl Engine {
    /// Create a new `Engine`, drawing a fresh seed when none is given.
    ///
    /// # Errors
    /// Returns [`WealthError::InvalidParameter`] if `params` violate a
    /// precondition. Nothing is simulated in that case.
    pub fn new(params: ExperimentParameters, seed: Option<u64>) -> WealthResult<Self> {
        params.validate()?;
        let seed = seed.unwrap_or_else(rand::random);
        Ok(Self { params, seed })
    }

    /// Get the base seed of the experiment.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the experiment parameters.
    pub fn params(&self) -> &ExperimentParameters {
        &self.params
    }

    /// Simulate every individual of the population.
    ///
    /// Individuals are independent of each other and are simulated in
    /// parallel. The returned population is ordered by id.
    pub fn simulate(&self) -> WealthResult<Population> {
        let event_dist = Bernoulli::new(self.params.fast_event_probability).map_err(|err| {
            WealthError::InvalidParameter {
                name: "fast_event_probability",
                reason: err.to_string(),
            }
        })?;

        log::info!(
            "simulating {} individuals over {} steps (seed {})",
            self.params.population_size,
            self.params.time_steps,
            self.seed
        );

        let individuals: Vec<_> = (0..self.params.population_size)
            .into_par_iter()
            .map(|id| self.simulate_individual(id, &event_dist))
            .collect();

        log::info!("completed simulation");

        Ok(Population { individuals })
    }

    fn simulate_individual(&self, id: usize, event_dist: &Bernoulli) -> Individual {
        let mut rng = self.individual_rng(id);
        let events = (0..self.params.time_steps)
            .map(|_| event_dist.sample(&mut rng))
            .collect();
        Individual::from_events(id, events, &self.params)
    }

    fn individual_rng(&self, id: usize) -> ChaCha12Rng {
        let mut rng = ChaCha12Rng::seed_from_u64(self.seed);
        rng.set_stream(id as u64);
        rng
    }
}
