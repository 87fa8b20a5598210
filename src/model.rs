//! Simulation data types.

use crate::params::ExperimentParameters;

/// Individual of the simulation.
///
/// Each individual owns its growth-event sequence (`true` = fast growth) and
/// the wealth trajectory compounded from it. The trajectory holds one more
/// entry than the event sequence: entry 0 is the initial wealth.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    id: usize,
    events: Vec<bool>,
    wealth: Vec<f64>,
}

impl Individual {
    /// Compound `params.initial_wealth` over a given event sequence.
    ///
    /// No randomness is involved: the trajectory is fully determined by
    /// `events` and `params`.
    pub fn from_events(id: usize, events: Vec<bool>, params: &ExperimentParameters) -> Self {
        let mut wealth = Vec::with_capacity(events.len() + 1);
        let mut current = params.initial_wealth;
        wealth.push(current);
        for &fast in &events {
            current *= params.growth_factor(fast);
            wealth.push(current);
        }
        Self { id, events, wealth }
    }

    /// Get the index of the individual.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the growth-event sequence of the individual.
    pub fn events(&self) -> &[bool] {
        &self.events
    }

    /// Get the wealth trajectory of the individual.
    pub fn wealth(&self) -> &[f64] {
        &self.wealth
    }
}

/// Every individual of one experiment, indexed by id.
#[derive(Debug, Clone)]
pub struct Population {
    pub individuals: Vec<Individual>,
}
