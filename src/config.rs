use crate::params::ExperimentParameters;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base seed of every run (a fresh one is drawn per run if absent).
    pub seed: Option<u64>,

    /// Experiment parameters.
    pub experiment: ExperimentParameters,

    /// Output parameters.
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of bins of the terminal wealth histogram.
    #[serde(default = "default_hist_bins")]
    pub hist_bins: usize,
}

fn default_hist_bins() -> usize {
    10
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            hist_bins: default_hist_bins(),
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be a TOML document with an `[experiment]` table and
    /// optional `seed` and `[output]` entries.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let exp = &self.experiment;
        exp.validate().context("invalid experiment parameters")?;

        check_num(self.output.hist_bins, 1..=1000).context("invalid number of histogram bins")?;

        // Usual interactive ranges; values outside them are still simulated.
        warn_num("initial_wealth", exp.initial_wealth, 1000.0..=1_000_000.0);
        warn_num("fast_growth_rate", exp.fast_growth_rate, 0.0..=100.0);
        warn_num("slow_growth_rate", exp.slow_growth_rate, -100.0..=100.0);

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn warn_num<T, R>(name: &str, num: T, range: R)
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        log::warn!("{name} is outside the usual range {range:?}: {num:?}");
    }
}
