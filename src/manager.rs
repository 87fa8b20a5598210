use crate::analysis::{summarize_population, trajectory_rows};
use crate::config::Config;
use crate::engine::Engine;
use crate::params::ExperimentParameters;
use crate::stats::Histogram;
use anyhow::{Context, Result};
use glob::glob;
use rmp_serde::encode;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Scalar results of one run, saved next to its tables.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub params: ExperimentParameters,
    pub terminal_min: f64,
    pub terminal_p75: f64,
    pub terminal_max: f64,
    pub terminal_mean: f64,
    pub terminal_std_dev: f64,
    pub fast_event_share: Option<f64>,
    pub histogram: Histogram,
}

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Run one experiment and write its tables into a new run directory.
    ///
    /// `seed` takes precedence over the configured seed.
    pub fn run_experiment(&self, seed: Option<u64>) -> Result<()> {
        let engine = Engine::new(self.cfg.experiment.clone(), seed.or(self.cfg.seed))
            .context("failed to construct engine")?;

        let pop = engine.simulate().context("failed to simulate population")?;

        let summary = summarize_population(&pop).context("failed to summarize population")?;
        let histogram = summary
            .histogram(self.cfg.output.hist_bins)
            .context("failed to bin terminal wealth")?;
        log::info!(
            "completed experiment: terminal mean {:.2}, min {:.2}, p75 {:.2}, max {:.2}",
            summary.terminal_mean,
            summary.terminal_min,
            summary.terminal_p75,
            summary.terminal_max
        );

        let run_idx = self.next_run_idx().context("failed to find next run index")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        write_table(run_dir.join("ensemble.csv"), summary.ensemble_rows())
            .context("failed to write ensemble table")?;
        write_table(
            run_dir.join("terminal.csv"),
            summary.terminal_distribution.iter(),
        )
        .context("failed to write terminal table")?;
        write_table(run_dir.join("trajectories.csv"), trajectory_rows(&pop))
            .context("failed to write trajectory table")?;
        write_table(run_dir.join("histogram.csv"), histogram.bins.iter())
            .context("failed to write histogram table")?;

        let report = RunReport {
            seed: engine.seed(),
            params: engine.params().clone(),
            terminal_min: summary.terminal_min,
            terminal_p75: summary.terminal_p75,
            terminal_max: summary.terminal_max,
            terminal_mean: summary.terminal_mean,
            terminal_std_dev: summary.terminal_std_dev,
            fast_event_share: summary.fast_event_share,
            histogram,
        };
        save_report(&report, run_dir.join("summary.msgpack")).context("failed to save report")?;

        Ok(())
    }

    /// Remove every run directory.
    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(dirs)
    }

    /// One past the highest existing run index, so gaps are never reused.
    fn next_run_idx(&self) -> Result<usize> {
        let next = self
            .run_dirs()?
            .iter()
            .filter_map(|dir| dir.file_name()?.to_str()?.strip_prefix("run-")?.parse().ok())
            .map(|run_idx: usize| run_idx + 1)
            .max()
            .unwrap_or(0);
        Ok(next)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }
}

fn write_table<P, I>(file: P, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator,
    I::Item: Serialize,
{
    let file = file.as_ref();
    let mut writer =
        csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;
    for row in rows {
        writer.serialize(row).context("failed to serialize row")?;
    }
    writer.flush().context("failed to flush writer stream")?;
    log::info!("wrote {file:?}");
    Ok(())
}

fn save_report<P: AsRef<Path>>(report: &RunReport, file: P) -> Result<()> {
    let file = file.as_ref();
    let file_handle = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file_handle);
    encode::write_named(&mut writer, report).context("failed to serialize report")?;
    writer.flush().context("failed to flush writer stream")?;
    log::info!("wrote {file:?}");
    Ok(())
}
