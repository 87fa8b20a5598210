use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

const CONFIG: &str = r#"
seed = 2024

[experiment]
initial_wealth = 1000.0
fast_growth_rate = 20.0
slow_growth_rate = 2.0
fast_event_probability = 0.05
time_steps = 60
population_size = 200

[output]
hist_bins = 10
"#;

#[derive(Debug, Deserialize)]
struct Summary {
    seed: u64,
    terminal_min: f64,
    terminal_p75: f64,
    terminal_max: f64,
    terminal_mean: f64,
}

#[derive(Debug, Deserialize)]
struct EnsembleRow {
    timestep: usize,
    ensemble_average: f64,
}

fn setup(name: &str, config: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    fs::write(test_dir.join("config.toml"), config).expect("failed to write config file");

    test_dir
}

fn run_bin(args: &[&str]) -> bool {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_wealth-progression"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    if !output.status.success() {
        eprintln!(
            "binary failed with {args:?}\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    output.status.success()
}

fn count_rows(file: &Path) -> usize {
    csv::Reader::from_path(file)
        .expect("failed to open table")
        .records()
        .count()
}

#[test]
fn basic_workflow() {
    let test_dir = setup("basic_workflow", CONFIG);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert!(run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert!(run_bin(&["--sim-dir", test_dir_str, "run", "--seed", "7"]));

    let run_0 = test_dir.join("run-0000");
    let run_1 = test_dir.join("run-0001");
    let run_2 = test_dir.join("run-0002");

    let ensemble: Vec<EnsembleRow> = csv::Reader::from_path(run_0.join("ensemble.csv"))
        .expect("failed to open ensemble table")
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("failed to read ensemble table");
    assert_eq!(ensemble.len(), 61);
    assert_eq!(ensemble[0].timestep, 0);
    assert_eq!(ensemble[0].ensemble_average, 1000.0);

    assert_eq!(count_rows(&run_0.join("terminal.csv")), 200);
    assert_eq!(count_rows(&run_0.join("trajectories.csv")), 61 * 200);
    assert_eq!(count_rows(&run_0.join("histogram.csv")), 10);

    // Same configured seed, same tables.
    let terminal_0 = fs::read(run_0.join("terminal.csv")).expect("failed to read table");
    let terminal_1 = fs::read(run_1.join("terminal.csv")).expect("failed to read table");
    assert_eq!(terminal_0, terminal_1);

    let summary_bytes = fs::read(run_2.join("summary.msgpack")).expect("failed to read summary");
    let summary: Summary =
        rmp_serde::from_slice(&summary_bytes).expect("failed to deserialize summary");
    assert_eq!(summary.seed, 7);
    assert!(summary.terminal_min <= summary.terminal_p75);
    assert!(summary.terminal_p75 <= summary.terminal_max);
    assert!(summary.terminal_mean >= summary.terminal_min);

    assert!(run_bin(&["--sim-dir", test_dir_str, "clean"]));
    assert!(!run_0.exists());
    assert!(!run_2.exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn degenerate_distribution_is_binned() {
    let config = CONFIG.replace("fast_growth_rate = 20.0", "fast_growth_rate = 2.0");
    let test_dir = setup("degenerate_distribution", &config);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert_eq!(
        count_rows(&test_dir.join("run-0000").join("histogram.csv")),
        1
    );

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_fails() {
    let config = CONFIG.replace("fast_event_probability = 0.05", "fast_event_probability = 1.5");
    let test_dir = setup("invalid_config", &config);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn run_index_gap_is_not_reused() {
    let test_dir = setup("run_index_gap", CONFIG);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    let run_1 = test_dir.join("run-0001");
    fs::create_dir(&run_1).expect("failed to create run directory");
    fs::write(run_1.join("terminal.csv"), "kept").expect("failed to write table");

    assert!(run_bin(&["--sim-dir", test_dir_str, "run"]));

    assert!(!test_dir.join("run-0000").exists());
    assert_eq!(
        fs::read_to_string(run_1.join("terminal.csv")).expect("failed to read table"),
        "kept"
    );
    assert_eq!(count_rows(&test_dir.join("run-0002").join("terminal.csv")), 200);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn failed_run_leaves_no_run_dir() {
    // Every individual overflows to +inf, leaving nothing finite to bin.
    let config = CONFIG
        .replace("fast_growth_rate = 20.0", "fast_growth_rate = 1.0e300")
        .replace("fast_event_probability = 0.05", "fast_event_probability = 1.0");
    let test_dir = setup("failed_run", &config);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert!(!test_dir.join("run-0000").exists());

    assert!(run_bin(&["--sim-dir", test_dir_str, "clean"]));

    fs::remove_dir_all(&test_dir).ok();
}
