// src/runner.rs
//
// Invocation of the external simulation executable. Every run writes into
// its own directory (the `outdir` override points the solver there), so a
// parameter sweep never has to rename fixed-name output files between
// iterations. The exit status is logged but not fatal: if a run failed,
// the downstream load of its snapshots fails with a missing-file error.

use std::fmt::Display;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{info, warn};

use crate::config::RunManifest;
use crate::error::Result;

/// One solver invocation: executable, parameter file, and the `key=value`
/// override tokens appended after it.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub exe: PathBuf,
    pub param_file: PathBuf,
    pub overrides: Vec<String>,
}

impl SolverConfig {
    pub fn new(exe: PathBuf, param_file: PathBuf) -> Self {
        Self {
            exe,
            param_file,
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, key: &str, value: impl Display) -> Self {
        self.overrides.push(kv(key, value));
        self
    }

    pub fn with_overrides<I: IntoIterator<Item = String>>(mut self, tokens: I) -> Self {
        self.overrides.extend(tokens);
        self
    }
}

/// Format one override token the way the solver expects it.
pub fn kv(key: &str, value: impl Display) -> String {
    format!("{key}={value}")
}

#[derive(Debug)]
pub struct RunOutcome {
    pub run_dir: PathBuf,
    pub success: bool,
}

/// Snapshot file the solver writes for output instant `index` of a run.
pub fn snapshot_path(run_dir: &Path, index: usize) -> PathBuf {
    run_dir.join(format!("{index}.snap"))
}

/// Run the solver once, with stdout/stderr captured to `solver.log` inside
/// the run directory and a manifest recording the exact command line.
pub fn run_solver(config: &SolverConfig, run_dir: &Path) -> Result<RunOutcome> {
    create_dir_all(run_dir)?;

    let log_path = run_dir.join("solver.log");
    let stdout = File::create(&log_path)?;
    let stderr = stdout.try_clone()?;

    let mut command = Command::new(&config.exe);
    command
        .arg(&config.param_file)
        .args(&config.overrides)
        .arg(kv("outdir", format!("{}/", run_dir.display())))
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));

    info!("running solver: {:?}", command);
    let status = command.status()?;
    if !status.success() {
        warn!(
            "solver exited with {status}; see {} — downstream loads will fail if outputs are missing",
            log_path.display()
        );
    }

    RunManifest::new(&config.exe, &config.param_file, &config.overrides).write_to_dir(run_dir)?;

    Ok(RunOutcome {
        run_dir: run_dir.to_path_buf(),
        success: status.success(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_tokens_have_the_solver_shape() {
        assert_eq!(kv("nx", 256), "nx=256");
        assert_eq!(kv("tout", 2.0), "tout=2");
        assert_eq!(kv("init", "Riemann"), "init=Riemann");
    }

    #[test]
    fn snapshot_paths_are_indexed_inside_the_run_dir() {
        let p = snapshot_path(Path::new("data/afl/n64"), 10);
        assert_eq!(p, PathBuf::from("data/afl/n64/10.snap"));
    }

    #[test]
    fn a_failing_executable_is_reported_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SolverConfig::new(PathBuf::from("false"), PathBuf::from("params.txt"))
            .with_override("nx", 16);
        let outcome = run_solver(&config, &dir.path().join("run")).expect("run completes");
        assert!(!outcome.success);
        assert!(outcome.run_dir.join("solver.log").exists());
        assert!(outcome.run_dir.join("manifest.json").exists());
    }
}
