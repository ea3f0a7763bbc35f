// src/config.rs

use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Where a driver reads data from and writes figures to. Built once in each
/// binary from the CLI flags and passed down; there is no process-wide
/// path state.
#[derive(Debug, Clone)]
pub struct AnalysisPaths {
    pub root: PathBuf,
    pub figure_dir: PathBuf,
}

impl AnalysisPaths {
    pub fn resolve(in_path: Option<PathBuf>, out_path: Option<PathBuf>) -> Self {
        let root = in_path.unwrap_or_else(|| PathBuf::from("."));
        let figure_dir = out_path.unwrap_or_else(|| root.join("figures"));
        Self { root, figure_dir }
    }

    /// Data directory for one test problem. Each run of the solver gets its
    /// own subdirectory below this, so successive runs never clobber each
    /// other's output files.
    pub fn data_dir(&self, problem: &str) -> PathBuf {
        self.root.join("data").join(problem)
    }

    /// The solver is built once per reconstruction scheme.
    pub fn solver_exe(&self, reconstructor: &str) -> PathBuf {
        self.root
            .join("solver")
            .join("bin")
            .join(format!("mhd.{reconstructor}"))
    }

    pub fn param_file(&self, name: &str) -> PathBuf {
        self.root.join("param-files").join(name)
    }

    pub fn link_table(&self) -> PathBuf {
        self.root.join("links.bin")
    }

    pub fn figure(&self, name: &str) -> PathBuf {
        self.figure_dir.join(name)
    }
}

/// Record of one solver invocation, written into the run directory so a
/// figure can always be traced back to the exact command that produced its
/// data.
#[derive(Serialize)]
pub struct RunManifest {
    pub exe: String,
    pub param_file: String,
    pub overrides: Vec<String>,

    // Provenance
    pub git_commit: Option<String>,
    pub timestamp_utc: String,
}

impl RunManifest {
    pub fn new(exe: &Path, param_file: &Path, overrides: &[String]) -> Self {
        Self {
            exe: exe.display().to_string(),
            param_file: param_file.display().to_string(),
            overrides: overrides.to_vec(),
            git_commit: current_commit(),
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> std::io::Result<()> {
        let path = out_dir.join("manifest.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// HEAD commit of the working tree, if this is a git checkout.
pub fn current_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let commit = String::from_utf8(output.stdout).ok()?;
    let commit = commit.trim();
    if commit.is_empty() {
        None
    } else {
        Some(commit.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_hang_off_the_root() {
        let paths = AnalysisPaths::resolve(Some(PathBuf::from("/work")), None);
        assert_eq!(paths.figure_dir, PathBuf::from("/work/figures"));
        assert_eq!(
            paths.data_dir("mhd_blast"),
            PathBuf::from("/work/data/mhd_blast")
        );
        assert_eq!(
            paths.solver_exe("ppmc"),
            PathBuf::from("/work/solver/bin/mhd.ppmc")
        );
    }

    #[test]
    fn explicit_figure_dir_wins() {
        let paths = AnalysisPaths::resolve(None, Some(PathBuf::from("/figs")));
        assert_eq!(paths.figure_dir, PathBuf::from("/figs"));
    }
}
