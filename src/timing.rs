// src/timing.rs
//
// Parsing of the solver's run_timing.log files and the scaling series
// derived from them. A timing log is a whitespace-separated table: comment
// lines start with '#', the last comment line before the data is the column
// header, every data line is one run. Weak-scaling sweeps produce one
// single-row log per rank-count directory; strong-scaling runs append all
// rows to one log.

use std::fs;
use std::path::Path;

use log::warn;

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
pub struct TimingTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TimingTable {
    pub fn from_log(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|message| AnalysisError::MalformedTimingLog {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('#') {
                // Comment lines before the data; the last one is the header
                if rows.is_empty() {
                    columns = rest.split_whitespace().map(str::to_string).collect();
                }
                continue;
            }

            let row: Vec<f64> = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|_| format!("bad numeric value '{tok}'"))
                })
                .collect::<std::result::Result<_, _>>()?;
            if row.len() != columns.len() {
                return Err(format!(
                    "row has {} values but header has {} columns",
                    row.len(),
                    columns.len()
                ));
            }
            rows.push(row);
        }

        if columns.is_empty() {
            return Err("no header line found".to_string());
        }
        Ok(Self { columns, rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                name: name.to_string(),
            })?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    fn sort_rows_by(&mut self, name: &str) -> Result<()> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                name: name.to_string(),
            })?;
        self.rows
            .sort_by(|a, b| a[idx].partial_cmp(&b[idx]).unwrap_or(std::cmp::Ordering::Equal));
        Ok(())
    }
}

/// Collect the weak-scaling sweep: every `ranks*` subdirectory holds one
/// single-row `run_timing.log`. Missing logs are warned about and skipped,
/// matching the exploratory tooling this replaces.
pub fn load_weak_scaling(dir: &Path) -> Result<TimingTable> {
    let mut subdirs: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("ranks"))
        })
        .collect();
    subdirs.sort();

    let mut combined: Option<TimingTable> = None;
    for subdir in subdirs {
        let log = subdir.join("run_timing.log");
        if !log.is_file() {
            warn!("file {} not found", log.display());
            continue;
        }
        let table = TimingTable::from_log(&log)?;
        match combined.as_mut() {
            None => combined = Some(table),
            Some(all) => {
                if table.columns != all.columns {
                    warn!(
                        "{}: column layout differs from the first log, skipping",
                        log.display()
                    );
                    continue;
                }
                all.rows.extend(table.rows);
            }
        }
    }

    let mut table = combined.ok_or_else(|| AnalysisError::MalformedTimingLog {
        path: dir.to_path_buf(),
        message: "no ranks*/run_timing.log files found".to_string(),
    })?;
    table.sort_rows_by("n_proc")?;
    Ok(table)
}

/// Per-timestep time in milliseconds for one named timer, excluding the
/// initialization step.
fn ms_per_step(table: &TimingTable, timer: &str) -> Result<Vec<f64>> {
    let total = table.column(timer)?;
    let n_steps = table.column("n_steps")?;
    Ok(total
        .iter()
        .zip(&n_steps)
        .map(|(t, n)| t / (n - 1.0))
        .collect())
}

fn cells_per_gpu(table: &TimingTable) -> Result<Vec<f64>> {
    let nx = table.column("nx")?;
    let ny = table.column("ny")?;
    let nz = table.column("nz")?;
    let n_proc = table.column("n_proc")?;
    Ok((0..nx.len())
        .map(|i| nx[i] * ny[i] * nz[i] / n_proc[i])
        .collect())
}

/// Cell updates per second per GPU, against rank count.
pub fn cells_per_second_per_gpu(table: &TimingTable, timer: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let n_proc = table.column("n_proc")?;
    let cells = cells_per_gpu(table)?;
    let per_step_s: Vec<f64> = ms_per_step(table, timer)?
        .iter()
        .map(|ms| ms / 1000.0)
        .collect();
    let y = cells
        .iter()
        .zip(&per_step_s)
        .map(|(c, t)| c / t)
        .collect();
    Ok((n_proc, y))
}

/// Weak-scaling efficiency in percent, relative to the smallest run.
pub fn weak_scaling_efficiency(table: &TimingTable, timer: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let n_proc = table.column("n_proc")?;
    let per_step = ms_per_step(table, timer)?;
    let y = per_step
        .iter()
        .map(|t| per_step.first().map_or(f64::NAN, |t0| (t0 / t) * 100.0))
        .collect();
    Ok((n_proc, y))
}

/// Per-timestep milliseconds scaled to `scale_to` cells per GPU.
pub fn ms_per_timestep(
    table: &TimingTable,
    timer: &str,
    scale_to: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let n_proc = table.column("n_proc")?;
    let cells = cells_per_gpu(table)?;
    let per_step = ms_per_step(table, timer)?;
    let y = per_step
        .iter()
        .zip(&cells)
        .map(|(ms, c)| ms * scale_to / c)
        .collect();
    Ok((n_proc, y))
}

/// Strong-scaling speedup relative to the slowest (fewest-rank) run.
pub fn strong_scaling_speedup(table: &TimingTable) -> Result<(Vec<f64>, Vec<f64>)> {
    let n_proc = table.column("n_proc")?;
    let total = table.column("Total")?;
    let slowest = total.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y = total.iter().map(|t| slowest / t).collect();
    Ok((n_proc, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LOG: &str = "\
# Run started
# solver version 1.0
#n_proc nx ny nz n_steps Total Hydro_Integrator Boundaries
1 256 256 256 101 1000.0 800.0 100.0
8 512 512 512 101 1100.0 820.0 200.0
64 1024 1024 1024 101 1300.0 850.0 350.0
";

    #[test]
    fn header_and_rows_parse() {
        let table = TimingTable::parse(SAMPLE_LOG).expect("parse");
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column("n_proc").expect("column"), vec![1.0, 8.0, 64.0]);
        assert!(matches!(
            table.column("nope"),
            Err(AnalysisError::MissingColumn { .. })
        ));
    }

    #[test]
    fn weak_scaling_efficiency_starts_at_100_percent() {
        let table = TimingTable::parse(SAMPLE_LOG).expect("parse");
        let (_, eff) = weak_scaling_efficiency(&table, "Total").expect("efficiency");
        assert!((eff[0] - 100.0).abs() < 1e-12);
        assert!(eff[1] < 100.0);
    }

    #[test]
    fn cell_updates_account_for_ranks_and_steps() {
        let table = TimingTable::parse(SAMPLE_LOG).expect("parse");
        let (ranks, y) = cells_per_second_per_gpu(&table, "Total").expect("series");
        assert_eq!(ranks[0], 1.0);
        // 256^3 cells / (1000 ms / 100 steps / 1000) = 256^3 / 0.01 s
        let expected = 256.0_f64.powi(3) / 0.01;
        assert!((y[0] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn speedup_is_relative_to_the_slowest_run() {
        let table = TimingTable::parse(SAMPLE_LOG).expect("parse");
        let (_, speedup) = strong_scaling_speedup(&table).expect("speedup");
        assert!((speedup[2] - 1.0).abs() < 1e-12);
        assert!((speedup[0] - 1.3).abs() < 1e-12);
    }

    #[test]
    fn a_garbled_row_is_rejected() {
        let text = "#a b\n1.0 oops\n";
        assert!(TimingTable::parse(text).is_err());
    }
}
