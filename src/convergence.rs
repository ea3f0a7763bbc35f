// src/convergence.rs
//
// The linear-wave convergence sweep: reconstruction scheme × wave type ×
// resolution. The (scheme, wave) combinations are independent of one
// another, so the L2 norms are computed in parallel.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::diagnostics::l2_error_norm;
use crate::error::Result;
use crate::runner::snapshot_path;
use crate::snapshot::Snapshot;

/// Sweep axes, passed by value into each pipeline invocation rather than
/// living in process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub reconstructors: Vec<String>,
    pub waves: Vec<String>,
    pub resolutions: Vec<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            reconstructors: vec!["plmc".to_string(), "ppmc".to_string()],
            waves: vec![
                "alfven_wave".to_string(),
                "fast_magnetosonic".to_string(),
                "mhd_contact_wave".to_string(),
                "slow_magnetosonic".to_string(),
            ],
            resolutions: vec![16, 32, 64, 128, 256, 512],
        }
    }
}

/// Directory name for one run of the sweep.
pub fn run_label(reconstructor: &str, wave: &str, resolution: usize) -> String {
    format!("{reconstructor}_{wave}_{resolution}")
}

/// L2 error against resolution for one (scheme, wave) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceSeries {
    pub reconstructor: String,
    pub wave: String,
    pub errors: Vec<f64>,
}

/// Compute the convergence norm for every combination in the sweep. Each
/// run directory must hold the initial (`0.snap`) and final (`1.snap`)
/// snapshots; a missing run aborts the whole computation.
pub fn compute_l2_series(config: &SweepConfig, data_dir: &Path) -> Result<Vec<ConvergenceSeries>> {
    let combos: Vec<(String, String)> = config
        .reconstructors
        .iter()
        .flat_map(|r| config.waves.iter().map(move |w| (r.clone(), w.clone())))
        .collect();

    combos
        .par_iter()
        .map(|(reconstructor, wave)| {
            let mut errors = Vec::with_capacity(config.resolutions.len());
            for &resolution in &config.resolutions {
                let run_dir = data_dir.join(run_label(reconstructor, wave, resolution));
                let initial = Snapshot::load(&snapshot_path(&run_dir, 0))?;
                let advanced = Snapshot::load(&snapshot_path(&run_dir, 1))?;
                errors.push(l2_error_norm(&initial, &advanced));
            }
            Ok(ConvergenceSeries {
                reconstructor: reconstructor.clone(),
                wave: wave.clone(),
                errors,
            })
        })
        .collect()
}

/// Pull one (scheme, wave) series back out of the computed set.
pub fn find_series<'a>(
    series: &'a [ConvergenceSeries],
    reconstructor: &str,
    wave: &str,
) -> Option<&'a ConvergenceSeries> {
    series
        .iter()
        .find(|s| s.reconstructor == reconstructor && s.wave == wave)
}
