// src/bin/linear_wave_convergence.rs
//
// Linear wave convergence study:
// 1. (optionally) run the solver over the full sweep
//    (2 reconstructors × 4 waves × 6 resolutions)
// 2. (optionally) compute all the L2 norms and persist them
// 3. (optionally) plot one convergence figure per wave, with a
//    second-order reference line

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use mhd_analysis::config::AnalysisPaths;
use mhd_analysis::convergence::{
    compute_l2_series, find_series, run_label, ConvergenceSeries, SweepConfig,
};
use mhd_analysis::diagnostics::normalize_to_first;
use mhd_analysis::links::{load_bin, save_bin};
use mhd_analysis::runner::{run_solver, SolverConfig};
use mhd_analysis::visualisation::save_convergence_plot;

#[derive(Parser)]
#[command(about = "Linear wave convergence: run the sweep, compute the L2 norms, render the figures")]
struct Args {
    /// Directory holding the solver, parameter files and data
    #[arg(short = 'p', long)]
    in_path: Option<PathBuf>,

    /// Directory the figures are written to
    #[arg(short = 'o', long)]
    out_path: Option<PathBuf>,

    /// Run the solver over the full sweep
    #[arg(short = 'r', long)]
    run_solver: bool,

    /// Compute the L2 norms and persist them
    #[arg(short = 'd', long)]
    data: bool,

    /// Render the convergence figures
    #[arg(short = 'f', long)]
    figure: bool,

    /// Normalize each series by its coarsest-resolution value
    #[arg(long)]
    normalize: bool,
}

fn pretty_name(wave: &str) -> &str {
    match wave {
        "alfven_wave" => "Alfven Wave",
        "fast_magnetosonic" => "Fast Magnetosonic Wave",
        "mhd_contact_wave" => "Entropy Wave",
        "slow_magnetosonic" => "Slow Magnetosonic Wave",
        other => other,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let start = Instant::now();

    let args = Args::parse();
    let paths = AnalysisPaths::resolve(args.in_path.clone(), args.out_path.clone());
    let sweep = SweepConfig::default();
    let data_dir = paths.data_dir("linear_wave");
    let norms_path = data_dir.join("l2_norms.bin");

    if args.run_solver {
        run_sweep(&paths, &sweep)?;
    }

    if args.data {
        let series = compute_l2_series(&sweep, &data_dir)?;
        save_bin(&norms_path, &series)?;
        info!("computed {} convergence series", series.len());
    }

    if args.figure {
        let series: Vec<ConvergenceSeries> = load_bin(&norms_path)?;
        for wave in &sweep.waves {
            let plmc = find_series(&series, "plmc", wave)
                .ok_or_else(|| format!("no plmc series for wave '{wave}'"))?;
            let ppmc = find_series(&series, "ppmc", wave)
                .ok_or_else(|| format!("no ppmc series for wave '{wave}'"))?;

            let mut plmc_errors = plmc.errors.clone();
            let mut ppmc_errors = ppmc.errors.clone();
            let suffix = if args.normalize {
                normalize_to_first(&mut plmc_errors);
                normalize_to_first(&mut ppmc_errors);
                "_normalized"
            } else {
                ""
            };

            let title = format!("MHD Linear Wave Convergence ({})", pretty_name(wave));
            let figure_name = format!("{wave}_linear_convergence{suffix}.png");
            save_convergence_plot(
                &title,
                &sweep.resolutions,
                &plmc_errors,
                &ppmc_errors,
                &paths.figure(&figure_name),
            )?;
        }
    }

    info!("done in {:.2?}", start.elapsed());
    Ok(())
}

/// Off-axis resolution is fixed; only the wave direction is refined.
fn run_sweep(paths: &AnalysisPaths, sweep: &SweepConfig) -> Result<(), Box<dyn Error>> {
    for reconstructor in &sweep.reconstructors {
        for wave in &sweep.waves {
            for &resolution in &sweep.resolutions {
                let config = SolverConfig::new(
                    paths.solver_exe(reconstructor),
                    paths.param_file(&format!("{wave}.txt")),
                )
                .with_override("nx", resolution)
                .with_override("ny", 16)
                .with_override("nz", 16);

                let run_dir = paths
                    .data_dir("linear_wave")
                    .join(run_label(reconstructor, wave, resolution));
                run_solver(&config, &run_dir)?;
                info!("finished {resolution}, {wave}, {reconstructor}");
            }
        }
    }
    Ok(())
}
