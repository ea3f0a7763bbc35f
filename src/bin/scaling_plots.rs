// src/bin/scaling_plots.rs
//
// Weak- and strong-scaling figures from the solver's run_timing.log files.
// The weak sweep is a directory of ranks*/run_timing.log single-row logs;
// the strong run appends every rank count to one log.

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use mhd_analysis::config::AnalysisPaths;
use mhd_analysis::links::update_plot_entry;
use mhd_analysis::timing::{
    cells_per_second_per_gpu, load_weak_scaling, ms_per_timestep, strong_scaling_speedup,
    weak_scaling_efficiency, TimingTable,
};
use mhd_analysis::visualisation::{
    save_cells_per_second_plot, save_efficiency_plot, save_ms_per_timestep_plot,
    save_strong_scaling_plot,
};

const SOURCE_PATH: &str = "src/bin/scaling_plots.rs";

#[derive(Parser)]
#[command(about = "Scaling test figures from solver timing logs")]
struct Args {
    /// Directory holding the scaling data
    #[arg(short = 'p', long)]
    in_path: Option<PathBuf>,

    /// Directory the figures are written to
    #[arg(short = 'o', long)]
    out_path: Option<PathBuf>,

    /// Generate the weak scaling plots
    #[arg(short = 'w', long)]
    weak: bool,

    /// Generate the strong scaling plot
    #[arg(short = 's', long)]
    strong: bool,
}

fn paired(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter().zip(y.iter()).map(|(&a, &b)| (a, b)).collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let start = Instant::now();

    let args = Args::parse();
    let paths = AnalysisPaths::resolve(args.in_path.clone(), args.out_path.clone());

    if args.weak {
        weak_scaling_figures(&paths)?;
        update_plot_entry(&paths.link_table(), "scaling", SOURCE_PATH)?;
    }

    if args.strong {
        strong_scaling_figure(&paths)?;
        update_plot_entry(&paths.link_table(), "strong-scaling", SOURCE_PATH)?;
    }

    info!("done in {:.2?}", start.elapsed());
    Ok(())
}

fn weak_scaling_figures(paths: &AnalysisPaths) -> Result<(), Box<dyn Error>> {
    let table = load_weak_scaling(&paths.data_dir("scaling").join("weak"))?;

    // Note that the solver's timer for the integrator is named
    // "Hydro_Integrator", not "MHD"
    let (ranks, total) = cells_per_second_per_gpu(&table, "Total")?;
    let (_, integrator) = cells_per_second_per_gpu(&table, "Hydro_Integrator")?;
    for (rank, updates) in ranks.iter().zip(&total) {
        info!("ranks {rank:5.0}: {updates:.4e} cell updates / second / GPU");
    }
    save_cells_per_second_plot(
        &[
            ("Total".to_string(), paired(&ranks, &total)),
            ("MHD Integrator".to_string(), paired(&ranks, &integrator)),
        ],
        &paths.figure("scaling_tests_cells_per_second.png"),
    )?;

    let (ranks, efficiency) = weak_scaling_efficiency(&table, "Total")?;
    for (rank, eff) in ranks.iter().zip(&efficiency) {
        info!("ranks {rank:5.0}: weak scaling efficiency {eff:5.2}%");
    }
    save_efficiency_plot(
        &ranks,
        &efficiency,
        &paths.figure("scaling_tests_weak_efficiency.png"),
    )?;

    let scale_to = 256.0_f64.powi(3);
    let (ranks, total_ms) = ms_per_timestep(&table, "Total", scale_to)?;
    let (_, boundaries_ms) = ms_per_timestep(&table, "Boundaries", scale_to)?;
    let (_, integrator_ms) = ms_per_timestep(&table, "Hydro_Integrator", scale_to)?;
    save_ms_per_timestep_plot(
        &[
            (
                "Total runtime (excluding initialization)".to_string(),
                paired(&ranks, &total_ms),
            ),
            (
                "MPI Communication".to_string(),
                paired(&ranks, &boundaries_ms),
            ),
            (
                "MHD Integrator".to_string(),
                paired(&ranks, &integrator_ms),
            ),
        ],
        &paths.figure("scaling_tests_ms_per_gpu.png"),
    )?;

    Ok(())
}

fn strong_scaling_figure(paths: &AnalysisPaths) -> Result<(), Box<dyn Error>> {
    let log = paths.data_dir("scaling").join("strong").join("run_timing.log");
    let table = TimingTable::from_log(&log)?;

    let (ranks, speedup) = strong_scaling_speedup(&table)?;
    for (rank, s) in ranks.iter().zip(&speedup) {
        info!(
            "ranks {rank:5.0}: speedup {s:.2}, strong scaling efficiency {:.2}%",
            100.0 * s / rank
        );
    }
    save_strong_scaling_plot(&ranks, &speedup, &paths.figure("scaling_test_strong.png"))?;
    Ok(())
}
