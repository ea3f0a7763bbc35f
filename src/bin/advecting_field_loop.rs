// src/bin/advecting_field_loop.rs
//
// Advecting field loop test: a weakly magnetised loop advected diagonally
// across the box. The interesting diagnostics are the decay of the mean
// square magnetic field and the divergence of B, both against time, across
// a sweep of resolutions.
//
// Run:
//   cargo run --release --bin advecting_field_loop -- -r -d -f --slice-figure

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use mhd_analysis::config::AnalysisPaths;
use mhd_analysis::derived::{
    center_magnetic_fields, compute_derived_quantities, compute_velocities,
};
use mhd_analysis::diagnostics::{
    max_abs_divergence, mean_square_magnetic, normalize_to_first, FieldLoopSeries,
};
use mhd_analysis::links::{load_bin, save_bin, update_plot_entry};
use mhd_analysis::runner::{run_solver, snapshot_path, SolverConfig};
use mhd_analysis::scalar_field::PlaneSlice;
use mhd_analysis::snapshot::Snapshot;
use mhd_analysis::visualisation::{save_field_loop_plot, save_slice_grid};

const SOURCE_PATH: &str = "src/bin/advecting_field_loop.rs";

/// Sweep and initial-condition settings, built once and passed down.
struct FieldLoopSetup {
    resolutions: Vec<usize>,
    reconstructor: String,
    tout: f64,
    /// Output cadence; should divide tout evenly.
    outstep: f64,
    field_amplitude: f64,
    loop_radius: f64,
}

impl Default for FieldLoopSetup {
    fn default() -> Self {
        Self {
            resolutions: vec![32, 64, 128, 256],
            reconstructor: "ppmc".to_string(),
            tout: 2.0,
            outstep: 0.1,
            field_amplitude: 1e-3,
            loop_radius: 0.3,
        }
    }
}

impl FieldLoopSetup {
    fn num_outputs(&self) -> usize {
        (self.tout / self.outstep).ceil() as usize + 1
    }
}

#[derive(Parser)]
#[command(about = "Advecting field loop: run the solver, reduce the data, render the figures")]
struct Args {
    /// Directory holding the solver, parameter files and data
    #[arg(short = 'p', long)]
    in_path: Option<PathBuf>,

    /// Directory the figures are written to
    #[arg(short = 'o', long)]
    out_path: Option<PathBuf>,

    /// Run the solver for every resolution
    #[arg(short = 'r', long)]
    run_solver: bool,

    /// Load the snapshots and persist the reduced series
    #[arg(short = 'd', long)]
    data: bool,

    /// Render the time-series figure
    #[arg(short = 'f', long)]
    figure: bool,

    /// Render the magnetic-energy slice figure
    #[arg(long)]
    slice_figure: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let start = Instant::now();

    let args = Args::parse();
    let paths = AnalysisPaths::resolve(args.in_path.clone(), args.out_path.clone());
    let setup = FieldLoopSetup::default();

    if args.run_solver {
        run_sweep(&paths, &setup)?;
    }

    if args.data {
        let series = reduce_sweep(&paths, &setup)?;
        save_bin(&series_path(&paths), &series)?;
    }

    if args.figure {
        let series: Vec<FieldLoopSeries> = load_bin(&series_path(&paths))?;
        save_field_loop_plot(&series, &paths.figure("afl.png"))?;
        update_plot_entry(&paths.link_table(), "afl", SOURCE_PATH)?;
    }

    if args.slice_figure {
        save_slice_figure(&paths, &setup)?;
        update_plot_entry(&paths.link_table(), "afl_slice", SOURCE_PATH)?;
    }

    info!("done in {:.2?}", start.elapsed());
    Ok(())
}

fn series_path(paths: &AnalysisPaths) -> PathBuf {
    paths.data_dir("advecting_field_loop").join("series.bin")
}

fn run_dir(paths: &AnalysisPaths, resolution: usize) -> PathBuf {
    paths
        .data_dir("advecting_field_loop")
        .join(format!("n{resolution}"))
}

fn run_sweep(paths: &AnalysisPaths, setup: &FieldLoopSetup) -> Result<(), Box<dyn Error>> {
    for &resolution in &setup.resolutions {
        let run_start = Instant::now();
        let config = SolverConfig::new(
            paths.solver_exe(&setup.reconstructor),
            paths.param_file("advecting_field_loop.txt"),
        )
        .with_override("nx", resolution)
        .with_override("ny", resolution)
        .with_override("nz", 2 * resolution)
        .with_override("tout", setup.tout)
        .with_override("outstep", setup.outstep)
        .with_override("A", setup.field_amplitude)
        .with_override("radius", setup.loop_radius);

        run_solver(&config, &run_dir(paths, resolution))?;
        info!(
            "finished N={resolution} run in {:.2?}",
            run_start.elapsed()
        );
    }
    Ok(())
}

fn reduce_sweep(
    paths: &AnalysisPaths,
    setup: &FieldLoopSetup,
) -> Result<Vec<FieldLoopSeries>, Box<dyn Error>> {
    let mut all = Vec::with_capacity(setup.resolutions.len());
    for &resolution in &setup.resolutions {
        let dir = run_dir(paths, resolution);
        let n = setup.num_outputs();

        let mut times = Vec::with_capacity(n);
        let mut b_squared_avg = Vec::with_capacity(n);
        let mut divergence = Vec::with_capacity(n);

        for index in 0..n {
            let snap = Snapshot::load(&snapshot_path(&dir, index))?;
            let centered = center_magnetic_fields(&snap);
            times.push(snap.time);
            b_squared_avg.push(mean_square_magnetic(&centered));
            divergence.push(max_abs_divergence(&snap));
        }
        normalize_to_first(&mut b_squared_avg);

        all.push(FieldLoopSeries {
            resolution,
            times,
            b_squared_avg,
            divergence,
        });
        info!("reduced N={resolution}");
    }
    Ok(all)
}

/// Mid-plane magnetic-energy slices at t = 0 and t = 1, sharing one colour
/// scale so the advected loop can be compared directly.
fn save_slice_figure(paths: &AnalysisPaths, setup: &FieldLoopSetup) -> Result<(), Box<dyn Error>> {
    let resolution = setup.resolutions.last().copied().unwrap_or(256);
    let dir = run_dir(paths, resolution);
    let mid_index = (1.0 / setup.outstep).round() as usize;

    let mut panels: Vec<(String, PlaneSlice)> = Vec::new();
    for (index, label) in [(0usize, "t = 0.0"), (mid_index, "t = 1.0")] {
        let snap = Snapshot::load(&snapshot_path(&dir, index))?;
        let centered = center_magnetic_fields(&snap);
        let velocity = compute_velocities(&snap);
        let derived = compute_derived_quantities(snap.gamma, &snap, &centered, &velocity);
        panels.push((
            label.to_string(),
            derived.magnetic_energy.slice_y(snap.grid.ny / 2),
        ));
    }

    let shared_max = panels
        .iter()
        .map(|(_, slice)| slice.max())
        .fold(f64::NEG_INFINITY, f64::max);

    save_slice_grid(
        &panels,
        panels.len(),
        Some(shared_max),
        &paths.figure("afl_slices.png"),
    )
}
