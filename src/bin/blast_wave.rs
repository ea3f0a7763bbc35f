// src/bin/blast_wave.rs
//
// MHD blast wave: a single high-pressure sphere in a magnetised medium.
// One solver run, one figure with density and magnetic-energy mid-plane
// slices of the final state.

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use mhd_analysis::config::AnalysisPaths;
use mhd_analysis::derived::{
    center_magnetic_fields, compute_derived_quantities, compute_velocities,
};
use mhd_analysis::links::update_plot_entry;
use mhd_analysis::runner::{run_solver, snapshot_path, SolverConfig};
use mhd_analysis::snapshot::Snapshot;
use mhd_analysis::visualisation::save_slice_grid;

const SOURCE_PATH: &str = "src/bin/blast_wave.rs";
const RECONSTRUCTOR: &str = "ppmc";

#[derive(Parser)]
#[command(about = "MHD blast wave: run the solver and render the slice figure")]
struct Args {
    /// Directory holding the solver, parameter files and data
    #[arg(short = 'p', long)]
    in_path: Option<PathBuf>,

    /// Directory the figures are written to
    #[arg(short = 'o', long)]
    out_path: Option<PathBuf>,

    /// Run the solver
    #[arg(short = 'r', long)]
    run_solver: bool,

    /// Render the figure
    #[arg(short = 'f', long)]
    figure: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let start = Instant::now();

    let args = Args::parse();
    let paths = AnalysisPaths::resolve(args.in_path.clone(), args.out_path.clone());
    let run_dir = paths.data_dir("mhd_blast");

    if args.run_solver {
        let config = SolverConfig::new(
            paths.solver_exe(RECONSTRUCTOR),
            paths.param_file("mhd_blast.txt"),
        );
        run_solver(&config, &run_dir)?;
    }

    if args.figure {
        let snap = Snapshot::load(&snapshot_path(&run_dir, 1))?;
        let centered = center_magnetic_fields(&snap);
        let velocity = compute_velocities(&snap);
        let derived = compute_derived_quantities(snap.gamma, &snap, &centered, &velocity);

        let k = snap.grid.nz / 2;
        let panels = vec![
            ("Density".to_string(), snap.density.slice_z(k)),
            (
                "Magnetic Energy".to_string(),
                derived.magnetic_energy.slice_z(k),
            ),
        ];
        save_slice_grid(&panels, 2, None, &paths.figure("mhd-blast.png"))?;
        update_plot_entry(&paths.link_table(), "mhd-blast", SOURCE_PATH)?;
    }

    info!("done in {:.2?}", start.elapsed());
    Ok(())
}
