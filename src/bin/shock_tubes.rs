// src/bin/shock_tubes.rs
//
// The five Riemann-problem shock tubes of the test suite. Each tube is one
// solver run driven entirely by command-line overrides on a blank parameter
// file, and one figure with the nine conserved/primitive profiles along the
// tube axis.

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
use mhd_analysis::runner::{kv, run_solver, snapshot_path, SolverConfig};
use mhd_analysis::snapshot::Snapshot;
use mhd_analysis::visualisation::save_profile_grid;

const SOURCE_PATH: &str = "src/bin/shock_tubes.rs";
const RECONSTRUCTOR: &str = "ppmc";

struct TubeSetup {
    name: &'static str,
    pretty: &'static str,
    overrides: Vec<String>,
}

/// One side of a Riemann initial condition as override tokens.
fn riemann_side(side: &str, rho: f64, v: [f64; 3], p: f64, b: [f64; 3]) -> Vec<String> {
    vec![
        kv(&format!("rho_{side}"), rho),
        kv(&format!("vx_{side}"), v[0]),
        kv(&format!("vy_{side}"), v[1]),
        kv(&format!("vz_{side}"), v[2]),
        kv(&format!("P_{side}"), p),
        kv(&format!("Bx_{side}"), b[0]),
        kv(&format!("By_{side}"), b[1]),
        kv(&format!("Bz_{side}"), b[2]),
    ]
}

fn riemann_overrides(
    gamma: f64,
    tout: f64,
    left: (f64, [f64; 3], f64, [f64; 3]),
    right: (f64, [f64; 3], f64, [f64; 3]),
) -> Vec<String> {
    let mut overrides = vec![
        kv("gamma", gamma),
        kv("tout", tout),
        kv("outstep", tout),
        kv("diaph", 0.5),
    ];
    overrides.extend(riemann_side("l", left.0, left.1, left.2, left.3));
    overrides.extend(riemann_side("r", right.0, right.1, right.2, right.3));
    overrides
}

fn tube_setups() -> Vec<TubeSetup> {
    // Several published setups quote B in units where a 1/sqrt(4 pi)
    // factor applies
    let coef = 1.0 / (4.0 * std::f64::consts::PI).sqrt();
    let gamma = 5.0 / 3.0;

    vec![
        TubeSetup {
            name: "b&w",
            pretty: "Brio & Wu",
            overrides: riemann_overrides(
                2.0,
                0.1,
                (1.0, [0.0; 3], 1.0, [0.75, 1.0, 0.0]),
                (0.128, [0.0; 3], 0.1, [0.75, -1.0, 0.0]),
            ),
        },
        TubeSetup {
            name: "d&w",
            pretty: "Dai & Woodward",
            overrides: riemann_overrides(
                gamma,
                0.2,
                (
                    1.08,
                    [1.2, 0.01, 0.5],
                    0.95,
                    [2.0 * coef, 3.6 * coef, 2.0 * coef],
                ),
                (
                    1.0,
                    [0.0; 3],
                    1.0,
                    [2.0 * coef, 4.0 * coef, 2.0 * coef],
                ),
            ),
        },
        TubeSetup {
            name: "einfeldt",
            pretty: "Einfeldt Strong Rarefaction",
            overrides: riemann_overrides(
                1.4,
                0.16,
                (1.0, [-2.0, 0.0, 0.0], 0.45, [0.0, 0.5, 0.0]),
                (1.0, [2.0, 0.0, 0.0], 0.45, [0.0, 0.5, 0.0]),
            ),
        },
        TubeSetup {
            name: "rj1a",
            pretty: "Ryu & Jones 1a",
            overrides: riemann_overrides(
                gamma,
                0.08,
                (1.0, [10.0, 0.0, 0.0], 20.0, [5.0 * coef, 5.0 * coef, 0.0]),
                (1.0, [-10.0, 0.0, 0.0], 1.0, [5.0 * coef, 5.0 * coef, 0.0]),
            ),
        },
        TubeSetup {
            name: "rj4d",
            pretty: "Ryu & Jones 4d",
            overrides: riemann_overrides(
                gamma,
                0.16,
                (1.0, [0.0; 3], 1.0, [0.7, 0.0, 0.0]),
                (0.3, [0.0, 0.0, 1.0], 0.2, [0.7, 1.0, 0.0]),
            ),
        },
    ]
}

/// Domain and boundary settings shared by every tube.
fn common_overrides() -> Vec<String> {
    let mut overrides = vec![
        kv("nx", 512),
        kv("ny", 16),
        kv("nz", 16),
        kv("init", "Riemann"),
        kv("xmin", 0.0),
        kv("ymin", 0.0),
        kv("zmin", 0.0),
        kv("xlen", 1.0),
        kv("ylen", 1.0),
        kv("zlen", 1.0),
    ];
    for boundary in ["xl", "xu", "yl", "yu", "zl", "zu"] {
        overrides.push(kv(&format!("{boundary}_bcnd"), 3));
    }
    overrides
}

#[derive(Parser)]
#[command(about = "Shock tubes: run the solver and render the profile figures")]
struct Args {
    /// Directory holding the solver, parameter files and data
    #[arg(short = 'p', long)]
    in_path: Option<PathBuf>,

    /// Directory the figures are written to
    #[arg(short = 'o', long)]
    out_path: Option<PathBuf>,

    /// Run the solver for the selected tubes
    #[arg(short = 'r', long)]
    run_solver: bool,

    /// Render the figures for the selected tubes
    #[arg(short = 'f', long)]
    figure: bool,

    /// Tubes to run and/or plot: b&w, d&w, rj1a, rj4d, einfeldt, or all
    #[arg(short = 't', long, default_values_t = vec!["all".to_string()])]
    tube: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let start = Instant::now();

    let args = Args::parse();
    let paths = AnalysisPaths::resolve(args.in_path.clone(), args.out_path.clone());

    let mut tubes = tube_setups();
    if args.tube != ["all"] {
        for requested in &args.tube {
            if !tubes.iter().any(|t| t.name == requested.as_str()) {
                return Err(format!("unsupported value \"{requested}\" given as a shock tube").into());
            }
        }
        tubes.retain(|t| args.tube.iter().any(|r| r.as_str() == t.name));
    }

    for tube in &tubes {
        let run_dir = paths.data_dir("shock_tubes").join(tube.name);

        if args.run_solver {
            let config = SolverConfig::new(
                paths.solver_exe(RECONSTRUCTOR),
                paths.param_file("riemann.txt"),
            )
            .with_overrides(common_overrides())
            .with_overrides(tube.overrides.clone());
            run_solver(&config, &run_dir)?;
            info!("finished {} run", tube.name);
        }

        if args.figure {
            save_tube_figure(&paths, tube, &run_dir)?;
            update_plot_entry(&paths.link_table(), tube.name, SOURCE_PATH)?;
        }
    }

    info!("done in {:.2?}", start.elapsed());
    Ok(())
}

fn save_tube_figure(
    paths: &AnalysisPaths,
    tube: &TubeSetup,
    run_dir: &std::path::Path,
) -> Result<(), Box<dyn Error>> {
    let snap = Snapshot::load(&snapshot_path(run_dir, 1))?;
    let centered = center_magnetic_fields(&snap);
    let velocity = compute_velocities(&snap);
    let derived = compute_derived_quantities(snap.gamma, &snap, &centered, &velocity);

    // Profiles along x through the middle of the tube
    let j = snap.grid.ny / 2;
    let k = snap.grid.nz / 2;
    let x: Vec<f64> = (0..snap.grid.nx).map(|i| snap.grid.x_center(i)).collect();

    let panels = vec![
        ("Density".to_string(), snap.density.line_x(j, k)),
        ("Pressure".to_string(), derived.gas_pressure.line_x(j, k)),
        ("Energy".to_string(), snap.energy.line_x(j, k)),
        ("X-Velocity".to_string(), velocity.x.line_x(j, k)),
        ("Y-Velocity".to_string(), velocity.y.line_x(j, k)),
        ("Z-Velocity".to_string(), velocity.z.line_x(j, k)),
        ("X-Magnetic Field".to_string(), centered.x.line_x(j, k)),
        ("Y-Magnetic Field".to_string(), centered.y.line_x(j, k)),
        ("Z-Magnetic Field".to_string(), centered.z.line_x(j, k)),
    ];

    let figure_name = format!("{}.png", tube.name);
    save_profile_grid(tube.pretty, &x, &panels, &paths.figure(&figure_name))
}
