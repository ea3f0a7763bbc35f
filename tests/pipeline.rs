// tests/pipeline.rs
//
// Integration-style tests: write a synthetic snapshot the way the solver
// would, then push it through the whole reduction pipeline.
// Run with: cargo test
// Or only these tests: cargo test --test pipeline

use std::path::Path;

use mhd_analysis::derived::{
    center_magnetic_fields, compute_derived_quantities, compute_velocities,
};
use mhd_analysis::diagnostics::{l2_error_norm, max_abs_divergence, mean_square_magnetic};
use mhd_analysis::links::LinkTable;
use mhd_analysis::scalar_field::ScalarField3D;
use mhd_analysis::snap::SnapFile;
use mhd_analysis::snapshot::{FieldId, Snapshot};

const GAMMA: f64 = 5.0 / 3.0;

fn constant_field(nx: usize, ny: usize, nz: usize, value: f64) -> ScalarField3D {
    let mut field = ScalarField3D::zeros(nx, ny, nz);
    for v in field.data.iter_mut() {
        *v = value;
    }
    field
}

/// 4×4×4 uniform snapshot: rho = 1, zero momentum, Bx = 1 on every x face,
/// By = Bz = 0, E = 1.5. With these values the magnetic energy is 0.5
/// everywhere and the gas pressure is (gamma - 1) * 1.0.
fn write_uniform_snapshot(path: &Path) {
    let n = 4;
    let dx = 1.0 / n as f64;
    let mut snap = SnapFile::new([n, n, n], GAMMA, 0.0, [dx, dx, dx]);

    snap.insert("density", constant_field(n, n, n, 1.0));
    snap.insert("momentum_x", constant_field(n, n, n, 0.0));
    snap.insert("momentum_y", constant_field(n, n, n, 0.0));
    snap.insert("momentum_z", constant_field(n, n, n, 0.0));
    snap.insert("magnetic_x", constant_field(n + 1, n, n, 1.0));
    snap.insert("magnetic_y", constant_field(n, n + 1, n, 0.0));
    snap.insert("magnetic_z", constant_field(n, n, n + 1, 0.0));
    snap.insert("Energy", constant_field(n, n, n, 1.5));

    snap.write(path).expect("write uniform snapshot");
}

#[test]
fn uniform_snapshot_reduces_to_the_textbook_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("0.snap");
    write_uniform_snapshot(&path);

    let snap = Snapshot::load(&path).expect("load");
    let centered = center_magnetic_fields(&snap);
    let velocity = compute_velocities(&snap);
    let derived = compute_derived_quantities(snap.gamma, &snap, &centered, &velocity);

    // Centered components live on the cell grid again
    assert_eq!(centered.x.dims(), (4, 4, 4));
    assert_eq!(centered.y.dims(), (4, 4, 4));
    assert_eq!(centered.z.dims(), (4, 4, 4));

    for idx in 0..derived.magnetic_energy.len() {
        assert!(
            (derived.magnetic_energy.data[idx] - 0.5).abs() < 1e-14,
            "magnetic energy should be 0.5 everywhere"
        );
        assert_eq!(derived.specific_kinetic.data[idx], 0.0);
        // p = (gamma - 1) * (E - 0 - 0.5) = (gamma - 1) * 1.0
        assert!((derived.gas_pressure.data[idx] - (GAMMA - 1.0)).abs() < 1e-14);
        assert_eq!(
            derived.total_pressure.data[idx],
            derived.gas_pressure.data[idx] + derived.magnetic_energy.data[idx]
        );
    }

    // A uniform field is divergence-free and its mean square is 1
    assert!(max_abs_divergence(&snap).abs() < 1e-13);
    assert!((mean_square_magnetic(&centered) - 1.0).abs() < 1e-14);
}

#[test]
fn pressure_derivation_round_trips_through_the_equation_of_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("0.snap");

    // Non-trivial snapshot: every field varies across the box
    let n = 4;
    let dx = 1.0 / n as f64;
    let mut file = SnapFile::new([n, n, n], GAMMA, 0.2, [dx, dx, dx]);
    for id in FieldId::ALL {
        let (fx, fy, fz) = match id {
            FieldId::MagneticX => (n + 1, n, n),
            FieldId::MagneticY => (n, n + 1, n),
            FieldId::MagneticZ => (n, n, n + 1),
            _ => (n, n, n),
        };
        let mut field = ScalarField3D::zeros(fx, fy, fz);
        for (idx, v) in field.data.iter_mut().enumerate() {
            *v = match id {
                FieldId::Density => 1.0 + 0.01 * idx as f64,
                FieldId::Energy => 20.0 + 0.1 * idx as f64,
                _ => 0.05 * (idx as f64).sin(),
            };
        }
        file.insert(id.dataset_name(), field);
    }
    file.write(&path).expect("write");

    let snap = Snapshot::load(&path).expect("load");
    let centered = center_magnetic_fields(&snap);
    let velocity = compute_velocities(&snap);
    let derived = compute_derived_quantities(snap.gamma, &snap, &centered, &velocity);

    for idx in 0..snap.energy.len() {
        let rebuilt = derived.gas_pressure.data[idx] / (snap.gamma - 1.0)
            + snap.density.data[idx] * derived.specific_kinetic.data[idx]
            + derived.magnetic_energy.data[idx];
        assert!(
            (rebuilt - snap.energy.data[idx]).abs() < 1e-12,
            "inverse equation of state should recover the energy field"
        );
    }
}

#[test]
fn identical_snapshots_give_a_zero_convergence_norm() {
    let dir = tempfile::tempdir().expect("tempdir");
    let initial = dir.path().join("0.snap");
    let advanced = dir.path().join("1.snap");
    write_uniform_snapshot(&initial);
    write_uniform_snapshot(&advanced);

    let a = Snapshot::load(&initial).expect("load initial");
    let b = Snapshot::load(&advanced).expect("load advanced");
    assert_eq!(l2_error_norm(&a, &b), 0.0);
}

#[test]
fn link_table_persists_across_processes_in_spirit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("links.bin");

    let mut table = LinkTable::default();
    table.set("a", "u1");
    table.save(&path).expect("save");

    // A fresh load sees the entry; unknown keys are a defined miss
    let table = LinkTable::load(&path).expect("load");
    assert_eq!(table.get("a"), Some("u1"));
    assert_eq!(table.get("missing_key"), None);
}
