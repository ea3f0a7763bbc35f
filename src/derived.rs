// src/derived.rs
//
// Pure elementwise transforms from raw conserved fields to the quantities
// the figures actually show. Nothing here mutates a Snapshot; every output
// is a fresh field.

use crate::scalar_field::ScalarField3D;
use crate::snapshot::Snapshot;

/// Cell-centered magnetic field components, produced by averaging the two
/// bounding face samples along each component's own axis.
#[derive(Debug, Clone)]
pub struct CenteredMagnetic {
    pub x: ScalarField3D,
    pub y: ScalarField3D,
    pub z: ScalarField3D,
}

/// Velocity components, momentum / density elementwise.
#[derive(Debug, Clone)]
pub struct Velocities {
    pub x: ScalarField3D,
    pub y: ScalarField3D,
    pub z: ScalarField3D,
}

/// The derived quantities of the ideal-gas MHD equation of state.
#[derive(Debug, Clone)]
pub struct DerivedQuantities {
    pub specific_kinetic: ScalarField3D,
    pub magnetic_energy: ScalarField3D,
    pub gas_pressure: ScalarField3D,
    pub total_pressure: ScalarField3D,
}

/// Average a face-centered field to cell centres along one axis.
/// The output is one sample shorter along that axis; other axes unchanged.
fn center_axis(field: &ScalarField3D, axis: usize) -> ScalarField3D {
    let off = [
        usize::from(axis == 0),
        usize::from(axis == 1),
        usize::from(axis == 2),
    ];
    let mut out = ScalarField3D::zeros(field.nx - off[0], field.ny - off[1], field.nz - off[2]);
    for i in 0..out.nx {
        for j in 0..out.ny {
            for k in 0..out.nz {
                let lo = field.get(i, j, k);
                let hi = field.get(i + off[0], j + off[1], k + off[2]);
                out.set(i, j, k, 0.5 * (lo + hi));
            }
        }
    }
    out
}

/// Convert the face-centered magnetic fields to cell-centered values so
/// they can be combined with density and energy.
pub fn center_magnetic_fields(snap: &Snapshot) -> CenteredMagnetic {
    CenteredMagnetic {
        x: center_axis(&snap.magnetic_x, 0),
        y: center_axis(&snap.magnetic_y, 1),
        z: center_axis(&snap.magnetic_z, 2),
    }
}

fn momentum_over_density(momentum: &ScalarField3D, density: &ScalarField3D) -> ScalarField3D {
    debug_assert_eq!(momentum.dims(), density.dims());
    let mut out = momentum.zeros_like();
    for ((v, m), rho) in out.data.iter_mut().zip(&momentum.data).zip(&density.data) {
        // Vacuum cells (rho == 0) yield non-finite velocities; that is a
        // known property of some setups and deliberately not guarded.
        *v = m / rho;
    }
    out
}

pub fn compute_velocities(snap: &Snapshot) -> Velocities {
    Velocities {
        x: momentum_over_density(&snap.momentum_x, &snap.density),
        y: momentum_over_density(&snap.momentum_y, &snap.density),
        z: momentum_over_density(&snap.momentum_z, &snap.density),
    }
}

/// Specific kinetic energy, magnetic energy, gas pressure and total
/// pressure from the centered fields:
///
///   e_kin = 0.5 (vx² + vy² + vz²)
///   e_mag = 0.5 (Bx² + By² + Bz²)
///   p_gas = (γ − 1) (E − ρ e_kin − e_mag)
///   p_tot = p_gas + e_mag
pub fn compute_derived_quantities(
    gamma: f64,
    snap: &Snapshot,
    magnetic: &CenteredMagnetic,
    velocity: &Velocities,
) -> DerivedQuantities {
    let rho = &snap.density;
    debug_assert_eq!(rho.dims(), magnetic.x.dims());
    debug_assert_eq!(rho.dims(), velocity.x.dims());
    debug_assert_eq!(rho.dims(), snap.energy.dims());

    let mut specific_kinetic = rho.zeros_like();
    let mut magnetic_energy = rho.zeros_like();
    let mut gas_pressure = rho.zeros_like();
    let mut total_pressure = rho.zeros_like();

    for idx in 0..rho.len() {
        let vx = velocity.x.data[idx];
        let vy = velocity.y.data[idx];
        let vz = velocity.z.data[idx];
        let bx = magnetic.x.data[idx];
        let by = magnetic.y.data[idx];
        let bz = magnetic.z.data[idx];

        let e_kin = 0.5 * (vx * vx + vy * vy + vz * vz);
        let e_mag = 0.5 * (bx * bx + by * by + bz * bz);
        let p_gas = (gamma - 1.0) * (snap.energy.data[idx] - rho.data[idx] * e_kin - e_mag);

        specific_kinetic.data[idx] = e_kin;
        magnetic_energy.data[idx] = e_mag;
        gas_pressure.data[idx] = p_gas;
        total_pressure.data[idx] = p_gas + e_mag;
    }

    DerivedQuantities {
        specific_kinetic,
        magnetic_energy,
        gas_pressure,
        total_pressure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid3D;

    /// Small non-uniform snapshot for exercising the transforms.
    fn sample_snapshot() -> Snapshot {
        let (nx, ny, nz) = (3, 3, 3);
        let mut density = ScalarField3D::zeros(nx, ny, nz);
        let mut momentum_x = ScalarField3D::zeros(nx, ny, nz);
        let mut momentum_y = ScalarField3D::zeros(nx, ny, nz);
        let mut momentum_z = ScalarField3D::zeros(nx, ny, nz);
        let mut energy = ScalarField3D::zeros(nx, ny, nz);
        for idx in 0..density.len() {
            let x = idx as f64;
            density.data[idx] = 1.0 + 0.1 * x;
            momentum_x.data[idx] = 0.3 * x;
            momentum_y.data[idx] = -0.2 * x;
            momentum_z.data[idx] = 0.05 * x;
            energy.data[idx] = 10.0 + 0.5 * x;
        }

        let mut magnetic_x = ScalarField3D::zeros(nx + 1, ny, nz);
        let mut magnetic_y = ScalarField3D::zeros(nx, ny + 1, nz);
        let mut magnetic_z = ScalarField3D::zeros(nx, ny, nz + 1);
        for idx in 0..magnetic_x.len() {
            magnetic_x.data[idx] = 0.02 * idx as f64;
        }
        for idx in 0..magnetic_y.len() {
            magnetic_y.data[idx] = -0.01 * idx as f64;
        }
        for idx in 0..magnetic_z.len() {
            magnetic_z.data[idx] = 0.015 * idx as f64;
        }

        Snapshot {
            grid: Grid3D::new(nx, ny, nz, 0.1, 0.1, 0.1),
            gamma: 5.0 / 3.0,
            time: 0.0,
            density,
            momentum_x,
            momentum_y,
            momentum_z,
            magnetic_x,
            magnetic_y,
            magnetic_z,
            energy,
        }
    }

    #[test]
    fn centering_shrinks_each_component_along_its_own_axis_only() {
        let snap = sample_snapshot();
        let centered = center_magnetic_fields(&snap);
        assert_eq!(centered.x.dims(), (3, 3, 3));
        assert_eq!(centered.y.dims(), (3, 3, 3));
        assert_eq!(centered.z.dims(), (3, 3, 3));

        // Centered value is the average of the two bounding faces
        let expected = 0.5 * (snap.magnetic_x.get(0, 1, 2) + snap.magnetic_x.get(1, 1, 2));
        assert!((centered.x.get(0, 1, 2) - expected).abs() < 1e-15);
    }

    #[test]
    fn velocities_are_momentum_over_density() {
        let snap = sample_snapshot();
        let vel = compute_velocities(&snap);
        let idx = 13;
        let expected = snap.momentum_x.data[idx] / snap.density.data[idx];
        assert!((vel.x.data[idx] - expected).abs() < 1e-15);
    }

    #[test]
    fn zero_density_yields_non_finite_velocity_not_a_panic() {
        let mut snap = sample_snapshot();
        snap.density.data[0] = 0.0;
        snap.momentum_x.data[0] = 1.0;
        let vel = compute_velocities(&snap);
        assert!(!vel.x.data[0].is_finite());
    }

    #[test]
    fn total_pressure_is_exactly_gas_plus_magnetic() {
        let snap = sample_snapshot();
        let centered = center_magnetic_fields(&snap);
        let vel = compute_velocities(&snap);
        let derived = compute_derived_quantities(snap.gamma, &snap, &centered, &vel);

        for idx in 0..derived.total_pressure.len() {
            // Same floating-point terms, so equality is exact
            assert_eq!(
                derived.total_pressure.data[idx],
                derived.gas_pressure.data[idx] + derived.magnetic_energy.data[idx]
            );
        }
    }

    #[test]
    fn pressure_derivation_inverts_back_to_energy() {
        let snap = sample_snapshot();
        let centered = center_magnetic_fields(&snap);
        let vel = compute_velocities(&snap);
        let derived = compute_derived_quantities(snap.gamma, &snap, &centered, &vel);

        // E = p / (γ − 1) + ρ e_kin + e_mag
        for idx in 0..snap.energy.len() {
            let rebuilt = derived.gas_pressure.data[idx] / (snap.gamma - 1.0)
                + snap.density.data[idx] * derived.specific_kinetic.data[idx]
                + derived.magnetic_energy.data[idx];
            assert!(
                (rebuilt - snap.energy.data[idx]).abs() < 1e-12,
                "energy not recovered at {idx}: {rebuilt} vs {}",
                snap.energy.data[idx]
            );
        }
    }
}
