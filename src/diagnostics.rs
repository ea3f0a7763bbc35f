// src/diagnostics.rs
//
// Scalar reducers over snapshots and derived fields. Everything here is a
// stateless pure function; the drivers string them into series.

use serde::{Deserialize, Serialize};

use crate::derived::CenteredMagnetic;
use crate::scalar_field::ScalarField3D;
use crate::snapshot::{FieldId, Snapshot};

/// Mean of Bx² + By² + Bz² over all cells, from the centered components.
pub fn mean_square_magnetic(magnetic: &CenteredMagnetic) -> f64 {
    debug_assert_eq!(magnetic.x.dims(), magnetic.y.dims());
    debug_assert_eq!(magnetic.x.dims(), magnetic.z.dims());

    let mut sum = 0.0;
    for ((bx, by), bz) in magnetic
        .x
        .data
        .iter()
        .zip(&magnetic.y.data)
        .zip(&magnetic.z.data)
    {
        sum += bx * bx + by * by + bz * bz;
    }
    sum / magnetic.x.len() as f64
}

/// Maximum |∇·B| over the grid, from one-sided differences of the raw
/// face-centered components along their own axes. The difference array is
/// one sample shorter along each differenced axis, so boundary cells drop
/// out without any extrapolation.
pub fn max_abs_divergence(snap: &Snapshot) -> f64 {
    let g = &snap.grid;
    let bx = &snap.magnetic_x;
    let by = &snap.magnetic_y;
    let bz = &snap.magnetic_z;
    debug_assert_eq!(bx.dims(), (g.nx + 1, g.ny, g.nz));
    debug_assert_eq!(by.dims(), (g.nx, g.ny + 1, g.nz));
    debug_assert_eq!(bz.dims(), (g.nx, g.ny, g.nz + 1));

    let mut max = 0.0_f64;
    for i in 0..g.nx {
        for j in 0..g.ny {
            for k in 0..g.nz {
                let div = (bx.get(i + 1, j, k) - bx.get(i, j, k)) / g.dx
                    + (by.get(i, j + 1, k) - by.get(i, j, k)) / g.dy
                    + (bz.get(i, j, k + 1) - bz.get(i, j, k)) / g.dz;
                max = max.max(div.abs());
            }
        }
    }
    max
}

/// Mean absolute difference between two fields of the same shape.
/// Empty fields yield NaN rather than an error.
pub fn l1_error(a: &ScalarField3D, b: &ScalarField3D) -> f64 {
    debug_assert_eq!(a.dims(), b.dims());
    let sum: f64 = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(x, y)| (x - y).abs())
        .sum();
    sum / a.len() as f64
}

/// Convergence norm between two snapshots of the same run: per field the
/// L1 error, squared, summed over the eight conserved fields, square root.
/// Identical snapshots give exactly 0.0.
pub fn l2_error_norm(a: &Snapshot, b: &Snapshot) -> f64 {
    let mut sum = 0.0;
    for id in FieldId::ALL {
        let l1 = l1_error(a.field(id), b.field(id));
        sum += l1 * l1;
    }
    sum.sqrt()
}

/// Divide a series through by its first element, turning it into a decay
/// curve relative to the initial instant. A leading zero produces
/// non-finite entries; an empty series is left alone.
pub fn normalize_to_first(series: &mut [f64]) {
    if let Some(&first) = series.first() {
        for v in series.iter_mut() {
            *v /= first;
        }
    }
}

/// Per-resolution diagnostic series for the advecting field loop, persisted
/// between the data and figure phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldLoopSeries {
    pub resolution: usize,
    pub times: Vec<f64>,
    pub b_squared_avg: Vec<f64>,
    pub divergence: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::center_magnetic_fields;
    use crate::grid::Grid3D;
    use crate::scalar_field::ScalarField3D;

    /// Uniform snapshot: ρ = 1, v = 0, Bx = 1 on all faces, By = Bz = 0.
    fn uniform_snapshot(n: usize) -> Snapshot {
        let mut density = ScalarField3D::zeros(n, n, n);
        for v in density.data.iter_mut() {
            *v = 1.0;
        }
        let mut magnetic_x = ScalarField3D::zeros(n + 1, n, n);
        for v in magnetic_x.data.iter_mut() {
            *v = 1.0;
        }
        let mut energy = ScalarField3D::zeros(n, n, n);
        for v in energy.data.iter_mut() {
            *v = 1.5;
        }

        Snapshot {
            grid: Grid3D::new(n, n, n, 1.0 / n as f64, 1.0 / n as f64, 1.0 / n as f64),
            gamma: 5.0 / 3.0,
            time: 0.0,
            density,
            momentum_x: ScalarField3D::zeros(n, n, n),
            momentum_y: ScalarField3D::zeros(n, n, n),
            momentum_z: ScalarField3D::zeros(n, n, n),
            magnetic_x,
            magnetic_y: ScalarField3D::zeros(n, n + 1, n),
            magnetic_z: ScalarField3D::zeros(n, n, n + 1),
            energy,
        }
    }

    #[test]
    fn uniform_field_has_zero_divergence() {
        let snap = uniform_snapshot(4);
        assert!(max_abs_divergence(&snap).abs() < 1e-14);
    }

    #[test]
    fn uniform_field_mean_square_is_one() {
        let snap = uniform_snapshot(4);
        let centered = center_magnetic_fields(&snap);
        assert!((mean_square_magnetic(&centered) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn identical_snapshots_have_exactly_zero_norm() {
        let snap = uniform_snapshot(4);
        assert_eq!(l2_error_norm(&snap, &snap), 0.0);
    }

    #[test]
    fn l2_norm_picks_up_a_single_field_difference() {
        let a = uniform_snapshot(4);
        let mut b = uniform_snapshot(4);
        // Shift every density sample by 0.5: the L1 error is 0.5, and it is
        // the only contribution, so the norm is exactly that.
        for v in b.density.data.iter_mut() {
            *v += 0.5;
        }
        assert!((l2_error_norm(&a, &b) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn series_normalisation_is_relative_to_the_first_entry() {
        let mut series = vec![4.0, 2.0, 1.0];
        normalize_to_first(&mut series);
        assert_eq!(series, vec![1.0, 0.5, 0.25]);

        // Empty series: nothing to do, nothing to panic about
        let mut empty: Vec<f64> = Vec::new();
        normalize_to_first(&mut empty);
        assert!(empty.is_empty());
    }
}
