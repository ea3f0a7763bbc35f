// src/scalar_field.rs

/// One scalar quantity sampled on a 3D structured mesh.
///
/// Magnetic field components are face-centered and therefore one sample
/// longer along their own axis than the cell-centered quantities, so each
/// field carries its own sample counts rather than borrowing them from
/// `Grid3D`. Storage is row-major with k fastest, matching the on-disk
/// layout of the solver's snapshot files.
#[derive(Debug, Clone)]
pub struct ScalarField3D {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub data: Vec<f64>,
}

/// A 2D slice pulled out of a `ScalarField3D`, used as plot input.
/// `nx`/`ny` are the in-plane sample counts of the slice itself.
#[derive(Debug, Clone)]
pub struct PlaneSlice {
    pub nx: usize,
    pub ny: usize,
    pub data: Vec<f64>,
}

impl ScalarField3D {
    /// Create a zero-filled field with the given sample counts.
    pub fn zeros(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            nx,
            ny,
            nz,
            data: vec![0.0; nx * ny * nz],
        }
    }

    /// Create a field from existing samples. The length must match.
    pub fn from_vec(nx: usize, ny: usize, nz: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            nx * ny * nz,
            "sample count mismatch: got {}, expected {}",
            data.len(),
            nx * ny * nz
        );
        Self { nx, ny, nz, data }
    }

    /// Zero-filled field with the same sample counts as `self`.
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.nx, self.ny, self.nz)
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert (i, j, k) indices to a flat index into `data`.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        (i * self.ny + j) * self.nz + k
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.idx(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let idx = self.idx(i, j, k);
        self.data[idx] = value;
    }

    /// Mean over all samples. An empty field yields NaN, not an error.
    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// The x–y plane at height index k.
    pub fn slice_z(&self, k: usize) -> PlaneSlice {
        let mut data = Vec::with_capacity(self.nx * self.ny);
        for i in 0..self.nx {
            for j in 0..self.ny {
                data.push(self.get(i, j, k));
            }
        }
        PlaneSlice {
            nx: self.nx,
            ny: self.ny,
            data,
        }
    }

    /// The x–z plane at row index j.
    pub fn slice_y(&self, j: usize) -> PlaneSlice {
        let mut data = Vec::with_capacity(self.nx * self.nz);
        for i in 0..self.nx {
            for k in 0..self.nz {
                data.push(self.get(i, j, k));
            }
        }
        PlaneSlice {
            nx: self.nx,
            ny: self.nz,
            data,
        }
    }

    /// The 1D profile along x through (j, k).
    pub fn line_x(&self, j: usize, k: usize) -> Vec<f64> {
        (0..self.nx).map(|i| self.get(i, j, k)).collect()
    }
}

impl PlaneSlice {
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nx && j < self.ny);
        self.data[i * self.ny + j]
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_consistent() {
        let mut f = ScalarField3D::zeros(4, 3, 2);
        // Check a few indices by hand: k fastest, then j, then i
        assert_eq!(f.idx(0, 0, 0), 0);
        assert_eq!(f.idx(0, 0, 1), 1);
        assert_eq!(f.idx(0, 1, 0), 2);
        assert_eq!(f.idx(1, 0, 0), 6);
        assert_eq!(f.idx(3, 2, 1), 23);

        f.set(2, 1, 0, 7.5);
        assert_eq!(f.get(2, 1, 0), 7.5);
        assert_eq!(f.len(), 24);
    }

    #[test]
    fn slices_and_profiles_have_expected_shapes() {
        let mut f = ScalarField3D::zeros(4, 3, 2);
        for i in 0..4 {
            for j in 0..3 {
                for k in 0..2 {
                    f.set(i, j, k, (i * 100 + j * 10 + k) as f64);
                }
            }
        }

        let xy = f.slice_z(1);
        assert_eq!((xy.nx, xy.ny), (4, 3));
        assert_eq!(xy.get(2, 1), 211.0);

        let xz = f.slice_y(2);
        assert_eq!((xz.nx, xz.ny), (4, 2));
        assert_eq!(xz.get(3, 0), 320.0);

        let line = f.line_x(1, 1);
        assert_eq!(line, vec![11.0, 111.0, 211.0, 311.0]);
    }

    #[test]
    fn mean_of_empty_field_is_nan() {
        let f = ScalarField3D::zeros(0, 3, 2);
        assert!(f.mean().is_nan());
    }
}
