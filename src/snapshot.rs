// src/snapshot.rs

use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::grid::Grid3D;
use crate::scalar_field::ScalarField3D;
use crate::snap::SnapFile;

/// The eight conserved quantities a snapshot must carry. Dataset name
/// lookup goes through this enum so a missing field surfaces as a typed
/// error instead of a stringly lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Density,
    MomentumX,
    MomentumY,
    MomentumZ,
    MagneticX,
    MagneticY,
    MagneticZ,
    Energy,
}

impl FieldId {
    pub const ALL: [FieldId; 8] = [
        FieldId::Density,
        FieldId::MomentumX,
        FieldId::MomentumY,
        FieldId::MomentumZ,
        FieldId::MagneticX,
        FieldId::MagneticY,
        FieldId::MagneticZ,
        FieldId::Energy,
    ];

    /// Dataset name inside the snapshot container. These names (including
    /// the capitalised `Energy`) are the solver's contract.
    pub fn dataset_name(self) -> &'static str {
        match self {
            FieldId::Density => "density",
            FieldId::MomentumX => "momentum_x",
            FieldId::MomentumY => "momentum_y",
            FieldId::MomentumZ => "momentum_z",
            FieldId::MagneticX => "magnetic_x",
            FieldId::MagneticY => "magnetic_y",
            FieldId::MagneticZ => "magnetic_z",
            FieldId::Energy => "Energy",
        }
    }
}

/// One simulation output instant: the raw conserved fields plus metadata.
///
/// Never mutated after loading. Derived quantities live in their own
/// structs (`CenteredMagnetic`, `Velocities`, `DerivedQuantities`) so the
/// raw inputs are never overwritten.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub grid: Grid3D,
    pub gamma: f64,
    pub time: f64,
    pub density: ScalarField3D,
    pub momentum_x: ScalarField3D,
    pub momentum_y: ScalarField3D,
    pub momentum_z: ScalarField3D,
    /// Face-centered: one sample longer along its own axis.
    pub magnetic_x: ScalarField3D,
    pub magnetic_y: ScalarField3D,
    pub magnetic_z: ScalarField3D,
    pub energy: ScalarField3D,
}

impl Snapshot {
    /// Load a snapshot from a container file. A missing file or missing
    /// dataset propagates as an error; there is no retry — the data must
    /// exist before analysis runs.
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = SnapFile::read(path)?;

        let mut take = |id: FieldId| -> Result<ScalarField3D> {
            file.datasets
                .remove(id.dataset_name())
                .ok_or_else(|| AnalysisError::MissingDataset {
                    path: path.to_path_buf(),
                    name: id.dataset_name().to_string(),
                })
        };

        let density = take(FieldId::Density)?;
        let momentum_x = take(FieldId::MomentumX)?;
        let momentum_y = take(FieldId::MomentumY)?;
        let momentum_z = take(FieldId::MomentumZ)?;
        let magnetic_x = take(FieldId::MagneticX)?;
        let magnetic_y = take(FieldId::MagneticY)?;
        let magnetic_z = take(FieldId::MagneticZ)?;
        let energy = take(FieldId::Energy)?;

        let [nx, ny, nz] = file.dims;
        let [dx, dy, dz] = file.spacing;

        Ok(Self {
            grid: Grid3D::new(nx, ny, nz, dx, dy, dz),
            gamma: file.gamma,
            time: file.time,
            density,
            momentum_x,
            momentum_y,
            momentum_z,
            magnetic_x,
            magnetic_y,
            magnetic_z,
            energy,
        })
    }

    pub fn field(&self, id: FieldId) -> &ScalarField3D {
        match id {
            FieldId::Density => &self.density,
            FieldId::MomentumX => &self.momentum_x,
            FieldId::MomentumY => &self.momentum_y,
            FieldId::MomentumZ => &self.momentum_z,
            FieldId::MagneticX => &self.magnetic_x,
            FieldId::MagneticY => &self.magnetic_y,
            FieldId::MagneticZ => &self.magnetic_z,
            FieldId::Energy => &self.energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_full_snapshot(path: &Path) {
        let mut snap = SnapFile::new([2, 2, 2], 5.0 / 3.0, 0.5, [0.5, 0.5, 0.5]);
        for id in FieldId::ALL {
            let field = match id {
                FieldId::MagneticX => ScalarField3D::zeros(3, 2, 2),
                FieldId::MagneticY => ScalarField3D::zeros(2, 3, 2),
                FieldId::MagneticZ => ScalarField3D::zeros(2, 2, 3),
                _ => ScalarField3D::zeros(2, 2, 2),
            };
            snap.insert(id.dataset_name(), field);
        }
        snap.write(path).expect("write snapshot");
    }

    #[test]
    fn loads_all_eight_fields_and_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("1.snap");
        write_full_snapshot(&path);

        let snap = Snapshot::load(&path).expect("load");
        assert_eq!(snap.grid.nx, 2);
        assert!((snap.gamma - 5.0 / 3.0).abs() < 1e-15);
        assert_eq!(snap.time, 0.5);
        assert_eq!(snap.magnetic_x.dims(), (3, 2, 2));
        for id in FieldId::ALL {
            assert!(!snap.field(id).is_empty());
        }
    }

    #[test]
    fn a_missing_dataset_is_a_typed_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("1.snap");

        let mut snap = SnapFile::new([2, 2, 2], 5.0 / 3.0, 0.5, [0.5, 0.5, 0.5]);
        snap.insert("density", ScalarField3D::zeros(2, 2, 2));
        snap.write(&path).expect("write");

        let err = Snapshot::load(&path).expect_err("should fail");
        match err {
            AnalysisError::MissingDataset { name, .. } => {
                assert_eq!(name, "momentum_x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn a_missing_file_propagates_the_io_error() {
        let err = Snapshot::load(Path::new("/nonexistent/42.snap")).expect_err("should fail");
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
