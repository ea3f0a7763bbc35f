// src/snap.rs
//
// Reader/writer for the solver's snapshot container format.
// A snapshot file is self-describing: a text header carrying the scalar
// attributes (dims, gamma, t, dx), followed by one named binary8 block per
// dataset. Binary8 blocks are little-endian f64 and start with the check
// value 123456789012345.0 so an endianness mismatch fails loudly.
//
// The solver produces these files; the analysis side only reads them. The
// writer exists for tests and for generating synthetic inputs.

use std::collections::BTreeMap;
use std::fs::{self, create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::scalar_field::ScalarField3D;

pub const SNAP_MAGIC: &str = "# MHD Snap 1.0";

/// Binary8 check value (little endian).
const BINARY8_CHECK: f64 = 123_456_789_012_345.0;

/// A parsed snapshot container: scalar attributes plus named datasets.
/// Dataset names and attribute keys are the solver's contract
/// (`density`, `momentum_x/y/z`, `magnetic_x/y/z`, `Energy`;
/// `dims`, `gamma`, `t`, `dx`).
#[derive(Debug, Clone)]
pub struct SnapFile {
    pub dims: [usize; 3],
    pub gamma: f64,
    pub time: f64,
    pub spacing: [f64; 3],
    pub datasets: BTreeMap<String, ScalarField3D>,
}

impl SnapFile {
    pub fn new(dims: [usize; 3], gamma: f64, time: f64, spacing: [f64; 3]) -> Self {
        Self {
            dims,
            gamma,
            time,
            spacing,
            datasets: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, field: ScalarField3D) {
        self.datasets.insert(name.to_string(), field);
    }

    pub fn dataset(&self, name: &str) -> Option<&ScalarField3D> {
        self.datasets.get(name)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let mut pos = 0usize;

        let magic = take_line(path, &bytes, &mut pos)?;
        if magic != SNAP_MAGIC {
            return Err(malformed(path, "bad magic line, not a snapshot file"));
        }

        let mut dims: Option<[usize; 3]> = None;
        let mut gamma: Option<f64> = None;
        let mut time: Option<f64> = None;
        let mut spacing: Option<[f64; 3]> = None;
        let mut n_fields: Option<usize> = None;
        let mut datasets = BTreeMap::new();

        loop {
            let line = take_line(path, &bytes, &mut pos)?.to_string();
            if line == "# End: File" {
                break;
            }

            if let Some(rest) = line.strip_prefix("# Begin: Data Binary 8: ") {
                let (name, field) = read_block(path, rest, &bytes, &mut pos)?;
                datasets.insert(name, field);
            } else if let Some(v) = attr(&line, "dims") {
                dims = Some(parse_triple_usize(path, v)?);
            } else if let Some(v) = attr(&line, "gamma") {
                gamma = Some(parse_f64(path, v)?);
            } else if let Some(v) = attr(&line, "t") {
                time = Some(parse_f64(path, v)?);
            } else if let Some(v) = attr(&line, "dx") {
                spacing = Some(parse_triple_f64(path, v)?);
            } else if let Some(v) = attr(&line, "fields") {
                n_fields = Some(parse_usize(path, v)?);
            }
            // Unknown header lines are skipped so newer solver output
            // still loads.
        }

        if let Some(expected) = n_fields {
            if datasets.len() != expected {
                return Err(malformed(
                    path,
                    format!(
                        "field count mismatch: header says {}, found {}",
                        expected,
                        datasets.len()
                    ),
                ));
            }
        }

        Ok(Self {
            dims: dims.ok_or_else(|| malformed(path, "missing 'dims' attribute"))?,
            gamma: gamma.ok_or_else(|| malformed(path, "missing 'gamma' attribute"))?,
            time: time.ok_or_else(|| malformed(path, "missing 't' attribute"))?,
            spacing: spacing.ok_or_else(|| malformed(path, "missing 'dx' attribute"))?,
            datasets,
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        writeln!(w, "{}", SNAP_MAGIC)?;
        writeln!(w, "# dims: {} {} {}", self.dims[0], self.dims[1], self.dims[2])?;
        writeln!(w, "# gamma: {:.17e}", self.gamma)?;
        writeln!(w, "# t: {:.17e}", self.time)?;
        writeln!(
            w,
            "# dx: {:.17e} {:.17e} {:.17e}",
            self.spacing[0], self.spacing[1], self.spacing[2]
        )?;
        writeln!(w, "# fields: {}", self.datasets.len())?;

        for (name, field) in &self.datasets {
            writeln!(
                w,
                "# Begin: Data Binary 8: {} {} {} {}",
                name, field.nx, field.ny, field.nz
            )?;
            w.write_all(&BINARY8_CHECK.to_le_bytes())?;
            for v in &field.data {
                w.write_all(&v.to_le_bytes())?;
            }
            writeln!(w)?;
            writeln!(w, "# End: Data Binary 8")?;
        }

        writeln!(w, "# End: File")?;
        w.flush()?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(())
}

fn malformed(path: &Path, message: impl Into<String>) -> AnalysisError {
    AnalysisError::MalformedSnapshot {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Pull the next text line (without its newline) off the byte cursor.
fn take_line<'a>(path: &Path, bytes: &'a [u8], pos: &mut usize) -> Result<&'a str> {
    if *pos >= bytes.len() {
        return Err(malformed(path, "unexpected end of file"));
    }
    let end = bytes[*pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| *pos + p)
        .unwrap_or(bytes.len());
    let line = std::str::from_utf8(&bytes[*pos..end])
        .map_err(|_| malformed(path, "non-UTF-8 header line"))?;
    *pos = (end + 1).min(bytes.len());
    Ok(line.trim_end_matches('\r'))
}

fn read_f64(path: &Path, bytes: &[u8], pos: &mut usize) -> Result<f64> {
    let end = *pos + 8;
    if end > bytes.len() {
        return Err(malformed(path, "truncated binary block"));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[*pos..end]);
    *pos = end;
    Ok(f64::from_le_bytes(buf))
}

fn read_block(
    path: &Path,
    begin_rest: &str,
    bytes: &[u8],
    pos: &mut usize,
) -> Result<(String, ScalarField3D)> {
    let mut it = begin_rest.split_whitespace();
    let name = it
        .next()
        .ok_or_else(|| malformed(path, "dataset block without a name"))?
        .to_string();
    let mut dim = |axis: &str| -> Result<usize> {
        it.next()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| malformed(path, format!("dataset '{}': bad {} count", name, axis)))
    };
    let nx = dim("x")?;
    let ny = dim("y")?;
    let nz = dim("z")?;

    let check = read_f64(path, bytes, pos)?;
    if check != BINARY8_CHECK {
        return Err(malformed(
            path,
            format!("dataset '{}': binary check value mismatch", name),
        ));
    }

    let n = nx * ny * nz;
    let mut data = Vec::with_capacity(n);
    for _ in 0..n {
        data.push(read_f64(path, bytes, pos)?);
    }

    // The writer puts a newline after the payload, then the end marker.
    let mut line = take_line(path, bytes, pos)?;
    if line.is_empty() {
        line = take_line(path, bytes, pos)?;
    }
    if line != "# End: Data Binary 8" {
        return Err(malformed(
            path,
            format!("dataset '{}': missing end marker", name),
        ));
    }

    Ok((name, ScalarField3D::from_vec(nx, ny, nz, data)))
}

fn attr<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix("# ")?
        .strip_prefix(key)?
        .strip_prefix(':')
        .map(str::trim)
}

fn parse_f64(path: &Path, v: &str) -> Result<f64> {
    v.parse::<f64>()
        .map_err(|_| malformed(path, format!("bad float attribute value '{}'", v)))
}

fn parse_usize(path: &Path, v: &str) -> Result<usize> {
    v.parse::<usize>()
        .map_err(|_| malformed(path, format!("bad integer attribute value '{}'", v)))
}

fn parse_triple_usize(path: &Path, v: &str) -> Result<[usize; 3]> {
    let parts: Vec<usize> = v
        .split_whitespace()
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| malformed(path, format!("bad triple '{}'", v)))?;
    if parts.len() != 3 {
        return Err(malformed(path, format!("expected three values in '{}'", v)));
    }
    Ok([parts[0], parts[1], parts[2]])
}

fn parse_triple_f64(path: &Path, v: &str) -> Result<[f64; 3]> {
    let parts: Vec<f64> = v
        .split_whitespace()
        .map(|s| s.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| malformed(path, format!("bad triple '{}'", v)))?;
    if parts.len() != 3 {
        return Err(malformed(path, format!("expected three values in '{}'", v)));
    }
    Ok([parts[0], parts[1], parts[2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_datasets_survive_a_write_read_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("0.snap");

        let mut snap = SnapFile::new([2, 2, 2], 5.0 / 3.0, 0.25, [0.5, 0.5, 0.5]);
        snap.insert(
            "density",
            ScalarField3D::from_vec(2, 2, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
        );
        // Staggered dataset: longer along x
        snap.insert("magnetic_x", ScalarField3D::zeros(3, 2, 2));
        snap.write(&path).expect("write");

        let back = SnapFile::read(&path).expect("read");
        assert_eq!(back.dims, [2, 2, 2]);
        assert_eq!(back.time, 0.25);
        assert_eq!(back.spacing, [0.5, 0.5, 0.5]);
        let rho = back.dataset("density").expect("density present");
        assert_eq!(rho.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let bx = back.dataset("magnetic_x").expect("magnetic_x present");
        assert_eq!(bx.dims(), (3, 2, 2));
    }

    #[test]
    fn a_non_snapshot_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("junk.snap");
        std::fs::write(&path, b"not a snapshot\n").expect("write junk");

        let err = SnapFile::read(&path).expect_err("should fail");
        assert!(matches!(
            err,
            AnalysisError::MalformedSnapshot { .. }
        ));
    }
}
