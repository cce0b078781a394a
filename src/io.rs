//! Reading and writing 2D `f32` arrays: phantoms in, results out

pub mod raw;

use std::path::Path;

use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};

use crate::{Error, Result};

/// On-disk formats understood for 2D arrays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format { Npy, Raw }

impl Format {
    /// Deduce format from file extension
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "npy" => Some(Self::Npy),
            "raw" => Some(Self::Raw),
            _     => None,
        }
    }
}

/// Read a 2D array from `path`. Raw files carry no shape, so `raw_shape` says
/// how to arrange their values; `.npy` files must hold 2D `f32` data.
pub fn read_array(path: &Path, raw_shape: (usize, usize)) -> Result<Array2<f32>> {
    match Format::of(path) {
        Some(Format::Npy) => read_npy(path).map_err(|e| Error::data_load(path, e)),
        Some(Format::Raw) => raw::read_array(path, raw_shape),
        None => Err(Error::data_load(path, "unrecognized file extension (expected .npy or .raw)")),
    }
}

/// Write `data` to `<stem>.npy` and `<stem>.raw` inside `directory`
pub fn write_array(data: &Array2<f32>, directory: &Path, stem: &str) -> Result<()> {
    std::fs::create_dir_all(directory)?;
    write_npy(directory.join(format!("{stem}.npy")), data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    raw::write(data.iter().copied(), &directory.join(format!("{stem}.raw")))?;
    Ok(())
}
