//! Headerless little-endian `f32` files, row-major

use std::fs::File;
use std::io::{Write, Read, BufWriter, BufReader};
use std::path::Path;

use ndarray::Array2;

use crate::{Error, Result};

pub fn write(data: impl Iterator<Item = f32>, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(&datum.to_le_bytes())?;
    }
    buf.flush()
}

type IORes<T> = std::io::Result<T>;
pub fn read<'a>(path: &Path) -> IORes<impl Iterator<Item = IORes<f32>> + 'a> {
    let file = File::open(path)?;
    let mut buf = BufReader::new(file);
    let mut buffer = [0; 4];

    Ok(std::iter::from_fn(move || {
        use std::io::ErrorKind::UnexpectedEof;
        match buf.read_exact(&mut buffer) {
            Ok(()) => Some(Ok(f32::from_le_bytes(buffer))),
            Err(e) if e.kind() == UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }))
}

/// Read a whole raw file, which must contain exactly `shape.0 * shape.1` values
pub fn read_array(path: &Path, shape: (usize, usize)) -> Result<Array2<f32>> {
    let values: Vec<f32> = read(path)
        .and_then(|values| values.collect())
        .map_err(|e| Error::data_load(path, e))?;
    let found = values.len();
    Array2::from_shape_vec(shape, values)
        .map_err(|_| Error::data_load(path, format!(
            "found {found} values, expected {} x {}", shape.0, shape.1)))
}
