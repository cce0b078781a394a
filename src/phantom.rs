//! Ground-truth images read from disk

use std::path::Path;

use crate::image::{rotate_clockwise, Image};
use crate::space::ReconstructionSpace;
use crate::{io, Error, Result};

/// Load the phantom stored at `path` as an element of `space`.
///
/// Stored slices are rotated a quarter turn clockwise into the orientation of
/// the reconstruction, then divided by `density_scale`.
pub fn load_phantom(path: &Path, space: &ReconstructionSpace, density_scale: f32) -> Result<Image> {
    let (nx, ny) = space.shape();
    // Rotation swaps the axes, so stored data must be (ny, nx)
    let stored = io::read_array(path, (ny, nx))?;
    if stored.dim() != (ny, nx) {
        return Err(Error::data_load(path, format!(
            "phantom has shape {:?}, reconstruction space needs {:?}", stored.dim(), (ny, nx))));
    }
    let data = rotate_clockwise(stored.view()) / density_scale;
    Image::new(*space, data)
}

pub(crate) fn check_density_scale(density_scale: f32) -> Result<()> {
    if density_scale.is_finite() && density_scale != 0.0 { Ok(()) }
    else {
        Err(Error::InvalidParameter(format!("density scale must be finite and non-zero, got {density_scale}")))
    }
}
