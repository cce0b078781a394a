//! Learned post-processing of FBP reconstructions, seen from the outside.
//!
//! A correction model predicts a residual which is added to the initial
//! reconstruction: `x_result = x_0 + residual(x_0)`.

use std::path::{Path, PathBuf};

use crate::image::Image;
use crate::{Error, Result};

pub trait Correction {
    /// Predicted `x_true - x_0`. `is_training` selects training-mode
    /// behaviour in models that have one.
    fn residual(&self, x_0: &Image, is_training: bool) -> Result<Image>;
}

/// Predicts no correction at all, leaving the FBP reconstruction as it is
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroResidual;

impl Correction for ZeroResidual {
    fn residual(&self, x_0: &Image, _is_training: bool) -> Result<Image> {
        Ok(Image::zeros(x_0.space))
    }
}

/// `x_0` plus the residual predicted by `model`, in inference mode
pub fn correct<C: Correction + ?Sized>(model: &C, x_0: &Image) -> Result<Image> {
    let residual = model.residual(x_0, false)?;
    x_0.checked_add(&residual)
}

/// Path of the checkpoint `name` in `dir`, which must exist
pub fn locate_checkpoint(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if path.exists() { Ok(path) }
    else             { Err(Error::CheckpointNotFound(path)) }
}
