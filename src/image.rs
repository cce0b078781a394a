use ndarray::{Array2, Array3, ArrayView2, Axis};

use units::todo::Densityf32;
use geometry::Point;

use crate::space::{Index2, ReconstructionSpace};
use crate::{Error, Result};

pub type ImageData = Array2<Densityf32>;

/// Density sampled at the pixel centres of a `ReconstructionSpace`.
///
/// `data[[ix, iy]]`: axis 0 runs along x, axis 1 along y.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub space: ReconstructionSpace,
    pub data: ImageData,
}

impl Image {

    pub fn new(space: ReconstructionSpace, data: ImageData) -> Result<Self> {
        if data.dim() != space.shape() {
            return Err(Error::InvalidGeometry(format!(
                "image data has shape {:?}, reconstruction space needs {:?}",
                data.dim(), space.shape())));
        }
        Ok(Image { space, data })
    }

    pub fn zeros(space: ReconstructionSpace) -> Self {
        Self { data: Array2::zeros(space.shape()), space }
    }

    pub fn ones(space: ReconstructionSpace) -> Self {
        Self { data: Array2::ones(space.shape()), space }
    }

    /// Sample `f` at the centre of every pixel
    pub fn from_fn(space: ReconstructionSpace, f: impl Fn(Point) -> Densityf32) -> Self {
        let data = Array2::from_shape_fn(space.shape(), |(ix, iy)| f(space.pixel_centre([ix, iy])));
        Self { space, data }
    }

    pub fn mean(&self) -> Densityf32 {
        self.data.mean().unwrap_or(0.0)
    }

    /// Pixel-wise sum of two images in the same space
    pub fn checked_add(&self, other: &Image) -> Result<Image> {
        if self.space != other.space {
            return Err(Error::InvalidParameter(
                "cannot add images from different reconstruction spaces".into()));
        }
        Ok(Image { space: self.space, data: &self.data + &other.data })
    }

    /// `<self, other>` accumulated in double precision
    pub fn inner(&self, other: &Image) -> f64 {
        self.data.iter().zip(other.data.iter())
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum()
    }

    /// The image with a trailing channel axis: shape `(nx, ny, 1)`
    pub fn with_channel(&self) -> Array3<Densityf32> {
        self.data.clone().insert_axis(Axis(2))
    }

}

impl core::ops::Index<Index2> for Image {
    type Output = Densityf32;
    #[inline]
    fn index(&self, i: Index2) -> &Self::Output { &self.data[i] }
}

impl core::ops::IndexMut<Index2> for Image {
    #[inline]
    fn index_mut(&mut self, i: Index2) -> &mut Self::Output { &mut self.data[i] }
}

/// Rotate a 2D array by 90 degrees clockwise, as seen with axis 0 running
/// down the page. An `(a, b)` array becomes `(b, a)`, with
/// `out[[i, j]] == m[[a - 1 - j, i]]`.
pub fn rotate_clockwise<T: Copy>(m: ArrayView2<T>) -> Array2<T> {
    let (a, b) = m.dim();
    Array2::from_shape_fn((b, a), |(i, j)| m[[a - 1 - j, i]])
}
