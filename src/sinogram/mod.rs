use ndarray::{Array2, ArrayView1};

use crate::acquisition::FanFlatGeometry;
use crate::{Error, Result};

/// Line integrals indexed by `[angle, detector bin]`
#[derive(Clone, Debug, PartialEq)]
pub struct Sinogram {
    pub data: Array2<f32>,
}

impl Sinogram {

    pub fn new(geometry: &FanFlatGeometry, data: Array2<f32>) -> Result<Self> {
        if data.dim() != geometry.sinogram_shape() {
            return Err(Error::InvalidGeometry(format!(
                "sinogram data has shape {:?}, acquisition geometry needs {:?}",
                data.dim(), geometry.sinogram_shape())));
        }
        Ok(Self { data })
    }

    pub fn zeros(geometry: &FanFlatGeometry) -> Self {
        Self { data: Array2::zeros(geometry.sinogram_shape()) }
    }

    pub fn n_angles  (&self) -> usize { self.data.nrows() }
    pub fn n_detector(&self) -> usize { self.data.ncols() }

    /// Projection recorded at angle number `i`
    pub fn projection(&self, i: usize) -> ArrayView1<f32> { self.data.row(i) }

    /// `<self, other>` accumulated in double precision
    pub fn inner(&self, other: &Sinogram) -> f64 {
        self.data.iter().zip(other.data.iter())
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::UniformPartition;
    use ndarray::array;

    fn geometry(n_angles: usize, n_bins: usize) -> FanFlatGeometry {
        let angles = UniformPartition::new(0.0, std::f32::consts::TAU, n_angles).unwrap();
        let detector = UniformPartition::new(-10.0, 10.0, n_bins).unwrap();
        FanFlatGeometry::new(angles, detector, 50.0, 50.0).unwrap()
    }

    #[test]
    fn shape_follows_geometry() {
        let g = geometry(3, 2);
        let s = Sinogram::zeros(&g);
        assert_eq!((s.n_angles(), s.n_detector()), (3, 2));
        assert!(matches!(Sinogram::new(&g, Array2::zeros((2, 3))), Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn projections_are_rows() {
        let s = Sinogram::new(&geometry(2, 3), array![[1.0, 2.0, 3.0],
                                                      [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(s.projection(1), array![4.0, 5.0, 6.0]);
        assert_eq!(s.inner(&s), 91.0);
    }
}
