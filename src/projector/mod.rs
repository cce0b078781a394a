//! The ray transform of the fan-beam scanner, its adjoint and its
//! pseudo-inverse (filtered back-projection).
//!
//! All three are explicit operator objects built once from a
//! `ReconstructionSpace` and a `FanFlatGeometry`, and applied any number of
//! times through the `Operator` trait.

pub mod siddon;
pub mod filter;
pub mod fbp;

pub use siddon::WeightsAlongRay;
pub use filter::{FilterKind, RampFilter};
pub use fbp::Fbp;

use ndarray::{Array1, Array2, Zip};
use rayon::prelude::*;

use units::todo::{Anglef32, Lengthf32};
use geometry::Point;

use crate::acquisition::FanFlatGeometry;
use crate::image::Image;
use crate::sinogram::Sinogram;
use crate::space::ReconstructionSpace;
use crate::{Error, Result};

/// A map between two discretized function spaces
pub trait Operator {
    type Domain;
    type Range;
    fn apply(&self, x: &Self::Domain) -> Self::Range;
}

/// Number of angles whose back-projections are accumulated into one partial
/// image by the adjoint
const ANGLES_PER_JOB: usize = 16;

/// Line integrals of an `Image` along every source-to-detector-bin ray
#[derive(Clone, Debug)]
pub struct RayTransform {
    space: ReconstructionSpace,
    geometry: FanFlatGeometry,
    // Far enough along any ray to be beyond the space
    reach: Lengthf32,
}

impl RayTransform {

    pub fn new(space: ReconstructionSpace, geometry: FanFlatGeometry) -> Result<Self> {
        if geometry.src_radius <= space.radius() {
            return Err(Error::InvalidGeometry(format!(
                "source radius {} mm lies within the reconstruction space", geometry.src_radius)));
        }
        let reach = 2.0 * (geometry.src_radius + space.radius());
        Ok(Self { space, geometry, reach })
    }

    pub fn space   (&self) -> &ReconstructionSpace { &self.space    }
    pub fn geometry(&self) -> &FanFlatGeometry     { &self.geometry }

    /// End points of the ray from the source at `angle` through detector bin `bin`
    ///
    /// The segment is the whole line through the space, wherever the detector
    /// happens to be.
    pub fn ray(&self, angle: Anglef32, bin: usize) -> (Point, Point) {
        let source = self.geometry.source(angle);
        let target = self.geometry.detector_point(angle, self.geometry.detector.point(bin));
        let direction = (target - source).normalize();
        (source, source + direction * self.reach)
    }

    fn angles(&self) -> Array1<Anglef32> {
        self.geometry.angles.points().collect()
    }

    pub fn adjoint(&self) -> RayTransformAdjoint {
        RayTransformAdjoint { forward: self.clone() }
    }

    /// Filtered back-projection for this scanner
    pub fn pseudo_inverse(&self, filter: FilterKind, frequency_scaling: f32) -> Result<Fbp> {
        Fbp::new(self.space, self.geometry, filter, frequency_scaling)
    }
}

impl Operator for RayTransform {
    type Domain = Image;
    type Range = Sinogram;

    fn apply(&self, image: &Image) -> Sinogram {
        let mut data = Array2::zeros(self.geometry.sinogram_shape());
        // Every ray is traced independently, so the result is the same
        // whatever the thread count.
        Zip::from(data.rows_mut())
            .and(&self.angles())
            .par_for_each(|mut row, &angle| {
                for (bin, value) in row.iter_mut().enumerate() {
                    let (p1, p2) = self.ray(angle, bin);
                    *value = WeightsAlongRay::new(p1, p2, &self.space)
                        .map(|(index, weight)| weight * image.data[index])
                        .sum();
                }
            });
        Sinogram { data }
    }
}

/// Exact transpose of the discrete `RayTransform`: every sinogram value is
/// smeared back along its ray, weighted by the ray's length in each pixel.
#[derive(Clone, Debug)]
pub struct RayTransformAdjoint {
    forward: RayTransform,
}

impl Operator for RayTransformAdjoint {
    type Domain = Sinogram;
    type Range = Image;

    fn apply(&self, sinogram: &Sinogram) -> Image {
        let forward = &self.forward;
        let angles = forward.angles();
        let n_angles = angles.len();
        let job_starts: Vec<usize> = (0..n_angles).step_by(ANGLES_PER_JOB).collect();

        // Partial images are summed in job order, independently of which
        // thread produced them.
        let partials: Vec<Array2<f32>> = job_starts
            .par_iter()
            .map(|&start| {
                let mut partial = Array2::zeros(forward.space.shape());
                for i in start..(start + ANGLES_PER_JOB).min(n_angles) {
                    for (bin, &value) in sinogram.data.row(i).iter().enumerate() {
                        if value == 0.0 { continue }
                        let (p1, p2) = forward.ray(angles[i], bin);
                        for (index, weight) in WeightsAlongRay::new(p1, p2, &forward.space) {
                            partial[index] += weight * value;
                        }
                    }
                }
                partial
            })
            .collect();

        let mut data = Array2::zeros(forward.space.shape());
        for partial in &partials { data += partial; }
        Image { space: forward.space, data }
    }
}

/// Build the forward operator for the given space and scanner
pub fn build_forward_operator(space: ReconstructionSpace, geometry: FanFlatGeometry) -> Result<RayTransform> {
    RayTransform::new(space, geometry)
}

/// Build the filtered back-projection matching `forward`
pub fn build_pseudoinverse(forward: &RayTransform, filter: FilterKind, frequency_scaling: f32) -> Result<Fbp> {
    forward.pseudo_inverse(filter, frequency_scaling)
}
