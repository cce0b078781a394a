//! Filtered back-projection for a fan beam with a flat detector.
//!
//! Detector coordinates are rescaled onto a virtual detector through the
//! rotation centre, `s = u R / (R + R_det)`, where the equally-spaced fan-beam
//! reconstruction formula applies:
//!
//! ```text
//! f(x) = ½ Δβ Σ_β q(β, s'(x)) / U(x, β)²
//!
//!     U  = (R + x·d(β)) / R
//!     s' = R (x·e(β)) / (R + x·d(β))
//!     q  = ramp ⊛ (R / √(R² + s²)) p
//! ```

use ndarray::{Array2, Zip};

use units::todo::{Lengthf32, Ratiof32};

use crate::acquisition::FanFlatGeometry;
use crate::image::Image;
use crate::projector::{filter::{FilterKind, RampFilter}, Operator};
use crate::sinogram::Sinogram;
use crate::space::ReconstructionSpace;
use crate::{Error, Result};

#[derive(Debug)]
pub struct Fbp {
    space: ReconstructionSpace,
    geometry: FanFlatGeometry,
    filter: RampFilter,
    // Virtual detector position of bin 0 and the virtual bin spacing
    s_first: Lengthf32,
    tau: Lengthf32,
    // Cosine pre-weight of each detector bin
    preweight: Vec<Ratiof32>,
    // (sin β, cos β) of every projection angle
    trig: Vec<(f32, f32)>,
}

impl Fbp {

    pub fn new(
        space: ReconstructionSpace,
        geometry: FanFlatGeometry,
        kind: FilterKind,
        frequency_scaling: f32,
    ) -> Result<Self> {
        if geometry.src_radius <= space.radius() {
            return Err(Error::InvalidGeometry(format!(
                "source radius {} mm lies within the reconstruction space", geometry.src_radius)));
        }
        let r = geometry.src_radius;
        let to_virtual = 1.0 / geometry.magnification();
        let tau = geometry.detector.cell_size() * to_virtual;
        let filter = RampFilter::new(kind, frequency_scaling, geometry.detector.len(), tau)?;
        let preweight = geometry.detector.points()
            .map(|u| u * to_virtual)
            .map(|s| r / (r * r + s * s).sqrt())
            .collect();
        let trig = geometry.angles.points()
            .map(f32::sin_cos)
            .collect();
        let s_first = geometry.detector.point(0) * to_virtual;
        Ok(Self { space, geometry, filter, s_first, tau, preweight, trig })
    }

    pub fn filter_kind(&self) -> FilterKind { self.filter.kind() }

    /// Pre-weighted, ramp-filtered projections
    pub fn filtered(&self, sinogram: &Sinogram) -> Array2<f32> {
        let mut q = Array2::zeros(sinogram.data.dim());
        Zip::from(q.rows_mut())
            .and(sinogram.data.rows())
            .par_for_each(|mut out, p| {
                let weighted: Vec<f32> = p.iter().zip(&self.preweight)
                    .map(|(&p, &w)| p * w)
                    .collect();
                let mut filtered = vec![0.0; weighted.len()];
                self.filter.apply(&weighted, &mut filtered);
                out.iter_mut().zip(filtered).for_each(|(o, f)| *o = f);
            });
        q
    }

    fn backproject(&self, q: &Array2<f32>) -> Image {
        let r = self.geometry.src_radius;
        let last = (self.geometry.detector.len() - 1) as f32;
        let n_det = self.geometry.detector.len();
        let scale = 0.5 * self.geometry.angles.cell_size();
        let mut data = Array2::zeros(self.space.shape());

        Zip::indexed(&mut data)
            .par_for_each(|(ix, iy), value| {
                let p = self.space.pixel_centre([ix, iy]);
                let mut sum = 0.0;
                for (i, &(sin, cos)) in self.trig.iter().enumerate() {
                    // d(β) = (-sin β, cos β),  e(β) = (cos β, sin β)
                    let along = r - p.x * sin + p.y * cos;
                    let across = p.x * cos + p.y * sin;
                    let t = (r * across / along - self.s_first) / self.tau;
                    if !(0.0..=last).contains(&t) { continue }
                    let k = t.floor() as usize;
                    let w = t - k as f32;
                    let interpolated = if k + 1 < n_det {
                        q[[i, k]] * (1.0 - w) + q[[i, k + 1]] * w
                    } else {
                        q[[i, k]]
                    };
                    let u = along / r;
                    sum += interpolated / (u * u);
                }
                *value = sum * scale;
            });
        Image { space: self.space, data }
    }
}

impl Operator for Fbp {
    type Domain = Sinogram;
    type Range = Image;

    fn apply(&self, sinogram: &Sinogram) -> Image {
        self.backproject(&self.filtered(sinogram))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::UniformPartition;
    use crate::projector::RayTransform;
    use units::mm;

    fn operators(n: usize, kind: FilterKind, scaling: f32) -> (RayTransform, Fbp) {
        let space = ReconstructionSpace::new((mm(-128.0), mm(-128.0)), (mm(128.0), mm(128.0)), (n, n)).unwrap();
        let angles = UniformPartition::new(0.0, std::f32::consts::TAU, 360).unwrap();
        let detector = UniformPartition::new(-360.0, 360.0, 256).unwrap();
        let geometry = FanFlatGeometry::new(angles, detector, 500.0, 500.0).unwrap();
        let forward = RayTransform::new(space, geometry).unwrap();
        let fbp = forward.pseudo_inverse(kind, scaling).unwrap();
        (forward, fbp)
    }

    fn blob(space: ReconstructionSpace) -> Image {
        Image::from_fn(space, |p| {
            let (x, y) = (p.x - 20.0, p.y + 10.0);
            (-(x * x + y * y) / (2.0 * 40.0 * 40.0)).exp()
        })
    }

    fn mse(a: &Image, b: &Image) -> f32 {
        (&a.data - &b.data).mapv(|d| d * d).mean().unwrap()
    }

    #[test]
    fn reconstructs_smooth_image() {
        let (forward, fbp) = operators(64, FilterKind::Hann, 0.45);
        let truth = blob(*forward.space());
        let reconstruction = fbp.apply(&forward.apply(&truth));
        let error = mse(&reconstruction, &truth);
        assert!(error < 1e-2, "MSE {error}");
        // pixel centred on (22, -10), next to the peak of the blob
        let peak = reconstruction[[37, 29]];
        assert!((peak - truth[[37, 29]]).abs() < 0.1, "peak {peak}");
    }

    #[test]
    fn every_filter_reconstructs() {
        for kind in FilterKind::ALL {
            let (forward, fbp) = operators(32, kind, 0.8);
            let truth = blob(*forward.space());
            let reconstruction = fbp.apply(&forward.apply(&truth));
            let error = mse(&reconstruction, &truth);
            assert!(error < 2e-2, "{kind}: MSE {error}");
        }
    }

    #[test]
    fn preserves_mean_of_uniform_square() {
        let (forward, fbp) = operators(64, FilterKind::Hann, 0.45);
        let truth = Image::ones(*forward.space());
        let reconstruction = fbp.apply(&forward.apply(&truth));
        let mean = reconstruction.mean();
        assert!((mean - 1.0).abs() < 0.05, "mean {mean}");
    }

    #[test]
    fn invalid_frequency_scaling() {
        let space = ReconstructionSpace::new((mm(-1.0), mm(-1.0)), (mm(1.0), mm(1.0)), (2, 2)).unwrap();
        let angles = UniformPartition::new(0.0, 1.0, 3).unwrap();
        let detector = UniformPartition::new(-5.0, 5.0, 4).unwrap();
        let geometry = FanFlatGeometry::new(angles, detector, 50.0, 50.0).unwrap();
        let forward = RayTransform::new(space, geometry).unwrap();
        assert!(matches!(forward.pseudo_inverse(FilterKind::Hann, 0.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(forward.pseudo_inverse(FilterKind::Hann, 1.5), Err(Error::InvalidParameter(_))));
    }
}
