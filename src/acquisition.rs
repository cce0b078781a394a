//! Fan-beam acquisition with a flat detector.
//!
//! At angle `β` the unit vector from the source towards the detector is
//! `d(β) = (-sin β, cos β)` and the detector axis is `e(β) = (cos β, sin β)`.
//! The source sits at `-R_src d(β)`; detector coordinate `u` lies at
//! `R_det d(β) + u e(β)`.

use std::f32::consts::TAU;

use units::mm_;
use units::todo::{Anglef32, Lengthf32, Ratiof32};
use geometry::{Point, Vector};

use crate::config::evaluate::GeometryConfig;
use crate::space::ReconstructionSpace;
use crate::{Error, Result};

/// `n` equal cells covering `[min, max)`, sampled at their midpoints
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformPartition {
    pub min: f32,
    pub max: f32,
    pub n: usize,
}

impl UniformPartition {

    pub fn new(min: f32, max: f32, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidGeometry("partition needs at least one cell".into()));
        }
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(Error::InvalidGeometry(format!("cannot partition [{min}, {max})")));
        }
        Ok(Self { min, max, n })
    }

    pub fn cell_size(&self) -> f32 { (self.max - self.min) / self.n as f32 }

    /// Midpoint of cell `i`
    pub fn point(&self, i: usize) -> f32 { self.min + (i as f32 + 0.5) * self.cell_size() }

    pub fn points(&self) -> impl Iterator<Item = f32> + '_ { (0..self.n).map(|i| self.point(i)) }

    pub fn len(&self) -> usize { self.n }

    pub fn is_empty(&self) -> bool { self.n == 0 }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FanFlatGeometry {
    pub angles: UniformPartition,
    pub detector: UniformPartition,
    pub src_radius: Lengthf32,
    pub det_radius: Lengthf32,
}

impl FanFlatGeometry {

    pub fn new(
        angles: UniformPartition,
        detector: UniformPartition,
        src_radius: Lengthf32,
        det_radius: Lengthf32,
    ) -> Result<Self> {
        if !(src_radius > 0.0 && det_radius > 0.0 && src_radius.is_finite() && det_radius.is_finite()) {
            return Err(Error::InvalidGeometry(format!(
                "source and detector radii must be positive, got {src_radius} mm and {det_radius} mm")));
        }
        Ok(Self { angles, detector, src_radius, det_radius })
    }

    /// Unit vectors `(d(β), e(β))`: towards the detector, and along it
    pub fn frame(angle: Anglef32) -> (Vector, Vector) {
        let (sin, cos) = angle.sin_cos();
        (Vector::new(-sin, cos), Vector::new(cos, sin))
    }

    pub fn source(&self, angle: Anglef32) -> Point {
        let (d, _) = Self::frame(angle);
        Point::origin() + d * -self.src_radius
    }

    pub fn detector_point(&self, angle: Anglef32, u: Lengthf32) -> Point {
        let (d, e) = Self::frame(angle);
        Point::origin() + d * self.det_radius + e * u
    }

    /// `(n_angles, n_detector)`
    pub fn sinogram_shape(&self) -> (usize, usize) { (self.angles.len(), self.detector.len()) }

    /// Ratio of source-detector to source-centre distance
    pub fn magnification(&self) -> Ratiof32 {
        (self.src_radius + self.det_radius) / self.src_radius
    }
}

/// Build the reconstruction space and acquisition geometry described by `config`
pub fn build_geometry(size: usize, config: &GeometryConfig) -> Result<(ReconstructionSpace, FanFlatGeometry)> {
    let space = ReconstructionSpace::new(config.min, config.max, (size, size))?;
    let angles = UniformPartition::new(0.0, TAU, config.angles)?;
    let d = &config.detector;
    let detector = UniformPartition::new(mm_(d.min), mm_(d.max), d.bins)?;
    let geometry = FanFlatGeometry::new(angles, detector, mm_(config.src_radius), mm_(config.det_radius))?;
    if geometry.src_radius <= space.radius() {
        return Err(Error::InvalidGeometry(format!(
            "source radius {} mm does not clear the reconstruction space (half-diagonal {} mm)",
            geometry.src_radius, space.radius())));
    }
    Ok((space, geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use units::mm;
    use crate::config::evaluate::DetectorConfig;

    #[test]
    fn angle_partition_samples_cell_midpoints() {
        let p = UniformPartition::new(0.0, TAU, 4).unwrap();
        let points: Vec<_> = p.points().collect();
        let q = std::f32::consts::FRAC_PI_4;
        assert_float_eq!(points, vec![q, 3.0 * q, 5.0 * q, 7.0 * q], rmax_all <= 1e-6);
        assert_float_eq!(p.cell_size(), 2.0 * q, rmax <= 1e-6);
    }

    #[test]
    fn default_detector_partition() {
        let p = UniformPartition::new(-360.0, 360.0, 1000).unwrap();
        assert_float_eq!(p.cell_size(), 0.72, rmax <= 1e-5);
        assert_float_eq!(p.point(0), -359.64, rmax <= 1e-5);
        assert_float_eq!(p.point(999), 359.64, rmax <= 1e-5);
    }

    #[test]
    fn positions_at_angle_zero() {
        let angles = UniformPartition::new(0.0, TAU, 1).unwrap();
        let detector = UniformPartition::new(-1.0, 1.0, 1).unwrap();
        let g = FanFlatGeometry::new(angles, detector, 500.0, 300.0).unwrap();
        assert_eq!(g.source(0.0), Point::new(0.0, -500.0));
        assert_eq!(g.detector_point(0.0, 0.0), Point::new(0.0, 300.0));
        assert_eq!(g.detector_point(0.0, 7.0), Point::new(7.0, 300.0));
        assert_float_eq!(g.magnification(), 1.6, ulps <= 1);
    }

    #[test]
    fn source_and_detector_rotate_together() {
        let angles = UniformPartition::new(0.0, TAU, 1).unwrap();
        let detector = UniformPartition::new(-1.0, 1.0, 1).unwrap();
        let g = FanFlatGeometry::new(angles, detector, 500.0, 500.0).unwrap();
        let beta = std::f32::consts::FRAC_PI_2;
        let s = g.source(beta);
        let p = g.detector_point(beta, 0.0);
        assert_float_eq!((s.x, s.y), ( 500.0, 0.0), abs <= (1e-4, 1e-4));
        assert_float_eq!((p.x, p.y), (-500.0, 0.0), abs <= (1e-4, 1e-4));
    }

    #[test]
    fn default_geometry() {
        let (space, geometry) = build_geometry(512, &GeometryConfig::default()).unwrap();
        assert_eq!(space.shape(), (512, 512));
        assert_eq!(geometry.sinogram_shape(), (1000, 1000));
        assert_eq!(geometry.src_radius, 500.0);
        assert_eq!(geometry.det_radius, 500.0);
    }

    fn with(f: impl Fn(&mut GeometryConfig)) -> GeometryConfig {
        let mut config = GeometryConfig::default();
        f(&mut config);
        config
    }

    #[rstest(/**/ size, config,
        case(0, GeometryConfig::default()),
        case(8, with(|c| c.angles = 0)),
        case(8, with(|c| c.detector = DetectorConfig { bins: 0, ..Default::default() })),
        case(8, with(|c| c.detector = DetectorConfig { bins: 10, min: mm(5.0), max: mm(5.0) })),
        case(8, with(|c| c.min = (mm(10.0), mm(-10.0)))),
        case(8, with(|c| c.src_radius = mm(0.0))),
        case(8, with(|c| c.det_radius = mm(-1.0))),
        // source inside the field of view
        case(8, with(|c| c.src_radius = mm(150.0))),
    )]
    fn invalid_geometry(size: usize, config: GeometryConfig) {
        let result = build_geometry(size, &config);
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
    }
}
