//! The extent and granularity of the 2D grid in which images are reconstructed

use units::{Length, mm_};
use units::todo::Lengthf32;
use geometry::{Point, Vector};

use crate::{Error, Result};

pub type Index2 = [usize; 2];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconstructionSpace {
    pub min: Point,
    pub max: Point,
    pub n: Index2,
    pub pixel_size: Vector,
}

impl ReconstructionSpace {

    pub fn new(
        (x_min, y_min): (Length, Length),
        (x_max, y_max): (Length, Length),
        (nx, ny): (usize, usize),
    ) -> Result<Self> {
        let min = Point::new(mm_(x_min), mm_(y_min));
        let max = Point::new(mm_(x_max), mm_(y_max));
        if nx == 0 || ny == 0 {
            return Err(Error::InvalidGeometry(format!("reconstruction grid must have pixels, got {nx} x {ny}")));
        }
        // `!(a < b)` also rejects NaN
        if !(min.x < max.x && min.y < max.y) {
            return Err(Error::InvalidGeometry(format!("empty reconstruction extent {min:?} .. {max:?}")));
        }
        let n = [nx, ny];
        let pixel_size = Self::pixel_size(n, max - min);
        Ok(Self { min, max, n, pixel_size })
    }

    fn pixel_size(n: Index2, full_width: Vector) -> Vector {
        Vector::new(full_width[0] / n[0] as f32,
                    full_width[1] / n[1] as f32,
        )
    }

    /// Array shape of images in this space: `(nx, ny)`
    pub fn shape(&self) -> (usize, usize) { (self.n[0], self.n[1]) }

    pub fn n_pixels(&self) -> usize { self.n[0] * self.n[1] }

    pub fn centre(&self) -> Point { self.min + (self.max - self.min) * 0.5 }

    pub fn half_width(&self) -> Vector { (self.max - self.min) * 0.5 }

    /// Distance from the origin of the corner furthest away from it
    pub fn radius(&self) -> Lengthf32 {
        let [x, y] = [self.min.x.abs().max(self.max.x.abs()),
                      self.min.y.abs().max(self.max.y.abs())];
        x.hypot(y)
    }

    /// Find centre of pixel with given 2D index
    pub fn pixel_centre(&self, [ix, iy]: Index2) -> Point {
        let s = self.pixel_size;
        Point::new(self.min.x + (ix as Lengthf32 + 0.5) * s.x,
                   self.min.y + (iy as Lengthf32 + 0.5) * s.y)
    }

    /// Distances along the segment `p1 -> p2` at which it enters and leaves
    /// the space. `None` if the segment misses the space (or merely grazes it).
    pub fn chord(&self, p1: Point, p2: Point) -> Option<(Lengthf32, Lengthf32)> {
        box_chord(p1, p2, self.min, self.max)
    }

    /// The point at which the segment `p1 -> p2` enters the space
    pub fn entry(&self, p1: Point, p2: Point) -> Option<Point> {
        self.chord(p1, p2)
            .map(|(t_in, _)| p1 + (p2 - p1).normalize() * t_in)
    }

}

/// Slab intersection of the segment `p1 -> p2` with the axis-aligned box
/// `[lo, hi]`.
pub(crate) fn box_chord(p1: Point, p2: Point, lo: Point, hi: Point) -> Option<(Lengthf32, Lengthf32)> {
    let length = (p2 - p1).norm();
    let direction = (p2 - p1).normalize();
    let mut t_in: Lengthf32 = 0.0;
    let mut t_out = length;
    for d in 0..2 {
        if direction[d] == 0.0 {
            if p1[d] < lo[d] || p1[d] > hi[d] { return None }
        } else {
            let a = (lo[d] - p1[d]) / direction[d];
            let b = (hi[d] - p1[d]) / direction[d];
            t_in  = t_in .max(a.min(b));
            t_out = t_out.min(a.max(b));
        }
    }
    if t_in < t_out { Some((t_in, t_out)) } else { None }
}
