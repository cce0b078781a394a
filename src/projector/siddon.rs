//! Exact pixel intersection lengths of a ray through a `ReconstructionSpace`.
//!
//! Two tricks keep the traversal simple:
//!
//! 1. Pixel dimensions are measured in units of distance along the ray, so the
//!    distance to the next pixel boundary in either dimension is a single
//!    subtraction away.
//!
//! 2. Axes along which the ray runs backwards are mirrored, so traversal only
//!    ever steps in the positive direction. Indices are mirrored back before
//!    being handed out.

use units::todo::Lengthf32;
use geometry::{Point, Vector};

use crate::space::{box_chord, Index2, ReconstructionSpace};

/// Entry points closer than this (in pixel units) to a boundary are snapped onto it
const EPS: f32 = 1e-5;

/// Iterator over the pixels crossed by a ray segment, yielding each pixel's
/// index together with the length of ray inside it.
pub enum WeightsAlongRay {

    // Missed the space, or finished crossing it
    Outside,

    Inside {
        // Ray distance remaining to the next boundary, per dimension
        to_boundary: Vector,

        n_pixels: Index2,

        // Pixel dimensions in ray distance units; INFINITY when the ray never
        // crosses boundaries in that dimension
        pixel_size: Vector,

        // Index in the mirrored frame of the pixel being crossed
        index: Index2,

        flipped: [bool; 2],

        // Ray distance left before the segment ends or leaves the space
        remaining: Lengthf32,
    }
}

impl WeightsAlongRay {

    pub fn new(p1: Point, p2: Point, space: &ReconstructionSpace) -> Self {
        // Centre the space on the origin, so that mirroring keeps it in place
        let shift = -space.centre().coords();
        let mut p1 = p1 + shift;
        let mut p2 = p2 + shift;
        let half = space.half_width();

        let original_direction = p2 - p1;
        let mut flipped = [false; 2];
        for d in 0..2 {
            if original_direction[d] < 0.0 {
                p1[d] = -p1[d];
                p2[d] = -p2[d];
                flipped[d] = true;
            }
        }

        let lo = Point::origin() + -half;
        let hi = Point::origin() +  half;
        let (t_in, t_out) = match box_chord(p1, p2, lo, hi) {
            None => return Self::Outside,
            Some(chord) => chord,
        };

        let direction = (p2 - p1).normalize();
        let entry_point = p1 + direction * t_in;

        // Entry point in pixel coordinates, lower corner of the space at zero
        let entry = (entry_point - lo)
            .component_div(space.pixel_size)
            .map(|x| if x.abs() < EPS { 0.0 } else { x });

        let n_pixels = space.n;
        let clamp = |x: f32, n: usize| (x.floor().max(0.0) as usize).min(n - 1);
        let index = [clamp(entry[0], n_pixels[0]),
                     clamp(entry[1], n_pixels[1])];

        let pixel_size = Vector::new(
            along_ray(space.pixel_size[0], direction[0]),
            along_ray(space.pixel_size[1], direction[1]),
        );

        // What is left of the current pixel, per dimension, in ray units
        let left_of_pixel = |d: usize| {
            if pixel_size[d].is_infinite() { return f32::INFINITY }
            let done = (entry[d] - index[d] as f32).clamp(0.0, 1.0);
            (1.0 - done) * pixel_size[d]
        };
        let to_boundary = Vector::new(left_of_pixel(0), left_of_pixel(1));

        Self::Inside { to_boundary, n_pixels, pixel_size, index, flipped, remaining: t_out - t_in }
    }
}

fn along_ray(size: Lengthf32, direction_component: f32) -> Lengthf32 {
    if direction_component > 0.0 { size / direction_component } else { f32::INFINITY }
}

impl Iterator for WeightsAlongRay {

    type Item = (Index2, Lengthf32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (true_index, distance, finished) = match self {
                Self::Outside => return None,

                Self::Inside { to_boundary, n_pixels, pixel_size, index, flipped, remaining } => {
                    let mut true_index = *index;
                    for d in 0..2 {
                        if flipped[d] { true_index[d] = n_pixels[d] - 1 - index[d] }
                    }

                    let (_, distance) = to_boundary.argmin();
                    let distance = distance.min(*remaining);
                    *remaining -= distance;
                    *to_boundary = *to_boundary - Vector::repeat(distance);

                    let mut finished = *remaining <= 0.0;
                    for d in 0..2 {
                        if to_boundary[d] <= 0.0 {
                            to_boundary[d] = pixel_size[d];
                            index[d] += 1;
                            if index[d] >= n_pixels[d] { finished = true }
                        }
                    }
                    (true_index, distance, finished)
                }
            };

            if finished { *self = Self::Outside }

            // Crossing a corner exactly gives zero-length steps
            if distance > 0.0 { return Some((true_index, distance)) }
        }
    }
}
