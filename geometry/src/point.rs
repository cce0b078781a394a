use std::ops::{Add, AddAssign, Index, IndexMut, Neg, Sub};
use units::todo::Lengthf32;
use crate::Vector;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: Lengthf32,
    pub y: Lengthf32,
}

impl Point {
    pub fn new(x: Lengthf32, y: Lengthf32) -> Self { Self { x, y } }
    pub fn origin() -> Self { Self::new(0.0, 0.0) }

    /// Position vector of this point, relative to the origin
    pub fn coords(self) -> Vector { Vector::new(self.x, self.y) }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Add<Vector> for Point {
    type Output = Self;
    fn add(self, rhs: Vector) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign<Vector> for Point {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Neg for Point {
    type Output = Self;
    fn neg(self) -> Self::Output { Self::new(-self.x, -self.y) }
}

impl Index<usize> for Point {
    type Output = Lengthf32;
    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("index {index} is out of bounds [0,1]")
        }
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => panic!("index {index} is out of bounds [0,1]")
        }
    }
}
