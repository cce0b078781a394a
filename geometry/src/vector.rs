use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};
use units::todo::{Lengthf32, Ratiof32};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector {
    pub x: Lengthf32,
    pub y: Lengthf32,
}

pub trait Dot<RHS = Self> {
    type Output;
    fn dot(self, other: RHS) -> Self::Output;
}

impl Dot for Vector {
    type Output = Lengthf32;
    fn dot(self, other: Self) -> Self::Output { self.x * other.x + self.y * other.y }
}

impl Vector {

    pub fn new(x: Lengthf32, y: Lengthf32) -> Self { Self { x, y } }

    pub fn repeat(v: Lengthf32) -> Self { Self::new(v, v) }

    pub fn norm(self) -> Lengthf32 { self.x.hypot(self.y) }

    pub fn magnitude(self) -> Lengthf32 { self.norm() }

    /// Unit vector in the same direction. The zero vector has no direction: its
    /// normalization contains NaNs.
    pub fn normalize(self) -> Self {
        let n = self.norm();
        Self::new(self.x / n, self.y / n)
    }

    pub fn component_div(self, other: Self) -> Self { Self::new(self.x / other.x, self.y / other.y) }
    pub fn component_mul(self, other: Self) -> Self { Self::new(self.x * other.x, self.y * other.y) }

    pub fn map(self, f: impl Fn(Lengthf32) -> Lengthf32) -> Self { Self::new(f(self.x), f(self.y)) }

    /// The dimension with the smallest component, and that component's value.
    /// Ties go to the lower dimension.
    pub fn argmin(self) -> (usize, Lengthf32) {
        if self.y < self.x { (1, self.y) }
        else               { (0, self.x) }
    }

}

impl Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output { Self::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output { Self::new(self.x - rhs.x, self.y - rhs.y) }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self::Output { Self::new(-self.x, -self.y) }
}

impl Mul<Ratiof32> for Vector {
    type Output = Self;
    fn mul(self, rhs: Ratiof32) -> Self::Output {
        Vector {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Index<usize> for Vector {
    type Output = Lengthf32;
    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("index {index} is out of bounds [0,1]")
        }
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => panic!("index {index} is out of bounds [0,1]")
        }
    }
}
