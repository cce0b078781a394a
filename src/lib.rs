pub mod error;
pub use error::{Error, Result};

pub use geometry::{Point, Vector};

pub mod space;
pub mod image;
pub mod acquisition;
pub mod sinogram;
pub mod projector;
pub mod noise;
pub mod io;
pub mod phantom;
pub mod loader;
pub mod pipeline;
pub mod correction;
pub mod fom;
pub mod config;
pub mod utils;
