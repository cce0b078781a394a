//! Turning phantoms into `(x_0, x_true)` pairs: forward projection, noise and
//! filtered back-projection.

use std::path::Path;

use ndarray::{s, Array3, Array4, ArrayView3};
use rand::Rng;

use crate::acquisition::build_geometry;
use crate::config::evaluate::Config;
use crate::image::Image;
use crate::loader::PhantomLoader;
use crate::noise::PoissonNoise;
use crate::phantom::{check_density_scale, load_phantom};
use crate::projector::{Fbp, Operator, RayTransform};
use crate::space::ReconstructionSpace;
use crate::{Error, Result};

/// FBP reconstruction of noisy data, and the phantom it was simulated from
#[derive(Clone, Debug, PartialEq)]
pub struct SamplePair {
    pub x_0: Image,
    pub x_true: Image,
}

impl SamplePair {
    /// Both images with a trailing channel axis, `(nx, ny, 1)`
    pub fn channels(&self) -> (Array3<f32>, Array3<f32>) {
        (self.x_0.with_channel(), self.x_true.with_channel())
    }
}

/// `n` sample pairs stacked as `(n, nx, ny, 1)` arrays
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub x_0: Array4<f32>,
    pub x_true: Array4<f32>,
}

impl Batch {
    fn zeros(n: usize, (nx, ny): (usize, usize)) -> Self {
        Self { x_0: Array4::zeros((n, nx, ny, 1)), x_true: Array4::zeros((n, nx, ny, 1)) }
    }

    pub fn len(&self) -> usize { self.x_0.len_of(ndarray::Axis(0)) }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// `(x_0, x_true)` of sample `i`
    pub fn sample(&self, i: usize) -> (ArrayView3<f32>, ArrayView3<f32>) {
        (self.x_0.slice(s![i, .., .., ..]), self.x_true.slice(s![i, .., .., ..]))
    }
}

pub struct Pipeline {
    forward: RayTransform,
    fbp: Fbp,
    noise: PoissonNoise,
    density_scale: f32,
}

impl Pipeline {

    pub fn new(forward: RayTransform, fbp: Fbp, noise: PoissonNoise, density_scale: f32) -> Result<Self> {
        check_density_scale(density_scale)?;
        Ok(Self { forward, fbp, noise, density_scale })
    }

    /// Geometry, operators and noise model as described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let (space, geometry) = build_geometry(config.size, &config.geometry)?;
        let forward = RayTransform::new(space, geometry)?;
        let fbp = forward.pseudo_inverse(config.fbp.filter, config.fbp.frequency_scaling)?;
        let noise = PoissonNoise::new(config.noise.mu_water, config.noise.photons_per_pixel)?;
        Self::new(forward, fbp, noise, config.data.density_scale)
    }

    pub fn space(&self) -> &ReconstructionSpace { self.forward.space() }
    pub fn forward(&self) -> &RayTransform { &self.forward }
    pub fn fbp(&self) -> &Fbp { &self.fbp }

    /// Noisy scan of `phantom`, reconstructed
    pub fn reconstruct_noisy<R: Rng + ?Sized>(&self, phantom: &Image, rng: &mut R) -> Image {
        let clean = self.forward.apply(phantom);
        let noisy = self.noise.apply(&clean, rng);
        self.fbp.apply(&noisy)
    }

    /// Sample pair from the phantom stored at `path`
    pub fn sample_from_file<R: Rng + ?Sized>(&self, path: &Path, rng: &mut R) -> Result<SamplePair> {
        let x_true = load_phantom(path, self.space(), self.density_scale)?;
        let x_0 = self.reconstruct_noisy(&x_true, rng);
        Ok(SamplePair { x_0, x_true })
    }

    /// Sample pair from the next phantom offered by `loader`
    pub fn generate_sample<L, R>(&self, loader: &mut L, rng: &mut R) -> Result<SamplePair>
    where
        L: PhantomLoader + ?Sized,
        R: Rng + ?Sized,
    {
        let path = loader.next_path()?;
        self.sample_from_file(&path, rng)
    }

    /// Sample pair from one fixed phantom, leaving any loader alone
    pub fn validation_sample<R: Rng + ?Sized>(&self, path: &Path, rng: &mut R) -> Result<SamplePair> {
        self.sample_from_file(path, rng)
    }

    /// `n` consecutive samples from `loader`. The first failure aborts the batch.
    pub fn generate_batch<L, R>(&self, n: usize, loader: &mut L, rng: &mut R) -> Result<Batch>
    where
        L: PhantomLoader + ?Sized,
        R: Rng + ?Sized,
    {
        self.generate_batch_with_progress(n, loader, rng, |_| {})
    }

    /// As `generate_batch`, calling `done(i)` after sample `i` is complete
    pub fn generate_batch_with_progress<L, R>(
        &self,
        n: usize,
        loader: &mut L,
        rng: &mut R,
        mut done: impl FnMut(usize),
    ) -> Result<Batch>
    where
        L: PhantomLoader + ?Sized,
        R: Rng + ?Sized,
    {
        if n == 0 {
            return Err(Error::InvalidParameter("batch must contain at least one sample".into()));
        }
        let mut batch = Batch::zeros(n, self.space().shape());
        for i in 0..n {
            let SamplePair { x_0, x_true } = self.generate_sample(loader, rng)?;
            batch.x_0   .slice_mut(s![i, .., .., 0]).assign(&x_0   .data);
            batch.x_true.slice_mut(s![i, .., .., 0]).assign(&x_true.data);
            done(i);
        }
        Ok(batch)
    }
}
