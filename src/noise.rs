//! Photon-counting noise on line integrals, following the Beer-Lambert law

use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

use units::todo::{Countf32, PerLengthf32};

use crate::sinogram::Sinogram;
use crate::{Error, Result};

// Keeps `exp` finite for any finite input
const MIN_EXPONENT: f64 = -700.0;
const MAX_EXPONENT: f64 =  700.0;

/// Detector saturation: expected counts are capped here, well within the
/// range where the Poisson sampler is accurate.
const MAX_EXPECTED_COUNTS: f64 = 1e12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoissonNoise {
    mu_water: PerLengthf32,
    photons_per_pixel: Countf32,
}

impl PoissonNoise {

    pub fn new(mu_water: PerLengthf32, photons_per_pixel: Countf32) -> Result<Self> {
        if !(mu_water.is_finite() && mu_water > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "attenuation coefficient of water must be positive, got {mu_water} / mm")));
        }
        if !(photons_per_pixel.is_finite() && photons_per_pixel > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "photons per pixel must be positive, got {photons_per_pixel}")));
        }
        Ok(Self { mu_water, photons_per_pixel })
    }

    pub fn mu_water(&self) -> PerLengthf32 { self.mu_water }
    pub fn photons_per_pixel(&self) -> Countf32 { self.photons_per_pixel }

    /// Noisy version of `clean`. Elements are visited in row-major order, one
    /// Poisson draw each.
    pub fn apply<R: Rng + ?Sized>(&self, clean: &Sinogram, rng: &mut R) -> Sinogram {
        let mut data = Array2::zeros(clean.data.dim());
        for (noisy, &line_integral) in data.iter_mut().zip(clean.data.iter()) {
            *noisy = self.measure(line_integral, rng);
        }
        Sinogram { data }
    }

    fn measure<R: Rng + ?Sized>(&self, line_integral: f32, rng: &mut R) -> f32 {
        let mu = self.mu_water as f64;
        let photons = self.photons_per_pixel as f64;
        let exponent = (-(line_integral as f64) * mu).clamp(MIN_EXPONENT, MAX_EXPONENT);
        let expected = (exponent.exp() * photons).min(MAX_EXPECTED_COUNTS);
        let counts = if expected > 0.0 {
            Poisson::new(expected).map_or(0.0, |poisson| poisson.sample(rng))
        } else {
            0.0
        };
        let intensity = counts.max(1.0) / photons;
        (intensity.ln() * (-1.0 / mu)) as f32
    }
}

/// Replace each line integral by one drawn from the photon statistics of a
/// scan with `photons_per_pixel` unattenuated photons per detector bin.
pub fn simulate_noise<R: Rng + ?Sized>(
    clean: &Sinogram,
    mu_water: PerLengthf32,
    photons_per_pixel: Countf32,
    rng: &mut R,
) -> Result<Sinogram> {
    Ok(PoissonNoise::new(mu_water, photons_per_pixel)?.apply(clean, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_isaac::IsaacRng;
    use rstest::rstest;
    use proptest::prelude::*;

    fn sinogram(value: f32, shape: (usize, usize)) -> Sinogram {
        Sinogram { data: Array2::from_elem(shape, value) }
    }

    #[rstest(/**/ mu, photons,
             case(0.02, 0.0),
             case(0.02, -5.0),
             case(0.02, f32::NAN),
             case(0.02, f32::INFINITY),
             case(0.0, 1e4),
             case(-0.02, 1e4),
             case(f32::NAN, 1e4),
    )]
    fn invalid_parameters(mu: f32, photons: f32) {
        let mut rng = StdRng::seed_from_u64(0);
        let result = simulate_noise(&sinogram(1.0, (2, 2)), mu, photons, &mut rng);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn reproducible_with_fixed_seed() {
        let clean = Sinogram { data: Array2::from_shape_fn((20, 30), |(i, j)| (i * j) as f32) };
        let a = simulate_noise(&clean, 0.02, 1e4, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = simulate_noise(&clean, 0.02, 1e4, &mut StdRng::seed_from_u64(7)).unwrap();
        let c = simulate_noise(&clean, 0.02, 1e4, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn plenty_of_photons_gives_little_noise() {
        let clean = sinogram(100.0, (50, 50));
        let mut rng = IsaacRng::seed_from_u64(1);
        let noisy = simulate_noise(&clean, 0.02, 1e6, &mut rng).unwrap();
        let mean = noisy.data.mean().unwrap();
        assert!((mean - 100.0).abs() < 0.5, "mean {mean}");
        assert!(noisy.data.iter().all(|&x| (x - 100.0).abs() < 5.0));
    }

    #[test]
    fn total_absorption_saturates_at_one_count() {
        // Nothing gets through: zero counts are clamped to one, giving ln(1) = 0
        let clean = sinogram(1e4, (4, 4));
        let noisy = simulate_noise(&clean, 0.02, 1.0, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(noisy.data.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn underflowing_expectation_draws_nothing() {
        let clean = sinogram(f32::MAX, (3, 3));
        let noisy = simulate_noise(&clean, 1.0, 1e-30, &mut StdRng::seed_from_u64(4)).unwrap();
        assert!(noisy.data.iter().all(|x| x.is_finite()));
    }

    proptest! {
        #[test]
        fn output_is_finite(
            value   in -50.0..2000.0_f32,
            mu      in 1e-4..1.0_f32,
            photons in 1.0..1e6_f32,
            seed    in 0..1000_u64,
        ) {
            let noisy = simulate_noise(&sinogram(value, (3, 5)), mu, photons, &mut StdRng::seed_from_u64(seed)).unwrap();
            prop_assert!(noisy.data.iter().all(|x| x.is_finite()));
        }
    }
}
