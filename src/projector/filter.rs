//! Ramp filtering of projections, in the frequency domain

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use serde::Deserialize;

use units::todo::Lengthf32;

use crate::{Error, Result};

/// Window applied on top of the ramp, attenuating high frequencies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum FilterKind {
    #[serde(rename = "Ram-Lak")]     RamLak,
    #[serde(rename = "Shepp-Logan")] SheppLogan,
    Cosine,
    Hamming,
    Hann,
}

impl FilterKind {

    pub const ALL: [FilterKind; 5] = [Self::RamLak, Self::SheppLogan, Self::Cosine, Self::Hamming, Self::Hann];

    pub fn name(self) -> &'static str {
        match self {
            Self::RamLak     => "Ram-Lak",
            Self::SheppLogan => "Shepp-Logan",
            Self::Cosine     => "Cosine",
            Self::Hamming    => "Hamming",
            Self::Hann       => "Hann",
        }
    }

    /// Window value at `nu`, the frequency as a fraction of the Nyquist
    /// frequency. Zero above `scaling`.
    pub fn window(self, nu: f64, scaling: f64) -> f64 {
        if nu > scaling { return 0.0 }
        let x = nu / scaling;
        match self {
            Self::RamLak     => 1.0,
            Self::SheppLogan => sinc(x / 2.0),
            Self::Cosine     => (PI * x / 2.0).cos(),
            Self::Hamming    => 0.54 + 0.46 * (PI * x).cos(),
            Self::Hann       => (PI * x / 2.0).cos().powi(2),
        }
    }
}

/// Normalized sinc: `sin(πx) / (πx)`
fn sinc(x: f64) -> f64 {
    if x == 0.0 { 1.0 } else { (PI * x).sin() / (PI * x) }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for FilterKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter(format!(
                "unknown filter `{s}`, expected one of Ram-Lak, Shepp-Logan, Cosine, Hamming, Hann")))
    }
}

/// Convolution of projections sampled at spacing `tau` with the band-limited
/// ramp kernel, windowed by a `FilterKind`.
///
/// Spatial kernel: `h(0) = 1/(4τ²)`, `h(n) = -1/(π²n²τ²)` for odd `n`, zero
/// for even `n`. Its transform is computed once, on a grid padded to a power
/// of two at least twice the projection length, so that the circular
/// convolution does not wrap around.
pub struct RampFilter {
    kind: FilterKind,
    n_samples: usize,
    response: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for RampFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RampFilter")
            .field("kind", &self.kind)
            .field("n_samples", &self.n_samples)
            .field("padded", &self.response.len())
            .finish()
    }
}

impl RampFilter {

    pub fn new(kind: FilterKind, frequency_scaling: f32, n_samples: usize, tau: Lengthf32) -> Result<Self> {
        if !(frequency_scaling > 0.0 && frequency_scaling <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "frequency scaling must lie in (0, 1], got {frequency_scaling}")));
        }
        if n_samples == 0 || !(tau > 0.0 && tau.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "cannot filter {n_samples} samples at spacing {tau} mm")));
        }
        let padded = (2 * n_samples).next_power_of_two();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(padded);
        let inverse = planner.plan_fft_inverse(padded);

        let tau = tau as f64;
        let frequency = |k: usize| if k <= padded / 2 { k as i64 } else { k as i64 - padded as i64 };
        let mut kernel: Vec<Complex64> = (0..padded)
            .map(|k| Complex64::new(ramp_kernel(frequency(k), tau), 0.0))
            .collect();
        forward.process(&mut kernel);

        let nyquist = (padded / 2) as f64;
        // `tau` turns the discrete sum into a convolution integral; the
        // inverse FFT is unnormalized, hence the division by `padded`.
        let response = kernel.iter().enumerate()
            .map(|(k, h)| {
                let nu = frequency(k).unsigned_abs() as f64 / nyquist;
                h.re * tau * kind.window(nu, frequency_scaling as f64) / padded as f64
            })
            .collect();

        Ok(Self { kind, n_samples, response, forward, inverse })
    }

    pub fn kind(&self) -> FilterKind { self.kind }

    /// Frequency response, in FFT order, including the FFT normalization
    pub fn response(&self) -> &[f64] { &self.response }

    /// Filter one projection of `n_samples` values into `out`
    pub fn apply(&self, projection: &[f32], out: &mut [f32]) {
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.response.len()];
        for (b, &p) in buffer.iter_mut().zip(projection) {
            b.re = p as f64;
        }
        self.forward.process(&mut buffer);
        for (b, &r) in buffer.iter_mut().zip(&self.response) {
            *b *= r;
        }
        self.inverse.process(&mut buffer);
        for (o, b) in out.iter_mut().zip(&buffer) {
            *o = b.re as f32;
        }
    }
}

fn ramp_kernel(n: i64, tau: f64) -> f64 {
    if n == 0 { 1.0 / (4.0 * tau * tau) }
    else if n % 2 == 0 { 0.0 }
    else { -1.0 / (PI * PI * (n * n) as f64 * tau * tau) }
}
