//! Figures of merit: how close is a reconstruction to the truth?

use ndarray::{Array2, Zip};

use units::todo::{Densityf32, Lengthf32};
use geometry::Point;

use crate::image::Image;
use crate::{Error, Result};

/// Region of interest, in mm
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Roi {
    Disc((Lengthf32, Lengthf32), Lengthf32),
    /// Inclusive x and y ranges
    Rectangle((Lengthf32, Lengthf32), (Lengthf32, Lengthf32)),
}

impl Roi {
    pub fn contains(&self, p: Point) -> bool {
        match *self {
            Roi::Disc((cx, cy), radius) => {
                let (x, y) = (p.x - cx, p.y - cy);
                x*x + y*y < radius * radius
            }
            Roi::Rectangle((x_lo, x_hi), (y_lo, y_hi)) =>
                x_lo <= p.x && p.x <= x_hi &&
                y_lo <= p.y && p.y <= y_hi,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoiStats {
    pub n: usize,
    pub mean: f64,
    pub std: f64,
}

impl Image {

    /// Values of the pixels whose centres lie inside `roi`
    pub fn values_inside_roi(&self, roi: Roi) -> Vec<Densityf32> {
        self.data.indexed_iter()
            .filter(|&((ix, iy), _)| roi.contains(self.space.pixel_centre([ix, iy])))
            .map(|(_, &value)| value)
            .collect()
    }

    pub fn roi_stats(&self, roi: Roi) -> Option<RoiStats> {
        let values = self.values_inside_roi(roi);
        if values.is_empty() { return None }
        let n = values.len();
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
        let var = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n as f64;
        Some(RoiStats { n, mean, std: var.sqrt() })
    }

    /// The pixels inside a rectangular region, as a smaller array
    pub fn crop(&self, (x_lo, x_hi): (Lengthf32, Lengthf32), (y_lo, y_hi): (Lengthf32, Lengthf32)) -> Array2<Densityf32> {
        let inside = |lo: f32, hi: f32, c: f32| lo <= c && c <= hi;
        let (nx, ny) = self.space.shape();
        let xs: Vec<usize> = (0..nx).filter(|&i| inside(x_lo, x_hi, self.space.pixel_centre([i, 0]).x)).collect();
        let ys: Vec<usize> = (0..ny).filter(|&j| inside(y_lo, y_hi, self.space.pixel_centre([0, j]).y)).collect();
        Array2::from_shape_fn((xs.len(), ys.len()), |(i, j)| self.data[[xs[i], ys[j]]])
    }
}

/// Clip values to the display window `[lo, hi]`
pub fn windowed(data: &Array2<f32>, lo: f32, hi: f32) -> Array2<f32> {
    data.mapv(|x| x.clamp(lo, hi))
}

/// Spread between the extreme values of an image
pub fn dynamic_range(image: &Image) -> f64 {
    let (lo, hi) = image.data.iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    (hi - lo) as f64
}

fn same_shape(a: &Image, b: &Image) -> Result<()> {
    if a.data.dim() == b.data.dim() { Ok(()) }
    else {
        Err(Error::InvalidParameter(format!(
            "cannot compare images of shapes {:?} and {:?}", a.data.dim(), b.data.dim())))
    }
}

pub fn mse(result: &Image, truth: &Image) -> Result<f64> {
    same_shape(result, truth)?;
    let sum: f64 = result.data.iter().zip(truth.data.iter())
        .map(|(&a, &b)| (a as f64 - b as f64).powi(2))
        .sum();
    Ok(sum / result.data.len() as f64)
}

/// Peak signal-to-noise ratio in dB; infinite for identical images
pub fn psnr(result: &Image, truth: &Image, data_range: f64) -> Result<f64> {
    let mse = mse(result, truth)?;
    if mse == 0.0 { return Ok(f64::INFINITY) }
    Ok(10.0 * (data_range * data_range / mse).log10())
}

const SSIM_WINDOW: usize = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Mean structural similarity over all 7x7 windows lying entirely inside the
/// image, with uniform weights and sample (co)variances.
pub fn ssim(result: &Image, truth: &Image, data_range: f64) -> Result<f64> {
    same_shape(result, truth)?;
    let (nx, ny) = result.data.dim();
    if nx < SSIM_WINDOW || ny < SSIM_WINDOW {
        return Err(Error::InvalidParameter(format!(
            "SSIM needs images of at least {SSIM_WINDOW}x{SSIM_WINDOW} pixels, got {nx}x{ny}")));
    }
    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);
    let np = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = np / (np - 1.0);

    let x = result.data.mapv(f64::from);
    let y = truth .data.mapv(f64::from);
    let w = (SSIM_WINDOW, SSIM_WINDOW);
    let local = Zip::from(x.windows(w))
        .and(y.windows(w))
        .map_collect(|wx, wy| {
            let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            Zip::from(&wx).and(&wy).for_each(|&a, &b| {
                sx += a; sy += b;
                sxx += a * a; syy += b * b; sxy += a * b;
            });
            let (ux, uy) = (sx / np, sy / np);
            let vx  = cov_norm * (sxx / np - ux * ux);
            let vy  = cov_norm * (syy / np - uy * uy);
            let vxy = cov_norm * (sxy / np - ux * uy);
            ((2.0 * ux * uy + c1) * (2.0 * vxy + c2)) /
            ((ux * ux + uy * uy + c1) * (vx + vy + c2))
        });
    Ok(local.mean().unwrap_or(1.0))
}

#[cfg(test)]
mod test_in_roi {
    use super::*;
    use crate::space::ReconstructionSpace;
    use rstest::rstest;
    use units::mm;

    // Arrange for outer pixels to be centred at +/- 100.0, when n = 10
    const MAGIC: Lengthf32 = 10.0 / 9.0 * 200.0;

    fn uniform(width: Lengthf32, n: usize) -> Image {
        let h = width / 2.0;
        Image::ones(ReconstructionSpace::new((mm(-h), mm(-h)), (mm(h), mm(h)), (n, n)).unwrap())
    }

    #[rstest(/**/    l ,  n,    centre     ,    r , expected_len,
             case(MAGIC, 10, (  0.0,   0.0), 141.5, 100), // r > sqrt(2) * 100: all pixel centres inside
             case(MAGIC, 10, (  0.0,   0.0), 141.4,  96), // r < sqrt(2) * 100: 4 corners missing
             case(MAGIC,  9, (  0.0,   0.0), 141.4,  81), // coarser grid: outer centres closer
             case(MAGIC, 10, (200.0, 200.0), 141.5,   1), // single pixel at one corner
             case(MAGIC, 10, (200.0, 200.0), 141.4,   0), // slightly smaller r excludes the corner
    )]
    fn number_of_included_pixels_in_disc(
        l: Lengthf32,
        n: usize,
        centre: (Lengthf32, Lengthf32),
        r: Lengthf32,
        expected_len: usize
    ) {
        let inside = uniform(l, n).values_inside_roi(Roi::Disc(centre, r));
        assert_eq!(inside.len(), expected_len);
    }

    #[test]
    fn rectangle() {
        // pixel centres at -1.5, -0.5, 0.5, 1.5
        let image = Image::from_fn(uniform(4.0, 4).space, |p| p.x + 10.0 * p.y);
        let roi = Roi::Rectangle((-1.0, 2.0), (0.0, 2.0));
        assert_eq!(image.values_inside_roi(roi).len(), 6);
        let crop = image.crop((-1.0, 2.0), (0.0, 2.0));
        assert_eq!(crop.dim(), (3, 2));
        assert_eq!(crop[[0, 0]], -0.5 + 5.0);
        assert_eq!(crop[[2, 1]],  1.5 + 15.0);

        let stats = image.roi_stats(roi).unwrap();
        assert_eq!(stats.n, 6);
        assert!((stats.mean - 10.5).abs() < 1e-6);
        assert!(image.roi_stats(Roi::Rectangle((5.0, 6.0), (5.0, 6.0))).is_none());
    }
}
