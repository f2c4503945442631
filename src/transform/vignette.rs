use image::RgbImage;

use crate::foundation::error::{CocoAugError, CocoAugResult};

/// Default Gaussian sigma (pixels) used on both axes of the nighttime vignette.
pub const DEFAULT_VIGNETTE_SIGMA: f64 = 200.0;

/// Sampled 1D Gaussian of length `n` centred at `(n - 1) / 2`, normalized to sum 1.
pub fn gaussian_kernel(n: u32, sigma: f64) -> CocoAugResult<Vec<f64>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CocoAugError::configuration("vignette sigma must be > 0"));
    }
    let center = (f64::from(n) - 1.0) / 2.0;
    let denom = 2.0 * sigma * sigma;
    let mut k: Vec<f64> = (0..n)
        .map(|i| {
            let x = f64::from(i) - center;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = k.iter().sum();
    if sum > 0.0 {
        for w in &mut k {
            *w /= sum;
        }
    }
    Ok(k)
}

/// Row-major `height x width` mask `255 * K / ||K||`, where `K` is the outer product of the
/// vertical and horizontal kernels and `||K||` its Frobenius norm.
///
/// The norm of an outer product factors into the norms of its vectors, so each axis is
/// normalized on its own.
pub fn vignette_mask(width: u32, height: u32, sigma: f64) -> CocoAugResult<Vec<f64>> {
    let kx = unit_norm(gaussian_kernel(width, sigma)?);
    let ky = unit_norm(gaussian_kernel(height, sigma)?);

    let mut mask = Vec::with_capacity(kx.len() * ky.len());
    for y in &ky {
        mask.extend(kx.iter().map(|x| 255.0 * y * x));
    }
    Ok(mask)
}

fn unit_norm(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for w in &mut v {
            *w /= norm;
        }
    }
    v
}

/// Multiply every channel by the vignette mask. Products are truncated into `0..=255`.
pub fn apply_vignette(mut img: RgbImage, sigma: f64) -> CocoAugResult<RgbImage> {
    let (w, h) = img.dimensions();
    let mask = vignette_mask(w, h, sigma)?;
    for (px, m) in img.pixels_mut().zip(mask) {
        for c in px.0.iter_mut() {
            *c = (f64::from(*c) * m).clamp(0.0, 255.0) as u8;
        }
    }
    Ok(img)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/vignette.rs"]
mod tests;
