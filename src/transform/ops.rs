use image::{Rgb, RgbImage, imageops};
use rand::{Rng, RngCore, seq::SliceRandom};
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CocoAugError, CocoAugResult};

/// A single pixel operation. Parameter limits describe the range random factors are drawn
/// from each time the op runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// `v * (1 + c) + b * 255` with `b` in `±brightness_limit`, `c` in `±contrast_limit`.
    BrightnessContrast {
        /// Max additive brightness shift as a fraction of 255.
        #[serde(default = "default_bc_limit")]
        brightness_limit: f32,
        /// Max multiplicative contrast change.
        #[serde(default = "default_bc_limit")]
        contrast_limit: f32,
    },
    /// Shift hue, saturation and value in HSV space.
    HueSaturationValue {
        /// Max hue shift in half-degrees (0..180 hue scale).
        #[serde(default = "default_hue_shift")]
        hue_shift_limit: f32,
        /// Max saturation shift on a 0..255 scale.
        #[serde(default = "default_sat_shift")]
        sat_shift_limit: f32,
        /// Max value shift on a 0..255 scale.
        #[serde(default = "default_val_shift")]
        val_shift_limit: f32,
    },
    /// Contrast-limited adaptive histogram equalization of luma.
    Clahe {
        /// Upper bound of the clip limit; the actual limit is drawn from `1..=clip_limit`.
        #[serde(default = "default_clahe_clip")]
        clip_limit: f32,
        /// Tiles per axis.
        #[serde(default = "default_clahe_grid")]
        tile_grid: u32,
    },
    /// Random permutation of the RGB channels.
    ChannelShuffle,
    /// Mirror left/right.
    HorizontalFlip,
    /// Mirror top/bottom.
    VerticalFlip,
    /// Replace every channel with BT.601 luma.
    ToGray,
    /// Camera sensor noise: Poisson luminance noise plus Gaussian hue jitter.
    IsoNoise {
        /// Range of the hue jitter scale (fraction of 360 degrees).
        #[serde(default = "default_iso_color_shift")]
        color_shift: [f32; 2],
        /// Range of the overall noise intensity.
        #[serde(default = "default_iso_intensity")]
        intensity: [f32; 2],
    },
}

fn default_bc_limit() -> f32 {
    0.2
}
fn default_hue_shift() -> f32 {
    10.0
}
fn default_sat_shift() -> f32 {
    15.0
}
fn default_val_shift() -> f32 {
    10.0
}
fn default_clahe_clip() -> f32 {
    4.0
}
fn default_clahe_grid() -> u32 {
    8
}
fn default_iso_color_shift() -> [f32; 2] {
    [0.01, 0.05]
}
fn default_iso_intensity() -> [f32; 2] {
    [0.1, 0.5]
}

impl Op {
    /// `BrightnessContrast` with default limits.
    pub fn brightness_contrast() -> Self {
        Self::BrightnessContrast {
            brightness_limit: default_bc_limit(),
            contrast_limit: default_bc_limit(),
        }
    }

    /// `HueSaturationValue` with default limits.
    pub fn hue_saturation_value() -> Self {
        Self::HueSaturationValue {
            hue_shift_limit: default_hue_shift(),
            sat_shift_limit: default_sat_shift(),
            val_shift_limit: default_val_shift(),
        }
    }

    /// `Clahe` with default clip limit and an 8x8 grid.
    pub fn clahe() -> Self {
        Self::Clahe {
            clip_limit: default_clahe_clip(),
            tile_grid: default_clahe_grid(),
        }
    }

    /// `IsoNoise` with default ranges.
    pub fn iso_noise() -> Self {
        Self::IsoNoise {
            color_shift: default_iso_color_shift(),
            intensity: default_iso_intensity(),
        }
    }

    /// Short stable name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BrightnessContrast { .. } => "brightness_contrast",
            Self::HueSaturationValue { .. } => "hue_saturation_value",
            Self::Clahe { .. } => "clahe",
            Self::ChannelShuffle => "channel_shuffle",
            Self::HorizontalFlip => "horizontal_flip",
            Self::VerticalFlip => "vertical_flip",
            Self::ToGray => "to_gray",
            Self::IsoNoise { .. } => "iso_noise",
        }
    }

    /// Reject parameters the op cannot sample from.
    pub fn validate(&self) -> CocoAugResult<()> {
        let bad = |what: &str| CocoAugError::configuration(format!("{}: {what}", self.name()));
        match *self {
            Self::BrightnessContrast {
                brightness_limit,
                contrast_limit,
            } => {
                if !non_negative(brightness_limit) || !non_negative(contrast_limit) {
                    return Err(bad("limits must be finite and >= 0"));
                }
            }
            Self::HueSaturationValue {
                hue_shift_limit,
                sat_shift_limit,
                val_shift_limit,
            } => {
                if ![hue_shift_limit, sat_shift_limit, val_shift_limit]
                    .into_iter()
                    .all(non_negative)
                {
                    return Err(bad("limits must be finite and >= 0"));
                }
            }
            Self::Clahe {
                clip_limit,
                tile_grid,
            } => {
                if !clip_limit.is_finite() || clip_limit < 1.0 {
                    return Err(bad("clip_limit must be finite and >= 1"));
                }
                if tile_grid == 0 {
                    return Err(bad("tile_grid must be >= 1"));
                }
            }
            Self::IsoNoise {
                color_shift,
                intensity,
            } => {
                for [lo, hi] in [color_shift, intensity] {
                    if !non_negative(lo) || !non_negative(hi) || lo > hi {
                        return Err(bad("ranges must be finite, >= 0 and ordered"));
                    }
                }
            }
            Self::ChannelShuffle | Self::HorizontalFlip | Self::VerticalFlip | Self::ToGray => {}
        }
        Ok(())
    }

    /// Run the op once, drawing its random factors from `rng`.
    pub fn apply(&self, img: RgbImage, rng: &mut dyn RngCore) -> CocoAugResult<RgbImage> {
        if img.width() == 0 || img.height() == 0 {
            return Err(CocoAugError::transform(format!(
                "{}: empty image",
                self.name()
            )));
        }
        let out = match *self {
            Self::BrightnessContrast {
                brightness_limit,
                contrast_limit,
            } => {
                let alpha = 1.0 + rng.random_range(-contrast_limit..=contrast_limit);
                let beta = rng.random_range(-brightness_limit..=brightness_limit) * 255.0;
                brightness_contrast(img, alpha, beta)
            }
            Self::HueSaturationValue {
                hue_shift_limit,
                sat_shift_limit,
                val_shift_limit,
            } => {
                let dh = rng.random_range(-hue_shift_limit..=hue_shift_limit);
                let ds = rng.random_range(-sat_shift_limit..=sat_shift_limit);
                let dv = rng.random_range(-val_shift_limit..=val_shift_limit);
                shift_hsv(img, dh * 2.0, ds / 255.0, dv / 255.0)
            }
            Self::Clahe {
                clip_limit,
                tile_grid,
            } => {
                let clip = rng.random_range(1.0..=clip_limit);
                clahe_luma(img, clip, tile_grid)
            }
            Self::ChannelShuffle => {
                let mut order = [0usize, 1, 2];
                order.shuffle(rng);
                shuffle_channels(img, order)
            }
            Self::HorizontalFlip => imageops::flip_horizontal(&img),
            Self::VerticalFlip => imageops::flip_vertical(&img),
            Self::ToGray => to_gray(img),
            Self::IsoNoise {
                color_shift,
                intensity,
            } => {
                let shift = rng.random_range(color_shift[0]..=color_shift[1]);
                let intensity = rng.random_range(intensity[0]..=intensity[1]);
                iso_noise(img, shift, intensity, rng)?
            }
        };
        Ok(out)
    }
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Apply `v * alpha + beta` to every channel through a lookup table.
pub fn brightness_contrast(mut img: RgbImage, alpha: f32, beta: f32) -> RgbImage {
    let lut: Vec<u8> = (0..=255u16)
        .map(|v| to_u8(f32::from(v) * alpha + beta))
        .collect();
    for v in img.iter_mut() {
        *v = lut[usize::from(*v)];
    }
    img
}

/// Shift hue (degrees), saturation and value (both 0..1 units).
pub fn shift_hsv(mut img: RgbImage, dh_deg: f32, ds: f32, dv: f32) -> RgbImage {
    for px in img.pixels_mut() {
        let [r, g, b] = unit_rgb(px);
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let h = (h + dh_deg).rem_euclid(360.0);
        let s = (s + ds).clamp(0.0, 1.0);
        let v = (v + dv).clamp(0.0, 1.0);
        *px = from_unit_rgb(hsv_to_rgb(h, s, v));
    }
    img
}

/// Reorder channels so output channel `i` is input channel `order[i]`.
pub fn shuffle_channels(mut img: RgbImage, order: [usize; 3]) -> RgbImage {
    for px in img.pixels_mut() {
        let src = px.0;
        px.0 = [src[order[0]], src[order[1]], src[order[2]]];
    }
    img
}

/// BT.601 luma of one pixel.
pub fn luma(px: &Rgb<u8>) -> u8 {
    let [r, g, b] = px.0.map(u32::from);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

/// Replace every channel with luma.
pub fn to_gray(mut img: RgbImage) -> RgbImage {
    for px in img.pixels_mut() {
        let y = luma(px);
        px.0 = [y, y, y];
    }
    img
}

/// CLAHE on luma; chroma is preserved by adding the luma delta to every channel.
pub fn clahe_luma(mut img: RgbImage, clip_limit: f32, tile_grid: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let gx = tile_grid.clamp(1, w);
    let gy = tile_grid.clamp(1, h);
    let tw = w as f32 / gx as f32;
    let th = h as f32 / gy as f32;
    let tile_of = |p: u32, size: f32, n: u32| ((p as f32 / size) as u32).min(n - 1);

    let lumas: Vec<u8> = img.pixels().map(luma).collect();

    let mut hists = vec![[0u32; 256]; (gx * gy) as usize];
    let mut counts = vec![0u32; (gx * gy) as usize];
    for y in 0..h {
        let ty = tile_of(y, th, gy);
        for x in 0..w {
            let t = (ty * gx + tile_of(x, tw, gx)) as usize;
            hists[t][usize::from(lumas[(y * w + x) as usize])] += 1;
            counts[t] += 1;
        }
    }

    let luts: Vec<[u8; 256]> = hists
        .iter_mut()
        .zip(&counts)
        .map(|(hist, &n)| equalize_clipped(hist, n, clip_limit))
        .collect();

    // Bilinear blend between the four nearest tile centres.
    let axis = |p: u32, size: f32, n: u32| {
        let t = (p as f32 + 0.5) / size - 0.5;
        let t0 = t.floor().clamp(0.0, (n - 1) as f32);
        let t1 = (t0 + 1.0).min((n - 1) as f32);
        let a = (t - t0).clamp(0.0, 1.0);
        (t0 as u32, t1 as u32, a)
    };

    for y in 0..h {
        let (y0, y1, ay) = axis(y, th, gy);
        for x in 0..w {
            let (x0, x1, ax) = axis(x, tw, gx);
            let l = usize::from(lumas[(y * w + x) as usize]);
            let at = |tx: u32, ty: u32| f32::from(luts[(ty * gx + tx) as usize][l]);
            let top = at(x0, y0) * (1.0 - ax) + at(x1, y0) * ax;
            let bottom = at(x0, y1) * (1.0 - ax) + at(x1, y1) * ax;
            let eq = top * (1.0 - ay) + bottom * ay;

            let delta = eq - l as f32;
            let px = img.get_pixel_mut(x, y);
            for c in px.0.iter_mut() {
                *c = to_u8(f32::from(*c) + delta);
            }
        }
    }
    img
}

fn equalize_clipped(hist: &mut [u32; 256], n: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if n == 0 {
        return lut;
    }
    let clip = ((clip_limit * n as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let per_bin = excess / 256;
    let rest = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += per_bin + u32::from(i < rest);
    }

    let scale = 255.0 / n as f32;
    let mut cdf = 0u32;
    for (i, &bin) in hist.iter().enumerate() {
        cdf += bin;
        lut[i] = to_u8(cdf as f32 * scale);
    }
    lut
}

/// Sensor noise in HLS space.
///
/// Luminance noise is Poisson with mean `std(L) * intensity * 255`; hue jitter is Gaussian
/// with deviation `color_shift * 360 * intensity` degrees.
pub fn iso_noise(
    mut img: RgbImage,
    color_shift: f32,
    intensity: f32,
    rng: &mut dyn RngCore,
) -> CocoAugResult<RgbImage> {
    let hls: Vec<(f32, f32, f32)> = img
        .pixels()
        .map(|px| {
            let [r, g, b] = unit_rgb(px);
            rgb_to_hls(r, g, b)
        })
        .collect();

    let n = hls.len() as f64;
    let mean = hls.iter().map(|p| f64::from(p.1)).sum::<f64>() / n;
    let var = hls
        .iter()
        .map(|p| (f64::from(p.1) - mean).powi(2))
        .sum::<f64>()
        / n;
    let lambda = var.sqrt() * f64::from(intensity) * 255.0;

    let luminance = if lambda > 0.0 {
        Some(Poisson::new(lambda).map_err(|e| CocoAugError::transform(format!("iso_noise: {e}")))?)
    } else {
        None
    };
    let hue = Normal::new(0.0f64, f64::from(color_shift * 360.0 * intensity))
        .map_err(|e| CocoAugError::transform(format!("iso_noise: {e}")))?;

    for (px, &(h, l, s)) in img.pixels_mut().zip(&hls) {
        let lum_noise = luminance.as_ref().map_or(0.0, |d| d.sample(rng));
        let h = (f64::from(h) + hue.sample(rng)).rem_euclid(360.0) as f32;
        let l = (l + (lum_noise / 255.0) as f32 * (1.0 - l)).clamp(0.0, 1.0);
        *px = from_unit_rgb(hls_to_rgb(h, l, s));
    }
    Ok(img)
}

fn unit_rgb(px: &Rgb<u8>) -> [f32; 3] {
    px.0.map(|c| f32::from(c) / 255.0)
}

fn from_unit_rgb((r, g, b): (f32, f32, f32)) -> Rgb<u8> {
    Rgb([to_u8(r * 255.0), to_u8(g * 255.0), to_u8(b * 255.0)])
}

fn hue_deg(r: f32, g: f32, b: f32, max: f32, delta: f32) -> f32 {
    let h = if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    h.rem_euclid(360.0)
}

fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta == 0.0 {
        return (0.0, 0.0, max);
    }
    let s = if max > 0.0 { delta / max } else { 0.0 };
    (hue_deg(r, g, b, max, delta), s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    (r + m, g + m, b + m)
}

fn rgb_to_hls(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;
    if delta == 0.0 {
        return (0.0, l, 0.0);
    }
    let s = if l <= 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };
    (hue_deg(r, g, b, max, delta), l, s)
}

fn hls_to_rgb(h: f32, l: f32, s: f32) -> (f32, f32, f32) {
    // Same chroma construction as HSV, with chroma derived from lightness.
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (r + m, g + m, b + m)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/ops.rs"]
mod tests;
