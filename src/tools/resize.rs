use std::path::PathBuf;

use anyhow::Context;
use image::imageops::{self, FilterType};

use crate::foundation::{
    error::{CocoAugError, CocoAugResult},
    fsio,
};

/// Settings for [`resize_directory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResizeOpts {
    /// Directory whose files are resized.
    pub image_dir: PathBuf,
    /// Directory resized copies are written to, under the same file names.
    pub output_dir: PathBuf,
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
}

impl Default for ResizeOpts {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("."),
            output_dir: PathBuf::from("resized"),
            width: 640,
            height: 480,
        }
    }
}

/// What [`resize_directory`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResizeReport {
    /// File names written.
    pub resized: Vec<String>,
    /// File names that could not be decoded.
    pub skipped: Vec<String>,
}

/// Resize every decodable file directly in `opts.image_dir` to exactly
/// `opts.width` x `opts.height`.
#[tracing::instrument(skip_all, fields(dir = %opts.image_dir.display()))]
pub fn resize_directory(opts: &ResizeOpts) -> CocoAugResult<ResizeReport> {
    if opts.width == 0 || opts.height == 0 {
        return Err(CocoAugError::configuration(format!(
            "resize target must be non-empty, got {}x{}",
            opts.width, opts.height
        )));
    }
    if !opts.image_dir.is_dir() {
        return Err(CocoAugError::configuration(format!(
            "image directory '{}' does not exist",
            opts.image_dir.display()
        )));
    }
    fsio::ensure_dir(&opts.output_dir)?;

    let mut report = ResizeReport::default();
    for name in fsio::list_file_names(&opts.image_dir)? {
        let src = opts.image_dir.join(&name);
        let img = match image::open(&src).with_context(|| format!("decode '{}'", src.display())) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "not a readable image, skipping");
                report.skipped.push(name);
                continue;
            }
        };
        let out = imageops::resize(&img, opts.width, opts.height, FilterType::Triangle);
        fsio::write_rgb_image(&opts.output_dir.join(&name), &out)?;
        tracing::debug!(file = %name, "resized");
        report.resized.push(name);
    }
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/tools/resize.rs"]
mod tests;
