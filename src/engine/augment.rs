use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use rand::RngCore;

use crate::{
    catalog::model::{Catalog, DERIVED_PREFIX, RecordId},
    engine::ids::IdAllocator,
    foundation::error::CocoAugResult,
    foundation::fsio,
    select::filter::SelectedImage,
    transform::pipeline::ImageTransform,
};

/// `chrono` format of the timestamp token embedded in derived file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where sources are read from and derived images are written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AugmentOpts {
    /// Directory `Image.file_name` is resolved against when loading sources.
    pub image_root: PathBuf,
    /// Directory derived images are written under. Created on first use.
    pub output_root: PathBuf,
    /// Fixed timestamp token; `None` uses the local time when the run starts.
    pub timestamp: Option<String>,
}

impl Default for AugmentOpts {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from("."),
            output_root: PathBuf::from("."),
            timestamp: None,
        }
    }
}

/// A derived image appended by [`augment`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedImage {
    /// Id of the image it was made from.
    pub source_id: RecordId,
    /// Id of the new image record.
    pub image_id: RecordId,
    /// File name of the new image record.
    pub file_name: String,
    /// Annotations copied onto it.
    pub annotations: usize,
}

/// A selected source that was not augmented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedSource {
    /// Id of the source image.
    pub image_id: RecordId,
    /// Path that was tried.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of one augmentation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AugmentReport {
    /// New images, in append order.
    pub derived: Vec<DerivedImage>,
    /// Sources that were skipped.
    pub skipped: Vec<SkippedSource>,
}

impl AugmentReport {
    /// Number of images augmented.
    pub fn augmented(&self) -> usize {
        self.derived.len()
    }
}

/// Current local time as a file-name timestamp token.
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `aug_<stem>_<stamp>.<ext>`, kept in the source's directory.
///
/// Sources without an extension get `.jpg`.
pub fn derived_file_name(source: &str, stamp: &str) -> String {
    derived_name_with_suffix(source, stamp, None)
}

fn derived_name_with_suffix(source: &str, stamp: &str, n: Option<u32>) -> String {
    let (dir, base) = match source.rsplit_once('/') {
        Some((dir, base)) => (Some(dir), base),
        None => (None, source),
    };
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (base, "jpg"),
    };
    let name = match n {
        Some(n) => format!("{DERIVED_PREFIX}{stem}_{stamp}_{n}.{ext}"),
        None => format!("{DERIVED_PREFIX}{stem}_{stamp}.{ext}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{name}"),
        None => name,
    }
}

/// First derived name for `source` that `is_taken` rejects, appending `_1`, `_2`, ...
/// before the extension on collision.
fn free_derived_name(source: &str, stamp: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let mut name = derived_file_name(source, stamp);
    let mut n = 0;
    while is_taken(&name) {
        n += 1;
        name = derived_name_with_suffix(source, stamp, Some(n));
    }
    name
}

/// Create one derived image per selected source and append it, with copies of the source's
/// selected annotations, to `catalog`.
///
/// Ids start one past the catalog's maxima. Copied annotations keep every field except `id`
/// and `image_id`; box geometry is not adjusted for flips. A missing source file is logged,
/// reported and skipped. Any other error aborts the run and leaves `catalog` untouched,
/// although derived files written before the error stay on disk.
pub fn augment(
    catalog: &mut Catalog,
    selected: &[SelectedImage],
    transform: &dyn ImageTransform,
    rng: &mut dyn RngCore,
    opts: &AugmentOpts,
) -> CocoAugResult<AugmentReport> {
    let mut report = AugmentReport::default();
    if selected.is_empty() {
        return Ok(report);
    }

    let stamp = opts.timestamp.clone().unwrap_or_else(timestamp_now);
    let mut ids = IdAllocator::for_catalog(catalog);
    let mut taken: HashSet<String> = catalog.images.iter().map(|i| i.file_name.clone()).collect();
    let mut new_images = Vec::with_capacity(selected.len());
    let mut new_annotations = Vec::new();

    fsio::ensure_dir(&opts.output_root)?;
    tracing::debug!(
        next_image_id = ids.peek_image(),
        candidates = selected.len(),
        stamp = %stamp,
        "starting augmentation"
    );

    for sel in selected {
        tracing::info!(file = %sel.image.file_name, "found an image");
        let src_path = opts.image_root.join(&sel.image.file_name);
        let pixels = match fsio::read_rgb_image(&src_path) {
            Ok(pixels) => pixels,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(path = %src_path.display(), "image path does not exist, skipping");
                report.skipped.push(SkippedSource {
                    image_id: sel.image.id,
                    path: src_path,
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let out = transform.apply(pixels, rng)?;

        let file_name = free_derived_name(&sel.image.file_name, &stamp, |name| {
            taken.contains(name) || opts.output_root.join(name).exists()
        });
        let out_path = opts.output_root.join(&file_name);
        write_derived(&out_path, &out)?;
        taken.insert(file_name.clone());

        let image_id = ids.image();
        let mut image = sel.image.clone();
        image.id = image_id;
        image.file_name = file_name.clone();
        new_images.push(image);

        for ann in &sel.annotations {
            let mut copy = ann.clone();
            copy.id = ids.annotation();
            copy.image_id = image_id;
            new_annotations.push(copy);
        }

        tracing::info!(
            file = %file_name,
            image_id,
            annotations = sel.annotations.len(),
            "augmented image and annotations added"
        );
        report.derived.push(DerivedImage {
            source_id: sel.image.id,
            image_id,
            file_name,
            annotations: sel.annotations.len(),
        });
    }

    catalog.images.extend(new_images);
    catalog.annotations.extend(new_annotations);
    Ok(report)
}

fn write_derived(path: &Path, img: &image::RgbImage) -> CocoAugResult<()> {
    fsio::ensure_parent_dir(path)?;
    fsio::write_rgb_image(path, img)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/augment.rs"]
mod tests;
