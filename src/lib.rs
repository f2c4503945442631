//! cocoaug grows and prunes COCO object-detection datasets.
//!
//! It targets under-represented classes: images carrying annotations of the requested
//! categories are run through a randomized pixel pipeline and the results are appended to the
//! catalog as *derived* images (file names prefixed with `aug_`), with copies of the source's
//! annotations. The inverse path cascade-deletes images and their annotations, either for
//! derived images that lost every annotation or for files matching name fragments.
//!
//! # Pipeline overview
//!
//! 1. **Load**: `annotations.json -> Catalog` (unknown keys are kept verbatim)
//! 2. **Select**: `Catalog + SelectionCriteria -> Vec<SelectedImage>`
//! 3. **Transform**: `RgbImage -> RgbImage` through a seedable [`TransformPipeline`]
//! 4. **Mutate**: append derived records ([`augment`]) or cascade-delete ([`remove`])
//! 5. **Persist**: write the catalog back, only when something changed
//!
//! [`AugmentJob`] and [`PurgeJob`] bundle these steps for the CLI.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod catalog;
mod engine;
mod foundation;
mod select;
mod tools;
mod transform;

pub use catalog::model::{
    Annotation, Catalog, Category, DERIVED_PREFIX, Image, RecordId, Removal, is_derived_name,
};
pub use engine::augment::{
    AugmentOpts, AugmentReport, DerivedImage, SkippedSource, TIMESTAMP_FORMAT, augment,
    derived_file_name, timestamp_now,
};
pub use engine::ids::IdAllocator;
pub use engine::jobs::{AugmentJob, AugmentOutcome, PurgeJob, PurgeOutcome, PurgePolicy};
pub use engine::purge::{PurgeOpts, RemoveReport, find_by_substrings, find_orphans, remove};
pub use foundation::error::{CocoAugError, CocoAugResult};
pub use foundation::fsio::{
    JPEG_QUALITY, ensure_dir, list_file_names, read_rgb_image, remove_file_if_present,
    replace_file, write_rgb_image,
};
pub use select::filter::{SelectedImage, SelectionCriteria, resolve_categories, select};
pub use tools::resize::{ResizeOpts, ResizeReport, resize_directory};
pub use transform::ops::{
    Op, brightness_contrast, clahe_luma, iso_noise, luma, shift_hsv, shuffle_channels, to_gray,
};
pub use transform::pipeline::{ImageTransform, NightConfig, PipelineConfig, Step, TransformPipeline};
pub use transform::vignette::{
    DEFAULT_VIGNETTE_SIGMA, apply_vignette, gaussian_kernel, vignette_mask,
};
