use std::{
    collections::{BTreeSet, HashSet},
    path::PathBuf,
};

use crate::{
    catalog::model::{Catalog, Image, RecordId},
    foundation::error::CocoAugResult,
    foundation::fsio,
};

/// Derived images that no annotation references, in catalog order.
///
/// Original images are never orphans, however many annotations they have.
pub fn find_orphans(catalog: &Catalog) -> Vec<Image> {
    let counts = catalog.annotation_counts();
    catalog
        .images
        .iter()
        .filter(|img| img.is_derived() && !counts.contains_key(&img.id))
        .cloned()
        .collect()
}

/// Catalog images whose file is in `listing` and whose name contains every entry of
/// `required`, in catalog order.
///
/// Files in `listing` with no catalog record are ignored. An empty `required` matches
/// nothing.
pub fn find_by_substrings<S: AsRef<str>>(
    catalog: &Catalog,
    listing: &[String],
    required: &[S],
) -> Vec<Image> {
    if required.is_empty() {
        return Vec::new();
    }
    let on_disk: HashSet<&str> = listing.iter().map(String::as_str).collect();
    catalog
        .images
        .iter()
        .filter(|img| on_disk.contains(img.file_name.as_str()))
        .filter(|img| required.iter().all(|s| img.file_name.contains(s.as_ref())))
        .cloned()
        .collect()
}

/// Where the files of removed images live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurgeOpts {
    /// Directory `Image.file_name` is resolved against when deleting files.
    pub image_root: PathBuf,
}

impl Default for PurgeOpts {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from("."),
        }
    }
}

/// Outcome of [`remove`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoveReport {
    /// Image records removed from the catalog.
    pub removed: Vec<Image>,
    /// Annotations cascaded with them.
    pub annotations_removed: usize,
    /// Files deleted from disk.
    pub files_deleted: usize,
    /// Files that were already gone.
    pub files_absent: Vec<PathBuf>,
}

/// Cascade-delete `targets` from `catalog` and remove their files under `opts.image_root`.
///
/// Files are deleted first; a file that is already gone is only logged. Any other I/O error
/// aborts before the catalog is touched. Targets whose id is no longer in the catalog are
/// ignored.
pub fn remove(
    catalog: &mut Catalog,
    targets: &[Image],
    opts: &PurgeOpts,
) -> CocoAugResult<RemoveReport> {
    let present: HashSet<RecordId> = catalog.images.iter().map(|i| i.id).collect();
    let mut ids = BTreeSet::new();
    let mut report = RemoveReport::default();

    for img in targets {
        if !present.contains(&img.id) || !ids.insert(img.id) {
            tracing::debug!(id = img.id, "target not in catalog, ignoring");
            continue;
        }
        let path = opts.image_root.join(&img.file_name);
        if fsio::remove_file_if_present(&path)? {
            tracing::info!(path = %path.display(), "deleted image file");
            report.files_deleted += 1;
        } else {
            tracing::info!(path = %path.display(), "image file already absent");
            report.files_absent.push(path);
        }
    }

    let removal = catalog.remove_images(&ids);
    for img in &removal.images {
        tracing::info!(id = img.id, file = %img.file_name, "removed image record");
    }
    report.removed = removal.images;
    report.annotations_removed = removal.annotations;
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/purge.rs"]
mod tests;
