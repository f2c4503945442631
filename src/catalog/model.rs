use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::foundation::error::{CocoAugError, CocoAugResult};

/// File-name prefix marking an image as derived (produced by augmentation).
pub const DERIVED_PREFIX: &str = "aug_";

/// Identifier type shared by images, annotations and categories.
pub type RecordId = i64;

/// A COCO annotation catalog.
///
/// Only the keys the engine reads are typed; every other key, at the top level or inside a
/// record, is kept in an `extra` map and written back untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Opaque top-level keys (`info`, `licenses`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Image records, in file order.
    #[serde(default)]
    pub images: Vec<Image>,
    /// Annotation records, in file order.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Category records.
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// One image entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Unique image id.
    pub id: RecordId,
    /// Path relative to the image root; doubles as the catalog key.
    pub file_name: String,
    /// Opaque fields (`width`, `height`, `date_captured`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One annotation entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique annotation id.
    pub id: RecordId,
    /// Id of the annotated image.
    pub image_id: RecordId,
    /// Id of the annotated category.
    pub category_id: RecordId,
    /// Opaque fields (`bbox`, `segmentation`, `area`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One category entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: RecordId,
    /// Operator-facing class name.
    pub name: String,
    /// Opaque fields (`supercategory`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Image {
    /// Build an image record with no opaque fields.
    pub fn new(id: RecordId, file_name: impl Into<String>) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            extra: Map::new(),
        }
    }

    /// Whether this image was produced by augmentation.
    pub fn is_derived(&self) -> bool {
        is_derived_name(&self.file_name)
    }
}

impl Annotation {
    /// Build an annotation record with no opaque fields.
    pub fn new(id: RecordId, image_id: RecordId, category_id: RecordId) -> Self {
        Self {
            id,
            image_id,
            category_id,
            extra: Map::new(),
        }
    }
}

impl Category {
    /// Build a category record with no opaque fields.
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Whether the final path component of `file_name` carries [`DERIVED_PREFIX`].
pub fn is_derived_name(file_name: &str) -> bool {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(DERIVED_PREFIX))
}

/// Counts of records dropped by [`Catalog::remove_images`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Removal {
    /// Image records removed.
    pub images: Vec<Image>,
    /// Number of annotations removed alongside them.
    pub annotations: usize,
}

impl Catalog {
    /// Largest image id, or 0 for an empty list.
    pub fn max_image_id(&self) -> RecordId {
        self.images.iter().map(|i| i.id).max().unwrap_or(0)
    }

    /// Largest annotation id, or 0 for an empty list.
    pub fn max_annotation_id(&self) -> RecordId {
        self.annotations.iter().map(|a| a.id).max().unwrap_or(0)
    }

    /// Ids of every category whose name is in `names`.
    pub fn category_ids_named<S: AsRef<str>>(&self, names: &[S]) -> BTreeSet<RecordId> {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        self.categories
            .iter()
            .filter(|c| wanted.contains(c.name.as_str()))
            .map(|c| c.id)
            .collect()
    }

    /// Number of annotations per image id. Images without annotations are absent.
    pub fn annotation_counts(&self) -> HashMap<RecordId, usize> {
        let mut counts = HashMap::new();
        for ann in &self.annotations {
            *counts.entry(ann.image_id).or_insert(0) += 1;
        }
        counts
    }

    /// Drop every image in `ids` together with every annotation referencing it.
    ///
    /// Annotations are dropped by `image_id` alone, whether or not the caller expected the
    /// image to still be annotated.
    pub fn remove_images(&mut self, ids: &BTreeSet<RecordId>) -> Removal {
        if ids.is_empty() {
            return Removal::default();
        }

        let (removed, kept): (Vec<Image>, Vec<Image>) = std::mem::take(&mut self.images)
            .into_iter()
            .partition(|img| ids.contains(&img.id));
        self.images = kept;

        let before = self.annotations.len();
        self.annotations.retain(|ann| !ids.contains(&ann.image_id));

        Removal {
            images: removed,
            annotations: before - self.annotations.len(),
        }
    }

    /// Check the referential invariants the engine maintains.
    ///
    /// - image ids are pairwise distinct, as are annotation ids
    /// - every annotation references an existing image
    /// - no two images share a file name
    pub fn validate(&self) -> CocoAugResult<()> {
        let mut image_ids = HashSet::with_capacity(self.images.len());
        let mut file_names = HashSet::with_capacity(self.images.len());
        for img in &self.images {
            if !image_ids.insert(img.id) {
                return Err(CocoAugError::configuration(format!(
                    "duplicate image id {}",
                    img.id
                )));
            }
            if !file_names.insert(img.file_name.as_str()) {
                return Err(CocoAugError::configuration(format!(
                    "duplicate image file_name '{}'",
                    img.file_name
                )));
            }
        }

        let mut ann_ids = HashSet::with_capacity(self.annotations.len());
        for ann in &self.annotations {
            if !ann_ids.insert(ann.id) {
                return Err(CocoAugError::configuration(format!(
                    "duplicate annotation id {}",
                    ann.id
                )));
            }
            if !image_ids.contains(&ann.image_id) {
                return Err(CocoAugError::configuration(format!(
                    "annotation {} references missing image {}",
                    ann.id, ann.image_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;
