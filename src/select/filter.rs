use std::collections::{BTreeSet, HashMap};

use crate::{
    catalog::model::{Annotation, Catalog, Image, RecordId},
    foundation::error::{CocoAugError, CocoAugResult},
};

/// Operator criteria narrowing which source images get augmented.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Category names to target. At least one must exist in the catalog.
    pub category_names: Vec<String>,
    /// Keep only images whose `file_name` starts with `"{id_prefix}_"`.
    pub id_prefix: Option<String>,
}

impl SelectionCriteria {
    /// Criteria targeting `names` with no prefix filter.
    pub fn for_categories<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category_names: names.into_iter().map(Into::into).collect(),
            id_prefix: None,
        }
    }

    /// Add an id-prefix filter.
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }
}

/// A source image plus the annotations that made it eligible.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedImage {
    /// The source image record.
    pub image: Image,
    /// Its annotations in a targeted category, in catalog order.
    pub annotations: Vec<Annotation>,
}

/// Pick the images to augment.
///
/// Output follows catalog image order. Derived images are never returned.
pub fn select(catalog: &Catalog, criteria: &SelectionCriteria) -> CocoAugResult<Vec<SelectedImage>> {
    let category_ids = resolve_categories(catalog, &criteria.category_names)?;
    let prefix = criteria.id_prefix.as_ref().map(|p| format!("{p}_"));

    let mut by_image: HashMap<RecordId, Vec<&Annotation>> = HashMap::new();
    for ann in &catalog.annotations {
        if category_ids.contains(&ann.category_id) {
            by_image.entry(ann.image_id).or_default().push(ann);
        }
    }

    let mut out = Vec::new();
    for img in &catalog.images {
        if img.is_derived() {
            continue;
        }
        if prefix
            .as_deref()
            .is_some_and(|p| !img.file_name.starts_with(p))
        {
            continue;
        }
        let Some(anns) = by_image.get(&img.id) else {
            continue;
        };
        out.push(SelectedImage {
            image: img.clone(),
            annotations: anns.iter().map(|a| (*a).clone()).collect(),
        });
    }

    tracing::debug!(
        candidates = out.len(),
        categories = ?category_ids,
        "selection resolved"
    );
    Ok(out)
}

/// Resolve category names to ids, failing when none match.
pub fn resolve_categories(
    catalog: &Catalog,
    names: &[String],
) -> CocoAugResult<BTreeSet<RecordId>> {
    let ids = catalog.category_ids_named(names);
    if ids.is_empty() {
        return Err(CocoAugError::configuration(format!(
            "no categories found for the requested classes: {names:?}"
        )));
    }
    Ok(ids)
}

#[cfg(test)]
#[path = "../../tests/unit/select/filter.rs"]
mod tests;
