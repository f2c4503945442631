use crate::catalog::model::{Catalog, RecordId};

/// Monotonic id source for one mutation run.
///
/// Seeded once from the catalog's maxima; ids are handed out in append order and never
/// recomputed mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdAllocator {
    next_image: RecordId,
    next_annotation: RecordId,
}

impl IdAllocator {
    /// Start one past the largest image and annotation ids in `catalog`.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self {
            next_image: catalog.max_image_id() + 1,
            next_annotation: catalog.max_annotation_id() + 1,
        }
    }

    /// Id the next image will receive.
    pub fn peek_image(&self) -> RecordId {
        self.next_image
    }

    /// Hand out an image id.
    pub fn image(&mut self) -> RecordId {
        let id = self.next_image;
        self.next_image += 1;
        id
    }

    /// Hand out an annotation id.
    pub fn annotation(&mut self) -> RecordId {
        let id = self.next_annotation;
        self.next_annotation += 1;
        id
    }
}
