use super::*;
use crate::catalog::model::Category;

fn catalog() -> Catalog {
    Catalog {
        images: vec![
            Image::new(1, "3_cam_0001.jpg"),
            Image::new(2, "4_cam_0002.jpg"),
            Image::new(3, "aug_3_cam_0001_20240101_000000.jpg"),
            Image::new(4, "3_cam_0003.jpg"),
            Image::new(5, "33_cam_0004.jpg"),
        ],
        annotations: vec![
            Annotation::new(10, 1, 1),
            Annotation::new(11, 1, 2),
            Annotation::new(12, 2, 1),
            Annotation::new(13, 3, 1),
            Annotation::new(14, 4, 2),
            Annotation::new(15, 1, 1),
            Annotation::new(16, 5, 1),
        ],
        categories: vec![Category::new(1, "bottle"), Category::new(2, "bag")],
        ..Default::default()
    }
}

fn ids(sel: &[SelectedImage]) -> Vec<RecordId> {
    sel.iter().map(|s| s.image.id).collect()
}

#[test]
fn selects_images_with_target_annotations_in_catalog_order() {
    let sel = select(&catalog(), &SelectionCriteria::for_categories(["bottle"])).unwrap();

    assert_eq!(ids(&sel), vec![1, 2, 5]);
    let first: Vec<RecordId> = sel[0].annotations.iter().map(|a| a.id).collect();
    assert_eq!(first, vec![10, 15]);
}

#[test]
fn derived_images_are_never_sources() {
    let sel = select(
        &catalog(),
        &SelectionCriteria::for_categories(["bottle", "bag"]),
    )
    .unwrap();
    assert!(sel.iter().all(|s| !s.image.is_derived()));
    assert_eq!(ids(&sel), vec![1, 2, 4, 5]);
}

#[test]
fn id_prefix_requires_underscore_boundary() {
    let criteria = SelectionCriteria::for_categories(["bottle"]).with_id_prefix("3");
    let sel = select(&catalog(), &criteria).unwrap();
    assert_eq!(ids(&sel), vec![1]);
}

#[test]
fn unknown_names_are_ignored_when_one_resolves() {
    let sel = select(
        &catalog(),
        &SelectionCriteria::for_categories(["bag", "kayak"]),
    )
    .unwrap();
    assert_eq!(ids(&sel), vec![1, 4]);
    assert_eq!(sel[0].annotations, vec![Annotation::new(11, 1, 2)]);
}

#[test]
fn empty_resolution_is_a_configuration_error() {
    let err = select(&catalog(), &SelectionCriteria::for_categories(["kayak"])).unwrap_err();
    assert!(matches!(err, CocoAugError::Configuration(_)));

    let err = select(&catalog(), &SelectionCriteria::default()).unwrap_err();
    assert!(matches!(err, CocoAugError::Configuration(_)));
}

#[test]
fn no_match_is_an_empty_selection() {
    let criteria = SelectionCriteria::for_categories(["bag"]).with_id_prefix("9");
    assert!(select(&catalog(), &criteria).unwrap().is_empty());
}
