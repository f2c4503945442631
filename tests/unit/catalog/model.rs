use super::*;

fn sample() -> Catalog {
    Catalog {
        extra: Map::new(),
        images: vec![
            Image::new(10, "a.jpg"),
            Image::new(11, "aug_a_20240101_000000.jpg"),
            Image::new(12, "b.jpg"),
        ],
        annotations: vec![
            Annotation::new(100, 10, 1),
            Annotation::new(101, 11, 1),
            Annotation::new(102, 11, 2),
        ],
        categories: vec![Category::new(1, "bottle"), Category::new(2, "cup")],
    }
}

#[test]
fn derived_marker_is_on_the_base_name() {
    assert!(is_derived_name("aug_a_20240101_000000.jpg"));
    assert!(is_derived_name("site1/aug_a_20240101_000000.jpg"));
    assert!(!is_derived_name("aug_dir/a.jpg"));
    assert!(!is_derived_name("a_aug_.jpg"));
    assert!(Image::new(1, "aug_x.jpg").is_derived());
}

#[test]
fn max_ids_default_to_zero_when_empty() {
    let empty = Catalog::default();
    assert_eq!(empty.max_image_id(), 0);
    assert_eq!(empty.max_annotation_id(), 0);

    let c = sample();
    assert_eq!(c.max_image_id(), 12);
    assert_eq!(c.max_annotation_id(), 102);
}

#[test]
fn category_lookup_by_name() {
    let c = sample();
    assert_eq!(
        c.category_ids_named(&["cup", "nope"]),
        BTreeSet::from([2])
    );
    assert!(c.category_ids_named::<&str>(&[]).is_empty());
}

#[test]
fn remove_images_cascades_annotations() {
    let mut c = sample();
    let removal = c.remove_images(&BTreeSet::from([11]));

    assert_eq!(removal.images, vec![Image::new(11, "aug_a_20240101_000000.jpg")]);
    assert_eq!(removal.annotations, 2);
    assert_eq!(
        c.images.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![10, 12]
    );
    assert_eq!(c.annotations, vec![Annotation::new(100, 10, 1)]);
    c.validate().unwrap();
}

#[test]
fn remove_images_with_unknown_ids_is_noop() {
    let mut c = sample();
    let before = c.clone();
    let removal = c.remove_images(&BTreeSet::from([999]));
    assert_eq!(removal, Removal::default());
    assert_eq!(c, before);
    assert_eq!(c.remove_images(&BTreeSet::new()), Removal::default());
}

#[test]
fn validate_reports_each_invariant() {
    sample().validate().unwrap();

    let mut dup_image = sample();
    dup_image.images.push(Image::new(10, "c.jpg"));
    assert!(dup_image.validate().unwrap_err().to_string().contains("duplicate image id"));

    let mut dup_name = sample();
    dup_name.images.push(Image::new(13, "a.jpg"));
    assert!(dup_name.validate().unwrap_err().to_string().contains("file_name"));

    let mut dup_ann = sample();
    dup_ann.annotations.push(Annotation::new(100, 12, 1));
    assert!(dup_ann.validate().unwrap_err().to_string().contains("duplicate annotation id"));

    let mut dangling = sample();
    dangling.annotations.push(Annotation::new(200, 77, 1));
    assert!(dangling.validate().unwrap_err().to_string().contains("missing image 77"));
}

#[test]
fn annotation_counts_skip_unannotated_images() {
    let counts = sample().annotation_counts();
    assert_eq!(counts.get(&10), Some(&1));
    assert_eq!(counts.get(&11), Some(&2));
    assert_eq!(counts.get(&12), None);
}
