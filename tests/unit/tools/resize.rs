use image::{Rgb, RgbImage};

use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_resize").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("in")).unwrap();
    dir
}

#[test]
fn resizes_images_and_skips_other_files() {
    let dir = scratch("mixed");
    let img = RgbImage::from_pixel(30, 20, Rgb([10, 20, 30]));
    fsio::write_rgb_image(&dir.join("in").join("a.jpg"), &img).unwrap();
    fsio::write_rgb_image(&dir.join("in").join("b.png"), &img).unwrap();
    std::fs::write(dir.join("in").join("notes.txt"), b"not an image").unwrap();

    let opts = ResizeOpts {
        image_dir: dir.join("in"),
        output_dir: dir.join("out"),
        width: 8,
        height: 6,
    };
    let report = resize_directory(&opts).unwrap();
    assert_eq!(report.resized, vec!["a.jpg", "b.png"]);
    assert_eq!(report.skipped, vec!["notes.txt"]);

    let out = fsio::read_rgb_image(&dir.join("out").join("b.png")).unwrap();
    assert_eq!(out.dimensions(), (8, 6));
    assert_eq!(out.get_pixel(3, 3).0, [10, 20, 30]);
    assert!(!dir.join("out").join("notes.txt").exists());
}

#[test]
fn rejects_zero_size_and_missing_dir() {
    let dir = scratch("bad");
    let zero = ResizeOpts {
        image_dir: dir.join("in"),
        output_dir: dir.join("out"),
        width: 0,
        height: 10,
    };
    assert!(matches!(
        resize_directory(&zero).unwrap_err(),
        CocoAugError::Configuration(_)
    ));

    let missing = ResizeOpts {
        image_dir: dir.join("nope"),
        output_dir: dir.join("out"),
        ..ResizeOpts::default()
    };
    assert!(resize_directory(&missing).is_err());
    assert!(!dir.join("out").exists());
}

#[test]
fn defaults_are_vga() {
    let opts = ResizeOpts::default();
    assert_eq!((opts.width, opts.height), (640, 480));
}
