use rand::{SeedableRng, rngs::StdRng};

use super::*;

fn gradient(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            (x * 255 / w.max(2).saturating_sub(1).max(1)) as u8,
            (y * 255 / h.max(2).saturating_sub(1).max(1)) as u8,
            ((x + y) * 7 % 256) as u8,
        ])
    })
}

#[test]
fn brightness_contrast_identity_and_saturation() {
    let img = gradient(6, 4);
    assert_eq!(brightness_contrast(img.clone(), 1.0, 0.0), img);

    let bright = brightness_contrast(img, 1.0, 300.0);
    assert!(bright.iter().all(|&v| v == 255));
}

#[test]
fn flips_are_involutions() {
    let img = gradient(5, 3);
    let mut rng = StdRng::seed_from_u64(1);
    let once = Op::HorizontalFlip.apply(img.clone(), &mut rng).unwrap();
    assert_ne!(once, img);
    assert_eq!(once.get_pixel(0, 0), img.get_pixel(4, 0));
    assert_eq!(Op::HorizontalFlip.apply(once, &mut rng).unwrap(), img);

    let v = Op::VerticalFlip.apply(img.clone(), &mut rng).unwrap();
    assert_eq!(v.get_pixel(1, 0), img.get_pixel(1, 2));
}

#[test]
fn channel_shuffle_permutes_values() {
    let img = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
    let out = shuffle_channels(img.clone(), [2, 0, 1]);
    assert_eq!(out.get_pixel(0, 0).0, [30, 10, 20]);

    let mut rng = StdRng::seed_from_u64(9);
    let shuffled = Op::ChannelShuffle.apply(img, &mut rng).unwrap();
    let mut px = shuffled.get_pixel(1, 1).0;
    px.sort_unstable();
    assert_eq!(px, [10, 20, 30]);
}

#[test]
fn to_gray_equalizes_channels() {
    let out = to_gray(gradient(4, 4));
    assert!(out.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
    assert_eq!(luma(&Rgb([255, 255, 255])), 255);
    assert_eq!(luma(&Rgb([0, 0, 0])), 0);
}

#[test]
fn hsv_shift_zero_is_near_identity() {
    let img = gradient(8, 8);
    let out = shift_hsv(img.clone(), 0.0, 0.0, 0.0);
    for (a, b) in img.iter().zip(out.iter()) {
        assert!((i16::from(*a) - i16::from(*b)).abs() <= 1);
    }
}

#[test]
fn hue_rotation_moves_red_towards_green() {
    let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
    let out = shift_hsv(img, 120.0, 0.0, 0.0);
    assert_eq!(out.get_pixel(0, 0).0, [0, 255, 0]);
}

#[test]
fn clahe_keeps_constant_image_gray_balanced_and_spreads_contrast() {
    let flat = RgbImage::from_pixel(16, 16, Rgb([90, 90, 90]));
    let out = clahe_luma(flat, 2.0, 4);
    assert!(out.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));

    let low = RgbImage::from_fn(32, 32, |x, _| {
        let v = 100 + (x % 8) as u8;
        Rgb([v, v, v])
    });
    let out = clahe_luma(low.clone(), 4.0, 2);
    let spread = |img: &RgbImage| {
        let max = img.pixels().map(|p| p.0[0]).max().unwrap();
        let min = img.pixels().map(|p| p.0[0]).min().unwrap();
        max - min
    };
    assert!(spread(&out) > spread(&low));
}

#[test]
fn clahe_handles_images_smaller_than_grid() {
    let img = gradient(3, 2);
    let mut rng = StdRng::seed_from_u64(5);
    let out = Op::clahe().apply(img, &mut rng).unwrap();
    assert_eq!(out.dimensions(), (3, 2));
}

#[test]
fn iso_noise_is_seed_deterministic() {
    let img = gradient(16, 16);
    let a = Op::iso_noise()
        .apply(img.clone(), &mut StdRng::seed_from_u64(42))
        .unwrap();
    let b = Op::iso_noise()
        .apply(img.clone(), &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert_eq!(a, b);
    assert_ne!(a, img);
}

#[test]
fn iso_noise_on_flat_image_only_jitters_hue() {
    let gray = RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]));
    let out = iso_noise(gray.clone(), 0.05, 0.5, &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(out, gray);
}

#[test]
fn empty_image_is_rejected() {
    let err = Op::ToGray
        .apply(RgbImage::new(0, 0), &mut StdRng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(err, CocoAugError::Transform(_)));
}

#[test]
fn validation_rejects_bad_parameters() {
    assert!(Op::clahe().validate().is_ok());
    assert!(
        Op::Clahe {
            clip_limit: 0.5,
            tile_grid: 8
        }
        .validate()
        .is_err()
    );
    assert!(
        Op::IsoNoise {
            color_shift: [0.5, 0.1],
            intensity: [0.1, 0.5]
        }
        .validate()
        .is_err()
    );
    assert!(
        Op::BrightnessContrast {
            brightness_limit: f32::NAN,
            contrast_limit: 0.2
        }
        .validate()
        .is_err()
    );
}

#[test]
fn ops_parse_from_tagged_json_with_defaults() {
    let op: Op = serde_json::from_str(r#"{"op": "clahe", "tile_grid": 4}"#).unwrap();
    assert_eq!(
        op,
        Op::Clahe {
            clip_limit: 4.0,
            tile_grid: 4
        }
    );
    let op: Op = serde_json::from_str(r#"{"op": "channel_shuffle"}"#).unwrap();
    assert_eq!(op, Op::ChannelShuffle);
}
