use image::Rgb;

use super::*;

#[test]
fn kernel_is_symmetric_and_normalized() {
    let k = gaussian_kernel(7, 2.0).unwrap();
    assert_eq!(k.len(), 7);
    assert!((k.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    for i in 0..3 {
        assert!((k[i] - k[6 - i]).abs() < 1e-15);
        assert!(k[i] < k[i + 1]);
    }
}

#[test]
fn kernel_rejects_bad_sigma() {
    assert!(gaussian_kernel(4, 0.0).is_err());
    assert!(gaussian_kernel(4, f64::NAN).is_err());
}

#[test]
fn mask_peaks_at_center_and_has_norm_255() {
    let (w, h) = (9u32, 5u32);
    let mask = vignette_mask(w, h, 3.0).unwrap();
    assert_eq!(mask.len(), (w * h) as usize);

    let norm = mask.iter().map(|m| m * m).sum::<f64>().sqrt();
    assert!((norm - 255.0).abs() < 1e-9);

    let center = mask[(2 * w + 4) as usize];
    assert!(mask.iter().all(|&m| m <= center));
    assert!(mask[0] < center);
}

#[test]
fn vignette_darkens_corners_more_than_center() {
    let img = RgbImage::from_pixel(40, 30, Rgb([200, 200, 200]));
    let out = apply_vignette(img, 10.0).unwrap();

    let center = out.get_pixel(20, 15).0[0];
    let corner = out.get_pixel(0, 0).0[0];
    assert!(corner < center);
    assert!(out.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
}

#[test]
fn single_pixel_mask_saturates() {
    let img = RgbImage::from_pixel(1, 1, Rgb([2, 0, 1]));
    let out = apply_vignette(img, DEFAULT_VIGNETTE_SIGMA).unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [255, 0, 255]);
}
