use image::{GrayImage, RgbImage};
use imageproc::filter::filter3x3;

const LAPLACIAN: [i32; 9] = [0, 1, 0, 1, -4, 1, 0, 1, 0];

/// Variance of the 3x3 Laplacian response. Higher means more edge detail.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let filtered = filter3x3::<_, i32, i16>(gray, &LAPLACIAN);

    let count = filtered.width() as u64 * filtered.height() as u64;
    if count == 0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for pixel in filtered.pixels() {
        let value = pixel[0] as f64;
        sum += value;
        sum_sq += value * value;
    }

    let mean = sum / count as f64;
    (sum_sq / count as f64 - mean * mean).max(0.0)
}

/// Focus measure of a color frame, computed on its luminance
pub fn sharpness_score(image: &RgbImage) -> f64 {
    let gray = image::imageops::grayscale(image);
    laplacian_variance(&gray)
}
