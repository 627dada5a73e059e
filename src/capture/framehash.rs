use anyhow::Result;
use image::ImageFormat;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// Perceptual hash of a camera frame, used to skip inference on frames that
/// show the same target state as the last analyzed one.
pub fn frame_hash(jpeg: &[u8]) -> Result<String> {
    let img = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)?;
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();

    let hash = hasher.hash_image(&img);
    Ok(hash.to_base64())
}

pub fn hash_distance(lhs: &str, rhs: &str) -> u32 {
    let Ok(h1) = ImageHash::<Vec<u8>>::from_base64(lhs) else {
        return u32::MAX;
    };
    let Ok(h2) = ImageHash::<Vec<u8>>::from_base64(rhs) else {
        return u32::MAX;
    };
    h1.dist(&h2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn jpeg_with_dot(dot_x: u32) -> Vec<u8> {
        let mut img = RgbImage::from_pixel(64, 64, image::Rgb([250, 250, 245]));
        for dx in 0..6 {
            for dy in 0..6 {
                img.put_pixel(dot_x + dx, 20 + dy, image::Rgb([10, 10, 10]));
            }
        }
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Jpeg)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn identical_frames_hash_identically() {
        let a = frame_hash(&jpeg_with_dot(10)).unwrap();
        let b = frame_hash(&jpeg_with_dot(10)).unwrap();
        assert_eq!(hash_distance(&a, &b), 0);
    }

    #[test]
    fn undecodable_hash_maxes_the_distance() {
        assert_eq!(hash_distance("not-a-hash", "also-not"), u32::MAX);
    }

    #[test]
    fn non_jpeg_bytes_are_rejected() {
        assert!(frame_hash(b"definitely not a jpeg").is_err());
    }
}
