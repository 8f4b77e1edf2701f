//! Screen-image decoding: base64 → RGB, downscaled to fit `max_image_size`
//! while preserving aspect ratio. Image decoding itself is an external
//! collaborator's concern; this module is the thin call-through.

use image::imageops::FilterType;
use image::GenericImageView;

use scry_domain::error::{Error, Result};

use crate::traits::DecodedImage;

/// Strips an optional `data:image/*;base64,` prefix before decoding.
fn strip_data_url_prefix(input: &str) -> &str {
    match input.find(",") {
        Some(idx) if input[..idx].starts_with("data:") => &input[idx + 1..],
        _ => input,
    }
}

pub struct ImageCodec;

impl ImageCodec {
    /// Decode a base64-encoded screen capture, convert to RGB, and resample
    /// its larger side down to `max_image_size` if needed.
    pub fn decode_and_resize(base64_data: &str, max_image_size: u32) -> Result<DecodedImage> {
        use base64::Engine;

        let stripped = strip_data_url_prefix(base64_data);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(stripped)
            .map_err(|e| Error::Decode(format!("invalid base64 screen image: {e}")))?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| Error::Decode(format!("unsupported screen image encoding: {e}")))?;

        let (width, height) = image.dimensions();
        let resized = if width.max(height) > max_image_size {
            let (new_w, new_h) = if width >= height {
                (max_image_size, (height * max_image_size) / width.max(1))
            } else {
                ((width * max_image_size) / height.max(1), max_image_size)
            };
            image.resize(new_w.max(1), new_h.max(1), FilterType::Lanczos3)
        } else {
            image
        };

        let rgb = resized.to_rgb8();
        let (w, h) = rgb.dimensions();
        Ok(DecodedImage {
            rgb: rgb.into_raw(),
            width: w,
            height: h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png_base64() -> String {
        use base64::Engine;
        let img = image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn strips_data_url_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
    }

    #[test]
    fn decodes_small_image_without_resizing() {
        let b64 = tiny_png_base64();
        let decoded = ImageCodec::decode_and_resize(&b64, 1024).unwrap();
        assert_eq!(decoded.width, 4);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.rgb.len(), 4 * 2 * 3);
    }

    #[test]
    fn resizes_preserving_aspect_ratio() {
        let b64 = tiny_png_base64();
        let decoded = ImageCodec::decode_and_resize(&b64, 2).unwrap();
        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.height, 1);
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let err = ImageCodec::decode_and_resize("not-base64!!!", 1024).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
