//! Image encoding: question-paper photo → base64 PNG wrapped in `ImageData`.
//!
//! Phone photos of exam papers are routinely 4000 px or more on the long
//! side. Vision APIs tile and bill by resolution, and past roughly 2000 px
//! extra pixels stop improving transcription, so the photo is downscaled
//! first. PNG keeps the downscaled text crisp.

use crate::error::DocGenError;
use crate::pipeline::input::LoadedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Decode, downscale and encode a loaded image for the vision model.
pub fn prepare_image(input: &LoadedImage, max_pixels: u32) -> Result<ImageData, DocGenError> {
    let img = image::load_from_memory(&input.bytes).map_err(|e| DocGenError::ImageDecodeFailed {
        source_name: input.source_name.clone(),
        detail: e.to_string(),
    })?;
    let img = downscale(img, max_pixels);
    encode_image(&img).map_err(|e| DocGenError::ImageDecodeFailed {
        source_name: input.source_name.clone(),
        detail: format!("PNG encoding failed: {e}"),
    })
}

/// Shrink `img` so that neither side exceeds `max_pixels`, keeping the
/// aspect ratio. Smaller images are returned untouched.
pub fn downscale(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w.max(h) <= max_pixels {
        return img;
    }
    debug!("Downscaling {}x{} to fit {}px", w, h, max_pixels);
    img.resize(max_pixels, max_pixels, FilterType::Lanczos3)
}

/// Encode an image as a base64 PNG ready for the vision API.
///
/// `detail: "high"` keeps small print and sub-question numbering legible
/// on providers that tile images.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::ImageKind;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn encode_small_image() {
        let data = encode_image(&solid(10, 10)).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(decoded.starts_with(b"\x89PNG"));
    }

    #[test]
    fn downscale_keeps_aspect_ratio() {
        let img = downscale(solid(400, 200), 100);
        assert_eq!((img.width(), img.height()), (100, 50));
    }

    #[test]
    fn downscale_leaves_small_images() {
        let img = downscale(solid(80, 60), 100);
        assert_eq!((img.width(), img.height()), (80, 60));
    }

    #[test]
    fn prepare_rejects_corrupt_png() {
        let input = LoadedImage {
            bytes: b"\x89PNG\r\n\x1a\ngarbage".to_vec(),
            kind: ImageKind::Png,
            source_name: "broken.png".into(),
        };
        let err = prepare_image(&input, 2000).unwrap_err();
        assert!(matches!(err, DocGenError::ImageDecodeFailed { .. }));
    }

    #[test]
    fn prepare_roundtrips_real_png() {
        let mut bytes = Vec::new();
        solid(300, 100)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let input = LoadedImage {
            bytes,
            kind: ImageKind::Png,
            source_name: "paper.png".into(),
        };
        let data = prepare_image(&input, 150).unwrap();
        let png = STANDARD.decode(&data.data).unwrap();
        let back = image::load_from_memory(&png).unwrap();
        assert_eq!((back.width(), back.height()), (150, 50));
    }
}
