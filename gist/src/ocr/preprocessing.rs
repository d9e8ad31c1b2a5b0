use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader, Luma};

use crate::config::OcrConfig;
use crate::error::{GistError, Result};

/// Prepare raw image bytes for the OCR engine.
///
/// Decodes the image, rejects anything below the minimum dimension, scales
/// oversized images down (aspect ratio kept), converts to 8-bit grayscale with
/// a histogram stretch and re-encodes as PNG.
pub fn preprocess_image(bytes: &[u8], config: &OcrConfig) -> Result<Vec<u8>> {
    let img = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| GistError::extraction("image", format!("failed to read image: {e}")))?
        .decode()
        .map_err(|e| GistError::extraction("image", format!("failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    if width < config.min_image_dimension || height < config.min_image_dimension {
        return Err(GistError::extraction(
            "image",
            format!(
                "image too small: {}x{}, minimum {}x{}",
                width, height, config.min_image_dimension, config.min_image_dimension
            ),
        ));
    }

    let img = resize_if_needed(img, config.max_image_dimension);
    let gray = stretch_contrast(img.to_luma8());

    let mut output = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| GistError::extraction("image", format!("failed to encode image: {e}")))?;

    Ok(output)
}

fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        return img;
    }

    let ratio = if width > height {
        max_dim as f32 / width as f32
    } else {
        max_dim as f32 / height as f32
    };

    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

/// Map the darkest pixel to 0 and the lightest to 255.
fn stretch_contrast(gray: GrayImage) -> GrayImage {
    let (min_val, max_val) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if max_val <= min_val {
        return gray;
    }

    let range = (max_val - min_val) as f32;
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0];
        Luma([((value - min_val) as f32 / range * 255.0) as u8])
    })
}
