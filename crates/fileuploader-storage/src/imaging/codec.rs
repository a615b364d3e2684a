//! Default raster codec backed by the `image` crate.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};

use fileuploader_core::error::{AppError, ErrorKind};
use fileuploader_core::result::AppResult;
use fileuploader_core::traits::codec::{ImageCodec, ResizeRequest};

use super::geometry::{plan, right_angle};

/// Codec for JPEG, PNG, and GIF output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    fn resize(&self, request: &ResizeRequest) -> bool {
        match self.apply(request) {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(
                    source = %request.source.display(),
                    error = %e,
                    "Image edit failed"
                );
                false
            }
        }
    }
}

impl RasterCodec {
    /// Run the edit, returning whether a file was written.
    pub fn apply(&self, request: &ResizeRequest) -> AppResult<bool> {
        if !request.source.is_file() {
            return Ok(false);
        }

        let rotation = match right_angle(request.rotation) {
            Some(degrees) => degrees,
            None => {
                tracing::debug!(rotation = request.rotation, "Ignoring non right-angle rotation");
                0
            }
        };
        let resizes = request.width.is_some() || request.height.is_some();
        if rotation == 0 && request.crop.is_none() && !resizes {
            return Ok(false);
        }

        let (output, format) = output_target(request.output_path());

        let image = ImageReader::open(&request.source)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| AppError::with_source(ErrorKind::Processing, "Failed to decode image", e))?;

        let image = match rotation {
            90 => image.rotate90(),
            180 => image.rotate180(),
            270 => image.rotate270(),
            _ => image,
        };

        let plan = plan(image.width(), image.height(), request);
        let cropped = image.crop_imm(plan.crop.x, plan.crop.y, plan.crop.width, plan.crop.height);
        let result = if plan.resample {
            cropped.resize_exact(plan.width, plan.height, FilterType::Lanczos3)
        } else {
            cropped
        };

        let bytes = encode(&result, format, request.quality)?;
        std::fs::write(&output, &bytes).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write image: {}", output.display()),
                e,
            )
        })?;

        tracing::debug!(
            output = %output.display(),
            width = result.width(),
            height = result.height(),
            rotation,
            "Edited image"
        );
        Ok(true)
    }
}

/// Output path and format implied by the destination extension.
///
/// Unknown extensions encode as JPEG; a missing extension also gets `.jpg`
/// appended.
fn output_target(destination: &Path) -> (PathBuf, ImageFormat) {
    let extension = destination
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("png") => (destination.to_path_buf(), ImageFormat::Png),
        Some("gif") => (destination.to_path_buf(), ImageFormat::Gif),
        Some(_) => (destination.to_path_buf(), ImageFormat::Jpeg),
        None => {
            let mut path = destination.as_os_str().to_owned();
            path.push(".jpg");
            (PathBuf::from(path), ImageFormat::Jpeg)
        }
    }
}

/// PNG compression for a 0-100 quality: level `10 - quality / 10`.
fn png_compression(quality: u8) -> CompressionType {
    match 10 - quality.min(100) / 10 {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn encode(image: &DynamicImage, format: ImageFormat, quality: u8) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let result = match format {
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, png_compression(quality), PngFilter::Adaptive);
            image.write_with_encoder(encoder)
        }
        ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif),
        _ => {
            let flattened = flatten_on_white(image);
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            encoder.encode_image(&flattened)
        }
    };

    result.map_err(|e| AppError::with_source(ErrorKind::Processing, "Failed to encode image", e))?;
    Ok(buffer)
}

/// Composite transparent pixels over a white background.
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
