//! Crop and target size computation.

use fileuploader_core::traits::codec::ResizeRequest;
use fileuploader_core::types::editor::{CropMode, CropRect};

/// Rectangle in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// What to cut out of the (rotated) source and how large to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Region of the source to keep.
    pub crop: PixelRect,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Whether the region is resampled to the output size.
    pub resample: bool,
}

/// Normalize a rotation to `0`, `90`, `180`, or `270` degrees.
///
/// Angles that are not right angles yield `None`.
pub fn right_angle(rotation: i32) -> Option<u32> {
    let degrees = rotation.rem_euclid(360) as u32;
    (degrees % 90 == 0).then_some(degrees)
}

/// Plan the crop and output size for an image of `image_width` x
/// `image_height`, measured after rotation.
///
/// Without a target size the crop region is kept at its own size. A target
/// larger than the crop region in both directions is not upscaled. With
/// auto-crop the region is trimmed to the target aspect ratio; otherwise
/// the target is shrunk to the region's aspect ratio.
pub fn plan(image_width: u32, image_height: u32, request: &ResizeRequest) -> ResizePlan {
    let mut crop = match request.crop {
        CropMode::Rect(rect) => clamp(rect, image_width, image_height),
        CropMode::None | CropMode::Auto => PixelRect {
            x: 0,
            y: 0,
            width: image_width.max(1),
            height: image_height.max(1),
        },
    };

    let mut resample = request.width.is_some() || request.height.is_some();
    let mut width = request.width.unwrap_or(crop.width).max(1);
    let mut height = request.height.unwrap_or(crop.height).max(1);

    if crop.width < width && crop.height < height {
        width = crop.width;
        height = crop.height;
        resample = false;
    }

    if resample {
        let ratio = f64::from(crop.width) / f64::from(crop.height);
        let target = f64::from(width) / f64::from(height);

        if request.crop == CropMode::Auto {
            if ratio > target {
                crop.width = (f64::from(crop.height) * target).ceil().max(1.0) as u32;
            } else {
                crop.height = (f64::from(crop.width) / target).ceil().max(1.0) as u32;
            }
        } else if target > ratio {
            width = (f64::from(height) * ratio).round().max(1.0) as u32;
        } else {
            height = (f64::from(width) / ratio).round().max(1.0) as u32;
        }
    }

    ResizePlan {
        crop,
        width,
        height,
        resample,
    }
}

fn clamp(rect: CropRect, image_width: u32, image_height: u32) -> PixelRect {
    let max_x = image_width.saturating_sub(1);
    let max_y = image_height.saturating_sub(1);
    let x = (rect.left.max(0.0).round() as u32).min(max_x);
    let y = (rect.top.max(0.0).round() as u32).min(max_y);
    let width = (rect.width.max(1.0).round() as u32).clamp(1, image_width.saturating_sub(x).max(1));
    let height =
        (rect.height.max(1.0).round() as u32).clamp(1, image_height.saturating_sub(y).max(1));
    PixelRect {
        x,
        y,
        width,
        height,
    }
}
