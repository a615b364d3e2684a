//! Image resize, crop, and rotation.

pub mod codec;
pub mod geometry;

pub use codec::RasterCodec;
pub use geometry::{PixelRect, ResizePlan};

use fileuploader_core::traits::codec::{ImageCodec, ResizeRequest};

/// Apply `request` with the default codec.
///
/// Returns `false` when the image was left untouched.
pub fn resize(request: &ResizeRequest) -> bool {
    RasterCodec.resize(request)
}
