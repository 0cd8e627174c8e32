use crate::decoder::VideoFrame;
use crate::CELL_ASPECT;
use image::{imageops, RgbImage};
use log::debug;

/// Compute the character-grid height for a source frame at a target width,
/// preserving the source aspect ratio compressed by [`CELL_ASPECT`].
///
/// Truncation (not rounding) is deliberate: the emitted grid dimensions are
/// part of the client-visible contract.
pub fn target_height(src_width: u32, src_height: u32, target_width: u32) -> u32 {
    assert!(src_width > 0 && src_height > 0, "frame has zero dimensions");
    let aspect_ratio = src_height as f64 / src_width as f64;
    (aspect_ratio * target_width as f64 * CELL_ASPECT) as u32
}

/// Resize a decoded frame to a character grid of exactly `target_width`
/// columns, with the height derived by [`target_height`].
pub fn resize_frame(frame: &VideoFrame, target_width: u32) -> RgbImage {
    assert!(target_width > 0, "target width must be positive");
    let height = target_height(frame.width, frame.height, target_width);

    // An extremely wide source at a small width can legitimately compute to
    // zero rows; emit an empty grid rather than asking imageops for one.
    if height == 0 {
        return RgbImage::new(target_width, 0);
    }

    let source = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .expect("frame data length matches its dimensions");

    debug!(
        "Resizing frame {} from {}x{} to {}x{}",
        frame.frame_number, frame.width, frame.height, target_width, height
    );

    imageops::resize(&source, target_width, height, imageops::FilterType::Triangle)
}
