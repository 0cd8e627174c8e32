use crate::{COLOR_RAMP, GRAY_GAMMA, GRAY_RAMP};
use image::RgbImage;
use std::fmt::Write;

/// Convert an RGB pixel to a single intensity value in [0,255] using BT.601
/// luma coefficients (the same conversion video pipelines use for grayscale).
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    luma.round().clamp(0.0, 255.0) as u8
}

/// Ramp index for color mode: linear in intensity, no gamma.
pub fn color_index(gray: u8) -> usize {
    let index = ((gray as f64 / 255.0) * (COLOR_RAMP.len() - 1) as f64) as usize;
    // Floating-point rounding must never push us past the ramp end.
    index.min(COLOR_RAMP.len() - 1)
}

/// Ramp index for grayscale mode: gamma-corrected to improve perceived
/// contrast on the short ramp.
pub fn gray_index(gray: u8) -> usize {
    let normalized = (gray as f64 / 255.0).powf(GRAY_GAMMA);
    let index = (normalized * (GRAY_RAMP.len() - 1) as f64) as usize;
    index.min(GRAY_RAMP.len() - 1)
}

/// Render a resized pixel grid as one text frame, one character per pixel,
/// one line per pixel row.
///
/// In color mode each glyph is wrapped in a 24-bit foreground escape built
/// from the pixel's original RGB, followed by a reset. In grayscale mode the
/// bare glyph is emitted. Pure function: identical input yields byte-identical
/// output.
pub fn render_frame(image: &RgbImage, color: bool) -> String {
    let (width, height) = (image.width() as usize, image.height() as usize);

    // Worst case per color pixel: ESC[38;2;255;255;255m X ESC[0m = 24 bytes.
    let per_pixel = if color { 24 } else { 1 };
    let mut out = String::with_capacity(width * height * per_pixel + height);

    for y in 0..image.height() {
        for x in 0..image.width() {
            let [r, g, b] = image.get_pixel(x, y).0;
            let gray = luminance(r, g, b);
            if color {
                let ch = COLOR_RAMP[color_index(gray)] as char;
                let _ = write!(out, "\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, ch);
            } else {
                out.push(GRAY_RAMP[gray_index(gray)] as char);
            }
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(rgb))
    }

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 255, 255), 255);
        let red = luminance(255, 0, 0);
        assert!(red > 0 && red < 255);
    }

    #[test]
    fn test_indices_in_bounds_for_all_intensities() {
        for g in 0..=255u8 {
            assert!(
                color_index(g) < COLOR_RAMP.len(),
                "color index out of bounds at {}",
                g
            );
            assert!(
                gray_index(g) < GRAY_RAMP.len(),
                "gray index out of bounds at {}",
                g
            );
        }
    }

    #[test]
    fn test_index_extremes_map_to_ramp_ends() {
        assert_eq!(color_index(0), 0);
        assert_eq!(color_index(255), COLOR_RAMP.len() - 1);
        assert_eq!(gray_index(0), 0);
        assert_eq!(gray_index(255), GRAY_RAMP.len() - 1);
    }

    #[test]
    fn test_gamma_applied_in_gray_mode_only() {
        // Mid intensity: linear maps 128 below the ramp midpoint, gamma lifts
        // it to index 5 on the 10-glyph ramp.
        assert_eq!(gray_index(128), 5);
        assert_eq!(
            color_index(128),
            (128.0 / 255.0 * (COLOR_RAMP.len() - 1) as f64) as usize
        );
    }

    #[test]
    fn test_grayscale_render_uses_bare_glyphs() {
        let image = solid_image(4, 2, [0, 0, 0]);
        let text = render_frame(&image, false);
        assert_eq!(text, "@@@@\n@@@@\n");
    }

    #[test]
    fn test_white_renders_as_spaces_in_grayscale() {
        let image = solid_image(3, 1, [255, 255, 255]);
        assert_eq!(render_frame(&image, false), "   \n");
    }

    #[test]
    fn test_color_render_wraps_every_glyph_in_truecolor_escape() {
        let image = solid_image(2, 1, [255, 0, 0]);
        let text = render_frame(&image, true);

        let gray = luminance(255, 0, 0);
        let ch = COLOR_RAMP[color_index(gray)] as char;
        let cell = format!("\x1b[38;2;255;0;0m{}\x1b[0m", ch);
        assert_eq!(text, format!("{}{}\n", cell, cell));
    }

    #[test]
    fn test_render_is_idempotent() {
        let image = solid_image(8, 4, [90, 140, 200]);
        assert_eq!(render_frame(&image, true), render_frame(&image, true));
        assert_eq!(render_frame(&image, false), render_frame(&image, false));
    }

    #[test]
    fn test_line_count_matches_height() {
        let image = solid_image(5, 7, [10, 20, 30]);
        let text = render_frame(&image, false);
        assert_eq!(text.lines().count(), 7);
        assert!(text.ends_with('\n'));
        for line in text.lines() {
            assert_eq!(line.len(), 5);
            assert!(line.bytes().all(|b| GRAY_RAMP.contains(&b)));
        }
    }
}
