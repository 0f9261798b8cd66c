use rayon::prelude::*;

use crate::buffer::{CropBox, PixelBuffer};
use crate::config::ConversionOptions;

/// Mid-gray pivot the contrast scale rotates around.
const CONTRAST_PIVOT: f32 = 128.0;

/// Runs the preprocessing chain on a decoded buffer.
///
/// The order is fixed and significant:
/// 1. `negative`: invert each RGB channel, alpha untouched
/// 2. `brightness`: multiplicative scale per channel, clamped to 0-255
/// 3. `contrast`: scale around mid-gray (128), clamped
/// 4. `color_balance`: scale the red/blue spread, shifting warm/cool, clamped
/// 5. `crop`: trim background border rows/columns
///
/// Steps 1-3 are per-channel maps and are composed into a single 256-entry
/// lookup table applied in one pass. Step 4 mixes channels and runs as a
/// second pass. Both passes are plain per-pixel maps, so rows are processed
/// in parallel without affecting the result.
pub fn apply(mut buffer: PixelBuffer, options: &ConversionOptions) -> PixelBuffer {
    if buffer.width() == 0 || buffer.height() == 0 {
        return buffer;
    }

    if options.negative || options.brightness != 1.0 || options.contrast != 1.0 {
        let lut = channel_lut(options.negative, options.brightness, options.contrast);
        let row_len = buffer.width() as usize * 4;
        let data: &mut [u8] = buffer.pixels_mut();
        data.par_chunks_mut(row_len).for_each(|row| {
            for pixel in row.chunks_exact_mut(4) {
                pixel[0] = lut[usize::from(pixel[0])];
                pixel[1] = lut[usize::from(pixel[1])];
                pixel[2] = lut[usize::from(pixel[2])];
            }
        });
    }

    if options.color_balance != 1.0 {
        let factor = options.color_balance;
        let row_len = buffer.width() as usize * 4;
        let data: &mut [u8] = buffer.pixels_mut();
        data.par_chunks_mut(row_len).for_each(|row| {
            for pixel in row.chunks_exact_mut(4) {
                let r = f32::from(pixel[0]);
                let b = f32::from(pixel[2]);
                let mid = (r + b) * 0.5;
                pixel[0] = (mid + (r - mid) * factor).clamp(0.0, 255.0).round() as u8;
                pixel[2] = (mid + (b - mid) * factor).clamp(0.0, 255.0).round() as u8;
            }
        });
    }

    if options.crop {
        buffer = crop_to_content(buffer);
    }

    buffer
}

/// Composes negative, brightness and contrast into one channel lookup table.
fn channel_lut(negative: bool, brightness: f32, contrast: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let base = if negative { 255 - value } else { value };
        let mut v = (base as f32 * brightness).clamp(0.0, 255.0);
        v = ((v - CONTRAST_PIVOT) * contrast + CONTRAST_PIVOT).clamp(0.0, 255.0);
        *slot = v.round() as u8;
    }
    lut
}

fn crop_to_content(buffer: PixelBuffer) -> PixelBuffer {
    match buffer.content_box() {
        Some(area) => {
            log::debug!(
                "cropping to {}x{} at ({}, {})",
                area.width(),
                area.height(),
                area.left,
                area.top
            );
            buffer.cropped(&area)
        }
        None => {
            // The whole image is background. Keep a single pixel; the grid
            // layout degenerates and the engine reports an empty result.
            log::warn!("image is entirely background, result will be empty");
            buffer.cropped(&CropBox { left: 0, top: 0, right: 1, bottom: 1 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn buffer_of(rgba: [u8; 4]) -> PixelBuffer {
        PixelBuffer::new(RgbaImage::from_pixel(4, 4, Rgba(rgba)))
    }

    fn first_pixel(buffer: &PixelBuffer) -> [u8; 4] {
        buffer.pixels().get_pixel(0, 0).0
    }

    #[test]
    fn test_neutral_options_change_nothing() {
        let out = apply(buffer_of([12, 200, 77, 140]), &ConversionOptions::default());
        assert_eq!(first_pixel(&out), [12, 200, 77, 140]);
    }

    #[test]
    fn test_negative_inverts_rgb_only() {
        let options = ConversionOptions { negative: true, ..Default::default() };
        let out = apply(buffer_of([0, 100, 255, 200]), &options);
        assert_eq!(first_pixel(&out), [255, 155, 0, 200]);
    }

    #[test]
    fn test_brightness_extremes_clamp() {
        let bright = ConversionOptions { brightness: 3.0, ..Default::default() };
        let out = apply(buffer_of([128, 128, 128, 255]), &bright);
        assert_eq!(first_pixel(&out), [255, 255, 255, 255]);

        let dim = ConversionOptions { brightness: 0.5, ..Default::default() };
        let out = apply(buffer_of([128, 128, 128, 255]), &dim);
        assert_eq!(first_pixel(&out), [64, 64, 64, 255]);
    }

    #[test]
    fn test_contrast_scales_around_mid_gray() {
        let options = ConversionOptions { contrast: 2.0, ..Default::default() };
        let out = apply(buffer_of([100, 128, 200, 255]), &options);
        // (100-128)*2+128 = 72, (200-128)*2+128 clamps at 255.
        assert_eq!(first_pixel(&out), [72, 128, 255, 255]);
    }

    #[test]
    fn test_negative_applies_before_brightness() {
        let options = ConversionOptions {
            negative: true,
            brightness: 2.0,
            ..Default::default()
        };
        let out = apply(buffer_of([200, 200, 200, 255]), &options);
        // Invert first (55), then scale (110). The reverse order would clamp
        // at 255 and invert to 0.
        assert_eq!(first_pixel(&out)[0], 110);
    }

    #[test]
    fn test_color_balance_widens_red_blue_spread() {
        let options = ConversionOptions { color_balance: 2.0, ..Default::default() };
        let out = apply(buffer_of([200, 50, 100, 255]), &options);
        // mid = 150: red 150+50*2 = 250, blue 150-50*2 = 50, green untouched.
        assert_eq!(first_pixel(&out), [250, 50, 50, 255]);
    }

    #[test]
    fn test_color_balance_clamps() {
        let options = ConversionOptions { color_balance: 3.0, ..Default::default() };
        let out = apply(buffer_of([255, 9, 0, 255]), &options);
        assert_eq!(first_pixel(&out), [255, 9, 0, 255]);
    }

    #[test]
    fn test_crop_trims_border() {
        let mut img = RgbaImage::from_pixel(6, 6, Rgba([255, 255, 255, 255]));
        img.put_pixel(2, 3, Rgba([0, 0, 0, 255]));
        let options = ConversionOptions { crop: true, ..Default::default() };
        let out = apply(PixelBuffer::new(img), &options);
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(first_pixel(&out), [0, 0, 0, 255]);
    }

    #[test]
    fn test_crop_of_uniform_image_collapses_to_single_pixel() {
        let options = ConversionOptions { crop: true, ..Default::default() };
        let out = apply(buffer_of([7, 7, 7, 255]), &options);
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn test_crop_runs_after_enhancement() {
        // A border that only becomes uniform after the negative pass would
        // still crop the same, but a background that the contrast pass pushes
        // to pure white must be measured after that push.
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([250, 250, 250, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(2, 2, Rgba([254, 254, 254, 255]));
        let options = ConversionOptions {
            crop: true,
            contrast: 3.0,
            ..Default::default()
        };
        let out = apply(PixelBuffer::new(img), &options);
        // Contrast 3.0 sends both 250 and 254 to 255, so only the black
        // pixel is content.
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(first_pixel(&out), [0, 0, 0, 255]);
    }
}
