/// HTML export example: render a synthesized test image as embeddable markup
///
/// This encodes the test image to PNG in memory, feeds the bytes through the
/// one-shot converter and wraps the markup in a minimal page on disk.
use glyphtrace::{ConversionOptions, OutputFormat, convert};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;

fn main() {
    env_logger::init();

    println!("glyphtrace - HTML Export");
    println!("========================\n");

    // Horizontal color bands with a bright zigzag across them
    let width = 240u32;
    let height = 160u32;
    let bands = [
        Rgba([170, 0, 0, 255]),
        Rgba([170, 85, 0, 255]),
        Rgba([0, 170, 0, 255]),
        Rgba([0, 170, 170, 255]),
    ];
    let mut img = RgbaImage::from_fn(width, height, |_, y| {
        bands[(y as usize * bands.len()) / height as usize]
    });
    for x in 0..width {
        let phase = (x % 80) as i32;
        let offset = if phase < 40 { phase } else { 80 - phase };
        let y = height as i32 / 2 - 20 + offset;
        for dy in -1..=1 {
            let yy = (y + dy).clamp(0, height as i32 - 1) as u32;
            img.put_pixel(x, yy, Rgba([255, 255, 255, 255]));
        }
    }

    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("in-memory PNG encoding");

    let options = ConversionOptions {
        color: true,
        fill_all: true,
        full_rgb: true,
        output_width: 80,
        output_format: OutputFormat::Html,
        ..Default::default()
    };
    let rendering = convert(&bytes.into_inner(), &options).expect("conversion succeeds");

    let page = format!(
        "<!DOCTYPE html>\n<html>\n<body style=\"background:#101010;color:#e0e0e0\">\n{}\n</body>\n</html>\n",
        rendering.text
    );
    fs::write("glyph_output.html", page).expect("Failed to write glyph_output.html");

    println!("✓ Rendered {}x{} cells", rendering.columns, rendering.rows);
    println!("✓ Saved to: glyph_output.html");
}
