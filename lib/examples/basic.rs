/// Basic example: convert a synthesized test image to colored terminal art
///
/// This draws a circle and a diagonal line, runs the engine and prints the
/// ANSI rendering straight to the terminal.
use glyphtrace::{ConversionEngine, ConversionOptions, OutputFormat};
use image::{Rgba, RgbaImage};

fn main() {
    env_logger::init();

    println!("glyphtrace - Basic Example");
    println!("==========================\n");

    let width = 200;
    let height = 200;
    let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    // Draw a blue circle outline
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let radius = 70.0;
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - center_x;
            let dy = y as f32 - center_y;
            let dist = (dx * dx + dy * dy).sqrt();
            if (dist - radius).abs() < 2.0 {
                img.put_pixel(x, y, Rgba([0, 0, 170, 255]));
            }
        }
    }

    // Draw a red diagonal line across the whole image
    for i in 0..width.min(height) {
        img.put_pixel(i, i, Rgba([170, 0, 0, 255]));
        if i > 0 {
            img.put_pixel(i - 1, i, Rgba([170, 0, 0, 255]));
            img.put_pixel(i, i - 1, Rgba([170, 0, 0, 255]));
        }
    }

    println!("Created test image: {}x{}", width, height);

    let options = ConversionOptions {
        color: true,
        output_width: 60,
        ..Default::default()
    };
    let mut engine = ConversionEngine::new(options).expect("options are in range");
    println!("Processing with options:");
    println!("  - Output width: {}", engine.options().output_width);
    println!("  - Quality: {}", engine.options().quality);
    println!("  - Color: {}", engine.options().color);
    println!();

    engine.prepare_image(img);

    let (columns, rows) = engine.size().unwrap_or((0, 0));
    println!("Rendered {}x{} cells:\n", columns, rows);
    println!(
        "{}",
        engine.render(OutputFormat::Ansi).expect("engine is prepared")
    );
}
