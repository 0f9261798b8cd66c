use crate::error::InvalidOption;
use crate::render::OutputFormat;

/// Lower bound shared by the contrast, brightness and color balance sliders.
pub const SLIDER_MIN: f32 = 0.5;
/// Upper bound shared by the contrast, brightness and color balance sliders.
pub const SLIDER_MAX: f32 = 3.0;

/// Options for one conversion request.
///
/// Constructed once per request and never mutated by the pipeline. `fill_all`
/// and `full_rgb` are only meaningful when `color` is set; with `color` off
/// they are ignored. The plain output format drops color regardless.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Trim uniform border rows/columns before rendering
    pub crop: bool, // default false
    /// Swap edge and blank cells after glyph selection
    pub invert: bool, // default false
    /// Invert the RGB channels before any other processing
    pub negative: bool, // default false
    /// Emit color information
    pub color: bool, // default false
    /// Give non-edge cells a background fill instead of leaving them blank
    pub fill_all: bool, // default false
    /// Keep averaged 24-bit cell colors instead of quantizing to the palette
    pub full_rgb: bool, // default false

    /// Adjustment sliders, 1.0 is neutral
    pub contrast: f32, // 0.5-3.0, default 1.0
    pub brightness: f32,    // 0.5-3.0, default 1.0
    pub color_balance: f32, // 0.5-3.0, default 1.0

    /// Output columns
    pub output_width: u32, // default 80
    /// Source pixels backing each cell column
    pub quality: u32, // 1-9, default 5
    /// Format used by the one-shot `convert` entry point
    pub output_format: OutputFormat, // default ansi
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            crop: false,
            invert: false,
            negative: false,
            color: false,
            fill_all: false,
            full_rgb: false,

            contrast: 1.0,
            brightness: 1.0,
            color_balance: 1.0,

            output_width: 80,
            quality: 5,
            output_format: OutputFormat::default(),
        }
    }
}

impl ConversionOptions {
    /// Validates the request before any decoding or pixel work.
    pub fn validate(&self) -> Result<(), InvalidOption> {
        slider("contrast", self.contrast)?;
        slider("brightness", self.brightness)?;
        slider("color_balance", self.color_balance)?;
        if self.output_width == 0 {
            return Err(InvalidOption::ZeroWidth);
        }
        if !(1..=9).contains(&self.quality) {
            return Err(InvalidOption::Quality(self.quality));
        }
        Ok(())
    }
}

fn slider(name: &'static str, value: f32) -> Result<(), InvalidOption> {
    // NaN fails the range check and is rejected like any other bad value.
    if !(SLIDER_MIN..=SLIDER_MAX).contains(&value) {
        return Err(InvalidOption::OutOfRange {
            name,
            value,
            min: SLIDER_MIN,
            max: SLIDER_MAX,
        });
    }
    Ok(())
}
