use image::RgbaImage;

use crate::buffer::PixelBuffer;
use crate::config::ConversionOptions;
use crate::enhance;
use crate::error::{Error, Result};
use crate::grid::{CharacterGrid, GridLayout};
use crate::render::OutputFormat;

/// The outcome of a one-shot [`convert`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    /// Output in the requested format.
    pub text: String,
    pub columns: usize,
    pub rows: usize,
    /// True when the input produced no visible cells (fully transparent, or
    /// cropped/trimmed down to nothing).
    pub empty: bool,
}

/// Runs the whole conversion pipeline and renders with the format named in
/// `options`.
///
/// Options are validated before any bytes are decoded.
pub fn convert(bytes: &[u8], options: &ConversionOptions) -> Result<Rendering> {
    let mut engine = ConversionEngine::new(options.clone())?;
    engine.prepare(bytes)?;
    let text = engine.render(options.output_format)?;
    let (columns, rows) = engine.size().unwrap_or((0, 0));
    Ok(Rendering {
        text,
        columns,
        rows,
        empty: engine.is_empty(),
    })
}

/// Orchestrates decode, enhancement, edge tracing and color quantization
/// into a reusable [`CharacterGrid`].
///
/// One of the `prepare` methods must run before [`render`]; after that the
/// grid is immutable and any number of `render` calls in any format read it
/// without side effects. Preparing again replays the full pipeline on the
/// new input.
///
/// [`render`]: ConversionEngine::render
#[derive(Debug, Clone)]
pub struct ConversionEngine {
    options: ConversionOptions,
    grid: Option<CharacterGrid>,
}

impl ConversionEngine {
    /// Creates an engine for one option set, rejecting out-of-range values
    /// up front.
    pub fn new(options: ConversionOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            grid: None,
        })
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Decodes `bytes` and runs the pipeline through grid assembly.
    pub fn prepare(&mut self, bytes: &[u8]) -> Result<()> {
        let buffer = PixelBuffer::decode(bytes)?;
        self.prepare_buffer(buffer);
        Ok(())
    }

    /// Runs the pipeline on an image the caller already decoded.
    pub fn prepare_image(&mut self, image: RgbaImage) {
        self.prepare_buffer(PixelBuffer::new(image));
    }

    fn prepare_buffer(&mut self, buffer: PixelBuffer) {
        let buffer = enhance::apply(buffer, &self.options);
        let (width, height) = buffer.dimensions();
        let grid = match GridLayout::fit(
            width,
            height,
            self.options.output_width,
            self.options.quality,
        ) {
            Some(layout) => {
                log::debug!(
                    "grid {}x{}, cells {}x{}px, working image {}x{}",
                    layout.columns,
                    layout.rows,
                    layout.cell_width,
                    layout.cell_height,
                    layout.image_width,
                    layout.image_height
                );
                let buffer = buffer.resized(layout.image_width, layout.image_height);
                let grid = CharacterGrid::assemble(&buffer, &layout, &self.options);
                log::debug!(
                    "traced {} edge cells of {}",
                    grid.rows().flatten().filter(|cell| cell.is_edge).count(),
                    layout.cell_count()
                );
                grid
            }
            None => {
                log::warn!(
                    "{}x{} pixels cannot fill {} columns, output will be empty",
                    width,
                    height,
                    self.options.output_width
                );
                CharacterGrid::empty()
            }
        };
        self.grid = Some(grid);
    }

    /// Renders the prepared grid. Fails with [`Error::NotPrepared`] when no
    /// `prepare` call has run yet.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        let grid = self.grid.as_ref().ok_or(Error::NotPrepared)?;
        Ok(format.render(grid))
    }

    pub fn grid(&self) -> Option<&CharacterGrid> {
        self.grid.as_ref()
    }

    /// Grid dimensions as (columns, rows), `None` before `prepare`.
    pub fn size(&self) -> Option<(usize, usize)> {
        self.grid
            .as_ref()
            .map(|grid| (grid.columns(), grid.row_count()))
    }

    /// True when nothing has been prepared yet or the prepared grid has no
    /// visible cells.
    pub fn is_empty(&self) -> bool {
        self.grid.as_ref().is_none_or(CharacterGrid::is_blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidOption;
    use crate::palette::Color;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    /// 100x100 white field with a 3px black line from corner to corner.
    fn diagonal_image() -> RgbaImage {
        RgbaImage::from_fn(100, 100, |x, y| {
            if x.abs_diff(y) <= 1 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    fn narrow_options() -> ConversionOptions {
        ConversionOptions {
            output_width: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_validation_precedes_decode() {
        let options = ConversionOptions {
            contrast: 5.0,
            ..Default::default()
        };
        // Junk bytes: a decode attempt would fail differently.
        let err = convert(b"not an image", &options).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOption(InvalidOption::OutOfRange {
                name: "contrast",
                ..
            })
        ));
    }

    #[test]
    fn test_render_before_prepare_fails() {
        let engine = ConversionEngine::new(ConversionOptions::default()).unwrap();
        assert!(matches!(
            engine.render(OutputFormat::Plain),
            Err(Error::NotPrepared)
        ));
        assert_eq!(engine.size(), None);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let mut engine = ConversionEngine::new(ConversionOptions::default()).unwrap();
        assert!(matches!(engine.prepare(b""), Err(Error::Decode(_))));
        assert!(matches!(
            engine.prepare(b"definitely not a png"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_transparent_image_yields_empty_result() {
        let mut engine = ConversionEngine::new(ConversionOptions::default()).unwrap();
        engine.prepare_image(RgbaImage::new(4, 4));
        assert!(engine.is_empty());
        assert_eq!(engine.size(), Some((0, 0)));
        assert_eq!(engine.render(OutputFormat::Plain).unwrap(), "");
    }

    #[test]
    fn test_crop_collapses_blank_image_to_empty() {
        let options = ConversionOptions {
            crop: true,
            ..Default::default()
        };
        let mut engine = ConversionEngine::new(options).unwrap();
        engine.prepare_image(RgbaImage::new(200, 200));
        assert!(engine.is_empty());
        assert_eq!(engine.render(OutputFormat::Plain).unwrap(), "");
    }

    #[test]
    fn test_formats_agree_on_row_count() {
        let mut engine = ConversionEngine::new(narrow_options()).unwrap();
        engine.prepare(&png_bytes(diagonal_image())).unwrap();
        let (columns, rows) = engine.size().unwrap();
        assert_eq!((columns, rows), (20, 10));

        let plain = engine.render(OutputFormat::Plain).unwrap();
        let ansi = engine.render(OutputFormat::Ansi).unwrap();
        let html = engine.render(OutputFormat::Html).unwrap();
        assert_eq!(plain.lines().count(), rows);
        assert_eq!(ansi.lines().count(), rows);
        assert_eq!(html.matches("<br>").count(), rows - 1);
        for line in plain.lines() {
            assert_eq!(line.chars().count(), columns);
        }
    }

    #[test]
    fn test_repeated_render_is_byte_identical() {
        let mut engine = ConversionEngine::new(narrow_options()).unwrap();
        engine.prepare(&png_bytes(diagonal_image())).unwrap();
        for format in [OutputFormat::Plain, OutputFormat::Ansi, OutputFormat::Html] {
            assert_eq!(engine.render(format).unwrap(), engine.render(format).unwrap());
        }
    }

    #[test]
    fn test_diagonal_line_traces_corner_to_corner() {
        let mut engine = ConversionEngine::new(narrow_options()).unwrap();
        engine.prepare(&png_bytes(diagonal_image())).unwrap();
        let plain = engine.render(OutputFormat::Plain).unwrap();

        let rows: Vec<&str> = plain.lines().collect();
        assert_eq!(rows.len(), 10);
        for (index, row) in rows.iter().enumerate() {
            assert!(
                row.chars().all(|ch| ch == '\\' || ch == ' '),
                "row {index} holds a foreign glyph: {row:?}"
            );
            let strokes: Vec<usize> = row
                .chars()
                .enumerate()
                .filter(|(_, ch)| *ch == '\\')
                .map(|(column, _)| column)
                .collect();
            assert!(!strokes.is_empty(), "row {index} lost the line");
            // The line descends two columns per row.
            for column in strokes {
                assert!(
                    (2 * index).saturating_sub(1) <= column && column <= 2 * index + 2,
                    "row {index} strays to column {column}"
                );
            }
        }
        assert!(rows[0].starts_with('\\'));
        assert_eq!(rows[9].chars().last(), Some('\\'));
    }

    #[test]
    fn test_palette_colors_stay_in_the_palette() {
        let options = ConversionOptions {
            color: true,
            fill_all: true,
            ..narrow_options()
        };
        let mut engine = ConversionEngine::new(options).unwrap();
        engine.prepare(&png_bytes(diagonal_image())).unwrap();
        for row in engine.grid().unwrap().rows() {
            for cell in row {
                for color in [cell.fg, cell.bg].into_iter().flatten() {
                    assert!(matches!(color, Color::Indexed(index) if index < 16));
                }
            }
        }
    }

    #[test]
    fn test_full_rgb_keeps_averaged_color() {
        let options = ConversionOptions {
            color: true,
            fill_all: true,
            full_rgb: true,
            output_width: 16,
            ..Default::default()
        };
        let mut engine = ConversionEngine::new(options).unwrap();
        // 80x50 matches the working size exactly, so no resampling happens
        // and every cell average equals the source color.
        engine.prepare_image(RgbaImage::from_pixel(80, 50, Rgba([90, 140, 33, 255])));
        for row in engine.grid().unwrap().rows() {
            for cell in row {
                assert_eq!(cell.bg, Some(Color::Rgb([90, 140, 33])));
            }
        }
        let ansi = engine.render(OutputFormat::Ansi).unwrap();
        assert!(ansi.contains("48;2;90;140;33"));
    }

    #[test]
    fn test_prepare_replays_the_pipeline() {
        let mut engine = ConversionEngine::new(narrow_options()).unwrap();
        engine.prepare(&png_bytes(diagonal_image())).unwrap();
        assert_eq!(engine.size(), Some((20, 10)));

        // Half as tall: the grid shrinks accordingly.
        engine.prepare_image(RgbaImage::from_pixel(100, 50, Rgba([255, 255, 255, 255])));
        assert_eq!(engine.size(), Some((20, 5)));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_convert_one_shot() {
        let options = ConversionOptions {
            output_format: OutputFormat::Html,
            ..narrow_options()
        };
        let rendering = convert(&png_bytes(diagonal_image()), &options).unwrap();
        assert_eq!(rendering.columns, 20);
        assert_eq!(rendering.rows, 10);
        assert!(!rendering.empty);
        assert!(rendering.text.starts_with("<pre>"));
        assert!(rendering.text.ends_with("</pre>"));
    }

    #[test]
    fn test_convert_empty_input_sets_flag() {
        let rendering = convert(
            &png_bytes(RgbaImage::new(4, 4)),
            &ConversionOptions::default(),
        )
        .unwrap();
        assert!(rendering.empty);
        assert_eq!(rendering.text, "");
        assert_eq!((rendering.columns, rendering.rows), (0, 0));
    }
}
