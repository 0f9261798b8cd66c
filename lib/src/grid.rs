use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::config::ConversionOptions;
use crate::edges::{self, GradientField};
use crate::palette::Color;

/// Height of a terminal character cell relative to its width.
pub const CELL_ASPECT: f32 = 2.0;

/// Glyph for a non-edge cell flipped to filled by the invert option.
pub const FILL_GLYPH: char = '$';

/// Glyph for a blank cell.
pub const BLANK_GLYPH: char = ' ';

/// Mapping between the working image and the output character grid.
///
/// Each cell covers a `cell_width` by `cell_height` pixel region of the
/// working image; the bottom row may cover a shorter band when the height is
/// not an exact multiple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    /// Working image dimensions the buffer must be resampled to.
    pub image_width: u32,
    pub image_height: u32,
}

impl GridLayout {
    /// Fits a character grid of `columns` columns over a `width` by `height`
    /// source image.
    ///
    /// The working width is `columns * quality` source pixels, never
    /// upscaling: a narrower image is trimmed down to the largest multiple of
    /// `columns`. Cell height follows cell width through [`CELL_ASPECT`] so
    /// the rendered art is not vertically stretched.
    ///
    /// Returns `None` when the source cannot give each column of the grid at
    /// least one pixel.
    pub fn fit(width: u32, height: u32, columns: u32, quality: u32) -> Option<Self> {
        if columns == 0 || width < columns || height == 0 {
            return None;
        }
        let target = u64::from(columns) * u64::from(quality);
        let image_width = if u64::from(width) < target {
            width - width % columns
        } else {
            target as u32
        };
        let image_height =
            (f64::from(image_width) / f64::from(width) * f64::from(height)).round() as u32;
        if image_height == 0 {
            return None;
        }
        let cell_width = image_width / columns;
        let cell_height = ((cell_width as f32 * CELL_ASPECT).round() as u32).max(1);
        Some(Self {
            columns,
            rows: image_height.div_ceil(cell_height),
            cell_width,
            cell_height,
            image_width,
            image_height,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Pixel region covered by the cell at (`column`, `row`).
    pub fn cell_rect(&self, column: u32, row: u32) -> CellRect {
        let y = row * self.cell_height;
        CellRect {
            x: column * self.cell_width,
            y,
            width: self.cell_width,
            height: self.cell_height.min(self.image_height - y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// One output grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub is_edge: bool,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        self.glyph == BLANK_GLYPH && self.fg.is_none() && self.bg.is_none()
    }
}

/// The assembled character grid: rectangular rows of cells, immutable once
/// built. Rendering in a different output format reuses the same grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterGrid {
    cells: Vec<Cell>,
    columns: usize,
}

impl CharacterGrid {
    pub(crate) fn new(cells: Vec<Cell>, columns: usize) -> Self {
        debug_assert!(columns == 0 || cells.len() % columns == 0);
        Self { cells, columns }
    }

    /// The zero-cell grid produced for degenerate inputs.
    pub fn empty() -> Self {
        Self {
            cells: Vec::new(),
            columns: 0,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row_count(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.cells.len() / self.columns
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.columns.max(1))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    /// Builds the grid for `buffer`, which must already be resampled to the
    /// layout's working dimensions.
    ///
    /// Gradient and color measurement are per-cell independent and run in
    /// parallel; glyph classification walks the cells in raster order because
    /// its tie-break continues the previous cell's stroke. Inversion flips
    /// the edge decision after glyph selection, so the continuity chain sees
    /// the uninverted trace.
    ///
    /// # Arguments
    ///
    /// * `buffer` - enhanced pixels at (`layout.image_width`, `layout.image_height`)
    /// * `layout` - grid geometry from [`GridLayout::fit`]
    /// * `options` - color, invert and fill flags
    pub fn assemble(
        buffer: &PixelBuffer,
        layout: &GridLayout,
        options: &ConversionOptions,
    ) -> Self {
        debug_assert_eq!(
            buffer.dimensions(),
            (layout.image_width, layout.image_height)
        );

        let field = GradientField::new(&buffer.luminance());
        let tallies = edges::measure(&field, layout);
        let columns = layout.columns as usize;

        let averages: Vec<Option<[u8; 3]>> = if options.color {
            (0..layout.cell_count())
                .into_par_iter()
                .map(|index| {
                    let rect =
                        layout.cell_rect((index % columns) as u32, (index / columns) as u32);
                    buffer.average_rgb(rect.x, rect.y, rect.width, rect.height)
                })
                .collect()
        } else {
            vec![None; layout.cell_count()]
        };

        let mut cells = Vec::with_capacity(layout.cell_count());
        let mut previous = None;
        for (tally, average) in tallies.iter().zip(&averages) {
            let traced = edges::classify(tally, previous);
            previous = traced;

            let (glyph, is_edge) = match (traced, options.invert) {
                (Some(glyph), false) => (glyph.ch(), true),
                (None, true) => (FILL_GLYPH, true),
                (Some(_), true) | (None, false) => (BLANK_GLYPH, false),
            };

            let color = average.map(|rgb| Color::quantize(rgb, options.full_rgb));
            let (fg, bg) = if is_edge {
                (color, None)
            } else if options.fill_all {
                (None, color)
            } else {
                (None, None)
            };
            cells.push(Cell {
                glyph,
                fg,
                bg,
                is_edge,
            });
        }
        Self::new(cells, columns)
    }
}
