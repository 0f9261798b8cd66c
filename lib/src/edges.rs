use image::{GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use rayon::prelude::*;
use std::f32::consts::FRAC_PI_4;

use crate::grid::GridLayout;

/// Squared per-pixel gradient magnitude below which a pixel does not vote.
/// Sobel output on an 8-bit plane reaches 1020 per component; 100 per
/// component is roughly a 12-levels-per-pixel luminance slope.
const VOTE_FLOOR: u32 = 10_000;

/// An edge cell needs agreeing votes from at least this fraction of its
/// pixels (1/8, scaled to the actual cell area).
const EDGE_VOTE_DIVISOR: u32 = 8;

/// A perpendicular runner-up holding at least 3/4 of the winner's votes
/// turns the cell into a junction glyph.
const JUNCTION_RATIO: (u32, u32) = (3, 4);

/// Directional glyph assigned to an edge cell.
///
/// The four line forms correspond to the gradient axes; the two junction
/// forms are chosen when the cell's top two axes form a perpendicular pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeGlyph {
    /// `|`, gradient pointing along the x axis
    Vertical,
    /// `/`, gradient on the down-right/up-left diagonal
    Rising,
    /// `-`, gradient pointing along the y axis
    Horizontal,
    /// `\`, gradient on the down-left/up-right diagonal
    Falling,
    /// `+`, vertical and horizontal strokes meeting
    Cross,
    /// `X`, the two diagonals meeting
    DiagonalCross,
}

impl EdgeGlyph {
    pub fn ch(self) -> char {
        match self {
            EdgeGlyph::Vertical => '|',
            EdgeGlyph::Rising => '/',
            EdgeGlyph::Horizontal => '-',
            EdgeGlyph::Falling => '\\',
            EdgeGlyph::Cross => '+',
            EdgeGlyph::DiagonalCross => 'X',
        }
    }

    fn from_axis(axis: usize) -> Self {
        [
            EdgeGlyph::Vertical,
            EdgeGlyph::Rising,
            EdgeGlyph::Horizontal,
            EdgeGlyph::Falling,
        ][axis]
    }

    fn axis(self) -> Option<usize> {
        match self {
            EdgeGlyph::Vertical => Some(0),
            EdgeGlyph::Rising => Some(1),
            EdgeGlyph::Horizontal => Some(2),
            EdgeGlyph::Falling => Some(3),
            EdgeGlyph::Cross | EdgeGlyph::DiagonalCross => None,
        }
    }
}

/// Sobel gradient maps over a luminance plane.
pub struct GradientField {
    gx: ImageBuffer<Luma<i16>, Vec<i16>>,
    gy: ImageBuffer<Luma<i16>, Vec<i16>>,
}

impl GradientField {
    pub fn new(luminance: &GrayImage) -> Self {
        Self {
            gx: horizontal_sobel(luminance),
            gy: vertical_sobel(luminance),
        }
    }

    fn at(&self, x: u32, y: u32) -> (i32, i32) {
        (
            i32::from(self.gx.get_pixel(x, y)[0]),
            i32::from(self.gy.get_pixel(x, y)[0]),
        )
    }
}

/// Orientation vote tally for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellVotes {
    /// Votes per axis: 0 `|`, 1 `/`, 2 `-`, 3 `\`
    pub axes: [u32; 4],
    /// Pixels inside the cell (the bottom row of cells may be shorter)
    pub area: u32,
}

/// Tallies orientation votes for every cell of the layout, in raster order.
///
/// Each pixel whose squared gradient magnitude reaches [`VOTE_FLOOR`] votes
/// for the line axis its gradient angle folds onto. Cells are independent
/// here, so they are measured in parallel; the sequential part of edge
/// tracing lives in [`classify`].
pub fn measure(field: &GradientField, layout: &GridLayout) -> Vec<CellVotes> {
    let columns = layout.columns as usize;
    (0..layout.cell_count())
        .into_par_iter()
        .map(|index| {
            let rect = layout.cell_rect((index % columns) as u32, (index / columns) as u32);
            let mut votes = CellVotes {
                area: rect.area(),
                ..Default::default()
            };
            for y in rect.y..rect.y + rect.height {
                for x in rect.x..rect.x + rect.width {
                    let (gx, gy) = field.at(x, y);
                    let magnitude = (gx * gx + gy * gy) as u32;
                    if magnitude < VOTE_FLOOR {
                        continue;
                    }
                    votes.axes[orientation_axis(gx as f32, gy as f32)] += 1;
                }
            }
            votes
        })
        .collect()
}

/// Buckets a gradient vector into one of the four line axes.
///
/// The `atan2` angle is split into eight 45-degree octants; opposite octants
/// describe the same line, so they fold onto four axes. The glyph for an axis
/// is the stroke perpendicular to the gradient: a horizontal gradient means a
/// vertical stroke.
pub fn orientation_axis(gx: f32, gy: f32) -> usize {
    let angle = gy.atan2(gx);
    let octant = (angle / FRAC_PI_4).round() as i32;
    octant.rem_euclid(4) as usize
}

/// Decides the glyph for one cell from its vote tally, or `None` for a
/// non-edge cell.
///
/// `previous` is the glyph of the raster-order predecessor. A tie between the
/// winning axis and an adjacent one continues the predecessor's stroke so
/// traced lines stay visually connected; this is why cells must be classified
/// strictly left to right, top to bottom.
pub fn classify(votes: &CellVotes, previous: Option<EdgeGlyph>) -> Option<EdgeGlyph> {
    let needed = (votes.area / EDGE_VOTE_DIVISOR).max(1);

    let mut winner = 0;
    for axis in 1..4 {
        if votes.axes[axis] > votes.axes[winner] {
            winner = axis;
        }
    }
    let winner_votes = votes.axes[winner];
    if winner_votes < needed {
        return None;
    }

    // A junction needs the top two axes to be a perpendicular pair: the
    // runner-up must be the winner's opposite and hold enough of its votes.
    let mut runner_up = if winner == 0 { 1 } else { 0 };
    for axis in 1..4 {
        if axis != winner && votes.axes[axis] > votes.axes[runner_up] {
            runner_up = axis;
        }
    }
    let (num, den) = JUNCTION_RATIO;
    if runner_up == (winner + 2) % 4 && votes.axes[runner_up] * den >= winner_votes * num {
        return Some(if winner % 2 == 0 {
            EdgeGlyph::Cross
        } else {
            EdgeGlyph::DiagonalCross
        });
    }

    // Adjacent-axis tie: keep the predecessor's stroke when it is tied.
    if let Some(axis) = previous.and_then(EdgeGlyph::axis) {
        if axis != winner && votes.axes[axis] == winner_votes {
            return Some(EdgeGlyph::from_axis(axis));
        }
    }

    Some(EdgeGlyph::from_axis(winner))
}
