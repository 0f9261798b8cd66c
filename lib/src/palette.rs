/// One palette entry: RGB value plus the SGR code selecting it as foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub rgb: [u8; 3],
    pub sgr: u8,
    pub name: &'static str,
}

/// The 16 VGA-style terminal colors.
///
/// Scan order is fixed: nearest-color ties resolve to the earlier entry, so
/// reordering this table changes output. SGR codes are the classic 30-37
/// foreground set plus 90-97 for the bright half; background codes are the
/// foreground code plus 10.
pub const ANSI_PALETTE: [PaletteEntry; 16] = [
    PaletteEntry { rgb: [0x00, 0x00, 0x00], sgr: 30, name: "black" },
    PaletteEntry { rgb: [0x00, 0x00, 0xaa], sgr: 34, name: "blue" },
    PaletteEntry { rgb: [0x00, 0xaa, 0x00], sgr: 32, name: "green" },
    PaletteEntry { rgb: [0x00, 0xaa, 0xaa], sgr: 36, name: "cyan" },
    PaletteEntry { rgb: [0xaa, 0x00, 0x00], sgr: 31, name: "red" },
    PaletteEntry { rgb: [0xaa, 0x00, 0xaa], sgr: 35, name: "magenta" },
    PaletteEntry { rgb: [0xaa, 0x55, 0x00], sgr: 33, name: "brown" },
    PaletteEntry { rgb: [0xaa, 0xaa, 0xaa], sgr: 37, name: "light gray" },
    PaletteEntry { rgb: [0xff, 0xff, 0x55], sgr: 93, name: "yellow" },
    PaletteEntry { rgb: [0x55, 0x55, 0x55], sgr: 90, name: "dark gray" },
    PaletteEntry { rgb: [0x55, 0x55, 0xff], sgr: 94, name: "light blue" },
    PaletteEntry { rgb: [0x55, 0xff, 0x55], sgr: 92, name: "light green" },
    PaletteEntry { rgb: [0x55, 0xff, 0xff], sgr: 96, name: "light cyan" },
    PaletteEntry { rgb: [0xff, 0x55, 0x55], sgr: 91, name: "light red" },
    PaletteEntry { rgb: [0xff, 0x55, 0xff], sgr: 95, name: "light magenta" },
    PaletteEntry { rgb: [0xff, 0xff, 0xff], sgr: 97, name: "white" },
];

/// A cell color: an index into [`ANSI_PALETTE`] or a 24-bit truecolor triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Indexed(u8),
    Rgb([u8; 3]),
}

impl Color {
    /// Reduces an averaged cell color to its output representation.
    pub fn quantize(rgb: [u8; 3], full_rgb: bool) -> Self {
        if full_rgb {
            Color::Rgb(rgb)
        } else {
            Color::Indexed(nearest_ansi(rgb))
        }
    }

    /// CSS hex form, `#rrggbb`.
    pub fn css(&self) -> String {
        let [r, g, b] = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// SGR parameters selecting this color as foreground.
    pub fn sgr_foreground(&self) -> String {
        match self {
            Color::Indexed(i) => ANSI_PALETTE[usize::from(*i)].sgr.to_string(),
            Color::Rgb([r, g, b]) => format!("38;2;{r};{g};{b}"),
        }
    }

    /// SGR parameters selecting this color as background.
    pub fn sgr_background(&self) -> String {
        match self {
            Color::Indexed(i) => (ANSI_PALETTE[usize::from(*i)].sgr + 10).to_string(),
            Color::Rgb([r, g, b]) => format!("48;2;{r};{g};{b}"),
        }
    }

    /// The RGB value this color displays as.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Color::Indexed(i) => ANSI_PALETTE[usize::from(*i)].rgb,
            Color::Rgb(rgb) => *rgb,
        }
    }
}

/// Index of the palette entry closest to `rgb` by squared Euclidean distance.
/// The first entry wins on equal distance.
pub fn nearest_ansi(rgb: [u8; 3]) -> u8 {
    let mut best = 0u8;
    let mut best_distance = u32::MAX;
    for (index, entry) in ANSI_PALETTE.iter().enumerate() {
        let distance = distance_sq(rgb, entry.rgb);
        if distance < best_distance {
            best_distance = distance;
            best = index as u8;
        }
    }
    best
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    (0..3).fold(0u32, |acc, i| {
        let d = i32::from(a[i]) - i32::from(b[i]);
        acc + (d * d) as u32
    })
}
