//! glyphtrace - image to stylized text art converter
//!
//! This library traces the visual edges of an image and maps them onto
//! directional glyphs, optionally coloring cells from the 16-color ANSI
//! palette or in 24-bit RGB, and renders the result as plain text, ANSI
//! terminal output or HTML.
//!
//! # Example
//! ```no_run
//! use glyphtrace::{ConversionOptions, OutputFormat, convert};
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let options = ConversionOptions {
//!     color: true,
//!     output_width: 100,
//!     output_format: OutputFormat::Ansi,
//!     ..Default::default()
//! };
//! let rendering = convert(&bytes, &options).unwrap();
//! print!("{}", rendering.text);
//! ```

pub mod buffer;
pub mod config;
pub mod edges;
pub mod engine;
pub mod enhance;
pub mod error;
pub mod grid;
pub mod palette;
pub mod render;

// Re-export main types for convenience
pub use config::ConversionOptions;
pub use engine::{ConversionEngine, Rendering, convert};
pub use error::{Error, InvalidOption, Result};
pub use grid::{Cell, CharacterGrid};
pub use palette::Color;
pub use render::OutputFormat;
