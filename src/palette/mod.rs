//! Palette construction and nearest-color mapping.
//!
//! A [`Palette`] is an immutable, up-to-256-entry RGBA color table plus a
//! precomputed 32768-entry RGB555 nearest-neighbor lookup. Build one with
//! [`Palette::exact`] for a fixed set of colors, or with [`analyze`] and
//! friends to derive one from source imagery.

mod analyze;
mod default_palette;
mod error;
#[allow(clippy::module_inception)]
mod palette;

pub use analyze::{analyze, analyze_fast, analyze_hue_wise, analyze_many, analyze_reductive};
pub use default_palette::default_palette;
pub use error::PaletteError;
pub use palette::{Palette, MAPPING_SIZE, MAX_COLORS};
