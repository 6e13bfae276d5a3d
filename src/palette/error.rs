//! Errors produced while constructing or analyzing a [`super::Palette`].

use crate::color::ParseColorError;

/// Failure building or validating a [`super::Palette`].
#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    /// No colors were supplied.
    #[error("palette must contain at least one color")]
    Empty,

    /// More than 256 colors were supplied.
    #[error("palette has {0} colors, maximum is 256")]
    TooManyColors(usize),

    /// Every supplied color was fully transparent, leaving nothing to
    /// dither against.
    #[error("palette is entirely transparent")]
    AllTransparent,

    /// A hex color string failed to parse.
    #[error("invalid color string: {0}")]
    ParseColor(#[from] ParseColorError),
}
