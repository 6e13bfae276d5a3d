//! Crate-boundary error types.
//!
//! [`ConfigurationError`] covers invalid option values, caught once at
//! builder validation rather than deep inside a pixel loop.
//! [`EncodeError`] is the top-level error every writer and pipeline
//! function returns, layering [`ConfigurationError`], [`PaletteError`],
//! and I/O failures behind one `thiserror` enum, the same layered style
//! `byonk`'s `ApiError`/`RenderError` pair uses.

use thiserror::Error;

use crate::palette::PaletteError;

/// Invalid write configuration, caught before any byte is emitted.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown dither algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("compression level {0} out of range 0..=9")]
    CompressionOutOfRange(u32),

    #[error("zero-size frame: {width}x{height}")]
    ZeroSizeFrame { width: usize, height: usize },

    #[error("fps must be positive, got {0}")]
    InvalidFps(f32),

    #[error("dither strength must be non-negative, got {0}")]
    InvalidStrength(f32),
}

/// Top-level error returned by every writer and pipeline entry point.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Palette(#[from] PaletteError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sequence error: {0}")]
    Sequence(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_wraps_into_encode_error() {
        let err: EncodeError = ConfigurationError::InvalidFps(-1.0).into();
        assert!(matches!(err, EncodeError::Configuration(_)));
        assert!(err.to_string().contains("fps"));
    }

    #[test]
    fn palette_error_wraps_into_encode_error() {
        let err: EncodeError = PaletteError::Empty.into();
        assert!(matches!(err, EncodeError::Palette(_)));
    }

    #[test]
    fn io_error_wraps_into_encode_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: EncodeError = io_err.into();
        assert!(matches!(err, EncodeError::Io(_)));
    }
}
