//! The [`Palette`] entity: up to 256 RGBA colors plus a precomputed
//! nearest-color lookup table.

use std::sync::Arc;

use crate::color::{difference_match, LinearRgb, Oklab, Srgb};

use super::error::PaletteError;

/// Number of entries in the RGB555-keyed mapping table (`32 * 32 * 32`).
pub const MAPPING_SIZE: usize = 32 * 32 * 32;

/// Maximum number of colors a palette may hold.
pub const MAX_COLORS: usize = 256;

/// An immutable, up-to-256-entry color palette plus its precomputed
/// nearest-neighbor lookup table.
///
/// Cloning a `Palette` is cheap: the 32 KiB mapping table is reference
/// counted rather than duplicated.
#[derive(Debug, Clone)]
pub struct Palette {
    /// RGBA8888 entries, `colors[0]` is the transparent slot when
    /// [`Self::has_transparency`] is true.
    colors: Vec<[u8; 4]>,
    /// Oklab representation of each entry, parallel to `colors`.
    oklab: Vec<Oklab>,
    /// `colors[i]` decomposed for the hot `difference_match` path.
    rgb_bytes: Vec<[u8; 3]>,
    /// RGB555-keyed nearest-index table, shared across clones.
    mapping: Arc<[u8; MAPPING_SIZE]>,
    has_transparency: bool,
    dither_strength: f32,
    population_bias: f32,
}

impl Palette {
    /// Build a palette from an explicit list of colors, taken verbatim.
    ///
    /// If `colors[0]` is fully transparent (alpha 0), it is kept as the
    /// reserved transparent slot. Fails if `colors` is empty, has more
    /// than [`MAX_COLORS`] entries, or every entry is transparent.
    pub fn exact(colors: &[[u8; 4]]) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > MAX_COLORS {
            return Err(PaletteError::TooManyColors(colors.len()));
        }
        if colors.iter().all(|c| c[3] == 0) {
            return Err(PaletteError::AllTransparent);
        }

        let has_transparency = colors[0][3] == 0;
        let rgb_bytes: Vec<[u8; 3]> = colors.iter().map(|c| [c[0], c[1], c[2]]).collect();
        let oklab: Vec<Oklab> = rgb_bytes
            .iter()
            .map(|&[r, g, b]| Oklab::from(LinearRgb::from(Srgb::from_u8(r, g, b))))
            .collect();

        let mapping = build_mapping(&rgb_bytes, has_transparency);

        let population_bias = (colors.len() as f32).powf(-1.0 / 3.0);

        Ok(Self {
            colors: colors.to_vec(),
            oklab,
            rgb_bytes,
            mapping: Arc::new(mapping),
            has_transparency,
            dither_strength: 1.0,
            population_bias,
        })
    }

    /// Build a palette from `Srgb` colors, all fully opaque.
    pub fn from_srgb(colors: &[Srgb]) -> Result<Self, PaletteError> {
        let packed: Vec<[u8; 4]> = colors
            .iter()
            .map(|c| {
                let [r, g, b] = c.to_bytes();
                [r, g, b, 255]
            })
            .collect();
        Self::exact(&packed)
    }

    /// Build a palette from hex color strings (see [`Srgb::from_str`]).
    pub fn from_hex(colors: &[&str]) -> Result<Self, PaletteError> {
        let parsed: Result<Vec<Srgb>, _> = colors.iter().map(|s| s.parse::<Srgb>()).collect();
        Self::from_srgb(&parsed?)
    }

    /// Number of colors in use.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Whether index 0 is the reserved transparent slot.
    #[inline]
    pub fn has_transparency(&self) -> bool {
        self.has_transparency
    }

    /// The RGBA color at `index`.
    #[inline]
    pub fn color(&self, index: usize) -> [u8; 4] {
        self.colors[index]
    }

    /// All RGBA entries in use, `0..len()`.
    #[inline]
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// The full 32768-entry RGB555 nearest-index table, e.g. for
    /// persisting a palette to a preload file without re-analyzing it.
    #[inline]
    pub fn mapping_table(&self) -> &[u8; MAPPING_SIZE] {
        &self.mapping
    }

    /// Reconstruct a palette from a previously computed mapping table
    /// (see [`Self::mapping_table`]), skipping the O(colors × 32768)
    /// `buildMapping` pass `exact` would otherwise run.
    ///
    /// `colors` and `mapping` are taken on faith as already-consistent;
    /// this is only meant to be fed data this module itself produced.
    pub fn from_raw_parts(colors: Vec<[u8; 4]>, mapping: Arc<[u8; MAPPING_SIZE]>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > MAX_COLORS {
            return Err(PaletteError::TooManyColors(colors.len()));
        }
        if colors.iter().all(|c| c[3] == 0) {
            return Err(PaletteError::AllTransparent);
        }

        let has_transparency = colors[0][3] == 0;
        let rgb_bytes: Vec<[u8; 3]> = colors.iter().map(|c| [c[0], c[1], c[2]]).collect();
        let oklab: Vec<Oklab> = rgb_bytes
            .iter()
            .map(|&[r, g, b]| Oklab::from(LinearRgb::from(Srgb::from_u8(r, g, b))))
            .collect();
        let population_bias = (colors.len() as f32).powf(-1.0 / 3.0);

        Ok(Self {
            colors,
            oklab,
            rgb_bytes,
            mapping,
            has_transparency,
            dither_strength: 1.0,
            population_bias,
        })
    }

    /// The Oklab representation of the color at `index`.
    #[inline]
    pub fn oklab(&self, index: usize) -> Oklab {
        self.oklab[index]
    }

    /// Per-frame dither error scale, folding in [`Self::population_bias`].
    #[inline]
    pub fn dither_strength(&self) -> f32 {
        self.dither_strength
    }

    /// Builder: set the base dither strength (default `1.0`).
    pub fn with_dither_strength(mut self, strength: f32) -> Self {
        self.dither_strength = strength;
        self
    }

    /// `(color_count)^(-1/3)`, used to temper error diffusion magnitude
    /// for palettes with many entries.
    #[inline]
    pub fn population_bias(&self) -> f32 {
        self.population_bias
    }

    /// Look up the nearest palette index for a truncated RGB555 key,
    /// via the precomputed mapping table. Total over all 32768 keys.
    #[inline]
    pub fn nearest_for_rgb555(&self, key: u16) -> u8 {
        self.mapping[key as usize]
    }

    /// Look up the nearest palette index for full 8-bit RGB by truncating
    /// to RGB555 first (matches [`crate::color::Srgb::to_rgb555`]).
    #[inline]
    pub fn nearest_for_rgb(&self, r: u8, g: u8, b: u8) -> u8 {
        let key = ((r as u16 >> 3) << 10) | ((g as u16 >> 3) << 5) | (b as u16 >> 3);
        self.nearest_for_rgb555(key)
    }

    /// Exhaustive nearest-index search under `difference_match`, used
    /// where a dither needs a palette index for an intermediate color not
    /// aligned to the RGB555 grid (e.g. diffusion accumulators).
    pub fn nearest_exhaustive(&self, r: u8, g: u8, b: u8) -> (u8, f32) {
        let mut best_idx = 0u8;
        let mut best_dist = f32::MAX;
        let start = if self.has_transparency { 1 } else { 0 };
        for (i, &[pr, pg, pb]) in self.rgb_bytes.iter().enumerate().skip(start) {
            let d = difference_match(r, g, b, pr, pg, pb);
            if d < best_dist {
                best_dist = d;
                best_idx = i as u8;
            }
        }
        (best_idx, best_dist)
    }

    /// Exact byte-for-byte match, used by diffusion dithers to preserve
    /// crisp flat regions without perturbing them.
    pub fn exact_match(&self, r: u8, g: u8, b: u8) -> Option<u8> {
        let start = if self.has_transparency { 1 } else { 0 };
        self.rgb_bytes[start..]
            .iter()
            .position(|&c| c == [r, g, b])
            .map(|i| (i + start) as u8)
    }
}

fn build_mapping(rgb_bytes: &[[u8; 3]], has_transparency: bool) -> [u8; MAPPING_SIZE] {
    let mut mapping = [0u8; MAPPING_SIZE];
    let start = if has_transparency && rgb_bytes.len() > 1 {
        1
    } else {
        0
    };

    for key in 0..MAPPING_SIZE {
        let r5 = (key >> 10) & 0x1F;
        let g5 = (key >> 5) & 0x1F;
        let b5 = key & 0x1F;
        // Expand the 5-bit bucket to its representative 8-bit color by
        // replicating the top bits, per the RGB555-vs-RGB888 decision in
        // the design ledger.
        let r8 = ((r5 << 3) | (r5 >> 2)) as u8;
        let g8 = ((g5 << 3) | (g5 >> 2)) as u8;
        let b8 = ((b5 << 3) | (b5 >> 2)) as u8;

        let mut best_idx = start as u8;
        let mut best_dist = f32::MAX;
        for (i, &[pr, pg, pb]) in rgb_bytes.iter().enumerate().skip(start) {
            let d = difference_match(r8, g8, b8, pr, pg, pb);
            if d < best_dist {
                best_dist = d;
                best_idx = i as u8;
            }
        }
        mapping[key] = best_idx;
    }

    mapping
}
