//! Named error-diffusion kernels.
//!
//! Each kernel lists `(dx, dy, weight)` offsets relative to the pixel just
//! quantized; weights are divided by `divisor` to get the diffused
//! fraction. `max_dy` is the largest `dy` any entry uses, so callers know
//! how many rows of lookahead buffer they need.

/// A fixed error-diffusion kernel.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    /// `(dx, dy, weight)` offsets. `dx` is pre-serpentine; callers mirror
    /// it horizontally on right-to-left rows.
    pub entries: &'static [(i32, i32, u8)],
    pub divisor: u16,
    pub max_dy: usize,
}

/// Floyd-Steinberg: the canonical 4-neighbor diffusion kernel, backing
/// DIFFUSION and every other Floyd-Steinberg-derived algorithm in §4.3
/// (SCATTER, NEUE, WOVEN, DODGY, WREN).
///
/// ```text
///       X   7
///   3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
    max_dy: 1,
};

/// Burkes: 8-way diffusion, backing BURKES and OVERBOARD.
pub const BURKES: Kernel = Kernel {
    entries: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
    ],
    divisor: 32,
    max_dy: 1,
};

impl Kernel {
    /// Sum of all weights divided by `divisor`; should be `1.0` (all error
    /// accounted for) for every kernel above.
    pub fn total_fraction(&self) -> f32 {
        self.entries.iter().map(|&(_, _, w)| w as f32).sum::<f32>() / self.divisor as f32
    }

    /// Horizontally mirror `dx` for right-to-left serpentine rows.
    pub fn mirrored_entries(&self) -> Vec<(i32, i32, u8)> {
        self.entries.iter().map(|&(dx, dy, w)| (-dx, dy, w)).collect()
    }
}
