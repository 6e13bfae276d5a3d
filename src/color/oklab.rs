//! Oklab perceptual color space.
//!
//! Oklab (Björn Ottosson, "A perceptual color space for image processing",
//! 2021) is used for palette peak selection and nearest-color search because
//! Euclidean distance in it tracks perceived difference far better than
//! Euclidean distance in linear or sRGB space.

use super::linear_rgb::LinearRgb;

/// A color in Oklab space: `l` is perceptual lightness, `a`/`b` are the
/// green-red and blue-yellow chroma axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklab {
    /// Perceptual lightness, roughly `0.0..=1.0`.
    pub l: f32,
    /// Green-red axis.
    pub a: f32,
    /// Blue-yellow axis.
    pub b: f32,
}

impl Oklab {
    /// Squared Euclidean distance. Cheaper than [`Self::hyab_distance`] and
    /// adequate when the palette is roughly achromatic.
    #[inline]
    pub fn distance_squared(self, other: Oklab) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }

    /// HyAB distance (Abasi et al., "Distance metrics for very low-resolution
    /// color image difference evaluation", 2020): Manhattan distance on
    /// lightness plus Euclidean distance on chroma, weighted.
    ///
    /// `kl` scales the lightness term relative to chroma; `1.0` is
    /// unweighted HyAB.
    #[inline]
    pub fn hyab_distance(self, other: Oklab, kl: f32) -> f32 {
        let dl = (self.l - other.l).abs();
        let da = self.a - other.a;
        let db = self.b - other.b;
        kl * dl + (da * da + db * db).sqrt()
    }

    /// Chroma magnitude, `sqrt(a^2 + b^2)`.
    #[inline]
    pub fn chroma(self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

impl From<LinearRgb> for Oklab {
    fn from(rgb: LinearRgb) -> Self {
        let l = 0.4122214708 * rgb.r + 0.5363325363 * rgb.g + 0.0514459929 * rgb.b;
        let m = 0.2119034982 * rgb.r + 0.6806995451 * rgb.g + 0.1073969566 * rgb.b;
        let s = 0.0883024619 * rgb.r + 0.2817188376 * rgb.g + 0.6299787005 * rgb.b;

        let l_ = crate::bitmath::fast_cbrt(l);
        let m_ = crate::bitmath::fast_cbrt(m);
        let s_ = crate::bitmath::fast_cbrt(s);

        Oklab {
            l: 0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_,
            a: 1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_,
            b: 0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_,
        }
    }
}

impl From<Oklab> for LinearRgb {
    fn from(lab: Oklab) -> Self {
        let l_ = lab.l + 0.3963377774 * lab.a + 0.2158037573 * lab.b;
        let m_ = lab.l - 0.1055613458 * lab.a - 0.0638541728 * lab.b;
        let s_ = lab.l - 0.0894841775 * lab.a - 1.2914855480 * lab.b;

        let l = l_ * l_ * l_;
        let m = m_ * m_ * m_;
        let s = s_ * s_ * s_;

        LinearRgb {
            r: 4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s,
            g: -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s,
            b: -0.0041960863 * l - 0.7034186147 * m + 1.7076147010 * s,
        }
    }
}
