//! Fast scalar math helpers shared by the color and dither modules.
//!
//! None of these need to be bit-exact with `libm`; dithering and palette
//! analysis only care that they are monotonic, cheap, and deterministic.

/// Fast cube root via a bit-twiddled initial guess and two Newton iterations.
///
/// Used by the Oklab conversion, which needs `x.cbrt()` for every pixel of
/// every frame; the standard library's `f32::cbrt` is correctly rounded but
/// noticeably slower than this for the precision dithering actually needs.
#[inline]
pub fn fast_cbrt(x: f32) -> f32 {
    if x == 0.0 {
        return 0.0;
    }
    let sign = x.signum();
    let x = x.abs();

    // Bit-hack initial guess (Kahan's constant for cube root).
    let bits = x.to_bits();
    let guess_bits = bits / 3 + 0x2a51_67e7;
    let mut y = f32::from_bits(guess_bits);

    // Two rounds of Newton's method on f(y) = y^3 - x.
    for _ in 0..2 {
        y = y - (y - x / (y * y)) / 3.0;
    }

    sign * y
}

/// Fast two-argument arctangent, accurate to within ~0.005 rad.
///
/// Used by `differenceHW` to bucket colors into hue sectors; exact atan2
/// isn't needed since sector boundaries are coarse (16 sectors).
#[inline]
pub fn fast_atan2(y: f32, x: f32) -> f32 {
    const QUARTER_PI: f32 = std::f32::consts::FRAC_PI_4;
    const THREE_QUARTER_PI: f32 = 3.0 * std::f32::consts::FRAC_PI_4;

    if x == 0.0 && y == 0.0 {
        return 0.0;
    }

    let abs_y = y.abs() + 1e-10;
    let (angle, r) = if x >= 0.0 {
        let r = (x - abs_y) / (x + abs_y);
        (QUARTER_PI - QUARTER_PI * r, r)
    } else {
        let r = (x + abs_y) / (abs_y - x);
        (THREE_QUARTER_PI - QUARTER_PI * r, r)
    };
    let _ = r;

    if y < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Approximate inverse normal CDF (probit): maps a uniform `0..1` threshold
/// to a Gaussian-distributed one, for callers that want a noise spread
/// concentrated around its center rather than flat.
///
/// Valid for `p` in `(0, 1)`; clamps at the boundaries rather than
/// returning infinities.
pub fn probit(p: f32) -> f32 {
    let p = p.clamp(1e-6, 1.0 - 1e-6);

    // Acklam's rational approximation.
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    let p = p as f64;
    const P_LOW: f64 = 0.02425;
    let result = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    result as f32
}

/// Monotone "bias/gain" spline over `[0, 1]`, used by `forward_light` to
/// compress highlight detail before palette mapping.
///
/// `bias` shifts the midpoint; `gain` controls contrast around it. Both
/// parameters are expected in `(0, 1)`.
#[inline]
pub fn bias_gain(t: f32, bias: f32, gain: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let biased = t.powf(bias.ln() / 0.5_f32.ln());
    if biased < 0.5 {
        0.5 * (2.0 * biased).powf(gain)
    } else {
        1.0 - 0.5 * (2.0 - 2.0 * biased).powf(gain)
    }
}

/// Convert an unsigned byte (0..=255) to a centered float in `[-0.5, 0.5]`.
#[inline]
pub fn byte_to_centered(b: u8) -> f32 {
    b as f32 / 255.0 - 0.5
}

/// Convert a centered float in `[-0.5, 0.5]` back to a byte, clamping.
#[inline]
pub fn centered_to_byte(f: f32) -> u8 {
    (((f + 0.5) * 255.0).round().clamp(0.0, 255.0)) as u8
}
