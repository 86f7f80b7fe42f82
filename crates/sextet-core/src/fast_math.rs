//! Fast approximations for control-rate math.
//!
//! | Function | Replaces | Used for | Max error |
//! |----------|----------|----------|-----------|
//! | [`fast_exp2`] | `libm::exp2f` | octave modulation to Hz | < 0.02% |
//! | [`fast_tan`] | `libm::tanf` | ladder prewarp below ~10 kHz | < 0.1% (x < π/4) |
//!
//! Not for audio-rate waveshaping; the voice output stage uses `libm::tanhf`.

use libm::floorf;

/// Base-2 exponential.
///
/// Splits `x` into integer and fractional parts: the integer part is written
/// straight into the IEEE 754 exponent, the fraction goes through a cubic
/// minimax polynomial pinned to 1 and 2 at the ends of the octave, so integer
/// inputs are exact. Input is clamped to ±126.
///
/// ```
/// use sextet_core::fast_math::fast_exp2;
///
/// assert!((fast_exp2(1.0) - 2.0).abs() < 0.01);
/// assert!((fast_exp2(-2.0) - 0.25).abs() < 0.001);
/// ```
#[inline]
pub fn fast_exp2(x: f32) -> f32 {
    let x = x.clamp(-126.0, 126.0);
    let whole = floorf(x);
    let f = x - whole;
    let poly = 1.0 + f * (0.695_424_4 + f * (0.226_307_6 + f * 0.078_268_0));
    f32::from_bits(((whole as i32 + 127) as u32) << 23) * poly
}

/// Tangent via a [3/2] Padé approximant, `x(15 − x²) / (15 − 6x²)`.
///
/// Accurate for the bilinear prewarp `tan(π fc / fs)` while `fc < fs / 4`;
/// callers switch to `libm::tanf` above that.
#[inline]
pub fn fast_tan(x: f32) -> f32 {
    let x2 = x * x;
    x * (15.0 - x2) / (15.0 - 6.0 * x2)
}
