//! The [`Effect`] trait: a mono, stateful, sample-at-a-time processor.
//!
//! Filters in this crate implement it so voice and engine code can run them
//! per sample or over a block in place without caring which filter it is.
//! Object-safe; no method allocates.

/// Mono audio processor.
///
/// ```rust
/// use sextet_core::Effect;
///
/// struct Halve;
///
/// impl Effect for Halve {
///     fn process(&mut self, input: f32) -> f32 {
///         input * 0.5
///     }
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///     fn reset(&mut self) {}
/// }
///
/// let mut buf = [1.0, -1.0];
/// Halve.process_block_inplace(&mut buf);
/// assert_eq!(buf, [0.5, -0.5]);
/// ```
pub trait Effect {
    /// Process one sample, advancing internal state.
    fn process(&mut self, input: f32) -> f32;

    /// Process `input` into `output`. Extra samples in the longer slice are
    /// left untouched.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.process(*x);
        }
    }

    /// Process a buffer in place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Recompute sample-rate dependent coefficients.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear history without touching parameters.
    fn reset(&mut self);
}

impl Effect for crate::Biquad {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        crate::Biquad::process(self, input)
    }

    /// Biquad designs are computed for a fixed rate; callers redesign
    /// through [`set_coefficients`](crate::Biquad::set_coefficients).
    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {
        self.clear();
    }
}

impl Effect for crate::OnePole {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        crate::OnePole::process(self, input)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        crate::OnePole::set_sample_rate(self, sample_rate);
    }

    fn reset(&mut self) {
        crate::OnePole::reset(self);
    }
}

impl Effect for crate::DcBlocker {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        crate::DcBlocker::process(self, input)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        crate::DcBlocker::set_sample_rate(self, sample_rate);
    }

    fn reset(&mut self) {
        crate::DcBlocker::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Biquad, BiquadCoefficients, DcBlocker};

    #[test]
    fn block_matches_per_sample() {
        let coeffs = BiquadCoefficients::lowpass(2000.0, 0.707, 48000.0);
        let mut a = Biquad::with_coefficients(coeffs);
        let mut b = Biquad::with_coefficients(coeffs);

        let input: [f32; 16] = core::array::from_fn(|i| if i % 3 == 0 { 1.0 } else { -0.5 });
        let mut block = input;
        Effect::process_block_inplace(&mut a, &mut block);
        for (i, x) in input.iter().enumerate() {
            assert_eq!(block[i], b.process(*x));
        }
    }

    #[test]
    fn dyn_dispatch_works() {
        let mut chain: [&mut dyn Effect; 2] = [
            &mut DcBlocker::new(48000.0),
            &mut Biquad::new(),
        ];
        let mut y = 1.0;
        for stage in chain.iter_mut() {
            y = stage.process(y);
        }
        assert!(y.is_finite());
        for stage in chain.iter_mut() {
            stage.reset();
        }
    }
}
