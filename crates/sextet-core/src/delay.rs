//! Circular delay line with linear fractional reads.
//!
//! Linear interpolation is deliberate: its gentle high-frequency loss is the
//! same kind of bandwidth limit a bucket-brigade chip imposes, so the chorus
//! gets it for free instead of fighting it.
//!
//! The buffer is allocated once in the constructor. `read`, `write` and
//! `clear` never allocate.
//!
//! ```rust
//! use sextet_core::DelayLine;
//!
//! let mut line = DelayLine::from_time(48000.0, 0.1);
//! line.write(1.0);
//! line.write(0.0);
//! // The 1.0 was written one sample before the last write.
//! assert!((line.read(1.0) - 1.0).abs() < 1e-6);
//! ```

use alloc::vec;
use alloc::vec::Vec;
use crate::math::lerp;

/// Smallest buffer that supports linear interpolation.
const MIN_CAPACITY: usize = 2;

/// Variable-length delay line.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// A line holding at least `capacity` samples (minimum two).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(MIN_CAPACITY)],
            write_pos: 0,
        }
    }

    /// A line long enough for `max_seconds` at `sample_rate`.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        Self::new((sample_rate * max_seconds).max(0.0) as usize + 1)
    }

    /// Sample written `delay` samples before the most recent write.
    ///
    /// `delay = 0` returns the newest sample. Fractional delays blend the two
    /// neighbours linearly; out-of-range delays clamp to the buffer.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(0.0, (len - MIN_CAPACITY) as f32);
        let whole = delay as usize;
        let frac = delay - whole as f32;

        let newer = (self.write_pos + len - whole - 1) % len;
        let older = (newer + len - 1) % len;
        lerp(self.buffer[newer], self.buffer[older], frac)
    }

    /// Append one sample.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Zero the contents.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Number of samples the buffer holds.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_delay_returns_past_sample() {
        let mut line = DelayLine::new(16);
        for i in 0..10 {
            line.write(i as f32);
        }
        assert_eq!(line.read(0.0), 9.0);
        assert_eq!(line.read(3.0), 6.0);
    }

    #[test]
    fn fractional_delay_interpolates() {
        let mut line = DelayLine::new(16);
        line.write(0.0);
        line.write(1.0);
        assert!((line.read(0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn wraps_around() {
        let mut line = DelayLine::new(4);
        for i in 0..11 {
            line.write(i as f32);
        }
        assert_eq!(line.read(0.0), 10.0);
        assert_eq!(line.read(2.0), 8.0);
    }

    #[test]
    fn excessive_delay_is_clamped() {
        let mut line = DelayLine::new(4);
        for _ in 0..4 {
            line.write(0.5);
        }
        assert_eq!(line.read(100.0), 0.5);
        assert_eq!(line.read(-3.0), 0.5);
    }

    #[test]
    fn zero_capacity_is_raised() {
        let line = DelayLine::new(0);
        assert_eq!(line.capacity(), 2);
    }

    #[test]
    fn clear_silences() {
        let mut line = DelayLine::new(8);
        line.write(1.0);
        line.clear();
        assert_eq!(line.read(0.0), 0.0);
    }
}
