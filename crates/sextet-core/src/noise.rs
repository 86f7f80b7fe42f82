//! Xorshift32 pseudo-random source.
//!
//! Cheap, allocation-free and deterministic per seed. Feeds the DCO noise
//! channel, oscillator drift, chorus hiss and BBD clock noise. Each consumer
//! owns its own generator so voices never share a random stream.

/// Marsaglia xorshift32 generator.
#[derive(Debug, Clone)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Generator seeded with `seed`. A zero seed (the one fixed point of
    /// xorshift) is replaced with a non-zero constant.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x2545_F491 } else { seed },
        }
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in `[-1, 1]`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        (self.next_u32() as i32 as f32) * (1.0 / i32::MAX as f32)
    }

    /// Uniform value in `[0, 1]`.
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Fair coin flip.
    #[inline]
    pub fn next_bool(&mut self) -> bool {
        self.next_u32() & 0x8000_0000 != 0
    }
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}
