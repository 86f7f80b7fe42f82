//! Lock-free parameter publishing from a control thread to the render thread.
//!
//! A [`SynthParams`] snapshot is flattened into a fixed array of `AtomicU32`
//! slots guarded by a sequence counter (a seqlock):
//!
//! ```text
//! writer: seq = odd ─► fence ─► store slots ─► seq = even (Release)
//! reader: s1 = seq (Acquire) ─► load slots ─► fence ─► s2 = seq
//!         accept iff s1 == s2 and s1 is even
//! ```
//!
//! The reader never blocks and never allocates; a read that overlaps a
//! write is discarded and the previous snapshot stays in force until the
//! next block. The publisher is a unique owner, so there is only ever one
//! writer.

use crate::params::{
    ChorusMode, DcoRange, HpfMode, PolyMode, PwmMode, SynthParams, VcaMode, VcfPolarity,
};
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering, fence};

/// Number of 32-bit slots in an encoded snapshot.
pub const PARAM_SLOTS: usize = 35;

#[derive(Debug)]
struct SharedSnapshot {
    sequence: AtomicU32,
    slots: [AtomicU32; PARAM_SLOTS],
}

/// Single writer half. Not `Clone`.
#[derive(Debug)]
pub struct ParamPublisher {
    shared: Arc<SharedSnapshot>,
}

/// Render-thread half. Holds the last accepted snapshot.
#[derive(Debug)]
pub struct ParamReceiver {
    shared: Arc<SharedSnapshot>,
    seen: u32,
    current: SynthParams,
}

/// Create a connected publisher/receiver pair seeded with `initial`.
///
/// ```rust
/// use sextet_synth::{SynthParams, param_channel};
///
/// let (mut tx, mut rx) = param_channel(SynthParams::default());
/// assert!(rx.poll().is_none());
///
/// tx.publish(&SynthParams { vcf_cutoff: 0.25, ..SynthParams::default() });
/// assert_eq!(rx.poll().map(|p| p.vcf_cutoff), Some(0.25));
/// assert!(rx.poll().is_none());
/// ```
pub fn param_channel(initial: SynthParams) -> (ParamPublisher, ParamReceiver) {
    let encoded = encode(&initial);
    let shared = Arc::new(SharedSnapshot {
        sequence: AtomicU32::new(0),
        slots: core::array::from_fn(|i| AtomicU32::new(encoded[i])),
    });
    (
        ParamPublisher {
            shared: Arc::clone(&shared),
        },
        ParamReceiver {
            shared,
            seen: 0,
            current: initial,
        },
    )
}

impl ParamPublisher {
    /// Publish a new snapshot. Wait-free.
    pub fn publish(&mut self, params: &SynthParams) {
        let encoded = encode(params);
        let seq = self.shared.sequence.load(Ordering::Relaxed);
        self.shared
            .sequence
            .store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        for (slot, value) in self.shared.slots.iter().zip(encoded) {
            slot.store(value, Ordering::Relaxed);
        }
        self.shared
            .sequence
            .store(seq.wrapping_add(2), Ordering::Release);
    }
}

impl ParamReceiver {
    /// Fetch a newer snapshot if one was published and read cleanly.
    ///
    /// Returns `None` when nothing changed or the read was torn; in both
    /// cases [`latest`](Self::latest) keeps the previous snapshot.
    pub fn poll(&mut self) -> Option<SynthParams> {
        let before = self.shared.sequence.load(Ordering::Acquire);
        if before == self.seen || before & 1 == 1 {
            return None;
        }

        let mut raw = [0u32; PARAM_SLOTS];
        for (dst, slot) in raw.iter_mut().zip(&self.shared.slots) {
            *dst = slot.load(Ordering::Relaxed);
        }
        fence(Ordering::Acquire);
        let after = self.shared.sequence.load(Ordering::Relaxed);
        if after != before {
            #[cfg(feature = "tracing")]
            tracing::trace!(before, after, "torn parameter snapshot discarded");
            return None;
        }

        self.seen = before;
        self.current = decode(&raw);
        Some(self.current)
    }

    /// Last accepted snapshot.
    pub fn latest(&self) -> &SynthParams {
        &self.current
    }
}

#[inline]
fn flag(b: bool) -> u32 {
    u32::from(b)
}

fn encode(p: &SynthParams) -> [u32; PARAM_SLOTS] {
    [
        p.dco_range as u32,
        flag(p.saw_on),
        flag(p.pulse_on),
        p.pwm.to_bits(),
        p.pwm_mode as u32,
        p.sub_level.to_bits(),
        p.noise_level.to_bits(),
        p.lfo_to_dco.to_bits(),
        p.hpf_mode as u32,
        p.vcf_cutoff.to_bits(),
        p.resonance.to_bits(),
        p.env_amount.to_bits(),
        p.lfo_to_vcf.to_bits(),
        p.key_tracking.to_bits(),
        p.vcf_polarity as u32,
        p.vca_mode as u32,
        p.vca_level.to_bits(),
        p.attack.to_bits(),
        p.decay.to_bits(),
        p.sustain.to_bits(),
        p.release.to_bits(),
        p.lfo_rate.to_bits(),
        p.lfo_delay.to_bits(),
        p.chorus as u32,
        p.poly_mode.selector(),
        p.bender.to_bits(),
        p.bender_to_dco.to_bits(),
        p.bender_to_vcf.to_bits(),
        p.mod_wheel.to_bits(),
        flag(p.portamento_on),
        flag(p.portamento_legato),
        p.portamento_time.to_bits(),
        p.tune.to_bits(),
        p.drift.to_bits(),
        p.master_level.to_bits(),
    ]
}

fn decode(raw: &[u32; PARAM_SLOTS]) -> SynthParams {
    let f = |i: usize| f32::from_bits(raw[i]);
    let b = |i: usize| raw[i] != 0;
    SynthParams {
        dco_range: DcoRange::from_index(raw[0]),
        saw_on: b(1),
        pulse_on: b(2),
        pwm: f(3),
        pwm_mode: PwmMode::from_index(raw[4]),
        sub_level: f(5),
        noise_level: f(6),
        lfo_to_dco: f(7),
        hpf_mode: HpfMode::from_index(raw[8]),
        vcf_cutoff: f(9),
        resonance: f(10),
        env_amount: f(11),
        lfo_to_vcf: f(12),
        key_tracking: f(13),
        vcf_polarity: VcfPolarity::from_index(raw[14]),
        vca_mode: VcaMode::from_index(raw[15]),
        vca_level: f(16),
        attack: f(17),
        decay: f(18),
        sustain: f(19),
        release: f(20),
        lfo_rate: f(21),
        lfo_delay: f(22),
        chorus: ChorusMode::from_index(raw[23]),
        poly_mode: PolyMode::from_selector(raw[24]),
        bender: f(25),
        bender_to_dco: f(26),
        bender_to_vcf: f(27),
        mod_wheel: f(28),
        portamento_on: b(29),
        portamento_legato: b(30),
        portamento_time: f(31),
        tune: f(32),
        drift: f(33),
        master_level: f(34),
    }
}
