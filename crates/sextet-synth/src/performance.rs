//! Sustain pedal handling.
//!
//! While the pedal is down, note-offs are parked in a bounded ring instead
//! of reaching the voices. [`PerformanceState::flush_sustain`] runs once per
//! block and releases everything parked once the pedal is up.
//!
//! Note events are delivered on the render thread, so both halves of the
//! ring stay inside [`PerformanceState`] and the queue itself is never
//! shared. It serves as a fixed-capacity FIFO that never allocates. The
//! pedal flag is the only cross-thread state: an atomic shared with any
//! number of [`SustainPedal`] handles, so a control thread can move the
//! pedal without touching the render thread's state.
//!
//! A full queue never loses a release: the note-off is applied immediately
//! instead. Striking a key again while the pedal is down drops its parked
//! note-off, so lifting the pedal leaves the held key sounding.

use crate::voice_manager::VoiceManager;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Default number of parked note-offs.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// CC value at and above which the pedal is down.
pub const SUSTAIN_THRESHOLD: u8 = 64;

#[derive(Debug, Default)]
struct PedalShared {
    engaged: AtomicBool,
    inverted: AtomicBool,
}

/// Cloneable, thread-safe view of the sustain pedal.
///
/// ```rust
/// use sextet_synth::PerformanceState;
///
/// let state = PerformanceState::new(16);
/// let pedal = state.sustain_pedal();
/// pedal.set_value(127);
/// assert!(state.is_sustain_engaged());
/// pedal.set_value(0);
/// assert!(!state.is_sustain_engaged());
/// ```
#[derive(Debug, Clone)]
pub struct SustainPedal {
    shared: Arc<PedalShared>,
}

impl SustainPedal {
    /// Apply a CC64 value (0..=127).
    pub fn set_value(&self, value: u8) {
        let down = value >= SUSTAIN_THRESHOLD;
        let inverted = self.shared.inverted.load(Ordering::Relaxed);
        self.shared.engaged.store(down != inverted, Ordering::Release);
    }

    /// True while the pedal holds notes.
    pub fn is_engaged(&self) -> bool {
        self.shared.engaged.load(Ordering::Acquire)
    }

    /// Flip CC polarity for reversed pedals.
    pub fn set_inverted(&self, inverted: bool) {
        self.shared.inverted.store(inverted, Ordering::Relaxed);
    }

    /// True when polarity is flipped.
    pub fn is_inverted(&self) -> bool {
        self.shared.inverted.load(Ordering::Relaxed)
    }
}

/// Sustain pedal state plus the queue of deferred note-offs.
pub struct PerformanceState {
    pedal: SustainPedal,
    pending: HeapProd<u8>,
    drain: HeapCons<u8>,
}

impl core::fmt::Debug for PerformanceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PerformanceState")
            .field("engaged", &self.pedal.is_engaged())
            .field("pending", &self.drain.occupied_len())
            .finish()
    }
}

impl Default for PerformanceState {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl PerformanceState {
    /// Pedal up, queue of `capacity` (at least 1) note numbers.
    pub fn new(capacity: usize) -> Self {
        let (pending, drain) = HeapRb::<u8>::new(capacity.max(1)).split();
        Self {
            pedal: SustainPedal {
                shared: Arc::new(PedalShared::default()),
            },
            pending,
            drain,
        }
    }

    /// Handle sharing this state's pedal flag.
    pub fn sustain_pedal(&self) -> SustainPedal {
        self.pedal.clone()
    }

    /// Apply a CC64 value (0..=127).
    pub fn handle_sustain(&self, value: u8) {
        self.pedal.set_value(value);
    }

    /// Flip CC polarity for reversed pedals.
    pub fn set_inverted(&self, inverted: bool) {
        self.pedal.set_inverted(inverted);
    }

    /// True while the pedal holds notes.
    pub fn is_sustain_engaged(&self) -> bool {
        self.pedal.is_engaged()
    }

    /// Route a note-off: parked while sustained, otherwise straight to the
    /// voices.
    pub fn handle_note_off(&mut self, note: u8, voices: &mut VoiceManager) {
        if !self.pedal.is_engaged() {
            voices.note_off(note);
            return;
        }
        if self.pending.try_push(note).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(note, "sustain queue full, releasing immediately");
            voices.note_off(note);
        }
    }

    /// Forget any parked note-off for a key that is struck again.
    ///
    /// Parked notes keep their order. Call before the note reaches the
    /// voices.
    pub fn handle_note_on(&mut self, note: u8) {
        for _ in 0..self.drain.occupied_len() {
            if let Some(parked) = self.drain.try_pop().filter(|&p| p != note) {
                // The pop just freed a slot.
                let _ = self.pending.try_push(parked);
            }
        }
    }

    /// Release every parked note if the pedal is up. Call once per block.
    pub fn flush_sustain(&mut self, voices: &mut VoiceManager) {
        if self.pedal.is_engaged() {
            return;
        }
        while let Some(note) = self.drain.try_pop() {
            voices.note_off(note);
        }
    }

    /// Drop parked note-offs without releasing them.
    pub fn clear(&mut self) {
        self.drain.clear();
    }

    /// Number of parked note-offs.
    pub fn pending_count(&self) -> usize {
        self.drain.occupied_len()
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.drain.capacity().get()
    }
}
