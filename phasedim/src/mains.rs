// -*- coding: utf-8 -*-

use crate::{
    atomic::{AtomicF32, AtomicTimestamp},
    timer::{RelTimestamp, Timestamp},
};

/// Nominal mains frequencies (Hz).
pub const NOMINAL_FREQS: [f32; 2] = [50.0, 60.0];

/// Maximum deviation from a nominal frequency that still counts as locked (Hz).
pub const FREQ_VAR: f32 = 0.4;

/// Zero-cross edges closer than this are bounce.
/// Fixed to half the 50 Hz period, also on 60 Hz mains.
pub const DEBOUNCE: RelTimestamp = RelTimestamp::from_micros(1_000_000 / 50 / 2);

/// Half-wave used while there is no usable frequency estimate (50 Hz).
pub const NOMINAL_HALFWAVE_US: u32 = 10_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Edge {
    /// Accepted edge. Contains the distance to the previous accepted edge.
    Accepted(RelTimestamp),
    /// Bounce. Nothing was updated.
    Debounced,
}

/// Mains frequency tracking from the zero-cross detector edges.
pub struct Mains {
    frequency: AtomicF32,
    last_edge: AtomicTimestamp,
}

impl Mains {
    pub const fn new() -> Self {
        Self {
            frequency: AtomicF32::new(0.0),
            last_edge: AtomicTimestamp::new(Timestamp::new()),
        }
    }

    /// Evaluate one falling edge of the detector. Interrupt context.
    #[inline]
    pub fn edge(&self, now: Timestamp) -> Edge {
        let interval = now - self.last_edge.load();
        if interval < DEBOUNCE {
            return Edge::Debounced;
        }
        self.frequency.store(1e6 / interval.as_micros() as f32);
        self.last_edge.store(now);
        Edge::Accepted(interval)
    }

    /// Latest frequency estimate (Hz). Zero before the first accepted edge.
    pub fn frequency(&self) -> f32 {
        self.frequency.load()
    }

    pub fn last_edge(&self) -> Timestamp {
        self.last_edge.load()
    }
}

impl Default for Mains {
    fn default() -> Self {
        Self::new()
    }
}

/// Half-wave duration (us) of the given mains frequency.
///
/// Falls back to [NOMINAL_HALFWAVE_US], if the frequency is unusable.
pub fn halfwave_us(frequency: f32) -> u32 {
    if frequency.is_finite() && frequency > 0.0 {
        ((1e6 / frequency) / 2.0) as u32
    } else {
        NOMINAL_HALFWAVE_US
    }
}

/// Snap a measured frequency to 50 Hz or 60 Hz, if it is within [FREQ_VAR].
pub fn nominal_frequency(frequency: f32) -> Option<f32> {
    NOMINAL_FREQS
        .iter()
        .copied()
        .find(|nominal| (frequency - nominal).abs() <= FREQ_VAR)
}


// vim: ts=4 sw=4 expandtab
