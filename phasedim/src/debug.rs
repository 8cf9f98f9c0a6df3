// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::sync::atomic::{AtomicU32, Ordering};

/// Debug value slots.
///
/// Written from interrupt context with plain loads and stores,
/// so they are safe to use where formatted logging is not.
/// Every slot has a single writer, a handler that does not preempt itself.
/// No read-modify-write atomics are needed, which are missing on
/// targets without compare-and-swap.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Debug {
    /// Distance between the last two accepted zero-cross edges (us).
    EdgeInterval,
    /// Number of zero-cross edges dropped by the debounce.
    DebouncedEdges,
    /// Number of gate pulses.
    Pulses,
    /// Number of gate pulses fired after a missing zero-cross edge.
    FallbackPulses,
}
const NRVALUES: usize = 4;

pub struct DebugValues {
    values: [AtomicU32; NRVALUES],
}

impl DebugValues {
    pub const fn new() -> Self {
        Self {
            values: [
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
            ],
        }
    }

    #[inline]
    #[allow(unused_variables)]
    pub fn log_u32(&self, id: Debug, value: u32) {
        #[cfg(feature = "debug")]
        self.values[id as usize].store(value, Ordering::Relaxed);
    }

    #[inline]
    #[allow(unused_variables)]
    pub fn count(&self, id: Debug) {
        #[cfg(feature = "debug")]
        {
            let slot = &self.values[id as usize];
            slot.store(slot.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
        }
    }

    pub fn get(&self, id: Debug) -> u32 {
        self.values[id as usize].load(Ordering::Relaxed)
    }
}

impl Default for DebugValues {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
