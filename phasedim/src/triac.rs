// -*- coding: utf-8 -*-

use crate::{
    debug::{Debug, DebugValues},
    hal::{Clock, FiringTimer, Gpio, Pin},
};
use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// Gate pulse width (us).
pub const GATE_PULSE_US: u32 = 10;

/// Detector latency assumed until calibrated (us).
pub const DEFAULT_CALIBRATION_US: u32 = 192;

/// Pulses per zero-cross edge. The detector fires once per mains period.
pub const PULSES_PER_EDGE: u8 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum FireState {
    /// Gate inactive, timer off.
    Idle = 0,
    /// Gate permanently active, timer off.
    FullOn,
    /// Timer counts towards the end of the off-time.
    Armed,
    /// Gate was pulsed. Timer counts towards the next half-wave.
    Pulsing,
}

impl FireState {
    const fn from_u8(v: u8) -> Self {
        match v {
            1 => FireState::FullOn,
            2 => FireState::Armed,
            3 => FireState::Pulsing,
            _ => FireState::Idle,
        }
    }

    const fn is_timed(self) -> bool {
        matches!(self, FireState::Armed | FireState::Pulsing)
    }
}

/// Triac firing state machine.
///
/// The two `irq_*` methods run in interrupt context. They only do
/// integer arithmetic on the timing fields and never block,
/// except for the short gate pulse.
pub struct Triac {
    state: AtomicU8,
    pulses: AtomicU8,
    on_time: AtomicU32,
    off_time: AtomicU32,
    halfwave: AtomicU32,
    calibration: AtomicU32,
}

impl Triac {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(FireState::Idle as u8),
            pulses: AtomicU8::new(0),
            on_time: AtomicU32::new(0),
            off_time: AtomicU32::new(0),
            halfwave: AtomicU32::new(0),
            calibration: AtomicU32::new(DEFAULT_CALIBRATION_US),
        }
    }

    pub fn state(&self) -> FireState {
        FireState::from_u8(self.state.load(Ordering::Relaxed))
    }

    fn set_state(&self, state: FireState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    pub fn on_time(&self) -> u32 {
        self.on_time.load(Ordering::Relaxed)
    }

    pub fn off_time(&self) -> u32 {
        self.off_time.load(Ordering::Relaxed)
    }

    pub fn halfwave(&self) -> u32 {
        self.halfwave.load(Ordering::Relaxed)
    }

    pub fn calibration(&self) -> u32 {
        self.calibration.load(Ordering::Relaxed)
    }

    pub fn set_calibration(&self, us: u32) {
        self.calibration.store(us, Ordering::Relaxed);
    }

    pub fn set_timing(&self, halfwave: u32, off_time: u32) {
        let off_time = off_time.min(halfwave);
        self.halfwave.store(halfwave, Ordering::Relaxed);
        self.off_time.store(off_time, Ordering::Relaxed);
        self.on_time.store(halfwave - off_time, Ordering::Relaxed);
    }

    /// Gate off, timer off.
    pub fn idle<H: Gpio + FiringTimer>(&self, hal: &H, pin: Pin) {
        // State first, so that a handler running in between does nothing.
        self.set_state(FireState::Idle);
        hal.disable();
        hal.set(pin, false);
    }

    /// Gate on, timer off.
    pub fn full_on<H: Gpio + FiringTimer>(&self, hal: &H, pin: Pin) {
        self.set_state(FireState::FullOn);
        hal.disable();
        hal.set(pin, true);
    }

    /// Phase controlled firing, starting with the next zero-cross edge.
    pub fn arm<H: Gpio + FiringTimer>(&self, hal: &H, pin: Pin) {
        if !self.state().is_timed() {
            hal.set(pin, false);
            self.set_state(FireState::Armed);
        }
        hal.enable();
    }

    /// Accepted zero-cross edge. Interrupt context.
    #[inline]
    pub fn irq_zero_cross<H: FiringTimer>(&self, hal: &H) {
        if self.state().is_timed() {
            let delay = self.off_time().saturating_sub(self.calibration());
            hal.write_us(delay);
            self.pulses.store(0, Ordering::Relaxed);
            self.set_state(FireState::Armed);
        }
    }

    /// Firing timer expiry. Interrupt context.
    ///
    /// Every pulse re-arms the timer to one half-wave later, which fires the
    /// following half-wave without a detector edge. More than [PULSES_PER_EDGE]
    /// pulses in a row mean that the zero-cross edge did not arrive.
    #[inline]
    pub fn irq_timer<H: Clock + Gpio + FiringTimer>(
        &self,
        hal: &H,
        pin: Pin,
        debug: &DebugValues,
    ) {
        let state = self.state();
        if !state.is_timed() {
            return;
        }
        let pulses = self.pulses.load(Ordering::Relaxed);
        if state == FireState::Pulsing && pulses >= PULSES_PER_EDGE {
            debug.count(Debug::FallbackPulses);
        }
        self.pulses.store(pulses.saturating_add(1), Ordering::Relaxed);

        hal.set(pin, true);
        hal.delay_us(GATE_PULSE_US);
        hal.set(pin, false);
        hal.write_us(self.halfwave().saturating_sub(GATE_PULSE_US));
        self.set_state(FireState::Pulsing);

        debug.count(Debug::Pulses);
    }
}

impl Default for Triac {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
