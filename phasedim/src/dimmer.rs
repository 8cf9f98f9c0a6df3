// -*- coding: utf-8 -*-

use crate::{
    angle::calc_angle,
    calib::{self, check_calibration},
    debug::{Debug, DebugValues},
    error::Error,
    hal::{Pin, Platform},
    mains::{Edge, Mains, halfwave_us},
    timer::{Timestamp, timer_get},
    triac::{FireState, Triac},
};
use core::{
    f64::consts::PI,
    sync::atomic::{AtomicU8, Ordering},
};

/// Full power level.
pub const LEVEL_MAX: u8 = u8::MAX;

/// Phase angle controlled dimmer for one triac / zero-cross detector pair.
///
/// The dimmer is owned by the caller. The platform's interrupt glue must
/// call [Dimmer::irq_handler_zero_cross] on every falling edge of the
/// detector line and [Dimmer::irq_handler_timer] on every firing timer expiry.
/// Any number of dimmers can coexist, each with its own platform handle.
pub struct Dimmer<P> {
    hal: P,
    zero_cross: Pin,
    triac_pin: Pin,
    level: AtomicU8,
    mains: Mains,
    triac: Triac,
    debug: DebugValues,
}

impl<P: Platform> Dimmer<P> {
    pub const fn new(hal: P, zero_cross: Pin, triac: Pin) -> Self {
        Self {
            hal,
            zero_cross,
            triac_pin: triac,
            level: AtomicU8::new(0),
            mains: Mains::new(),
            triac: Triac::new(),
            debug: DebugValues::new(),
        }
    }

    pub fn hal(&self) -> &P {
        &self.hal
    }

    /// Configure the pins and attach both interrupt sources.
    ///
    /// The dimmer starts switched off.
    pub fn begin(&self) {
        self.hal.setup_output(self.triac_pin);
        self.hal.setup_input(self.zero_cross);
        self.triac.idle(&self.hal, self.triac_pin);
        self.hal.attach_timer();
        self.hal.attach_zero_cross(self.zero_cross);
    }

    /// Measure the zero-cross detector latency and use it from now on.
    ///
    /// Blocks for up to two seconds. Must not be called from interrupt context.
    /// On failure the previous calibration stays in effect.
    pub fn calibrate(&self) -> Result<u32, Error> {
        match calib::calibrate(&self.hal, self.zero_cross, &self.mains) {
            Ok(us) => {
                self.triac.set_calibration(us);
                log::info!("Zero-cross detector calibrated to {us} us");
                Ok(us)
            }
            Err(e) => {
                log::warn!(
                    "Zero-cross detector calibration failed: {e}. Keeping {} us",
                    self.triac.calibration()
                );
                Err(e)
            }
        }
    }

    /// Set the power level. 0 is off, [LEVEL_MAX] is fully on.
    ///
    /// Levels in between are mapped to the firing angle that delivers
    /// `level / LEVEL_MAX` of the full power.
    pub fn set_level(&self, level: u8) {
        match level {
            0 => {
                self.triac.idle(&self.hal, self.triac_pin);
                log::debug!("Level 0: off");
            }
            LEVEL_MAX => {
                self.triac.full_on(&self.hal, self.triac_pin);
                log::debug!("Level {LEVEL_MAX}: fully on");
            }
            _ => {
                let halfwave = halfwave_us(self.mains.frequency());
                let angle = calc_angle(level as f64 / LEVEL_MAX as f64);
                let off_time = ((angle / PI) * halfwave as f64) as u32;
                self.triac.set_timing(halfwave, off_time);

                // Firing too close to either zero crossing is not reliable.
                let calibration = self.triac.calibration();
                if off_time < calibration {
                    self.triac.full_on(&self.hal, self.triac_pin);
                } else if off_time + calibration > halfwave {
                    self.triac.idle(&self.hal, self.triac_pin);
                } else {
                    self.triac.arm(&self.hal, self.triac_pin);
                }
                log::debug!(
                    "Level {level}: off {off_time} us, on {} us, half-wave {halfwave} us, {:?}",
                    self.triac.on_time(),
                    self.triac.state()
                );
            }
        }
        self.level.store(level, Ordering::Relaxed);
    }

    /// Override the zero-cross detector latency (us).
    pub fn set_calibration(&self, us: u32) -> Result<(), Error> {
        match check_calibration(us) {
            Ok(us) => {
                self.triac.set_calibration(us);
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected calibration: {e}");
                Err(e)
            }
        }
    }

    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }

    /// Latest mains frequency estimate (Hz).
    pub fn frequency(&self) -> f32 {
        self.mains.frequency()
    }

    /// Zero-cross detector latency (us).
    pub fn calibration(&self) -> u32 {
        self.triac.calibration()
    }

    pub fn on_time(&self) -> u32 {
        self.triac.on_time()
    }

    pub fn off_time(&self) -> u32 {
        self.triac.off_time()
    }

    pub fn half_wave(&self) -> u32 {
        self.triac.halfwave()
    }

    pub fn last_edge(&self) -> Timestamp {
        self.mains.last_edge()
    }

    pub fn fire_state(&self) -> FireState {
        self.triac.state()
    }

    pub fn debug_values(&self) -> &DebugValues {
        &self.debug
    }

    /// Falling edge on the zero-cross detector line.
    pub fn irq_handler_zero_cross(&self) {
        let now = timer_get(&self.hal);
        match self.mains.edge(now) {
            Edge::Accepted(interval) => {
                self.debug.log_u32(Debug::EdgeInterval, interval.as_micros());
                self.triac.irq_zero_cross(&self.hal);
            }
            Edge::Debounced => {
                self.debug.count(Debug::DebouncedEdges);
            }
        }
    }

    /// Firing timer expiry.
    pub fn irq_handler_timer(&self) {
        self.triac
            .irq_timer(&self.hal, self.triac_pin, &self.debug);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mock::{Call, Mock},
        triac::{DEFAULT_CALIBRATION_US, GATE_PULSE_US},
    };

    const ZC: Pin = 2;
    const TRIAC: Pin = 4;

    /// Dimmer with a 50 Hz frequency estimate.
    fn dimmer_50hz(hal: &Mock) -> Dimmer<&Mock> {
        let d = Dimmer::new(hal, ZC, TRIAC);
        d.begin();
        edge_at(&d, 20_000);
        edge_at(&d, 40_000);
        assert_eq!(d.frequency(), 50.0);
        d
    }

    fn edge_at(d: &Dimmer<&Mock>, us: u64) {
        d.hal().set_now(us);
        d.irq_handler_zero_cross();
    }

    #[test]
    fn test_begin() {
        let hal = Mock::new();
        let d = Dimmer::new(&hal, ZC, TRIAC);
        d.begin();
        assert_eq!(
            hal.calls(),
            [
                Call::SetupOutput(TRIAC),
                Call::SetupInput(ZC),
                Call::Disable,
                Call::Set(TRIAC, false),
                Call::AttachTimer,
                Call::AttachZeroCross(ZC),
            ]
        );
        assert_eq!(d.fire_state(), FireState::Idle);
        assert_eq!(d.level(), 0);
        assert_eq!(d.calibration(), DEFAULT_CALIBRATION_US);
    }

    #[test]
    fn test_level_off() {
        let hal = Mock::new();
        let d = dimmer_50hz(&hal);
        d.set_level(128);
        d.set_level(LEVEL_MAX);
        d.set_level(0);
        assert_eq!(d.level(), 0);
        assert_eq!(d.fire_state(), FireState::Idle);
        assert!(!hal.pin(TRIAC));
        assert!(!hal.timer_enabled());
    }

    #[test]
    fn test_level_full() {
        let hal = Mock::new();
        let d = dimmer_50hz(&hal);
        d.set_level(10);
        d.set_level(LEVEL_MAX);
        assert_eq!(d.level(), LEVEL_MAX);
        assert_eq!(d.fire_state(), FireState::FullOn);
        assert!(hal.pin(TRIAC));
        assert!(!hal.timer_enabled());
    }

    #[test]
    fn test_level_timing_sum() {
        let hal = Mock::new();
        let d = dimmer_50hz(&hal);
        for level in 1..LEVEL_MAX {
            d.set_level(level);
            assert_eq!(d.half_wave(), 10_000);
            assert_eq!(d.on_time() + d.off_time(), d.half_wave());
        }
        d.set_level(128);
        assert_eq!(d.fire_state(), FireState::Armed);
        assert!(hal.timer_enabled());
        // Half power fires at about 90 degrees.
        assert!((4_900..=5_000).contains(&d.off_time()));
    }

    #[test]
    fn test_level_collapse() {
        let hal = Mock::new();
        let d = dimmer_50hz(&hal);
        d.set_calibration(1_000).unwrap();

        // Firing angle too close to the start of the half-wave.
        d.set_level(254);
        assert!(d.off_time() < 1_000);
        assert_eq!(d.fire_state(), FireState::FullOn);
        assert!(hal.pin(TRIAC));
        assert!(!hal.timer_enabled());

        // Firing angle too close to the end of the half-wave.
        d.set_level(1);
        assert!(d.off_time() + 1_000 > d.half_wave());
        assert_eq!(d.fire_state(), FireState::Idle);
        assert!(!hal.pin(TRIAC));
        assert!(!hal.timer_enabled());

        d.set_level(100);
        assert_eq!(d.fire_state(), FireState::Armed);
        assert_eq!(d.level(), 100);
    }

    #[test]
    fn test_level_without_frequency() {
        let hal = Mock::new();
        let d = Dimmer::new(&hal, ZC, TRIAC);
        d.begin();
        d.set_level(128);
        assert_eq!(d.half_wave(), 10_000);
        assert_eq!(d.fire_state(), FireState::Armed);
    }

    #[test]
    fn test_set_calibration() {
        let hal = Mock::new();
        let d = Dimmer::new(&hal, ZC, TRIAC);
        assert_eq!(d.set_calibration(0), Err(Error::CalibrationRange(0)));
        assert_eq!(d.calibration(), DEFAULT_CALIBRATION_US);
        assert_eq!(
            d.set_calibration(8_333),
            Err(Error::CalibrationRange(8_333))
        );
        assert_eq!(d.set_calibration(100_000), Err(Error::CalibrationRange(100_000)));
        assert_eq!(d.calibration(), DEFAULT_CALIBRATION_US);
        assert_eq!(d.set_calibration(500), Ok(()));
        assert_eq!(d.calibration(), 500);
    }

    #[test]
    fn test_debounced_edge() {
        let hal = Mock::new();
        let d = dimmer_50hz(&hal);
        d.set_level(128);
        hal.clear_calls();

        edge_at(&d, 45_000);
        assert_eq!(d.frequency(), 50.0);
        assert_eq!(d.last_edge(), Timestamp(40_000));
        assert!(hal.calls().is_empty());
        #[cfg(feature = "debug")]
        assert_eq!(d.debug_values().get(Debug::DebouncedEdges), 1);
    }

    #[test]
    fn test_firing_sequence() {
        let hal = Mock::new();
        let d = dimmer_50hz(&hal);
        d.set_calibration(200).unwrap();
        d.set_level(128);
        let off_time = d.off_time();

        edge_at(&d, 60_000);
        assert_eq!(hal.timer_deadline(), Some(60_000 + (off_time - 200) as u64));
        #[cfg(feature = "debug")]
        assert_eq!(d.debug_values().get(Debug::EdgeInterval), 20_000);

        hal.set_now(60_000 + (off_time - 200) as u64);
        hal.clear_calls();
        d.irq_handler_timer();
        assert_eq!(
            hal.calls(),
            [
                Call::Set(TRIAC, true),
                Call::Delay(GATE_PULSE_US),
                Call::Set(TRIAC, false),
                Call::Write(10_000 - GATE_PULSE_US),
            ]
        );
        assert_eq!(d.fire_state(), FireState::Pulsing);

        edge_at(&d, 80_000);
        assert_eq!(d.fire_state(), FireState::Armed);
        assert_eq!(hal.last_write(), Some(off_time - 200));
    }

    #[test]
    fn test_calibrate_keeps_previous_on_failure() {
        let hal = Mock::new();
        let d = Dimmer::new(&hal, ZC, TRIAC);
        d.set_calibration(321).unwrap();
        assert_eq!(d.calibrate(), Err(Error::FrequencyLock));
        assert_eq!(d.calibration(), 321);

        let d = dimmer_50hz(&hal);
        d.set_calibration(321).unwrap();
        assert_eq!(d.calibrate(), Err(Error::NoDetectorActivity));
        assert_eq!(d.calibration(), 321);
    }

    #[test]
    fn test_calibrate() {
        let hal = Mock::new();
        hal.set_breathe_step(7);
        hal.set_input(|now| !(450..9_550).contains(&(now % 20_000)));
        let d = dimmer_50hz(&hal);
        let us = d.calibrate().unwrap();
        assert!((445..=455).contains(&us), "{us}");
        assert_eq!(d.calibration(), us);
    }

    #[test]
    fn test_calibrate_keeps_level_timing() {
        let hal = Mock::new();
        hal.set_breathe_step(7);
        hal.set_input(|now| !(450..9_550).contains(&(now % 20_000)));
        let d = Dimmer::new(&hal, ZC, TRIAC);
        d.begin();
        // 50.3 Hz, inside of the 50 Hz lock band.
        edge_at(&d, 19_881);
        d.set_level(128);
        assert_eq!(d.half_wave(), 9_940);
        let off_time = d.off_time();

        // Calibration locks to the nominal 10 ms half-wave internally only.
        d.calibrate().unwrap();
        assert_eq!(d.half_wave(), 9_940);
        assert_eq!(d.off_time(), off_time);
        assert_eq!(d.on_time() + d.off_time(), d.half_wave());

        assert_eq!(d.fire_state(), FireState::Armed);
        d.irq_handler_timer();
        assert_eq!(hal.last_write(), Some(9_940 - GATE_PULSE_US));

        // The next level change picks up the live frequency again.
        d.set_level(128);
        assert_eq!(d.half_wave(), 9_940);
    }
}

// vim: ts=4 sw=4 expandtab
