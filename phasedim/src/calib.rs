// -*- coding: utf-8 -*-

//! Zero-cross detector latency calibration.
//!
//! The detector line is pulled low while the mains voltage is beyond the
//! detector threshold in one half-wave. It goes active `L` us after the
//! zero crossing and inactive `L` us before the next one, so the active
//! interval is `halfwave - 2 L`.

use crate::{
    error::Error,
    hal::{Breathe, Clock, Gpio, Pin},
    mains::{Mains, halfwave_us, nominal_frequency},
    timer::{RelTimestamp, Timestamp, timer_get},
};

/// Maximum time to wait for the frequency estimate to settle.
pub const LOCK_TIMEOUT: RelTimestamp = RelTimestamp::from_millis(1000);

/// Detector sampling window.
pub const MEASURE_WINDOW: RelTimestamp = RelTimestamp::from_millis(1000);

/// Exclusive upper calibration limit (us). The 60 Hz half-wave.
pub const CALIBRATION_LIMIT_US: u32 = 1_000_000 / 2 / 60;

/// Check a detector latency value against the plausible range.
pub fn check_calibration(us: u32) -> Result<u32, Error> {
    if us == 0 || us >= CALIBRATION_LIMIT_US {
        Err(Error::CalibrationRange(us))
    } else {
        Ok(us)
    }
}

/// Wait for the live frequency estimate to settle on 50 Hz or 60 Hz.
///
/// Returns the nominal half-wave duration (us).
pub fn lock_frequency<H: Clock + Breathe>(hal: &H, mains: &Mains) -> Result<u32, Error> {
    let start = timer_get(hal);
    loop {
        if timer_get(hal) - start >= LOCK_TIMEOUT {
            return Err(Error::FrequencyLock);
        }
        if let Some(nominal) = nominal_frequency(mains.frequency()) {
            return Ok(halfwave_us(nominal));
        }
        hal.breathe();
    }
}

/// Accumulated detector active intervals.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ActiveStats {
    pub total_us: u64,
    pub count: u32,
}

impl ActiveStats {
    pub fn add(&mut self, dur: RelTimestamp) {
        self.total_us += dur.as_micros() as u64;
        self.count += 1;
    }

    pub fn mean_us(&self) -> Option<u32> {
        if self.count == 0 {
            None
        } else {
            Some((self.total_us / self.count as u64) as u32)
        }
    }
}

/// Sample the raw detector line for [MEASURE_WINDOW].
///
/// Only intervals that start and end inside of the window are counted.
pub fn measure_active<H: Clock + Gpio + Breathe>(hal: &H, pin: Pin) -> ActiveStats {
    let mut stats = ActiveStats::default();
    let mut rise: Option<Timestamp> = None;

    let start = timer_get(hal);
    let mut previous = !hal.get(pin); // active low
    loop {
        let now = timer_get(hal);
        if now - start >= MEASURE_WINDOW {
            break;
        }
        let active = !hal.get(pin);
        if active && !previous {
            rise = Some(now);
        }
        if !active && previous {
            if let Some(rise) = rise.take() {
                stats.add(now - rise);
            }
        }
        previous = active;
        hal.breathe();
    }

    stats
}

/// Detector latency from the half-wave and the measured active intervals.
///
/// Half of the time per half-wave the detector is blind.
pub fn latency_us(halfwave: u32, stats: &ActiveStats) -> Result<u32, Error> {
    let mean = stats.mean_us().ok_or(Error::NoDetectorActivity)?;
    let blind = halfwave
        .checked_sub(mean)
        .ok_or(Error::CalibrationRange(0))?;
    check_calibration(blind / 2)
}

/// Run both calibration phases.
pub fn calibrate<H: Clock + Gpio + Breathe>(
    hal: &H,
    pin: Pin,
    mains: &Mains,
) -> Result<u32, Error> {
    let halfwave = lock_frequency(hal, mains)?;
    let stats = measure_active(hal, pin);
    log::debug!(
        "Detector: {} active intervals, mean {:?} us, half-wave {halfwave} us",
        stats.count,
        stats.mean_us()
    );
    latency_us(halfwave, &stats)
}


// vim: ts=4 sw=4 expandtab
