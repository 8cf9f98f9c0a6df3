// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// The mains frequency did not settle near 50 Hz or 60 Hz in time.
    FrequencyLock,
    /// The zero-cross detector never completed an active interval.
    NoDetectorActivity,
    /// Detector latency outside of the physically plausible range.
    CalibrationRange(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FrequencyLock => write!(f, "mains frequency lock timed out"),
            Error::NoDetectorActivity => write!(f, "no zero-cross detector activity"),
            Error::CalibrationRange(us) => {
                write!(f, "calibration value {us} us out of range")
            }
        }
    }
}

impl core::error::Error for Error {}

// vim: ts=4 sw=4 expandtab
