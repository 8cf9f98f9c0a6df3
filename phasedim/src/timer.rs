// -*- coding: utf-8 -*-

use crate::hal::Clock;
use derive_more::{Add, AddAssign, Sub, SubAssign};

/// Absolute point in time, in microseconds.
///
/// The counter wraps after 2^32 us (about 71 minutes).
/// Differences between two timestamps are correct across the wrap,
/// as long as the real distance is less than one wrap period.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub struct Timestamp(pub u32);

/// Non-negative time distance, in microseconds.
#[derive(
    PartialEq, Eq, Copy, Clone, Debug, Default, PartialOrd, Ord, Add, Sub, AddAssign, SubAssign,
)]
pub struct RelTimestamp(pub u32);

impl Timestamp {
    #[inline]
    pub const fn new() -> Self {
        Timestamp(0)
    }

    /// Truncate a 64 bit clock reading.
    #[inline]
    pub const fn from_micros(us: u64) -> Self {
        Timestamp(us as u32)
    }

    #[inline]
    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Time elapsed since `earlier`.
    #[inline]
    pub const fn since(self, earlier: Timestamp) -> RelTimestamp {
        RelTimestamp(self.0.wrapping_sub(earlier.0))
    }
}

impl RelTimestamp {
    #[inline]
    pub const fn new() -> Self {
        RelTimestamp(0)
    }

    #[inline]
    pub const fn from_micros(us: u32) -> Self {
        RelTimestamp(us)
    }

    #[inline]
    pub const fn from_millis(ms: u32) -> Self {
        RelTimestamp(ms * 1000)
    }

    #[inline]
    pub const fn as_micros(self) -> u32 {
        self.0
    }
}

impl core::ops::Add<RelTimestamp> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, other: RelTimestamp) -> Self::Output {
        Timestamp(self.0.wrapping_add(other.0))
    }
}

impl core::ops::Sub for Timestamp {
    type Output = RelTimestamp;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        self.since(other)
    }
}

impl From<u32> for Timestamp {
    #[inline]
    fn from(stamp: u32) -> Self {
        Timestamp(stamp)
    }
}

impl From<Timestamp> for u32 {
    #[inline]
    fn from(stamp: Timestamp) -> Self {
        stamp.0
    }
}

impl From<u32> for RelTimestamp {
    #[inline]
    fn from(us: u32) -> Self {
        RelTimestamp(us)
    }
}

impl From<RelTimestamp> for u32 {
    #[inline]
    fn from(rel: RelTimestamp) -> Self {
        rel.0
    }
}

/// Read the platform clock.
#[inline]
pub fn timer_get<C: Clock + ?Sized>(clock: &C) -> Timestamp {
    Timestamp::from_micros(clock.now_us())
}


// vim: ts=4 sw=4 expandtab
