// -*- coding: utf-8 -*-

//! Word sized cells shared between main context and interrupt handlers.
//!
//! Every field is independently meaningful, so relaxed ordering is enough.
//! A reader may see a value that is one update old, never a torn one.

use crate::timer::Timestamp;
use core::sync::atomic::{AtomicU32, Ordering};

pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

pub struct AtomicTimestamp(AtomicU32);

impl AtomicTimestamp {
    #[inline]
    pub const fn new(stamp: Timestamp) -> Self {
        Self(AtomicU32::new(stamp.0))
    }

    #[inline]
    pub fn load(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, stamp: Timestamp) {
        self.0.store(stamp.0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_f32_bits() {
        let a = AtomicF32::new(50.0);
        assert_eq!(a.load(), 50.0);
        a.store(-0.25);
        assert_eq!(a.load(), -0.25);
        a.store(f32::INFINITY);
        assert!(a.load().is_infinite());
    }

    #[test]
    fn test_timestamp() {
        let a = AtomicTimestamp::new(Timestamp::new());
        assert_eq!(a.load(), Timestamp(0));
        a.store(Timestamp(0xDEAD_BEEF));
        assert_eq!(a.load().as_micros(), 0xDEAD_BEEF);
    }
}

// vim: ts=4 sw=4 expandtab
