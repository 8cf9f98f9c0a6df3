// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase angle control of an AC load through a triac.
//!
//! The triac is fired once per mains half-wave, synchronized to the
//! zero-cross detector. The power level is linearized, so that the
//! delivered power is proportional to the level instead of the firing angle.
//! The zero-cross detector latency can be measured and compensated.
//!
//! All shared state lives in a [Dimmer] owned by the caller.
//! The platform glue forwards two interrupts into it:
//!
//! - falling edge of the detector line: [Dimmer::irq_handler_zero_cross]
//! - firing timer expiry: [Dimmer::irq_handler_timer]

#![no_std]
#![forbid(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod angle;
pub mod atomic;
pub mod calib;
pub mod debug;
mod dimmer;
mod error;
pub mod hal;
pub mod mains;
pub mod timer;
pub mod triac;

#[cfg(test)]
mod mock;

pub use crate::{
    angle::{calc_angle, power_fraction},
    dimmer::{Dimmer, LEVEL_MAX},
    error::Error,
    hal::{Breathe, Clock, FiringTimer, Gpio, Irq, Pin, Platform},
    triac::FireState,
};

// vim: ts=4 sw=4 expandtab
