// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform services the phase control runs on.
//!
//! All methods take `&self`, because they are called from the main
//! context and from both interrupt handlers. Implementations are
//! expected to be thin wrappers around peripheral registers.

/// Pin (channel) identifier.
pub type Pin = u8;

/// Monotonic microsecond clock.
pub trait Clock {
    /// Microseconds since an arbitrary origin.
    fn now_us(&self) -> u64;

    /// Busy wait. Called from interrupt context.
    fn delay_us(&self, us: u32);
}

/// Digital pin access.
pub trait Gpio {
    fn setup_input(&self, pin: Pin);
    fn setup_output(&self, pin: Pin);

    /// Read the electrical level. `true` is high.
    fn get(&self, pin: Pin) -> bool;

    /// Drive the electrical level. `true` is high.
    fn set(&self, pin: Pin, high: bool);
}

/// One-shot firing timer.
///
/// Expiry is delivered only while the timer is enabled
/// and only after it has been programmed with [FiringTimer::write_us].
pub trait FiringTimer {
    fn enable(&self);
    fn disable(&self);

    /// (Re)program the timer to expire `us` microseconds from now.
    fn write_us(&self, us: u32);
}

/// Interrupt source registration.
pub trait Irq {
    /// Route falling edges on `pin` to `Dimmer::irq_handler_zero_cross`.
    fn attach_zero_cross(&self, pin: Pin);

    /// Route firing timer expiry to `Dimmer::irq_handler_timer`.
    fn attach_timer(&self);
}

/// Cooperative scheduler yield / watchdog service point.
pub trait Breathe {
    fn breathe(&self);
}

/// Everything the dimmer needs from the platform.
pub trait Platform: Clock + Gpio + FiringTimer + Irq + Breathe {}

impl<T: Clock + Gpio + FiringTimer + Irq + Breathe + ?Sized> Platform for T {}

impl<T: Clock + ?Sized> Clock for &T {
    #[inline]
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }

    #[inline]
    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }
}

impl<T: Gpio + ?Sized> Gpio for &T {
    #[inline]
    fn setup_input(&self, pin: Pin) {
        (**self).setup_input(pin)
    }

    #[inline]
    fn setup_output(&self, pin: Pin) {
        (**self).setup_output(pin)
    }

    #[inline]
    fn get(&self, pin: Pin) -> bool {
        (**self).get(pin)
    }

    #[inline]
    fn set(&self, pin: Pin, high: bool) {
        (**self).set(pin, high)
    }
}

impl<T: FiringTimer + ?Sized> FiringTimer for &T {
    #[inline]
    fn enable(&self) {
        (**self).enable()
    }

    #[inline]
    fn disable(&self) {
        (**self).disable()
    }

    #[inline]
    fn write_us(&self, us: u32) {
        (**self).write_us(us)
    }
}

impl<T: Irq + ?Sized> Irq for &T {
    #[inline]
    fn attach_zero_cross(&self, pin: Pin) {
        (**self).attach_zero_cross(pin)
    }

    #[inline]
    fn attach_timer(&self) {
        (**self).attach_timer()
    }
}

impl<T: Breathe + ?Sized> Breathe for &T {
    #[inline]
    fn breathe(&self) {
        (**self).breathe()
    }
}

// vim: ts=4 sw=4 expandtab
