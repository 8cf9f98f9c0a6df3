// -*- coding: utf-8 -*-

//! Firing angle for RMS-linear power.
//!
//! A resistive load fired at angle `theta` conducts for the rest of the
//! half-wave and receives the fraction
//!
//! `p(theta) = 1 - theta/pi + sin(2 theta) / (2 pi)`
//!
//! of the full half-wave energy. `p` falls monotonically from 1 at
//! `theta = 0` to 0 at `theta = pi`, so bisection always finds the root.

use core::f64::consts::PI;
use libm::sin;

const MAX_ITERATIONS: usize = 1000;
const EPSILON: f64 = 1e-16;

/// Energy fraction delivered when firing at `theta` radians.
pub fn power_fraction(theta: f64) -> f64 {
    1.0 - (theta / PI) + (sin(2.0 * theta) / (2.0 * PI))
}

/// Firing angle in `[0, pi]` that delivers `level` (`0.0..=1.0`) of the full power.
///
/// The caller must keep `level` in range.
pub fn calc_angle(level: f64) -> f64 {
    let f = |theta: f64| level - power_fraction(theta);

    let mut a = 0.0;
    let mut b = PI;
    let mut mid = (a + b) / 2.0;

    for _ in 0..MAX_ITERATIONS {
        mid = (a + b) / 2.0;
        let f_mid = f(mid);

        if f_mid.abs() < EPSILON || (b - a) < EPSILON {
            break;
        }

        // Root in [a, mid], including a root exactly at `a`.
        if f(a) * f_mid <= 0.0 {
            b = mid;
        } else {
            a = mid;
        }
    }

    mid
}


// vim: ts=4 sw=4 expandtab
