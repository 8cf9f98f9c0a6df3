// -*- coding: utf-8 -*-

use crate::sim::{GateEvent, MainsModel};
use phasedim::{LEVEL_MAX, calc_angle, power_fraction};
use std::f64::consts::PI;

/// Conduction of one mains half-wave.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct HalfWave {
    pub index: u64,
    /// First gate trigger after the zero crossing (us). None: not triggered.
    pub fire_us: Option<f64>,
    /// Delivered fraction of the full half-wave power.
    pub power: f64,
}

/// Gate level at `t_us`.
pub fn gate_at(trace: &[GateEvent], t_us: f64) -> bool {
    trace
        .iter()
        .take_while(|ev| (ev.t_us as f64) <= t_us)
        .last()
        .is_some_and(|ev| ev.high)
}

/// Reconstruct the conduction of all half-waves fully inside of `[from_us, to_us)`.
///
/// The triac latches at the first gate trigger of a half-wave and conducts
/// until the next zero crossing.
pub fn half_waves(
    model: &MainsModel,
    trace: &[GateEvent],
    from_us: u64,
    to_us: u64,
) -> Vec<HalfWave> {
    let halfwave = model.halfwave_us();
    let first = (from_us as f64 / halfwave).ceil() as u64;

    let mut result = Vec::new();
    let mut index = first;
    loop {
        let start = model.zero_crossing(index);
        let end = model.zero_crossing(index + 1);
        if end > to_us as f64 {
            break;
        }

        let fire_us = if gate_at(trace, start) {
            Some(0.0)
        } else {
            trace
                .iter()
                .find(|ev| ev.high && (ev.t_us as f64) > start && (ev.t_us as f64) < end)
                .map(|ev| ev.t_us as f64 - start)
        };
        let power = match fire_us {
            Some(delay) => power_fraction(PI * delay / halfwave),
            None => 0.0,
        };
        result.push(HalfWave {
            index,
            fire_us,
            power,
        });
        index += 1;
    }
    result
}

/// Mean delivered power fraction.
pub fn mean_power(half_waves: &[HalfWave]) -> f64 {
    if half_waves.is_empty() {
        0.0
    } else {
        half_waves.iter().map(|hw| hw.power).sum::<f64>() / half_waves.len() as f64
    }
}

/// Requested power fraction of a level.
pub fn target_power(level: u8) -> f64 {
    level as f64 / LEVEL_MAX as f64
}

/// Ideal trigger delay after the zero crossing for a level (us).
pub fn target_fire_us(model: &MainsModel, level: u8) -> f64 {
    calc_angle(target_power(level)) / PI * model.halfwave_us()
}


// vim: ts=4 sw=4 expandtab
