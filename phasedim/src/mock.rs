// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::hal::{Breathe, Clock, FiringTimer, Gpio, Irq, Pin};
use core::cell::{Cell, RefCell};
use std::vec::Vec;

const NRPINS: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Call {
    SetupInput(Pin),
    SetupOutput(Pin),
    Set(Pin, bool),
    Enable,
    Disable,
    Write(u32),
    Delay(u32),
    AttachZeroCross(Pin),
    AttachTimer,
}

fn line_high(_now: u64) -> bool {
    true
}

/// Recording platform with a manually stepped clock.
///
/// Every `breathe()` advances the clock by `breathe_step` us.
/// Input pins read the `input` waveform, a function of the clock.
pub struct Mock {
    now: Cell<u64>,
    breathe_step: Cell<u64>,
    breathes: Cell<u32>,
    input: Cell<fn(u64) -> bool>,
    pins: RefCell<[bool; NRPINS]>,
    timer_enabled: Cell<bool>,
    deadline: Cell<Option<u64>>,
    calls: RefCell<Vec<Call>>,
}

impl Mock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            breathe_step: Cell::new(100),
            breathes: Cell::new(0),
            input: Cell::new(line_high as fn(u64) -> bool),
            pins: RefCell::new([false; NRPINS]),
            timer_enabled: Cell::new(false),
            deadline: Cell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set_now(&self, us: u64) {
        self.now.set(us);
    }

    pub fn set_breathe_step(&self, us: u64) {
        self.breathe_step.set(us);
    }

    pub fn breathes(&self) -> u32 {
        self.breathes.get()
    }

    pub fn set_input(&self, input: fn(u64) -> bool) {
        self.input.set(input);
    }

    pub fn pin(&self, pin: Pin) -> bool {
        self.pins.borrow()[pin as usize]
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled.get()
    }

    pub fn timer_deadline(&self) -> Option<u64> {
        self.deadline.get()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn last_write(&self) -> Option<u32> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::Write(us) => Some(*us),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Clock for Mock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }

    fn delay_us(&self, us: u32) {
        self.record(Call::Delay(us));
        self.now.set(self.now.get() + us as u64);
    }
}

impl Gpio for Mock {
    fn setup_input(&self, pin: Pin) {
        self.record(Call::SetupInput(pin));
    }

    fn setup_output(&self, pin: Pin) {
        self.record(Call::SetupOutput(pin));
    }

    fn get(&self, _pin: Pin) -> bool {
        (self.input.get())(self.now.get())
    }

    fn set(&self, pin: Pin, high: bool) {
        self.record(Call::Set(pin, high));
        self.pins.borrow_mut()[pin as usize] = high;
    }
}

impl FiringTimer for Mock {
    fn enable(&self) {
        self.record(Call::Enable);
        self.timer_enabled.set(true);
    }

    fn disable(&self) {
        self.record(Call::Disable);
        self.timer_enabled.set(false);
    }

    fn write_us(&self, us: u32) {
        self.record(Call::Write(us));
        self.deadline.set(Some(self.now.get() + us as u64));
    }
}

impl Irq for Mock {
    fn attach_zero_cross(&self, pin: Pin) {
        self.record(Call::AttachZeroCross(pin));
    }

    fn attach_timer(&self) {
        self.record(Call::AttachTimer);
    }
}

impl Breathe for Mock {
    fn breathe(&self) {
        self.breathes.set(self.breathes.get() + 1);
        self.now.set(self.now.get() + self.breathe_step.get());
    }
}

// vim: ts=4 sw=4 expandtab
