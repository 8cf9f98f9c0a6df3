// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use phasedim::{Breathe, Clock, Dimmer, FiringTimer, Gpio, Irq, Pin, Platform};
use rand::{Rng as _, SeedableRng as _, rngs::StdRng};
use std::{
    cell::{Cell, RefCell},
    f64::consts::PI,
};

/// Simulated time spent in one scheduler yield (us).
/// Deliberately not a divisor of the mains period.
const BREATHE_US: u64 = 17;

/// Range of the delay of a bounce edge after the real edge (us).
const BOUNCE_DELAY_US: std::ops::Range<u64> = 200..2_000;

/// Number of simulated GPIO pins. One bit per pin in a `u32`.
const NRPINS: u32 = u32::BITS;

fn pin_mask(pin: Pin) -> u32 {
    assert!(u32::from(pin) < NRPINS, "Pin {pin} does not exist");
    1 << pin
}

/// Mains supply and zero-cross detector.
#[derive(Clone, Debug)]
pub struct MainsModel {
    /// Mains frequency (Hz).
    pub frequency: f64,
    /// Detector latency (us).
    /// The detector line is low from zero crossing + latency
    /// to the end of the positive half-wave - latency.
    pub latency_us: u32,
    /// Maximum random displacement of the detector edge interrupt (us).
    pub jitter_us: u32,
    /// Add a spurious falling edge shortly after every real one.
    pub bounce: bool,
    /// Swallow every n-th detector edge interrupt. 0: never.
    pub drop_every: u32,
}

impl MainsModel {
    pub fn new(frequency: f64, latency_us: u32) -> Self {
        Self {
            frequency,
            latency_us,
            jitter_us: 0,
            bounce: false,
            drop_every: 0,
        }
    }

    pub fn period_us(&self) -> f64 {
        1e6 / self.frequency
    }

    pub fn halfwave_us(&self) -> f64 {
        self.period_us() / 2.0
    }

    /// Zero crossing at the start of half-wave `n`. Even `n` start a positive half-wave.
    pub fn zero_crossing(&self, n: u64) -> f64 {
        n as f64 * self.halfwave_us()
    }

    /// Normalized mains voltage.
    pub fn voltage(&self, t_us: f64) -> f64 {
        (2.0 * PI * self.frequency * t_us * 1e-6).sin()
    }

    /// Electrical level of the detector line. Low is active.
    pub fn detector_line(&self, t_us: u64) -> bool {
        let phase = (t_us as f64) % self.period_us();
        let latency = self.latency_us as f64;
        let active = phase >= latency && phase < self.halfwave_us() - latency;
        !active
    }

    fn edge_time(&self, k: u64) -> f64 {
        k as f64 * self.period_us() + self.latency_us as f64
    }
}

/// One change of a gate output pin.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GateEvent {
    pub t_us: u64,
    pub high: bool,
}

/// Interrupt vector table of the simulated MCU.
pub trait IrqVectors {
    fn zero_cross(&self);
    fn timer(&self);
}

impl<P: Platform> IrqVectors for Dimmer<P> {
    fn zero_cross(&self) {
        self.irq_handler_zero_cross();
    }

    fn timer(&self) {
        self.irq_handler_timer();
    }
}

/// Simulated MCU platform.
///
/// Time only advances in [Sim::run_until], `breathe()` and `delay_us()`.
/// Interrupts are dispatched in time order while time advances in main
/// context. Inside of an interrupt handler time advances without dispatching.
pub struct Sim<'a> {
    model: MainsModel,
    now: Cell<u64>,
    in_irq: Cell<bool>,
    rng: RefCell<StdRng>,

    outputs: Cell<u32>,
    pins: Cell<u32>,
    zero_cross_irq: Cell<Option<Pin>>,
    timer_irq: Cell<bool>,

    timer_enabled: Cell<bool>,
    deadline: Cell<Option<u64>>,

    edge_index: Cell<u64>,
    next_edge: Cell<u64>,
    bounce: Cell<Option<u64>>,

    vectors: Cell<Option<&'a dyn IrqVectors>>,
    trace: RefCell<Vec<GateEvent>>,
}

impl<'a> Sim<'a> {
    pub fn new(model: MainsModel, seed: u64) -> Self {
        let sim = Self {
            model,
            now: Cell::new(0),
            in_irq: Cell::new(false),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
            outputs: Cell::new(0),
            pins: Cell::new(0),
            zero_cross_irq: Cell::new(None),
            timer_irq: Cell::new(false),
            timer_enabled: Cell::new(false),
            deadline: Cell::new(None),
            edge_index: Cell::new(0),
            next_edge: Cell::new(0),
            bounce: Cell::new(None),
            vectors: Cell::new(None),
            trace: RefCell::new(Vec::new()),
        };
        sim.schedule_edge(0);
        sim
    }

    /// Connect the interrupt handlers.
    pub fn connect(&self, vectors: &'a dyn IrqVectors) {
        self.vectors.set(Some(vectors));
    }

    pub fn model(&self) -> &MainsModel {
        &self.model
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn trace(&self) -> Vec<GateEvent> {
        self.trace.borrow().clone()
    }

    pub fn pin_level(&self, pin: Pin) -> bool {
        self.pins.get() & pin_mask(pin) != 0
    }

    fn schedule_edge(&self, k: u64) {
        let mut t = self.model.edge_time(k).round() as i64;
        let jitter = self.model.jitter_us as i64;
        if jitter > 0 {
            t += self.rng.borrow_mut().gen_range(-jitter..=jitter);
        }
        self.edge_index.set(k);
        self.next_edge.set(t.max(0) as u64);
    }

    fn next_edge_time(&self) -> u64 {
        match self.bounce.get() {
            Some(bounce) => bounce.min(self.next_edge.get()),
            None => self.next_edge.get(),
        }
    }

    fn timer_deadline(&self) -> Option<u64> {
        if self.timer_enabled.get() {
            self.deadline.get()
        } else {
            None
        }
    }

    /// Advance time to `t_us` and deliver all interrupts up to then.
    pub fn run_until(&self, t_us: u64) {
        loop {
            let edge = self.next_edge_time();
            let (event, is_timer) = match self.timer_deadline() {
                Some(deadline) if deadline <= edge => (deadline, true),
                _ => (edge, false),
            };
            if event > t_us {
                break;
            }
            self.now.set(self.now.get().max(event));
            if is_timer {
                self.fire_timer();
            } else {
                self.fire_edge();
            }
        }
        self.now.set(self.now.get().max(t_us));
    }

    pub fn run_for(&self, us: u64) {
        self.run_until(self.now.get() + us);
    }

    pub fn run_periods(&self, periods: u32) {
        self.run_for((self.model.period_us() * periods as f64).round() as u64);
    }

    fn fire_timer(&self) {
        self.deadline.set(None);
        if self.timer_irq.get() {
            self.dispatch(|v| v.timer());
        }
    }

    fn fire_edge(&self) {
        let now = self.now.get();
        if self.bounce.get().is_some_and(|bounce| bounce <= now) {
            self.bounce.set(None);
        } else {
            let k = self.edge_index.get();
            self.schedule_edge(k + 1);

            let drop_every = self.model.drop_every as u64;
            if drop_every > 0 && k % drop_every == drop_every - 1 {
                return;
            }
            if self.model.bounce {
                let delay = self.rng.borrow_mut().gen_range(BOUNCE_DELAY_US);
                self.bounce.set(Some(now + delay));
            }
        }
        if self.zero_cross_irq.get().is_some() {
            self.dispatch(|v| v.zero_cross());
        }
    }

    fn dispatch(&self, handler: impl FnOnce(&dyn IrqVectors)) {
        if let Some(vectors) = self.vectors.get() {
            self.in_irq.set(true);
            handler(vectors);
            self.in_irq.set(false);
        }
    }

    fn advance(&self, us: u64) {
        if self.in_irq.get() {
            self.now.set(self.now.get() + us);
        } else {
            self.run_for(us);
        }
    }
}

impl Clock for Sim<'_> {
    fn now_us(&self) -> u64 {
        self.now.get()
    }

    fn delay_us(&self, us: u32) {
        self.advance(us as u64);
    }
}

impl Gpio for Sim<'_> {
    fn setup_input(&self, pin: Pin) {
        self.outputs.set(self.outputs.get() & !pin_mask(pin));
    }

    fn setup_output(&self, pin: Pin) {
        self.outputs.set(self.outputs.get() | pin_mask(pin));
    }

    fn get(&self, pin: Pin) -> bool {
        if self.zero_cross_irq.get() == Some(pin) || self.outputs.get() & pin_mask(pin) == 0 {
            self.model.detector_line(self.now.get())
        } else {
            self.pin_level(pin)
        }
    }

    fn set(&self, pin: Pin, high: bool) {
        let mask = pin_mask(pin);
        if self.pin_level(pin) != high {
            self.trace.borrow_mut().push(GateEvent {
                t_us: self.now.get(),
                high,
            });
        }
        if high {
            self.pins.set(self.pins.get() | mask);
        } else {
            self.pins.set(self.pins.get() & !mask);
        }
    }
}

impl FiringTimer for Sim<'_> {
    fn enable(&self) {
        self.timer_enabled.set(true);
    }

    fn disable(&self) {
        self.timer_enabled.set(false);
        self.deadline.set(None);
    }

    fn write_us(&self, us: u32) {
        self.deadline.set(Some(self.now.get() + us as u64));
    }
}

impl Irq for Sim<'_> {
    fn attach_zero_cross(&self, pin: Pin) {
        self.zero_cross_irq.set(Some(pin));
    }

    fn attach_timer(&self) {
        self.timer_irq.set(true);
    }
}

impl Breathe for Sim<'_> {
    fn breathe(&self) {
        self.advance(BREATHE_US);
    }
}


// vim: ts=4 sw=4 expandtab
