// -*- coding: utf-8 -*-

//! Host simulation of mains, zero-cross detector and triac gate
//! for exercising the `phasedim` dimmer without hardware.

#![forbid(unsafe_code)]

pub mod analyze;
pub mod plot;
pub mod sim;

pub use crate::sim::{GateEvent, IrqVectors, MainsModel, Sim};

// vim: ts=4 sw=4 expandtab
