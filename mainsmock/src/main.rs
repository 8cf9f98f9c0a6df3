// -*- coding: utf-8 -*-

#![forbid(unsafe_code)]

use anyhow::{self as ah, Context as _};
use clap::Parser;
use mainsmock::{
    MainsModel, Sim,
    analyze::{half_waves, mean_power, target_fire_us, target_power},
    plot::plot_svg,
};
use phasedim::{Dimmer, LEVEL_MAX, Pin, debug::Debug};
use std::path::PathBuf;

const ZERO_CROSS_PIN: Pin = 2;
const TRIAC_PIN: Pin = 4;

/// Mains periods to settle after a level change before measuring.
const SETTLE_PERIODS: u32 = 3;

/// Mains periods shown in the plot.
const PLOT_PERIODS: u32 = 3;

#[derive(Parser, Debug)]
struct Opts {
    /// Mains frequency (Hz).
    #[arg(long, default_value_t = 50.0)]
    frequency: f64,

    /// Zero-cross detector latency (us).
    #[arg(long, default_value_t = 400)]
    latency: u32,

    /// Maximum random displacement of detector edges (us).
    #[arg(long, default_value_t = 0)]
    jitter: u32,

    /// Add a spurious bounce edge after every detector edge.
    #[arg(long)]
    bounce: bool,

    /// Lose every n-th detector edge. 0: never.
    #[arg(long, default_value_t = 0)]
    drop_every: u32,

    /// Random seed for jitter and bounce.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Measure the detector latency before dimming.
    #[arg(long)]
    calibrate: bool,

    /// Detector latency compensation (us).
    #[arg(long)]
    calibration: Option<u32>,

    /// Power level (0..=255).
    #[arg(long, default_value_t = 128)]
    level: u8,

    /// Step through the whole level range.
    #[arg(long)]
    sweep: bool,

    /// Level increment of the sweep.
    #[arg(long, default_value_t = 17)]
    sweep_step: u8,

    /// Measured mains periods per level.
    #[arg(long, default_value_t = 50)]
    periods: u32,

    /// Write an SVG plot of the first periods at the requested level.
    #[arg(long)]
    plot: Option<PathBuf>,
}

struct Report {
    level: u8,
    target: f64,
    delivered: f64,
    mean_fire_us: Option<f64>,
    missed: usize,
}

fn measure(sim: &Sim, dimmer: &Dimmer<&Sim>, level: u8, periods: u32) -> Report {
    dimmer.set_level(level);
    sim.run_periods(SETTLE_PERIODS);

    let from = sim.now();
    sim.run_periods(periods);
    let to = sim.now();

    let trace = sim.trace();
    let hws = half_waves(sim.model(), &trace, from, to);
    let fired: Vec<f64> = hws.iter().filter_map(|hw| hw.fire_us).collect();
    let mean_fire_us = if fired.is_empty() {
        None
    } else {
        Some(fired.iter().sum::<f64>() / fired.len() as f64)
    };
    let missed = if level == 0 {
        0
    } else {
        hws.len() - fired.len()
    };

    Report {
        level,
        target: target_power(level),
        delivered: mean_power(&hws),
        mean_fire_us,
        missed,
    }
}

fn print_report(model: &MainsModel, r: &Report) {
    let fire = match r.mean_fire_us {
        Some(us) => format!("{us:8.1}"),
        None => format!("{:>8}", "-"),
    };
    println!(
        "{:3}  {:6.2}%  {:6.2}%  {:+6.2}%  {}  {:8.1}  {}",
        r.level,
        r.target * 100.0,
        r.delivered * 100.0,
        (r.delivered - r.target) * 100.0,
        fire,
        target_fire_us(model, r.level),
        r.missed,
    );
}

fn main() -> ah::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let mut model = MainsModel::new(opts.frequency, opts.latency);
    model.jitter_us = opts.jitter;
    model.bounce = opts.bounce;
    model.drop_every = opts.drop_every;

    let sim = Sim::new(model, opts.seed);
    let dimmer = Dimmer::new(&sim, ZERO_CROSS_PIN, TRIAC_PIN);
    sim.connect(&dimmer);
    dimmer.begin();
    sim.run_periods(SETTLE_PERIODS);

    if opts.calibrate {
        match dimmer.calibrate() {
            Ok(us) => println!("Calibrated detector latency: {us} us"),
            Err(e) => eprintln!("Calibration failed: {e}"),
        }
    }
    if let Some(us) = opts.calibration {
        dimmer
            .set_calibration(us)
            .context("Set detector latency compensation")?;
    }
    println!(
        "Mains: {:.3} Hz, compensation {} us",
        dimmer.frequency(),
        dimmer.calibration()
    );

    if let Some(path) = &opts.plot {
        dimmer.set_level(opts.level);
        sim.run_periods(SETTLE_PERIODS);
        let from = sim.now();
        sim.run_periods(PLOT_PERIODS);
        plot_svg(path, sim.model(), &sim.trace(), from, sim.now())
            .with_context(|| format!("Plot to {}", path.display()))?;
    }

    println!("lvl  target    actual     error   fire us    ideal  missed");
    if opts.sweep {
        let step = opts.sweep_step.max(1);
        let mut level = 0_u8;
        loop {
            print_report(sim.model(), &measure(&sim, &dimmer, level, opts.periods));
            if level == LEVEL_MAX {
                break;
            }
            level = level.saturating_add(step);
        }
    } else {
        print_report(
            sim.model(),
            &measure(&sim, &dimmer, opts.level, opts.periods),
        );
    }

    let debug = dimmer.debug_values();
    log::info!(
        "Pulses: {}, fallback pulses: {}, debounced edges: {}",
        debug.get(Debug::Pulses),
        debug.get(Debug::FallbackPulses),
        debug.get(Debug::DebouncedEdges)
    );

    dimmer.set_level(0);
    Ok(())
}

// vim: ts=4 sw=4 expandtab
