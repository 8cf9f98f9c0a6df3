// -*- coding: utf-8 -*-

use crate::{
    analyze::gate_at,
    sim::{GateEvent, MainsModel},
};
use anyhow::{self as ah, Context as _};
use plotters::prelude::*;
use std::path::Path;

const SIZE: (u32, u32) = (1200, 500);
const STEP_US: u64 = 5;

/// Trace offsets in units of the mains amplitude.
const GATE_LOW: f64 = 1.2;
const GATE_HIGH: f64 = 1.5;
const DETECTOR_LOW: f64 = -1.5;
const DETECTOR_HIGH: f64 = -1.2;

/// Write the mains voltage, the detector line and the gate
/// between `from_us` and `to_us` as SVG.
///
/// Time axis in milliseconds.
pub fn plot_svg(
    path: &Path,
    model: &MainsModel,
    trace: &[GateEvent],
    from_us: u64,
    to_us: u64,
) -> ah::Result<()> {
    let area = SVGBackend::new(path, SIZE).into_drawing_area();
    area.fill(&WHITE).context("Fill plot")?;

    let ms = |t: u64| (t - from_us) as f64 / 1000.0;
    let times = || (from_us..to_us).step_by(STEP_US as usize);

    let mut chart = ChartBuilder::on(&area)
        .margin(10)
        .build_cartesian_2d(0.0..ms(to_us), -1.7..1.7)
        .context("Build chart")?;

    chart
        .draw_series(LineSeries::new(
            times().map(|t| (ms(t), model.voltage(t as f64))),
            BLUE.stroke_width(2),
        ))
        .context("Draw mains")?;
    chart
        .draw_series(LineSeries::new(
            times().map(|t| {
                let y = if model.detector_line(t) {
                    DETECTOR_HIGH
                } else {
                    DETECTOR_LOW
                };
                (ms(t), y)
            }),
            &BLACK,
        ))
        .context("Draw detector")?;
    chart
        .draw_series(LineSeries::new(
            times().map(|t| {
                let y = if gate_at(trace, t as f64) {
                    GATE_HIGH
                } else {
                    GATE_LOW
                };
                (ms(t), y)
            }),
            &RED,
        ))
        .context("Draw gate")?;

    area.present().context("Write plot")?;
    Ok(())
}

// vim: ts=4 sw=4 expandtab
