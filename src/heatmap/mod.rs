//! End-to-end heatmap construction: samples in, SVG document out.

use chrono::{Local, TimeZone};
use tracing::{debug, info};

use crate::aggregate::{aggregate_in, Aggregation};
use crate::calendar::{CalendarLayout, Layout, LayoutStyle};
use crate::canvas::{render, SvgCanvas};
use crate::config::Config;
use crate::error::HeatmapError;
use crate::source::{samples, ReadTimes};

/// A fully laid-out heatmap, ready to be written.
#[derive(Debug, Clone)]
pub struct Heatmap {
    pub aggregation: Aggregation,
    pub layout: Layout,
    pub canvas: SvgCanvas,
}

/// Builds the heatmap for `read_times`, bucketing days in the local zone.
pub fn build(cfg: &Config, read_times: &ReadTimes) -> Result<Heatmap, HeatmapError> {
    build_in(cfg, read_times, &Local)
}

/// Builds the heatmap for `read_times`, bucketing days in `tz`.
///
/// Configuration is checked before any drawing and the canvas is sized up
/// front, so a failure never leaves a partial document behind.
pub fn build_in<Tz: TimeZone>(
    cfg: &Config,
    read_times: &ReadTimes,
    tz: &Tz,
) -> Result<Heatmap, HeatmapError> {
    cfg.validate()?;
    let palette = cfg.palette()?;

    let aggregation = aggregate_in(samples(read_times), tz);
    if cfg.require_data {
        aggregation.require_range()?;
    }

    info!(
        samples = read_times.len(),
        days = aggregation.days.len(),
        years = ?aggregation.years.years().collect::<Vec<_>>(),
        "aggregated read times",
    );

    let style = LayoutStyle::default();
    let size = style.canvas_size(cfg.year_count());
    debug!(width = size.width, height = size.height, "canvas sized");

    let layout = CalendarLayout::new(style, palette, cfg.units.clone())
        .with_title(cfg.title.clone())
        .plan(Some(&aggregation), cfg.years())?;

    let mut canvas = SvgCanvas::new(size);
    render(&layout.commands, &mut canvas);

    Ok(Heatmap {
        aggregation,
        layout,
        canvas,
    })
}
