//! Calendar heatmap layout.
//!
//! Each year becomes a header line followed by a 53x7 grid of day cells
//! (54 columns when Dec 31 spills over) with month labels above the columns. Layout is a pure fold: every year
//! takes the current [`Offset`] and returns the offset below its grid.

pub mod grid;

use std::ops::RangeInclusive;

use tracing::debug;

use crate::aggregate::{Aggregation, ValueRange};
use crate::color::{Palette, Rgb};
use crate::error::HeatmapError;

pub use grid::{
    grid_anchor, GridCell, MonthLabeler, Slot, YearGrid, DAYS_PER_WEEK, MAX_COLUMNS, MONTH_NAMES,
    WEEK_COLUMNS,
};

const FONT_FAMILY: &str = "Arial";

/// Drawing cursor in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn down(self, dy: f32) -> Self {
        Self {
            x: self.x,
            y: self.y + dy,
        }
    }
}

/// Canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

/// Geometry and typography of the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStyle {
    pub cell_size: f32,
    /// Gap between adjacent cells.
    pub padding: f32,
    pub corner_radius: f32,
    pub year_font_size: f32,
    pub month_font_size: f32,
    pub title_font_size: f32,
    /// Horizontal room reserved around the grid; half of it is the left margin.
    pub month_label_width: f32,
    /// Room above the first year, holding the title.
    pub top_margin: f32,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            padding: 2.0,
            corner_radius: 2.0,
            year_font_size: 14.0,
            month_font_size: 10.0,
            title_font_size: 12.0,
            month_label_width: 20.0,
            top_margin: 30.0,
        }
    }
}

impl LayoutStyle {
    /// Step between adjacent cells.
    pub fn pitch(&self) -> f32 {
        self.cell_size + self.padding
    }

    /// Height of the year line plus the month label line.
    pub fn header_height(&self) -> f32 {
        2.0 * self.padding + self.year_font_size + self.month_font_size
    }

    /// Vertical space one year occupies.
    pub fn year_height(&self) -> f32 {
        DAYS_PER_WEEK as f32 * self.pitch() + self.header_height()
    }

    /// Where the first year starts.
    pub fn origin(&self) -> Offset {
        Offset::new(self.month_label_width / 2.0, self.top_margin)
    }

    /// Canvas large enough for `year_count` stacked years. The right-hand
    /// half of the label margin leaves room for a spilled Dec 31 column.
    pub fn canvas_size(&self, year_count: usize) -> CanvasSize {
        CanvasSize {
            width: WEEK_COLUMNS as f32 * self.pitch() + self.month_label_width,
            height: year_count as f32 * self.year_height() + self.top_margin,
        }
    }

    fn font(size: f32) -> String {
        format!("font-size:{size}px; font-family:{FONT_FAMILY}")
    }
}

/// A rounded rectangle with a hover tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct RectCommand {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Rgb,
    pub corner_radius: f32,
    pub tooltip: String,
}

/// A line of text. `style` is an inline CSS declaration list.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub content: String,
    pub x: f32,
    pub y: f32,
    pub fill: Rgb,
    pub style: String,
}

/// One drawing primitive, executed in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect(RectCommand),
    Text(TextCommand),
}

/// Result of a layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub commands: Vec<DrawCommand>,
    /// Cursor below the last drawn year.
    pub offset: Offset,
}

/// Turns aggregated totals into draw commands.
#[derive(Debug, Clone)]
pub struct CalendarLayout {
    style: LayoutStyle,
    palette: Palette,
    units: String,
    title: String,
}

impl CalendarLayout {
    pub fn new(style: LayoutStyle, palette: Palette, units: impl Into<String>) -> Self {
        Self {
            style,
            palette,
            units: units.into(),
            title: String::new(),
        }
    }

    /// Sets a title drawn in the top margin by [`CalendarLayout::plan`].
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn style(&self) -> &LayoutStyle {
        &self.style
    }

    /// Lays out the title and every year of `years`, newest first, starting
    /// at the style's origin.
    pub fn plan(
        &self,
        data: Option<&Aggregation>,
        years: RangeInclusive<i32>,
    ) -> Result<Layout, HeatmapError> {
        let mut layout = self.draw(data, years, self.style.origin())?;

        if !self.title.is_empty() {
            let title = DrawCommand::Text(TextCommand {
                content: self.title.clone(),
                x: self.style.origin().x,
                y: self.style.padding + self.style.title_font_size,
                fill: self.palette.text,
                style: LayoutStyle::font(self.style.title_font_size),
            });
            layout.commands.insert(0, title);
        }

        Ok(layout)
    }

    /// Lays out every year of `years` in descending order from `offset`.
    ///
    /// Fails with [`HeatmapError::NoData`] when `data` is absent. Present but
    /// empty data renders every cell in the empty color.
    pub fn draw(
        &self,
        data: Option<&Aggregation>,
        years: RangeInclusive<i32>,
        offset: Offset,
    ) -> Result<Layout, HeatmapError> {
        let data = data.ok_or(HeatmapError::NoData)?;

        let grids = years
            .rev()
            .map(|year| {
                YearGrid::new(year).ok_or_else(|| {
                    HeatmapError::Configuration(format!("year {year} is out of range"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(years = grids.len(), ?offset, "laying out calendar");

        let mut commands = Vec::with_capacity(grids.len() * (MAX_COLUMNS * DAYS_PER_WEEK + 14));
        let offset = grids
            .iter()
            .fold(offset, |offset, grid| self.draw_grid(data, grid, offset, &mut commands));

        Ok(Layout { commands, offset })
    }

    /// Lays out a single year at `offset` and returns the offset below it.
    pub fn draw_year(
        &self,
        data: &Aggregation,
        year: i32,
        offset: Offset,
        out: &mut Vec<DrawCommand>,
    ) -> Result<Offset, HeatmapError> {
        let grid = YearGrid::new(year)
            .ok_or_else(|| HeatmapError::Configuration(format!("year {year} is out of range")))?;
        Ok(self.draw_grid(data, &grid, offset, out))
    }

    fn draw_grid(
        &self,
        data: &Aggregation,
        grid: &YearGrid,
        offset: Offset,
        out: &mut Vec<DrawCommand>,
    ) -> Offset {
        let style = &self.style;
        let year = grid.year();
        let hours = data.years.get(year) / 3600;

        let offset = offset.down(style.padding + style.year_font_size);
        out.push(DrawCommand::Text(TextCommand {
            content: format!("{year}: {hours} hours"),
            x: offset.x,
            y: offset.y,
            fill: self.palette.text,
            style: LayoutStyle::font(style.year_font_size),
        }));
        let offset = offset.down(style.padding + style.month_font_size);

        let pitch = style.pitch();
        let mut labeler = MonthLabeler::new();

        for column in 0..grid.columns() {
            let x = offset.x + pitch * column as f32;

            if let Some(label) = labeler.observe(column, grid.column_start(column)) {
                out.push(DrawCommand::Text(TextCommand {
                    content: label.to_string(),
                    x,
                    y: offset.y,
                    fill: self.palette.text,
                    style: LayoutStyle::font(style.month_font_size),
                }));
            }

            for row in 0..DAYS_PER_WEEK {
                let Some(date) = grid.date_at(column, row) else {
                    break;
                };
                let cell = GridCell {
                    year,
                    column,
                    row,
                    date,
                    total: data.days.get(date).filter(|&total| total > 0),
                };
                out.push(DrawCommand::Rect(self.cell(&cell, data.range, x, offset.y)));
            }
        }

        offset.down(pitch * DAYS_PER_WEEK as f32)
    }

    fn cell(&self, cell: &GridCell, range: Option<ValueRange>, x: f32, top: f32) -> RectCommand {
        let style = &self.style;
        let tooltip = match cell.total {
            Some(total) => format!("{} {} {}", cell.date, total, self.units),
            None => cell.date.to_string(),
        };

        RectCommand {
            x,
            y: top + style.pitch() * cell.row as f32 + style.padding,
            width: style.cell_size,
            height: style.cell_size,
            fill: self.palette.cell_color(range, cell.total),
            corner_radius: style.corner_radius,
            tooltip,
        }
    }
}
