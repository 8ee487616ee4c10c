//! Output surfaces for laid-out draw commands.

pub mod svg;

use std::path::Path;

use anyhow::Result;

use crate::calendar::DrawCommand;
use crate::color::Rgb;

pub use svg::SvgCanvas;

/// A 2D surface that accepts rectangles and text and can be written out.
pub trait Canvas {
    /// Adds a rounded rectangle. A non-empty `tooltip` is attached as hover text.
    #[allow(clippy::too_many_arguments)]
    fn rectangle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
        corner_radius: f32,
        tooltip: &str,
    );

    /// Adds a line of text with an inline CSS style.
    fn text(&mut self, content: &str, x: f32, y: f32, fill: Rgb, style: &str);

    /// Serializes the surface to `path`.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Replays `commands` onto `canvas` in order.
pub fn render<C: Canvas + ?Sized>(commands: &[DrawCommand], canvas: &mut C) {
    for command in commands {
        match command {
            DrawCommand::Rect(r) => canvas.rectangle(
                r.x,
                r.y,
                r.width,
                r.height,
                r.fill,
                r.corner_radius,
                &r.tooltip,
            ),
            DrawCommand::Text(t) => canvas.text(&t.content, t.x, t.y, t.fill, &t.style),
        }
    }
}
