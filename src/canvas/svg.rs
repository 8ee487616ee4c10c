use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::Canvas;
use crate::calendar::CanvasSize;
use crate::color::Rgb;

/// An in-memory SVG document.
///
/// Elements are kept as serialized fragments and written out in insertion
/// order, so later elements paint over earlier ones.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    size: CanvasSize,
    elements: Vec<String>,
}

impl SvgCanvas {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            elements: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Renders the complete document.
    pub fn to_svg(&self) -> String {
        let body: usize = self.elements.iter().map(|e| e.len() + 1).sum();
        let mut out = String::with_capacity(body + 256);

        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n");
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.size.width,
            h = self.size.height,
        );
        for element in &self.elements {
            out.push_str(element);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }
}

impl Canvas for SvgCanvas {
    fn rectangle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
        corner_radius: f32,
        tooltip: &str,
    ) {
        let mut el = format!(
            r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{fill}" rx="{corner_radius}" ry="{corner_radius}""#
        );
        if tooltip.is_empty() {
            el.push_str(" />");
        } else {
            let _ = write!(el, "><title>{}</title></rect>", escape(tooltip));
        }
        self.elements.push(el);
    }

    fn text(&mut self, content: &str, x: f32, y: f32, fill: Rgb, style: &str) {
        self.elements.push(format!(
            r#"<text x="{x}" y="{y}" fill="{fill}" style="{}">{}</text>"#,
            escape(style),
            escape(content),
        ));
    }

    fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_svg())
            .with_context(|| format!("writing SVG to {}", path.display()))?;

        info!(
            path = %path.display(),
            elements = self.elements.len(),
            "heatmap written",
        );

        Ok(())
    }
}

/// Escapes XML special characters for text and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> SvgCanvas {
        SvgCanvas::new(CanvasSize {
            width: 656.0,
            height: 142.0,
        })
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(
            escape(r#"<Tom & "Jerry's">"#),
            "&lt;Tom &amp; &quot;Jerry&apos;s&quot;&gt;"
        );
    }

    #[test]
    fn test_empty_document() {
        let svg = canvas().to_svg();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"width="656" height="142" viewBox="0 0 656 142""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_rectangle_with_tooltip() {
        let mut c = canvas();
        let fill = Rgb::new(0x4d, 0xd2, 0xff);
        c.rectangle(10.0, 60.0, 10.0, 10.0, fill, 2.0, "2024-01-01 60 secs");
        let svg = c.to_svg();
        assert!(svg.contains(
            r##"<rect x="10" y="60" width="10" height="10" fill="#4dd2ff" rx="2" ry="2"><title>2024-01-01 60 secs</title></rect>"##
        ));
    }

    #[test]
    fn test_rectangle_without_tooltip() {
        let mut c = canvas();
        c.rectangle(0.5, 1.5, 10.0, 10.0, Rgb::new(0, 0, 0), 0.0, "");
        assert!(c.to_svg().contains(
            r##"<rect x="0.5" y="1.5" width="10" height="10" fill="#000000" rx="0" ry="0" />"##
        ));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut c = canvas();
        c.text(
            "Tom & Jerry",
            10.0,
            14.0,
            Rgb::new(0x2d, 0x34, 0x36),
            "font-size:12px; font-family:Arial",
        );
        assert!(c.to_svg().contains(
            r##"<text x="10" y="14" fill="#2d3436" style="font-size:12px; font-family:Arial">Tom &amp; Jerry</text>"##
        ));
    }

    #[test]
    fn test_elements_keep_insertion_order() {
        let mut c = canvas();
        c.text("first", 0.0, 0.0, Rgb::new(0, 0, 0), "");
        c.rectangle(0.0, 0.0, 1.0, 1.0, Rgb::new(0, 0, 0), 0.0, "second");
        c.text("third", 0.0, 0.0, Rgb::new(0, 0, 0), "");
        assert_eq!(c.len(), 3);

        let svg = c.to_svg();
        let a = svg.find("first").expect("present");
        let b = svg.find("second").expect("present");
        let d = svg.find("third").expect("present");
        assert!(a < b && b < d);
    }

    #[test]
    fn test_save_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "readtime-heatmap-svg-test-{}.svg",
            std::process::id()
        ));
        let mut c = canvas();
        c.text("hello", 0.0, 0.0, Rgb::new(0, 0, 0), "");
        c.save(&path).expect("should save");

        let written = std::fs::read_to_string(&path).expect("should read back");
        assert_eq!(written, c.to_svg());
        let _ = std::fs::remove_file(&path);
    }
}
