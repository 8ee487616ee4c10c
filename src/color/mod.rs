use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::aggregate::ValueRange;

/// Errors from parsing a `#RRGGBB` color.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColorError {
    #[error("color {0:?} must start with '#'")]
    MissingHash(String),

    #[error("color {0:?} must have exactly six hex digits")]
    BadLength(String),

    #[error("color {0:?} contains a non-hex digit")]
    BadDigit(String),
}

/// An opaque 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;

        if hex.len() != 6 {
            return Err(ColorError::BadLength(s.to_string()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::BadDigit(s.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorError::BadDigit(s.to_string()))
        };

        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Linearly interpolates each channel from `from` to `to`.
///
/// Channel values are truncated, so `ratio == 0.0` yields `from` and
/// `ratio == 1.0` yields `to` exactly.
pub fn interpolate(from: Rgb, to: Rgb, ratio: f64) -> Rgb {
    let ratio = ratio.clamp(0.0, 1.0);
    let mix = |a: u8, z: u8| {
        let a = f64::from(a);
        (a + (f64::from(z) - a) * ratio) as u8
    };
    Rgb::new(mix(from.r, to.r), mix(from.g, to.g), mix(from.b, to.b))
}

/// Colors used to paint the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Color of the least active day.
    pub low: Rgb,
    /// Color of the most active day.
    pub high: Rgb,
    /// Color of days without activity.
    pub empty: Rgb,
    /// Color of headers and month labels.
    pub text: Rgb,
}

impl Palette {
    /// Picks the fill for a day.
    ///
    /// Days without activity (no total, or a zero total), and every day when
    /// no range exists, use the empty color. A degenerate range paints every
    /// active day `low`.
    pub fn cell_color(&self, range: Option<ValueRange>, total: Option<u64>) -> Rgb {
        let (Some(range), Some(total)) = (range, total.filter(|&t| t > 0)) else {
            return self.empty;
        };

        match range.ratio(total) {
            Some(ratio) => interpolate(self.low, self.high, ratio),
            None => self.low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette {
            low: "#4DD2FF".parse().expect("valid color"),
            high: "#FFE66D".parse().expect("valid color"),
            empty: "#F7F7F7".parse().expect("valid color"),
            text: "#2D3436".parse().expect("valid color"),
        }
    }

    #[test]
    fn test_parse_and_format() {
        let c: Rgb = "#4DD2FF".parse().expect("should parse");
        assert_eq!(c, Rgb::new(0x4d, 0xd2, 0xff));
        assert_eq!(c.to_string(), "#4dd2ff");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            "4DD2FF".parse::<Rgb>(),
            Err(ColorError::MissingHash("4DD2FF".into()))
        );
        assert_eq!(
            "#4DD2F".parse::<Rgb>(),
            Err(ColorError::BadLength("#4DD2F".into()))
        );
        assert_eq!(
            "#4DD2FG".parse::<Rgb>(),
            Err(ColorError::BadDigit("#4DD2FG".into()))
        );
        assert!("#+1+2+3".parse::<Rgb>().is_err());
        assert!("".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_interpolate_endpoints() {
        let p = palette();
        assert_eq!(interpolate(p.low, p.high, 0.0), p.low);
        assert_eq!(interpolate(p.low, p.high, 1.0), p.high);
    }

    #[test]
    fn test_interpolate_truncates() {
        let c = interpolate(Rgb::new(0, 0, 0), Rgb::new(255, 10, 3), 0.5);
        assert_eq!(c, Rgb::new(127, 5, 1));
    }

    #[test]
    fn test_interpolate_is_monotonic_per_channel() {
        let from = Rgb::new(10, 20, 30);
        let to = Rgb::new(200, 120, 255);
        let mut prev = from;
        for step in 0..=100 {
            let c = interpolate(from, to, f64::from(step) / 100.0);
            assert!(c.r >= prev.r && c.g >= prev.g && c.b >= prev.b);
            prev = c;
        }
        assert_eq!(prev, to);
    }

    #[test]
    fn test_cell_color_rules() {
        let p = palette();
        let range = ValueRange {
            lower: 100,
            upper: 300,
        };

        assert_eq!(p.cell_color(Some(range), None), p.empty);
        assert_eq!(p.cell_color(None, None), p.empty);
        assert_eq!(p.cell_color(Some(range), Some(100)), p.low);
        assert_eq!(p.cell_color(Some(range), Some(300)), p.high);

        let flat = ValueRange {
            lower: 1800,
            upper: 1800,
        };
        assert_eq!(p.cell_color(Some(flat), Some(1800)), p.low);
    }

    #[test]
    fn test_cell_color_zero_total_is_empty() {
        let p = palette();
        let range = ValueRange {
            lower: 0,
            upper: 600,
        };
        assert_eq!(p.cell_color(Some(range), Some(0)), p.empty);
        assert_eq!(p.cell_color(Some(range), Some(600)), p.high);
    }
}
