//! Display options handed to the chart renderer.
//!
//! These are passed through untouched by the return pipeline; only the
//! renderer interprets them.

use std::fmt;
use std::str::FromStr;

/// How multiple series share a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistMultiple {
    /// Overlapping translucent bars.
    #[default]
    Layer,
    /// Side-by-side bars within each bin.
    Dodge,
    /// Bars stacked on top of each other.
    Stack,
}

impl FromStr for HistMultiple {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "layer" => Ok(Self::Layer),
            "dodge" => Ok(Self::Dodge),
            "stack" => Ok(Self::Stack),
            other => Err(format!(
                "unknown value '{other}', expected one of layer, dodge, stack"
            )),
        }
    }
}

impl fmt::Display for HistMultiple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Layer => "layer",
            Self::Dodge => "dodge",
            Self::Stack => "stack",
        };
        f.write_str(s)
    }
}

/// Named colour palette for heatmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMap {
    Coolwarm,
    Viridis,
    #[default]
    Rocket,
    Blues,
    RdBu,
}

impl ColorMap {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Coolwarm => &[(59, 76, 192), (221, 221, 221), (180, 4, 38)],
            Self::Viridis => &[
                (68, 1, 84),
                (59, 82, 139),
                (33, 145, 140),
                (94, 201, 98),
                (253, 231, 37),
            ],
            Self::Rocket => &[
                (3, 5, 26),
                (117, 26, 89),
                (225, 51, 66),
                (246, 163, 120),
                (250, 235, 221),
            ],
            Self::Blues => &[(247, 251, 255), (107, 174, 214), (8, 48, 107)],
            Self::RdBu => &[(103, 0, 31), (247, 247, 247), (5, 48, 97)],
        }
    }

    /// Colour at position `t` in [0, 1], linearly interpolated between stops.
    pub fn rgb(self, t: f64) -> (u8, u8, u8) {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        let frac = pos - i as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (stops[i], stops[i + 1]);
        (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }

    pub fn hex(self, t: f64) -> String {
        let (r, g, b) = self.rgb(t);
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Whether dark text is readable on the colour at `t`.
    pub fn is_light(self, t: f64) -> bool {
        let (r, g, b) = self.rgb(t);
        0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64 > 150.0
    }
}

impl FromStr for ColorMap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coolwarm" => Ok(Self::Coolwarm),
            "viridis" => Ok(Self::Viridis),
            "rocket" => Ok(Self::Rocket),
            "blues" => Ok(Self::Blues),
            "rdbu" => Ok(Self::RdBu),
            other => Err(format!(
                "unknown colour map '{other}', expected one of coolwarm, viridis, rocket, blues, rdbu"
            )),
        }
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Coolwarm => "coolwarm",
            Self::Viridis => "viridis",
            Self::Rocket => "rocket",
            Self::Blues => "blues",
            Self::RdBu => "rdbu",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderOptions {
    /// Histogram bin count; `None` picks one from the data.
    pub bins: Option<usize>,
    pub multiple: HistMultiple,
    /// Heatmap scale lower bound; defaults to the data minimum.
    pub vmin: Option<f64>,
    /// Heatmap scale upper bound; defaults to the data maximum.
    pub vmax: Option<f64>,
    /// Print the value in each heatmap cell.
    pub annot: bool,
    pub cmap: ColorMap,
}
