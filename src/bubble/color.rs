use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use eframe::egui::Color32;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteKind {
    /// Fixed magnitude buckets.
    #[default]
    Threshold,
    /// Blues, darker for larger values within the batch.
    Sequential,
}

impl PaletteKind {
    pub const ALL: [Self; 2] = [Self::Threshold, Self::Sequential];

    pub fn label(self) -> &'static str {
        match self {
            Self::Threshold => "Magnitude buckets",
            Self::Sequential => "Sequential blues",
        }
    }
}

/// Bucketed colors: `value < thresholds[0]` takes `colors[0]`, and so on, with
/// values at or above the last threshold taking the last color.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdScale {
    thresholds: Vec<f64>,
    colors: Vec<Color32>,
}

impl ThresholdScale {
    pub fn new(thresholds: &[f64], colors: &[String]) -> Result<Self> {
        if colors.len() != thresholds.len() + 1 {
            return Err(anyhow!(
                "{} thresholds need {} colors, got {}",
                thresholds.len(),
                thresholds.len() + 1,
                colors.len()
            ));
        }
        if thresholds.iter().any(|value| !value.is_finite()) {
            return Err(anyhow!("palette thresholds must be finite"));
        }
        if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(anyhow!("palette thresholds must be strictly ascending"));
        }

        let colors = colors
            .iter()
            .map(|hex| parse_hex_color(hex).with_context(|| format!("invalid palette color {hex:?}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            thresholds: thresholds.to_vec(),
            colors,
        })
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let bucket = self
            .thresholds
            .iter()
            .take_while(|threshold| value >= **threshold)
            .count();
        self.colors[bucket]
    }

    /// `(upper bound, color)` per bucket for legends; the last bucket is open.
    pub fn buckets(&self) -> impl Iterator<Item = (Option<f64>, Color32)> + '_ {
        self.colors
            .iter()
            .enumerate()
            .map(|(index, color)| (self.thresholds.get(index).copied(), *color))
    }
}

const BLUES: [(u8, u8, u8); 9] = [
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

/// Blues ramp at `t` in `[0, 1]`.
pub fn sequential_blue(t: f32) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (BLUES.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(BLUES.len() - 2);
    let mix = scaled - lower as f32;
    let (r0, g0, b0) = BLUES[lower];
    let (r1, g1, b1) = BLUES[lower + 1];
    let lerp = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * mix).round() as u8;
    Color32::from_rgb(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// The palette a batch is drawn with.
#[derive(Clone, Debug)]
pub struct Palette {
    pub kind: PaletteKind,
    pub thresholds: ThresholdScale,
}

impl Palette {
    pub fn color_for(&self, value: f64, extent: (f64, f64)) -> Color32 {
        match self.kind {
            PaletteKind::Threshold => self.thresholds.color_for(value),
            PaletteKind::Sequential => {
                let (min, max) = extent;
                let span = max - min;
                let t = if span > f64::EPSILON {
                    (value - min) / span
                } else {
                    1.0
                };
                sequential_blue(t as f32)
            }
        }
    }
}

fn parse_hex_color(hex: &str) -> Result<Color32> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(anyhow!("expected #RRGGBB"));
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16);
    Ok(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
