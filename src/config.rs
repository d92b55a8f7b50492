use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::bubble::{AmountUnit, BatchOptions, Palette, PaletteKind, SimulationParams, ThresholdScale};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub kind: PaletteKind,
    pub thresholds: Vec<f64>,
    pub colors: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            kind: PaletteKind::Threshold,
            thresholds: vec![1e6, 1e7, 1e10],
            colors: ["#FFD739", "#C299FC", "#9852F9", "#6807F9"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

/// Runtime settings: defaults, then the optional JSON file, then CLI flags.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub padding: f32,
    pub min_radius: f32,
    pub amount_unit: AmountUnit,
    pub palette: PaletteConfig,
    pub simulation: SimulationParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            padding: 8.0,
            min_radius: 4.0,
            amount_unit: AmountUnit::Raw,
            palette: PaletteConfig::default(),
            simulation: SimulationParams::default(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overrides {
    pub padding: Option<f32>,
    pub min_radius: Option<f32>,
    pub amount_unit: Option<AmountUnit>,
    pub palette: Option<PaletteKind>,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(padding) = overrides.padding {
            self.padding = padding;
        }
        if let Some(min_radius) = overrides.min_radius {
            self.min_radius = min_radius;
        }
        if let Some(unit) = overrides.amount_unit {
            self.amount_unit = unit;
        }
        if let Some(kind) = overrides.palette {
            self.palette.kind = kind;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(anyhow!("padding must be a non-negative number, got {}", self.padding));
        }
        if !self.min_radius.is_finite() || self.min_radius < 0.0 {
            return Err(anyhow!(
                "min_radius must be a non-negative number, got {}",
                self.min_radius
            ));
        }

        let simulation = &self.simulation;
        let unit_interval = [
            ("alpha_decay", simulation.alpha_decay),
            ("velocity_decay", simulation.velocity_decay),
            ("collision_strength", simulation.collision_strength),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("simulation.{name} must be within [0, 1], got {value}"));
            }
        }
        if !(simulation.alpha_min > 0.0 && simulation.alpha_min < simulation.initial_alpha) {
            return Err(anyhow!(
                "simulation.alpha_min must be positive and below initial_alpha"
            ));
        }
        if !(simulation.reheat_alpha > 0.0 && simulation.reheat_alpha < simulation.initial_alpha) {
            return Err(anyhow!(
                "simulation.reheat_alpha must be positive and below initial_alpha"
            ));
        }
        if !simulation.theta.is_finite() || simulation.theta <= 0.0 {
            return Err(anyhow!("simulation.theta must be positive"));
        }
        let finite = [
            simulation.center_strength,
            simulation.charge_strength,
        ];
        if finite.iter().any(|value| !value.is_finite()) {
            return Err(anyhow!("simulation strengths must be finite"));
        }

        self.palette().map(|_| ())
    }

    pub fn palette(&self) -> Result<Palette> {
        let thresholds = ThresholdScale::new(&self.palette.thresholds, &self.palette.colors)
            .context("invalid palette")?;
        Ok(Palette {
            kind: self.palette.kind,
            thresholds,
        })
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            unit: self.amount_unit,
            padding: self.padding,
            min_radius: self.min_radius,
            simulation: self.simulation,
        }
    }
}
