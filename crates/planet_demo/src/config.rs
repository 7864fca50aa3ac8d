//! Configuration parsing for the fly-in demo.

use anyhow::{Context, Result};
use planet_terrain::{ForgeConfig, PlanetConfig, TerrainSettings};
use serde::Deserialize;
use std::path::Path;

/// Root configuration for one demo run.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
	/// Quadtree and chunk geometry.
	pub planet: PlanetConfig,
	/// Worker pool settings.
	pub forge: ForgeConfig,
	/// Terrain preset used when `terrain` is absent.
	pub preset: Preset,
	/// Explicit terrain parameters (overrides `preset`).
	pub terrain: Option<TerrainSettings>,
	/// Number of simulation ticks to run.
	pub ticks: u32,
	/// Starting altitude in planet radii above sea level.
	pub start_altitude_factor: f64,
	/// Altitude kept per tick (0..1); 0.99 loses 1% of altitude every tick.
	pub descent_rate: f64,
	/// Lowest altitude the observer descends to (world units).
	pub floor_altitude: f64,
	/// Print a progress line every N ticks (0 disables).
	pub report_every: u32,
}

/// Named terrain presets.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
	Earth,
	Barren,
	Flat,
}

impl Default for DemoConfig {
	fn default() -> Self {
		Self {
			planet: PlanetConfig::default(),
			forge: ForgeConfig::default(),
			preset: Preset::Earth,
			terrain: None,
			ticks: 2_000,
			start_altitude_factor: 2.0,
			descent_rate: 0.995,
			floor_altitude: 50.0,
			report_every: 100,
		}
	}
}

impl DemoConfig {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		let config: DemoConfig =
			toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		self.planet.validate().context("Invalid [planet] section")?;
		self.forge.validate().context("Invalid [forge] section")?;
		if !(self.descent_rate > 0.0 && self.descent_rate <= 1.0) {
			anyhow::bail!("descent_rate must be in (0, 1], got {}", self.descent_rate);
		}
		if !(self.start_altitude_factor.is_finite() && self.start_altitude_factor >= 0.0) {
			anyhow::bail!(
				"start_altitude_factor must be a non-negative number, got {}",
				self.start_altitude_factor
			);
		}
		if self.floor_altitude < 0.0 {
			anyhow::bail!("floor_altitude must not be negative, got {}", self.floor_altitude);
		}
		Ok(())
	}

	/// Terrain snapshot for this run.
	pub fn terrain_settings(&self) -> TerrainSettings {
		if let Some(terrain) = &self.terrain {
			return terrain.clone();
		}
		match self.preset {
			Preset::Earth => TerrainSettings::default(),
			Preset::Barren => TerrainSettings::barren(self.planet.seed),
			Preset::Flat => TerrainSettings::flat(),
		}
	}
}
