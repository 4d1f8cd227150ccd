//! Runtime parameters for the particle system.
//!
//! [`Settings`] is the snapshot the parameter panel edits every frame. The
//! core only ever reads it. Presets are plain JSON files; any field missing
//! from a preset falls back to its default.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the simulation step runs.
///
/// Only [`SimulationMode::Gpu`] is implemented; `Cpu` is accepted so
/// presets that carry it still load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationMode {
    #[default]
    Gpu,
    Cpu,
}

/// Particle system parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub number_of_particles: u32,
    pub min_particle_lifetime: f32,
    pub max_particle_lifetime: f32,
    pub origin: Vec3,
    /// Launch speed of a respawned particle.
    pub initial_velocity: f32,
    pub gravity: Vec3,
    /// Maximum respawns per second; `None` respawns every expired particle.
    pub spawn_rate: Option<f32>,
    /// Tint of a freshly spawned particle (RGBA).
    pub color: [f32; 4],
    /// Tint of a particle about to expire (RGBA).
    pub color2: [f32; 4],
    pub half_width: f32,
    pub half_height: f32,
    pub mode: SimulationMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            number_of_particles: 10_000,
            min_particle_lifetime: 1.0,
            max_particle_lifetime: 3.0,
            origin: Vec3::ZERO,
            initial_velocity: 1.0,
            gravity: Vec3::new(0.0, -0.9, 0.0),
            spawn_rate: None,
            color: [1.0, 0.85, 0.3, 1.0],
            color2: [0.8, 0.1, 0.05, 0.0],
            half_width: 0.02,
            half_height: 0.02,
            mode: SimulationMode::Gpu,
        }
    }
}

impl Settings {
    /// Check invariants the kernel depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_particle_lifetime, self.max_particle_lifetime);
        if !(min > 0.0 && max >= min) {
            return Err(ConfigError::InvalidLifetime { min, max });
        }
        Ok(())
    }

    /// Load a preset from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save these settings as a JSON preset.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Respawn budget for one step of `delta_time` seconds.
    pub fn spawn_budget(&self, delta_time: f32) -> u32 {
        match self.spawn_rate {
            None => crate::kernel::UNLIMITED_SPAWN,
            Some(rate) => (rate.max(0.0) * delta_time.max(0.0)).ceil() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_lifetime_rejected() {
        let settings = Settings {
            min_particle_lifetime: 3.0,
            max_particle_lifetime: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidLifetime { .. })
        ));
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let settings = Settings {
            min_particle_lifetime: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_preset_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "number_of_particles": 42 }"#).unwrap();
        assert_eq!(settings.number_of_particles, 42);
        assert_eq!(settings.gravity, Settings::default().gravity);
    }

    #[test]
    fn test_preset_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("sparkfield-preset-{}.json", std::process::id()));
        let settings = Settings {
            number_of_particles: 777,
            spawn_rate: Some(120.0),
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_spawn_budget() {
        let mut settings = Settings::default();
        assert_eq!(settings.spawn_budget(0.016), u32::MAX);
        settings.spawn_rate = Some(100.0);
        assert_eq!(settings.spawn_budget(0.016), 2);
        assert_eq!(settings.spawn_budget(0.0), 0);
    }
}
