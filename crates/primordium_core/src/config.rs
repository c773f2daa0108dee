//! Layered, validated configuration for world construction.
//!
//! Mirrors the teacher's `AppConfig` pattern: a tree of strongly-typed
//! sub-configs with complete defaults, an optional TOML overlay, and a
//! `validate()` pass that fails fast on nonsensical values (§7
//! `config_invalid`).

use crate::error::{SimError, Result};
use primordium_data::{Biome, OrganismType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grid and population shape of the world.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorldConfig {
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
    pub initial_organism_count: u32,
    /// Nonnegative weights for {Unicellular, Plant, Herbivore, Carnivore, Omnivore}.
    pub organism_ratios: [f32; 5],
    /// Relative weight per biome; biomes absent from the map get weight 0.
    pub biome_ratios: HashMap<Biome, f32>,
    pub max_organisms: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            cell_size: 50,
            initial_organism_count: 200,
            organism_ratios: [0.15, 0.35, 0.30, 0.10, 0.10],
            biome_ratios: HashMap::new(),
            max_organisms: 5000,
        }
    }
}

/// Multipliers applied to baseline climate behavior.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClimateConfig {
    pub temperature: f32,
    pub humidity: f32,
    pub variability: f32,
    /// Offset in [-0.2, 0.2] applied to the sea-level altitude threshold.
    pub sea_level: f32,
    pub resources: f32,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            humidity: 1.0,
            variability: 1.0,
            sea_level: 0.0,
            resources: 1.0,
        }
    }
}

/// Multipliers around 1.0 applied to the simulation's core evolutionary
/// pressures.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SimulationParamsConfig {
    pub mutation_rate: f32,
    pub selection_pressure: f32,
    pub competition: f32,
    pub predation: f32,
    pub reproduction: f32,
}

impl Default for SimulationParamsConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 1.0,
            selection_pressure: 1.0,
            competition: 1.0,
            predation: 1.0,
            reproduction: 1.0,
        }
    }
}

/// Top-level, validated configuration bundle used to construct a `World`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub climate: ClimateConfig,
    pub simulation: SimulationParamsConfig,
    /// Seed for the world's RNG stream; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Path the species registry is persisted to; `None` disables persistence.
    pub registry_path: Option<String>,
}

impl AppConfig {
    /// Validates all configuration parameters, failing fast per §7
    /// `config_invalid`. Zero-sum weight vectors are not an error here;
    /// the §9 open question's equal-weights fallback is applied by the
    /// caller that consumes the weights, not at validation time.
    pub fn validate(&self) -> Result<()> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(SimError::config_invalid(
                "world width and height must be positive",
            ));
        }
        if self.world.cell_size == 0 {
            return Err(SimError::config_invalid("cell_size must be positive"));
        }
        if self.world.organism_ratios.iter().any(|w| *w < 0.0) {
            return Err(SimError::config_invalid(
                "organism_ratios must not contain negative weights",
            ));
        }
        if self.world.biome_ratios.values().any(|w| *w < 0.0) {
            return Err(SimError::config_invalid(
                "biome_ratios must not contain negative weights",
            ));
        }
        if self.world.max_organisms == 0 {
            return Err(SimError::config_invalid("max_organisms must be positive"));
        }
        if !(-0.2..=0.2).contains(&self.climate.sea_level) {
            return Err(SimError::config_invalid(
                "climate.sea_level must be in [-0.2, 0.2]",
            ));
        }
        for (name, mult) in [
            ("climate.temperature", self.climate.temperature),
            ("climate.humidity", self.climate.humidity),
            ("climate.variability", self.climate.variability),
            ("climate.resources", self.climate.resources),
            ("simulation.mutation_rate", self.simulation.mutation_rate),
            (
                "simulation.selection_pressure",
                self.simulation.selection_pressure,
            ),
            ("simulation.competition", self.simulation.competition),
            ("simulation.predation", self.simulation.predation),
            ("simulation.reproduction", self.simulation.reproduction),
        ] {
            if mult < 0.0 {
                return Err(SimError::config_invalid(format!(
                    "{name} multiplier must be non-negative"
                )));
            }
        }
        Ok(())
    }

    /// Loads a TOML overlay on top of `AppConfig::default()` and validates
    /// the result.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SimError::config_invalid(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Normalizes `organism_ratios` to sum to 1.0, falling back to equal
    /// weights if the input sums to (near) zero — the §9 open-question
    /// fallback for unguarded `sum(weights)` divisions in the source.
    #[must_use]
    pub fn normalized_organism_ratios(&self) -> [f32; 5] {
        normalize_weights(&self.world.organism_ratios)
    }

    /// Hashes the effective configuration (sha2) so a persisted registry
    /// file can be traced back to the run that produced it.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world.width).as_bytes());
        hasher.update(format!("{:?}", self.world.height).as_bytes());
        hasher.update(format!("{:?}", self.world.organism_ratios).as_bytes());
        hasher.update(format!("{:?}", self.climate).as_bytes());
        hasher.update(format!("{:?}", self.simulation).as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Equal-weights fallback for a weight vector that sums to (near) zero.
#[must_use]
pub fn normalize_weights<const N: usize>(weights: &[f32; N]) -> [f32; N] {
    let total: f32 = weights.iter().sum();
    if total <= f32::EPSILON {
        [1.0 / N as f32; N]
    } else {
        let mut out = [0.0f32; N];
        for (o, w) in out.iter_mut().zip(weights.iter()) {
            *o = w / total;
        }
        out
    }
}

#[must_use]
pub fn organism_type_from_ratio(ratios: &[f32; 5], draw: f32) -> OrganismType {
    let order = [
        OrganismType::Unicellular,
        OrganismType::Plant,
        OrganismType::Herbivore,
        OrganismType::Carnivore,
        OrganismType::Omnivore,
    ];
    let mut cumulative = 0.0f32;
    for (ty, w) in order.iter().zip(ratios.iter()) {
        cumulative += w;
        if draw <= cumulative {
            return *ty;
        }
    }
    order[order.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_width_is_invalid() {
        let mut config = AppConfig::default();
        config.world.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_ratio_is_invalid() {
        let mut config = AppConfig::default();
        config.world.organism_ratios[0] = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sea_level_out_of_range_is_invalid() {
        let mut config = AppConfig::default();
        config.climate.sea_level = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_sum_weights_fall_back_to_equal() {
        let weights = normalize_weights(&[0.0f32; 5]);
        for w in weights {
            assert!((w - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = AppConfig::default();
        let b = AppConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
