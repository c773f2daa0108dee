use serde::{Deserialize, Serialize};

/// Scalar traits derived from a genome. Referentially transparent: the same
/// genome always yields a bit-equal `Phenotype`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    pub size: f32,
    pub max_speed: f32,
    pub strength: f32,
    pub metabolism_rate: f32,
    pub energy_capacity: f32,
    pub vision_range: f32,
    pub smell: f32,
    pub hearing: f32,
    pub fertility: f32,
    pub maturation_time: f32,
    pub max_offspring: u32,
    pub immune_strength: f32,
    pub toxin_resistance: f32,
    pub attack_power: f32,
    pub defense_power: f32,
    pub learning_rate: f32,
    pub memory: f32,
    pub problem_solving: f32,
    /// Half-width around `optimal_temperature` within which adaptation is unpenalized.
    pub temperature_range: f32,
    pub optimal_temperature: f32,
    pub waste_tolerance: f32,
    pub lifespan: f32,
    pub color: (u8, u8, u8),
}

/// Static metadata for a scalar [`Phenotype`] trait: name, the linear output
/// range it is mapped into, and whether higher values are better for the
/// organism (informational only, used for reporting/selection heuristics).
///
/// Replaces attribute-based introspection (walking the phenotype's fields at
/// runtime) with a fixed, compile-time table.
pub struct TraitMeta {
    pub name: &'static str,
    pub range: (f32, f32),
}

pub const TRAIT_METADATA: &[TraitMeta] = &[
    TraitMeta { name: "size", range: (0.2, 3.0) },
    TraitMeta { name: "max_speed", range: (0.0, 10.0) },
    TraitMeta { name: "strength", range: (0.1, 5.0) },
    TraitMeta { name: "metabolism_rate", range: (0.05, 2.0) },
    TraitMeta { name: "energy_capacity", range: (50.0, 500.0) },
    TraitMeta { name: "vision_range", range: (2.0, 40.0) },
    TraitMeta { name: "smell", range: (0.0, 1.0) },
    TraitMeta { name: "hearing", range: (0.0, 1.0) },
    TraitMeta { name: "fertility", range: (0.0, 1.0) },
    TraitMeta { name: "maturation_time", range: (10.0, 500.0) },
    TraitMeta { name: "max_offspring", range: (1.0, 12.0) },
    TraitMeta { name: "immune_strength", range: (0.0, 1.0) },
    TraitMeta { name: "toxin_resistance", range: (0.0, 1.0) },
    TraitMeta { name: "attack_power", range: (0.0, 15.0) },
    TraitMeta { name: "defense_power", range: (0.0, 15.0) },
    TraitMeta { name: "learning_rate", range: (0.0, 1.0) },
    TraitMeta { name: "memory", range: (0.0, 1.0) },
    TraitMeta { name: "problem_solving", range: (0.0, 1.0) },
    TraitMeta { name: "temperature_range", range: (2.0, 25.0) },
    TraitMeta { name: "optimal_temperature", range: (-5.0, 40.0) },
    TraitMeta { name: "waste_tolerance", range: (0.0, 1.0) },
    TraitMeta { name: "lifespan", range: (50.0, 1000.0) },
];

impl Default for Phenotype {
    fn default() -> Self {
        Self {
            size: 1.0,
            max_speed: 1.0,
            strength: 1.0,
            metabolism_rate: 0.5,
            energy_capacity: 100.0,
            vision_range: 10.0,
            smell: 0.5,
            hearing: 0.5,
            fertility: 0.5,
            maturation_time: 100.0,
            max_offspring: 4,
            immune_strength: 0.5,
            toxin_resistance: 0.5,
            attack_power: 1.0,
            defense_power: 1.0,
            learning_rate: 0.5,
            memory: 0.5,
            problem_solving: 0.5,
            temperature_range: 10.0,
            optimal_temperature: 20.0,
            waste_tolerance: 0.5,
            lifespan: 500.0,
            color: (200, 200, 200),
        }
    }
}
