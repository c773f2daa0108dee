use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single heritable unit: a scalar value plus the machinery that
/// controls how it mutates and how it modulates other genes and traits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub id: String,
    /// Allele value in [0, 1].
    pub value: f32,
    pub mutation_rate: f32,
    pub dominance: f32,
    pub expression_level: f32,
    /// gene-id -> coefficient in [-1, 1], this gene's effect on others.
    pub epistasis: HashMap<String, f32>,
    /// (trait name, coefficient in [-1, 1]) pairs this gene additionally influences.
    pub pleiotropy: Vec<(String, f32)>,
}

impl Gene {
    pub fn new(id: impl Into<String>, value: f32, mutation_rate: f32) -> Self {
        Self {
            id: id.into(),
            value: value.clamp(0.0, 1.0),
            mutation_rate: mutation_rate.clamp(0.0001, 0.2),
            dominance: 0.5,
            expression_level: 1.0,
            epistasis: HashMap::new(),
            pleiotropy: Vec::new(),
        }
    }
}

/// Named genes that appear in the first "fundamental" chromosome of every
/// freshly generated genome and are protected from deletion during mutation.
pub const FUNDAMENTAL_GENE_IDS: &[&str] = &[
    "metabolism_efficiency",
    "energy_storage",
    "speed",
    "vision",
    "immune_system",
    "fertility",
    "reproduction_investment",
    "survival_instinct",
    "size",
    "strength",
];

/// Gene-id prefixes that are protected from deletion during asexual mutation.
pub const PROTECTED_GENE_PREFIXES: &[&str] =
    &["metabolism", "energy", "reproduction", "survival"];
