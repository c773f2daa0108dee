use crate::gene::Gene;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A set of genes that recombines as a unit during reproduction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    pub genes: HashMap<String, Gene>,
}

impl Chromosome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gene: Gene) {
        self.genes.insert(gene.id.clone(), gene);
    }
}

/// The complete heritable blueprint of an organism: an ordered sequence of
/// chromosomes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub chromosomes: Vec<Chromosome>,
}

impl Genome {
    /// Dominance-weighted average of every copy of `id` across all
    /// chromosomes; 0.5 if the gene is absent anywhere in the genome.
    #[must_use]
    pub fn get_gene_value(&self, id: &str) -> f32 {
        let mut weighted = 0.0f32;
        let mut weight_total = 0.0f32;
        for chromosome in &self.chromosomes {
            if let Some(gene) = chromosome.genes.get(id) {
                let w = gene.dominance.max(0.0001);
                weighted += gene.value * w;
                weight_total += w;
            }
        }
        if weight_total <= 0.0 {
            0.5
        } else {
            weighted / weight_total
        }
    }

    #[must_use]
    pub fn gene_count(&self) -> usize {
        self.chromosomes.iter().map(|c| c.genes.len()).sum()
    }

    /// Serialize to a hex-encoded JSON blob, for compact storage in
    /// species-record traits or debug output.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(bytes)
    }

    pub fn from_hex(hex_str: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_str)?;
        let genome = serde_json::from_slice(&bytes)?;
        Ok(genome)
    }
}
