//! Pure genome -> phenotype derivation.
//!
//! Every scalar trait is a weighted average of one or more named genes,
//! adjusted by that gene's epistatic interactions and any pleiotropic
//! entries elsewhere in the genome that target the trait by name, then
//! mapped linearly into the trait's output range from
//! `primordium_data::TRAIT_METADATA`.

use primordium_data::{Gene, Genome, Phenotype, TRAIT_METADATA};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Weighted gene sources driving a single scalar trait. Weights need not
/// sum to 1; they are normalized at lookup time.
struct TraitSource {
    trait_name: &'static str,
    genes: &'static [(&'static str, f32)],
}

const TRAIT_SOURCES: &[TraitSource] = &[
    TraitSource { trait_name: "size", genes: &[("size", 1.0)] },
    TraitSource { trait_name: "max_speed", genes: &[("speed", 0.7), ("size", 0.3)] },
    TraitSource { trait_name: "strength", genes: &[("strength", 0.7), ("size", 0.3)] },
    TraitSource { trait_name: "metabolism_rate", genes: &[("metabolism_efficiency", 1.0)] },
    TraitSource { trait_name: "energy_capacity", genes: &[("energy_storage", 0.7), ("size", 0.3)] },
    TraitSource { trait_name: "vision_range", genes: &[("vision", 1.0)] },
    TraitSource { trait_name: "smell", genes: &[("survival_instinct", 0.6), ("vision", 0.4)] },
    TraitSource { trait_name: "hearing", genes: &[("survival_instinct", 0.5), ("vision", 0.5)] },
    TraitSource { trait_name: "fertility", genes: &[("fertility", 1.0)] },
    TraitSource { trait_name: "maturation_time", genes: &[("reproduction_investment", 0.6), ("size", 0.4)] },
    TraitSource { trait_name: "max_offspring", genes: &[("fertility", 0.7), ("reproduction_investment", 0.3)] },
    TraitSource { trait_name: "immune_strength", genes: &[("immune_system", 1.0)] },
    TraitSource { trait_name: "toxin_resistance", genes: &[("immune_system", 0.6), ("survival_instinct", 0.4)] },
    TraitSource { trait_name: "attack_power", genes: &[("strength", 0.6), ("speed", 0.4)] },
    TraitSource { trait_name: "defense_power", genes: &[("strength", 0.5), ("size", 0.5)] },
    TraitSource { trait_name: "learning_rate", genes: &[("survival_instinct", 0.5), ("vision", 0.5)] },
    TraitSource { trait_name: "memory", genes: &[("survival_instinct", 1.0)] },
    TraitSource { trait_name: "problem_solving", genes: &[("survival_instinct", 0.7), ("vision", 0.3)] },
    TraitSource { trait_name: "temperature_range", genes: &[("survival_instinct", 1.0)] },
    TraitSource { trait_name: "optimal_temperature", genes: &[("size", 0.5), ("metabolism_efficiency", 0.5)] },
    TraitSource { trait_name: "waste_tolerance", genes: &[("immune_system", 0.5), ("survival_instinct", 0.5)] },
    TraitSource { trait_name: "lifespan", genes: &[("survival_instinct", 0.6), ("size", 0.4)] },
];

fn trait_range(name: &str) -> (f32, f32) {
    TRAIT_METADATA
        .iter()
        .find(|t| t.name == name)
        .map(|t| t.range)
        .unwrap_or((0.0, 1.0))
}

/// First occurrence of a gene id across chromosomes, in declaration order.
fn find_gene<'a>(genome: &'a Genome, id: &str) -> Option<&'a Gene> {
    genome
        .chromosomes
        .iter()
        .find_map(|c| c.genes.get(id))
}

fn base_normalized_value(genome: &Genome, sources: &[(&str, f32)]) -> f32 {
    let weight_total: f32 = sources.iter().map(|(_, w)| w).sum();
    if weight_total <= f32::EPSILON {
        return 0.5;
    }
    sources
        .iter()
        .map(|(id, w)| genome.get_gene_value(id) * w)
        .sum::<f32>()
        / weight_total
}

/// Sum of `value(a) * value(b) * coefficient` over every epistasis entry on
/// a trait's source genes whose target also exists in the genome, clamped
/// to [-0.3, 0.3].
fn epistasis_contribution(genome: &Genome, sources: &[(&str, f32)]) -> f32 {
    let mut total = 0.0f32;
    for (id, _) in sources {
        if let Some(gene) = find_gene(genome, id) {
            for (target_id, coeff) in &gene.epistasis {
                if let Some(target) = find_gene(genome, target_id) {
                    total += gene.value * target.value * coeff;
                }
            }
        }
    }
    total.clamp(-0.3, 0.3)
}

/// Sum of `value * coefficient` over every pleiotropy entry, anywhere in the
/// genome, that names this trait, clamped to [-0.2, 0.2].
fn pleiotropy_contribution(genome: &Genome, trait_name: &str) -> f32 {
    let mut total = 0.0f32;
    for chromosome in &genome.chromosomes {
        for gene in chromosome.genes.values() {
            for (name, coeff) in &gene.pleiotropy {
                if name == trait_name {
                    total += gene.value * coeff;
                }
            }
        }
    }
    total.clamp(-0.2, 0.2)
}

fn derive_trait(genome: &Genome, trait_name: &str, sources: &[(&str, f32)]) -> f32 {
    let base = base_normalized_value(genome, sources);
    let adjusted = (base + epistasis_contribution(genome, sources) + pleiotropy_contribution(genome, trait_name))
        .clamp(0.0, 1.0);
    let (lo, hi) = trait_range(trait_name);
    lo + adjusted * (hi - lo)
}

/// Buckets every non-fundamental gene's value into one of three channels by
/// a stable hash of its id, averaging within each bucket. Two genomes that
/// differ only in their anonymous chromosomes still produce distinct,
/// reproducible colors.
fn derive_color(genome: &Genome) -> (u8, u8, u8) {
    let mut sums = [0.0f32; 3];
    let mut counts = [0u32; 3];
    for chromosome in &genome.chromosomes {
        for (id, gene) in &chromosome.genes {
            let mut hasher = DefaultHasher::new();
            id.hash(&mut hasher);
            let bucket = (hasher.finish() % 3) as usize;
            sums[bucket] += gene.value;
            counts[bucket] += 1;
        }
    }
    let mut channels = [128u8; 3];
    for i in 0..3 {
        if counts[i] > 0 {
            let avg = sums[i] / counts[i] as f32;
            channels[i] = (avg.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }
    (channels[0], channels[1], channels[2])
}

/// Extension operator deriving a [`Phenotype`] from a [`Genome`].
pub trait PhenotypeOps {
    /// Pure, referentially transparent derivation: identical genomes yield
    /// bit-equal phenotypes.
    fn derive_phenotype(&self) -> Phenotype;
}

impl PhenotypeOps for Genome {
    fn derive_phenotype(&self) -> Phenotype {
        let mut traits: std::collections::HashMap<&str, f32> =
            std::collections::HashMap::with_capacity(TRAIT_SOURCES.len());
        for source in TRAIT_SOURCES {
            traits.insert(source.trait_name, derive_trait(self, source.trait_name, source.genes));
        }

        let size = traits["size"];
        let metabolism_rate = traits["metabolism_rate"];
        let (lifespan_lo, lifespan_hi) = trait_range("lifespan");
        let size_norm = ((size - trait_range("size").0) / (trait_range("size").1 - trait_range("size").0)).clamp(0.0, 1.0);
        let metabolism_norm = ((metabolism_rate - trait_range("metabolism_rate").0)
            / (trait_range("metabolism_rate").1 - trait_range("metabolism_rate").0))
            .clamp(0.0, 1.0);
        let lifespan_raw = traits["lifespan"];
        let lifespan = (lifespan_raw * (1.0 - 0.3 * size_norm) * (1.0 - 0.3 * metabolism_norm))
            .clamp(lifespan_lo, lifespan_hi);

        Phenotype {
            size,
            max_speed: traits["max_speed"],
            strength: traits["strength"],
            metabolism_rate,
            energy_capacity: traits["energy_capacity"],
            vision_range: traits["vision_range"],
            smell: traits["smell"],
            hearing: traits["hearing"],
            fertility: traits["fertility"],
            maturation_time: traits["maturation_time"],
            max_offspring: traits["max_offspring"].round().max(1.0) as u32,
            immune_strength: traits["immune_strength"],
            toxin_resistance: traits["toxin_resistance"],
            attack_power: traits["attack_power"],
            defense_power: traits["defense_power"],
            learning_rate: traits["learning_rate"],
            memory: traits["memory"],
            problem_solving: traits["problem_solving"],
            temperature_range: traits["temperature_range"],
            optimal_temperature: traits["optimal_temperature"],
            waste_tolerance: traits["waste_tolerance"],
            lifespan,
            color: derive_color(self),
        }
    }
}
