//! The five reproduction paths, genetic similarity, the environmental
//! mutation factor, and the speciation decision.
//!
//! This is the evolutionary core: every path ultimately produces a child
//! [`Genome`] via [`crate::genetics::GenomeOps`], then this module decides
//! how significant the resulting divergence is and whether it crosses the
//! threshold into a new species.

use crate::genetics::{ChromosomeOps, GeneOps, GenomeOps};
use primordium_data::{Gene, Genome, Organism, OrganismType, FUNDAMENTAL_GENE_IDS};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Environmental inputs the reproduction/mutation-rate calculations need,
/// assembled once per organism per tick by `World`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReproductionContext {
    pub environmental_stress: f32,
    pub population_stress: f32,
    pub mutagen_exposure: f32,
    pub evolutionary_pressure: f32,
    pub isolation_factor: f32,
    pub geographic_isolation: f32,
    pub population_factor: f32,
}

/// Genetic similarity between two organisms: 0.1 across types; otherwise a
/// per-chromosome blend of gene-id overlap and value closeness, averaged
/// across matched chromosomes and attenuated by generation gap.
#[must_use]
pub fn genetic_similarity(a: &Organism, b: &Organism, same_species: bool) -> f32 {
    if a.organism_type != b.organism_type {
        return 0.1;
    }

    let base = if same_species { 0.8 } else { 0.5 };
    let pairs = a.genome.chromosomes.len().min(b.genome.chromosomes.len());
    if pairs == 0 {
        return base;
    }

    let mut total = 0.0f32;
    for i in 0..pairs {
        let ca = &a.genome.chromosomes[i];
        let cb = &b.genome.chromosomes[i];
        let shared: Vec<&String> = ca.genes.keys().filter(|id| cb.genes.contains_key(*id)).collect();
        let union_len = ca.genes.keys().chain(cb.genes.keys()).collect::<std::collections::HashSet<_>>().len();
        let overlap_fraction = if union_len == 0 { 1.0 } else { shared.len() as f32 / union_len as f32 };

        let closeness = if shared.is_empty() {
            0.5
        } else {
            shared
                .iter()
                .map(|id| 1.0 - (ca.genes[*id].value - cb.genes[*id].value).abs())
                .sum::<f32>()
                / shared.len() as f32
        };

        total += overlap_fraction * 0.6 + closeness * 0.4;
    }
    let averaged = total / pairs as f32;

    let generation_gap = (a.generation as i64 - b.generation as i64).unsigned_abs() as f32;
    let attenuation = (1.0 - (generation_gap / 50.0)).clamp(0.0, 1.0);

    (base * 0.3 + averaged * 0.7) * attenuation.max(0.2)
}

/// Scales the base mutation rate by accumulated environmental stressors,
/// clamped to [0.05, 0.5].
#[must_use]
pub fn environmental_mutation_factor(organism: &Organism, context: &ReproductionContext) -> f32 {
    let age_factor = (organism.age / organism.phenotype.lifespan.max(1.0)).clamp(0.0, 1.0) * 0.1;
    let total = 1.0
        + context.environmental_stress
        + age_factor
        + context.population_stress
        + context.mutagen_exposure
        + context.evolutionary_pressure
        + context.isolation_factor;
    total.clamp(0.05, 0.5)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GeneCategory {
    Core,
    Morphological,
    Behavioral,
    Adaptive,
    Reproductive,
}

impl GeneCategory {
    fn weight(self) -> f32 {
        match self {
            GeneCategory::Core => 1.0,
            GeneCategory::Morphological => 2.0,
            GeneCategory::Behavioral => 1.5,
            GeneCategory::Adaptive => 1.2,
            GeneCategory::Reproductive => 2.5,
        }
    }

    /// Minimum absolute value change to count as a significant mutation;
    /// stricter for more consequential categories.
    fn threshold(self) -> f32 {
        match self {
            GeneCategory::Core => 0.05,
            GeneCategory::Morphological => 0.1,
            GeneCategory::Behavioral => 0.1,
            GeneCategory::Adaptive => 0.08,
            GeneCategory::Reproductive => 0.03,
        }
    }
}

fn gene_category(id: &str) -> GeneCategory {
    match id {
        "metabolism_efficiency" | "energy_storage" => GeneCategory::Core,
        "speed" | "vision" | "size" | "strength" => GeneCategory::Morphological,
        "survival_instinct" => GeneCategory::Behavioral,
        "immune_system" => GeneCategory::Adaptive,
        "fertility" | "reproduction_investment" => GeneCategory::Reproductive,
        _ => {
            let mut hasher = DefaultHasher::new();
            id.hash(&mut hasher);
            match hasher.finish() % 4 {
                0 => GeneCategory::Core,
                1 => GeneCategory::Morphological,
                2 => GeneCategory::Behavioral,
                _ => GeneCategory::Adaptive,
            }
        }
    }
}

/// Result of comparing a child genome against its self-clone parent.
#[derive(Clone, Copy, Debug, Default)]
pub struct MutationSignificance {
    pub mutation_count: u32,
    /// Normalized into [0, 1).
    pub significance: f32,
}

/// Counts significant gene-value changes (weighted by category), plus
/// structural changes (gene/chromosome additions or removals, weighted
/// heavily), and normalizes the weighted total into [0, 1).
#[must_use]
pub fn compare_genomes(parent: &Genome, child: &Genome) -> MutationSignificance {
    let mut mutation_count = 0u32;
    let mut weighted_total = 0.0f32;

    let pairs = parent.chromosomes.len().min(child.chromosomes.len());
    for i in 0..pairs {
        let parent_c = &parent.chromosomes[i];
        let child_c = &child.chromosomes[i];

        for (id, parent_gene) in &parent_c.genes {
            match child_c.genes.get(id) {
                Some(child_gene) => {
                    let category = gene_category(id);
                    if (child_gene.value - parent_gene.value).abs() > category.threshold() {
                        mutation_count += 1;
                        weighted_total += category.weight();
                    }
                }
                None => {
                    mutation_count += 1;
                    weighted_total += 3.0;
                }
            }
        }
        for id in child_c.genes.keys() {
            if !parent_c.genes.contains_key(id) {
                mutation_count += 1;
                weighted_total += 3.0;
            }
        }
    }

    let chromosome_delta = (parent.chromosomes.len() as i64 - child.chromosomes.len() as i64).unsigned_abs();
    if chromosome_delta > 0 {
        mutation_count += chromosome_delta as u32;
        weighted_total += chromosome_delta as f32 * 5.0;
    }

    let significance = weighted_total / (weighted_total + 10.0);
    MutationSignificance { mutation_count, significance }
}

/// Probability of speciation firing for a given offspring, clamped to
/// [0, 0.8]. A child with no detected gene-level change at all (no
/// mutation fired during reproduction) never speciates, regardless of
/// isolation or pressure terms.
#[must_use]
pub fn speciation_probability(
    significance: MutationSignificance,
    context: &ReproductionContext,
    generation: u32,
) -> f32 {
    if significance.mutation_count == 0 {
        return 0.0;
    }
    let generation_factor = (generation as f32 / 50.0).clamp(0.0, 1.0);
    let probability = 0.05
        + 0.4 * significance.significance
        + 0.2 * context.geographic_isolation
        + 0.3 * context.evolutionary_pressure
        + 0.1 * generation_factor
        + 0.1 * context.population_factor;
    probability.clamp(0.0, 0.8)
}

/// Weighted fitness dominance score used to decide which parent's species a
/// cross-species hybrid inherits.
#[must_use]
pub fn dominance_score(organism: &Organism) -> f32 {
    let normalized_generation = (organism.generation as f32 / 100.0).clamp(0.0, 1.0);
    organism.phenotype.immune_strength * 0.2
        + (1.0 - organism.phenotype.metabolism_rate / 2.0).clamp(0.0, 1.0) * 0.15
        + (organism.phenotype.size / 3.0).clamp(0.0, 1.0) * 0.15
        + (organism.phenotype.strength / 5.0).clamp(0.0, 1.0) * 0.15
        + organism.adaptation_score.clamp(0.0, 1.0) * 0.2
        + normalized_generation * 0.15
}

/// Outcome of a successful reproduction attempt, before `World` assigns
/// identity (id, position, species id) to the new organism.
#[derive(Clone, Debug)]
pub struct OffspringGenome {
    pub genome: Genome,
    pub mutation_significance: MutationSignificance,
    pub speciates: bool,
    pub inbreeding_depression: f32,
}

fn mutate_genome_at_rate(genome: &Genome, rate_multiplier: f32, rng: &mut impl Rng) -> Genome {
    let chromosomes = genome
        .chromosomes
        .iter()
        .map(|c| {
            let genes = c
                .genes
                .iter()
                .map(|(id, gene)| {
                    let mut scaled = gene.clone();
                    scaled.mutation_rate = (gene.mutation_rate * rate_multiplier).clamp(0.0001, 1.0);
                    (id.clone(), scaled)
                })
                .collect();
            primordium_data::Chromosome { genes }
        })
        .collect::<Vec<_>>();
    let scaled = Genome { chromosomes };
    scaled.mutated(rng)
}

trait ChromosomesMutated {
    fn mutated(&self, rng: &mut impl Rng) -> Genome;
}

impl ChromosomesMutated for Genome {
    fn mutated(&self, rng: &mut impl Rng) -> Genome {
        Genome {
            chromosomes: self.chromosomes.iter().map(|c| c.mutated(rng)).collect(),
        }
    }
}

/// Bacterial conjugation: clone self with mutation, then transfer 1-5 genes
/// from `partner` onto a random chromosome, re-mutated at an adjusted rate.
#[must_use]
pub fn bacterial_conjugation(self_genome: &Genome, partner_genome: &Genome, rng: &mut impl Rng) -> Genome {
    let mut child = self_genome.mutated(rng);
    if child.chromosomes.is_empty() || partner_genome.chromosomes.is_empty() {
        return child;
    }

    let donor_genes: Vec<&Gene> = partner_genome
        .chromosomes
        .iter()
        .flat_map(|c| c.genes.values())
        .collect();
    if donor_genes.is_empty() {
        return child;
    }

    let transfer_count = rng.gen_range(1..=5.min(donor_genes.len()));
    let chosen = donor_genes.choose_multiple(rng, transfer_count);
    let target_chromosome = rng.gen_range(0..child.chromosomes.len());
    for gene in chosen {
        let mut transferred = gene.mutate(rng);
        transferred.mutation_rate = (transferred.mutation_rate * 1.5).min(1.0);
        child.chromosomes[target_chromosome].insert(transferred);
    }
    child
}

/// Asexual division: clone with mutation, then apply a Poisson-like burst
/// of additional point/duplication/deletion/insertion/rearrangement
/// mutations, each chromosome independently.
#[must_use]
pub fn asexual_division(self_genome: &Genome, rng: &mut impl Rng) -> Genome {
    let mut child = self_genome.mutated(rng);
    for chromosome in &mut child.chromosomes {
        let length = chromosome.genes.len().max(1);
        let avg_rate: f32 = if chromosome.genes.is_empty() {
            0.01
        } else {
            chromosome.genes.values().map(|g| g.mutation_rate).sum::<f32>() / length as f32
        };
        let burst_cap = ((length as f32 * avg_rate * 2.0).ceil() as usize).clamp(0, 5);
        if burst_cap == 0 {
            continue;
        }
        let burst_count = rng.gen_range(1..=burst_cap);

        for _ in 0..burst_count {
            let draw: f32 = rng.gen();
            if draw < 0.65 {
                // Point: nudge a random existing gene.
                if let Some(id) = chromosome.genes.keys().cloned().collect::<Vec<_>>().choose(rng).cloned() {
                    let mutated = chromosome.genes[&id].mutate(rng);
                    chromosome.genes.insert(id, mutated);
                }
            } else if draw < 0.77 {
                // Duplication.
                if let Some(id) = chromosome.genes.keys().cloned().collect::<Vec<_>>().choose(rng).cloned() {
                    let mut copy = chromosome.genes[&id].clone();
                    copy.id = format!("{id}_dup{}", rng.gen_range(0..10_000));
                    chromosome.insert(copy);
                }
            } else if draw < 0.87 {
                // Deletion, skipping protected essential gene prefixes.
                let deletable: Vec<String> = chromosome
                    .genes
                    .keys()
                    .filter(|id| !primordium_data::PROTECTED_GENE_PREFIXES.iter().any(|p| id.starts_with(p)))
                    .cloned()
                    .collect();
                if let Some(id) = deletable.choose(rng) {
                    chromosome.genes.remove(id);
                }
            } else if draw < 0.95 {
                // Insertion: a fresh random gene.
                let id = format!("gene_novel_{}", rng.gen_range(0..1_000_000));
                chromosome.insert(Gene::new(id, rng.gen_range(0.0..1.0), rng.gen_range(0.001..0.05)));
            } else {
                // Rearrangement: swap two gene ids' values in place.
                let ids: Vec<String> = chromosome.genes.keys().cloned().collect();
                if ids.len() >= 2 {
                    let a = ids.choose(rng).expect("nonempty").clone();
                    let b = ids.choose(rng).expect("nonempty").clone();
                    if a != b {
                        let value_a = chromosome.genes[&a].value;
                        let value_b = chromosome.genes[&b].value;
                        chromosome.genes.get_mut(&a).expect("a present").value = value_b;
                        chromosome.genes.get_mut(&b).expect("b present").value = value_a;
                    }
                }
            }
        }
    }
    child
}

/// Self-pollination: intra-genome recombination between two of the
/// offspring's own chromosomes, plus extra mutation. Returns the child
/// genome and an inbreeding-depression score proportional to the count of
/// deleterious (i.e. significant) mutations introduced.
#[must_use]
pub fn self_pollination(self_genome: &Genome, rng: &mut impl Rng) -> (Genome, f32) {
    let mut child = self_genome.mutated(rng);
    if child.chromosomes.len() >= 2 {
        let i = rng.gen_range(0..child.chromosomes.len());
        let mut j = rng.gen_range(0..child.chromosomes.len());
        while j == i {
            j = rng.gen_range(0..child.chromosomes.len());
        }
        let swap_count = rng.gen_range(1..=3);
        let ids_i: Vec<String> = child.chromosomes[i].genes.keys().cloned().collect();
        let ids_j: Vec<String> = child.chromosomes[j].genes.keys().cloned().collect();
        for _ in 0..swap_count {
            if ids_i.is_empty() || ids_j.is_empty() {
                break;
            }
            let id_i = ids_i.choose(rng).expect("nonempty").clone();
            let id_j = ids_j.choose(rng).expect("nonempty").clone();
            if let (Some(gi), Some(gj)) = (child.chromosomes[i].genes.remove(&id_i), child.chromosomes[j].genes.remove(&id_j)) {
                child.chromosomes[j].genes.insert(id_i, gi);
                child.chromosomes[i].genes.insert(id_j, gj);
            }
        }
    }
    let significance = compare_genomes(self_genome, &child);
    let inbreeding_depression = (significance.mutation_count as f32 * 0.02).min(1.0);
    (child, inbreeding_depression)
}

/// Where a self-pollinated seed lands, relative to the parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedDispersal {
    Gravity,
    Wind,
    Explosion,
}

#[must_use]
pub fn draw_seed_dispersal(rng: &mut impl Rng) -> SeedDispersal {
    let draw: f32 = rng.gen();
    if draw < 0.6 {
        SeedDispersal::Gravity
    } else if draw < 0.9 {
        SeedDispersal::Wind
    } else {
        SeedDispersal::Explosion
    }
}

fn incompatibility_threshold(organism_type: OrganismType) -> f32 {
    match organism_type {
        OrganismType::Plant => 0.35,
        OrganismType::Unicellular => 0.4,
        OrganismType::Herbivore | OrganismType::Omnivore => 0.4,
        OrganismType::Carnivore => 0.45,
    }
}

fn mate_quality(organism: &Organism) -> f32 {
    let extra = match organism.organism_type {
        OrganismType::Herbivore => organism.phenotype.max_speed / 10.0,
        OrganismType::Carnivore => organism.phenotype.vision_range / 40.0,
        OrganismType::Omnivore => organism.phenotype.metabolism_rate / 2.0,
        _ => 0.5,
    };
    (organism.health / 100.0) * 0.3
        + (organism.phenotype.size / 3.0).clamp(0.0, 1.0) * 0.25
        + (organism.phenotype.strength / 5.0).clamp(0.0, 1.0) * 0.25
        + extra.clamp(0.0, 1.0) * 0.2
}

/// Cross-pollination / sexual reproduction. Returns `None` if the
/// compatibility or success roll fails.
#[must_use]
pub fn cross_pollination(
    self_organism: &Organism,
    partner: &Organism,
    similarity: f32,
    context: &ReproductionContext,
    rng: &mut impl Rng,
) -> Option<Genome> {
    if similarity < incompatibility_threshold(self_organism.organism_type) && rng.gen_bool(0.7) {
        return None;
    }

    let quality = (mate_quality(self_organism) + mate_quality(partner)) / 2.0;
    let similarity_term = 1.0 - (similarity - 0.7).abs();
    let success_probability = (0.3 + quality * 0.4 + similarity_term * 0.3).clamp(0.0, 1.0);
    if !rng.gen_bool(success_probability as f64) {
        return None;
    }

    let mut child = Genome::reproduce(&self_organism.genome, &partner.genome, rng);
    let extra_rate = environmental_mutation_factor(self_organism, context);
    if extra_rate > 0.05 {
        child = mutate_genome_at_rate(&child, 1.0 + extra_rate, rng);
    }
    Some(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::GenomeOps;
    use primordium_data::{DevelopmentalStage, Phenotype, Position, Velocity};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(99)
    }

    fn organism(organism_type: OrganismType, genome: Genome) -> Organism {
        Organism {
            id: Uuid::new_v4(),
            species_id: Uuid::new_v4(),
            taxonomy_id: Uuid::new_v4(),
            position: Position::default(),
            velocity: Velocity::default(),
            organism_type,
            genome,
            phenotype: Phenotype::default(),
            generation: 0,
            parent_ids: Vec::new(),
            age: 0.0,
            health: 100.0,
            energy: 100.0,
            hydration: 100.0,
            waste: 0.0,
            maturity: 1.0,
            is_alive: true,
            reproduction_cooldown: 0.0,
            offspring_count: 0,
            developmental_stage: DevelopmentalStage::Adult,
            adaptation_score: 0.8,
            advanced: None,
        }
    }

    #[test]
    fn identical_clones_are_fully_similar() {
        let mut r = rng();
        let genome = Genome::random_genome(&mut r);
        let a = organism(OrganismType::Herbivore, genome.clone());
        let b = organism(OrganismType::Herbivore, genome);
        assert!(genetic_similarity(&a, &b, true) > 0.9);
    }

    #[test]
    fn cross_type_similarity_is_low() {
        let mut r = rng();
        let genome = Genome::random_genome(&mut r);
        let a = organism(OrganismType::Herbivore, genome.clone());
        let b = organism(OrganismType::Carnivore, genome);
        assert_eq!(genetic_similarity(&a, &b, false), 0.1);
    }

    #[test]
    fn environmental_mutation_factor_stays_in_bounds() {
        let mut r = rng();
        let genome = Genome::random_genome(&mut r);
        let o = organism(OrganismType::Plant, genome);
        let context = ReproductionContext {
            environmental_stress: 10.0,
            ..Default::default()
        };
        let factor = environmental_mutation_factor(&o, &context);
        assert!((0.05..=0.5).contains(&factor));
    }

    #[test]
    fn compare_identical_genomes_has_zero_significance() {
        let mut r = rng();
        let genome = Genome::random_genome(&mut r);
        let significance = compare_genomes(&genome, &genome);
        assert_eq!(significance.mutation_count, 0);
        assert_eq!(significance.significance, 0.0);
    }

    #[test]
    fn asexual_division_is_an_identity_at_zero_mutation_rate() {
        let mut r = rng();
        let mut genome = Genome::random_genome(&mut r);
        for chromosome in &mut genome.chromosomes {
            for gene in chromosome.genes.values_mut() {
                gene.mutation_rate = 0.0;
            }
        }
        let mut child_rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let child = asexual_division(&genome, &mut child_rng);
            assert_eq!(child, genome);
        }
    }

    #[test]
    fn no_detected_mutation_never_speciates() {
        let significance = MutationSignificance { mutation_count: 0, significance: 0.0 };
        let context = ReproductionContext {
            geographic_isolation: 1.0,
            evolutionary_pressure: 1.0,
            population_factor: 1.0,
            ..Default::default()
        };
        assert_eq!(speciation_probability(significance, &context, 100), 0.0);
    }

    #[test]
    fn speciation_probability_is_clamped() {
        let significance = MutationSignificance { mutation_count: 50, significance: 1.0 };
        let context = ReproductionContext {
            geographic_isolation: 1.0,
            evolutionary_pressure: 1.0,
            population_factor: 1.0,
            ..Default::default()
        };
        let probability = speciation_probability(significance, &context, 100);
        assert!(probability <= 0.8);
    }

    #[test]
    fn asexual_division_protects_essential_gene_prefixes() {
        let mut r = rng();
        let genome = Genome::random_genome(&mut r);
        for _ in 0..30 {
            let child = asexual_division(&genome, &mut r);
            for id in FUNDAMENTAL_GENE_IDS {
                assert!(child.chromosomes[0].genes.contains_key(*id), "protected gene {id} was deleted");
            }
        }
    }
}
