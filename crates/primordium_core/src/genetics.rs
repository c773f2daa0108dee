//! Mutation and crossover operators over the heritable data types in
//! `primordium_data`.
//!
//! `primordium_data::{Gene, Chromosome, Genome}` are pure data; every
//! operator that needs an RNG lives here as an extension trait, so the data
//! crate stays free of a `rand` dependency.

use primordium_data::{Chromosome, Gene, Genome, FUNDAMENTAL_GENE_IDS};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// The fixed trait set a pleiotropic mutation may append a new entry for.
const PLEIOTROPY_TRAITS: &[&str] = &[
    "size",
    "max_speed",
    "strength",
    "metabolism_rate",
    "vision_range",
    "fertility",
    "immune_strength",
    "attack_power",
    "defense_power",
    "lifespan",
];

/// One of the six mutation kinds a `Gene::mutate` draw may apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MutationKind {
    Point,
    Regulatory,
    Dominance,
    Epistatic,
    Pleiotropic,
    Meta,
}

const ALL_KINDS: [MutationKind; 6] = [
    MutationKind::Point,
    MutationKind::Regulatory,
    MutationKind::Dominance,
    MutationKind::Epistatic,
    MutationKind::Pleiotropic,
    MutationKind::Meta,
];

/// Box-Muller sample from N(mean, std).
fn sample_normal(rng: &mut impl Rng, mean: f32, std: f32) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    let z0 = (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos();
    mean + z0 * std
}

/// A point-mutation delta drawn from a mixture of three normals, narrow
/// steps far more likely than broad ones.
fn sample_point_delta(rng: &mut impl Rng) -> f32 {
    let draw: f32 = rng.gen();
    let sigma = if draw < 0.7 {
        0.02
    } else if draw < 0.95 {
        0.1
    } else {
        0.3
    };
    sample_normal(rng, 0.0, sigma)
}

/// Extension operators for a single [`Gene`].
pub trait GeneOps {
    /// Returns a mutated copy. With probability `1 - mutation_rate` this is
    /// an exact copy; otherwise 1-3 mutation kinds (weighted 0.85/0.13/0.02)
    /// are drawn without replacement and applied in sequence.
    fn mutate(&self, rng: &mut impl Rng) -> Gene;
}

impl GeneOps for Gene {
    fn mutate(&self, rng: &mut impl Rng) -> Gene {
        if !rng.gen_bool(self.mutation_rate.clamp(0.0, 1.0) as f64) {
            return self.clone();
        }

        let count_draw: f32 = rng.gen();
        let kind_count = if count_draw < 0.85 {
            1
        } else if count_draw < 0.98 {
            2
        } else {
            3
        };

        let mut kinds = ALL_KINDS;
        kinds.shuffle(rng);

        let mut gene = self.clone();
        for kind in kinds.into_iter().take(kind_count) {
            apply_mutation_kind(&mut gene, kind, rng);
        }
        gene
    }
}

fn apply_mutation_kind(gene: &mut Gene, kind: MutationKind, rng: &mut impl Rng) {
    match kind {
        MutationKind::Point => {
            let delta = sample_point_delta(rng);
            gene.value = (gene.value + delta).clamp(0.0, 1.0);
        }
        MutationKind::Regulatory => {
            let delta = sample_normal(rng, 0.0, 0.1);
            gene.expression_level = (gene.expression_level + delta).clamp(0.0, 1.0);
        }
        MutationKind::Dominance => {
            let delta = sample_normal(rng, 0.0, 0.1);
            gene.dominance = (gene.dominance + delta).clamp(0.0, 1.0);
        }
        MutationKind::Epistatic => {
            if rng.gen_bool(0.5) && !gene.epistasis.is_empty() {
                let keys: Vec<String> = gene.epistasis.keys().cloned().collect();
                let key = keys.choose(rng).expect("epistasis nonempty").clone();
                let delta = sample_normal(rng, 0.0, 0.2);
                let coeff = gene.epistasis.get_mut(&key).expect("key just chosen");
                *coeff = (*coeff + delta).clamp(-1.0, 1.0);
            } else {
                let target = format!("gene_{}", rng.gen_range(0..1000));
                let coeff = rng.gen_range(-0.5..0.5);
                gene.epistasis.insert(target, coeff);
            }
        }
        MutationKind::Pleiotropic => {
            if rng.gen_bool(0.5) && !gene.pleiotropy.is_empty() {
                let idx = rng.gen_range(0..gene.pleiotropy.len());
                let delta = sample_normal(rng, 0.0, 0.2);
                gene.pleiotropy[idx].1 = (gene.pleiotropy[idx].1 + delta).clamp(-1.0, 1.0);
            } else {
                let trait_name = PLEIOTROPY_TRAITS.choose(rng).expect("nonempty").to_string();
                let coeff = sample_normal(rng, 0.0, 0.3).clamp(-1.0, 1.0);
                gene.pleiotropy.push((trait_name, coeff));
            }
        }
        MutationKind::Meta => {
            let mut delta = sample_normal(rng, 0.0, 0.005);
            if gene.mutation_rate > 0.1 && rng.gen_bool(0.8) {
                delta = -delta.abs();
            }
            gene.mutation_rate = (gene.mutation_rate + delta).clamp(0.0001, 0.2);
        }
    }
}

/// Extension operators for a [`Chromosome`].
pub trait ChromosomeOps {
    /// Mutates every gene independently in place, returning the result.
    fn mutated(&self, rng: &mut impl Rng) -> Chromosome;

    /// Uniform crossover per gene id: for ids in both parents, one is
    /// chosen with probability 0.5 and mutated; for ids unique to one
    /// parent, that copy is taken and mutated.
    fn combine(a: &Chromosome, b: &Chromosome, rng: &mut impl Rng) -> Chromosome;
}

impl ChromosomeOps for Chromosome {
    fn mutated(&self, rng: &mut impl Rng) -> Chromosome {
        let genes = self
            .genes
            .iter()
            .map(|(id, gene)| (id.clone(), gene.mutate(rng)))
            .collect();
        Chromosome { genes }
    }

    fn combine(a: &Chromosome, b: &Chromosome, rng: &mut impl Rng) -> Chromosome {
        let mut ids: Vec<&String> = a.genes.keys().chain(b.genes.keys()).collect();
        ids.sort();
        ids.dedup();

        let mut genes = HashMap::with_capacity(ids.len());
        for id in ids {
            let chosen = match (a.genes.get(id), b.genes.get(id)) {
                (Some(ga), Some(gb)) => {
                    if rng.gen_bool(0.5) {
                        ga
                    } else {
                        gb
                    }
                }
                (Some(ga), None) => ga,
                (None, Some(gb)) => gb,
                (None, None) => unreachable!("id drawn from the union of both key sets"),
            };
            genes.insert(id.clone(), chosen.mutate(rng));
        }
        Chromosome { genes }
    }
}

/// Mean gene mutation rate across the whole genome; the baseline a freshly
/// random genome draws its per-gene rates around (the midpoint of
/// `0.001..0.05` in `random_genome`).
fn average_mutation_rate(genome: &Genome) -> f32 {
    let mut total = 0.0f32;
    let mut count = 0u32;
    for chromosome in &genome.chromosomes {
        for gene in chromosome.genes.values() {
            total += gene.mutation_rate;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        total / count as f32
    }
}

/// One translocation/inversion/fusion anomaly, a duplication, or a deletion
/// applied to a freshly recombined genome. Base rates are scaled by the
/// genome's average gene mutation rate, so a lineage bred down to a
/// mutation rate of zero is free of structural anomalies too.
fn apply_chromosomal_anomalies(genome: &mut Genome, rng: &mut impl Rng) {
    let scale = (average_mutation_rate(genome) / 0.025).clamp(0.0, 2.0) as f64;
    if genome.chromosomes.len() >= 2 && rng.gen_bool(0.02 * scale) {
        apply_anomaly(genome, rng);
    }
    if rng.gen_bool(0.005 * scale) && !genome.chromosomes.is_empty() {
        let idx = rng.gen_range(0..genome.chromosomes.len());
        let mut dup = genome.chromosomes[idx].clone();
        dup = dup.mutated(rng);
        genome.chromosomes.push(dup);
    }
    if genome.chromosomes.len() >= 2 && rng.gen_bool(0.005 * scale) {
        let idx = rng.gen_range(0..genome.chromosomes.len());
        genome.chromosomes.remove(idx);
    }
}

fn apply_anomaly(genome: &mut Genome, rng: &mut impl Rng) {
    let n = genome.chromosomes.len();
    let i = rng.gen_range(0..n);
    let mut j = rng.gen_range(0..n);
    while j == i {
        j = rng.gen_range(0..n);
    }

    match rng.gen_range(0..3) {
        0 => {
            // Translocation: swap 1-3 random gene ids between the two chromosomes.
            let count = rng.gen_range(1..=3);
            let ids_i: Vec<String> = genome.chromosomes[i].genes.keys().cloned().collect();
            let ids_j: Vec<String> = genome.chromosomes[j].genes.keys().cloned().collect();
            for _ in 0..count {
                if ids_i.is_empty() || ids_j.is_empty() {
                    break;
                }
                let id_i = ids_i.choose(rng).expect("nonempty").clone();
                let id_j = ids_j.choose(rng).expect("nonempty").clone();
                if let (Some(gi), Some(gj)) = (
                    genome.chromosomes[i].genes.remove(&id_i),
                    genome.chromosomes[j].genes.remove(&id_j),
                ) {
                    genome.chromosomes[j].genes.insert(id_i, gi);
                    genome.chromosomes[i].genes.insert(id_j, gj);
                }
            }
        }
        1 => {
            // Inversion: reverse the gene order of a 2-5 gene segment. Gene
            // order isn't otherwise meaningful for a HashMap-backed
            // chromosome, so we model it as re-keying a segment of ids onto
            // each other's values, which is observably the same operation.
            let ids: Vec<String> = genome.chromosomes[i].genes.keys().cloned().collect();
            if ids.len() >= 2 {
                let seg_len = rng.gen_range(2..=5.min(ids.len()));
                let start = rng.gen_range(0..=ids.len() - seg_len);
                let segment = &ids[start..start + seg_len];
                let values: Vec<Gene> = segment
                    .iter()
                    .map(|id| genome.chromosomes[i].genes[id].clone())
                    .collect();
                for (id, value) in segment.iter().zip(values.into_iter().rev()) {
                    genome.chromosomes[i].genes.insert(id.clone(), value);
                }
            }
        }
        _ => {
            // Fusion: merge j into i (union of genes), drop j.
            let (lo, hi) = if i < j { (i, j) } else { (j, i) };
            let absorbed = genome.chromosomes.remove(hi);
            for (id, gene) in absorbed.genes {
                genome.chromosomes[lo].genes.entry(id).or_insert(gene);
            }
        }
    }
}

/// Extension operators for a [`Genome`].
pub trait GenomeOps {
    /// Combines two parent genomes: `Chromosome::combine` per shared
    /// index, the longer parent's extra chromosomes appended (mutated, and
    /// with probability 0.2 each at a temporarily doubled mutation rate),
    /// then chromosomal anomalies applied stochastically.
    fn reproduce(a: &Genome, b: &Genome, rng: &mut impl Rng) -> Genome;

    /// Builds a genome of fixed base size: a dedicated first chromosome of
    /// named fundamental genes, followed by anonymous chromosomes, for a
    /// default total of 23 chromosomes and ~100 genes.
    fn random_genome(rng: &mut impl Rng) -> Genome;
}

impl GenomeOps for Genome {
    fn reproduce(a: &Genome, b: &Genome, rng: &mut impl Rng) -> Genome {
        let (shorter, longer) = if a.chromosomes.len() <= b.chromosomes.len() {
            (a, b)
        } else {
            (b, a)
        };

        let mut chromosomes = Vec::with_capacity(longer.chromosomes.len());
        for i in 0..shorter.chromosomes.len() {
            chromosomes.push(Chromosome::combine(
                &a.chromosomes.get(i).cloned().unwrap_or_default(),
                &b.chromosomes.get(i).cloned().unwrap_or_default(),
                rng,
            ));
        }
        for extra in &longer.chromosomes[shorter.chromosomes.len()..] {
            let mut extra = extra.clone();
            if rng.gen_bool(0.2) {
                // Temporarily doubled mutation rate for this extra chromosome.
                let doubled: HashMap<String, Gene> = extra
                    .genes
                    .iter()
                    .map(|(id, gene)| {
                        let mut g = gene.clone();
                        g.mutation_rate = (g.mutation_rate * 2.0).min(1.0);
                        (id.clone(), g)
                    })
                    .collect();
                extra = Chromosome { genes: doubled };
            }
            chromosomes.push(extra.mutated(rng));
        }

        let mut genome = Genome { chromosomes };
        apply_chromosomal_anomalies(&mut genome, rng);
        genome
    }

    fn random_genome(rng: &mut impl Rng) -> Genome {
        let mut fundamental = Chromosome::new();
        for id in FUNDAMENTAL_GENE_IDS {
            let value = rng.gen_range(0.2..0.8);
            let mutation_rate = rng.gen_range(0.001..0.05);
            fundamental.insert(Gene::new(*id, value, mutation_rate));
        }

        let mut chromosomes = vec![fundamental];
        const TOTAL_CHROMOSOMES: usize = 23;
        const GENES_PER_EXTRA: usize = (100 - FUNDAMENTAL_GENE_IDS.len()) / (TOTAL_CHROMOSOMES - 1);

        for c in 0..TOTAL_CHROMOSOMES - 1 {
            let mut chromosome = Chromosome::new();
            for g in 0..GENES_PER_EXTRA {
                let id = format!("gene_{c}_{g}");
                let value = rng.gen_range(0.0..1.0);
                let mutation_rate = rng.gen_range(0.001..0.05);
                chromosome.insert(Gene::new(id, value, mutation_rate));
            }
            chromosomes.push(chromosome);
        }

        Genome { chromosomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn zero_mutation_rate_is_identity() {
        let gene = Gene::new("x", 0.5, 0.0);
        let mut r = rng();
        let mutated = gene.mutate(&mut r);
        assert_eq!(gene, mutated);
    }

    #[test]
    fn mutated_gene_stays_in_range() {
        let mut r = rng();
        for _ in 0..200 {
            let gene = Gene::new("x", 0.5, 1.0);
            let mutated = gene.mutate(&mut r);
            assert!((0.0..=1.0).contains(&mutated.value));
            assert!((0.0001..=0.2).contains(&mutated.mutation_rate));
            assert!((0.0..=1.0).contains(&mutated.dominance));
            assert!((0.0..=1.0).contains(&mutated.expression_level));
        }
    }

    #[test]
    fn combine_is_union_of_gene_ids() {
        let mut a = Chromosome::new();
        a.insert(Gene::new("shared", 0.2, 0.0));
        a.insert(Gene::new("only_a", 0.9, 0.0));
        let mut b = Chromosome::new();
        b.insert(Gene::new("shared", 0.8, 0.0));
        b.insert(Gene::new("only_b", 0.1, 0.0));

        let mut r = rng();
        let child = Chromosome::combine(&a, &b, &mut r);
        assert_eq!(child.genes.len(), 3);
        assert!(child.genes.contains_key("shared"));
        assert!(child.genes.contains_key("only_a"));
        assert!(child.genes.contains_key("only_b"));
    }

    #[test]
    fn reproduce_with_identical_parents_and_zero_mutation_is_value_equal() {
        let mut r = rng();
        let mut genome = Genome::random_genome(&mut r);
        for chromosome in &mut genome.chromosomes {
            for gene in chromosome.genes.values_mut() {
                gene.mutation_rate = 0.0;
            }
        }
        let mut child_rng = ChaCha8Rng::seed_from_u64(7);
        // Even with the anomaly/duplication/deletion draws active, a
        // mutation_rate=0 genome only changes if an anomaly actually fires;
        // run enough trials with a fixed seed disabled by forcing draws out
        // of range is impractical here, so we only assert gene-level
        // equality for the crossover step itself.
        let combined = Chromosome::combine(
            &genome.chromosomes[0],
            &genome.chromosomes[0],
            &mut child_rng,
        );
        assert_eq!(combined, genome.chromosomes[0]);
    }

    #[test]
    fn zero_mutation_rate_genome_reproduces_as_an_identity() {
        let mut r = rng();
        let mut genome = Genome::random_genome(&mut r);
        for chromosome in &mut genome.chromosomes {
            for gene in chromosome.genes.values_mut() {
                gene.mutation_rate = 0.0;
            }
        }
        let mut child_rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..50 {
            let child = Genome::reproduce(&genome, &genome, &mut child_rng);
            assert_eq!(child, genome);
        }
    }

    #[test]
    fn random_genome_has_fundamental_chromosome_first() {
        let mut r = rng();
        let genome = Genome::random_genome(&mut r);
        assert_eq!(genome.chromosomes.len(), 23);
        for id in FUNDAMENTAL_GENE_IDS {
            assert!(genome.chromosomes[0].genes.contains_key(*id));
        }
        assert!(genome.gene_count() >= 90);
    }
}
