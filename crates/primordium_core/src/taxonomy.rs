//! Stateless taxonomic classification.
//!
//! `decide_rank` never touches `World` or `SpeciesRegistry` state; it only
//! looks at a mutation count, a significance score, and an optional parent
//! taxonomy to decide how much of a new lineage's classification is
//! inherited versus freshly drawn.

use primordium_data::OrganismType;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

/// The divergence level a lineage crossed since its parent, from broadest
/// to narrowest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DivergenceRank {
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

/// Decides the divergence level crossed by `mutation_count` accumulated
/// mutations of total `significance`.
#[must_use]
pub fn decide_rank(mutation_count: u32, significance: f32) -> DivergenceRank {
    if mutation_count > 10 && significance > 0.8 {
        DivergenceRank::Phylum
    } else if mutation_count > 8 && significance > 0.7 {
        DivergenceRank::Class
    } else if mutation_count > 6 && significance > 0.6 {
        DivergenceRank::Order
    } else if mutation_count > 4 && significance > 0.5 {
        DivergenceRank::Family
    } else if mutation_count > 2 && significance > 0.3 {
        DivergenceRank::Genus
    } else {
        DivergenceRank::Species
    }
}

/// The full classification of one taxonomy id, from domain down to a
/// binomial scientific name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Taxonomy {
    pub taxonomy_id: Uuid,
    pub domain: String,
    pub kingdom: String,
    pub phylum: String,
    pub class: String,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species_epithet: String,
}

impl Taxonomy {
    #[must_use]
    pub fn scientific_name(&self) -> String {
        format!("{} {}", self.genus, self.species_epithet)
    }
}

fn domain_kingdom_for(organism_type: OrganismType) -> (&'static str, &'static str) {
    match organism_type {
        OrganismType::Unicellular => ("Protozoa", "Protista"),
        OrganismType::Plant => ("Eukaryota", "Plantae"),
        OrganismType::Herbivore | OrganismType::Carnivore | OrganismType::Omnivore => {
            ("Eukaryota", "Animalia")
        }
    }
}

fn prefixes(organism_type: OrganismType) -> &'static [&'static str] {
    match organism_type {
        OrganismType::Unicellular => &["Proto", "Micro", "Cyano", "Archae", "Plasmo"],
        OrganismType::Plant => &["Phyto", "Chloro", "Flora", "Xylo", "Rhizo"],
        OrganismType::Herbivore => &["Herba", "Grami", "Brows", "Ungul", "Pratens"],
        OrganismType::Carnivore => &["Carno", "Raptor", "Ferox", "Preda", "Venato"],
        OrganismType::Omnivore => &["Panto", "Omni", "Versa", "Ambi", "Polyphag"],
    }
}

const RANK_SUFFIXES: [&str; 5] = ["formes", "idae", "aceae", "ensis", "inae"];
const EPITHET_SUFFIXES: [&str; 6] = ["us", "a", "is", "um", "oides", "ii"];

fn draw_word(rng: &mut impl Rng, prefix_pool: &[&str], suffix_pool: &[&str]) -> String {
    let prefix = prefix_pool.choose(rng).expect("nonempty prefix pool");
    let suffix = suffix_pool.choose(rng).expect("nonempty suffix pool");
    format!("{prefix}{suffix}")
}

/// Builds a fresh taxonomy. Ranks above `rank` are copied from `parent` (if
/// given); `rank` and every rank below it are freshly drawn from
/// type-specific prefix/suffix pools.
#[must_use]
pub fn build_taxonomy(
    organism_type: OrganismType,
    parent: Option<&Taxonomy>,
    rank: DivergenceRank,
    rng: &mut impl Rng,
) -> Taxonomy {
    let (domain, kingdom) = domain_kingdom_for(organism_type);
    let prefix_pool = prefixes(organism_type);

    let mut taxonomy = Taxonomy {
        taxonomy_id: Uuid::new_v4(),
        domain: domain.to_string(),
        kingdom: kingdom.to_string(),
        phylum: draw_word(rng, prefix_pool, &RANK_SUFFIXES),
        class: draw_word(rng, prefix_pool, &RANK_SUFFIXES),
        order: draw_word(rng, prefix_pool, &RANK_SUFFIXES),
        family: draw_word(rng, prefix_pool, &RANK_SUFFIXES),
        genus: draw_word(rng, prefix_pool, &["us", "a", "is"]),
        species_epithet: draw_word(rng, prefix_pool, &EPITHET_SUFFIXES),
    };

    if let Some(parent) = parent {
        taxonomy.domain = parent.domain.clone();
        taxonomy.kingdom = parent.kingdom.clone();
        if rank > DivergenceRank::Phylum {
            taxonomy.phylum = parent.phylum.clone();
        }
        if rank > DivergenceRank::Class {
            taxonomy.class = parent.class.clone();
        }
        if rank > DivergenceRank::Order {
            taxonomy.order = parent.order.clone();
        }
        if rank > DivergenceRank::Family {
            taxonomy.family = parent.family.clone();
        }
        if rank > DivergenceRank::Genus {
            taxonomy.genus = parent.genus.clone();
        }
    }

    taxonomy
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn thresholds_match_specification_table() {
        assert_eq!(decide_rank(11, 0.9), DivergenceRank::Phylum);
        assert_eq!(decide_rank(9, 0.75), DivergenceRank::Class);
        assert_eq!(decide_rank(7, 0.65), DivergenceRank::Order);
        assert_eq!(decide_rank(5, 0.55), DivergenceRank::Family);
        assert_eq!(decide_rank(3, 0.35), DivergenceRank::Genus);
        assert_eq!(decide_rank(1, 0.1), DivergenceRank::Species);
        // Count alone without matching significance falls through to the
        // next lower rank.
        assert_eq!(decide_rank(11, 0.5), DivergenceRank::Genus);
    }

    #[test]
    fn species_level_divergence_inherits_genus_and_above() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let parent = build_taxonomy(OrganismType::Herbivore, None, DivergenceRank::Phylum, &mut rng);
        let child = build_taxonomy(
            OrganismType::Herbivore,
            Some(&parent),
            DivergenceRank::Species,
            &mut rng,
        );
        assert_eq!(child.genus, parent.genus);
        assert_eq!(child.family, parent.family);
        assert_ne!(child.species_epithet, parent.species_epithet.clone());
    }

    #[test]
    fn phylum_level_divergence_keeps_only_domain_and_kingdom() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let parent = build_taxonomy(OrganismType::Carnivore, None, DivergenceRank::Phylum, &mut rng);
        let child = build_taxonomy(
            OrganismType::Carnivore,
            Some(&parent),
            DivergenceRank::Phylum,
            &mut rng,
        );
        assert_eq!(child.domain, parent.domain);
        assert_eq!(child.kingdom, parent.kingdom);
    }
}
