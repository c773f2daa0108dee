//! The process-wide species ledger.
//!
//! Grounded on the teacher's lineage registry: a flat map keyed by id, an
//! idempotent "first sighting" registration path, and persistence pushed
//! behind a small trait so tests can swap in an in-memory store while the
//! shipped implementation (in `primordium_io`) does an atomic
//! write-then-rename.

use chrono::{DateTime, Utc};
use primordium_data::{OrganismType, SpeciesRecord, SpeciesTraits};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use uuid::Uuid;

struct DescriptiveTables {
    physical_traits: &'static [&'static str],
    colors: &'static [&'static str],
    habitats: &'static [&'static str],
    behaviors: &'static [&'static str],
    special_adaptations: &'static [&'static str],
}

fn tables_for(organism_type: OrganismType) -> DescriptiveTables {
    match organism_type {
        OrganismType::Unicellular => DescriptiveTables {
            physical_traits: &["translucent membrane", "flagellated", "spiked wall", "colonial", "motile"],
            colors: &["pale green", "milky white", "amber", "violet sheen", "clear"],
            habitats: &["tide pools", "deep sediment", "thermal vents", "standing water", "soil film"],
            behaviors: &["binary division", "chemotaxis", "biofilm formation", "dormancy"],
            special_adaptations: &["extremophile tolerance", "rapid division", "spore formation"],
        },
        OrganismType::Plant => DescriptiveTables {
            physical_traits: &["broad leaves", "waxy cuticle", "deep taproot", "thorned stem", "climbing vine"],
            colors: &["deep green", "autumn red", "silver-grey", "pale yellow", "mottled green"],
            habitats: &["forest canopy", "open plains", "riverbanks", "rocky outcrops", "wetlands"],
            behaviors: &["heliotropism", "seasonal dormancy", "rapid reseeding"],
            special_adaptations: &["drought tolerance", "nitrogen fixation", "chemical defense sap"],
        },
        OrganismType::Herbivore => DescriptiveTables {
            physical_traits: &["long legs", "broad molars", "camouflage coat", "large ears", "herd markings"],
            colors: &["dun brown", "dappled grey", "tawny", "cream and black"],
            habitats: &["open grassland", "forest edge", "savanna", "alpine meadow"],
            behaviors: &["herd grazing", "vigilant sentry rotation", "seasonal migration"],
            special_adaptations: &["rapid digestion", "keen peripheral vision", "heat-tolerant coat"],
        },
        OrganismType::Carnivore => DescriptiveTables {
            physical_traits: &["retractable claws", "binocular eyes", "powerful jaw", "lean musculature"],
            colors: &["charcoal", "rust red", "striped grey", "mottled brown"],
            habitats: &["dense woodland", "rocky ridgelines", "riverine cover", "open tundra"],
            behaviors: &["ambush stalking", "pack coordination", "territorial marking"],
            special_adaptations: &["night vision", "burst acceleration", "bite-force specialization"],
        },
        OrganismType::Omnivore => DescriptiveTables {
            physical_traits: &["dexterous forelimbs", "varied dentition", "stocky build", "opportunist posture"],
            colors: &["mottled brown", "piebald", "dark umber", "ash grey"],
            habitats: &["mixed woodland", "floodplain", "scrubland", "coastal fringe"],
            behaviors: &["opportunistic foraging", "cache hoarding", "scavenging"],
            special_adaptations: &["broad-spectrum digestion", "tool-assisted foraging", "cold hardiness"],
        },
    }
}

fn sample_traits(organism_type: OrganismType, rng: &mut impl Rng) -> SpeciesTraits {
    let tables = tables_for(organism_type);
    let trait_count = rng.gen_range(1..=3);
    let mut physical_traits: Vec<String> = tables
        .physical_traits
        .choose_multiple(rng, trait_count)
        .map(|s| s.to_string())
        .collect();
    physical_traits.sort();
    physical_traits.dedup();

    let behavior_count = rng.gen_range(1..=2);
    let mut behavior: Vec<String> = tables
        .behaviors
        .choose_multiple(rng, behavior_count)
        .map(|s| s.to_string())
        .collect();
    behavior.sort();
    behavior.dedup();

    SpeciesTraits {
        physical_traits,
        color: (*tables.colors.choose(rng).expect("nonempty")).to_string(),
        habitat: (*tables.habitats.choose(rng).expect("nonempty")).to_string(),
        behavior,
        special_adaptation: (*tables.special_adaptations.choose(rng).expect("nonempty")).to_string(),
    }
}

/// Pluggable persistence for a [`SpeciesRegistry`], per the "module-level
/// singletons" design note: the engine only depends on this trait, letting
/// tests swap in an in-memory store instead of touching the filesystem.
pub trait RegistryStore {
    fn save(&self, registry: &SpeciesRegistry) -> anyhow::Result<()>;
    fn load(&self) -> anyhow::Result<SpeciesRegistry>;
}

/// A persistence-agnostic store that simply discards writes and loads
/// empty; used in tests and as the default when no path is configured.
#[derive(Default, Debug, Clone, Copy)]
pub struct NullRegistryStore;

impl RegistryStore for NullRegistryStore {
    fn save(&self, _registry: &SpeciesRegistry) -> anyhow::Result<()> {
        Ok(())
    }

    fn load(&self) -> anyhow::Result<SpeciesRegistry> {
        Ok(SpeciesRegistry::default())
    }
}

/// How to filter [`SpeciesRegistry::list`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeciesFilter {
    All,
    Living,
    Extinct,
    OfType(OrganismType),
}

/// Process-wide store of species records, keyed by species id.
#[derive(Default, Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SpeciesRegistry {
    records: HashMap<Uuid, SpeciesRecord>,
}

impl SpeciesRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent first-sighting registration: if `species_id` already
    /// exists its population is bumped by `initial_population` instead of
    /// overwriting the record. Returns `true` if a new record was created.
    pub fn register(
        &mut self,
        species_id: Uuid,
        organism_type: OrganismType,
        parent_species_id: Option<Uuid>,
        scientific_name: String,
        common_name: String,
        initial_population: u64,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> bool {
        if let Some(existing) = self.records.get_mut(&species_id) {
            let new_count = existing.population_count + initial_population;
            existing.update_population(new_count, now);
            return false;
        }

        let record = SpeciesRecord {
            species_id,
            scientific_name,
            common_name,
            organism_type,
            parent_species_id,
            discovery_time: now,
            extinction_time: None,
            traits: sample_traits(organism_type, rng),
            population_count: initial_population,
            max_population: initial_population,
            extinct: false,
            generation: 0,
            max_generation: 0,
            mutation_count: 0,
            child_species: Vec::new(),
            notable_adaptations: Vec::new(),
        };
        self.records.insert(species_id, record);

        if let Some(parent_id) = parent_species_id {
            if let Some(parent) = self.records.get_mut(&parent_id) {
                parent.add_child_species(species_id);
            }
        }
        true
    }

    /// Updates population and generation for an existing record; a no-op
    /// if `species_id` has never been registered.
    pub fn update(
        &mut self,
        species_id: Uuid,
        population: u64,
        generation: u32,
        now: DateTime<Utc>,
    ) {
        if let Some(record) = self.records.get_mut(&species_id) {
            record.update_population(population, now);
            record.update_generation(generation);
        }
    }

    #[must_use]
    pub fn get(&self, species_id: Uuid) -> Option<&SpeciesRecord> {
        self.records.get(&species_id)
    }

    pub fn get_mut(&mut self, species_id: Uuid) -> Option<&mut SpeciesRecord> {
        self.records.get_mut(&species_id)
    }

    /// Lists records matching `filter`, ordered by discovery time.
    #[must_use]
    pub fn list(&self, filter: SpeciesFilter) -> Vec<&SpeciesRecord> {
        let mut records: Vec<&SpeciesRecord> = self
            .records
            .values()
            .filter(|r| match filter {
                SpeciesFilter::All => true,
                SpeciesFilter::Living => !r.extinct,
                SpeciesFilter::Extinct => r.extinct,
                SpeciesFilter::OfType(ty) => r.organism_type == ty,
            })
            .collect();
        records.sort_by_key(|r| r.discovery_time);
        records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Walks `child_species` links starting from every record with no
    /// parent, returning each root id paired with its full descendant set
    /// in breadth-first discovery order.
    #[must_use]
    pub fn evolutionary_tree(&self) -> Vec<(Uuid, Vec<Uuid>)> {
        let mut tree = Vec::new();
        let mut roots: Vec<Uuid> = self
            .records
            .values()
            .filter(|r| r.parent_species_id.is_none())
            .map(|r| r.species_id)
            .collect();
        roots.sort();

        for root in roots {
            let mut descendants = Vec::new();
            let mut queue = vec![root];
            while let Some(id) = queue.pop() {
                if let Some(record) = self.records.get(&id) {
                    for child in &record.child_species {
                        descendants.push(*child);
                        queue.push(*child);
                    }
                }
            }
            tree.push((root, descendants));
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn register_is_idempotent_on_repeat_ids() {
        let mut registry = SpeciesRegistry::new();
        let id = Uuid::new_v4();
        let mut r = rng();
        let now = Utc::now();
        assert!(registry.register(id, OrganismType::Plant, None, "Flora us".into(), "flora".into(), 1, now, &mut r));
        assert!(!registry.register(id, OrganismType::Plant, None, "Flora us".into(), "flora".into(), 1, now, &mut r));
        assert_eq!(registry.get(id).unwrap().population_count, 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn population_reaching_zero_marks_extinct() {
        let mut registry = SpeciesRegistry::new();
        let id = Uuid::new_v4();
        let mut r = rng();
        let now = Utc::now();
        registry.register(id, OrganismType::Herbivore, None, "Herba us".into(), "herbivore".into(), 5, now, &mut r);
        registry.update(id, 0, 1, now);
        assert!(registry.get(id).unwrap().extinct);
    }

    #[test]
    fn evolutionary_tree_walks_child_links() {
        let mut registry = SpeciesRegistry::new();
        let mut r = rng();
        let now = Utc::now();
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();
        let grandchild = Uuid::new_v4();
        registry.register(root, OrganismType::Carnivore, None, "Carno us".into(), "root".into(), 1, now, &mut r);
        registry.register(child, OrganismType::Carnivore, Some(root), "Carno a".into(), "child".into(), 1, now, &mut r);
        registry.register(grandchild, OrganismType::Carnivore, Some(child), "Carno is".into(), "grandchild".into(), 1, now, &mut r);

        let tree = registry.evolutionary_tree();
        assert_eq!(tree.len(), 1);
        let (tree_root, descendants) = &tree[0];
        assert_eq!(*tree_root, root);
        assert!(descendants.contains(&child));
        assert!(descendants.contains(&grandchild));
    }
}
