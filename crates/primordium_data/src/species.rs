use crate::organism::OrganismType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Descriptive, non-functional flavor text sampled once when a species is
/// first registered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeciesTraits {
    pub physical_traits: Vec<String>,
    pub color: String,
    pub habitat: String,
    pub behavior: Vec<String>,
    pub special_adaptation: String,
}

/// The full record the registry keeps for one species, keyed by
/// `species_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub species_id: Uuid,
    pub scientific_name: String,
    pub common_name: String,
    pub organism_type: OrganismType,
    pub parent_species_id: Option<Uuid>,
    pub discovery_time: DateTime<Utc>,
    pub extinction_time: Option<DateTime<Utc>>,
    pub traits: SpeciesTraits,
    pub population_count: u64,
    pub max_population: u64,
    pub extinct: bool,
    pub generation: u32,
    pub max_generation: u32,
    pub mutation_count: u32,
    pub child_species: Vec<Uuid>,
    pub notable_adaptations: Vec<String>,
}

impl SpeciesRecord {
    /// Updates the live population count, tracking the historical peak and
    /// marking the record extinct the instant the count reaches zero. A
    /// species is never un-marked once extinct.
    pub fn update_population(&mut self, count: u64, now: DateTime<Utc>) {
        self.population_count = count;
        if count > self.max_population {
            self.max_population = count;
        }
        if count == 0 && !self.extinct {
            self.extinct = true;
            self.extinction_time = Some(now);
        }
    }

    pub fn update_generation(&mut self, generation: u32) {
        self.generation = generation;
        if generation > self.max_generation {
            self.max_generation = generation;
        }
    }

    pub fn add_child_species(&mut self, child_id: Uuid) {
        if !self.child_species.contains(&child_id) {
            self.child_species.push(child_id);
        }
    }

    pub fn add_notable_adaptation(&mut self, adaptation: impl Into<String>) {
        let adaptation = adaptation.into();
        if !self.notable_adaptations.contains(&adaptation) {
            self.notable_adaptations.push(adaptation);
        }
    }

    /// Accumulates gene-level changes detected across this species'
    /// reproduction events, feeding the divergence-rank and milestone
    /// significance gates.
    pub fn add_mutations(&mut self, count: u32) {
        self.mutation_count = self.mutation_count.saturating_add(count);
    }
}
