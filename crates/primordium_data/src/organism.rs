use crate::genome::Genome;
use crate::phenotype::Phenotype;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganismType {
    Unicellular,
    Plant,
    Herbivore,
    Carnivore,
    Omnivore,
}

impl OrganismType {
    pub const ALL: [OrganismType; 5] = [
        OrganismType::Unicellular,
        OrganismType::Plant,
        OrganismType::Herbivore,
        OrganismType::Carnivore,
        OrganismType::Omnivore,
    ];

    #[must_use]
    pub fn is_predator(self) -> bool {
        matches!(self, OrganismType::Carnivore | OrganismType::Omnivore)
    }

    #[must_use]
    pub fn is_photosynthetic(self) -> bool {
        matches!(self, OrganismType::Plant | OrganismType::Unicellular)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevelopmentalStage {
    Zygote,
    Embryo,
    Juvenile,
    Adult,
    Senescent,
}

impl DevelopmentalStage {
    #[must_use]
    pub fn from_maturity_and_age(maturity: f32, age: f32, lifespan: f32) -> Self {
        if age > lifespan * 0.85 {
            DevelopmentalStage::Senescent
        } else if maturity >= 1.0 {
            DevelopmentalStage::Adult
        } else if maturity > 0.4 {
            DevelopmentalStage::Juvenile
        } else if maturity > 0.05 {
            DevelopmentalStage::Embryo
        } else {
            DevelopmentalStage::Zygote
        }
    }
}

/// Optional, never-implemented extension point for the experimental
/// scaffolding described in the source (multicellularity, neural brains,
/// coevolution, gene regulation). Uninhabited today; the base engine runs
/// correctly with every organism's `advanced` field at `None`.
#[derive(Clone, Debug, PartialEq)]
pub enum AdvancedHooks {}

/// A single agent living on the world grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organism {
    pub id: Uuid,
    pub species_id: Uuid,
    pub taxonomy_id: Uuid,
    pub position: Position,
    pub velocity: Velocity,
    pub organism_type: OrganismType,
    pub genome: Genome,
    pub phenotype: Phenotype,
    pub generation: u32,
    pub parent_ids: Vec<Uuid>,
    pub age: f32,
    pub health: f32,
    pub energy: f32,
    pub hydration: f32,
    pub waste: f32,
    pub maturity: f32,
    pub is_alive: bool,
    pub reproduction_cooldown: f32,
    pub offspring_count: u32,
    pub developmental_stage: DevelopmentalStage,
    pub adaptation_score: f32,
    #[serde(skip)]
    pub advanced: Option<AdvancedHooks>,
}

impl Organism {
    #[must_use]
    pub fn ready_to_mate(&self) -> bool {
        self.is_alive
            && self.maturity >= 1.0
            && self.reproduction_cooldown <= 0.0
            && self.energy > 0.7 * self.phenotype.energy_capacity
            && self.health > 70.0
            && self.offspring_count < self.phenotype.max_offspring
    }
}
