use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted event of evolutionary significance, recorded on the World's
/// bounded milestone ring buffer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Milestone {
    Speciation {
        tick: u64,
        parent_species_id: Uuid,
        new_species_id: Uuid,
        organism_id: Uuid,
    },
    Extinction {
        tick: u64,
        species_id: Uuid,
    },
    Disaster {
        tick: u64,
        kind: String,
        center_x: u32,
        center_y: u32,
        radius: f32,
    },
    SeasonChange {
        tick: u64,
        year: u32,
        from_season: u8,
        to_season: u8,
    },
    Adaptation {
        tick: u64,
        species_id: Uuid,
        trait_shifts: u32,
    },
}

impl Milestone {
    #[must_use]
    pub fn tick(&self) -> u64 {
        match self {
            Milestone::Speciation { tick, .. }
            | Milestone::Extinction { tick, .. }
            | Milestone::Disaster { tick, .. }
            | Milestone::SeasonChange { tick, .. }
            | Milestone::Adaptation { tick, .. } => *tick,
        }
    }
}
