//! Per-tick organism physiology, decision-making, and death/decomposition.
//!
//! Grounded on the teacher's `lifecycle.rs` entity-status machinery, but
//! rebuilt around the specification's physiology formulas instead of the
//! teacher's hardware-resource model.

use primordium_data::{DevelopmentalStage, Organism, OrganismType, Position, Resource, WorldCell};
use rand::Rng;
use uuid::Uuid;

/// A candidate resource cell or organism the decision step scans from the
/// spatial grid and active-cell set; assembled by the caller (`World`)
/// before `decide` is invoked, keeping this module free of any grid or
/// collection type.
#[derive(Clone, Copy, Debug)]
pub struct NearbyCell {
    pub position: Position,
    pub resource_value: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct NearbyOrganism {
    pub id: Uuid,
    pub position: Position,
    pub organism_type: OrganismType,
    pub size: f32,
    pub health: f32,
}

/// Everything the decision step needs about the organism's surroundings,
/// scoped to one tick.
#[derive(Clone, Debug, Default)]
pub struct DecisionContext {
    pub nearby_water_cells: Vec<NearbyCell>,
    pub nearby_food_cells: Vec<NearbyCell>,
    pub nearby_predators: Vec<NearbyOrganism>,
    pub nearby_prey: Vec<NearbyOrganism>,
    pub world_width: f64,
    pub world_height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    FindWater,
    SeekFood,
    Reproduce,
    FleePredator,
    Explore,
}

/// Highest-priority need-driven action, per the fixed priority table.
#[must_use]
pub fn decide_action(organism: &Organism, context: &DecisionContext) -> Action {
    let mut candidates: Vec<(u8, Action)> = Vec::with_capacity(5);
    if organism.hydration < 30.0 {
        candidates.push((10, Action::FindWater));
    }
    if organism.energy < 0.4 * organism.phenotype.energy_capacity {
        candidates.push((8, Action::SeekFood));
    }
    if organism.ready_to_mate() {
        candidates.push((6, Action::Reproduce));
    }
    if !organism.organism_type.is_predator() && !context.nearby_predators.is_empty() {
        candidates.push((9, Action::FleePredator));
    }
    candidates.push((1, Action::Explore));
    candidates
        .into_iter()
        .max_by_key(|(priority, _)| *priority)
        .map(|(_, action)| action)
        .unwrap_or(Action::Explore)
}

fn steer_toward(position: Position, target: Position, speed: f64) -> (f64, f64) {
    let dx = target.x - position.x;
    let dy = target.y - position.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance < f64::EPSILON {
        (0.0, 0.0)
    } else {
        (dx / distance * speed, dy / distance * speed)
    }
}

fn steer_away(position: Position, threat: Position, speed: f64) -> (f64, f64) {
    let (vx, vy) = steer_toward(threat, position, speed);
    (vx, vy)
}

/// Sets velocity according to `action`; does not itself move the organism
/// (that happens in [`OrganismOps::tick_physiology`]).
pub fn apply_action(organism: &mut Organism, action: Action, context: &DecisionContext, rng: &mut impl Rng) {
    let speed = organism.phenotype.max_speed as f64;
    organism.velocity = match action {
        Action::FindWater => {
            if let Some(best) = context
                .nearby_water_cells
                .iter()
                .max_by(|a, b| a.resource_value.total_cmp(&b.resource_value))
            {
                let (vx, vy) = steer_toward(organism.position, best.position, speed);
                primordium_data::Velocity { vx, vy }
            } else {
                organism.velocity
            }
        }
        Action::SeekFood => {
            if let Some(best) = context
                .nearby_food_cells
                .iter()
                .max_by(|a, b| a.resource_value.total_cmp(&b.resource_value))
            {
                let (vx, vy) = steer_toward(organism.position, best.position, speed);
                primordium_data::Velocity { vx, vy }
            } else if organism.organism_type.is_predator() {
                if let Some(weakest) = context
                    .nearby_prey
                    .iter()
                    .min_by(|a, b| a.health.total_cmp(&b.health))
                {
                    let (vx, vy) = steer_toward(organism.position, weakest.position, speed);
                    primordium_data::Velocity { vx, vy }
                } else {
                    organism.velocity
                }
            } else {
                organism.velocity
            }
        }
        Action::FleePredator => {
            if let Some(nearest) = context.nearby_predators.first() {
                let (vx, vy) = steer_away(organism.position, nearest.position, speed);
                primordium_data::Velocity { vx, vy }
            } else {
                organism.velocity
            }
        }
        Action::Reproduce => primordium_data::Velocity { vx: 0.0, vy: 0.0 },
        Action::Explore => {
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            primordium_data::Velocity {
                vx: angle.cos() * speed * 0.5,
                vy: angle.sin() * speed * 0.5,
            }
        }
    };
}

/// Extension operators driving one organism through a tick.
pub trait OrganismOps {
    /// Steps 1-7 of the per-tick physiology sequence: aging, metabolism,
    /// health, cooldowns, death check, and movement. Does not run the
    /// decision step or cell interaction.
    fn tick_physiology(&mut self, dt: f32);

    /// Step 8: photosynthesis / grazing / drinking against the current
    /// cell.
    fn interact_with_cell(&mut self, cell: &mut WorldCell, dt: f32);

    /// Probabilistic decomposition for a dead organism; returns `true` once
    /// the organism has fully decomposed and should be removed from the
    /// world.
    fn decompose_tick(&mut self, cell: &mut WorldCell, dt: f32, rng: &mut impl Rng) -> bool;
}

impl OrganismOps for Organism {
    fn tick_physiology(&mut self, dt: f32) {
        if !self.is_alive {
            return;
        }

        self.age += dt;
        if self.maturity < 1.0 {
            self.maturity = (self.maturity + dt / self.phenotype.maturation_time.max(1.0)).min(1.0);
        }

        let spent_energy = self.phenotype.metabolism_rate * dt;
        self.energy = (self.energy - spent_energy).max(0.0);
        self.waste += spent_energy * (1.0 - self.phenotype.waste_tolerance);
        self.hydration = (self.hydration - 2.0 * dt).max(0.0);

        let mut health_delta = 0.0f32;
        if self.waste > 50.0 {
            health_delta -= (self.waste - 50.0) * 0.05 * dt;
        }
        if self.hydration < 20.0 {
            health_delta -= (20.0 - self.hydration) * 0.1 * dt;
        }
        if self.energy < 0.1 * self.phenotype.energy_capacity {
            health_delta -= (0.1 * self.phenotype.energy_capacity - self.energy) * 0.1 * dt;
        }
        if self.energy > 0.5 * self.phenotype.energy_capacity
            && self.hydration > 50.0
            && self.waste < 30.0
        {
            health_delta += self.phenotype.immune_strength * dt;
        }
        self.health = (self.health + health_delta).clamp(0.0, 100.0);

        self.reproduction_cooldown = (self.reproduction_cooldown - dt).max(0.0);

        self.developmental_stage = DevelopmentalStage::from_maturity_and_age(
            self.maturity,
            self.age,
            self.phenotype.lifespan,
        );

        if self.health <= 0.0 || self.age > self.phenotype.lifespan {
            self.is_alive = false;
            self.velocity = primordium_data::Velocity::default();
            return;
        }

        self.position.x += self.velocity.vx * dt as f64;
        self.position.y += self.velocity.vy * dt as f64;
    }

    fn interact_with_cell(&mut self, cell: &mut WorldCell, dt: f32) {
        if !self.is_alive {
            return;
        }

        if self.organism_type.is_photosynthetic() {
            let sunlight = cell.resource(Resource::Sunlight).min(5.0 * dt);
            let water = cell.resource(Resource::Water).min(2.0 * dt);
            let uptake = sunlight.min(water);
            if uptake > 0.0 {
                cell.add_resource(Resource::Sunlight, -uptake);
                cell.add_resource(Resource::Water, -uptake);
                cell.add_resource(Resource::Oxygen, uptake * 0.5);
                cell.add_resource(Resource::Co2, -(uptake * 0.3).min(cell.resource(Resource::Co2)));
                self.energy = (self.energy + uptake * 10.0).min(self.phenotype.energy_capacity);
            }
        } else if matches!(self.organism_type, OrganismType::Herbivore) {
            let available = cell.resource(Resource::OrganicMatter);
            let consumed = available.min(3.0 * dt);
            if consumed > 0.0 {
                cell.add_resource(Resource::OrganicMatter, -consumed);
                self.energy = (self.energy + consumed * 8.0).min(self.phenotype.energy_capacity);
            }
        }

        let drink = cell.resource(Resource::Water).min(3.0 * dt);
        if drink > 0.0 {
            cell.add_resource(Resource::Water, -drink * 0.1);
            self.hydration = (self.hydration + drink * 5.0).min(100.0);
        }
    }

    fn decompose_tick(&mut self, cell: &mut WorldCell, dt: f32, rng: &mut impl Rng) -> bool {
        debug_assert!(!self.is_alive, "decompose_tick called on a living organism");
        let probability = (0.1 * dt).clamp(0.0, 1.0);
        if rng.gen_bool(probability as f64) {
            let biomass = self.phenotype.size * 20.0;
            crate::cell_dynamics::deposit_decomposition(cell, biomass);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primordium_data::{Genome, Phenotype, Position, Velocity};

    fn organism() -> Organism {
        Organism {
            id: Uuid::new_v4(),
            species_id: Uuid::new_v4(),
            taxonomy_id: Uuid::new_v4(),
            position: Position { x: 0.0, y: 0.0 },
            velocity: Velocity { vx: 1.0, vy: 0.0 },
            organism_type: OrganismType::Herbivore,
            genome: Genome::default(),
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
            adaptation_score: 0.5,
            advanced: None,
        }
    }

    #[test]
    fn physiology_moves_by_velocity() {
        let mut o = organism();
        o.tick_physiology(1.0);
        assert!(o.position.x > 0.0);
    }

    #[test]
    fn health_reaching_zero_kills_the_organism() {
        let mut o = organism();
        o.health = 0.01;
        o.waste = 200.0;
        o.tick_physiology(5.0);
        assert!(!o.is_alive);
    }

    #[test]
    fn aging_past_lifespan_kills_the_organism() {
        let mut o = organism();
        o.age = o.phenotype.lifespan + 1.0;
        o.tick_physiology(1.0);
        assert!(!o.is_alive);
    }

    #[test]
    fn decide_action_prioritizes_thirst_over_exploration() {
        let mut o = organism();
        o.hydration = 5.0;
        let context = DecisionContext::default();
        assert_eq!(decide_action(&o, &context), Action::FindWater);
    }
}
