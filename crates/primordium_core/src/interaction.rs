//! Predation: attack resolution and the predator/prey ratio cache.
//!
//! Grounded on the teacher's `InteractionCommand` pattern: interactions are
//! computed as plain data rather than mutating both organisms in place, so
//! `World` can apply them after the scan that discovered them without
//! holding two mutable borrows at once.

use primordium_data::Organism;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum AttackOutcome {
    Missed,
    Wounded { damage: f32 },
    Killed { damage: f32, energy_gained: f32 },
}

/// Damage = attack_power * (0.5 + 0.5*strength) * (1 - target.defense/15),
/// applied to the target's health. A kill grants the attacker
/// `prey.size * 50 * metabolism_rate` energy, capped at capacity.
#[must_use]
pub fn resolve_attack(attacker: &Organism, target: &Organism) -> AttackOutcome {
    let defense_mitigation = (1.0 - target.phenotype.defense_power / 15.0).clamp(0.0, 1.0);
    let damage = attacker.phenotype.attack_power
        * (0.5 + 0.5 * attacker.phenotype.strength)
        * defense_mitigation;

    if damage <= 0.0 {
        return AttackOutcome::Missed;
    }

    if target.health - damage <= 0.0 {
        let energy_gained = target.phenotype.size * 50.0 * attacker.phenotype.metabolism_rate;
        AttackOutcome::Killed { damage, energy_gained }
    } else {
        AttackOutcome::Wounded { damage }
    }
}

pub fn apply_attack(attacker: &mut Organism, target: &mut Organism, outcome: AttackOutcome) {
    match outcome {
        AttackOutcome::Missed => {}
        AttackOutcome::Wounded { damage } => {
            target.health = (target.health - damage).max(0.0);
        }
        AttackOutcome::Killed { damage, energy_gained } => {
            target.health = (target.health - damage).max(0.0);
            target.is_alive = false;
            attacker.energy = (attacker.energy + energy_gained).min(attacker.phenotype.energy_capacity);
        }
    }
}

/// Predator/prey ratio cache, keyed by (predator type, prey type), used to
/// modulate attack attempts toward an ideal ~4:1 prey-to-predator balance.
/// Purged on the same periodic schedule as the biome adaptation cache.
#[derive(Debug, Default, Clone)]
pub struct PredatorPreyRatioCache {
    ratios: HashMap<(Uuid, Uuid), f32>,
}

impl PredatorPreyRatioCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, predator_species: Uuid, prey_species: Uuid, ratio: f32) {
        self.ratios.insert((predator_species, prey_species), ratio);
    }

    /// Probability that a predation attempt proceeds: 1.0 at or below the
    /// ideal ratio of 4 prey per predator, decaying as prey becomes scarce
    /// relative to predators.
    #[must_use]
    pub fn attempt_probability(&self, predator_species: Uuid, prey_species: Uuid) -> f32 {
        const IDEAL_RATIO: f32 = 4.0;
        match self.ratios.get(&(predator_species, prey_species)) {
            Some(ratio) if *ratio < IDEAL_RATIO => (*ratio / IDEAL_RATIO).clamp(0.1, 1.0),
            _ => 1.0,
        }
    }

    pub fn purge(&mut self) {
        self.ratios.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primordium_data::{DevelopmentalStage, Genome, OrganismType, Phenotype, Position, Velocity};

    fn organism(attack_power: f32, strength: f32, defense_power: f32, health: f32) -> Organism {
        let mut phenotype = Phenotype::default();
        phenotype.attack_power = attack_power;
        phenotype.strength = strength;
        phenotype.defense_power = defense_power;
        Organism {
            id: Uuid::new_v4(),
            species_id: Uuid::new_v4(),
            taxonomy_id: Uuid::new_v4(),
            position: Position::default(),
            velocity: Velocity::default(),
            organism_type: OrganismType::Carnivore,
            genome: Genome::default(),
            phenotype,
            generation: 0,
            parent_ids: Vec::new(),
            age: 0.0,
            health,
            energy: 50.0,
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
    fn lethal_damage_kills_and_transfers_energy() {
        let attacker = organism(10.0, 1.0, 0.0, 100.0);
        let mut target = organism(0.0, 0.0, 0.0, 1.0);
        let outcome = resolve_attack(&attacker, &target);
        assert!(matches!(outcome, AttackOutcome::Killed { .. }));
        let mut attacker_mut = attacker;
        apply_attack(&mut attacker_mut, &mut target, outcome);
        assert!(!target.is_alive);
        assert!(attacker_mut.energy > 50.0);
    }

    #[test]
    fn high_defense_reduces_damage() {
        let attacker = organism(5.0, 1.0, 0.0, 100.0);
        let low_defense = organism(0.0, 0.0, 0.0, 100.0);
        let high_defense = organism(0.0, 0.0, 14.0, 100.0);
        let dmg_low = match resolve_attack(&attacker, &low_defense) {
            AttackOutcome::Wounded { damage } | AttackOutcome::Killed { damage, .. } => damage,
            AttackOutcome::Missed => 0.0,
        };
        let dmg_high = match resolve_attack(&attacker, &high_defense) {
            AttackOutcome::Wounded { damage } | AttackOutcome::Killed { damage, .. } => damage,
            AttackOutcome::Missed => 0.0,
        };
        assert!(dmg_high < dmg_low);
    }

    #[test]
    fn ratio_cache_throttles_attempts_when_prey_is_scarce() {
        let mut cache = PredatorPreyRatioCache::new();
        let predator = Uuid::new_v4();
        let prey = Uuid::new_v4();
        cache.set(predator, prey, 1.0);
        assert!(cache.attempt_probability(predator, prey) < 1.0);
    }
}
