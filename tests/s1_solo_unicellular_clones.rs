//! S1 — a single unicellular founder with every gene's mutation rate pinned
//! to zero should keep dividing into more of the same species, never
//! speciating and never going extinct.

use primordium_core::taxonomy::DivergenceRank;
use primordium_core::{genetics::GenomeOps, phenotype_derivation::PhenotypeOps, AppConfig, World};
use primordium_data::{
    DevelopmentalStage, Genome, Organism, OrganismType, Position, Velocity, RESOURCE_COUNT,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

fn founder(world: &mut World) -> (Uuid, Uuid) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut genome = Genome::random_genome(&mut rng);
    for chromosome in &mut genome.chromosomes {
        for gene in chromosome.genes.values_mut() {
            gene.mutation_rate = 0.0;
        }
    }
    let phenotype = genome.derive_phenotype();
    let species_id = Uuid::new_v4();

    let center = Position {
        x: f64::from(world.width / 2) * f64::from(world.config.world.cell_size),
        y: f64::from(world.height / 2) * f64::from(world.config.world.cell_size),
    };

    let organism = Organism {
        id: Uuid::new_v4(),
        species_id,
        taxonomy_id: Uuid::nil(),
        position: center,
        velocity: Velocity::default(),
        organism_type: OrganismType::Unicellular,
        genome,
        phenotype,
        generation: 0,
        parent_ids: Vec::new(),
        age: 0.0,
        health: 100.0,
        energy: phenotype.energy_capacity,
        hydration: 100.0,
        waste: 0.0,
        maturity: 1.0,
        is_alive: true,
        reproduction_cooldown: 0.0,
        offspring_count: 0,
        developmental_stage: DevelopmentalStage::Adult,
        adaptation_score: 0.5,
        advanced: None,
    };

    let id = world.add_organism(organism, None, DivergenceRank::Phylum);
    (id, species_id)
}

/// Floods every cell with abundant resources so energy availability never
/// confounds the reproduction-under-zero-mutation property under test.
fn remove_resource_scarcity(world: &mut World) {
    for cell in &mut world.cells {
        cell.capacity = [1_000.0; RESOURCE_COUNT];
        cell.resources = [500.0; RESOURCE_COUNT];
    }
}

#[test]
fn zero_mutation_rate_keeps_a_single_species_growing() {
    let mut config = AppConfig::default();
    config.world.width = 5;
    config.world.height = 5;
    config.world.cell_size = 20;
    config.world.initial_organism_count = 0;
    config.seed = Some(42);

    let mut world = World::new(config).expect("default config is valid");
    remove_resource_scarcity(&mut world);
    let (_founder_id, species_id) = founder(&mut world);

    let initial_population = world.living_population();
    assert_eq!(initial_population, 1);

    for tick in 0..1000 {
        world.tick(1.0);
        assert!(
            world.living_population() >= 1,
            "population went extinct at tick {tick}"
        );
    }

    let final_population = world.living_population();
    assert!(
        final_population > initial_population,
        "population should have grown via division, started at {initial_population}, ended at {final_population}"
    );

    assert_eq!(
        world.species_registry.len(),
        1,
        "zero mutation rate must never trigger speciation"
    );
    for organism in world.organisms.values().filter(|o| o.is_alive) {
        assert_eq!(organism.species_id, species_id);
    }

    let record = world
        .species_registry
        .get(species_id)
        .expect("founder species must still be registered");
    assert_eq!(record.population_count, final_population as u64);
    assert!(record.max_population >= record.population_count);
    assert!(!record.extinct);
}
