//! S3 — a grassland population seeded with many herbivores and a handful
//! of carnivores should run for thousands of ticks without panicking or
//! blowing through the configured population ceiling, and both guilds
//! should remain represented in the species registry for a meaningful
//! stretch of the run.

use primordium_core::species_registry::SpeciesFilter;
use primordium_data::{Biome, OrganismType};
use primordium_core::AppConfig;
use primordium_core::World;

#[test]
fn herbivore_and_carnivore_populations_stay_bounded_and_coexist() {
    let mut config = AppConfig::default();
    config.world.width = 40;
    config.world.height = 40;
    config.world.cell_size = 20;
    config.world.initial_organism_count = 0;
    config.world.max_organisms = 2_000;
    config.seed = Some(11);

    let mut world = World::new(config).expect("default config is valid");
    for cell in &mut world.cells {
        cell.biome = Biome::Grassland;
    }

    // [Herbivore, Carnivore, Unicellular, Plant, Omnivore] weighting so the
    // requested 100/10 split lands on the two guilds under test.
    let weights = [0.0, 0.0, 0.0, 0.0, 0.0];
    let mut herbivore_weights = weights;
    herbivore_weights[OrganismType::Herbivore as usize] = 1.0;
    world.spawn_random_organisms(100, Some(herbivore_weights));
    let mut carnivore_weights = weights;
    carnivore_weights[OrganismType::Carnivore as usize] = 1.0;
    world.spawn_random_organisms(10, Some(carnivore_weights));

    let mut carnivores_alive_ticks = 0u32;
    for _ in 0..5_000 {
        world.tick(1.0);

        assert!(
            world.organisms.len() <= world.config.world.max_organisms as usize,
            "population exceeded the configured ceiling"
        );

        let living = world.living_population();
        assert!(living <= world.config.world.max_organisms as usize);

        let carnivores = world
            .organisms
            .values()
            .filter(|o| o.is_alive && o.organism_type == OrganismType::Carnivore)
            .count();
        if carnivores > 0 {
            carnivores_alive_ticks += 1;
        }
    }

    assert!(
        world.living_population() <= 2_000,
        "final population must stay within the configured ceiling"
    );

    assert!(
        carnivores_alive_ticks > 0,
        "carnivores should survive for at least part of the run given abundant prey"
    );

    let species = world.species_registry.list(SpeciesFilter::All);
    assert!(
        species
            .iter()
            .any(|r| r.organism_type == OrganismType::Herbivore),
        "herbivore lineage should be present in the registry"
    );
}
