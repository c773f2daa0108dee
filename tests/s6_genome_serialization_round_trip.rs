//! S6 — a genome's derived phenotype must survive a hex-encoded
//! serialization round trip (the same encoding species records use to
//! embed a genome in persisted storage) bit-for-bit.

use primordium_core::{genetics::GenomeOps, phenotype_derivation::PhenotypeOps};
use primordium_data::Genome;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn phenotype_survives_a_hex_round_trip() {
    let mut seed_rng = ChaCha8Rng::seed_from_u64(42);
    let genome = Genome::random_genome(&mut seed_rng);

    let mut reproduce_rng = ChaCha8Rng::seed_from_u64(42);
    let child = Genome::reproduce(&genome, &genome, &mut reproduce_rng);
    let phenotype = child.derive_phenotype();

    let encoded = child.to_hex();
    let reloaded = Genome::from_hex(&encoded).expect("hex round trip must decode");
    assert_eq!(reloaded, child);

    let reloaded_phenotype = reloaded.derive_phenotype();

    assert!((phenotype.size - reloaded_phenotype.size).abs() < 1e-9);
    assert!((phenotype.max_speed - reloaded_phenotype.max_speed).abs() < 1e-9);
    assert!((phenotype.metabolism_rate - reloaded_phenotype.metabolism_rate).abs() < 1e-9);
    assert!((phenotype.lifespan - reloaded_phenotype.lifespan).abs() < 1e-9);
    assert!((phenotype.maturation_time - reloaded_phenotype.maturation_time).abs() < 1e-9);
    assert!((phenotype.energy_capacity - reloaded_phenotype.energy_capacity).abs() < 1e-9);
    assert!((phenotype.optimal_temperature - reloaded_phenotype.optimal_temperature).abs() < 1e-9);
    assert!((phenotype.temperature_range - reloaded_phenotype.temperature_range).abs() < 1e-9);
    assert_eq!(phenotype.max_offspring, reloaded_phenotype.max_offspring);
    assert_eq!(phenotype.color, reloaded_phenotype.color);
    assert_eq!(phenotype, reloaded_phenotype);
}
