//! S5 — the diffusion operator between two adjacent cells should converge
//! a lopsided resource toward equilibrium while conserving its total mass.

use primordium_core::cell_dynamics::diffuse_step;
use primordium_data::{Biome, Resource, WorldCell, RESOURCE_COUNT};

fn shallow_water_cell(water: f32) -> WorldCell {
    let mut cell = WorldCell {
        x: 0,
        y: 0,
        biome: Biome::ShallowWater,
        temperature: 20.0,
        humidity: 0.5,
        altitude: 0.0,
        resources: [0.0; RESOURCE_COUNT],
        capacity: [1_000.0; RESOURCE_COUNT],
        stability: 0.5,
    };
    cell.set_resource(Resource::Water, water);
    cell
}

#[test]
fn two_cells_reach_quasi_equilibrium_without_losing_mass() {
    let mut cell_a = shallow_water_cell(100.0);
    let mut cell_b = shallow_water_cell(0.0);
    let initial_total = cell_a.resource(Resource::Water) + cell_b.resource(Resource::Water);

    for _ in 0..1000 {
        let snapshot_a = cell_a;
        let snapshot_b = cell_b;
        diffuse_step(&mut cell_a, &snapshot_b, 1.0);
        diffuse_step(&mut cell_b, &snapshot_a, 1.0);
    }

    let water_a = cell_a.resource(Resource::Water);
    let water_b = cell_b.resource(Resource::Water);
    assert!(
        (water_a - water_b).abs() < 0.01,
        "expected near-equilibrium, got {water_a} vs {water_b}"
    );

    let final_total = water_a + water_b;
    assert!(
        (final_total - initial_total).abs() <= 0.05 * initial_total,
        "diffusion alone must conserve mass within 5%, started at {initial_total}, ended at {final_total}"
    );
}

#[test]
fn diffusion_of_equal_values_is_a_no_op() {
    let mut cell_a = shallow_water_cell(42.0);
    let cell_b = shallow_water_cell(42.0);
    let before = cell_a;

    diffuse_step(&mut cell_a, &cell_b, 1.0);

    assert_eq!(cell_a.resources, before.resources);
}
