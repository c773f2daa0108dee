//! Per-tick resource regeneration and inter-cell diffusion for
//! [`WorldCell`].
//!
//! Grounded on the teacher's resource-update pass in `environment.rs`: a
//! per-resource rate table, a diffusion operator run against the eight
//! neighbors, and a small always-on floor so growth never fully stalls.

use primordium_data::{Biome, Resource, WorldCell, RESOURCE_COUNT};
use rand::Rng;

/// Base diffusion rate per resource; water and gases move faster than the
/// near-static minerals/organic matter pools.
fn diffusion_rate(resource: Resource) -> f32 {
    match resource {
        Resource::Sunlight => 0.0,
        Resource::Water => 0.15,
        Resource::Minerals => 0.02,
        Resource::Oxygen => 0.2,
        Resource::Co2 => 0.2,
        Resource::OrganicMatter => 0.01,
    }
}

/// One neighbor's contribution to `cell`'s diffusion this tick; `rng` is
/// reused for water's precipitation/evaporation rolls.
pub fn diffuse_step(cell: &mut WorldCell, neighbor: &WorldCell, dt: f32) {
    for resource in Resource::ALL {
        if !resource.diffuses() {
            continue;
        }
        let rate = diffusion_rate(resource);
        let mut flow = (cell.resource(resource) - neighbor.resource(resource)) * rate * dt;
        if resource == Resource::Water && cell.altitude > neighbor.altitude {
            flow += (cell.altitude - neighbor.altitude) * 20.0 * rate * dt;
        }
        apply_flow(cell, neighbor, resource, flow);
    }
}

/// Moves `flow` units of `resource` from `from` to `to` (or the reverse if
/// negative), capping outflow at the source's current amount and inflow at
/// the destination's capacity. Only `from`'s side is applied here; the
/// matching neighbor update happens on that cell's own `diffuse_step` call,
/// matching the teacher's "each cell updates itself against its neighbor
/// snapshot" convention.
fn apply_flow(from: &mut WorldCell, to: &WorldCell, resource: Resource, flow: f32) {
    if flow > 0.0 {
        let outflow = flow.min(from.resource(resource));
        let room = (to.capacity[resource.index()] - to.resource(resource)).max(0.0);
        let moved = outflow.min(room.max(outflow));
        from.add_resource(resource, -moved);
    } else if flow < 0.0 {
        let inflow = (-flow).min(to.resource(resource));
        let room = (from.capacity[resource.index()] - from.resource(resource)).max(0.0);
        let moved = inflow.min(room.max(inflow));
        from.add_resource(resource, moved);
    }
}

fn biome_growth_factor(biome: Biome) -> f32 {
    match biome {
        Biome::Rainforest => 1.4,
        Biome::Forest | Biome::MountainForest | Biome::Swamp => 1.1,
        Biome::Grassland | Biome::Savanna | Biome::CoralReef => 1.0,
        Biome::Beach | Biome::ShallowWater | Biome::Ocean => 0.7,
        Biome::Desert | Biome::DesertHills | Biome::Tundra => 0.3,
        Biome::Mountain | Biome::Ice | Biome::Volcanic | Biome::DeepOcean => 0.15,
        Biome::River | Biome::Lake => 0.8,
    }
}

/// Non-diffusive per-resource regeneration, precipitation/evaporation, and
/// biomass growth. Call once per active cell per tick, after neighbor
/// diffusion has run.
pub fn regenerate(cell: &mut WorldCell, neighbor_water_count: u32, dt: f32, rng: &mut impl Rng) {
    let regen = 0.3;

    // Water: precipitation and evaporation.
    let altitude_factor = ((cell.altitude + 1.0) / 2.0).clamp(0.0, 1.0);
    let precip_chance = (altitude_factor * 0.02 + neighbor_water_count as f32 * 0.01) * dt;
    if rng.gen_bool(precip_chance.clamp(0.0, 1.0) as f64) {
        cell.add_resource(Resource::Water, 2.0);
    }
    if cell.temperature > 25.0 {
        let evaporation = (cell.temperature - 25.0) * 0.05 * dt;
        let evaporation = evaporation.min(cell.resource(Resource::Water));
        cell.add_resource(Resource::Water, -evaporation);
    }

    // Minerals: slow regeneration toward capacity.
    let mineral_gap = cell.capacity[Resource::Minerals.index()] - cell.resource(Resource::Minerals);
    if mineral_gap > 0.0 {
        cell.add_resource(Resource::Minerals, mineral_gap * regen * 0.1 * dt);
    }

    // Organic matter: f(water, sunlight, co2) * temperature_factor * biome_factor.
    let water = cell.resource(Resource::Water);
    let sunlight = cell.resource(Resource::Sunlight);
    let co2 = cell.resource(Resource::Co2);
    let temperature_factor = (1.0 - ((cell.temperature - 22.0).abs() / 30.0)).clamp(0.1, 1.0);
    let biome_factor = biome_growth_factor(cell.biome);
    let growth_signal = (water * 0.01).min(1.0) * (sunlight * 0.01).min(1.0) * (co2 * 0.05).min(1.0);
    let growth = (growth_signal * temperature_factor * biome_factor * dt).max(0.01 * dt);
    if growth > 0.0 {
        let co2_consumed = growth.min(co2);
        cell.add_resource(Resource::OrganicMatter, growth);
        cell.add_resource(Resource::Co2, -co2_consumed);
        cell.add_resource(Resource::Oxygen, co2_consumed);
    }

    // Oxygen -> CO2 respiration.
    let respired = cell.resource(Resource::Oxygen) * 0.001 * dt;
    if respired > 0.0 {
        cell.add_resource(Resource::Oxygen, -respired);
        cell.add_resource(Resource::Co2, respired);
    }
}

/// Deposits decomposed biomass into a cell: 0.5 to organic matter, 0.2 to
/// minerals, 0.1 to CO2, each capped at the cell's capacity.
pub fn deposit_decomposition(cell: &mut WorldCell, biomass: f32) {
    cell.add_resource(Resource::OrganicMatter, biomass * 0.5);
    cell.add_resource(Resource::Minerals, biomass * 0.2);
    cell.add_resource(Resource::Co2, biomass * 0.1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: u32, y: u32, biome: Biome, water: f32) -> WorldCell {
        let mut resources = [0.0; RESOURCE_COUNT];
        resources[Resource::Water.index()] = water;
        WorldCell {
            x,
            y,
            biome,
            temperature: 20.0,
            humidity: 0.5,
            altitude: 0.0,
            resources,
            capacity: [1000.0; RESOURCE_COUNT],
            stability: 0.5,
        }
    }

    #[test]
    fn diffusion_is_noop_on_equal_values() {
        let mut a = cell(0, 0, Biome::ShallowWater, 50.0);
        let b = cell(1, 0, Biome::ShallowWater, 50.0);
        diffuse_step(&mut a, &b, 1.0);
        assert!((a.resource(Resource::Water) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn diffusion_flows_toward_equilibrium() {
        let mut a = cell(0, 0, Biome::ShallowWater, 100.0);
        let b = cell(1, 0, Biome::ShallowWater, 0.0);
        let before = a.resource(Resource::Water);
        diffuse_step(&mut a, &b, 1.0);
        assert!(a.resource(Resource::Water) < before);
    }

    #[test]
    fn decomposition_deposit_respects_capacity() {
        let mut cell = cell(0, 0, Biome::Grassland, 0.0);
        cell.capacity[Resource::OrganicMatter.index()] = 1.0;
        deposit_decomposition(&mut cell, 100.0);
        assert!(cell.resource(Resource::OrganicMatter) <= 1.0);
    }
}
