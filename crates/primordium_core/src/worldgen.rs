//! One-shot procedural world generation: continents, altitude/humidity/
//! temperature fields, rivers, and the biome decision tree.
//!
//! Grounded on the teacher's config-driven "build once at startup" pattern
//! and, for the noise fields themselves, on the `noise` crate usage found
//! across the example pack's procedural-terrain projects (`Perlin::new`
//! plus `NoiseFn::get`).

use noise::{NoiseFn, Perlin};
use primordium_data::{Biome, Resource, WorldCell, RESOURCE_COUNT};
use rand::Rng;

/// An imagined continental mass: a center, an anisotropic radius pair, and a
/// target altitude it pulls nearby cells toward.
struct Continent {
    cx: f64,
    cy: f64,
    radius_x: f64,
    radius_y: f64,
    strength: f32,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Smooth per-continent influence, summed with Perlin boundary noise so
/// coastlines aren't perfect ellipses.
fn continent_field(continents: &[Continent], x: f64, y: f64, boundary_noise: &Perlin) -> f32 {
    let mut field = 0.0f64;
    for c in continents {
        let dx = (x - c.cx) / c.radius_x;
        let dy = (y - c.cy) / c.radius_y;
        let distance = (dx * dx + dy * dy).sqrt();
        let edge_noise = boundary_noise.get([x * 0.05, y * 0.05]) * 0.3;
        let influence = sigmoid((1.0 - distance + edge_noise) * 4.0);
        field = field.max(influence * c.strength as f64);
    }
    field as f32
}

/// Mountain-chain overlay: a ridge of elevated altitude along the segment
/// between each pair of continent centers, modeling an imagined plate
/// boundary.
fn mountain_overlay(continents: &[Continent], x: f64, y: f64) -> f32 {
    let mut boost = 0.0f32;
    for i in 0..continents.len() {
        for j in (i + 1)..continents.len() {
            let (ax, ay) = (continents[i].cx, continents[i].cy);
            let (bx, by) = (continents[j].cx, continents[j].cy);
            let (dx, dy) = (bx - ax, by - ay);
            let len_sq = dx * dx + dy * dy;
            if len_sq < 1.0 {
                continue;
            }
            let t = (((x - ax) * dx + (y - ay) * dy) / len_sq).clamp(0.0, 1.0);
            let proj_x = ax + t * dx;
            let proj_y = ay + t * dy;
            let distance = ((x - proj_x).powi(2) + (y - proj_y).powi(2)).sqrt();
            let ridge = (1.0 - (distance / 15.0)).clamp(0.0, 1.0);
            boost = boost.max(ridge as f32 * 0.35);
        }
    }
    boost
}

struct NoiseFields {
    altitude_octaves: [Perlin; 4],
    humidity: Perlin,
    temperature: Perlin,
    river_seed: Perlin,
    boundary: Perlin,
}

impl NoiseFields {
    fn new(seed: u32) -> Self {
        Self {
            altitude_octaves: [
                Perlin::new(seed),
                Perlin::new(seed.wrapping_add(1)),
                Perlin::new(seed.wrapping_add(2)),
                Perlin::new(seed.wrapping_add(3)),
            ],
            humidity: Perlin::new(seed.wrapping_add(10)),
            temperature: Perlin::new(seed.wrapping_add(20)),
            river_seed: Perlin::new(seed.wrapping_add(30)),
            boundary: Perlin::new(seed.wrapping_add(40)),
        }
    }

    fn altitude_noise(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 0.02;
        let mut max_amplitude = 0.0;
        for octave in &self.altitude_octaves {
            total += octave.get([x * frequency, y * frequency]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        total / max_amplitude
    }
}

/// Per-cell fields computed before biome classification.
#[derive(Clone, Copy, Debug)]
struct CellFields {
    altitude: f32,
    humidity: f32,
    temperature: f32,
    river: f32,
}

fn compute_fields(
    fields: &NoiseFields,
    continents: &[Continent],
    x: u32,
    y: u32,
    height: u32,
    sea_level_offset: f32,
    temperature_multiplier: f32,
    humidity_multiplier: f32,
) -> CellFields {
    let fx = x as f64;
    let fy = y as f64;

    let continent = continent_field(continents, fx, fy, &fields.boundary);
    let mountain = mountain_overlay(continents, fx, fy);
    let altitude_noise = fields.altitude_noise(fx, fy) as f32;
    let altitude = ((continent * 1.6 - 0.8 + altitude_noise * 0.3 + mountain) - sea_level_offset)
        .clamp(-1.0, 1.0);

    let humidity_noise = fields.humidity.get([fx * 0.03, fy * 0.03]) as f32;
    let humidity = ((humidity_noise * 0.5 + 0.5) * humidity_multiplier).clamp(0.0, 1.0);

    let latitude = ((y as f64 / height.max(1) as f64) - 0.5).abs() * 2.0;
    let latitude_baseline = 30.0 - latitude as f32 * 45.0;
    let temperature_noise = fields.temperature.get([fx * 0.02, fy * 0.02]) as f32 * 5.0;
    let temperature =
        (latitude_baseline - altitude.max(0.0) * 0.3 * 30.0 + temperature_noise) * temperature_multiplier;

    let river = (fields.river_seed.get([fx * 0.07, fy * 0.07]) as f32 + 1.0) / 2.0;

    CellFields { altitude, humidity, temperature, river }
}

fn classify_biome(fields: CellFields, rng: &mut impl Rng) -> Biome {
    let CellFields { altitude, humidity, temperature, river } = fields;
    let ecotone_jitter = rng.gen_range(-0.05..0.05);
    let altitude = altitude + ecotone_jitter;

    if altitude < -0.6 {
        return Biome::DeepOcean;
    }
    if altitude < -0.3 {
        return if temperature > 20.0 && humidity > 0.6 {
            Biome::CoralReef
        } else {
            Biome::Ocean
        };
    }
    if altitude < -0.05 {
        return Biome::ShallowWater;
    }
    if altitude < 0.02 {
        return Biome::Beach;
    }
    if river > 0.82 {
        return Biome::River;
    }
    if river > 0.65 && altitude < 0.3 {
        return Biome::Lake;
    }

    if altitude > 0.75 {
        return if temperature < -5.0 { Biome::Ice } else { Biome::Mountain };
    }
    if altitude > 0.55 {
        return if humidity > 0.5 { Biome::MountainForest } else { Biome::Mountain };
    }
    if temperature < -10.0 {
        return Biome::Ice;
    }
    if temperature < 2.0 {
        return Biome::Tundra;
    }

    if humidity > 0.15 && temperature > 38.0 && altitude > 0.3 && rng.gen_bool(0.02) {
        return Biome::Volcanic;
    }

    if humidity < 0.25 {
        return if altitude > 0.3 { Biome::DesertHills } else { Biome::Desert };
    }
    if humidity < 0.45 {
        return Biome::Savanna;
    }
    if humidity < 0.65 {
        return Biome::Grassland;
    }
    if humidity < 0.8 {
        return Biome::Forest;
    }
    if temperature > 20.0 && altitude < 0.1 {
        return Biome::Swamp;
    }
    Biome::Rainforest
}

struct BiomeProfile {
    resources: [f32; RESOURCE_COUNT],
    capacity: [f32; RESOURCE_COUNT],
    stability: f32,
}

fn biome_profile(biome: Biome) -> BiomeProfile {
    let (water, minerals, organic, stability) = match biome {
        Biome::DeepOcean => (900.0, 40.0, 10.0, 0.9),
        Biome::Ocean => (700.0, 35.0, 15.0, 0.85),
        Biome::ShallowWater => (500.0, 30.0, 25.0, 0.8),
        Biome::CoralReef => (450.0, 60.0, 80.0, 0.75),
        Biome::Beach => (150.0, 20.0, 10.0, 0.6),
        Biome::Grassland => (120.0, 50.0, 90.0, 0.7),
        Biome::Savanna => (60.0, 40.0, 60.0, 0.6),
        Biome::Forest => (180.0, 60.0, 140.0, 0.8),
        Biome::Rainforest => (300.0, 70.0, 200.0, 0.85),
        Biome::Swamp => (350.0, 45.0, 150.0, 0.55),
        Biome::Mountain => (40.0, 80.0, 10.0, 0.5),
        Biome::MountainForest => (120.0, 70.0, 90.0, 0.65),
        Biome::Desert => (10.0, 30.0, 2.0, 0.4),
        Biome::DesertHills => (15.0, 40.0, 5.0, 0.45),
        Biome::Tundra => (50.0, 25.0, 15.0, 0.5),
        Biome::Ice => (20.0, 10.0, 1.0, 0.3),
        Biome::Volcanic => (5.0, 100.0, 0.0, 0.2),
        Biome::River => (600.0, 50.0, 60.0, 0.75),
        Biome::Lake => (550.0, 45.0, 70.0, 0.8),
    };

    BiomeProfile {
        resources: [200.0, water, minerals, 210.0, 400.0, organic],
        capacity: [
            500.0,
            water * 1.5,
            minerals * 2.0,
            500.0,
            800.0,
            organic.max(50.0) * 2.0,
        ],
        stability,
    }
}

/// Generates a complete grid of [`WorldCell`]s. `resources_multiplier`
/// scales every biome's initial resources, matching `ClimateConfig`.
#[must_use]
pub fn generate_world(
    width: u32,
    height: u32,
    seed: u64,
    sea_level_offset: f32,
    temperature_multiplier: f32,
    humidity_multiplier: f32,
    resources_multiplier: f32,
    rng: &mut impl Rng,
) -> Vec<WorldCell> {
    tracing::info!(seed, width, height, "generating world");

    let noise_seed = (seed % u32::MAX as u64) as u32;
    let fields = NoiseFields::new(noise_seed);

    let continent_count = rng.gen_range(3..=6);
    let continents: Vec<Continent> = (0..continent_count)
        .map(|_| Continent {
            cx: rng.gen_range(0.0..width as f64),
            cy: rng.gen_range(0.0..height as f64),
            radius_x: rng.gen_range(width as f64 * 0.1..width as f64 * 0.35),
            radius_y: rng.gen_range(height as f64 * 0.1..height as f64 * 0.35),
            strength: rng.gen_range(0.7..1.3),
        })
        .collect();

    let mut cells = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let cell_fields = compute_fields(
                &fields,
                &continents,
                x,
                y,
                height,
                sea_level_offset,
                temperature_multiplier,
                humidity_multiplier,
            );
            let biome = classify_biome(cell_fields, rng);
            let profile = biome_profile(biome);

            let mut resources = profile.resources;
            let mut capacity = profile.capacity;
            for slot in resources.iter_mut().chain(capacity.iter_mut()) {
                let noise = rng.gen_range(-0.15..0.15);
                *slot = (*slot * resources_multiplier * (1.0 + noise)).max(0.0);
            }
            let river_delta = matches!(biome, Biome::River | Biome::Lake) && cell_fields.altitude < -0.02;
            let biome = if river_delta { Biome::ShallowWater } else { biome };

            cells.push(WorldCell {
                x,
                y,
                biome,
                temperature: cell_fields.temperature,
                humidity: cell_fields.humidity,
                altitude: cell_fields.altitude,
                resources,
                capacity,
                stability: profile.stability,
            });
        }
    }

    cells
}
