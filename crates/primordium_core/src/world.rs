//! The top-level simulation: the cell grid, the organism population, the
//! spatial index, and the tick sequence that couples all of it.
//!
//! Grounded on the teacher's `World`/`Simulation` orchestrator: a struct
//! that owns every subsystem, a `tick(dt)` entry point that runs a fixed
//! sequence of phases, and bounded per-tick caches that are purged on a
//! schedule instead of growing forever.

use crate::cell_dynamics;
use crate::climate::Climate;
use crate::config::{organism_type_from_ratio, AppConfig, SimulationParamsConfig};
use crate::error::{safe_denom, safe_denom_f64, Result, SimError};
use crate::genetics::GenomeOps;
use crate::interaction::{self, AttackOutcome, PredatorPreyRatioCache};
use crate::lifecycle::{self, Action, DecisionContext, NearbyCell, NearbyOrganism, OrganismOps};
use crate::phenotype_derivation::PhenotypeOps;
use crate::reproduction::{self, ReproductionContext, SeedDispersal};
use crate::species_registry::{NullRegistryStore, RegistryStore, SpeciesFilter, SpeciesRegistry};
use crate::spatial_grid::SpatialGrid;
use crate::taxonomy::{self, DivergenceRank};
use crate::worldgen;

use chrono::Utc;
use primordium_data::{
    Biome, Genome, Milestone, Organism, OrganismType, Phenotype, Position, Resource, Velocity,
    WorldCell,
};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn cell_index(width: u32, x: u32, y: u32) -> usize {
    (y as usize) * (width as usize) + (x as usize)
}

fn neighbor_coords(width: u32, height: u32, x: u32, y: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(8);
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx >= 0 && ny >= 0 && (nx as u32) < width && (ny as u32) < height {
                out.push((nx as u32, ny as u32));
            }
        }
    }
    out
}

/// Update-ratio schedule keyed by total live population, per the LOD step.
fn update_ratio(count: usize) -> f32 {
    if count <= 5_000 {
        1.0
    } else if count <= 10_000 {
        0.5
    } else if count <= 15_000 {
        0.25
    } else {
        0.1
    }
}

/// Per-tick reproduction budget: clamp(2000 / count^0.7, 10, 100).
fn reproduction_limit(count: usize) -> u32 {
    if count == 0 {
        return 100;
    }
    (2000.0 / (count as f32).powf(0.7)).clamp(10.0, 100.0) as u32
}

/// How often (in ticks) the spatial grid gets a full rebuild, scaling down
/// as the population grows.
fn rebuild_interval(count: usize) -> u64 {
    if count <= 1_000 {
        50
    } else if count <= 5_000 {
        20
    } else {
        10
    }
}

fn stats_interval(count: usize) -> u64 {
    if count <= 1_000 {
        100
    } else if count <= 5_000 {
        50
    } else {
        20
    }
}

/// Fixed (organism_type, biome) adaptation lookup in [0.2, 1.0].
fn biome_adaptation_base(organism_type: OrganismType, biome: Biome) -> f32 {
    let water_like = biome.is_water();
    match organism_type {
        OrganismType::Unicellular => if water_like { 0.9 } else { 0.4 },
        OrganismType::Plant => match biome {
            Biome::Rainforest | Biome::Forest | Biome::Grassland | Biome::Swamp => 0.9,
            Biome::Savanna | Biome::MountainForest | Biome::Beach => 0.6,
            Biome::Desert | Biome::DesertHills | Biome::Tundra => 0.3,
            Biome::Mountain | Biome::Ice | Biome::Volcanic => 0.2,
            _ if water_like => 0.25,
            _ => 0.4,
        },
        OrganismType::Herbivore => match biome {
            Biome::Grassland | Biome::Savanna | Biome::Forest => 0.9,
            Biome::Swamp | Biome::MountainForest | Biome::Tundra => 0.6,
            Biome::Desert | Biome::DesertHills => 0.3,
            _ if water_like => 0.2,
            _ => 0.4,
        },
        OrganismType::Carnivore => match biome {
            Biome::Forest | Biome::Savanna | Biome::Grassland | Biome::MountainForest => 0.8,
            Biome::Tundra | Biome::Mountain => 0.6,
            Biome::Desert | Biome::DesertHills | Biome::Ice => 0.35,
            _ if water_like => 0.2,
            _ => 0.4,
        },
        OrganismType::Omnivore => match biome {
            Biome::Forest | Biome::Swamp | Biome::Grassland | Biome::Savanna => 0.85,
            Biome::MountainForest | Biome::Beach | Biome::Tundra => 0.6,
            Biome::Desert | Biome::DesertHills | Biome::Mountain => 0.4,
            _ if water_like => 0.3,
            _ => 0.45,
        },
    }
}

fn resource_term(organism_type: OrganismType, cell: &WorldCell) -> f32 {
    let value = match organism_type {
        OrganismType::Plant | OrganismType::Unicellular => {
            (cell.resource(Resource::Sunlight) + cell.resource(Resource::Water)) / 600.0
        }
        OrganismType::Herbivore => cell.resource(Resource::OrganicMatter) / 200.0,
        OrganismType::Carnivore | OrganismType::Omnivore => 0.5,
    };
    value.clamp(0.0, 1.0)
}

/// A scalar trait is considered to have "shifted" once parent and child
/// differ by more than 5% of that trait's declared output range.
fn trait_shift_threshold(name: &str) -> f32 {
    primordium_data::TRAIT_METADATA
        .iter()
        .find(|meta| meta.name == name)
        .map(|meta| 0.05 * (meta.range.1 - meta.range.0))
        .unwrap_or(f32::EPSILON)
}

/// Counts how many of the shared scalar traits moved past their
/// significance threshold between `parent` and `child`, feeding the
/// adaptation milestone gate.
fn count_trait_shifts(parent: &Phenotype, child: &Phenotype) -> u32 {
    let pairs: [(&str, f32, f32); 18] = [
        ("size", parent.size, child.size),
        ("max_speed", parent.max_speed, child.max_speed),
        ("strength", parent.strength, child.strength),
        ("metabolism_rate", parent.metabolism_rate, child.metabolism_rate),
        ("energy_capacity", parent.energy_capacity, child.energy_capacity),
        ("vision_range", parent.vision_range, child.vision_range),
        ("smell", parent.smell, child.smell),
        ("hearing", parent.hearing, child.hearing),
        ("fertility", parent.fertility, child.fertility),
        ("maturation_time", parent.maturation_time, child.maturation_time),
        ("immune_strength", parent.immune_strength, child.immune_strength),
        ("toxin_resistance", parent.toxin_resistance, child.toxin_resistance),
        ("attack_power", parent.attack_power, child.attack_power),
        ("defense_power", parent.defense_power, child.defense_power),
        ("learning_rate", parent.learning_rate, child.learning_rate),
        ("memory", parent.memory, child.memory),
        ("problem_solving", parent.problem_solving, child.problem_solving),
        ("lifespan", parent.lifespan, child.lifespan),
    ];
    pairs
        .iter()
        .filter(|(name, before, after)| (after - before).abs() > trait_shift_threshold(name))
        .count() as u32
}

fn build_reproduction_context(
    parent: &Organism,
    cell: &WorldCell,
    local_population: usize,
    simulation: &SimulationParamsConfig,
    population_factor: f32,
) -> ReproductionContext {
    let temp_mismatch = ((cell.temperature - parent.phenotype.optimal_temperature).abs()
        / parent.phenotype.temperature_range.max(1.0))
        .clamp(0.0, 2.0)
        * 0.1;
    let resource_shortage = if resource_term(parent.organism_type, cell) < 0.2 { 0.1 } else { 0.0 };
    let crowding = if local_population > 15 { 0.1 } else { 0.0 };
    let evolutionary_pressure = (simulation.selection_pressure - 1.0).clamp(0.0, 1.0);

    ReproductionContext {
        environmental_stress: temp_mismatch + resource_shortage,
        population_stress: crowding,
        mutagen_exposure: 0.0,
        evolutionary_pressure,
        isolation_factor: 0.0,
        geographic_isolation: 0.0,
        population_factor,
    }
}

/// Offsets a newly-germinated seed from its parent's position according to
/// its dispersal mode, clamped to stay inside the world bounds.
fn disperse_seed(
    origin: Position,
    dispersal: SeedDispersal,
    world_width: f64,
    world_height: f64,
    rng: &mut impl Rng,
) -> Position {
    let distance = match dispersal {
        SeedDispersal::Gravity => rng.gen_range(1.0..3.0),
        SeedDispersal::Wind => rng.gen_range(5.0..20.0),
        SeedDispersal::Explosion => rng.gen_range(2.0..8.0),
    };
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    Position {
        x: (origin.x + distance * angle.cos()).clamp(0.0, world_width.max(0.0)),
        y: (origin.y + distance * angle.sin()).clamp(0.0, world_height.max(0.0)),
    }
}

/// Aggregate population snapshot, recomputed every `stats_interval` ticks.
#[derive(Debug, Clone, Default)]
pub struct SpeciesStats {
    pub living_species: u32,
    pub extinct_species: u32,
    pub living_organisms: u64,
    pub population_by_type: HashMap<OrganismType, u64>,
}

/// Coarser, less frequently recomputed evolutionary picture.
#[derive(Debug, Clone, Default)]
pub struct EvolutionaryStats {
    pub dominant_species_per_type: HashMap<OrganismType, Uuid>,
    pub mean_adaptation_per_biome: HashMap<Biome, f32>,
}

/// The complete simulation state.
pub struct World {
    pub config: AppConfig,
    pub width: u32,
    pub height: u32,
    pub cells: Vec<WorldCell>,
    pub organisms: HashMap<Uuid, Organism>,
    pub spatial_grid: SpatialGrid,
    pub climate: Climate,
    pub species_registry: SpeciesRegistry,
    pub taxonomies: HashMap<Uuid, taxonomy::Taxonomy>,
    pub species_taxonomy: HashMap<Uuid, Uuid>,
    pub milestones: Vec<Milestone>,
    pub tick_index: u64,
    pub extinction_count: u64,
    pub speciation_events: u64,
    pub species_stats: SpeciesStats,
    pub evolutionary_stats: EvolutionaryStats,
    rng: ChaCha8Rng,
    biome_adaptation_cache: HashMap<(Uuid, (u32, u32)), f32>,
    predator_prey_cache: PredatorPreyRatioCache,
    logged_extinctions: HashSet<Uuid>,
    registry_store: Box<dyn RegistryStore + Send + Sync>,
    species_event_counts: HashMap<Uuid, u32>,
    inconsistency_count: u64,
    last_persistence_error: Option<String>,
}

/// Queryable error-recovery health: how many per-tick recoverable
/// conditions have been absorbed since construction, and the most recent
/// registry persistence failure, if any. Never surfaced through `tick`
/// itself — read this separately.
#[derive(Debug, Clone, Default)]
pub struct WorldStatus {
    pub inconsistency_count: u64,
    pub last_persistence_error: Option<String>,
}

impl World {
    /// Validates `config`, generates the grid, and returns an otherwise
    /// empty world (no organisms yet — call [`World::spawn_random_organisms`]
    /// next).
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        tracing::info!(seed, "initializing world");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let width = config.world.width;
        let height = config.world.height;
        let cells = worldgen::generate_world(
            width,
            height,
            seed,
            config.climate.sea_level,
            config.climate.temperature,
            config.climate.humidity,
            config.climate.resources,
            &mut rng,
        );

        let registry_store: Box<dyn RegistryStore + Send + Sync> = Box::new(NullRegistryStore);
        let species_registry = registry_store.load().unwrap_or_default();

        Ok(Self {
            config,
            width,
            height,
            cells,
            organisms: HashMap::new(),
            spatial_grid: SpatialGrid::new(f64::from(width.max(1)).min(50.0).max(1.0)),
            climate: Climate::new(width, height),
            species_registry,
            taxonomies: HashMap::new(),
            species_taxonomy: HashMap::new(),
            milestones: Vec::new(),
            tick_index: 0,
            extinction_count: 0,
            speciation_events: 0,
            species_stats: SpeciesStats::default(),
            evolutionary_stats: EvolutionaryStats::default(),
            rng,
            biome_adaptation_cache: HashMap::new(),
            predator_prey_cache: PredatorPreyRatioCache::new(),
            logged_extinctions: HashSet::new(),
            registry_store,
            species_event_counts: HashMap::new(),
            inconsistency_count: 0,
            last_persistence_error: None,
        })
    }

    /// Swaps in a non-default persistence backend (e.g. the atomic
    /// JSON-file store from `primordium_io`), immediately reloading the
    /// registry from it.
    pub fn with_registry_store(mut self, store: Box<dyn RegistryStore + Send + Sync>) -> Self {
        if let Ok(loaded) = store.load() {
            self.species_registry = loaded;
        }
        self.registry_store = store;
        self
    }

    /// Saves the species registry through the configured backend. Failures
    /// are logged and recorded in [`World::status`] rather than left only
    /// in the returned `Result`, so an embedder that doesn't check the
    /// return value can still observe a stuck persistence backend.
    pub fn persist_registry(&mut self) -> anyhow::Result<()> {
        match self.registry_store.save(&self.species_registry) {
            Ok(()) => {
                self.last_persistence_error = None;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to persist species registry");
                self.last_persistence_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Current error-recovery status: absorbed inconsistency count and the
    /// last registry persistence failure, if any.
    #[must_use]
    pub fn status(&self) -> WorldStatus {
        WorldStatus {
            inconsistency_count: self.inconsistency_count,
            last_persistence_error: self.last_persistence_error.clone(),
        }
    }

    /// Logs and counts an absorbed per-tick inconsistency instead of
    /// returning it through the tick boundary.
    fn note_inconsistency(&mut self, detail: impl Into<String>) {
        let err = SimError::internal_inconsistency(self.tick_index, detail);
        tracing::warn!(error = %err, "absorbed internal inconsistency");
        self.inconsistency_count += 1;
    }

    /// Increments and returns this species' running count of
    /// registry-affecting events (founding, population updates, deaths),
    /// the basis for the milestone significance gate.
    fn bump_species_events(&mut self, species_id: Uuid) -> u32 {
        let count = self.species_event_counts.entry(species_id).or_insert(0);
        *count += 1;
        *count
    }

    fn random_land_position(&mut self) -> Position {
        for _ in 0..64 {
            let x = self.rng.gen_range(0..self.width);
            let y = self.rng.gen_range(0..self.height);
            let cell = &self.cells[cell_index(self.width, x, y)];
            if !cell.biome.is_water() {
                return Position {
                    x: f64::from(x) * f64::from(self.config.world.cell_size),
                    y: f64::from(y) * f64::from(self.config.world.cell_size),
                };
            }
        }
        Position::default()
    }

    /// Seeds the initial population: one founding species per organism
    /// type present in `type_weights` (or `config.world.organism_ratios`
    /// if `None`), each organism a fresh random genome.
    pub fn spawn_random_organisms(&mut self, count: u32, type_weights: Option<[f32; 5]>) {
        let weights = type_weights.unwrap_or_else(|| self.config.normalized_organism_ratios());
        let mut founding_species: HashMap<OrganismType, Uuid> = HashMap::new();

        for _ in 0..count {
            let draw: f32 = self.rng.gen();
            let organism_type = organism_type_from_ratio(&weights, draw);
            let species_id = *founding_species
                .entry(organism_type)
                .or_insert_with(Uuid::new_v4);

            let genome = Genome::random_genome(&mut self.rng);
            let phenotype = genome.derive_phenotype();
            let position = self.random_land_position();

            let organism = Organism {
                id: Uuid::new_v4(),
                species_id,
                taxonomy_id: Uuid::nil(),
                position,
                velocity: Velocity::default(),
                organism_type,
                genome,
                phenotype,
                generation: 0,
                parent_ids: Vec::new(),
                age: 0.0,
                health: 100.0,
                energy: phenotype.energy_capacity * 0.8,
                hydration: 100.0,
                waste: 0.0,
                maturity: 1.0,
                is_alive: true,
                reproduction_cooldown: 0.0,
                offspring_count: 0,
                developmental_stage: primordium_data::DevelopmentalStage::Adult,
                adaptation_score: 0.5,
                advanced: None,
            };
            self.add_organism(organism, None, DivergenceRank::Phylum);
        }
    }

    /// Registers `organism` with the species/taxonomy ledgers (building a
    /// fresh taxonomy the first time a species id is seen) and inserts it
    /// into the organism map and spatial grid.
    pub fn add_organism(
        &mut self,
        mut organism: Organism,
        parent_species_id: Option<Uuid>,
        rank: DivergenceRank,
    ) -> Uuid {
        if self.organisms.len() as u32 >= self.config.world.max_organisms {
            self.cull_weakest(1);
        }

        let already_known = self.species_registry.get(organism.species_id).is_some();
        if !already_known {
            let parent_taxonomy = parent_species_id
                .and_then(|p| self.species_taxonomy.get(&p))
                .and_then(|tid| self.taxonomies.get(tid))
                .cloned();
            let built = taxonomy::build_taxonomy(
                organism.organism_type,
                parent_taxonomy.as_ref(),
                rank,
                &mut self.rng,
            );
            organism.taxonomy_id = built.taxonomy_id;
            let scientific_name = built.scientific_name();
            let common_name = format!(
                "{:?} {}",
                organism.organism_type,
                &organism.species_id.to_string()[..6]
            );
            self.species_taxonomy.insert(organism.species_id, built.taxonomy_id);
            self.taxonomies.insert(built.taxonomy_id, built);

            let now = Utc::now();
            self.species_registry.register(
                organism.species_id,
                organism.organism_type,
                parent_species_id,
                scientific_name,
                common_name,
                1,
                now,
                &mut self.rng,
            );
            self.bump_species_events(organism.species_id);

            if let Some(parent_id) = parent_species_id {
                self.milestones.push(Milestone::Speciation {
                    tick: self.tick_index,
                    parent_species_id: parent_id,
                    new_species_id: organism.species_id,
                    organism_id: organism.id,
                });
                self.speciation_events += 1;
            }
        } else {
            if let Some(taxonomy_id) = self.species_taxonomy.get(&organism.species_id) {
                organism.taxonomy_id = *taxonomy_id;
            }
            let existing = self
                .species_registry
                .get(organism.species_id)
                .map(|r| r.population_count)
                .unwrap_or(0);
            self.species_registry
                .update(organism.species_id, existing + 1, organism.generation, Utc::now());
            self.bump_species_events(organism.species_id);
        }

        self.spatial_grid.add(organism.id, organism.position);
        let id = organism.id;
        self.organisms.insert(id, organism);
        id
    }

    fn active_cells(&self) -> HashSet<(u32, u32)> {
        const CAP: usize = 20_000;
        let mut active = HashSet::new();
        for organism in self.organisms.values() {
            if !organism.is_alive {
                continue;
            }
            let cx = ((organism.position.x / f64::from(self.config.world.cell_size)) as i64)
                .clamp(0, i64::from(self.width) - 1) as u32;
            let cy = ((organism.position.y / f64::from(self.config.world.cell_size)) as i64)
                .clamp(0, i64::from(self.height) - 1) as u32;
            active.insert((cx, cy));
            for neighbor in neighbor_coords(self.width, self.height, cx, cy) {
                active.insert(neighbor);
                if active.len() >= CAP {
                    return active;
                }
            }
        }
        active
    }

    fn biome_adaptation(&mut self, organism: &Organism, cell: &WorldCell) -> f32 {
        let key = (organism.id, (cell.x, cell.y));
        if let Some(cached) = self.biome_adaptation_cache.get(&key) {
            return *cached;
        }

        let base = biome_adaptation_base(organism.organism_type, cell.biome);
        let generation_bonus = (organism.generation as f32 / 50.0).clamp(0.0, 0.2);
        let temp_term = (1.0
            - (cell.temperature - organism.phenotype.optimal_temperature).abs()
                / organism.phenotype.temperature_range.max(1.0))
        .clamp(0.0, 1.0);
        let resource = resource_term(organism.organism_type, cell);

        let score = (base * 0.5 + generation_bonus + temp_term * 0.3 + resource * 0.2).clamp(0.2, 1.0);
        self.biome_adaptation_cache.insert(key, score);
        score
    }

    /// Advances the whole simulation by one step of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.tick_index += 1;

        // 1-3: day/year/season/weather/disasters/global temperature.
        let mut milestones = std::mem::take(&mut self.milestones);
        self.climate.tick(dt, self.tick_index, &mut self.rng, &mut milestones);
        self.milestones = milestones;

        if self
            .milestones
            .last()
            .map(|m| matches!(m, Milestone::SeasonChange { .. }))
            .unwrap_or(false)
        {
            self.apply_seasonal_resource_multipliers();
        }

        // 4: active disaster effects.
        self.apply_disaster_effects();

        // 6: resource update over the active-cell set.
        self.update_active_cells(dt);

        // 7: LOD selection.
        let population = self.organisms.len();
        let ratio = update_ratio(population);
        let selected_ids = self.select_organism_subset(ratio);

        // 8: periodic spatial grid rebuild.
        if self.tick_index % rebuild_interval(population) == 0 {
            let snapshot: Vec<(Uuid, Position)> =
                self.organisms.values().map(|o| (o.id, o.position)).collect();
            self.spatial_grid.rebuild(snapshot.into_iter());
        }
        if self.tick_index % 200 == 0 {
            self.biome_adaptation_cache.clear();
            self.predator_prey_cache.purge();
        }
        if self.tick_index % 50 == 0 {
            self.recompute_predator_prey_ratios();
        }

        // 9: per-organism update, reproduction, predation.
        self.update_organisms(&selected_ids, dt);

        // 10: population cap enforcement.
        self.enforce_population_cap();

        // 11: periodic stats.
        let interval = stats_interval(self.organisms.len());
        if self.tick_index % interval == 0 {
            self.recompute_species_stats();
        }
        if self.tick_index % (interval * 10) == 0 {
            self.recompute_evolutionary_stats();
        }

        if self.milestones.len() > 10_000 {
            let overflow = self.milestones.len() - 10_000;
            self.milestones.drain(0..overflow);
        }
    }

    fn apply_seasonal_resource_multipliers(&mut self) {
        let multiplier = self.climate.season.food_multiplier();
        for cell in &mut self.cells {
            cell.add_resource(Resource::OrganicMatter, cell.resource(Resource::OrganicMatter) * (multiplier - 1.0) * 0.1);
        }
    }

    fn apply_disaster_effects(&mut self) {
        let disasters = self.climate.disasters.clone();
        for disaster in disasters {
            let (temp_delta, humidity_delta, resource_mult) = Climate::disaster_effect(disaster.kind);
            let radius = disaster.radius;
            let (cx, cy) = (disaster.center_x, disaster.center_y);
            for y in 0..self.height {
                for x in 0..self.width {
                    let dx = x as f32 - cx as f32;
                    let dy = y as f32 - cy as f32;
                    if (dx * dx + dy * dy).sqrt() > radius {
                        continue;
                    }
                    let cell = &mut self.cells[cell_index(self.width, x, y)];
                    cell.temperature += temp_delta;
                    cell.humidity = (cell.humidity + humidity_delta).clamp(0.0, 1.0);
                    for r in Resource::ALL {
                        cell.set_resource(r, cell.resource(r) * resource_mult);
                    }
                }
            }
        }
    }

    fn update_active_cells(&mut self, dt: f32) {
        let active = self.active_cells();
        let light = self.climate.light_level();
        let cloud_factor = 1.0 - self.climate.weather.cloud_cover * 0.5;
        let season_factor = self.climate.season.food_multiplier() / 1.5;

        let sunlight = 10.0 * light * cloud_factor * season_factor;
        let height = self.height;
        let width = self.width;
        let climate_temperature = self.config.climate.temperature;
        let updates: Vec<(usize, f32, f32)> = active
            .par_iter()
            .map(|&(x, y)| {
                let idx = cell_index(width, x, y);
                let latitude = ((y as f64 / safe_denom_f64(f64::from(height)) - 0.5).abs()) * 2.0;
                let day_night_term = (light - 0.5) * 8.0;
                let temperature = (30.0 - latitude as f32 * 45.0) * climate_temperature + day_night_term;
                (idx, sunlight, temperature)
            })
            .collect();
        for (idx, sunlight, temperature) in updates {
            self.cells[idx].set_resource(Resource::Sunlight, sunlight);
            self.cells[idx].temperature = temperature;
        }

        for &(x, y) in &active {
            let neighbors = neighbor_coords(self.width, self.height, x, y);
            let water_neighbors = neighbors
                .iter()
                .filter(|(nx, ny)| self.cells[cell_index(self.width, *nx, *ny)].biome.is_water())
                .count() as u32;

            for (nx, ny) in &neighbors {
                let neighbor = self.cells[cell_index(self.width, *nx, *ny)];
                let idx = cell_index(self.width, x, y);
                cell_dynamics::diffuse_step(&mut self.cells[idx], &neighbor, dt);
            }
            let idx = cell_index(self.width, x, y);
            cell_dynamics::regenerate(&mut self.cells[idx], water_neighbors, dt, &mut self.rng);
        }
    }

    fn select_organism_subset(&mut self, ratio: f32) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.organisms.keys().copied().collect();
        if ratio >= 1.0 {
            return ids;
        }
        let take = ((ids.len() as f32) * ratio).round() as usize;
        ids.shuffle(&mut self.rng);
        ids.truncate(take);
        ids
    }

    fn update_organisms(&mut self, selected_ids: &[Uuid], dt: f32) {
        let reproduction_budget = reproduction_limit(self.organisms.len());
        let mut reproductions_used = 0u32;
        let mut newborns: Vec<(Organism, Option<Uuid>, DivergenceRank)> = Vec::new();
        let mut decomposed: Vec<Uuid> = Vec::new();
        let mut died: Vec<(Uuid, Uuid)> = Vec::new();

        for &id in selected_ids {
            let Some(mut organism) = self.organisms.remove(&id) else { continue };

            if !organism.is_alive {
                let idx_opt = self.cell_index_for(organism.position);
                let fully_decomposed = if let Some(idx) = idx_opt {
                    organism.decompose_tick(&mut self.cells[idx], dt, &mut self.rng)
                } else {
                    true
                };
                if fully_decomposed {
                    self.spatial_grid.remove(id);
                    decomposed.push(id);
                } else {
                    self.organisms.insert(id, organism);
                }
                continue;
            }

            self.spatial_grid.update_position(id, organism.position);
            if !self.spatial_grid.query_radius(organism.position, 0.0).contains(&id) {
                self.note_inconsistency(format!(
                    "organism {id} missing from its own spatial bucket after update_position"
                ));
            }

            let context = self.build_decision_context(&organism);
            let action = lifecycle::decide_action(&organism, &context);
            lifecycle::apply_action(&mut organism, action, &context, &mut self.rng);
            organism.tick_physiology(dt);

            if organism.is_alive {
                if let Some(idx) = self.cell_index_for(organism.position) {
                    organism.interact_with_cell(&mut self.cells[idx], dt);
                    let cell = self.cells[idx];
                    let adaptation = self.biome_adaptation(&organism, &cell);
                    organism.adaptation_score = adaptation;
                    apply_selection_pressure(&mut organism, adaptation, dt);

                    let local_population = self
                        .spatial_grid
                        .query_radius(organism.position, 20.0)
                        .into_iter()
                        .filter(|nid| {
                            self.organisms
                                .get(nid)
                                .map(|o| o.organism_type == organism.organism_type)
                                .unwrap_or(false)
                        })
                        .count();
                    apply_crowding_pressure(&mut organism, local_population, dt);

                    if action == Action::Reproduce && reproductions_used < reproduction_budget {
                        if let Some((child, parent_species_for_milestone, rank)) =
                            self.attempt_reproduction(&mut organism, idx, local_population)
                        {
                            newborns.push((child, parent_species_for_milestone, rank));
                            reproductions_used += 1;
                        }
                    }

                    self.attempt_predation(&mut organism, &mut died);
                }
            } else {
                died.push((id, organism.species_id));
            }

            self.organisms.insert(id, organism);
        }

        for (child, parent_species, rank) in newborns {
            self.add_organism(child, parent_species, rank);
        }
        let died_species: HashSet<Uuid> = died.iter().map(|(_, species_id)| *species_id).collect();
        for species_id in died_species {
            self.sync_species_population(species_id);
        }
        let _ = decomposed;
    }

    /// Recomputes `species_id`'s live population and peak generation from
    /// the current organism map and pushes it to the registry, marking the
    /// record extinct the instant the count reaches zero. Extinction is
    /// counted and milestoned immediately rather than waiting for the next
    /// periodic stats recompute.
    fn sync_species_population(&mut self, species_id: Uuid) {
        let mut count = 0u64;
        let mut max_generation = 0u32;
        for organism in self.organisms.values() {
            if organism.species_id != species_id {
                continue;
            }
            max_generation = max_generation.max(organism.generation);
            if organism.is_alive {
                count += 1;
            }
        }
        self.species_registry.update(species_id, count, max_generation, Utc::now());
        let events = self.bump_species_events(species_id);

        let newly_extinct = self
            .species_registry
            .get(species_id)
            .map(|r| r.extinct)
            .unwrap_or(false);
        if newly_extinct && self.logged_extinctions.insert(species_id) {
            self.extinction_count += 1;
            if events > 5 {
                self.milestones.push(Milestone::Extinction {
                    tick: self.tick_index,
                    species_id,
                });
            }
        }
    }

    fn cell_index_for(&self, position: Position) -> Option<usize> {
        let cell_size = f64::from(self.config.world.cell_size.max(1));
        let x = (position.x / cell_size) as i64;
        let y = (position.y / cell_size) as i64;
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(cell_index(self.width, x as u32, y as u32))
    }

    fn build_decision_context(&self, organism: &Organism) -> DecisionContext {
        let vision = f64::from(organism.phenotype.vision_range);
        let nearby_ids = self.spatial_grid.query_radius(organism.position, vision);

        let mut nearby_water_cells = Vec::new();
        let mut nearby_food_cells = Vec::new();
        if let Some(idx) = self.cell_index_for(organism.position) {
            let x = self.cells[idx].x;
            let y = self.cells[idx].y;
            for (nx, ny) in neighbor_coords(self.width, self.height, x, y) {
                let cell = &self.cells[cell_index(self.width, nx, ny)];
                let position = Position {
                    x: f64::from(nx) * f64::from(self.config.world.cell_size),
                    y: f64::from(ny) * f64::from(self.config.world.cell_size),
                };
                if cell.resource(Resource::Water) > 1.0 {
                    nearby_water_cells.push(NearbyCell { position, resource_value: cell.resource(Resource::Water) });
                }
                let food_value = if organism.organism_type.is_photosynthetic() {
                    cell.resource(Resource::Sunlight).min(cell.resource(Resource::Water))
                } else {
                    cell.resource(Resource::OrganicMatter)
                };
                if food_value > 1.0 {
                    nearby_food_cells.push(NearbyCell { position, resource_value: food_value });
                }
            }
        }

        let mut nearby_predators = Vec::new();
        let mut nearby_prey = Vec::new();
        for nid in nearby_ids {
            if nid == organism.id {
                continue;
            }
            if let Some(other) = self.organisms.get(&nid) {
                if !other.is_alive {
                    continue;
                }
                let entry = NearbyOrganism {
                    id: other.id,
                    position: other.position,
                    organism_type: other.organism_type,
                    size: other.phenotype.size,
                    health: other.health,
                };
                if other.organism_type.is_predator() && other.organism_type != organism.organism_type {
                    nearby_predators.push(entry);
                } else if organism.organism_type.is_predator() && !other.organism_type.is_predator() {
                    nearby_prey.push(entry);
                }
            }
        }

        DecisionContext {
            nearby_water_cells,
            nearby_food_cells,
            nearby_predators,
            nearby_prey,
            world_width: f64::from(self.width) * f64::from(self.config.world.cell_size),
            world_height: f64::from(self.height) * f64::from(self.config.world.cell_size),
        }
    }

    /// Attempts reproduction for `organism` (already removed from
    /// `self.organisms` by the caller). Returns the new offspring plus the
    /// parent species id to attribute a speciation milestone to, and the
    /// divergence rank to register it at, if the attempt succeeds.
    fn attempt_reproduction(
        &mut self,
        organism: &mut Organism,
        cell_idx: usize,
        local_population: usize,
    ) -> Option<(Organism, Option<Uuid>, DivergenceRank)> {
        if !organism.ready_to_mate() {
            return None;
        }

        let partner_id = self
            .spatial_grid
            .query_radius(organism.position, f64::from(organism.phenotype.vision_range))
            .into_iter()
            .filter(|id| *id != organism.id)
            .find(|id| {
                self.organisms
                    .get(id)
                    .map(|o| o.organism_type == organism.organism_type && o.ready_to_mate())
                    .unwrap_or(false)
            });
        let partner = partner_id.and_then(|id| self.organisms.get(&id).cloned());

        let cell = self.cells[cell_idx];
        let population_factor = (self.organisms.len() as f32
            / safe_denom(self.config.world.max_organisms as f32))
        .clamp(0.0, 1.0);
        let context = build_reproduction_context(
            organism,
            &cell,
            local_population,
            &self.config.simulation,
            population_factor,
        );

        let is_hybrid = partner.as_ref().map(|p| p.species_id != organism.species_id).unwrap_or(false);
        let same_species = partner.as_ref().map(|p| p.species_id == organism.species_id).unwrap_or(true);

        let child_genome = match organism.organism_type {
            OrganismType::Unicellular => {
                if let Some(partner) = &partner {
                    Some(reproduction::bacterial_conjugation(&organism.genome, &partner.genome, &mut self.rng))
                } else {
                    Some(reproduction::asexual_division(&organism.genome, &mut self.rng))
                }
            }
            OrganismType::Plant => {
                if let Some(partner) = &partner {
                    let similarity = reproduction::genetic_similarity(organism, partner, same_species);
                    reproduction::cross_pollination(organism, partner, similarity, &context, &mut self.rng)
                } else {
                    let (genome, _inbreeding) = reproduction::self_pollination(&organism.genome, &mut self.rng);
                    Some(genome)
                }
            }
            OrganismType::Herbivore | OrganismType::Carnivore | OrganismType::Omnivore => {
                let partner = partner.as_ref()?;
                let similarity = reproduction::genetic_similarity(organism, partner, same_species);
                reproduction::cross_pollination(organism, partner, similarity, &context, &mut self.rng)
            }
        }?;

        let mut significance = reproduction::compare_genomes(&organism.genome, &child_genome);
        if let Some(record) = self.species_registry.get_mut(organism.species_id) {
            record.add_mutations(significance.mutation_count);
        }
        let mut speciation_probability =
            reproduction::speciation_probability(significance, &context, organism.generation);
        if is_hybrid {
            speciation_probability = (speciation_probability + 0.2).clamp(0.0, 0.8);
            significance.significance = (significance.significance + 0.1).min(1.0);
        }
        let speciates = self.rng.gen_bool(f64::from(speciation_probability));

        let child_species_id = if speciates {
            Uuid::new_v4()
        } else if is_hybrid {
            let partner = partner.as_ref().expect("hybrid implies partner present");
            if reproduction::dominance_score(organism) >= reproduction::dominance_score(partner) {
                organism.species_id
            } else {
                partner.species_id
            }
        } else {
            organism.species_id
        };

        let rank = taxonomy::decide_rank(significance.mutation_count, significance.significance);
        let phenotype = child_genome.derive_phenotype();

        let trait_shifts = count_trait_shifts(&organism.phenotype, &phenotype);
        if trait_shifts > 3 {
            if let Some(record) = self.species_registry.get_mut(child_species_id) {
                record.add_notable_adaptation(format!("{trait_shifts} concurrent trait shifts"));
            }
            self.milestones.push(Milestone::Adaptation {
                tick: self.tick_index,
                species_id: child_species_id,
                trait_shifts,
            });
        }

        let mut parent_ids = vec![organism.id];
        if let Some(partner) = &partner {
            parent_ids.push(partner.id);
        }

        let child_position = if organism.organism_type == OrganismType::Plant {
            let dispersal = reproduction::draw_seed_dispersal(&mut self.rng);
            disperse_seed(
                organism.position,
                dispersal,
                f64::from(self.width) * f64::from(self.config.world.cell_size),
                f64::from(self.height) * f64::from(self.config.world.cell_size),
                &mut self.rng,
            )
        } else {
            organism.position
        };

        let child = Organism {
            id: Uuid::new_v4(),
            species_id: child_species_id,
            taxonomy_id: Uuid::nil(),
            position: child_position,
            velocity: Velocity::default(),
            organism_type: organism.organism_type,
            genome: child_genome,
            phenotype,
            generation: organism.generation + 1,
            parent_ids,
            age: 0.0,
            health: 100.0,
            energy: phenotype.energy_capacity * 0.6,
            hydration: 80.0,
            waste: 0.0,
            maturity: 0.0,
            is_alive: true,
            reproduction_cooldown: 0.0,
            offspring_count: 0,
            developmental_stage: primordium_data::DevelopmentalStage::Zygote,
            adaptation_score: 0.5,
            advanced: None,
        };

        organism.energy -= organism.phenotype.energy_capacity * 0.3;
        organism.reproduction_cooldown = organism.phenotype.maturation_time * 0.2;
        organism.offspring_count += 1;

        let parent_species_for_milestone = speciates.then_some(organism.species_id);
        Some((child, parent_species_for_milestone, rank))
    }

    fn attempt_predation(&mut self, organism: &mut Organism, died: &mut Vec<(Uuid, Uuid)>) {
        if !organism.organism_type.is_predator() {
            return;
        }

        let nearby = self.spatial_grid.query_radius(organism.position, 2.0);
        for target_id in nearby {
            if target_id == organism.id {
                continue;
            }
            let Some(mut target) = self.organisms.remove(&target_id) else { continue };
            if !target.is_alive || target.organism_type.is_predator() {
                self.organisms.insert(target_id, target);
                continue;
            }

            let distance = ((organism.position.x - target.position.x).powi(2)
                + (organism.position.y - target.position.y).powi(2))
            .sqrt();
            if distance > 2.0 {
                self.organisms.insert(target_id, target);
                continue;
            }

            let probability = self
                .predator_prey_cache
                .attempt_probability(organism.species_id, target.species_id);
            if self.rng.gen_bool(f64::from(probability)) {
                let outcome = interaction::resolve_attack(organism, &target);
                interaction::apply_attack(organism, &mut target, outcome);
                if matches!(outcome, AttackOutcome::Killed { .. }) {
                    died.push((target_id, target.species_id));
                }
            } else {
                target.health = (target.health + 0.05).min(100.0);
            }

            self.organisms.insert(target_id, target);
        }
    }

    fn enforce_population_cap(&mut self) {
        let max = self.config.world.max_organisms as usize;
        if self.organisms.len() <= max {
            return;
        }
        let overflow = self.organisms.len() - max;
        self.cull_weakest(overflow);
    }

    fn cull_weakest(&mut self, count: usize) {
        let mut ids: Vec<(Uuid, f32)> = self
            .organisms
            .values()
            .map(|o| (o.id, o.adaptation_score))
            .collect();
        ids.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (id, _) in ids.into_iter().take(count) {
            self.organisms.remove(&id);
            self.spatial_grid.remove(id);
        }
    }

    fn recompute_species_stats(&mut self) {
        let mut population_by_type: HashMap<OrganismType, u64> = HashMap::new();
        for organism in self.organisms.values() {
            if organism.is_alive {
                *population_by_type.entry(organism.organism_type).or_insert(0) += 1;
            }
        }
        let living = self.species_registry.list(SpeciesFilter::Living).len() as u32;
        let extinct_records = self.species_registry.list(SpeciesFilter::Extinct);
        let extinct = extinct_records.len() as u32;
        for record in &extinct_records {
            if self.logged_extinctions.insert(record.species_id) {
                let events = self
                    .species_event_counts
                    .get(&record.species_id)
                    .copied()
                    .unwrap_or(0);
                if events > 5 {
                    self.milestones.push(Milestone::Extinction {
                        tick: self.tick_index,
                        species_id: record.species_id,
                    });
                }
            }
        }
        self.extinction_count = u64::from(extinct);

        self.species_stats = SpeciesStats {
            living_species: living,
            extinct_species: extinct,
            living_organisms: population_by_type.values().sum(),
            population_by_type,
        };
    }

    /// Refreshes the predator/prey ratio cache from current species
    /// populations, so [`PredatorPreyRatioCache::attempt_probability`]
    /// throttles predation once a prey species grows scarce.
    fn recompute_predator_prey_ratios(&mut self) {
        let living = self.species_registry.list(SpeciesFilter::Living);
        let predators: Vec<_> = living.iter().filter(|r| r.organism_type.is_predator()).collect();
        let prey: Vec<_> = living.iter().filter(|r| !r.organism_type.is_predator()).collect();

        for predator in &predators {
            for prey_record in &prey {
                let ratio =
                    prey_record.population_count as f32 / safe_denom(predator.population_count as f32);
                self.predator_prey_cache.set(predator.species_id, prey_record.species_id, ratio);
            }
        }
    }

    fn recompute_evolutionary_stats(&mut self) {
        let mut dominant: HashMap<OrganismType, (Uuid, u64)> = HashMap::new();
        for record in self.species_registry.list(SpeciesFilter::Living) {
            let entry = dominant.entry(record.organism_type).or_insert((record.species_id, 0));
            if record.population_count > entry.1 {
                *entry = (record.species_id, record.population_count);
            }
        }

        let mut adaptation_sums: HashMap<Biome, (f32, u32)> = HashMap::new();
        for organism in self.organisms.values() {
            if let Some(idx) = self.cell_index_for(organism.position) {
                let biome = self.cells[idx].biome;
                let entry = adaptation_sums.entry(biome).or_insert((0.0, 0));
                entry.0 += organism.adaptation_score;
                entry.1 += 1;
            }
        }

        self.evolutionary_stats = EvolutionaryStats {
            dominant_species_per_type: dominant.into_iter().map(|(k, (id, _))| (k, id)).collect(),
            mean_adaptation_per_biome: adaptation_sums
                .into_iter()
                .map(|(biome, (sum, count))| (biome, sum / count.max(1) as f32))
                .collect(),
        };
    }

    // --- Embedding interface -------------------------------------------------

    #[must_use]
    pub fn cells_in_rect(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<&WorldCell> {
        let mut out = Vec::new();
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                out.push(&self.cells[cell_index(self.width, x, y)]);
            }
        }
        out
    }

    #[must_use]
    pub fn organisms_in_radius(&self, center: Position, radius: f64) -> Vec<&Organism> {
        self.spatial_grid
            .query_radius(center, radius)
            .into_iter()
            .filter_map(|id| self.organisms.get(&id))
            .collect()
    }

    #[must_use]
    pub fn organism(&self, id: Uuid) -> Option<&Organism> {
        self.organisms.get(&id)
    }

    #[must_use]
    pub fn evolutionary_milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    #[must_use]
    pub fn living_population(&self) -> usize {
        self.organisms.values().filter(|o| o.is_alive).count()
    }
}

fn apply_selection_pressure(organism: &mut Organism, adaptation: f32, dt: f32) {
    if adaptation < 0.2 {
        organism.health = (organism.health - (0.2 - adaptation) * 5.0 * dt).max(0.0);
    } else if adaptation > 0.7 {
        organism.health = (organism.health + (adaptation - 0.7) * 2.0 * dt).min(100.0);
    }
}

fn apply_crowding_pressure(organism: &mut Organism, same_type_nearby: usize, dt: f32) {
    if same_type_nearby > 15 {
        let excess = (same_type_nearby - 15) as f32;
        organism.energy = (organism.energy - (excess / 15.0) * dt).max(0.0);
    } else if same_type_nearby < 5 && organism.energy < 0.8 * organism.phenotype.energy_capacity {
        organism.energy = (organism.energy + 0.5 * dt).min(organism.phenotype.energy_capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn small_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.world.width = 12;
        config.world.height = 12;
        config.world.cell_size = 10;
        config.world.initial_organism_count = 20;
        config.world.max_organisms = 200;
        config.seed = Some(123);
        config
    }

    #[test]
    fn new_world_has_the_configured_grid_size() {
        let world = World::new(small_config()).expect("valid config");
        assert_eq!(world.cells.len(), 144);
    }

    #[test]
    fn spawning_organisms_registers_their_species() {
        let mut world = World::new(small_config()).expect("valid config");
        world.spawn_random_organisms(20, None);
        assert_eq!(world.organisms.len(), 20);
        assert!(world.species_registry.len() >= 1);
        assert!(world.species_registry.len() <= 5);
    }

    #[test]
    fn ticking_advances_the_clock_without_panicking() {
        let mut world = World::new(small_config()).expect("valid config");
        world.spawn_random_organisms(20, None);
        for _ in 0..10 {
            world.tick(1.0);
        }
        assert_eq!(world.tick_index, 10);
    }

    #[test]
    fn update_ratio_schedule_matches_table() {
        assert_eq!(update_ratio(100), 1.0);
        assert_eq!(update_ratio(7_000), 0.5);
        assert_eq!(update_ratio(12_000), 0.25);
        assert_eq!(update_ratio(20_000), 0.1);
    }

    #[test]
    fn reproduction_limit_is_clamped() {
        assert_eq!(reproduction_limit(0), 100);
        assert!(reproduction_limit(1_000_000) >= 10);
        assert!(reproduction_limit(1) <= 100);
    }
}
