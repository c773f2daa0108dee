//! # Primordium Core
//!
//! The core simulation engine for Primordium — a deterministic, seeded
//! artificial-life simulation of procedurally evolving organisms on a
//! biome/resource grid.
//!
//! This crate contains the simulation logic, including:
//! - A genome/phenotype model with mutation, recombination, and
//!   speciation decisions
//! - Organism physiology, decision-making, and predation
//! - A procedurally generated world grid with climate, weather, and
//!   disasters
//! - Spatial indexing and a species/taxonomy ledger
//!
//! ## Architecture
//!
//! Data types (`Organism`, `Genome`, `WorldCell`, ...) live in
//! `primordium_data`; this crate adds behavior to them via extension
//! traits (`GenomeOps`, `PhenotypeOps`, `OrganismOps`, ...) since Rust's
//! orphan rule forbids implementing foreign traits on foreign types
//! directly. [`world::World`] is the top-level orchestrator that owns
//! every subsystem and drives the per-tick sequence.
//!
//! ## Example
//!
//! ```ignore
//! use primordium_core::config::AppConfig;
//! use primordium_core::world::World;
//!
//! let mut world = World::new(AppConfig::default())?;
//! world.spawn_random_organisms(200, None);
//! for _ in 0..100 {
//!     world.tick(1.0);
//! }
//! # Ok::<(), primordium_core::error::SimError>(())
//! ```

/// Cell resource diffusion, regeneration, and decomposition.
pub mod cell_dynamics;
/// Global day/year cycles, seasonal drift, weather, and disasters.
pub mod climate;
/// Layered, validated configuration for world construction.
pub mod config;
/// The simulation's error type and numeric-safety helpers.
pub mod error;
/// The heritable genome model: mutation, recombination, and hex encoding.
pub mod genetics;
/// Predation: attack resolution and the predator/prey ratio cache.
pub mod interaction;
/// Per-tick organism physiology, decision-making, and decomposition.
pub mod lifecycle;
/// Derivation of a phenotype from a genome.
pub mod phenotype_derivation;
/// The five reproduction paths, genetic similarity, and speciation.
pub mod reproduction;
/// Grid-bucketed spatial index over organism positions.
pub mod spatial_grid;
/// The process-wide species ledger.
pub mod species_registry;
/// Stateless taxonomic classification.
pub mod taxonomy;
/// The top-level simulation: grid, population, and the tick sequence.
pub mod world;
/// Procedural world generation (continents, biomes, rivers).
pub mod worldgen;

pub use config::AppConfig;
pub use error::{Result, SimError};
pub use world::World;
