//! Primordium: a deterministic, seeded artificial-life simulation.
//!
//! This crate is a thin re-export of [`primordium_core`], the embedding
//! surface an external caller actually needs: build a [`World`], seed its
//! population, and drive it tick by tick.

pub use primordium_core::config::AppConfig;
pub use primordium_core::world::World;
pub use primordium_core::{Result, SimError};
