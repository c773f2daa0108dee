//! # Primordium IO
//!
//! I/O layer for the Primordium simulation.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - JSON and HexDNA serialization helpers
//! - An atomic, file-backed [`species_registry::RegistryStore`] implementation
//! - Species phylogeny export to Graphviz DOT
//!
//! ## Error Handling
//!
//! All operations return `Result<T, IoError>` for explicit error handling:
//!
//! ```ignore
//! use primordium_io::{IoError, Result};
//! use primordium_io::registry::FileRegistryStore;
//! use primordium_core::species_registry::RegistryStore;
//!
//! fn load_registry(path: &str) -> Result<()> {
//!     let store = FileRegistryStore::new(path);
//!     store.load().map_err(|e| IoError::not_found(path).with_context(e.to_string()))?;
//!     Ok(())
//! }
//! ```
//!
//! [`species_registry::RegistryStore`]: primordium_core::species_registry::RegistryStore

/// Error types for I/O operations
pub mod error;
/// Species phylogeny graph construction and Graphviz export
pub mod lineage;
/// Atomic, file-backed species registry persistence
pub mod registry;
/// JSON and HexDNA serialization helpers
pub mod serialization;

pub use error::{IoError, Result};
pub use registry::FileRegistryStore;
pub use serialization::{
    from_hex_dna, from_json, is_valid_hex_dna, read_json_file, to_hex_dna, to_json, to_json_pretty,
    validate_json, write_json_file,
};
