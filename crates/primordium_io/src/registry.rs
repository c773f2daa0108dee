//! A file-backed [`RegistryStore`] for [`SpeciesRegistry`], persisting the
//! species ledger as pretty-printed JSON with an atomic rename.

use anyhow::Result;
use primordium_core::species_registry::{RegistryStore, SpeciesRegistry};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

/// Saves and loads a [`SpeciesRegistry`] at a fixed path on disk.
pub struct FileRegistryStore {
    path: PathBuf,
}

impl FileRegistryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegistryStore for FileRegistryStore {
    /// Atomically saves the registry to disk via a temporary file and rename.
    fn save(&self, registry: &SpeciesRegistry) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, registry)?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Loads the registry from disk, returning a default (empty) registry if
    /// the file doesn't exist yet.
    fn load(&self) -> Result<SpeciesRegistry> {
        if !self.path.exists() {
            return Ok(SpeciesRegistry::default());
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let registry = serde_json::from_reader(reader)?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use uuid::Uuid;

    #[test]
    fn missing_file_loads_a_default_registry() {
        let store = FileRegistryStore::new("/tmp/primordium-registry-does-not-exist.json");
        let registry = store.load().expect("load should not error");
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn round_trips_through_a_temporary_file() {
        let path = std::env::temp_dir().join(format!("primordium-registry-{}.json", Uuid::new_v4()));
        let store = FileRegistryStore::new(&path);

        let mut registry = SpeciesRegistry::default();
        let mut rng = rand_chacha::ChaCha8Rng::from_entropy();
        registry.register(
            Uuid::new_v4(),
            primordium_data::OrganismType::Plant,
            None,
            "Testus plantus".to_string(),
            "test plant".to_string(),
            1,
            chrono::Utc::now(),
            &mut rng,
        );

        store.save(&registry).expect("save should succeed");
        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded.len(), registry.len());

        std::fs::remove_file(&path).ok();
    }
}
