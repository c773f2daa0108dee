use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    DeepOcean,
    Ocean,
    ShallowWater,
    CoralReef,
    Beach,
    Grassland,
    Savanna,
    Forest,
    Rainforest,
    Swamp,
    Mountain,
    MountainForest,
    Desert,
    DesertHills,
    Tundra,
    Ice,
    Volcanic,
    River,
    Lake,
}

impl Biome {
    pub const ALL: [Biome; 19] = [
        Biome::DeepOcean,
        Biome::Ocean,
        Biome::ShallowWater,
        Biome::CoralReef,
        Biome::Beach,
        Biome::Grassland,
        Biome::Savanna,
        Biome::Forest,
        Biome::Rainforest,
        Biome::Swamp,
        Biome::Mountain,
        Biome::MountainForest,
        Biome::Desert,
        Biome::DesertHills,
        Biome::Tundra,
        Biome::Ice,
        Biome::Volcanic,
        Biome::River,
        Biome::Lake,
    ];

    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(
            self,
            Biome::DeepOcean
                | Biome::Ocean
                | Biome::ShallowWater
                | Biome::CoralReef
                | Biome::River
                | Biome::Lake
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Sunlight,
    Water,
    Minerals,
    Oxygen,
    Co2,
    OrganicMatter,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Sunlight,
        Resource::Water,
        Resource::Minerals,
        Resource::Oxygen,
        Resource::Co2,
        Resource::OrganicMatter,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether this resource diffuses between neighboring cells each tick.
    #[must_use]
    pub fn diffuses(self) -> bool {
        !matches!(self, Resource::Sunlight)
    }
}

pub const RESOURCE_COUNT: usize = 6;

/// A single grid tile: biome, local climate, altitude, and a resource
/// vector with per-resource capacities.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WorldCell {
    pub x: u32,
    pub y: u32,
    pub biome: Biome,
    pub temperature: f32,
    pub humidity: f32,
    /// Normalized elevation in [-1, 1]; negative is below sea level.
    pub altitude: f32,
    pub resources: [f32; RESOURCE_COUNT],
    pub capacity: [f32; RESOURCE_COUNT],
    /// Soil/water stability accumulator used as an input to vegetation growth.
    pub stability: f32,
}

impl WorldCell {
    #[must_use]
    pub fn resource(&self, r: Resource) -> f32 {
        self.resources[r.index()]
    }

    pub fn set_resource(&mut self, r: Resource, value: f32) {
        let cap = self.capacity[r.index()];
        self.resources[r.index()] = value.clamp(0.0, cap.max(0.0));
    }

    pub fn add_resource(&mut self, r: Resource, delta: f32) {
        let current = self.resource(r);
        self.set_resource(r, current + delta);
    }
}
