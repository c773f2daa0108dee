//! Global day/year cycles, seasonal drift, and weather.
//!
//! Grounded on the teacher's `Environment`: a small set of cyclical scalars
//! advanced each tick, a `Season` enum with smooth-step interpolated
//! multipliers between neighboring seasons, and `tick()` as the single
//! entry point the owner calls once per step.

use primordium_data::Milestone;
use rand::Rng;

pub const DAY_LENGTH: f32 = 1200.0;
pub const YEAR_LENGTH: f32 = 43200.0;
pub const SEASONS_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        match index % SEASONS_COUNT {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Fall,
            _ => Season::Winter,
        }
    }

    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }

    #[must_use]
    pub fn food_multiplier(self) -> f32 {
        match self {
            Season::Spring => 1.5,
            Season::Summer => 1.0,
            Season::Fall => 1.2,
            Season::Winter => 0.5,
        }
    }

    #[must_use]
    pub fn metabolism_multiplier(self) -> f32 {
        match self {
            Season::Spring => 0.8,
            Season::Summer => 1.2,
            Season::Fall => 1.0,
            Season::Winter => 1.5,
        }
    }

    /// Target weather this season nudges precipitation/cloud_cover/wind
    /// toward.
    #[must_use]
    fn weather_targets(self) -> (f32, f32, f32) {
        match self {
            Season::Spring => (0.5, 0.5, 0.4),
            Season::Summer => (0.2, 0.3, 0.2),
            Season::Fall => (0.4, 0.6, 0.5),
            Season::Winter => (0.3, 0.7, 0.6),
        }
    }

    fn smooth_step(t: f32) -> f32 {
        t * t * (3.0 - 2.0 * t)
    }

    #[must_use]
    pub fn food_multiplier_smooth(self, next: Season, progress: f32) -> f32 {
        let t = Self::smooth_step(progress.clamp(0.0, 1.0));
        let from = self.food_multiplier();
        let to = next.food_multiplier();
        from + (to - from) * t
    }

    #[must_use]
    pub fn metabolism_multiplier_smooth(self, next: Season, progress: f32) -> f32 {
        let t = Self::smooth_step(progress.clamp(0.0, 1.0));
        let from = self.metabolism_multiplier();
        let to = next.metabolism_multiplier();
        from + (to - from) * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Day,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DisasterKind {
    Hurricane,
    Tornado,
    Drought,
    Flood,
    Blizzard,
    Heatwave,
}

impl DisasterKind {
    const ALL: [DisasterKind; 6] = [
        DisasterKind::Hurricane,
        DisasterKind::Tornado,
        DisasterKind::Drought,
        DisasterKind::Flood,
        DisasterKind::Blizzard,
        DisasterKind::Heatwave,
    ];

    fn name(self) -> &'static str {
        match self {
            DisasterKind::Hurricane => "hurricane",
            DisasterKind::Tornado => "tornado",
            DisasterKind::Drought => "drought",
            DisasterKind::Flood => "flood",
            DisasterKind::Blizzard => "blizzard",
            DisasterKind::Heatwave => "heatwave",
        }
    }

    /// Per-season relative likelihood multiplier, on top of the ~1e-4 base
    /// probability.
    fn season_weight(self, season: Season) -> f32 {
        match (self, season) {
            (DisasterKind::Hurricane, Season::Summer | Season::Fall) => 2.0,
            (DisasterKind::Drought, Season::Summer) => 2.5,
            (DisasterKind::Blizzard, Season::Winter) => 3.0,
            (DisasterKind::Heatwave, Season::Summer) => 2.0,
            (DisasterKind::Flood, Season::Spring) => 1.8,
            (DisasterKind::Tornado, Season::Spring | Season::Summer) => 1.5,
            _ => 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActiveDisaster {
    pub kind: DisasterKind,
    pub center_x: u32,
    pub center_y: u32,
    pub radius: f32,
    pub remaining_ticks: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weather {
    pub precipitation: f32,
    pub cloud_cover: f32,
    pub wind_speed: f32,
    pub wind_direction: f32,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            precipitation: 0.3,
            cloud_cover: 0.4,
            wind_speed: 0.3,
            wind_direction: 0.0,
        }
    }
}

/// Global day/year/season/weather state. Owned by [`crate::world::World`]
/// as a single field, bundling the cyclical scalars the specification
/// lists directly on `World`.
#[derive(Debug, Clone)]
pub struct Climate {
    pub day_night_cycle: f32,
    pub year_cycle: f32,
    pub season: Season,
    pub year: u32,
    pub day: u32,
    pub global_temperature: f32,
    pub weather: Weather,
    pub disasters: Vec<ActiveDisaster>,
    climate_cycle: f32,
    grid_width: u32,
    grid_height: u32,
}

impl Climate {
    #[must_use]
    pub fn new(grid_width: u32, grid_height: u32) -> Self {
        Self {
            day_night_cycle: 0.0,
            year_cycle: 0.0,
            season: Season::Spring,
            year: 0,
            day: 0,
            global_temperature: 15.0,
            weather: Weather::default(),
            disasters: Vec::new(),
            climate_cycle: 0.0,
            grid_width,
            grid_height,
        }
    }

    #[must_use]
    pub fn time_of_day(&self) -> TimeOfDay {
        if self.day_night_cycle < 0.5 {
            TimeOfDay::Day
        } else {
            TimeOfDay::Night
        }
    }

    /// 0 at deep night, 1 at noon.
    #[must_use]
    pub fn light_level(&self) -> f32 {
        (1.0 - (self.day_night_cycle * std::f32::consts::TAU).cos()) / 2.0
    }

    /// Advances every cyclical scalar and weather/disaster state by `dt`,
    /// pushing milestones for season changes and newly spawned disasters
    /// onto `milestones`.
    pub fn tick(&mut self, dt: f32, tick_index: u64, rng: &mut impl Rng, milestones: &mut Vec<Milestone>) {
        self.day_night_cycle += dt / DAY_LENGTH;
        if self.day_night_cycle >= 1.0 {
            self.day_night_cycle -= self.day_night_cycle.floor();
            self.day += 1;
        }

        self.year_cycle += dt / YEAR_LENGTH;
        if self.year_cycle >= 1.0 {
            self.year_cycle -= self.year_cycle.floor();
            self.year += 1;
        }
        let new_season = Season::from_index((self.year_cycle * SEASONS_COUNT as f32).floor() as u8);
        if new_season != self.season {
            milestones.push(Milestone::SeasonChange {
                tick: tick_index,
                year: self.year,
                from_season: self.season.index(),
                to_season: new_season.index(),
            });
            self.season = new_season;
        }

        self.update_weather(dt, rng);
        self.maybe_spawn_disaster(tick_index, rng, milestones);
        self.advance_disasters(dt);

        self.climate_cycle += dt / (YEAR_LENGTH * 11.0);
        let long_cycle = (self.climate_cycle * std::f32::consts::TAU).sin() * 3.0;
        let year_cycle_term = (self.year_cycle * std::f32::consts::TAU).sin() * 8.0;
        self.global_temperature = 15.0 + long_cycle + year_cycle_term;
    }

    fn update_weather(&mut self, dt: f32, rng: &mut impl Rng) {
        let (target_precip, target_cloud, target_wind) = self.season.weather_targets();
        let inertia = 0.95f32.powf(dt.max(0.0));
        self.weather.precipitation = self.weather.precipitation * inertia + target_precip * (1.0 - inertia);
        self.weather.cloud_cover = self.weather.cloud_cover * inertia + target_cloud * (1.0 - inertia);
        self.weather.wind_speed = self.weather.wind_speed * inertia + target_wind * (1.0 - inertia);
        self.weather.wind_direction = (self.weather.wind_direction + rng.gen_range(-0.1..0.1) * dt)
            .rem_euclid(std::f32::consts::TAU);
    }

    fn maybe_spawn_disaster(&mut self, tick_index: u64, rng: &mut impl Rng, milestones: &mut Vec<Milestone>) {
        const BASE_PROBABILITY: f32 = 1e-4;
        for kind in DisasterKind::ALL {
            let probability = BASE_PROBABILITY * kind.season_weight(self.season);
            if rng.gen_bool(probability.clamp(0.0, 1.0) as f64) {
                let center_x = rng.gen_range(0..self.grid_width.max(1));
                let center_y = rng.gen_range(0..self.grid_height.max(1));
                let radius = rng.gen_range(3.0..10.0);
                self.disasters.push(ActiveDisaster {
                    kind,
                    center_x,
                    center_y,
                    radius,
                    remaining_ticks: rng.gen_range(10.0..60.0),
                });
                milestones.push(Milestone::Disaster {
                    tick: tick_index,
                    kind: kind.name().to_string(),
                    center_x,
                    center_y,
                    radius,
                });
            }
        }
    }

    fn advance_disasters(&mut self, dt: f32) {
        for disaster in &mut self.disasters {
            disaster.remaining_ticks -= dt;
        }
        self.disasters.retain(|d| d.remaining_ticks > 0.0);
    }

    /// Per-resource/temperature effect a disaster applies to a cell within
    /// its radius: `(temperature_delta, humidity_delta, resource_multiplier)`.
    #[must_use]
    pub fn disaster_effect(kind: DisasterKind) -> (f32, f32, f32) {
        match kind {
            DisasterKind::Hurricane => (-2.0, 0.3, 0.7),
            DisasterKind::Tornado => (0.0, 0.0, 0.5),
            DisasterKind::Drought => (3.0, -0.4, 0.4),
            DisasterKind::Flood => (-1.0, 0.4, 0.8),
            DisasterKind::Blizzard => (-10.0, 0.1, 0.6),
            DisasterKind::Heatwave => (8.0, -0.3, 0.6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn day_cycle_advances_and_wraps() {
        let mut climate = Climate::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut milestones = Vec::new();
        for _ in 0..DAY_LENGTH as u32 + 1 {
            climate.tick(1.0, 0, &mut rng, &mut milestones);
        }
        assert_eq!(climate.day, 1);
    }

    #[test]
    fn season_change_emits_milestone() {
        let mut climate = Climate::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut milestones = Vec::new();
        let quarter_year = (YEAR_LENGTH / 4.0) as u32 + 2;
        for tick in 0..quarter_year {
            climate.tick(1.0, tick as u64, &mut rng, &mut milestones);
        }
        assert!(milestones
            .iter()
            .any(|m| matches!(m, Milestone::SeasonChange { .. })));
    }

    #[test]
    fn weather_moves_toward_season_target_without_overshoot() {
        let mut climate = Climate::new(10, 10);
        climate.weather.precipitation = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut milestones = Vec::new();
        for tick in 0..50 {
            climate.tick(1.0, tick, &mut rng, &mut milestones);
        }
        assert!(climate.weather.precipitation >= 0.0 && climate.weather.precipitation <= 1.0);
    }

    #[test]
    fn light_level_is_brightest_at_midday() {
        let mut climate = Climate::new(10, 10);
        climate.day_night_cycle = 0.5;
        let midday_level = climate.light_level();
        climate.day_night_cycle = 0.0;
        let midnight_level = climate.light_level();
        assert!(midday_level > midnight_level);
    }
}
