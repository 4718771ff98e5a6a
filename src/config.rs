// --- File: config.rs ---
use crate::constants::*;
use crate::error::ConfigError;
use crate::organism::Species;
use crate::terrain::TerrainType;
use serde::{Deserialize, Serialize};

/// Which layout `initialize` builds the terrain from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    /// No terrain grid or walls; organisms are only clamped to the world bounds.
    Open,
    #[default]
    Random,
    Plains,
    Island,
    Maze,
    Mountainous,
    Diverse,
    /// Biome generation weighted by [`TerrainPercentages`].
    Custom,
}

/// How initial organisms pick their traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMode {
    Fixed,
    #[default]
    Random,
}

/// Share of each terrain type, in whole percent, for [`MapType::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainPercentages {
    pub grass: u32,
    pub water: u32,
    pub mud: u32,
    pub ice: u32,
    pub desert: u32,
    pub mountain: u32,
    pub forest: u32,
    pub swamp: u32,
}

impl Default for TerrainPercentages {
    fn default() -> Self {
        Self {
            grass: 40,
            water: 20,
            mud: 10,
            ice: 5,
            desert: 10,
            mountain: 5,
            forest: 5,
            swamp: 5,
        }
    }
}

impl TerrainPercentages {
    pub fn total(&self) -> u32 {
        self.weights().iter().map(|(_, pct)| *pct).sum()
    }

    pub fn weights(&self) -> [(TerrainType, u32); 8] {
        [
            (TerrainType::Grass, self.grass),
            (TerrainType::Water, self.water),
            (TerrainType::Mud, self.mud),
            (TerrainType::Ice, self.ice),
            (TerrainType::Desert, self.desert),
            (TerrainType::Mountain, self.mountain),
            (TerrainType::Forest, self.forest),
            (TerrainType::Swamp, self.swamp),
        ]
    }
}

/// Inclusive-exclusive draw range for a randomly initialised trait.
pub type TraitRange = (f32, f32);

/// Lower bounds a mutated child trait can never fall below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitFloors {
    pub speed: f32,
    pub stamina_max: f32,
    pub lifespan: f32,
    pub size: f32,
    pub swim_speed: f32,
    pub communication: f32,
}

/// Trait values used when [`AttributeMode::Fixed`] is selected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedTraits {
    pub speed: f32,
    pub stamina_max: f32,
    pub lifespan: f32,
    pub size: f32,
    pub swim_speed: f32,
    pub communication: f32,
}

/// Draw ranges used when [`AttributeMode::Random`] is selected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomTraits {
    pub speed: TraitRange,
    pub stamina_max: TraitRange,
    pub lifespan: TraitRange,
    pub size: TraitRange,
    pub communication: TraitRange,
    pub swim_chance: f64,
    pub swim_speed: TraitRange,
}

/// Per-species balance table. Every number here is a tuning knob rather
/// than a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesBalance {
    pub vision_per_size: f32,
    pub vision_per_communication: f32,
    pub start_energy_fraction: f32,
    pub base_consumption: f32,
    pub consumption_per_speed: f32,
    pub consumption_per_size: f32,
    pub consumption_per_communication: f32,
    // Land speed multiplier for swimmers is max(floor, 1 - swim * penalty).
    pub swim_land_penalty: f32,
    pub swim_land_floor: f32,
    pub reproduction_cost_fraction: f32,
    pub reproduction_chance: f64,
    pub min_reproduction_age: u32,
    pub rest_ticks_after_reproduction: u32,
    pub max_ticks_since_fed: Option<u32>,
    pub rest_recovery_fraction: f32,
    pub flee_cost_multiplier: f32,
    pub wander_turn_chance: f64,
    // Energy gained per kill: victim.size * per_size + victim.energy * per_energy.
    pub prey_gain_per_size: f32,
    pub prey_gain_per_energy: f32,
    pub hunter_gain_per_size: f32,
    pub hunter_gain_per_energy: f32,
    /// Chance that a successful reproduction yields the next tier instead.
    pub offspring_promotion_chance: f64,
    /// Chance that a well-fed hunter is itself promoted after a kill.
    pub kill_promotion_chance: f64,
    pub kill_promotion_energy_fraction: f32,
    /// Trait scale applied when an organism of another tier is promoted into this species.
    pub promotion_scale: f32,
    pub floors: TraitFloors,
    pub fixed: FixedTraits,
    pub random: RandomTraits,
}

impl SpeciesBalance {
    pub fn prey() -> Self {
        Self {
            vision_per_size: 10.0,
            vision_per_communication: 5.0,
            start_energy_fraction: 0.8,
            base_consumption: 0.1,
            consumption_per_speed: 0.1,
            consumption_per_size: 0.05,
            consumption_per_communication: 1.0 / 30.0,
            swim_land_penalty: 0.5,
            swim_land_floor: 0.3,
            reproduction_cost_fraction: 0.3,
            reproduction_chance: 0.01,
            min_reproduction_age: 100,
            rest_ticks_after_reproduction: 60,
            max_ticks_since_fed: Some(60),
            rest_recovery_fraction: 0.005,
            flee_cost_multiplier: 1.5,
            wander_turn_chance: 0.05,
            prey_gain_per_size: 0.0,
            prey_gain_per_energy: 0.0,
            hunter_gain_per_size: 0.0,
            hunter_gain_per_energy: 0.0,
            offspring_promotion_chance: 0.005,
            kill_promotion_chance: 0.0,
            kill_promotion_energy_fraction: 1.0,
            promotion_scale: 1.0,
            floors: TraitFloors {
                speed: 1.0,
                stamina_max: 100.0,
                lifespan: 500.0,
                size: 3.0,
                swim_speed: 0.0,
                communication: 1.0,
            },
            fixed: FixedTraits {
                speed: 2.0,
                stamina_max: 150.0,
                lifespan: 700.0,
                size: 6.0,
                swim_speed: 0.0,
                communication: 3.0,
            },
            random: RandomTraits {
                speed: (1.0, 3.0),
                stamina_max: (100.0, 200.0),
                lifespan: (500.0, 1000.0),
                size: (4.0, 8.0),
                communication: (1.0, 5.0),
                swim_chance: 0.1,
                swim_speed: (0.3, 0.8),
            },
        }
    }

    pub fn predator() -> Self {
        Self {
            vision_per_size: 15.0,
            vision_per_communication: 0.0,
            start_energy_fraction: 0.7,
            base_consumption: 0.15,
            consumption_per_speed: 0.125,
            consumption_per_size: 0.0,
            consumption_per_communication: 0.0,
            swim_land_penalty: 0.4,
            swim_land_floor: 0.4,
            reproduction_cost_fraction: 0.4,
            reproduction_chance: 0.005,
            min_reproduction_age: 150,
            rest_ticks_after_reproduction: 0,
            max_ticks_since_fed: None,
            rest_recovery_fraction: 0.005,
            flee_cost_multiplier: 1.0,
            wander_turn_chance: 0.03,
            prey_gain_per_size: 5.0,
            prey_gain_per_energy: 0.5,
            hunter_gain_per_size: 0.0,
            hunter_gain_per_energy: 0.0,
            offspring_promotion_chance: 0.15,
            kill_promotion_chance: 0.05,
            kill_promotion_energy_fraction: 0.8,
            promotion_scale: 1.2,
            floors: TraitFloors {
                speed: 0.5,
                stamina_max: 100.0,
                lifespan: 600.0,
                size: 6.0,
                swim_speed: 0.0,
                communication: 0.0,
            },
            fixed: FixedTraits {
                speed: 2.4,
                stamina_max: 180.0,
                lifespan: 900.0,
                size: 7.2,
                swim_speed: 0.0,
                communication: 0.0,
            },
            random: RandomTraits {
                speed: (2.0, 3.5),
                stamina_max: (150.0, 250.0),
                lifespan: (600.0, 1200.0),
                size: (8.0, 12.0),
                communication: (0.0, 0.0),
                swim_chance: 0.25,
                swim_speed: (0.4, 1.0),
            },
        }
    }

    pub fn cannibal() -> Self {
        Self {
            vision_per_size: 18.0,
            base_consumption: 0.12,
            consumption_per_speed: 0.1,
            reproduction_chance: 0.004,
            rest_ticks_after_reproduction: 60,
            hunter_gain_per_size: 8.0,
            hunter_gain_per_energy: 0.7,
            offspring_promotion_chance: 0.0,
            kill_promotion_chance: 0.0,
            kill_promotion_energy_fraction: 1.0,
            promotion_scale: 1.0,
            floors: TraitFloors {
                speed: 1.8,
                stamina_max: 120.0,
                lifespan: 700.0,
                size: 7.0,
                swim_speed: 0.0,
                communication: 0.0,
            },
            fixed: FixedTraits {
                speed: 3.0,
                stamina_max: 195.0,
                lifespan: 1050.0,
                size: 7.8,
                swim_speed: 0.0,
                communication: 0.0,
            },
            random: RandomTraits {
                speed: (2.5, 4.0),
                stamina_max: (180.0, 280.0),
                lifespan: (700.0, 1400.0),
                size: (9.0, 14.0),
                communication: (0.0, 0.0),
                swim_chance: 0.25,
                swim_speed: (0.4, 1.0),
            },
            ..Self::predator()
        }
    }
}

/// Balance knobs shared by every species plus the per-species tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub prey: SpeciesBalance,
    pub predator: SpeciesBalance,
    pub cannibal: SpeciesBalance,
    // Child trait = max(floor, parent * U(1 - spread, 1 + spread)).
    pub mutation_spread: f32,
    pub trait_reroll_chance: f64,
    pub broadcast_threshold: f32,
    pub reroll_communication_threshold: f32,
    pub swim_gain_threshold: f32,
    pub swim_gain_chance: f64,
    pub swim_gain_range: TraitRange,
    pub aquatic_adaptation_chance: f64,
    pub aquatic_adaptation_range: TraitRange,
    pub drowning_panic_chance: f64,
    pub ice_slip_chance: f64,
    pub biome_noise_chance: f64,
    pub alert_ticks: u32,
    pub hunt_ticks: u32,
    pub food_search_radius: f32,
    pub food_search_candidates: usize,
    // Hunters below this energy fraction accept unsafe paths.
    pub desperation_fraction: f32,
    pub cannibal_base_hunter_preference: f64,
    pub cannibal_hunger_preference: f64,
    pub reflect_heading_on_wall_hit: bool,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            prey: SpeciesBalance::prey(),
            predator: SpeciesBalance::predator(),
            cannibal: SpeciesBalance::cannibal(),
            mutation_spread: 0.2,
            trait_reroll_chance: 0.1,
            broadcast_threshold: 3.0,
            reroll_communication_threshold: 3.0,
            swim_gain_threshold: 0.1,
            swim_gain_chance: 0.05,
            swim_gain_range: (0.3, 0.7),
            aquatic_adaptation_chance: 0.001,
            aquatic_adaptation_range: (0.2, 0.4),
            drowning_panic_chance: 0.3,
            ice_slip_chance: 0.3,
            biome_noise_chance: 0.15,
            alert_ticks: 60,
            hunt_ticks: 200,
            food_search_radius: 250.0,
            food_search_candidates: 5,
            desperation_fraction: 0.2,
            cannibal_base_hunter_preference: 0.3,
            cannibal_hunger_preference: 0.5,
            reflect_heading_on_wall_hit: true,
        }
    }
}

impl BalanceConfig {
    /// Capability table lookup for a species tag.
    pub fn species(&self, species: Species) -> &SpeciesBalance {
        match species {
            Species::Prey => &self.prey,
            Species::Predator => &self.predator,
            Species::Cannibal => &self.cannibal,
        }
    }

    pub fn species_mut(&mut self, species: Species) -> &mut SpeciesBalance {
        match species {
            Species::Prey => &mut self.prey,
            Species::Predator => &mut self.predator,
            Species::Cannibal => &mut self.cannibal,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let global = [
            ("trait_reroll_chance", self.trait_reroll_chance),
            ("swim_gain_chance", self.swim_gain_chance),
            ("aquatic_adaptation_chance", self.aquatic_adaptation_chance),
            ("drowning_panic_chance", self.drowning_panic_chance),
            ("ice_slip_chance", self.ice_slip_chance),
            ("biome_noise_chance", self.biome_noise_chance),
            ("cannibal_base_hunter_preference", self.cannibal_base_hunter_preference),
        ];
        for (name, value) in global {
            check_rate(name, value)?;
        }
        for species in Species::ALL {
            let table = self.species(species);
            check_rate("reproduction_chance", table.reproduction_chance)?;
            check_rate("offspring_promotion_chance", table.offspring_promotion_chance)?;
            check_rate("kill_promotion_chance", table.kill_promotion_chance)?;
            check_rate("wander_turn_chance", table.wander_turn_chance)?;
            check_rate("swim_chance", table.random.swim_chance)?;
            if table.floors.size <= 0.0 {
                return Err(ConfigError::NonPositive {
                    name: "floors.size",
                    value: table.floors.size,
                });
            }
        }
        if !(0.0..1.0).contains(&self.mutation_spread) {
            return Err(ConfigError::InvalidRate {
                name: "mutation_spread",
                value: self.mutation_spread as f64,
            });
        }
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

/// Everything `initialize` needs to build a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: f32,
    pub height: f32,
    pub cell_size: f32,
    pub map_type: MapType,
    pub prey_count: usize,
    pub predator_count: usize,
    pub cannibal_count: usize,
    pub food_count: usize,
    /// Probability per tick that a new food item appears.
    pub food_spawn_rate: f64,
    pub max_food: usize,
    pub max_organisms: usize,
    pub attribute_mode: AttributeMode,
    /// Only consulted when `map_type` is [`MapType::Custom`].
    pub terrain_percentages: TerrainPercentages,
    pub seed: Option<u64>,
    /// Finish the run once prey or hunters are extinct.
    pub stop_on_extinction: bool,
    pub balance: BalanceConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_WIDTH,
            height: DEFAULT_WORLD_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
            map_type: MapType::Random,
            prey_count: INITIAL_PREY_COUNT,
            predator_count: INITIAL_PREDATOR_COUNT,
            cannibal_count: INITIAL_CANNIBAL_COUNT,
            food_count: INITIAL_FOOD_COUNT,
            food_spawn_rate: 0.5,
            max_food: MAX_FOOD,
            max_organisms: MAX_ORGANISMS,
            attribute_mode: AttributeMode::Random,
            terrain_percentages: TerrainPercentages::default(),
            seed: None,
            stop_on_extinction: true,
            balance: BalanceConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Reject configurations that cannot produce a valid world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_type == MapType::Custom {
            let total = self.terrain_percentages.total();
            if total != 100 {
                return Err(ConfigError::TerrainPercentages { total });
            }
        }
        let usable = self.width.is_finite()
            && self.height.is_finite()
            && self.width >= MIN_WORLD_EXTENT
            && self.height >= MIN_WORLD_EXTENT
            && self.cell_size > 0.0
            && self.cell_size <= self.width.min(self.height);
        if !usable {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
                cell_size: self.cell_size,
            });
        }
        check_rate("food_spawn_rate", self.food_spawn_rate)?;
        self.balance.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn custom_map_requires_percentages_summing_to_100() {
        let mut config = SimulationConfig {
            map_type: MapType::Custom,
            ..SimulationConfig::default()
        };
        config.terrain_percentages.grass = 37;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TerrainPercentages { total: 97 })
        );

        // Non-custom maps ignore the percentages entirely.
        config.map_type = MapType::Random;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        let mut config = SimulationConfig::default();
        config.balance.prey.reproduction_chance = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRate {
                name: "reproduction_chance",
                ..
            })
        ));
    }

    #[test]
    fn tiny_worlds_are_rejected() {
        let config = SimulationConfig {
            width: 50.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn cannibal_table_inherits_hunter_defaults() {
        let balance = BalanceConfig::default();
        assert_eq!(balance.cannibal.reproduction_cost_fraction, 0.4);
        assert!(balance.cannibal.vision_per_size > balance.predator.vision_per_size);
        assert!(balance.cannibal.hunter_gain_per_size > balance.predator.prey_gain_per_size);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "map_type": "island", "prey_count": 5 }"#).unwrap();
        assert_eq!(config.map_type, MapType::Island);
        assert_eq!(config.prey_count, 5);
        assert_eq!(config.predator_count, INITIAL_PREDATOR_COUNT);
    }
}

// --- End of File: config.rs ---
