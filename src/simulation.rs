// --- File: simulation.rs ---
use crate::behavior::{self, Outcome, SpawnRequest, TickEffects, WorldView};
use crate::config::SimulationConfig;
use crate::constants::*;
use crate::error::ConfigError;
use crate::food::{self, Food, FoodId};
use crate::genetics::{AttributeOverrides, OrganismFactory};
use crate::mapgen;
use crate::organism::{Organism, OrganismId, Species};
use crate::stats::{self, FinalStatistics, Statistics};
use crate::terrain::{TerrainGrid, TerrainType};
use crate::utils::{chance, clamp_to_bounds, uniform};
use crate::wall::Wall;
use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type SimRng = StdRng;

/// Attribute targeted by [`Simulation::apply_area_mutation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutableAttribute {
    Speed,
    StaminaMax,
    Energy,
    Size,
    SwimSpeed,
    Lifespan,
    Communication,
}

/// Read-only view handed to renderers and other observers.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub paused: bool,
    pub prey: &'a [Organism],
    /// Predators and cannibals.
    pub hunters: &'a [Organism],
    pub food: &'a [Food],
    pub walls: &'a [Wall],
    pub stats: &'a Statistics,
    pub final_stats: Option<&'a FinalStatistics>,
}

pub struct Simulation {
    config: SimulationConfig,
    terrain: Option<TerrainGrid>,
    prey: Vec<Organism>,
    hunters: Vec<Organism>,
    food: Vec<Food>,
    rng: SimRng,
    factory: OrganismFactory,
    next_food_id: u64,
    tick: u64,
    speed_multiplier: u32,
    is_paused: bool,
    stats: Statistics,
    final_stats: Option<FinalStatistics>,
    // Reused every tick
    effects: TickEffects,
    new_organism_buffer: Vec<Organism>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, INITIAL_SPEED_MULTIPLIER))
    }

    /// Replace the world with a fresh one built from `config`. On a
    /// validation failure nothing is touched.
    pub fn initialize(&mut self, config: SimulationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self = Self::build(config, self.speed_multiplier);
        Ok(())
    }

    /// Restart from the current configuration.
    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self::build(config, self.speed_multiplier);
    }

    fn build(config: SimulationConfig, speed_multiplier: u32) -> Self {
        let mut rng = match config.seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };
        let terrain = mapgen::generate(&config, &mut rng);
        let initial_count = config.prey_count + config.predator_count + config.cannibal_count;
        let mut sim = Self {
            terrain,
            prey: Vec::with_capacity(config.prey_count.max(64)),
            hunters: Vec::with_capacity((config.predator_count + config.cannibal_count).max(16)),
            food: Vec::with_capacity(config.max_food.min(1024)),
            rng,
            factory: OrganismFactory::new(),
            next_food_id: 0,
            tick: 0,
            speed_multiplier: speed_multiplier.clamp(MIN_SPEED_MULTIPLIER, MAX_SPEED_MULTIPLIER),
            is_paused: false,
            stats: Statistics::new(),
            final_stats: None,
            effects: TickEffects::default(),
            new_organism_buffer: Vec::with_capacity(initial_count / 5 + 8),
            config,
        };
        sim.populate();
        log::info!(
            "initialized {:?} world {}x{}: {} prey, {} hunters, {} food",
            sim.config.map_type,
            sim.config.width,
            sim.config.height,
            sim.prey.len(),
            sim.hunters.len(),
            sim.food.len()
        );
        sim
    }

    fn populate(&mut self) {
        let counts = [
            (Species::Prey, self.config.prey_count),
            (Species::Predator, self.config.predator_count),
            (Species::Cannibal, self.config.cannibal_count),
        ];
        for (species, count) in counts {
            for _ in 0..count {
                let mut organism = self.factory.spawn_from_defaults(
                    species,
                    self.config.attribute_mode,
                    &AttributeOverrides::default(),
                    Vec2::ZERO,
                    &self.config.balance,
                    &mut self.rng,
                );
                organism.position = self.find_spawn_position(organism.size);
                self.insert(organism);
            }
        }
        for _ in 0..self.config.food_count {
            self.spawn_food_item();
        }
        self.refresh_stats();
    }

    /// Wall-free position away from the edges, or the map centre when no
    /// free spot turns up.
    fn find_spawn_position(&mut self, radius: f32) -> Vec2 {
        let (width, height) = (self.config.width, self.config.height);
        for _ in 0..SPAWN_PLACEMENT_ATTEMPTS {
            let candidate = Vec2::new(
                uniform(&mut self.rng, SPAWN_EDGE_MARGIN, width - SPAWN_EDGE_MARGIN),
                uniform(&mut self.rng, SPAWN_EDGE_MARGIN, height - SPAWN_EDGE_MARGIN),
            );
            let blocked = self
                .terrain
                .as_ref()
                .is_some_and(|grid| grid.collides_with_wall(candidate, radius));
            if !blocked {
                return candidate;
            }
        }
        log::warn!("no wall-free spawn position found, using map centre");
        Vec2::new(width / 2.0, height / 2.0)
    }

    fn spawn_food_item(&mut self) -> Option<FoodId> {
        if self.food.len() >= self.config.max_food {
            return None;
        }
        let position = food::find_food_position(
            self.config.width,
            self.config.height,
            self.terrain.as_ref(),
            &mut self.rng,
        )?;
        let value = food::random_food_value(&mut self.rng);
        Some(self.push_food(position, value))
    }

    fn push_food(&mut self, position: Vec2, value: f32) -> FoodId {
        self.next_food_id += 1;
        let id = FoodId(self.next_food_id);
        self.food.push(Food::new(id, position, value));
        id
    }

    fn insert(&mut self, organism: Organism) {
        if organism.is_hunter() {
            self.hunters.push(organism);
        } else {
            self.prey.push(organism);
        }
    }

    pub fn total_organisms(&self) -> usize {
        self.prey.len() + self.hunters.len()
    }

    // --- Tick ---

    /// Advance by `speed_multiplier` steps. No-op while paused or finished.
    pub fn tick(&mut self) {
        if self.is_paused || self.final_stats.is_some() {
            return;
        }
        for _ in 0..self.speed_multiplier {
            self.step();
            if self.final_stats.is_some() {
                break;
            }
        }
    }

    fn step(&mut self) {
        self.tick += 1;
        self.effects.clear();

        // --- Decision & movement passes ---
        self.update_pass(false);
        self.update_pass(true);

        // --- Apply deferred effects ---
        self.apply_alerts();
        let removed = &self.effects.removed;
        self.prey.retain(|o| !removed.contains(&o.id));
        self.hunters.retain(|o| !removed.contains(&o.id));
        let eaten = &self.effects.eaten_food;
        self.food.retain(|f| !eaten.contains(&f.id));
        self.materialize_spawns();

        if chance(&mut self.rng, self.config.food_spawn_rate) {
            self.spawn_food_item();
        }

        self.stats.deaths.old_age += self.effects.deaths.old_age;
        self.stats.deaths.starvation += self.effects.deaths.starvation;
        self.stats.deaths.eaten += self.effects.deaths.eaten;
        self.stats.deaths.transformed += self.effects.deaths.transformed;
        self.refresh_stats();
        self.check_end_of_run();
    }

    /// Update every living member of one collection in order.
    fn update_pass(&mut self, hunters: bool) {
        let len = if hunters { self.hunters.len() } else { self.prey.len() };
        for i in 0..len {
            let current = if hunters { &self.hunters[i] } else { &self.prey[i] };
            if self.effects.is_removed(current.id) {
                continue;
            }
            let mut organism = current.clone();
            let view = WorldView {
                prey: &self.prey,
                hunters: &self.hunters,
                food: &self.food,
                terrain: self.terrain.as_ref(),
                width: self.config.width,
                height: self.config.height,
                balance: &self.config.balance,
            };
            let outcome =
                behavior::update_organism(&mut organism, &view, &mut self.effects, &mut self.rng);
            if let Outcome::Died(cause) = outcome {
                log::trace!("organism {} died: {:?}", organism.id.0, cause);
                self.effects.record_death(organism.id, cause);
            }
            if hunters {
                self.hunters[i] = organism;
            } else {
                self.prey[i] = organism;
            }
        }
    }

    fn apply_alerts(&mut self) {
        if self.effects.alerts.is_empty() {
            return;
        }
        let index: HashMap<OrganismId, usize> =
            self.prey.iter().enumerate().map(|(i, o)| (o.id, i)).collect();
        let alert_ticks = self.config.balance.alert_ticks;
        for alert in &self.effects.alerts {
            let Some(&i) = index.get(&alert.recipient) else {
                continue;
            };
            if let Some(forager) = self.prey[i].forager_mut() {
                forager.alerted = true;
                forager.alert_timer = alert_ticks;
                forager.flee_heading = Some(alert.heading);
            }
        }
    }

    fn materialize_spawns(&mut self) {
        let mut requests = std::mem::take(&mut self.effects.spawns);
        let transforms = requests
            .iter()
            .filter(|r| matches!(r, SpawnRequest::Transformation { .. }))
            .count();
        // Transformed sources are already gone, so replacements always fit.
        let mut room = self
            .config
            .max_organisms
            .saturating_sub(self.total_organisms() + transforms);
        let mut dropped = 0u64;
        for request in &requests {
            let mut organism = match request {
                SpawnRequest::Offspring { parent, position } => {
                    if room == 0 {
                        dropped += 1;
                        continue;
                    }
                    room -= 1;
                    self.stats.births += 1;
                    self.factory
                        .spawn_from_parent(parent, *position, &self.config.balance, &mut self.rng)
                }
                SpawnRequest::Transformation { source, into } => {
                    self.factory.spawn_transformed(source, *into, &self.config.balance)
                }
            };
            organism.position =
                clamp_to_bounds(organism.position, self.config.width, self.config.height);
            if let Some(grid) = self.terrain.as_ref() {
                grid.resolve_wall_collisions(&mut organism, false);
            }
            self.new_organism_buffer.push(organism);
        }
        if dropped > 0 {
            log::warn!(
                "organism cap {} reached, dropped {} offspring",
                self.config.max_organisms,
                dropped
            );
        }
        let mut buffer = std::mem::take(&mut self.new_organism_buffer);
        for organism in buffer.drain(..) {
            self.insert(organism);
        }
        self.new_organism_buffer = buffer;
        requests.clear();
        self.effects.spawns = requests;
    }

    fn refresh_stats(&mut self) {
        self.stats.refresh(
            self.tick,
            &self.prey,
            &self.hunters,
            self.food.len(),
            self.factory.total_created(),
        );
    }

    fn check_end_of_run(&mut self) {
        if !self.config.stop_on_extinction {
            return;
        }
        if let Some(winner) = stats::winner(self.prey.len(), self.hunters.len()) {
            let summary = FinalStatistics::collect(winner, &self.stats, &self.prey, &self.hunters);
            log::info!(
                "run finished at tick {}: winner {:?}, {} generations, {} organisms created",
                self.tick,
                winner,
                summary.generations,
                summary.total_created
            );
            self.final_stats = Some(summary);
        }
    }

    // --- Observers ---

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            tick: self.tick,
            paused: self.is_paused,
            prey: &self.prey,
            hunters: &self.hunters,
            food: &self.food,
            walls: self.terrain.as_ref().map(TerrainGrid::walls).unwrap_or_default(),
            stats: &self.stats,
            final_stats: self.final_stats.as_ref(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn terrain(&self) -> Option<&TerrainGrid> {
        self.terrain.as_ref()
    }

    pub fn prey(&self) -> &[Organism] {
        &self.prey
    }

    pub fn hunters(&self) -> &[Organism] {
        &self.hunters
    }

    pub fn food(&self) -> &[Food] {
        &self.food
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn final_stats(&self) -> Option<&FinalStatistics> {
        self.final_stats.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_finished(&self) -> bool {
        self.final_stats.is_some()
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.prey.iter().chain(&self.hunters).find(|o| o.id == id)
    }

    /// Direct access for editor tools. Only valid between ticks.
    pub fn organism_mut(&mut self, id: OrganismId) -> Option<&mut Organism> {
        self.prey.iter_mut().chain(self.hunters.iter_mut()).find(|o| o.id == id)
    }

    // --- Run control ---

    pub fn pause(&mut self) {
        self.is_paused = true;
    }

    pub fn resume(&mut self) {
        self.is_paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.is_paused = !self.is_paused;
        log::info!("simulation {}", if self.is_paused { "paused" } else { "resumed" });
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn speed_multiplier(&self) -> u32 {
        self.speed_multiplier
    }

    /// Steps per `tick()` call, clamped into the supported range.
    pub fn set_speed_multiplier(&mut self, multiplier: u32) {
        self.speed_multiplier = multiplier.clamp(MIN_SPEED_MULTIPLIER, MAX_SPEED_MULTIPLIER);
    }

    pub fn adjust_speed(&mut self, increase: bool) {
        let next = if increase {
            self.speed_multiplier.saturating_add(1)
        } else {
            self.speed_multiplier.saturating_sub(1)
        };
        self.set_speed_multiplier(next);
        log::info!("speed multiplier: {}", self.speed_multiplier);
    }

    // --- Editor commands (between ticks only) ---

    /// Place a new organism. Unset overrides follow the configured attribute mode.
    pub fn spawn_organism(
        &mut self,
        species: Species,
        position: Vec2,
        overrides: Option<AttributeOverrides>,
    ) -> OrganismId {
        let position = clamp_to_bounds(position, self.config.width, self.config.height);
        let organism = self.factory.spawn_from_defaults(
            species,
            self.config.attribute_mode,
            &overrides.unwrap_or_default(),
            position,
            &self.config.balance,
            &mut self.rng,
        );
        let id = organism.id;
        self.insert(organism);
        self.refresh_stats();
        id
    }

    /// Scale `attribute` by `factor` for every organism within `radius` of
    /// `center`. Returns how many organisms changed.
    pub fn apply_area_mutation(
        &mut self,
        center: Vec2,
        radius: f32,
        attribute: MutableAttribute,
        factor: f32,
    ) -> usize {
        let factor = factor.clamp(MIN_EDITOR_FACTOR, MAX_EDITOR_FACTOR);
        let balance = &self.config.balance;
        let rng = &mut self.rng;
        let mut changed = 0;
        for organism in self.prey.iter_mut().chain(self.hunters.iter_mut()) {
            if organism.position.distance(center) > radius {
                continue;
            }
            match attribute {
                MutableAttribute::Speed => organism.speed *= factor,
                MutableAttribute::StaminaMax => {
                    organism.stamina_max = (organism.stamina_max * factor).max(1.0);
                }
                MutableAttribute::Energy => organism.energy *= factor,
                MutableAttribute::Size => {
                    organism.size = (organism.size * factor).max(MIN_ORGANISM_SIZE);
                }
                MutableAttribute::SwimSpeed => {
                    organism.swim_speed = if organism.swim_speed <= 0.0 && factor > 1.0 {
                        uniform(rng, 0.3, 0.8)
                    } else {
                        organism.swim_speed * factor
                    };
                }
                MutableAttribute::Lifespan => organism.lifespan *= factor,
                MutableAttribute::Communication => match organism.forager_mut() {
                    Some(forager) => forager.communication *= factor,
                    None => continue,
                },
            }
            organism.refresh_derived(balance.species(organism.species));
            organism.clamp_energy();
            changed += 1;
        }
        if changed > 0 {
            log::debug!("area mutation {attribute:?} x{factor:.2} touched {changed} organisms");
        }
        changed
    }

    fn terrain_mut(&mut self) -> &mut TerrainGrid {
        let config = &self.config;
        self.terrain.get_or_insert_with(|| {
            TerrainGrid::new(config.width, config.height, config.cell_size, TerrainType::Grass)
        })
    }

    /// Paint every cell whose centre lies within the circle. An open map
    /// gains a grass grid first.
    pub fn paint_terrain(&mut self, center: Vec2, radius: f32, terrain: TerrainType) -> usize {
        self.terrain_mut().paint_circle(center, radius, terrain)
    }

    pub fn add_wall(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.terrain_mut().add_wall(Wall::new(x, y, width, height));
    }

    /// Drop a food item, ignoring placement rules but not the food cap.
    pub fn add_food(&mut self, position: Vec2, value: Option<f32>) -> Option<FoodId> {
        if self.food.len() >= self.config.max_food {
            return None;
        }
        let value = value.unwrap_or_else(|| food::random_food_value(&mut self.rng)).max(0.0);
        let position = clamp_to_bounds(position, self.config.width, self.config.height);
        let id = self.push_food(position, value);
        self.stats.food_count = self.food.len();
        Some(id)
    }
}


// --- End of File: simulation.rs ---
