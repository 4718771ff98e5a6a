// --- File: behavior.rs ---
//! Per-organism, per-tick decision making.
//!
//! [`update_organism`] advances one organism against a read-only
//! [`WorldView`] of the collections. Anything that would change another
//! entity (eating it, alerting it, spawning offspring) is recorded in
//! [`TickEffects`] and applied by the simulation after the pass.
use crate::config::BalanceConfig;
use crate::constants::*;
use crate::food::{Food, FoodId};
use crate::organism::{CommunicationType, Organism, OrganismId, Species, TargetRef};
use crate::stats::DeathCounts;
use crate::terrain::TerrainGrid;
use crate::utils::*;
use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

/// Read-only view of the world an organism decides against.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub prey: &'a [Organism],
    pub hunters: &'a [Organism],
    pub food: &'a [Food],
    pub terrain: Option<&'a TerrainGrid>,
    pub width: f32,
    pub height: f32,
    pub balance: &'a BalanceConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    OldAge,
    Starvation,
    Eaten,
    /// Replaced by an organism of the next tier.
    Transformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Alive,
    Died(DeathCause),
}

#[derive(Debug, Clone)]
pub enum SpawnRequest {
    Offspring { parent: Organism, position: Vec2 },
    Transformation { source: Organism, into: Species },
}

/// Shared flee heading pushed to another prey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alert {
    pub recipient: OrganismId,
    pub heading: f32,
}

/// Deferred effects collected during a tick.
#[derive(Debug, Default)]
pub struct TickEffects {
    pub removed: HashSet<OrganismId>,
    pub eaten_food: HashSet<FoodId>,
    pub spawns: Vec<SpawnRequest>,
    pub alerts: Vec<Alert>,
    pub deaths: DeathCounts,
}

impl TickEffects {
    pub fn clear(&mut self) {
        self.removed.clear();
        self.eaten_food.clear();
        self.spawns.clear();
        self.alerts.clear();
        self.deaths = DeathCounts::default();
    }

    #[inline]
    pub fn is_removed(&self, id: OrganismId) -> bool {
        self.removed.contains(&id)
    }

    pub fn record_death(&mut self, id: OrganismId, cause: DeathCause) {
        if !self.removed.insert(id) {
            return;
        }
        match cause {
            DeathCause::OldAge => self.deaths.old_age += 1,
            DeathCause::Starvation => self.deaths.starvation += 1,
            DeathCause::Eaten => self.deaths.eaten += 1,
            DeathCause::Transformed => self.deaths.transformed += 1,
        }
    }
}

/// Living members of `list` other than `self_id`.
fn others<'a>(
    list: &'a [Organism],
    effects: &TickEffects,
    self_id: OrganismId,
) -> impl Iterator<Item = &'a Organism> {
    list.iter()
        .filter(move |o| o.id != self_id && !effects.is_removed(o.id))
}

fn wander<R: Rng + ?Sized>(turn_chance: f64, rng: &mut R) -> Option<f32> {
    chance(rng, turn_chance).then(|| random_heading(rng))
}

fn path_clear(organism: &Organism, to: Vec2, view: &WorldView<'_>) -> bool {
    view.terrain.is_none_or(|grid| {
        grid.is_path_safe(organism.position, to, organism.size, organism.swim_speed)
    })
}

/// Advance `organism` by one tick.
pub fn update_organism<R: Rng + ?Sized>(
    organism: &mut Organism,
    view: &WorldView<'_>,
    effects: &mut TickEffects,
    rng: &mut R,
) -> Outcome {
    let balance = view.balance;
    let table = balance.species(organism.species);

    // --- Death checks ---
    organism.age = organism.age.saturating_add(1);
    if organism.is_old() {
        return Outcome::Died(DeathCause::OldAge);
    }
    if organism.is_starved() {
        return Outcome::Died(DeathCause::Starvation);
    }

    let in_water = view
        .terrain
        .is_some_and(|grid| grid.terrain_at(organism.position).is_water());
    if in_water && !organism.can_swim() && chance(rng, balance.aquatic_adaptation_chance) {
        let (low, high) = balance.aquatic_adaptation_range;
        organism.swim_speed = uniform(rng, low, high);
        organism.refresh_derived(table);
        log::debug!("organism {} adapted to water", organism.id.0);
    }

    // --- Resting ---
    if organism.rest_timer > 0 {
        organism.rest_timer -= 1;
        organism.energy += organism.stamina_max * table.rest_recovery_fraction;
        organism.clamp_energy();
        return Outcome::Alive;
    }

    decay_alert(organism);
    organism.energy -= organism.consumption_rate;

    // --- Decision ---
    let avoidance = steer_clear_of_obstacles(organism, view, rng);
    let mut desired = match organism.species {
        Species::Prey => decide_prey(organism, view, effects, avoidance, rng),
        Species::Predator | Species::Cannibal => {
            decide_hunter(organism, view, effects, avoidance, rng)
        }
    };

    // --- Movement ---
    match view.terrain {
        Some(grid) => {
            grid.apply_terrain_effects(organism, balance.ice_slip_chance, rng);
        }
        None => {
            organism.current_speed = organism.base_speed;
            organism.heading_locked = false;
        }
    }
    if in_water && !organism.can_swim() && chance(rng, balance.drowning_panic_chance) {
        desired = Some(random_heading(rng));
    }
    if !organism.heading_locked {
        if let Some(heading) = desired {
            organism.heading = heading;
        }
    }
    organism.heading_locked = false;
    organism.position += Vec2::from_angle(organism.heading) * organism.current_speed;
    // Wall separation is the last position change of the tick.
    organism.position = clamp_to_bounds(organism.position, view.width, view.height);
    if let Some(grid) = view.terrain {
        grid.resolve_wall_collisions(organism, balance.reflect_heading_on_wall_hit);
    }
    organism.clamp_energy();

    // --- Feeding ---
    let killed = match organism.species {
        Species::Prey => {
            eat_food(organism, view, effects);
            false
        }
        Species::Predator | Species::Cannibal => eat_organism(organism, view, effects),
    };

    // --- Reproduction ---
    if organism.can_reproduce(table) && chance(rng, table.reproduction_chance) {
        organism.energy -= organism.reproduction_cost(table);
        organism.offspring += 1;
        organism.rest_timer = table.rest_ticks_after_reproduction;
        let offset = Vec2::new(
            uniform(rng, -OFFSPRING_OFFSET, OFFSPRING_OFFSET),
            uniform(rng, -OFFSPRING_OFFSET, OFFSPRING_OFFSET),
        );
        effects.spawns.push(SpawnRequest::Offspring {
            parent: organism.clone(),
            position: organism.position + offset,
        });
    }

    // A well-fed hunter may be replaced by the next tier after a kill.
    if killed {
        if let Some(next) = organism.species.promoted() {
            let well_fed =
                organism.energy > organism.stamina_max * table.kill_promotion_energy_fraction;
            if well_fed && chance(rng, table.kill_promotion_chance) {
                effects.spawns.push(SpawnRequest::Transformation {
                    source: organism.clone(),
                    into: next,
                });
                return Outcome::Died(DeathCause::Transformed);
            }
        }
    }

    organism.clamp_energy();
    if organism.is_starved() {
        return Outcome::Died(DeathCause::Starvation);
    }
    Outcome::Alive
}

fn decay_alert(organism: &mut Organism) {
    if let Some(forager) = organism.forager_mut() {
        if forager.alert_timer > 0 {
            forager.alert_timer -= 1;
            if forager.alert_timer == 0 {
                forager.alerted = false;
                forager.flee_heading = None;
            }
        }
    }
}

/// Heading that turns away from a nearby wall, or sideways from water ahead
/// for non-swimmers.
fn steer_clear_of_obstacles<R: Rng + ?Sized>(
    organism: &Organism,
    view: &WorldView<'_>,
    rng: &mut R,
) -> Option<f32> {
    let grid = view.terrain?;
    let clearance = organism.size * WALL_CLEARANCE_FACTOR;
    if let Some(point) = grid.nearest_wall_point(organism.position, clearance) {
        let away = heading_away(organism.position, point, rng);
        return Some(wrap_angle(away + rng.gen_range(-WALL_AVOID_JITTER..WALL_AVOID_JITTER)));
    }
    if !organism.can_swim()
        && grid.is_water_ahead(organism.position, organism.heading, WATER_LOOKAHEAD)
    {
        let turn = if rng.gen_bool(0.5) { FRAC_PI_2 } else { -FRAC_PI_2 };
        return Some(wrap_angle(organism.heading + turn));
    }
    None
}

// --- Prey ---

fn decide_prey<R: Rng + ?Sized>(
    organism: &mut Organism,
    view: &WorldView<'_>,
    effects: &mut TickEffects,
    avoidance: Option<f32>,
    rng: &mut R,
) -> Option<f32> {
    let balance = view.balance;
    let table = balance.species(organism.species);
    let position = organism.position;
    let vision = organism.vision_radius;

    let threat = others(view.hunters, effects, organism.id)
        .map(|h| (h, h.position.distance(position)))
        .filter(|(_, d)| *d < vision)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(h, _)| h.position);
    if let Some(threat) = threat {
        let heading = heading_away(position, threat, rng);
        organism.energy -= organism.consumption_rate * table.flee_cost_multiplier;
        if let Some(forager) = organism.forager_mut() {
            forager.alerted = true;
            forager.alert_timer = balance.alert_ticks;
            forager.flee_heading = Some(heading);
        }
        if organism.communication() > balance.broadcast_threshold {
            broadcast_alert(organism, heading, view, effects);
        }
        return Some(heading);
    }

    if let Some(forager) = organism.forager() {
        if forager.alerted {
            if let Some(heading) = forager.flee_heading {
                return Some(heading);
            }
        }
    }

    if let Some(food) = choose_food(organism, view, effects) {
        return Some(heading_towards(position, food.position, rng));
    }
    avoidance.or_else(|| wander(table.wander_turn_chance, rng))
}

/// Share `heading` with prey in sight. Selfish prey only warn their own shape.
fn broadcast_alert(
    organism: &Organism,
    heading: f32,
    view: &WorldView<'_>,
    effects: &mut TickEffects,
) {
    let Some(sender) = organism.forager() else {
        return;
    };
    let selfish = sender.communication_type == CommunicationType::Selfish;
    let recipients: Vec<OrganismId> = others(view.prey, effects, organism.id)
        .filter(|p| p.position.distance(organism.position) < organism.vision_radius)
        .filter(|p| !selfish || p.shape() == sender.shape)
        .map(|p| p.id)
        .collect();
    effects.alerts.extend(
        recipients
            .into_iter()
            .map(|recipient| Alert { recipient, heading }),
    );
}

/// Nearest uneaten food within the search radius that can be reached
/// without crossing water (for non-swimmers) or scraping a wall.
fn choose_food<'a>(
    organism: &Organism,
    view: &WorldView<'a>,
    effects: &TickEffects,
) -> Option<&'a Food> {
    let balance = view.balance;
    let mut candidates: Vec<(&Food, f32)> = view
        .food
        .iter()
        .filter(|f| !effects.eaten_food.contains(&f.id))
        .map(|f| (f, f.position.distance(organism.position)))
        .filter(|(_, d)| *d < balance.food_search_radius)
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates
        .into_iter()
        .take(balance.food_search_candidates.max(1))
        .map(|(f, _)| f)
        .find(|f| path_clear(organism, f.position, view))
}

fn eat_food(organism: &mut Organism, view: &WorldView<'_>, effects: &mut TickEffects) {
    let meal = view
        .food
        .iter()
        .find(|f| {
            !effects.eaten_food.contains(&f.id) && f.touches(organism.position, organism.size)
        });
    match meal {
        Some(food) => {
            organism.feed_on_food(food.value);
            effects.eaten_food.insert(food.id);
        }
        None => {
            if let Some(forager) = organism.forager_mut() {
                forager.ticks_since_fed = forager.ticks_since_fed.saturating_add(1);
            }
        }
    }
}

// --- Hunters ---

fn resolve_target<'a>(
    target: TargetRef,
    hunter_id: OrganismId,
    view: &WorldView<'a>,
    effects: &TickEffects,
) -> Option<&'a Organism> {
    let list = if target.species.is_hunter() { view.hunters } else { view.prey };
    list.iter()
        .find(|o| o.id == target.id && o.id != hunter_id && !effects.is_removed(o.id))
}

fn decide_hunter<R: Rng + ?Sized>(
    organism: &mut Organism,
    view: &WorldView<'_>,
    effects: &mut TickEffects,
    avoidance: Option<f32>,
    rng: &mut R,
) -> Option<f32> {
    let balance = view.balance;
    let table = balance.species(organism.species);
    let desperate = organism.energy_fraction() < balance.desperation_fraction;
    let Some(state) = organism.hunter().copied() else {
        return avoidance;
    };

    // --- Pursuit of the current target ---
    if let Some(target) = state.target {
        let resolved = if state.hunt_timer > 0 {
            resolve_target(target, organism.id, view, effects)
        } else {
            None
        };
        match resolved {
            Some(prey) if desperate || path_clear(organism, prey.position, view) => {
                let heading = heading_towards(organism.position, prey.position, rng);
                if let Some(hunter) = organism.hunter_mut() {
                    hunter.hunt_timer -= 1;
                }
                return Some(heading);
            }
            _ => {
                if let Some(hunter) = organism.hunter_mut() {
                    hunter.clear_target();
                }
                return avoidance.or_else(|| wander(table.wander_turn_chance, rng));
            }
        }
    }

    // --- Target acquisition ---
    if let Some(target) = acquire_target(organism, view, effects, desperate, rng) {
        let heading = heading_towards(organism.position, target.position, rng);
        let target_ref = TargetRef {
            id: target.id,
            species: target.species,
        };
        if let Some(hunter) = organism.hunter_mut() {
            hunter.target = Some(target_ref);
            hunter.hunt_timer = balance.hunt_ticks;
        }
        return Some(heading);
    }
    avoidance.or_else(|| wander(table.wander_turn_chance, rng))
}

/// Pick a visible, reachable victim. Predators hunt prey only. Cannibals go
/// after other hunters first with a hunger-weighted chance, otherwise prey
/// first with other hunters as the fallback.
fn acquire_target<'a, R: Rng + ?Sized>(
    organism: &Organism,
    view: &WorldView<'a>,
    effects: &TickEffects,
    desperate: bool,
    rng: &mut R,
) -> Option<&'a Organism> {
    let visible = |list: &'a [Organism]| -> Vec<&'a Organism> {
        list.iter()
            .filter(|o| o.id != organism.id && !effects.is_removed(o.id))
            .filter(|o| o.position.distance(organism.position) < organism.vision_radius)
            .filter(|o| desperate || path_clear(organism, o.position, view))
            .collect()
    };
    let prey = visible(view.prey);
    if organism.species != Species::Cannibal {
        return prey.choose(rng).copied();
    }

    let balance = view.balance;
    let hunger = (1.0 - organism.energy_fraction()).clamp(0.0, 1.0) as f64;
    let preference =
        balance.cannibal_base_hunter_preference + balance.cannibal_hunger_preference * hunger;
    let hunters = visible(view.hunters);
    let (first, second) = if chance(rng, preference) {
        (hunters, prey)
    } else {
        (prey, hunters)
    };
    first
        .choose(rng)
        .copied()
        .or_else(|| second.choose(rng).copied())
}

/// Eat the first edible organism in contact. Returns whether a kill happened.
fn eat_organism(organism: &mut Organism, view: &WorldView<'_>, effects: &mut TickEffects) -> bool {
    let edible_hunters: &[Organism] = if organism.species == Species::Cannibal {
        view.hunters
    } else {
        &[]
    };
    let victim = others(view.prey, effects, organism.id)
        .chain(others(edible_hunters, effects, organism.id))
        .find(|v| v.position.distance(organism.position) < organism.size + v.size);
    let Some(victim) = victim else {
        return false;
    };
    let table = view.balance.species(organism.species);
    organism.feed_on_organism(victim, table);
    let victim_id = victim.id;
    effects.record_death(victim_id, DeathCause::Eaten);
    true
}


// --- End of File: behavior.rs ---
