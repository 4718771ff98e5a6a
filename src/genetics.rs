// --- File: genetics.rs ---
//! Organism creation: initial spawns, inheritance with mutation, and
//! species transformation. Every new organism goes through
//! [`OrganismFactory`], which owns the id allocator.
use crate::config::{AttributeMode, BalanceConfig, SpeciesBalance, TraitFloors};
use crate::constants::MIN_ORGANISM_SIZE;
use crate::organism::{CommunicationType, Organism, OrganismId, Species, Traits};
use crate::utils::{chance, random_heading, uniform};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Monotonic id source scoped to one simulation.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> OrganismId {
        self.next += 1;
        OrganismId(self.next)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Explicit trait values for editor spawns. Unset fields fall back to the
/// configured attribute mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeOverrides {
    pub speed: Option<f32>,
    pub stamina_max: Option<f32>,
    pub lifespan: Option<f32>,
    pub size: Option<f32>,
    pub swim_speed: Option<f32>,
    pub communication: Option<f32>,
    pub energy: Option<f32>,
    pub communication_type: Option<CommunicationType>,
}

/// Child trait: `max(floor, parent * U(1 - spread, 1 + spread))`.
#[inline]
pub fn mutate_trait<R: Rng + ?Sized>(value: f32, floor: f32, spread: f32, rng: &mut R) -> f32 {
    let factor = uniform(rng, 1.0 - spread, 1.0 + spread);
    (value * factor).max(floor)
}

fn apply_floors(traits: &mut Traits, floors: &TraitFloors) {
    traits.speed = traits.speed.max(floors.speed);
    traits.stamina_max = traits.stamina_max.max(floors.stamina_max);
    traits.lifespan = traits.lifespan.max(floors.lifespan);
    traits.size = traits.size.max(floors.size);
    traits.swim_speed = traits.swim_speed.max(floors.swim_speed);
    traits.communication = traits.communication.max(floors.communication);
}

#[derive(Debug, Default)]
pub struct OrganismFactory {
    ids: IdAllocator,
}

impl OrganismFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total organisms created by this factory.
    pub fn total_created(&self) -> u64 {
        self.ids.issued()
    }

    /// Create an organism from the species defaults (fixed or randomized),
    /// with any explicit overrides applied on top.
    pub fn spawn_from_defaults<R: Rng + ?Sized>(
        &mut self,
        species: Species,
        mode: AttributeMode,
        overrides: &AttributeOverrides,
        position: Vec2,
        balance: &BalanceConfig,
        rng: &mut R,
    ) -> Organism {
        let table = balance.species(species);
        let mut traits = match mode {
            AttributeMode::Fixed => Traits {
                speed: table.fixed.speed,
                stamina_max: table.fixed.stamina_max,
                lifespan: table.fixed.lifespan,
                size: table.fixed.size,
                swim_speed: table.fixed.swim_speed,
                communication: table.fixed.communication,
            },
            AttributeMode::Random => {
                let ranges = &table.random;
                let swim_speed = if chance(rng, ranges.swim_chance) {
                    uniform(rng, ranges.swim_speed.0, ranges.swim_speed.1)
                } else {
                    0.0
                };
                Traits {
                    speed: uniform(rng, ranges.speed.0, ranges.speed.1),
                    stamina_max: uniform(rng, ranges.stamina_max.0, ranges.stamina_max.1),
                    lifespan: uniform(rng, ranges.lifespan.0, ranges.lifespan.1),
                    size: uniform(rng, ranges.size.0, ranges.size.1),
                    swim_speed,
                    communication: uniform(rng, ranges.communication.0, ranges.communication.1),
                }
            }
        };
        traits.speed = overrides.speed.unwrap_or(traits.speed).max(0.0);
        traits.stamina_max = overrides.stamina_max.unwrap_or(traits.stamina_max).max(1.0);
        traits.lifespan = overrides.lifespan.unwrap_or(traits.lifespan).max(1.0);
        traits.size = overrides.size.unwrap_or(traits.size).max(MIN_ORGANISM_SIZE);
        traits.swim_speed = overrides.swim_speed.unwrap_or(traits.swim_speed).max(0.0);
        traits.communication = overrides.communication.unwrap_or(traits.communication).max(0.0);

        let mut organism = Organism::new(
            self.ids.next_id(),
            species,
            position,
            random_heading(rng),
            traits,
            table,
        );
        if let Some(energy) = overrides.energy {
            organism.energy = energy;
            organism.clamp_energy();
        }
        let threshold = balance.reroll_communication_threshold;
        if let Some(forager) = organism.forager_mut() {
            let communication = forager.communication;
            forager.communication_type = overrides
                .communication_type
                .unwrap_or_else(|| CommunicationType::roll(communication, threshold, rng));
            forager.shape = forager.communication_type.shape();
        }
        organism
    }

    /// Create a child of `parent` at `position`. Each heritable trait mutates
    /// independently. With the parent tier's promotion chance the child is
    /// born into the next tier instead.
    pub fn spawn_from_parent<R: Rng + ?Sized>(
        &mut self,
        parent: &Organism,
        position: Vec2,
        balance: &BalanceConfig,
        rng: &mut R,
    ) -> Organism {
        let parent_table = balance.species(parent.species);
        let spread = balance.mutation_spread;
        let floors = &parent_table.floors;
        let inherited = parent.traits();
        let mut traits = Traits {
            speed: mutate_trait(inherited.speed, floors.speed, spread, rng),
            stamina_max: mutate_trait(inherited.stamina_max, floors.stamina_max, spread, rng),
            lifespan: mutate_trait(inherited.lifespan, floors.lifespan, spread, rng),
            size: mutate_trait(inherited.size, floors.size, spread, rng),
            swim_speed: mutate_trait(inherited.swim_speed, floors.swim_speed, spread, rng),
            communication: if parent.is_prey() {
                mutate_trait(inherited.communication, floors.communication, spread, rng)
            } else {
                0.0
            },
        };
        if traits.swim_speed < balance.swim_gain_threshold
            && chance(rng, balance.swim_gain_chance)
        {
            traits.swim_speed = uniform(rng, balance.swim_gain_range.0, balance.swim_gain_range.1);
        }

        let promoted = parent
            .species
            .promoted()
            .filter(|_| chance(rng, parent_table.offspring_promotion_chance));
        let species = match promoted {
            Some(next) => {
                let table = balance.species(next);
                promote_traits(&mut traits, table);
                log::debug!(
                    "{:?} {} produced a {:?} offspring",
                    parent.species,
                    parent.id.0,
                    next
                );
                next
            }
            None => parent.species,
        };

        let mut child = Organism::new(
            self.ids.next_id(),
            species,
            position,
            random_heading(rng),
            traits,
            balance.species(species),
        );
        if let (Some(child_state), Some(parent_state)) = (child.forager_mut(), parent.forager()) {
            if chance(rng, balance.trait_reroll_chance) {
                child_state.communication_type = CommunicationType::roll(
                    child_state.communication,
                    balance.reroll_communication_threshold,
                    rng,
                );
                child_state.shape = child_state.communication_type.shape();
            } else {
                child_state.communication_type = parent_state.communication_type;
                child_state.shape = parent_state.shape;
            }
        }
        child
    }

    /// Replace `source` with a fresh organism of species `into`, carrying its
    /// traits, position, heading and remaining energy.
    pub fn spawn_transformed(
        &mut self,
        source: &Organism,
        into: Species,
        balance: &BalanceConfig,
    ) -> Organism {
        let table = balance.species(into);
        let mut traits = source.traits();
        promote_traits(&mut traits, table);
        let mut organism = Organism::new(
            self.ids.next_id(),
            into,
            source.position,
            source.heading,
            traits,
            table,
        );
        organism.energy = source.energy;
        organism.clamp_energy();
        organism.offspring = source.offspring;
        log::debug!(
            "{:?} {} transformed into {:?} {}",
            source.species,
            source.id.0,
            into,
            organism.id.0
        );
        organism
    }
}

fn promote_traits(traits: &mut Traits, table: &SpeciesBalance) {
    traits.speed *= table.promotion_scale;
    traits.stamina_max *= table.promotion_scale;
    traits.size *= table.promotion_scale;
    apply_floors(traits, &table.floors);
}


// --- End of File: genetics.rs ---
