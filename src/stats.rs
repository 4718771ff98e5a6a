// --- File: stats.rs ---
use crate::constants::*;
use crate::organism::{Organism, Species};
use rayon::prelude::*;
use serde::Serialize;

/// Mean heritable traits of a population. All zero for an empty slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TraitMeans {
    pub age: f32,
    pub speed: f32,
    pub stamina_max: f32,
    pub size: f32,
    pub swim_speed: f32,
}

impl TraitMeans {
    pub fn of(organisms: &[Organism]) -> Self {
        if organisms.is_empty() {
            return Self::default();
        }
        let sums = organisms
            .par_iter()
            .map(|o| [o.age as f32, o.speed, o.stamina_max, o.size, o.swim_speed])
            .reduce(
                || [0.0; 5],
                |mut acc, row| {
                    for (a, r) in acc.iter_mut().zip(row) {
                        *a += r;
                    }
                    acc
                },
            );
        let n = organisms.len() as f32;
        Self {
            age: sums[0] / n,
            speed: sums[1] / n,
            stamina_max: sums[2] / n,
            size: sums[3] / n,
            swim_speed: sums[4] / n,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeathCounts {
    pub old_age: u64,
    pub starvation: u64,
    pub eaten: u64,
    pub transformed: u64,
}

/// Running aggregates, refreshed after every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub tick: u64,
    pub generation: u32,
    /// Living prey.
    pub population: usize,
    pub peak_population: usize,
    pub total_created: u64,
    pub active_predators: usize,
    pub active_cannibals: usize,
    pub food_count: usize,
    pub births: u64,
    pub deaths: DeathCounts,
    pub prey_means: TraitMeans,
    pub hunter_means: TraitMeans,
    #[serde(skip)]
    declined: bool,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            tick: 0,
            generation: 1,
            population: 0,
            peak_population: 0,
            total_created: 0,
            active_predators: 0,
            active_cannibals: 0,
            food_count: 0,
            births: 0,
            deaths: DeathCounts::default(),
            prey_means: TraitMeans::default(),
            hunter_means: TraitMeans::default(),
            declined: false,
        }
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(
        &mut self,
        tick: u64,
        prey: &[Organism],
        hunters: &[Organism],
        food_count: usize,
        total_created: u64,
    ) {
        self.tick = tick;
        self.population = prey.len();
        self.total_created = total_created;
        self.food_count = food_count;
        self.active_predators = hunters.iter().filter(|h| h.species == Species::Predator).count();
        self.active_cannibals = hunters.iter().filter(|h| h.species == Species::Cannibal).count();
        self.prey_means = TraitMeans::of(prey);
        self.hunter_means = TraitMeans::of(hunters);
        self.track_generation();
    }

    /// A generation passes when the prey population, having fallen below the
    /// recovery ratio of its peak, climbs back above it.
    fn track_generation(&mut self) {
        let threshold = self.peak_population as f32 * GENERATION_RECOVERY_RATIO;
        let population = self.population as f32;
        if population < threshold {
            self.declined = true;
        } else if self.declined && self.population > GENERATION_MIN_POPULATION {
            self.generation += 1;
            self.declined = false;
            self.peak_population = self.population;
            log::debug!("generation {} reached at tick {}", self.generation, self.tick);
        }
        self.peak_population = self.peak_population.max(self.population);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Prey,
    Predators,
    /// Both sides died out in the same tick.
    Nobody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationSummary {
    pub count: usize,
    pub means: TraitMeans,
    pub total_offspring: u64,
    pub strongest: Option<Organism>,
}

impl PopulationSummary {
    pub fn of(organisms: &[Organism]) -> Self {
        Self {
            count: organisms.len(),
            means: TraitMeans::of(organisms),
            total_offspring: organisms.iter().map(|o| o.offspring as u64).sum(),
            strongest: organisms
                .iter()
                .max_by(|a, b| a.strength_score().total_cmp(&b.strength_score()))
                .cloned(),
        }
    }
}

/// Snapshot taken once when a run ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalStatistics {
    pub winner: Winner,
    pub ticks: u64,
    pub generations: u32,
    pub total_created: u64,
    pub peak_population: usize,
    pub deaths: DeathCounts,
    pub prey: PopulationSummary,
    pub hunters: PopulationSummary,
}

impl FinalStatistics {
    pub fn collect(
        winner: Winner,
        stats: &Statistics,
        prey: &[Organism],
        hunters: &[Organism],
    ) -> Self {
        Self {
            winner,
            ticks: stats.tick,
            generations: stats.generation,
            total_created: stats.total_created,
            peak_population: stats.peak_population,
            deaths: stats.deaths,
            prey: PopulationSummary::of(prey),
            hunters: PopulationSummary::of(hunters),
        }
    }
}

/// Winner once either side is extinct; `None` while both survive.
pub fn winner(prey_count: usize, hunter_count: usize) -> Option<Winner> {
    match (prey_count, hunter_count) {
        (0, 0) => Some(Winner::Nobody),
        (0, _) => Some(Winner::Predators),
        (_, 0) => Some(Winner::Prey),
        _ => None,
    }
}


// --- End of File: stats.rs ---
