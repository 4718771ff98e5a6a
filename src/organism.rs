// --- File: organism.rs ---
use crate::config::SpeciesBalance;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

// --- Core Data Structures ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganismId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Prey,
    Predator,
    Cannibal,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Prey, Species::Predator, Species::Cannibal];

    pub fn is_hunter(self) -> bool {
        !matches!(self, Species::Prey)
    }

    /// Tier an offspring or a well-fed hunter can be promoted into. Cannibals are terminal.
    pub fn promoted(self) -> Option<Species> {
        match self {
            Species::Prey => Some(Species::Predator),
            Species::Predator => Some(Species::Cannibal),
            Species::Cannibal => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationType {
    #[default]
    None,
    /// Alerts only reach prey of the same shape.
    Selfish,
    Altruistic,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
}

impl CommunicationType {
    pub fn shape(self) -> Shape {
        match self {
            CommunicationType::None => Shape::Circle,
            CommunicationType::Selfish => Shape::Square,
            CommunicationType::Altruistic => Shape::Triangle,
        }
    }

    /// Draw a communication style for the given level: talkative prey pick
    /// Selfish or Altruistic, the rest stay silent.
    pub fn roll<R: Rng + ?Sized>(communication: f32, threshold: f32, rng: &mut R) -> Self {
        if communication <= threshold {
            CommunicationType::None
        } else if rng.gen_bool(0.5) {
            CommunicationType::Selfish
        } else {
            CommunicationType::Altruistic
        }
    }
}

/// State only prey carry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForagerState {
    pub communication: f32,
    pub communication_type: CommunicationType,
    pub shape: Shape,
    pub alerted: bool,
    pub alert_timer: u32,
    pub flee_heading: Option<f32>,
    pub ticks_since_fed: u32,
}

/// Weak reference to a hunt target: re-resolved by id every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub id: OrganismId,
    pub species: Species,
}

/// State only predators and cannibals carry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HunterState {
    pub target: Option<TargetRef>,
    pub hunt_timer: u32,
}

impl HunterState {
    pub fn clear_target(&mut self) {
        self.target = None;
        self.hunt_timer = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Forager(ForagerState),
    Hunter(HunterState),
}

impl Role {
    pub fn for_species(species: Species) -> Self {
        if species.is_hunter() {
            Role::Hunter(HunterState::default())
        } else {
            Role::Forager(ForagerState::default())
        }
    }
}

/// Heritable numeric traits, the unit mutation operates on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub speed: f32,
    pub stamina_max: f32,
    pub lifespan: f32,
    pub size: f32,
    pub swim_speed: f32,
    pub communication: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub id: OrganismId,
    pub species: Species,
    pub position: Vec2,
    /// Radians.
    pub heading: f32,
    /// Heritable speed gene.
    pub speed: f32,
    /// Speed on neutral ground after the land/water trade-off.
    pub base_speed: f32,
    /// Speed after terrain effects for the current tick.
    pub current_speed: f32,
    pub energy: f32,
    pub stamina_max: f32,
    pub age: u32,
    pub lifespan: f32,
    pub size: f32,
    pub swim_speed: f32,
    pub consumption_rate: f32,
    pub vision_radius: f32,
    pub rest_timer: u32,
    pub heading_locked: bool,
    pub offspring: u32,
    #[serde(flatten)]
    pub role: Role,
}

impl Organism {
    pub fn new(
        id: OrganismId,
        species: Species,
        position: Vec2,
        heading: f32,
        traits: Traits,
        table: &SpeciesBalance,
    ) -> Self {
        let mut role = Role::for_species(species);
        if let Role::Forager(forager) = &mut role {
            forager.communication = traits.communication;
        }
        let mut organism = Self {
            id,
            species,
            position,
            heading,
            speed: traits.speed,
            base_speed: traits.speed,
            current_speed: traits.speed,
            energy: traits.stamina_max * table.start_energy_fraction,
            stamina_max: traits.stamina_max,
            age: 0,
            lifespan: traits.lifespan,
            size: traits.size,
            swim_speed: traits.swim_speed,
            consumption_rate: 0.0,
            vision_radius: 0.0,
            rest_timer: 0,
            heading_locked: false,
            offspring: 0,
            role,
        };
        organism.refresh_derived(table);
        organism.clamp_energy();
        organism
    }

    pub fn traits(&self) -> Traits {
        Traits {
            speed: self.speed,
            stamina_max: self.stamina_max,
            lifespan: self.lifespan,
            size: self.size,
            swim_speed: self.swim_speed,
            communication: self.communication(),
        }
    }

    /// Recompute every field derived from the heritable traits.
    pub fn refresh_derived(&mut self, table: &SpeciesBalance) {
        let land_factor = if self.swim_speed > 0.0 {
            (1.0 - self.swim_speed * table.swim_land_penalty).max(table.swim_land_floor)
        } else {
            1.0
        };
        self.base_speed = self.speed * land_factor;
        self.current_speed = self.base_speed;
        let communication = self.communication();
        self.consumption_rate = table.base_consumption
            + self.speed * table.consumption_per_speed
            + self.size * table.consumption_per_size
            + communication * table.consumption_per_communication;
        self.vision_radius =
            self.size * table.vision_per_size + communication * table.vision_per_communication;
    }

    #[inline]
    pub fn is_prey(&self) -> bool {
        !self.species.is_hunter()
    }

    #[inline]
    pub fn is_hunter(&self) -> bool {
        self.species.is_hunter()
    }

    pub fn forager(&self) -> Option<&ForagerState> {
        match &self.role {
            Role::Forager(state) => Some(state),
            Role::Hunter(_) => None,
        }
    }

    pub fn forager_mut(&mut self) -> Option<&mut ForagerState> {
        match &mut self.role {
            Role::Forager(state) => Some(state),
            Role::Hunter(_) => None,
        }
    }

    pub fn hunter(&self) -> Option<&HunterState> {
        match &self.role {
            Role::Hunter(state) => Some(state),
            Role::Forager(_) => None,
        }
    }

    pub fn hunter_mut(&mut self) -> Option<&mut HunterState> {
        match &mut self.role {
            Role::Hunter(state) => Some(state),
            Role::Forager(_) => None,
        }
    }

    /// Communication level; zero for hunters.
    pub fn communication(&self) -> f32 {
        self.forager().map_or(0.0, |f| f.communication)
    }

    pub fn shape(&self) -> Shape {
        self.forager().map_or(Shape::Circle, |f| f.shape)
    }

    pub fn is_alerted(&self) -> bool {
        self.forager().is_some_and(|f| f.alerted)
    }

    pub fn energy_fraction(&self) -> f32 {
        if self.stamina_max > 0.0 {
            self.energy / self.stamina_max
        } else {
            0.0
        }
    }

    #[inline]
    pub fn clamp_energy(&mut self) {
        self.energy = self.energy.clamp(0.0, self.stamina_max.max(0.0));
    }

    pub fn is_old(&self) -> bool {
        self.age as f32 >= self.lifespan
    }

    pub fn is_starved(&self) -> bool {
        self.energy <= 0.0
    }

    pub fn can_swim(&self) -> bool {
        self.swim_speed > 0.0
    }

    /// Eat a food item. Returns the energy actually gained.
    pub fn feed_on_food(&mut self, value: f32) -> f32 {
        let before = self.energy;
        self.energy = (self.energy + value).min(self.stamina_max);
        if let Some(forager) = self.forager_mut() {
            forager.ticks_since_fed = 0;
        }
        self.energy - before
    }

    /// Eat another organism using this species' gain coefficients for the
    /// victim's tier. Returns the energy actually gained.
    pub fn feed_on_organism(&mut self, victim: &Organism, table: &SpeciesBalance) -> f32 {
        let (per_size, per_energy) = if victim.is_prey() {
            (table.prey_gain_per_size, table.prey_gain_per_energy)
        } else {
            (table.hunter_gain_per_size, table.hunter_gain_per_energy)
        };
        let before = self.energy;
        let gain = victim.size * per_size + victim.energy.max(0.0) * per_energy;
        self.energy = (self.energy + gain).min(self.stamina_max);
        if let Some(hunter) = self.hunter_mut() {
            hunter.clear_target();
        }
        self.energy - before
    }

    pub fn reproduction_cost(&self, table: &SpeciesBalance) -> f32 {
        self.stamina_max * table.reproduction_cost_fraction
    }

    /// Gates checked before the reproduction roll: enough energy to pay the
    /// cost, old enough, and for prey a recent meal.
    pub fn can_reproduce(&self, table: &SpeciesBalance) -> bool {
        if self.energy <= self.reproduction_cost(table) || self.age <= table.min_reproduction_age {
            return false;
        }
        match (table.max_ticks_since_fed, self.forager()) {
            (Some(limit), Some(forager)) => forager.ticks_since_fed < limit,
            _ => true,
        }
    }

    /// Weighted score used to pick the strongest individual of a population.
    pub fn strength_score(&self) -> f32 {
        match self.species {
            Species::Prey => {
                self.speed * 0.3
                    + self.stamina_max / 100.0 * 0.3
                    + self.size / 10.0 * 0.2
                    + self.swim_speed * 0.2
            }
            Species::Predator | Species::Cannibal => {
                self.speed * 0.3
                    + self.stamina_max / 100.0 * 0.3
                    + self.size / 10.0 * 0.3
                    + self.swim_speed * 0.1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalanceConfig;

    fn traits() -> Traits {
        Traits {
            speed: 2.0,
            stamina_max: 300.0,
            lifespan: 700.0,
            size: 6.0,
            swim_speed: 0.0,
            communication: 3.0,
        }
    }

    fn prey() -> Organism {
        let balance = BalanceConfig::default();
        Organism::new(OrganismId(1), Species::Prey, Vec2::ZERO, 0.0, traits(), &balance.prey)
    }

    #[test]
    fn derived_fields_follow_species_formulas() {
        let balance = BalanceConfig::default();
        let organism = prey();
        assert!((organism.vision_radius - (6.0 * 10.0 + 3.0 * 5.0)).abs() < 1e-4);
        let expected = 0.1 + 2.0 / 10.0 + 6.0 / 20.0 + 3.0 / 30.0;
        assert!((organism.consumption_rate - expected).abs() < 1e-5);
        assert!((organism.energy - 240.0).abs() < 1e-4);

        let predator = Organism::new(
            OrganismId(2),
            Species::Predator,
            Vec2::ZERO,
            0.0,
            traits(),
            &balance.predator,
        );
        assert!((predator.vision_radius - 90.0).abs() < 1e-4);
        assert!((predator.consumption_rate - (0.15 + 2.0 / 8.0)).abs() < 1e-5);
        assert_eq!(predator.communication(), 0.0);
    }

    #[test]
    fn swimmers_trade_land_speed() {
        let balance = BalanceConfig::default();
        let mut organism = prey();
        organism.swim_speed = 0.8;
        organism.refresh_derived(&balance.prey);
        assert!((organism.base_speed - 2.0 * 0.6).abs() < 1e-5);
        organism.swim_speed = 2.0;
        organism.refresh_derived(&balance.prey);
        assert!((organism.base_speed - 2.0 * 0.3).abs() < 1e-5);
    }

    #[test]
    fn feeding_on_food_caps_at_stamina() {
        let mut organism = prey();
        organism.energy = 50.0;
        assert_eq!(organism.feed_on_food(200.0), 200.0);
        assert_eq!(organism.energy, 250.0);
        organism.feed_on_food(200.0);
        assert_eq!(organism.energy, 300.0);
    }

    #[test]
    fn cannibals_gain_more_per_kill_than_predators() {
        let balance = BalanceConfig::default();
        let victim = Organism::new(
            OrganismId(3),
            Species::Predator,
            Vec2::ZERO,
            0.0,
            traits(),
            &balance.predator,
        );
        let mut cannibal = Organism::new(
            OrganismId(4),
            Species::Cannibal,
            Vec2::ZERO,
            0.0,
            Traits { stamina_max: 10_000.0, ..traits() },
            &balance.cannibal,
        );
        cannibal.energy = 0.0;
        let gain = cannibal.feed_on_organism(&victim, &balance.cannibal);
        assert!((gain - (6.0 * 8.0 + victim.energy * 0.7)).abs() < 1e-3);

        let mut predator = cannibal.clone();
        predator.species = Species::Predator;
        predator.energy = 0.0;
        let prey = prey();
        let gain = predator.feed_on_organism(&prey, &balance.predator);
        assert!((gain - (6.0 * 5.0 + prey.energy * 0.5)).abs() < 1e-3);
    }

    #[test]
    fn reproduction_requires_energy_age_and_recent_meal() {
        let balance = BalanceConfig::default();
        let mut organism = prey();
        organism.age = 500;
        assert!(organism.can_reproduce(&balance.prey));
        organism.energy = organism.reproduction_cost(&balance.prey) - 1.0;
        assert!(!organism.can_reproduce(&balance.prey));
        organism.energy = 200.0;
        if let Some(forager) = organism.forager_mut() {
            forager.ticks_since_fed = 60;
        }
        assert!(!organism.can_reproduce(&balance.prey));
    }
}

// --- End of File: organism.rs ---
