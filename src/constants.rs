// --- File: constants.rs ---
// --- Global Simulation Constants ---
pub const DEFAULT_WORLD_WIDTH: f32 = 800.0;
pub const DEFAULT_WORLD_HEIGHT: f32 = 600.0;
pub const DEFAULT_CELL_SIZE: f32 = 20.0;
pub const MIN_WORLD_EXTENT: f32 = 200.0;

// Ticks advanced per `tick()` call.
pub const INITIAL_SPEED_MULTIPLIER: u32 = 1;
pub const MIN_SPEED_MULTIPLIER: u32 = 1;
pub const MAX_SPEED_MULTIPLIER: u32 = 10;

pub const INITIAL_PREY_COUNT: usize = 20;
pub const INITIAL_PREDATOR_COUNT: usize = 3;
pub const INITIAL_CANNIBAL_COUNT: usize = 1;
pub const INITIAL_FOOD_COUNT: usize = 40;
pub const MAX_FOOD: usize = 300;
// Hard cap on living organisms; spawns beyond it are dropped.
pub const MAX_ORGANISMS: usize = 5_000;

// --- Placement ---
pub const SPAWN_EDGE_MARGIN: f32 = 50.0;
pub const FOOD_EDGE_MARGIN: f32 = 20.0;
pub const OFFSPRING_OFFSET: f32 = 20.0;
pub const SPAWN_PLACEMENT_ATTEMPTS: usize = 50;
pub const FOOD_PLACEMENT_ATTEMPTS: usize = 20;

// --- Food ---
pub const MIN_FOOD_VALUE: f32 = 100.0;
pub const MAX_FOOD_VALUE: f32 = 300.0;
pub const FOOD_VALUE_PER_RADIUS: f32 = 50.0;
pub const MIN_FOOD_RADIUS: f32 = 2.0;

// --- Terrain probing ---
pub const WATER_LOOKAHEAD: f32 = 30.0;
pub const WALL_CLEARANCE_FACTOR: f32 = 3.0;
pub const PATH_WALL_CLEARANCE_SCALE: f32 = 0.8;
pub const PATH_SAMPLE_SPACING: f32 = 20.0;
pub const PATH_MIN_SAMPLES: usize = 3;
pub const PATH_MAX_SAMPLES: usize = 10;
pub const PATH_LATERAL_OFFSET: f32 = 15.0;
pub const PATH_MIN_CHECK_DISTANCE: f32 = 10.0;
pub const WALL_RESOLVE_PASSES: usize = 8;
pub const WALL_AVOID_JITTER: f32 = 0.2;

// --- Map generation ---
// Fine cells per coarse biome cell.
pub const BIOME_COARSE_SCALE: usize = 8;
pub const SOFT_RIM_START: f32 = 0.8;
pub const SOFT_RIM_SKIP_CHANCE: f64 = 0.5;

// Smallest body size an editor override may set.
pub const MIN_ORGANISM_SIZE: f32 = 1.0;

// Below this length a direction vector is treated as degenerate.
pub const DEGENERATE_EPSILON: f32 = 1e-3;

// --- Statistics ---
pub const GENERATION_MIN_POPULATION: usize = 20;
pub const GENERATION_RECOVERY_RATIO: f32 = 0.75;

// --- Editor ---
pub const MIN_EDITOR_FACTOR: f32 = 0.5;
pub const MAX_EDITOR_FACTOR: f32 = 2.0;

// --- End of File: constants.rs ---
