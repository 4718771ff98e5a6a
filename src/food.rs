// --- File: food.rs ---
use crate::constants::*;
use crate::terrain::TerrainGrid;
use crate::utils::uniform;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: FoodId,
    pub position: Vec2,
    /// Collision radius.
    pub size: f32,
    /// Energy granted to the prey that eats it.
    pub value: f32,
}

impl Food {
    pub fn new(id: FoodId, position: Vec2, value: f32) -> Self {
        Self {
            id,
            position,
            size: (value / FOOD_VALUE_PER_RADIUS).max(MIN_FOOD_RADIUS),
            value,
        }
    }

    /// Whether a body of `radius` at `position` touches this item.
    #[inline]
    pub fn touches(&self, position: Vec2, radius: f32) -> bool {
        self.position.distance(position) < self.size + radius
    }
}

/// Pick a wall-free spot for a new food item, keeping clear of the world
/// edge. Gives up after a bounded number of attempts.
pub fn find_food_position<R: Rng + ?Sized>(
    width: f32,
    height: f32,
    terrain: Option<&TerrainGrid>,
    rng: &mut R,
) -> Option<Vec2> {
    for _ in 0..FOOD_PLACEMENT_ATTEMPTS {
        let candidate = Vec2::new(
            uniform(rng, FOOD_EDGE_MARGIN, width - FOOD_EDGE_MARGIN),
            uniform(rng, FOOD_EDGE_MARGIN, height - FOOD_EDGE_MARGIN),
        );
        let blocked =
            terrain.is_some_and(|grid| grid.collides_with_wall(candidate, MIN_FOOD_RADIUS));
        if !blocked {
            return Some(candidate);
        }
    }
    None
}

pub fn random_food_value<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    uniform(rng, MIN_FOOD_VALUE, MAX_FOOD_VALUE)
}


// --- End of File: food.rs ---
