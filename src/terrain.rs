// --- File: terrain.rs ---
use crate::constants::*;
use crate::organism::Organism;
use crate::utils::chance;
use crate::wall::Wall;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

// --- Terrain Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    #[default]
    Grass,
    Mud,
    Ice,
    Water,
    Desert,
    Mountain,
    Forest,
    Swamp,
}

impl TerrainType {
    pub const ALL: [TerrainType; 8] = [
        TerrainType::Grass,
        TerrainType::Mud,
        TerrainType::Ice,
        TerrainType::Water,
        TerrainType::Desert,
        TerrainType::Mountain,
        TerrainType::Forest,
        TerrainType::Swamp,
    ];

    /// Speed multiplier for an occupant with the given swim speed.
    pub fn movement_multiplier(self, swim_speed: f32) -> f32 {
        match self {
            TerrainType::Grass => 1.0,
            TerrainType::Mud => 0.6,
            TerrainType::Ice => 1.4,
            // Non-swimmers sink and barely move.
            TerrainType::Water if swim_speed <= 0.0 => 0.05,
            TerrainType::Water => swim_speed,
            TerrainType::Desert => 0.9,
            TerrainType::Mountain => 0.5,
            TerrainType::Forest => 0.8,
            TerrainType::Swamp => 0.7,
        }
    }

    /// Energy added to an occupant each tick (negative values drain).
    pub fn energy_delta(self, swim_speed: f32) -> f32 {
        match self {
            TerrainType::Grass | TerrainType::Ice => 0.0,
            TerrainType::Mud => -0.05,
            TerrainType::Water if swim_speed <= 0.0 => -0.5,
            TerrainType::Water if swim_speed < 0.5 => -0.2,
            TerrainType::Water => -0.05,
            TerrainType::Desert => -0.15,
            TerrainType::Mountain => -0.2,
            TerrainType::Forest => 0.05,
            TerrainType::Swamp => -0.3,
        }
    }

    pub fn is_water(self) -> bool {
        self == TerrainType::Water
    }
}

// --- Terrain Grid ---

/// Row-major grid of terrain cells plus the wall list. Cells are read-only
/// during a tick and only change through editor commands or map generation.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    width: f32,
    height: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<TerrainType>,
    walls: Vec<Wall>,
}

impl TerrainGrid {
    pub fn new(width: f32, height: f32, cell_size: f32, fill: TerrainType) -> Self {
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        Self {
            width,
            height,
            cell_size,
            cols,
            rows,
            cells: vec![fill; cols * rows],
            walls: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cells(&self) -> &[TerrainType] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [TerrainType] {
        &mut self.cells
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    /// Grid coordinates of `position`, clamped into the grid.
    #[inline]
    pub fn cell_coords(&self, position: Vec2) -> (usize, usize) {
        let col = (position.x / self.cell_size).floor().max(0.0) as usize;
        let row = (position.y / self.cell_size).floor().max(0.0) as usize;
        (col.min(self.cols - 1), row.min(self.rows - 1))
    }

    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> TerrainType {
        self.cells[row.min(self.rows - 1) * self.cols + col.min(self.cols - 1)]
    }

    pub fn set_cell(&mut self, col: usize, row: usize, terrain: TerrainType) {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col] = terrain;
        }
    }

    pub fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            (col as f32 + 0.5) * self.cell_size,
            (row as f32 + 0.5) * self.cell_size,
        )
    }

    #[inline]
    pub fn terrain_at(&self, position: Vec2) -> TerrainType {
        let (col, row) = self.cell_coords(position);
        self.cell(col, row)
    }

    /// Cells whose centre lies within `radius` of `center`, as (col, row).
    fn cells_in_circle(&self, center: Vec2, radius: f32) -> Vec<(usize, usize)> {
        if radius <= 0.0 {
            return Vec::new();
        }
        let (min_col, min_row) = self.cell_coords(center - Vec2::splat(radius));
        let (max_col, max_row) = self.cell_coords(center + Vec2::splat(radius));
        let radius_sq = radius * radius;
        let mut found = Vec::new();
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                if self.cell_center(col, row).distance_squared(center) <= radius_sq {
                    found.push((col, row));
                }
            }
        }
        found
    }

    /// Set every cell whose centre lies within the circle. Returns the number painted.
    pub fn paint_circle(&mut self, center: Vec2, radius: f32, terrain: TerrainType) -> usize {
        let cells = self.cells_in_circle(center, radius);
        for &(col, row) in &cells {
            self.set_cell(col, row, terrain);
        }
        cells.len()
    }

    /// Like [`paint_circle`](Self::paint_circle) but leaves a ragged rim: cells
    /// beyond `SOFT_RIM_START` of the radius are skipped at random.
    pub fn paint_circle_soft<R: Rng + ?Sized>(
        &mut self,
        center: Vec2,
        radius: f32,
        terrain: TerrainType,
        rng: &mut R,
    ) {
        let rim = radius * SOFT_RIM_START;
        for (col, row) in self.cells_in_circle(center, radius) {
            if self.cell_center(col, row).distance(center) > rim
                && chance(rng, SOFT_RIM_SKIP_CHANCE)
            {
                continue;
            }
            self.set_cell(col, row, terrain);
        }
    }

    pub fn count(&self, terrain: TerrainType) -> usize {
        self.cells.iter().filter(|&&t| t == terrain).count()
    }

    // --- Organism effects ---

    /// Set the organism's effective speed and apply the occupied cell's energy
    /// delta. Ice may lock the heading for this tick.
    pub fn apply_terrain_effects<R: Rng + ?Sized>(
        &self,
        organism: &mut Organism,
        ice_slip_chance: f64,
        rng: &mut R,
    ) -> TerrainType {
        let terrain = self.terrain_at(organism.position);
        organism.current_speed =
            organism.base_speed * terrain.movement_multiplier(organism.swim_speed);
        organism.energy += terrain.energy_delta(organism.swim_speed);
        organism.heading_locked = terrain == TerrainType::Ice && chance(rng, ice_slip_chance);
        terrain
    }

    /// Push the organism out of every wall it overlaps. When `reflect` is set,
    /// a heading that points into the wall is mirrored on the dominant axis of
    /// the separation normal. Returns whether any wall was hit.
    pub fn resolve_wall_collisions(&self, organism: &mut Organism, reflect: bool) -> bool {
        let radius = organism.size;
        let bounds = Vec2::new(self.width, self.height);
        let mut hit = false;
        for _ in 0..WALL_RESOLVE_PASSES {
            let mut moved = false;
            for wall in &self.walls {
                let Some((normal, depth)) = separation(wall, organism.position, radius, bounds)
                else {
                    continue;
                };
                organism.position += normal * depth;
                moved = true;
                hit = true;
                if reflect {
                    let direction = Vec2::from_angle(organism.heading);
                    if direction.dot(normal) < 0.0 {
                        let mirrored = if normal.x.abs() >= normal.y.abs() {
                            Vec2::new(-direction.x, direction.y)
                        } else {
                            Vec2::new(direction.x, -direction.y)
                        };
                        organism.heading = crate::utils::wrap_angle(mirrored.to_angle());
                    }
                }
            }
            if !moved {
                break;
            }
        }
        hit
    }

    pub fn collides_with_wall(&self, position: Vec2, radius: f32) -> bool {
        self.walls.iter().any(|wall| wall.collides(position, radius))
    }

    /// Closest point on any wall within `range` of `position`.
    pub fn nearest_wall_point(&self, position: Vec2, range: f32) -> Option<Vec2> {
        self.walls
            .iter()
            .map(|wall| wall.closest_point(position))
            .filter(|point| point.distance(position) < range)
            .min_by(|a, b| a.distance_squared(position).total_cmp(&b.distance_squared(position)))
    }

    pub fn is_water_ahead(&self, position: Vec2, heading: f32, distance: f32) -> bool {
        let ahead = position + Vec2::from_angle(heading) * distance;
        self.in_bounds(ahead) && self.terrain_at(ahead).is_water()
    }

    fn in_bounds(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }

    // --- Path checks ---

    /// Evenly spaced samples along the segment, excluding `from`.
    fn path_samples(from: Vec2, to: Vec2) -> Option<impl Iterator<Item = Vec2>> {
        let distance = from.distance(to);
        if distance < PATH_MIN_CHECK_DISTANCE {
            return None;
        }
        let steps =
            ((distance / PATH_SAMPLE_SPACING) as usize).clamp(PATH_MIN_SAMPLES, PATH_MAX_SAMPLES);
        Some((1..=steps).map(move |i| from.lerp(to, i as f32 / steps as f32)))
    }

    /// Whether any water lies on or beside the segment.
    pub fn water_on_path(&self, from: Vec2, to: Vec2) -> bool {
        let Some(samples) = Self::path_samples(from, to) else {
            return false;
        };
        let lateral = (to - from).normalize_or_zero().perp() * PATH_LATERAL_OFFSET;
        samples
            .flat_map(|p| [p, p + lateral, p - lateral])
            .filter(|p| self.in_bounds(*p))
            .any(|p| self.terrain_at(p).is_water())
    }

    /// Whether a body of `size` would scrape a wall travelling the segment.
    pub fn wall_on_path(&self, from: Vec2, to: Vec2, size: f32) -> bool {
        if self.walls.is_empty() {
            return false;
        }
        let Some(mut samples) = Self::path_samples(from, to) else {
            return false;
        };
        let clearance = size * WALL_CLEARANCE_FACTOR;
        if self.collides_with_wall(to, clearance) {
            return true;
        }
        samples.any(|p| self.collides_with_wall(p, clearance * PATH_WALL_CLEARANCE_SCALE))
    }

    pub fn is_path_safe(&self, from: Vec2, to: Vec2, size: f32, swim_speed: f32) -> bool {
        let water_blocks = swim_speed <= 0.0 && self.water_on_path(from, to);
        !water_blocks && !self.wall_on_path(from, to, size)
    }
}

/// Separation normal and depth needed to move a circle out of `wall`.
fn separation(wall: &Wall, center: Vec2, radius: f32, bounds: Vec2) -> Option<(Vec2, f32)> {
    let closest = wall.closest_point(center);
    let offset = center - closest;
    let distance = offset.length();
    if distance >= radius {
        return None;
    }
    if distance > DEGENERATE_EPSILON {
        return Some((offset / distance, radius - distance));
    }
    // Centre is inside the rectangle or on its edge: leave through the nearest
    // face whose exit point is still inside the world.
    let (min, max) = (wall.min(), wall.max());
    let faces = [
        (Vec2::NEG_X, center.x - min.x),
        (Vec2::X, max.x - center.x),
        (Vec2::NEG_Y, center.y - min.y),
        (Vec2::Y, max.y - center.y),
    ]
    .map(|(normal, face_distance)| (normal, face_distance.max(0.0) + radius));
    let exits_inside = |&(normal, depth): &(Vec2, f32)| {
        let exit = center + normal * depth;
        exit.x >= 0.0 && exit.y >= 0.0 && exit.x <= bounds.x && exit.y <= bounds.y
    };
    let nearest = |a: &(Vec2, f32), b: &(Vec2, f32)| a.1.total_cmp(&b.1);
    faces
        .into_iter()
        .filter(exits_inside)
        .min_by(nearest)
        .or_else(|| faces.into_iter().min_by(nearest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttributeMode, BalanceConfig};
    use crate::genetics::{AttributeOverrides, OrganismFactory};
    use crate::organism::Species;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prey_at(position: Vec2, rng: &mut StdRng) -> Organism {
        let mut factory = OrganismFactory::default();
        let mut organism = factory.spawn_from_defaults(
            Species::Prey,
            AttributeMode::Fixed,
            &AttributeOverrides::default(),
            position,
            &BalanceConfig::default(),
            rng,
        );
        organism.size = 6.0;
        organism
    }

    #[test]
    fn water_drowns_non_swimmers() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = TerrainGrid::new(400.0, 400.0, 20.0, TerrainType::Water);
        let mut organism = prey_at(Vec2::new(100.0, 100.0), &mut rng);
        let before = organism.energy;
        grid.apply_terrain_effects(&mut organism, 0.0, &mut rng);
        assert!(organism.current_speed < 0.1 * organism.base_speed + 1e-6);
        assert!(organism.energy < before);

        // A swimmer moves at its swim speed and loses less.
        grid.paint_circle(Vec2::new(100.0, 100.0), 5.0, TerrainType::Water);
        organism.swim_speed = 0.9;
        let before = organism.energy;
        grid.apply_terrain_effects(&mut organism, 0.0, &mut rng);
        assert!((organism.current_speed - organism.base_speed * 0.9).abs() < 1e-5);
        assert!((before - organism.energy - 0.05).abs() < 1e-4);
    }

    #[test]
    fn forest_is_the_only_restoring_terrain() {
        for terrain in TerrainType::ALL {
            let delta = terrain.energy_delta(0.0);
            if terrain == TerrainType::Forest {
                assert!(delta > 0.0);
            } else {
                assert!(delta <= 0.0, "{terrain:?}");
            }
        }
    }

    #[test]
    fn ice_always_locks_heading_when_slip_is_certain() {
        let mut rng = StdRng::seed_from_u64(9);
        let grid = TerrainGrid::new(400.0, 400.0, 20.0, TerrainType::Ice);
        let mut organism = prey_at(Vec2::new(50.0, 50.0), &mut rng);
        grid.apply_terrain_effects(&mut organism, 1.0, &mut rng);
        assert!(organism.heading_locked);
        assert!(organism.current_speed > organism.base_speed);
    }

    #[test]
    fn resolved_organisms_never_overlap_walls() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut grid = TerrainGrid::new(400.0, 400.0, 20.0, TerrainType::Grass);
        let wall = Wall::new(100.0, 100.0, 60.0, 40.0);
        grid.add_wall(wall);
        let starts = [
            Vec2::new(98.0, 120.0),  // left face
            Vec2::new(130.0, 103.0), // inside, near top
            Vec2::new(130.0, 120.0), // dead centre
            Vec2::new(100.0, 100.0), // exactly on a corner
            Vec2::new(163.0, 143.0), // outside corner
        ];
        for start in starts {
            let mut organism = prey_at(start, &mut rng);
            assert!(grid.resolve_wall_collisions(&mut organism, true));
            assert!(
                wall.distance_to(organism.position) >= organism.size - 1e-3,
                "start {start:?} ended at {:?}",
                organism.position
            );
        }
    }

    #[test]
    fn reflection_mirrors_heading_into_the_wall() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut grid = TerrainGrid::new(400.0, 400.0, 20.0, TerrainType::Grass);
        grid.add_wall(Wall::new(100.0, 0.0, 20.0, 400.0));
        let mut organism = prey_at(Vec2::new(97.0, 200.0), &mut rng);
        organism.heading = 0.0; // heading +x, into the wall
        grid.resolve_wall_collisions(&mut organism, true);
        assert!(Vec2::from_angle(organism.heading).x < 0.0);
    }

    #[test]
    fn paint_circle_uses_cell_centres() {
        let mut grid = TerrainGrid::new(200.0, 200.0, 20.0, TerrainType::Grass);
        let painted = grid.paint_circle(Vec2::new(100.0, 100.0), 15.0, TerrainType::Mud);
        // Centres at (90,90),(110,90),(90,110),(110,110) are ~14.1 away.
        assert_eq!(painted, 4);
        assert_eq!(grid.count(TerrainType::Mud), 4);
        assert_eq!(grid.terrain_at(Vec2::new(95.0, 95.0)), TerrainType::Mud);
    }

    #[test]
    fn path_checks_see_water_and_walls() {
        let mut grid = TerrainGrid::new(400.0, 400.0, 20.0, TerrainType::Grass);
        grid.paint_circle(Vec2::new(200.0, 200.0), 30.0, TerrainType::Water);
        let (from, to) = (Vec2::new(50.0, 200.0), Vec2::new(350.0, 200.0));
        assert!(grid.water_on_path(from, to));
        assert!(!grid.is_path_safe(from, to, 5.0, 0.0));
        assert!(grid.is_path_safe(from, to, 5.0, 0.6));

        grid.add_wall(Wall::new(250.0, 0.0, 10.0, 400.0));
        assert!(grid.wall_on_path(from, to, 5.0));
        // Very short hops are always safe.
        assert!(!grid.wall_on_path(from, from + Vec2::X * 5.0, 5.0));
    }
}

// --- End of File: terrain.rs ---
