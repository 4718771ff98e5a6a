// --- File: mapgen.rs ---
//! Terrain layouts for each [`MapType`].
use crate::config::{MapType, SimulationConfig, TerrainPercentages};
use crate::constants::*;
use crate::terrain::{TerrainGrid, TerrainType};
use crate::utils::{chance, uniform};
use crate::wall::Wall;
use glam::Vec2;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Terrain mix used by [`MapType::Random`] and [`MapType::Diverse`].
pub const RANDOM_MAP_WEIGHTS: [(TerrainType, u32); 8] = [
    (TerrainType::Grass, 40),
    (TerrainType::Mud, 10),
    (TerrainType::Ice, 10),
    (TerrainType::Water, 10),
    (TerrainType::Desert, 10),
    (TerrainType::Mountain, 5),
    (TerrainType::Forest, 10),
    (TerrainType::Swamp, 5),
];

/// Build the terrain for `config.map_type`. [`MapType::Open`] has no grid.
pub fn generate<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> Option<TerrainGrid> {
    let (w, h, cell) = (config.width, config.height, config.cell_size);
    let noise = config.balance.biome_noise_chance;
    let grid = match config.map_type {
        MapType::Open => return None,
        MapType::Random => biome_map(w, h, cell, &RANDOM_MAP_WEIGHTS, noise, rng),
        MapType::Custom => custom_map(w, h, cell, &config.terrain_percentages, noise, rng),
        MapType::Plains => plains(w, h, cell, rng),
        MapType::Island => island(w, h, cell, rng),
        MapType::Maze => maze(w, h, cell, rng),
        MapType::Mountainous => mountainous(w, h, cell, rng),
        MapType::Diverse => diverse(w, h, cell, noise, rng),
    };
    log::debug!(
        "generated {:?} map: {}x{} cells, {} walls",
        config.map_type,
        grid.cols(),
        grid.rows(),
        grid.walls().len()
    );
    Some(grid)
}

pub fn custom_map<R: Rng + ?Sized>(
    width: f32,
    height: f32,
    cell_size: f32,
    percentages: &TerrainPercentages,
    noise: f64,
    rng: &mut R,
) -> TerrainGrid {
    biome_map(width, height, cell_size, &percentages.weights(), noise, rng)
}

/// Weighted biome generation: draw a coarse grid of terrain types, then fill
/// each fine cell from its four surrounding coarse cells with bilinear
/// weights, occasionally overriding with an independent draw.
pub fn biome_map<R: Rng + ?Sized>(
    width: f32,
    height: f32,
    cell_size: f32,
    weights: &[(TerrainType, u32)],
    noise: f64,
    rng: &mut R,
) -> TerrainGrid {
    let mut grid = TerrainGrid::new(width, height, cell_size, TerrainType::Grass);
    let distribution = match WeightedIndex::new(weights.iter().map(|(_, w)| *w)) {
        Ok(distribution) => distribution,
        Err(err) => {
            log::warn!("terrain weights unusable ({err}), falling back to grass");
            return grid;
        }
    };
    let kinds: Vec<TerrainType> = weights.iter().map(|(t, _)| *t).collect();

    let cols = grid.cols();
    let coarse_cols = cols / BIOME_COARSE_SCALE + 1;
    let coarse_rows = grid.rows() / BIOME_COARSE_SCALE + 1;
    let coarse: Vec<TerrainType> = (0..coarse_cols * coarse_rows)
        .map(|_| kinds[distribution.sample(rng)])
        .collect();
    let coarse_at = |cx: usize, cy: usize| {
        coarse[cy.min(coarse_rows - 1) * coarse_cols + cx.min(coarse_cols - 1)]
    };

    // Rows are independent; each gets its own generator derived from one master seed.
    let master_seed: u64 = rng.r#gen();
    let scale = BIOME_COARSE_SCALE as f32;
    grid.cells_mut()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, cells)| {
            let mut row_rng = StdRng::seed_from_u64(master_seed.wrapping_add(row as u64));
            let gy = row as f32 / scale;
            let (gy0, wy) = (gy.floor() as usize, gy.fract());
            for (col, cell) in cells.iter_mut().enumerate() {
                if chance(&mut row_rng, noise) {
                    *cell = kinds[distribution.sample(&mut row_rng)];
                    continue;
                }
                let gx = col as f32 / scale;
                let (gx0, wx) = (gx.floor() as usize, gx.fract());
                let corners = [
                    (coarse_at(gx0, gy0), (1.0 - wx) * (1.0 - wy)),
                    (coarse_at(gx0, gy0 + 1), (1.0 - wx) * wy),
                    (coarse_at(gx0 + 1, gy0), wx * (1.0 - wy)),
                    (coarse_at(gx0 + 1, gy0 + 1), wx * wy),
                ];
                *cell = pick_weighted(&corners, row_rng.r#gen::<f32>());
            }
        });
    grid
}

fn pick_weighted(options: &[(TerrainType, f32)], roll: f32) -> TerrainType {
    let total: f32 = options.iter().map(|(_, w)| w).sum();
    let mut remaining = roll * total;
    for &(terrain, weight) in options {
        if remaining < weight {
            return terrain;
        }
        remaining -= weight;
    }
    options.first().map_or(TerrainType::Grass, |(t, _)| *t)
}

// --- Predefined layouts ---

fn random_point<R: Rng + ?Sized>(width: f32, height: f32, margin: f32, rng: &mut R) -> Vec2 {
    Vec2::new(
        uniform(rng, margin, width - margin),
        uniform(rng, margin, height - margin),
    )
}

fn count<R: Rng + ?Sized>(rng: &mut R, low: usize, high: usize) -> usize {
    rng.gen_range(low..=high)
}

fn scatter_rocks<R: Rng + ?Sized>(
    grid: &mut TerrainGrid,
    count: usize,
    min_side: f32,
    max_side: f32,
    square: bool,
    rng: &mut R,
) {
    let (width, height) = (grid.width(), grid.height());
    for _ in 0..count {
        let x = uniform(rng, 0.0, width - 30.0);
        let y = uniform(rng, 0.0, height - 30.0);
        let w = uniform(rng, min_side, max_side);
        let h = if square { w } else { uniform(rng, min_side, max_side) };
        grid.add_wall(Wall::new(x, y, w, h));
    }
}

fn plains<R: Rng + ?Sized>(width: f32, height: f32, cell_size: f32, rng: &mut R) -> TerrainGrid {
    let mut grid = TerrainGrid::new(width, height, cell_size, TerrainType::Grass);
    grid.paint_circle_soft(Vec2::new(width / 4.0, height / 4.0), 100.0, TerrainType::Forest, rng);
    grid.paint_circle_soft(
        Vec2::new(width * 0.75, height * 0.75),
        80.0,
        TerrainType::Forest,
        rng,
    );

    // A river meandering down the middle.
    let half_width_cells = (40.0 / cell_size).max(1.0) as isize;
    let cols = grid.cols() as isize;
    for row in 0..grid.rows() {
        let centre = cols / 2 + (10.0 * (row as f32 / 10.0).sin()) as isize;
        let start = (centre - half_width_cells).max(0);
        let end = (centre + half_width_cells).min(cols);
        for col in start..end {
            grid.set_cell(col as usize, row, TerrainType::Water);
        }
    }

    scatter_rocks(&mut grid, 10, 15.0, 40.0, true, rng);
    grid
}

fn island<R: Rng + ?Sized>(width: f32, height: f32, cell_size: f32, rng: &mut R) -> TerrainGrid {
    let mut grid = TerrainGrid::new(width, height, cell_size, TerrainType::Water);
    let centre = Vec2::new(width / 2.0, height / 2.0);
    let radius = width.min(height) * 0.4;
    grid.paint_circle_soft(centre, radius, TerrainType::Grass, rng);
    grid.paint_circle_soft(
        centre - Vec2::splat(radius / 3.0),
        radius / 3.0,
        TerrainType::Forest,
        rng,
    );
    grid.paint_circle_soft(
        centre + Vec2::new(radius / 2.0, 0.0),
        radius / 4.0,
        TerrainType::Mountain,
        rng,
    );
    grid.paint_circle_soft(
        centre + Vec2::new(0.0, radius / 2.0),
        radius / 5.0,
        TerrainType::Swamp,
        rng,
    );

    // Rocks scattered in the surrounding water.
    for _ in 0..15 {
        let angle = rng.gen_range(0.0..TAU);
        let distance = uniform(rng, radius * 1.1, radius * 1.5);
        let corner = centre + Vec2::from_angle(angle) * distance;
        if corner.x >= 0.0
            && corner.y >= 0.0
            && corner.x < width - 20.0
            && corner.y < height - 20.0
        {
            let side = uniform(rng, 15.0, 30.0);
            grid.add_wall(Wall::new(corner.x, corner.y, side, side));
        }
    }
    grid
}

fn maze<R: Rng + ?Sized>(width: f32, height: f32, cell_size: f32, rng: &mut R) -> TerrainGrid {
    const THICKNESS: f32 = 10.0;
    const SPACING: f32 = 100.0;
    let mut grid = TerrainGrid::new(width, height, cell_size, TerrainType::Grass);

    let mut y = SPACING;
    while y < height {
        let gap = uniform(rng, 0.0, width - SPACING);
        push_if_solid(&mut grid, Wall::new(0.0, y, gap, THICKNESS));
        push_if_solid(
            &mut grid,
            Wall::new(gap + SPACING, y, width - gap - SPACING, THICKNESS),
        );
        y += SPACING;
    }
    let mut x = SPACING;
    while x < width {
        let gap = uniform(rng, 0.0, height - SPACING);
        push_if_solid(&mut grid, Wall::new(x, 0.0, THICKNESS, gap));
        push_if_solid(
            &mut grid,
            Wall::new(x, gap + SPACING, THICKNESS, height - gap - SPACING),
        );
        x += SPACING;
    }

    let patches = [
        TerrainType::Mud,
        TerrainType::Ice,
        TerrainType::Swamp,
        TerrainType::Desert,
    ];
    for _ in 0..count(rng, 5, 10) {
        let centre = random_point(width, height, 50.0, rng);
        let radius = uniform(rng, 30.0, 60.0);
        let terrain = patches[rng.gen_range(0..patches.len())];
        grid.paint_circle_soft(centre, radius, terrain, rng);
    }
    grid
}

fn push_if_solid(grid: &mut TerrainGrid, wall: Wall) {
    if wall.width > 0.0 && wall.height > 0.0 {
        grid.add_wall(wall);
    }
}

fn mountainous<R: Rng + ?Sized>(
    width: f32,
    height: f32,
    cell_size: f32,
    rng: &mut R,
) -> TerrainGrid {
    let mut grid = TerrainGrid::new(width, height, cell_size, TerrainType::Mountain);
    let features = [
        (TerrainType::Grass, (3, 6), (60.0, 120.0)),
        (TerrainType::Water, (2, 4), (30.0, 70.0)),
        (TerrainType::Desert, (1, 3), (40.0, 80.0)),
    ];
    for (terrain, (low, high), (min_radius, max_radius)) in features {
        for _ in 0..count(rng, low, high) {
            let centre = random_point(width, height, 50.0, rng);
            let radius = uniform(rng, min_radius, max_radius);
            grid.paint_circle_soft(centre, radius, terrain, rng);
        }
    }
    let peaks = count(rng, 20, 40);
    scatter_rocks(&mut grid, peaks, 10.0, 40.0, false, rng);
    grid
}

fn diverse<R: Rng + ?Sized>(
    width: f32,
    height: f32,
    cell_size: f32,
    noise: f64,
    rng: &mut R,
) -> TerrainGrid {
    let mut grid = biome_map(width, height, cell_size, &RANDOM_MAP_WEIGHTS, noise, rng);
    let base_radius = width.min(height) / 8.0;
    let anchors = [
        (0.25, 0.25),
        (0.75, 0.25),
        (0.25, 0.75),
        (0.75, 0.75),
        (1.0 / 6.0, 0.5),
        (5.0 / 6.0, 0.5),
        (0.5, 1.0 / 6.0),
        (0.5, 5.0 / 6.0),
    ];
    for (terrain, (fx, fy)) in TerrainType::ALL.into_iter().zip(anchors) {
        let radius = base_radius * uniform(rng, 0.7, 1.3);
        grid.paint_circle_soft(Vec2::new(width * fx, height * fy), radius, terrain, rng);
    }
    let walls = count(rng, 10, 20);
    scatter_rocks(&mut grid, walls, 15.0, 50.0, false, rng);
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(map_type: MapType) -> SimulationConfig {
        SimulationConfig {
            map_type,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn open_map_has_no_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&config(MapType::Open), &mut rng).is_none());
    }

    #[test]
    fn biome_generation_is_deterministic_per_seed() {
        let build = || {
            let mut rng = StdRng::seed_from_u64(77);
            biome_map(800.0, 600.0, 20.0, &RANDOM_MAP_WEIGHTS, 0.15, &mut rng)
        };
        assert_eq!(build().cells(), build().cells());
    }

    #[test]
    fn single_weight_custom_map_is_uniform() {
        let mut rng = StdRng::seed_from_u64(5);
        let percentages = TerrainPercentages {
            grass: 0,
            water: 100,
            mud: 0,
            ice: 0,
            desert: 0,
            mountain: 0,
            forest: 0,
            swamp: 0,
        };
        let grid = custom_map(400.0, 400.0, 20.0, &percentages, 0.15, &mut rng);
        assert_eq!(grid.count(TerrainType::Water), grid.cols() * grid.rows());
    }

    #[test]
    fn predefined_maps_have_expected_features() {
        let mut rng = StdRng::seed_from_u64(9);
        let island = generate(&config(MapType::Island), &mut rng).unwrap();
        assert_eq!(island.terrain_at(Vec2::new(5.0, 5.0)), TerrainType::Water);
        assert_ne!(island.terrain_at(Vec2::new(400.0, 300.0)), TerrainType::Water);

        let maze = generate(&config(MapType::Maze), &mut rng).unwrap();
        assert!(!maze.walls().is_empty());
        assert!(maze.walls().iter().all(|w| w.width > 0.0 && w.height > 0.0));

        let plains = generate(&config(MapType::Plains), &mut rng).unwrap();
        assert!(plains.count(TerrainType::Water) > 0);
        assert_eq!(plains.walls().len(), 10);

        let diverse = generate(&config(MapType::Diverse), &mut rng).unwrap();
        for terrain in TerrainType::ALL {
            assert!(diverse.count(terrain) > 0, "{terrain:?} missing");
        }
    }

    #[test]
    fn small_worlds_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        for map_type in [
            MapType::Random,
            MapType::Plains,
            MapType::Island,
            MapType::Maze,
            MapType::Mountainous,
            MapType::Diverse,
        ] {
            let cfg = SimulationConfig {
                width: 200.0,
                height: 200.0,
                ..config(map_type)
            };
            assert!(generate(&cfg, &mut rng).is_some());
        }
    }
}

// --- End of File: mapgen.rs ---
