use evolarium::{
    AttributeOverrides, ConfigError, MapType, Simulation, SimulationConfig, Species,
    TerrainPercentages, Wall,
};
use glam::Vec2;

/// Empty open world: no food, no automatic stop.
fn quiet_config() -> SimulationConfig {
    SimulationConfig {
        map_type: MapType::Open,
        prey_count: 0,
        predator_count: 0,
        cannibal_count: 0,
        food_count: 0,
        food_spawn_rate: 0.0,
        stop_on_extinction: false,
        seed: Some(7),
        ..SimulationConfig::default()
    }
}

fn still_prey(energy: f32, stamina: f32) -> AttributeOverrides {
    AttributeOverrides {
        speed: Some(1.0),
        size: Some(6.0),
        swim_speed: Some(0.0),
        stamina_max: Some(stamina),
        energy: Some(energy),
        lifespan: Some(10_000.0),
        ..Default::default()
    }
}

#[test]
fn energy_stays_within_stamina_on_a_random_map() {
    let mut sim = Simulation::new(SimulationConfig {
        seed: Some(3),
        stop_on_extinction: false,
        ..SimulationConfig::default()
    })
    .unwrap();
    for _ in 0..200 {
        sim.tick();
        for organism in sim.prey().iter().chain(sim.hunters()) {
            assert!(
                organism.energy >= 0.0,
                "organism {:?} energy {}",
                organism.id,
                organism.energy
            );
            assert!(organism.energy <= organism.stamina_max + 1e-3);
        }
    }
}

#[test]
fn organisms_age_one_tick_at_a_time_and_die_at_lifespan() {
    let mut sim = Simulation::new(quiet_config()).unwrap();
    let id = sim.spawn_organism(
        Species::Prey,
        Vec2::new(400.0, 300.0),
        Some(AttributeOverrides {
            lifespan: Some(5.0),
            ..still_prey(80.0, 100.0)
        }),
    );
    for expected_age in 1..5 {
        sim.tick();
        assert_eq!(sim.organism(id).map(|o| o.age), Some(expected_age));
    }
    sim.tick();
    assert!(sim.organism(id).is_none());
    assert_eq!(sim.stats().deaths.old_age, 1);
}

#[test]
fn organisms_never_end_a_tick_inside_a_wall() {
    let mut sim = Simulation::new(SimulationConfig {
        prey_count: 40,
        ..quiet_config()
    })
    .unwrap();
    sim.add_wall(300.0, 200.0, 120.0, 120.0);
    sim.add_wall(500.0, 350.0, 40.0, 150.0);
    // Walls reaching the world edge, like maze rows and edge rocks.
    sim.add_wall(600.0, 420.0, 10.0, 180.0);
    sim.add_wall(0.0, 100.0, 150.0, 10.0);
    sim.add_wall(200.0, 0.0, 10.0, 120.0);
    let walls: Vec<Wall> = sim.terrain().unwrap().walls().to_vec();
    for _ in 0..150 {
        sim.tick();
        for organism in sim.prey() {
            for wall in &walls {
                assert!(
                    wall.distance_to(organism.position) >= organism.size - 1e-3,
                    "organism {:?} overlaps {:?}",
                    organism.id,
                    wall
                );
            }
        }
    }
}

#[test]
fn starving_organism_is_removed_after_its_update() {
    let mut sim = Simulation::new(quiet_config()).unwrap();
    let start = Vec2::new(400.0, 300.0);
    let id = sim.spawn_organism(Species::Prey, start, Some(still_prey(0.01, 100.0)));
    sim.organism_mut(id).unwrap().consumption_rate = 0.1;
    sim.tick();
    assert!(sim.organism(id).is_none());
    assert_eq!(sim.stats().deaths.starvation, 1);
}

#[test]
fn eating_food_adds_its_value_and_consumes_it() {
    let mut config = quiet_config();
    config.balance.prey.reproduction_chance = 0.0;
    let mut sim = Simulation::new(config).unwrap();
    let position = Vec2::new(400.0, 300.0);
    let id = sim.spawn_organism(Species::Prey, position, Some(still_prey(50.0, 300.0)));
    sim.organism_mut(id).unwrap().consumption_rate = 0.0;
    assert!(sim.add_food(position, Some(200.0)).is_some());

    sim.tick();
    assert_eq!(sim.organism(id).map(|o| o.energy), Some(250.0));
    assert!(sim.food().is_empty());
}

#[test]
fn reproduction_requires_energy_above_cost() {
    let mut config = quiet_config();
    config.balance.prey.reproduction_chance = 1.0;
    config.balance.prey.min_reproduction_age = 0;
    config.balance.prey.offspring_promotion_chance = 0.0;

    // Cost is 30 with stamina 100; 10 energy is not enough.
    let mut sim = Simulation::new(config.clone()).unwrap();
    sim.spawn_organism(Species::Prey, Vec2::new(400.0, 300.0), Some(still_prey(10.0, 100.0)));
    sim.tick();
    assert_eq!(sim.prey().len(), 1);
    assert_eq!(sim.stats().births, 0);

    let mut sim = Simulation::new(config).unwrap();
    let start = Vec2::new(400.0, 300.0);
    let parent = sim.spawn_organism(Species::Prey, start, Some(still_prey(100.0, 100.0)));
    sim.tick();
    assert_eq!(sim.prey().len(), 2);
    assert_eq!(sim.stats().births, 1);
    let parent = sim.organism(parent).unwrap();
    assert_eq!(parent.offspring, 1);
    assert!(parent.rest_timer > 0);
    assert!(sim.prey().iter().all(|o| o.species == Species::Prey));
}

#[test]
fn well_fed_predator_turns_into_a_cannibal_after_a_kill() {
    let mut config = quiet_config();
    config.balance.predator.kill_promotion_chance = 1.0;
    config.balance.predator.reproduction_chance = 0.0;
    config.balance.prey.reproduction_chance = 0.0;
    let mut sim = Simulation::new(config).unwrap();
    let start = Vec2::new(400.0, 300.0);
    let prey = sim.spawn_organism(Species::Prey, start, Some(still_prey(80.0, 100.0)));
    let predator = sim.spawn_organism(
        Species::Predator,
        Vec2::new(405.0, 300.0),
        Some(AttributeOverrides {
            size: Some(8.0),
            ..Default::default()
        }),
    );
    {
        let hunter = sim.organism_mut(predator).unwrap();
        hunter.energy = hunter.stamina_max;
    }

    sim.tick();
    assert!(sim.organism(prey).is_none());
    assert!(sim.organism(predator).is_none());
    let hunters = sim.hunters();
    assert_eq!(hunters.len(), 1);
    assert_eq!(hunters[0].species, Species::Cannibal);
    assert_ne!(hunters[0].id, predator);
    assert_eq!(sim.stats().deaths.eaten, 1);
    assert_eq!(sim.stats().deaths.transformed, 1);
    assert_eq!(sim.stats().births, 0);
}

#[test]
fn bad_custom_percentages_leave_the_world_untouched() {
    let mut sim = Simulation::new(SimulationConfig {
        seed: Some(5),
        ..SimulationConfig::default()
    })
    .unwrap();
    sim.tick();
    let prey_before = sim.prey().to_vec();

    let rejected = sim.initialize(SimulationConfig {
        map_type: MapType::Custom,
        terrain_percentages: TerrainPercentages {
            grass: 37,
            ..TerrainPercentages::default()
        },
        ..SimulationConfig::default()
    });
    assert_eq!(rejected, Err(ConfigError::TerrainPercentages { total: 97 }));
    assert_eq!(sim.tick_count(), 1);
    assert_eq!(sim.prey(), prey_before.as_slice());
}

#[test]
fn paused_and_finished_runs_do_not_advance() {
    let mut sim = Simulation::new(SimulationConfig {
        prey_count: 5,
        ..quiet_config()
    })
    .unwrap();
    sim.pause();
    sim.tick();
    assert_eq!(sim.tick_count(), 0);
    sim.resume();
    sim.tick();
    assert_eq!(sim.tick_count(), 1);
    sim.toggle_pause();
    assert!(sim.is_paused());
    sim.tick();
    assert_eq!(sim.tick_count(), 1);
    sim.toggle_pause();
    sim.tick();
    assert_eq!(sim.tick_count(), 2);

    // Without hunters the prey win on the first tick.
    let mut sim = Simulation::new(SimulationConfig {
        prey_count: 5,
        stop_on_extinction: true,
        ..quiet_config()
    })
    .unwrap();
    sim.tick();
    assert!(sim.is_finished());
    assert_eq!(sim.final_stats().map(|f| f.winner), Some(evolarium::Winner::Prey));
    sim.tick();
    assert_eq!(sim.tick_count(), 1);
}

#[test]
fn reset_restarts_with_the_same_configuration() {
    let config = SimulationConfig {
        seed: Some(11),
        ..SimulationConfig::default()
    };
    let fresh = Simulation::new(config.clone()).unwrap();
    let mut sim = Simulation::new(config).unwrap();
    sim.set_speed_multiplier(3);
    sim.tick();
    sim.reset();
    assert_eq!(sim.tick_count(), 0);
    assert_eq!(sim.speed_multiplier(), 3);
    assert_eq!(sim.prey(), fresh.prey());
}

#[test]
fn snapshot_serializes_to_json() {
    let sim = Simulation::new(SimulationConfig {
        seed: Some(1),
        ..SimulationConfig::default()
    })
    .unwrap();
    let json = serde_json::to_value(sim.snapshot()).unwrap();
    assert_eq!(json["tick"], 0);
    assert_eq!(
        json["prey"].as_array().map(Vec::len),
        Some(sim.config().prey_count)
    );
}
