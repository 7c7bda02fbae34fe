use approx::assert_relative_eq;
use segrace::core::car::EntryPars;
use segrace::core::driver::DriverPars;
use segrace::core::error::SetupError;
use segrace::core::events::{EventKind, EventPars, PerfModifiers};
use segrace::core::overtake::OvertakePars;
use segrace::core::race::{Race, RacePars, SimConstants, WeatherCondition};
use segrace::core::strategy::{StrategyPars, StrategyTier};
use segrace::core::team::TeamPars;
use segrace::core::tireset::{Compound, TireConfig};
use segrace::core::track::{SegmentKind, SegmentPars, TrackPars};
use segrace::pre::read_sim_pars::SimPars;

fn straight(length: f64) -> SegmentPars {
    SegmentPars {
        kind: SegmentKind::Straight,
        length,
        radius: 0.0,
        angle: 0.0,
    }
}

fn corner(radius: f64, angle: f64) -> SegmentPars {
    SegmentPars {
        kind: SegmentKind::Corner,
        length: 0.0,
        radius,
        angle,
    }
}

fn driver(name: &str, racecraft: f64, awareness: f64) -> DriverPars {
    DriverPars {
        name: name.to_owned(),
        experience: 80.0,
        racecraft,
        awareness,
        pace: 85.0,
    }
}

fn team(name: &str, top_speed: f64, acceleration: f64) -> TeamPars {
    TeamPars {
        name: name.to_owned(),
        top_speed,
        acceleration,
        braking: 25.0,
        base_tire_grip: 1.5,
        pit_stop_multiplier: 1.0,
    }
}

fn entry(driver: &str, team: &str, tier: StrategyTier) -> EntryPars {
    EntryPars {
        driver: driver.to_owned(),
        team: team.to_owned(),
        starting_compound: Compound::Medium,
        strategy: tier,
    }
}

/// Two cars on a flat 1000m straight without tire wear, mistakes or events.
fn drag_race_pars() -> SimPars {
    SimPars {
        race_pars: RacePars {
            tot_no_laps: 1,
            weather: Some(WeatherCondition::Sunny),
            seed: 0,
            d_per_gridpos: 0.0,
            overtake_pars: OvertakePars::default(),
            entries: vec![
                entry("Car A", "Fast", StrategyTier::Balanced),
                entry("Car B", "Slow", StrategyTier::Balanced),
            ],
        },
        track_pars: TrackPars {
            name: "Drag Strip".to_owned(),
            segments: vec![straight(1000.0)],
        },
        driver_pars_all: vec![driver("Car A", 85.0, 100.0), driver("Car B", 85.0, 100.0)],
        team_pars_all: vec![team("Fast", 50.0, 1000.0), team("Slow", 40.0, 1000.0)],
        tire_config: TireConfig::default(),
        sim_constants: SimConstants {
            topspeed_scale: 100.0,
            base_wear_rate: 0.0,
            mistake_prob: 0.0,
            ..SimConstants::default()
        },
        strategy_pars: StrategyPars::default(),
        event_pars: EventPars {
            lap_event_prob: 0.0,
            ..EventPars::default()
        },
    }
}

/// A short oval with a full field, high tire wear and all random effects active.
fn oval_race_pars() -> SimPars {
    SimPars {
        race_pars: RacePars {
            tot_no_laps: 12,
            weather: None,
            seed: 42,
            d_per_gridpos: 8.0,
            overtake_pars: OvertakePars::default(),
            entries: vec![
                entry("Ann", "Blue", StrategyTier::Aggressive),
                entry("Bob", "Red", StrategyTier::Balanced),
                entry("Cid", "Blue", StrategyTier::Conservative),
                entry("Dee", "Red", StrategyTier::Balanced),
                entry("Eve", "Green", StrategyTier::Aggressive),
            ],
        },
        track_pars: TrackPars {
            name: "Oval".to_owned(),
            segments: vec![
                straight(600.0),
                corner(80.0, 180.0),
                straight(600.0),
                corner(-60.0, -180.0),
            ],
        },
        driver_pars_all: vec![
            driver("Ann", 95.0, 70.0),
            driver("Bob", 80.0, 90.0),
            driver("Cid", 88.0, 60.0),
            driver("Dee", 70.0, 40.0),
            driver("Eve", 99.0, 95.0),
        ],
        team_pars_all: vec![
            team("Blue", 95.0, 12.0),
            team("Red", 90.0, 10.0),
            team("Green", 85.0, 14.0),
        ],
        tire_config: TireConfig::default(),
        sim_constants: SimConstants {
            base_wear_rate: 0.004,
            mistake_prob: 0.05,
            ..SimConstants::default()
        },
        strategy_pars: StrategyPars::default(),
        event_pars: EventPars {
            lap_event_prob: 0.3,
            t_event_min: 2.0,
            t_event_max: 8.0,
        },
    }
}

const MAX_TIMESTEPS: usize = 1_000_000;

fn run_to_end(race: &mut Race) {
    let mut no_steps = 0;
    while !race.get_all_finished() {
        race.simulate_timestep();
        no_steps += 1;
        assert!(no_steps < MAX_TIMESTEPS, "race did not terminate");
    }
}

#[test]
fn faster_car_wins_drag_race() {
    let mut race = Race::new(&drag_race_pars(), 0.1, 0).unwrap();
    run_to_end(&mut race);

    let t_a = race.cars_list[0].get_finish_time().unwrap();
    let t_b = race.cars_list[1].get_finish_time().unwrap();

    assert!(t_a < t_b);
    assert_relative_eq!(t_a, 1000.0 / 50.0, epsilon = 1e-6);
    assert_relative_eq!(t_b, 1000.0 / 40.0, epsilon = 1e-6);
    assert_eq!(race.get_ranking(), vec![0, 1]);

    let result = race.get_race_result();
    assert_eq!(result.get_winner(), Some("Car A"));
    assert_eq!(result.entries[1].strategy, "M(1)");
    assert_eq!(result.entries[1].no_pitstops, 0);
}

#[test]
fn finish_time_lies_within_last_timestep() {
    let mut pars = drag_race_pars();
    pars.track_pars.segments = vec![straight(1003.0)];
    let timestep_size = 0.1;
    let mut race = Race::new(&pars, timestep_size, 0).unwrap();

    while !race.cars_list[0].sh.is_finished() {
        race.simulate_timestep();
    }

    // 1003m at 5m per step: crossing in step 201 with an overshoot of 2m
    let t_finish = race.cars_list[0].get_finish_time().unwrap();
    assert_relative_eq!(race.cars_list[0].get_overshoot(), 2.0, epsilon = 1e-9);
    assert_relative_eq!(t_finish, race.cur_racetime - 2.0 / 50.0, epsilon = 1e-9);
    assert!(t_finish <= race.cur_racetime && t_finish >= race.cur_racetime - timestep_size);
}

#[test]
fn tire_condition_and_speed_stay_bounded() {
    let pars = oval_race_pars();
    let mut race = Race::new(&pars, 0.25, 42).unwrap();
    let mut cliff_reached = false;
    let mut no_steps = 0;

    while !race.get_all_finished() {
        race.simulate_timestep();
        no_steps += 1;
        assert!(no_steps < MAX_TIMESTEPS);

        for car in race.cars_list.iter() {
            assert!(car.tireset.condition >= 0.2 && car.tireset.condition <= 1.0);
            assert!(car.v >= 0.0 && car.v <= 85.0);
            cliff_reached |= car.tireset.condition <= 0.2 + 1e-12;
        }
    }

    // high wear rate: some car must have been running on the cliff at some point or pitted
    let no_pitstops: usize = race.cars_list.iter().map(|car| car.get_no_pitstops()).sum();
    assert!(cliff_reached || no_pitstops > 0);
}

#[test]
fn lap_counter_follows_covered_distance() {
    let pars = oval_race_pars();
    let mut race = Race::new(&pars, 0.5, 7).unwrap();
    let track_length = race.track.length;
    let mut no_steps = 0;

    while !race.get_all_finished() {
        race.simulate_timestep();
        no_steps += 1;
        assert!(no_steps < MAX_TIMESTEPS);

        for car in race.cars_list.iter().filter(|car| !car.sh.is_finished()) {
            let s_total = car.sh.get_s_total();
            let laps = (s_total / track_length).floor().max(0.0);

            // skip floating point ties at the lap line
            if (s_total - laps * track_length).abs() < 1e-6 {
                continue;
            }
            assert_eq!(car.sh.get_compl_lap(), laps as u32);
        }
    }

    for car in race.cars_list.iter() {
        assert_eq!(car.sh.get_compl_lap(), race.tot_no_laps);
    }
}

#[test]
fn worn_tires_force_pit_stop_at_lap_end() {
    let mut pars = drag_race_pars();
    pars.race_pars.tot_no_laps = 10;
    pars.race_pars.entries.truncate(1);
    // the time comparison alone would never justify a stop
    pars.strategy_pars.t_safety_margin = 1.0e9;
    let mut race = Race::new(&pars, 0.1, 3).unwrap();

    race.cars_list[0].tireset.condition = 0.21;

    while race.cars_list[0].sh.get_compl_lap() == 0 {
        race.simulate_timestep();
    }

    let car = &race.cars_list[0];
    assert!(car.sh.pit_act());
    assert_eq!(car.get_no_pitstops(), 1);
    assert!(car.t_pit_total >= 15.0 && car.t_pit_total <= 40.0);

    run_to_end(&mut race);
    assert_relative_eq!(race.cars_list[0].tireset.condition, 1.0);
}

#[test]
fn same_seed_gives_identical_race() {
    let pars = oval_race_pars();

    let run = |seed: u64| {
        let mut race = Race::new(&pars, 0.25, seed).unwrap();
        run_to_end(&mut race);
        serde_json::to_string(&race.get_race_result()).unwrap()
    };

    assert_eq!(run(11), run(11));
    assert_ne!(run(11), run(12));
}

#[test]
fn ranking_does_not_reorder_cars() {
    let pars = oval_race_pars();
    let mut race = Race::new(&pars, 0.25, 5).unwrap();

    for _ in 0..2000 {
        race.simulate_timestep();
    }

    let ranking = race.get_ranking();
    let leaderboard = race.get_leaderboard();

    for (pos, &idx) in ranking.iter().enumerate() {
        let car = &race.cars_list[idx];
        assert_eq!(
            leaderboard.entries[pos].driver_name,
            race.drivers[car.driver_idx].name
        );
    }
    assert_eq!(leaderboard.entries[0].gap, "Leader");

    // cars keep their grid slot in the owning storage
    for (slot, car) in race.cars_list.iter().enumerate() {
        assert_eq!(car.p_grid as usize, slot + 1);
    }
}

#[test]
fn grid_is_staggered() {
    let race = Race::new(&oval_race_pars(), 0.25, 1).unwrap();

    for (slot, car) in race.cars_list.iter().enumerate() {
        assert_relative_eq!(car.sh.get_s_total(), -(slot as f64) * 8.0);
    }
}

#[test]
fn invalid_setups_are_rejected() {
    let mut empty_track = drag_race_pars();
    empty_track.track_pars.segments.clear();
    assert_eq!(
        Race::new(&empty_track, 0.1, 0).unwrap_err(),
        SetupError::EmptyTrack {
            name: "Drag Strip".to_owned()
        }
    );

    let mut unknown_team = drag_race_pars();
    unknown_team.race_pars.entries[1].team = "Missing".to_owned();
    assert_eq!(
        Race::new(&unknown_team, 0.1, 0).unwrap_err(),
        SetupError::UnknownTeam {
            driver: "Car B".to_owned(),
            team: "Missing".to_owned()
        }
    );

    let mut inverted_pit_bounds = drag_race_pars();
    inverted_pit_bounds.strategy_pars.t_pit_min = 40.0;
    inverted_pit_bounds.strategy_pars.t_pit_max = 15.0;
    assert!(matches!(
        Race::new(&inverted_pit_bounds, 0.1, 0),
        Err(SetupError::Bounds { .. })
    ));

    assert!(matches!(
        Race::new(&drag_race_pars(), 20.0, 0),
        Err(SetupError::TimestepTooLarge { .. })
    ));
    assert!(matches!(
        Race::new(&drag_race_pars(), 0.0, 0),
        Err(SetupError::InvalidTimestep { .. })
    ));

    let mut no_braking = drag_race_pars();
    no_braking.team_pars_all[0].braking = 0.0;
    assert!(matches!(
        Race::new(&no_braking, 0.1, 0),
        Err(SetupError::NotPositive { .. })
    ));

    let mut no_compound_grip = drag_race_pars();
    no_compound_grip.tire_config.medium.grip = 0.0;
    assert_eq!(
        Race::new(&no_compound_grip, 0.1, 0).unwrap_err(),
        SetupError::NotPositive {
            field: "medium compound grip",
            value: 0.0
        }
    );

    let mut no_topspeed_scale = drag_race_pars();
    no_topspeed_scale.sim_constants.topspeed_scale = 0.0;
    assert_eq!(
        Race::new(&no_topspeed_scale, 0.1, 0).unwrap_err(),
        SetupError::NotPositive {
            field: "top speed scale",
            value: 0.0
        }
    );

    let mut no_gravity = drag_race_pars();
    no_gravity.sim_constants.gravity = 0.0;
    assert!(matches!(
        Race::new(&no_gravity, 0.1, 0),
        Err(SetupError::NotPositive { field: "gravity", .. })
    ));
}

#[test]
fn event_runs_out_while_car_stands_in_pits() {
    let mut race = Race::new(&drag_race_pars(), 0.1, 0).unwrap();
    race.cars_list[0].enter_pit(5.0, Compound::Medium);
    assert!(race.cars_list[0].start_event(EventKind::MinorGlitch, 1.0));

    for _ in 0..15 {
        race.simulate_timestep();
    }

    let car = &race.cars_list[0];
    assert!(car.sh.pit_act());
    assert!(car.get_active_event().is_none());
    assert_eq!(car.mods, PerfModifiers::default());
}

#[test]
fn storm_is_never_drawn() {
    let mut sim_pars = drag_race_pars();
    sim_pars.race_pars.weather = None;

    for seed in 0..50 {
        let race = Race::new(&sim_pars, 0.1, seed).unwrap();
        assert_ne!(race.weather, WeatherCondition::Storm);
    }

    sim_pars.race_pars.weather = Some(WeatherCondition::Storm);
    assert_eq!(Race::new(&sim_pars, 0.1, 0).unwrap().weather, WeatherCondition::Storm);
}

#[test]
fn sample_inputs_simulate_to_the_end() {
    use segrace::core::handle_race::handle_race;
    use segrace::pre::read_sim_pars::{read_sim_pars, read_track_csv};
    use std::path::Path;

    let input_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../input");
    let mut sim_pars = read_sim_pars(&input_dir.join("parameters/oval.json")).unwrap();

    let result = handle_race(&sim_pars, 0.1, sim_pars.race_pars.seed, false, None, 1.0).unwrap();
    assert_eq!(result.entries.len(), 6);
    assert!(result.entries.iter().all(|entry| entry.t_finish.is_some()));

    sim_pars.track_pars = read_track_csv(&input_dir.join("tracks/kidney.csv")).unwrap();
    sim_pars.race_pars.tot_no_laps = 5;
    let result = handle_race(&sim_pars, 0.1, 1, false, None, 1.0).unwrap();
    assert_eq!(result.track_name, "kidney");
    assert!(result.get_winner().is_some());
}
