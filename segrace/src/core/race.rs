use crate::core::car::{Car, EntryPars};
use crate::core::driver::Driver;
use crate::core::error::{check_non_negative, check_positive, check_probability, SetupError};
use crate::core::events::{check_mistake, draw_lap_event, EventPars};
use crate::core::kinematics::KinematicsEnv;
use crate::core::overtake::{resolve_overtakes, OvertakePars};
use crate::core::strategy::{plan_pit_stop, StintState, StrategyPars};
use crate::core::team::Team;
use crate::core::tireset::TireConfig;
use crate::core::track::Track;
use crate::interfaces::leaderboard::{calc_gap_string, GapInfo, LeaderboardEntry, LeaderboardSnapshot};
use crate::post::race_result::{RaceResult, ResultEntry};
use crate::pre::read_sim_pars::SimPars;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Storm,
}

impl WeatherCondition {
    /// Conditions that are drawn if the weather is not set in the parameters. A storm only occurs
    /// if it is set explicitly.
    const DRAWABLE: [WeatherCondition; 3] = [
        WeatherCondition::Sunny,
        WeatherCondition::Cloudy,
        WeatherCondition::Rainy,
    ];

    pub fn grip_modifier(&self) -> f64 {
        match self {
            WeatherCondition::Sunny => 1.0,
            WeatherCondition::Cloudy => 0.95,
            WeatherCondition::Rainy => 0.85,
            WeatherCondition::Storm => 0.7,
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            WeatherCondition::Sunny => "Sunny",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Rainy => "Rainy",
            WeatherCondition::Storm => "Storm",
        };
        write!(f, "{}", name)
    }
}

/// * `gravity` - (m/s^2) Gravitational acceleration
/// * `v_ceiling` - (m/s) Physical speed ceiling of all cars
/// * `topspeed_scale` - (m/s) Top speed of a car with a top speed rating of 100
/// * `base_wear_rate` - (1/s) Tire condition loss per second
/// * `wear_factor_corner` - (-) Tire wear factor in corners
/// * `wear_factor_straight` - (-) Tire wear factor on straights
/// * `tire_cliff` - (-) Tire condition floor
/// * `braking_margin` - (-) Safety factor on the braking distance
/// * `mistake_prob` - (-) Mistake probability per timestep of a driver with awareness 0
/// * `mistake_speed_factor` - (-) Speed factor applied by a mistake
/// * `mistake_wear_penalty` - (-) Tire condition lost by a mistake
/// * `v_min_finish` - (m/s) Minimum speed used for the finish time interpolation
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConstants {
    pub gravity: f64,
    pub v_ceiling: f64,
    pub topspeed_scale: f64,
    pub base_wear_rate: f64,
    pub wear_factor_corner: f64,
    pub wear_factor_straight: f64,
    pub tire_cliff: f64,
    pub braking_margin: f64,
    pub mistake_prob: f64,
    pub mistake_speed_factor: f64,
    pub mistake_wear_penalty: f64,
    pub v_min_finish: f64,
}

impl SimConstants {
    pub fn validate(&self) -> Result<(), SetupError> {
        check_positive("gravity", self.gravity)?;
        check_positive("speed ceiling", self.v_ceiling)?;
        check_positive("top speed scale", self.topspeed_scale)?;
        check_positive("braking margin", self.braking_margin)?;
        check_positive("minimum finish speed", self.v_min_finish)?;
        check_non_negative("base wear rate", self.base_wear_rate)?;
        check_non_negative("corner wear factor", self.wear_factor_corner)?;
        check_non_negative("straight wear factor", self.wear_factor_straight)?;
        check_positive("tire cliff", self.tire_cliff)?;
        check_probability("tire cliff", self.tire_cliff)?;
        check_probability("mistake probability", self.mistake_prob)?;
        check_probability("mistake speed factor", self.mistake_speed_factor)?;
        check_non_negative("mistake wear penalty", self.mistake_wear_penalty)
    }
}

impl Default for SimConstants {
    fn default() -> Self {
        SimConstants {
            gravity: 9.81,
            v_ceiling: 85.0,
            topspeed_scale: 94.0,
            base_wear_rate: 0.0003,
            wear_factor_corner: 2.0,
            wear_factor_straight: 0.5,
            tire_cliff: 0.2,
            braking_margin: 1.1,
            mistake_prob: 0.005,
            mistake_speed_factor: 0.85,
            mistake_wear_penalty: 0.02,
            v_min_finish: 1.0,
        }
    }
}

/// * `tot_no_laps` - Total number of laps
/// * `weather` - Weather condition, drawn randomly if not set
/// * `seed` - Seed of the race random number generator
/// * `d_per_gridpos` - (m) Distance between two grid positions
/// * `overtake_pars` - Parameters of the overtake model
/// * `entries` - Race entries in grid order
#[derive(Debug, Deserialize, Clone)]
pub struct RacePars {
    pub tot_no_laps: u32,
    #[serde(default)]
    pub weather: Option<WeatherCondition>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "RacePars::default_d_per_gridpos")]
    pub d_per_gridpos: f64,
    #[serde(default)]
    pub overtake_pars: OvertakePars,
    pub entries: Vec<EntryPars>,
}

impl RacePars {
    fn default_d_per_gridpos() -> f64 {
        8.0
    }
}

#[derive(Debug)]
pub struct Race {
    pub timestep_size: f64,
    pub cur_racetime: f64,
    pub tot_no_laps: u32,
    pub race_distance: f64,
    pub cur_lap_leader: u32,
    pub weather: WeatherCondition,
    pub seed: u64,
    pub track: Track,
    pub drivers: Vec<Driver>,
    pub teams: Vec<Team>,
    pub cars_list: Vec<Car>,
    tire_config: TireConfig,
    sim_consts: SimConstants,
    strategy_pars: StrategyPars,
    event_pars: EventPars,
    overtake_pars: OvertakePars,
    rng: ChaCha8Rng,
}

impl Race {
    /// new creates a race from the inserted parameters. All parameters are validated here, such
    /// that the tick loop itself cannot fail.
    pub fn new(sim_pars: &SimPars, timestep_size: f64, seed: u64) -> Result<Race, SetupError> {
        let race_pars = &sim_pars.race_pars;
        let track = Track::new(&sim_pars.track_pars)?;

        // check parameters
        if race_pars.tot_no_laps == 0 {
            return Err(SetupError::NoLaps);
        }
        if race_pars.entries.is_empty() {
            return Err(SetupError::NoEntries);
        }
        if !(timestep_size > 0.0 && timestep_size.is_finite()) {
            return Err(SetupError::InvalidTimestep { timestep_size });
        }
        let s_max_per_step = sim_pars.sim_constants.v_ceiling * timestep_size;
        if s_max_per_step >= track.length {
            return Err(SetupError::TimestepTooLarge {
                timestep_size,
                distance: s_max_per_step,
                track_length: track.length,
            });
        }
        check_non_negative("grid spacing", race_pars.d_per_gridpos)?;
        sim_pars.sim_constants.validate()?;
        sim_pars.tire_config.validate()?;
        sim_pars.strategy_pars.validate()?;
        sim_pars.event_pars.validate()?;
        race_pars.overtake_pars.validate()?;

        // create drivers and teams
        let drivers: Vec<Driver> = sim_pars.driver_pars_all.iter().map(Driver::new).collect();
        let mut teams = Vec::with_capacity(sim_pars.team_pars_all.len());
        for team_pars in sim_pars.team_pars_all.iter() {
            check_positive("team top speed", team_pars.top_speed)?;
            check_positive("team acceleration", team_pars.acceleration)?;
            check_positive("team braking", team_pars.braking)?;
            check_positive("team base tire grip", team_pars.base_tire_grip)?;
            check_non_negative("team pit stop multiplier", team_pars.pit_stop_multiplier)?;
            teams.push(Team::new(team_pars));
        }

        // create cars in grid order
        let mut cars_list = Vec::with_capacity(race_pars.entries.len());

        for (p_grid, entry) in race_pars.entries.iter().enumerate() {
            let driver_idx = drivers
                .iter()
                .position(|driver| driver.name == entry.driver)
                .ok_or_else(|| SetupError::UnknownDriver {
                    driver: entry.driver.to_owned(),
                })?;
            let team_idx = teams
                .iter()
                .position(|team| team.name == entry.team)
                .ok_or_else(|| SetupError::UnknownTeam {
                    driver: entry.driver.to_owned(),
                    team: entry.team.to_owned(),
                })?;

            cars_list.push(Car::new(
                driver_idx,
                team_idx,
                p_grid as u32 + 1,
                entry.starting_compound,
                entry.strategy,
            ));
        }

        // the race weather is the first random draw of the race
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let weather = match race_pars.weather {
            Some(weather) => weather,
            None => WeatherCondition::DRAWABLE[rng.gen_range(0..WeatherCondition::DRAWABLE.len())],
        };

        let mut race = Race {
            timestep_size,
            cur_racetime: 0.0,
            tot_no_laps: race_pars.tot_no_laps,
            race_distance: race_pars.tot_no_laps as f64 * track.length,
            cur_lap_leader: 1,
            weather,
            seed,
            track,
            drivers,
            teams,
            cars_list,
            tire_config: sim_pars.tire_config.to_owned(),
            sim_consts: sim_pars.sim_constants.to_owned(),
            strategy_pars: sim_pars.strategy_pars.to_owned(),
            event_pars: sim_pars.event_pars.to_owned(),
            overtake_pars: race_pars.overtake_pars.to_owned(),
            rng,
        };

        // initialize race for each car
        for idx in 0..race.cars_list.len() {
            let car = &race.cars_list[idx];
            let t_lap_ref = race.get_env(car).calc_ref_laptime(&car.mods);
            let s_lap_start = -((car.p_grid - 1) as f64) * race_pars.d_per_gridpos;

            let car = &mut race.cars_list[idx];
            car.t_lap_ref = t_lap_ref;
            car.sh.initialize_state_handler(s_lap_start, race.track.length);
        }

        info!(
            "Race on {} over {} laps ({:.0}m) with {} cars, weather {}",
            race.track.name,
            race.tot_no_laps,
            race.race_distance,
            race.cars_list.len(),
            race.weather
        );

        Ok(race)
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_timestep simulates one timestep: all cars are moved sequentially in array order,
    /// overtakes are resolved afterwards.
    pub fn simulate_timestep(&mut self) {
        // increment discretization variable
        self.cur_racetime += self.timestep_size;

        for idx in 0..self.cars_list.len() {
            self.cars_list[idx].mistake_act = false;

            if self.cars_list[idx].sh.is_finished() {
                continue;
            }

            if self.cars_list[idx].sh.pit_act() {
                self.handle_pit_standstill(idx);
            } else {
                self.handle_car_timestep(idx);
            }
        }

        self.handle_overtakes();
        self.update_lap_leader();
    }

    // ---------------------------------------------------------------------------------------------
    // RACE SIMULATOR PARTS ------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn handle_car_timestep(&mut self, idx: usize) {
        let car = &mut self.cars_list[idx];

        if let Some(kind) = car.progress_event(self.timestep_size) {
            debug!(
                "{:.1}s: {} recovered from {}",
                self.cur_racetime, self.drivers[car.driver_idx].name, kind
            );
        }

        if check_mistake(
            &mut self.rng,
            self.drivers[car.driver_idx].awareness,
            &self.sim_consts,
        ) {
            car.apply_mistake(&self.sim_consts);
        }

        let env = KinematicsEnv {
            track: &self.track,
            driver: &self.drivers[car.driver_idx],
            team: &self.teams[car.team_idx],
            tire_config: &self.tire_config,
            sim_consts: &self.sim_consts,
            weather_grip: self.weather.grip_modifier(),
        };
        let new_lap = car.drive_timestep(&env, self.timestep_size);

        if car.sh.get_s_total() >= self.race_distance {
            self.handle_finish(idx);
        } else if new_lap {
            self.handle_lap_transition(idx);
        }
    }

    /// handle_finish records the finish time, interpolated within the timestep on the basis of
    /// the distance the car travelled beyond the finish line.
    fn handle_finish(&mut self, idx: usize) {
        let car = &mut self.cars_list[idx];
        let s_overshoot = car.sh.get_s_total() - self.race_distance;
        let t_finish = calc_finish_time(
            self.cur_racetime,
            self.timestep_size,
            s_overshoot,
            car.v,
            self.sim_consts.v_min_finish,
        );
        car.finish(t_finish, s_overshoot);

        info!(
            "{} finished after {:.3}s ({})",
            self.drivers[car.driver_idx].name,
            t_finish,
            car.get_strategy_string()
        );
    }

    /// handle_lap_transition draws the transient lap event and runs the pit stop strategy of the
    /// car that just started a new lap.
    fn handle_lap_transition(&mut self, idx: usize) {
        // transient event for a random car on track
        let racing_idxs: Vec<usize> = self
            .cars_list
            .iter()
            .enumerate()
            .filter(|(_, car)| car.sh.is_racing())
            .map(|(i, _)| i)
            .collect();

        if let Some(event) = draw_lap_event(&mut self.rng, &self.event_pars, &racing_idxs) {
            let car = &mut self.cars_list[event.car_idx];
            let name = &self.drivers[car.driver_idx].name;

            if car.start_event(event.kind, event.t_duration) {
                debug!(
                    "{:.1}s: {} suffers {} for {:.1}s",
                    self.cur_racetime, name, event.kind, event.t_duration
                );
            } else {
                debug!(
                    "{:.1}s: {} for {} dropped, another event is active",
                    self.cur_racetime, event.kind, name
                );
            }
        }

        // pit stop strategy
        let car = &mut self.cars_list[idx];
        let stint = StintState {
            compound: car.tireset.compound,
            condition: car.tireset.condition,
            wear_per_lap: car.tireset.wear_last_lap().unwrap_or(0.0),
            laps_remaining: self.tot_no_laps.saturating_sub(car.sh.get_compl_lap()),
            t_lap_ref: car.t_lap_ref,
            pit_stop_multiplier: self.teams[car.team_idx].pit_stop_multiplier,
            tier: car.strategy_tier,
        };
        let decision = plan_pit_stop(
            &mut self.rng,
            &stint,
            &self.strategy_pars,
            &self.tire_config,
            &self.sim_consts,
        );

        if decision.pit {
            debug!(
                "{:.1}s: {} pits at the end of lap {} ({:.0}% tread), {} tires, {:.1}s standstill",
                self.cur_racetime,
                self.drivers[car.driver_idx].name,
                car.sh.get_compl_lap(),
                car.tireset.condition * 100.0,
                decision.compound_next,
                decision.t_pit
            );
            car.enter_pit(decision.t_pit, decision.compound_next);
        }
    }

    fn handle_pit_standstill(&mut self, idx: usize) {
        let car = &mut self.cars_list[idx];

        // transient events keep running down while the car stands in the pits
        if let Some(kind) = car.progress_event(self.timestep_size) {
            debug!(
                "{:.1}s: {} recovered from {} in the pits",
                self.cur_racetime, self.drivers[car.driver_idx].name, kind
            );
        }

        if let Some(compound) = car.progress_pit(self.timestep_size) {
            debug!(
                "{:.1}s: {} leaves the pits on {} tires",
                self.cur_racetime, self.drivers[car.driver_idx].name, compound
            );
        }
    }

    fn handle_overtakes(&mut self) {
        let overtakes = resolve_overtakes(
            &mut self.rng,
            &mut self.cars_list,
            &self.drivers,
            &self.track,
            self.race_distance,
            &self.overtake_pars,
        );

        for overtake in overtakes.iter() {
            debug!(
                "{:.1}s: {} overtakes {}",
                self.cur_racetime,
                self.drivers[self.cars_list[overtake.idx_rear].driver_idx].name,
                self.drivers[self.cars_list[overtake.idx_front].driver_idx].name
            );
        }
    }

    fn update_lap_leader(&mut self) {
        let compl_lap_max = self
            .cars_list
            .iter()
            .map(|car| car.sh.get_compl_lap())
            .max()
            .unwrap_or(0);
        self.cur_lap_leader = (compl_lap_max + 1).min(self.tot_no_laps);
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn get_env<'a>(&'a self, car: &Car) -> KinematicsEnv<'a> {
        KinematicsEnv {
            track: &self.track,
            driver: &self.drivers[car.driver_idx],
            team: &self.teams[car.team_idx],
            tire_config: &self.tire_config,
            sim_consts: &self.sim_consts,
            weather_grip: self.weather.grip_modifier(),
        }
    }

    pub fn get_all_finished(&self) -> bool {
        self.cars_list.iter().all(|car| car.sh.is_finished())
    }

    pub fn get_sim_consts(&self) -> &SimConstants {
        &self.sim_consts
    }

    /// get_ranking returns the car indices in race order without reordering the cars list:
    /// finished cars by finish time (ties broken by the larger overshoot), then unfinished cars by
    /// covered distance.
    pub fn get_ranking(&self) -> Vec<usize> {
        let mut idxs: Vec<usize> = (0..self.cars_list.len()).collect();
        idxs.sort_by(|&a, &b| compare_cars(&self.cars_list[a], &self.cars_list[b]));
        idxs
    }

    /// get_leaderboard returns a snapshot of the current race order for display.
    pub fn get_leaderboard(&self) -> LeaderboardSnapshot {
        let ranking = self.get_ranking();
        let gap_infos: Vec<GapInfo> = ranking
            .iter()
            .map(|&idx| GapInfo {
                t_finish: self.cars_list[idx].get_finish_time(),
                s_total: self.cars_list[idx].sh.get_s_total(),
            })
            .collect();

        let entries = ranking
            .iter()
            .enumerate()
            .map(|(pos, &idx)| {
                let car = &self.cars_list[idx];
                let cur_lap = (car.sh.get_compl_lap() + 1).min(self.tot_no_laps);

                let status = if car.sh.is_finished() {
                    "FINISHED".to_owned()
                } else if car.sh.pit_act() {
                    "IN PIT".to_owned()
                } else {
                    format!("Lap {} [{}]", cur_lap, car.tireset.compound)
                };

                LeaderboardEntry {
                    position: pos + 1,
                    driver_name: self.drivers[car.driver_idx].name.to_owned(),
                    cur_lap,
                    lap_frac: if car.sh.is_finished() {
                        1.0
                    } else {
                        car.sh.get_lap_frac()
                    },
                    gap: calc_gap_string(
                        pos,
                        &gap_infos[0],
                        &gap_infos[pos],
                        self.track.length,
                        self.tot_no_laps,
                    ),
                    status,
                }
            })
            .collect();

        LeaderboardSnapshot {
            race_time: self.cur_racetime,
            tot_no_laps: self.tot_no_laps,
            entries,
        }
    }

    pub fn get_race_result(&self) -> RaceResult {
        RaceResult {
            track_name: self.track.name.to_owned(),
            tot_no_laps: self.tot_no_laps,
            weather: self.weather,
            seed: self.seed,
            entries: self
                .get_ranking()
                .iter()
                .enumerate()
                .map(|(pos, &idx)| {
                    let car = &self.cars_list[idx];
                    ResultEntry {
                        position: pos + 1,
                        driver_name: self.drivers[car.driver_idx].name.to_owned(),
                        team_name: self.teams[car.team_idx].name.to_owned(),
                        t_finish: car.get_finish_time(),
                        compl_laps: car.sh.get_compl_lap().min(self.tot_no_laps),
                        strategy: car.get_strategy_string(),
                        no_pitstops: car.get_no_pitstops(),
                        t_pit_total: car.t_pit_total,
                    }
                })
                .collect(),
        }
    }
}

/// calc_finish_time interpolates the finish time within the last timestep. The speed is floored
/// to avoid a division by zero, the correction is bounded to one timestep.
pub fn calc_finish_time(
    cur_racetime: f64,
    timestep_size: f64,
    s_overshoot: f64,
    v: f64,
    v_min: f64,
) -> f64 {
    let t_correction = (s_overshoot / v.max(v_min)).max(0.0).min(timestep_size);
    cur_racetime - t_correction
}

fn compare_cars(a: &Car, b: &Car) -> Ordering {
    match (a.get_finish_time(), b.get_finish_time()) {
        (Some(t_a), Some(t_b)) => t_a
            .total_cmp(&t_b)
            .then_with(|| b.get_overshoot().total_cmp(&a.get_overshoot())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.sh.get_s_total().total_cmp(&a.sh.get_s_total()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn finish_time_is_interpolated_within_timestep() {
        let t = calc_finish_time(20.5, 0.5, 10.0, 50.0, 1.0);
        assert_relative_eq!(t, 20.3, epsilon = 1e-12);
        assert!(t >= 20.0 && t <= 20.5);
    }

    #[test]
    fn finish_time_correction_is_bounded() {
        // overshoot larger than a timestep at the current speed
        assert_relative_eq!(calc_finish_time(20.5, 0.5, 100.0, 50.0, 1.0), 20.0);
        // standing car uses the minimum speed
        assert_relative_eq!(calc_finish_time(20.5, 0.5, 0.2, 0.0, 1.0), 20.3, epsilon = 1e-12);
        assert_relative_eq!(calc_finish_time(20.5, 0.5, 0.0, 30.0, 1.0), 20.5);
    }

    #[test]
    fn weather_grip_modifiers() {
        assert_relative_eq!(WeatherCondition::Sunny.grip_modifier(), 1.0);
        assert!(WeatherCondition::Storm.grip_modifier() < WeatherCondition::Rainy.grip_modifier());
    }

    #[test]
    fn finished_cars_rank_by_time_then_overshoot() {
        use crate::core::strategy::StrategyTier;
        use crate::core::tireset::Compound;

        let new_car = || {
            let mut car = Car::new(0, 0, 1, Compound::Medium, StrategyTier::Balanced);
            car.sh.initialize_state_handler(0.0, 1000.0);
            car
        };

        let mut slow = new_car();
        slow.finish(101.0, 3.0);
        let mut fast_small = new_car();
        fast_small.finish(100.0, 1.0);
        let mut fast_large = new_car();
        fast_large.finish(100.0, 2.0);
        let mut running = new_car();
        running.sh.update_race_prog(500.0);

        assert_eq!(compare_cars(&fast_large, &fast_small), Ordering::Less);
        assert_eq!(compare_cars(&fast_small, &slow), Ordering::Less);
        assert_eq!(compare_cars(&slow, &running), Ordering::Less);
        assert_eq!(compare_cars(&running, &new_car()), Ordering::Less);
    }
}
