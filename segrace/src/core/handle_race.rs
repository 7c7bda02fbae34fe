use crate::core::race::Race;
use crate::interfaces::leaderboard::{LeaderboardSnapshot, MAX_DISPLAY_UPDATE_FREQUENCY};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::Sender;
use log::{info, warn};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing. If a sender is inserted, the race is simulated in real-time
/// and leaderboard snapshots are sent through it.
pub fn handle_race(
    sim_pars: &SimPars,
    timestep_size: f64,
    seed: u64,
    print_debug: bool,
    tx: Option<&Sender<LeaderboardSnapshot>>,
    realtime_factor: f64,
) -> anyhow::Result<RaceResult> {
    let mut race = Race::new(sim_pars, timestep_size, seed).context("Invalid race setup!")?;

    // check if sender was inserted -> in that case use real-time simulation
    match tx {
        None => {
            let mut t_race_update_print = 0.0;

            while !race.get_all_finished() {
                race.simulate_timestep();

                if print_debug && race.cur_racetime > t_race_update_print + 9.9999 {
                    info!(
                        "Simulating... Current race time is {:.3}s, current lap is {}",
                        race.cur_racetime, race.cur_lap_leader
                    );
                    t_race_update_print = race.cur_racetime;
                }
            }
        }
        Some(tx) => {
            if !realtime_factor.is_finite() || realtime_factor <= 0.0 {
                anyhow::bail!("Real-time factor must be positive (got {})!", realtime_factor);
            }

            let mut t_race_update_display = 0.0;

            while !race.get_all_finished() {
                let t_start = Instant::now();
                race.simulate_timestep();

                if race.cur_racetime
                    > t_race_update_display + 1.0 / MAX_DISPLAY_UPDATE_FREQUENCY - 0.001
                {
                    tx.send(race.get_leaderboard())
                        .context("Failed to send leaderboard snapshot!")?;
                    t_race_update_display = race.cur_racetime;
                }

                // sleep until time step is finished in real-time as well
                let t_step = Duration::from_secs_f64(race.timestep_size / realtime_factor);
                let t_elapsed = t_start.elapsed();

                if t_elapsed < t_step {
                    sleep(t_step - t_elapsed);
                } else {
                    warn!("Could not keep up with real-time!");
                }
            }

            // final standings
            tx.send(race.get_leaderboard())
                .context("Failed to send final leaderboard snapshot!")?;
        }
    }

    // return race result
    Ok(race.get_race_result())
}
