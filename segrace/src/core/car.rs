use crate::core::events::{ActiveEvent, EventKind, PerfModifiers};
use crate::core::kinematics::{approach_speed, KinematicsEnv};
use crate::core::race::SimConstants;
use crate::core::state_handler::StateHandler;
use crate::core::strategy::StrategyTier;
use crate::core::tireset::{Compound, Tireset};
use serde::Deserialize;

/// * `driver` - Name of the driver (must exist in the drivers list)
/// * `team` - Name of the team (must exist in the teams list)
/// * `starting_compound` - Compound fitted on the grid
/// * `strategy` - Strategy tier used for pit stop decisions
#[derive(Debug, Deserialize, Clone)]
pub struct EntryPars {
    pub driver: String,
    pub team: String,
    #[serde(default)]
    pub starting_compound: Compound,
    #[serde(default)]
    pub strategy: StrategyTier,
}

/// Car holds the complete mutable state of a single race entry. Driver and team data are stored
/// in the race and referenced by index.
#[derive(Debug, Clone)]
pub struct Car {
    pub driver_idx: usize,
    pub team_idx: usize,
    pub p_grid: u32,
    pub strategy_tier: StrategyTier,
    pub tireset: Tireset,
    pub v: f64,
    pub sh: StateHandler,
    pub mods: PerfModifiers,
    pub mistake_act: bool,
    pub t_lap_ref: f64,
    pub t_pit_total: f64,
    event: Option<ActiveEvent>,
    v_cap: Option<f64>,
    stints: Vec<(Compound, u32)>,
    t_finish: Option<f64>,
    s_overshoot: f64,
}

impl Car {
    pub fn new(
        driver_idx: usize,
        team_idx: usize,
        p_grid: u32,
        starting_compound: Compound,
        strategy_tier: StrategyTier,
    ) -> Car {
        Car {
            driver_idx,
            team_idx,
            p_grid,
            strategy_tier,
            tireset: Tireset::new(starting_compound),
            v: 0.0,
            sh: StateHandler::default(),
            mods: PerfModifiers::default(),
            mistake_act: false,
            t_lap_ref: 0.0,
            t_pit_total: 0.0,
            event: None,
            v_cap: None,
            stints: Vec::new(),
            t_finish: None,
            s_overshoot: 0.0,
        }
    }

    /// drive_timestep updates speed, position and tire condition for one timestep. It returns
    /// true if the car started a new lap.
    pub fn drive_timestep(&mut self, env: &KinematicsEnv, timestep_size: f64) -> bool {
        let s_lap = self.sh.get_s_lap();
        let (seg_idx, _) = env.track.segment_at(s_lap);

        // determine target speed (possibly capped behind a car that could not be passed)
        let mut v_target = env.calc_target_speed(s_lap, self.v, &self.tireset, &self.mods);
        if let Some(v_cap) = self.v_cap.take() {
            v_target = v_target.min(v_cap);
        }

        self.v = approach_speed(
            self.v,
            v_target,
            env.effective_acceleration(&self.tireset, &self.mods),
            env.effective_braking(&self.tireset, &self.mods),
            timestep_size,
        );

        // move forward
        let new_lap = self.sh.update_race_prog(self.v * timestep_size);

        // tire wear
        self.tireset.apply_wear(
            env.track.get_segment(seg_idx).is_corner(),
            env.driver.awareness,
            env.tire_config,
            env.sim_consts,
            timestep_size,
        );

        if new_lap {
            self.tireset.drive_lap();
        }

        new_lap
    }

    /// apply_mistake slows the car down and damages the tires.
    pub fn apply_mistake(&mut self, sim_consts: &SimConstants) {
        self.mistake_act = true;
        self.v *= sim_consts.mistake_speed_factor;
        self.tireset
            .reduce_condition(sim_consts.mistake_wear_penalty, sim_consts);
    }

    /// cap_speed limits the target speed of the next timestep, the car then brakes towards it
    /// within its braking capability.
    pub fn cap_speed(&mut self, v_cap: f64) {
        self.v_cap = Some(self.v_cap.map_or(v_cap, |v_cap_prev| v_cap_prev.min(v_cap)));
    }

    pub fn get_v_cap(&self) -> Option<f64> {
        self.v_cap
    }

    /// start_event activates a transient event. The request is dropped (returning false) if
    /// another event is still active.
    pub fn start_event(&mut self, kind: EventKind, t_duration: f64) -> bool {
        if self.event.is_some() {
            return false;
        }

        self.event = Some(ActiveEvent::new(kind, t_duration, self.mods));
        self.mods = kind.apply(&self.mods);
        true
    }

    /// progress_event reduces the remaining event duration. If the event elapses, the modifiers
    /// before the event are restored and its kind is returned.
    pub fn progress_event(&mut self, timestep_size: f64) -> Option<EventKind> {
        let event = self.event.as_mut()?;
        event.t_remaining -= timestep_size;

        if event.t_remaining > 0.0 {
            return None;
        }

        let kind = event.kind;
        self.mods = event.baseline();
        self.event = None;
        Some(kind)
    }

    pub fn get_active_event(&self) -> Option<&ActiveEvent> {
        self.event.as_ref()
    }

    /// enter_pit stops the car for `t_pit` seconds and closes the current stint.
    pub fn enter_pit(&mut self, t_pit: f64, compound_next: Compound) {
        self.stints
            .push((self.tireset.compound, self.tireset.age_cur_stint));
        self.sh.act_pit(t_pit, compound_next);
        self.v = 0.0;
        self.v_cap = None;
        self.t_pit_total += t_pit;
    }

    /// progress_pit handles the pit standstill, fresh tires are fitted when it ends. Returns the
    /// fitted compound in that case.
    pub fn progress_pit(&mut self, timestep_size: f64) -> Option<Compound> {
        let compound = self.sh.progress_pit(timestep_size)?;
        self.tireset = Tireset::new(compound);
        Some(compound)
    }

    /// finish marks the car as finished at `t_finish` having overshot the line by `s_overshoot`.
    pub fn finish(&mut self, t_finish: f64, s_overshoot: f64) {
        self.sh.set_finished();
        self.t_finish = Some(t_finish);
        self.s_overshoot = s_overshoot;
    }

    pub fn get_finish_time(&self) -> Option<f64> {
        self.t_finish
    }

    pub fn get_overshoot(&self) -> f64 {
        self.s_overshoot
    }

    /// get_stints returns all stints including the current one as (compound, laps).
    pub fn get_stints(&self) -> Vec<(Compound, u32)> {
        let mut stints = self.stints.to_owned();
        stints.push((self.tireset.compound, self.tireset.age_cur_stint));
        stints
    }

    pub fn get_no_pitstops(&self) -> usize {
        self.stints.len()
    }

    /// get_strategy_string summarizes the stints, e.g. `S(12) -> M(20)`.
    pub fn get_strategy_string(&self) -> String {
        self.get_stints()
            .iter()
            .map(|(compound, laps)| format!("{}({})", compound.abbr(), laps))
            .collect::<Vec<String>>()
            .join(" -> ")
    }
}
