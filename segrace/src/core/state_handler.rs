use crate::core::tireset::Compound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Racing,
    Pitting,
    Finished,
}

/// StateHandler tracks the progress of a car on the track and its state machine
/// (Racing -> Pitting -> Racing, and finally Finished).
///
/// The lap distance `s_lap` is negative at the race start for cars that are staggered behind the
/// finish line on the grid. The invariant `s_total = compl_lap * track_length + s_lap` holds at
/// any time.
#[derive(Debug, Clone)]
pub struct StateHandler {
    // parameters
    track_length: f64,

    // variables related to the track progress
    s_lap_prev: f64,
    s_lap_cur: f64,
    s_total: f64,

    // variables related to the state machine
    state: State,
    t_pit_remaining: f64,
    compound_next: Compound,

    // variables related to the race progress
    compl_lap_prev: u32,
    compl_lap_cur: u32,
}

impl StateHandler {
    pub fn initialize_state_handler(&mut self, s_lap_start: f64, track_length: f64) {
        self.track_length = track_length;
        self.s_lap_prev = s_lap_start;
        self.s_lap_cur = s_lap_start;
        self.s_total = s_lap_start;
    }

    /// update_race_prog moves the car forward by `ds` and returns true if a new lap was started.
    /// The lap distance is wrapped at most once, the timestep size is limited during the race
    /// setup such that a car cannot cover more than one lap per step.
    pub fn update_race_prog(&mut self, ds: f64) -> bool {
        // update previous state
        self.compl_lap_prev = self.compl_lap_cur;
        self.s_lap_prev = self.s_lap_cur;

        // update current state
        self.s_lap_cur += ds;
        self.s_total += ds;

        // check if a new lap was started
        if self.s_lap_cur >= self.track_length {
            self.compl_lap_cur += 1;
            self.s_lap_cur -= self.track_length;
        }

        self.get_new_lap()
    }

    /// shift_position moves the car by `ds` without counting it as driven distance of a timestep
    /// (used when two cars swap positions). The caller ensures that no lap line is crossed.
    pub fn shift_position(&mut self, ds: f64) {
        self.s_lap_cur += ds;
        self.s_total += ds;
    }

    /// act_pit switches from racing to the pit standstill for `t_pit` seconds, after which a new
    /// set of `compound_next` tires is fitted.
    pub fn act_pit(&mut self, t_pit: f64, compound_next: Compound) {
        if self.state != State::Racing {
            panic!("Tried to enter the pits without racing!")
        }

        self.state = State::Pitting;
        self.t_pit_remaining = t_pit;
        self.compound_next = compound_next;
    }

    /// progress_pit reduces the remaining standstill time. It returns the compound to be fitted if
    /// the standstill ends in this timestep, in which case the car is racing again.
    pub fn progress_pit(&mut self, timestep_size: f64) -> Option<Compound> {
        if self.state != State::Pitting {
            panic!("Tried to progress a pit stop without being in the pits!")
        }

        self.t_pit_remaining -= timestep_size;

        if self.t_pit_remaining <= 0.0 {
            self.t_pit_remaining = 0.0;
            self.state = State::Racing;
            Some(self.compound_next)
        } else {
            None
        }
    }

    pub fn set_finished(&mut self) {
        self.state = State::Finished;
        self.t_pit_remaining = 0.0;
    }

    pub fn get_state(&self) -> State {
        self.state
    }

    pub fn is_racing(&self) -> bool {
        self.state == State::Racing
    }

    pub fn pit_act(&self) -> bool {
        self.state == State::Pitting
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    pub fn get_t_pit_remaining(&self) -> f64 {
        self.t_pit_remaining
    }

    /// get_s_laps returns the lap distances of the previous and the current step.
    pub fn get_s_laps(&self) -> (f64, f64) {
        (self.s_lap_prev, self.s_lap_cur)
    }

    pub fn get_s_lap(&self) -> f64 {
        self.s_lap_cur
    }

    pub fn get_s_total(&self) -> f64 {
        self.s_total
    }

    /// get_lap_frac returns the fraction of the current lap in [0.0, 1.0[ (0.0 on the grid).
    pub fn get_lap_frac(&self) -> f64 {
        (self.s_lap_cur / self.track_length).max(0.0).min(1.0 - f64::EPSILON)
    }

    pub fn get_compl_lap(&self) -> u32 {
        self.compl_lap_cur
    }

    pub fn get_new_lap(&self) -> bool {
        self.compl_lap_cur > self.compl_lap_prev
    }

    /// get_race_prog returns the race progress in laps.
    pub fn get_race_prog(&self) -> f64 {
        self.s_total / self.track_length
    }
}

impl Default for StateHandler {
    fn default() -> Self {
        StateHandler {
            track_length: 0.0,
            s_lap_prev: 0.0,
            s_lap_cur: 0.0,
            s_total: 0.0,
            state: State::Racing,
            t_pit_remaining: 0.0,
            compound_next: Compound::Medium,
            compl_lap_prev: 0,
            compl_lap_cur: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn handler(s_start: f64) -> StateHandler {
        let mut sh = StateHandler::default();
        sh.initialize_state_handler(s_start, 1000.0);
        sh
    }

    #[test]
    fn grid_stagger_delays_first_lap() {
        let mut sh = handler(-20.0);
        assert!(!sh.update_race_prog(1010.0));
        assert_eq!(sh.get_compl_lap(), 0);
        assert!(sh.update_race_prog(15.0));
        assert_eq!(sh.get_compl_lap(), 1);
        assert_relative_eq!(sh.get_s_lap(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(sh.get_s_total(), 1005.0, epsilon = 1e-9);
    }

    #[test]
    fn new_lap_flag_only_lasts_one_step() {
        let mut sh = handler(990.0);
        assert!(sh.update_race_prog(20.0));
        assert!(!sh.update_race_prog(20.0));
        assert_eq!(sh.get_compl_lap(), 1);
    }

    #[test]
    fn total_distance_matches_laps_and_lap_distance() {
        let mut sh = handler(-16.0);
        for _ in 0..1000 {
            sh.update_race_prog(37.3);
            let reconstructed = sh.get_compl_lap() as f64 * 1000.0 + sh.get_s_lap();
            assert_relative_eq!(reconstructed, sh.get_s_total(), epsilon = 1e-6);
        }
    }

    #[test]
    fn pit_stop_cycle_returns_next_compound() {
        let mut sh = handler(0.0);
        sh.act_pit(0.25, Compound::Hard);
        assert!(sh.pit_act());
        assert_eq!(sh.progress_pit(0.1), None);
        assert_eq!(sh.progress_pit(0.1), None);
        assert_eq!(sh.progress_pit(0.1), Some(Compound::Hard));
        assert!(sh.is_racing());
    }

    #[test]
    #[should_panic]
    fn finished_car_cannot_pit() {
        let mut sh = handler(0.0);
        sh.set_finished();
        sh.act_pit(20.0, Compound::Soft);
    }
}
