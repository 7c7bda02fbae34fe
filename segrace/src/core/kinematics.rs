use crate::core::driver::Driver;
use crate::core::events::PerfModifiers;
use crate::core::race::SimConstants;
use crate::core::team::Team;
use crate::core::tireset::{TireConfig, Tireset};
use crate::core::track::{Segment, Track};

/// KinematicsEnv bundles the immutable race data that is required to move a single car.
#[derive(Debug, Clone, Copy)]
pub struct KinematicsEnv<'a> {
    pub track: &'a Track,
    pub driver: &'a Driver,
    pub team: &'a Team,
    pub tire_config: &'a TireConfig,
    pub sim_consts: &'a SimConstants,
    pub weather_grip: f64,
}

impl<'a> KinematicsEnv<'a> {
    /// corner_grip returns the effective friction coefficient available in corners.
    ///
    /// grip = base tire grip * weather * driver skill * tire state * compound grip * modifier
    pub fn corner_grip(&self, tireset: &Tireset, mods: &PerfModifiers) -> f64 {
        self.team.base_tire_grip
            * self.weather_grip
            * self.driver.skill_factor()
            * tireset.tire_state_factor()
            * self.tire_config.for_compound(tireset.compound).grip
            * mods.grip
    }

    /// v_straight returns the top speed of the car in m/s.
    pub fn v_straight(&self, mods: &PerfModifiers) -> f64 {
        self.team.v_max_straight(self.sim_consts) * mods.top_speed
    }

    pub fn speed_limit(&self, segment: &Segment, tireset: &Tireset, mods: &PerfModifiers) -> f64 {
        segment.speed_limit(
            self.v_straight(mods),
            self.corner_grip(tireset, mods),
            self.sim_consts,
        )
    }

    /// effective_acceleration returns the acceleration in m/s^2 on the current tires.
    pub fn effective_acceleration(&self, tireset: &Tireset, mods: &PerfModifiers) -> f64 {
        self.team.acceleration * self.tire_grip_scale(tireset) * mods.acceleration
    }

    /// effective_braking returns the deceleration in m/s^2 on the current tires.
    pub fn effective_braking(&self, tireset: &Tireset, mods: &PerfModifiers) -> f64 {
        self.team.braking * self.tire_grip_scale(tireset) * mods.grip
    }

    fn tire_grip_scale(&self, tireset: &Tireset) -> f64 {
        tireset.condition * self.weather_grip * self.tire_config.for_compound(tireset.compound).grip
    }

    /// calc_target_speed returns the speed the car aims for at lap distance `s_lap`. This is the
    /// limit of the current segment unless the car has to start braking for the next one.
    pub fn calc_target_speed(
        &self,
        s_lap: f64,
        v_cur: f64,
        tireset: &Tireset,
        mods: &PerfModifiers,
    ) -> f64 {
        let (seg_idx, _) = self.track.segment_at(s_lap);
        let next_idx = self.track.next_segment_idx(seg_idx);

        let v_limit_cur = self.speed_limit(self.track.get_segment(seg_idx), tireset, mods);
        let v_limit_next = self.speed_limit(self.track.get_segment(next_idx), tireset, mods);

        let a_brake = self.effective_braking(tireset, mods);
        let d_brake = (v_cur.powi(2) - v_limit_next.powi(2)) / (2.0 * a_brake);
        let d_to_seg_end = self.track.get_dist_to_seg_end(seg_idx, s_lap);

        if v_cur > v_limit_next && d_to_seg_end <= self.sim_consts.braking_margin * d_brake {
            v_limit_next
        } else {
            v_limit_cur
        }
    }

    /// calc_ref_laptime estimates the time for a lap at the speed limits of fresh tires with a
    /// compound grip of 1.0 (used as base lap time by the pit strategy).
    pub fn calc_ref_laptime(&self, mods: &PerfModifiers) -> f64 {
        let v_straight = self.v_straight(mods);
        let grip = self.team.base_tire_grip * self.weather_grip * self.driver.skill_factor() * mods.grip;

        self.track
            .segments()
            .iter()
            .map(|segment| {
                let v = segment
                    .speed_limit(v_straight, grip, self.sim_consts)
                    .max(self.sim_consts.v_min_finish);
                segment.length() / v
            })
            .sum()
    }
}

/// approach_speed moves `v_cur` towards `v_target` by the available acceleration or braking
/// without overshooting the target.
pub fn approach_speed(
    v_cur: f64,
    v_target: f64,
    a_acc: f64,
    a_brake: f64,
    timestep_size: f64,
) -> f64 {
    let v_new = if v_cur < v_target {
        (v_cur + a_acc * timestep_size).min(v_target)
    } else if v_cur > v_target {
        (v_cur - a_brake * timestep_size).max(v_target)
    } else {
        v_cur
    };
    v_new.max(0.0)
}
