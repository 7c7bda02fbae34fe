use crate::core::car::Car;
use crate::core::driver::Driver;
use crate::core::error::{check_bounds, check_non_negative, check_probability, SetupError};
use crate::core::track::Track;
use helpers::general::{argsort, clamp_unit, SortOrder};
use rand::Rng;
use serde::Deserialize;

/// (m) Distance by which the passing car is placed ahead of the passed car.
const D_OVERTAKE_NUDGE: f64 = 0.1;

/// * `proximity_window` - (m) Maximum gap at which an overtake is attempted
/// * `base_chance` - (-) Overtake chance of two 85-rated drivers
/// * `k_skill` - (1/rating point) Chance change per rating point of attacker racecraft and
/// defender awareness
/// * `chance_min` - (-) Lower bound of the overtake chance (before the segment factor)
/// * `chance_max` - (-) Upper bound of the overtake chance (before the segment factor)
/// * `straight_factor` - (-) Chance factor on straights
/// * `corner_factor` - (-) Chance factor in corners
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OvertakePars {
    pub proximity_window: f64,
    pub base_chance: f64,
    pub k_skill: f64,
    pub chance_min: f64,
    pub chance_max: f64,
    pub straight_factor: f64,
    pub corner_factor: f64,
}

impl OvertakePars {
    pub fn validate(&self) -> Result<(), SetupError> {
        check_non_negative("overtake proximity window", self.proximity_window)?;
        check_probability("minimum overtake chance", self.chance_min)?;
        check_probability("maximum overtake chance", self.chance_max)?;
        check_bounds("overtake chance", self.chance_min, self.chance_max)?;
        check_non_negative("straight overtake factor", self.straight_factor)?;
        check_non_negative("corner overtake factor", self.corner_factor)
    }
}

impl Default for OvertakePars {
    fn default() -> Self {
        OvertakePars {
            proximity_window: 25.0,
            base_chance: 0.3,
            k_skill: 0.01,
            chance_min: 0.1,
            chance_max: 0.9,
            straight_factor: 1.2,
            corner_factor: 0.6,
        }
    }
}

/// calc_overtake_chance returns the probability that `attacker` passes `defender` in one
/// attempt.
pub fn calc_overtake_chance(
    attacker: &Driver,
    defender: &Driver,
    in_corner: bool,
    overtake_pars: &OvertakePars,
) -> f64 {
    let chance = (overtake_pars.base_chance
        + overtake_pars.k_skill * (attacker.racecraft - 85.0)
        - overtake_pars.k_skill * (defender.awareness - 85.0))
        .max(overtake_pars.chance_min)
        .min(overtake_pars.chance_max);

    let segment_factor = if in_corner {
        overtake_pars.corner_factor
    } else {
        overtake_pars.straight_factor
    };

    clamp_unit(chance * segment_factor)
}

/// Overtake describes a successful pass of the car with index `idx_rear` on `idx_front`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overtake {
    pub idx_front: usize,
    pub idx_rear: usize,
}

/// resolve_overtakes checks all pairs of cars that are adjacent in the running order. If the
/// rear car is within the proximity window and faster than the front car, a random draw decides
/// whether it passes. Otherwise its target speed for the next timestep is capped at the front
/// car's speed.
///
/// Only racing cars take part (cars in the pits or finished cars are ignored), cars that made a
/// mistake in this timestep are left alone, and every car takes part in at most one attempt per
/// timestep. Passes that would move either car across the lap line or carry the rear car across
/// the finish are blocked.
pub fn resolve_overtakes<R: Rng>(
    rng: &mut R,
    cars_list: &mut [Car],
    drivers: &[Driver],
    track: &Track,
    race_distance: f64,
    overtake_pars: &OvertakePars,
) -> Vec<Overtake> {
    let racing_idxs: Vec<usize> = cars_list
        .iter()
        .enumerate()
        .filter(|(_, car)| car.sh.is_racing())
        .map(|(idx, _)| idx)
        .collect();

    let s_totals: Vec<f64> = racing_idxs
        .iter()
        .map(|&idx| cars_list[idx].sh.get_s_total())
        .collect();
    let running_order: Vec<usize> = argsort(&s_totals, SortOrder::Descending)
        .into_iter()
        .map(|i| racing_idxs[i])
        .collect();

    let mut involved = vec![false; cars_list.len()];
    let mut overtakes = Vec::new();

    for pair in running_order.windows(2) {
        let (idx_front, idx_rear) = (pair[0], pair[1]);

        if involved[idx_front] || involved[idx_rear] {
            continue;
        }

        let front = &cars_list[idx_front];
        let rear = &cars_list[idx_rear];

        if front.mistake_act || rear.mistake_act {
            continue;
        }

        let gap = front.sh.get_s_total() - rear.sh.get_s_total();

        if gap > overtake_pars.proximity_window || rear.v <= front.v {
            continue;
        }

        let (seg_idx, _) = track.segment_at(rear.sh.get_s_lap());
        let chance = calc_overtake_chance(
            &drivers[rear.driver_idx],
            &drivers[front.driver_idx],
            track.get_segment(seg_idx).is_corner(),
            overtake_pars,
        );

        let ds_rear = gap + D_OVERTAKE_NUDGE;
        let feasible = rear.sh.get_s_lap() + ds_rear < track.length
            && rear.sh.get_s_total() + ds_rear < race_distance
            && (front.sh.get_s_lap() >= D_OVERTAKE_NUDGE || front.sh.get_compl_lap() == 0);
        let v_front = front.v;

        involved[idx_front] = true;
        involved[idx_rear] = true;

        if rng.gen::<f64>() < chance && feasible {
            cars_list[idx_rear].sh.shift_position(ds_rear);
            cars_list[idx_front].sh.shift_position(-D_OVERTAKE_NUDGE);
            overtakes.push(Overtake {
                idx_front,
                idx_rear,
            });
        } else {
            cars_list[idx_rear].cap_speed(v_front);
        }
    }

    overtakes
}
