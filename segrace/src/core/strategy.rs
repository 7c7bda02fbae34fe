use crate::core::error::{check_bounds, check_non_negative, check_probability, SetupError};
use crate::core::race::SimConstants;
use crate::core::tireset::{Compound, TireConfig};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTier {
    Aggressive,
    Balanced,
    Conservative,
}

impl Default for StrategyTier {
    fn default() -> Self {
        StrategyTier::Balanced
    }
}

/// * `critical_condition` - (-) Tire condition below which a stop is made in any case
/// * `soft_below_laps` - Remaining laps below which the soft compound is fitted (never if unset)
/// * `hard_above_laps` - Remaining laps above which the hard compound is fitted (never if unset)
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TierPars {
    pub critical_condition: f64,
    #[serde(default)]
    pub soft_below_laps: Option<u32>,
    #[serde(default)]
    pub hard_above_laps: Option<u32>,
}

impl TierPars {
    /// choose_compound picks the compound by banding the number of remaining laps.
    pub fn choose_compound(&self, laps_remaining: u32) -> Compound {
        if self.soft_below_laps.map_or(false, |laps| laps_remaining < laps) {
            Compound::Soft
        } else if self.hard_above_laps.map_or(false, |laps| laps_remaining > laps) {
            Compound::Hard
        } else {
            Compound::Medium
        }
    }
}

/// * `t_pit_base` - (s) Mean pit stop standstill time for a pit stop multiplier of 1.0
/// * `t_pit_sd` - (s) Standard deviation of the pit stop standstill time
/// * `t_pit_min` - (s) Lower bound of the pit stop standstill time
/// * `t_pit_max` - (s) Upper bound of the pit stop standstill time
/// * `t_safety_margin` - (s) Time a stop must gain in the lookahead to be worth it
/// * `min_laps_remaining` - No stop is made with this many laps or less to go
/// * `random_compound_prob` - (-) Probability of fitting a compound outside the band
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyPars {
    pub t_pit_base: f64,
    pub t_pit_sd: f64,
    pub t_pit_min: f64,
    pub t_pit_max: f64,
    pub t_safety_margin: f64,
    pub min_laps_remaining: u32,
    pub random_compound_prob: f64,
    pub aggressive: TierPars,
    pub balanced: TierPars,
    pub conservative: TierPars,
}

impl StrategyPars {
    pub fn for_tier(&self, tier: StrategyTier) -> &TierPars {
        match tier {
            StrategyTier::Aggressive => &self.aggressive,
            StrategyTier::Balanced => &self.balanced,
            StrategyTier::Conservative => &self.conservative,
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        check_non_negative("pit duration standard deviation", self.t_pit_sd)?;
        check_non_negative("minimum pit duration", self.t_pit_min)?;
        check_bounds("pit duration", self.t_pit_min, self.t_pit_max)?;
        check_non_negative("pit safety margin", self.t_safety_margin)?;
        check_probability("random compound probability", self.random_compound_prob)?;
        for tier_pars in [&self.aggressive, &self.balanced, &self.conservative] {
            check_probability("critical tire condition", tier_pars.critical_condition)?;
        }
        Ok(())
    }
}

impl Default for StrategyPars {
    fn default() -> Self {
        StrategyPars {
            t_pit_base: 22.0,
            t_pit_sd: 2.0,
            t_pit_min: 15.0,
            t_pit_max: 40.0,
            t_safety_margin: 1.0,
            min_laps_remaining: 2,
            random_compound_prob: 0.05,
            aggressive: TierPars {
                critical_condition: 0.25,
                soft_below_laps: Some(15),
                hard_above_laps: None,
            },
            balanced: TierPars {
                critical_condition: 0.3,
                soft_below_laps: Some(10),
                hard_above_laps: Some(25),
            },
            conservative: TierPars {
                critical_condition: 0.4,
                soft_below_laps: None,
                hard_above_laps: Some(19),
            },
        }
    }
}

/// StintState is the state of a car at a lap transition as seen by the pit strategy.
///
/// * `wear_per_lap` - (-) Tire condition lost on the last lap on the current compound
/// * `t_lap_ref` - (s) Lap time on fresh tires with a compound grip of 1.0
#[derive(Debug, Clone, Copy)]
pub struct StintState {
    pub compound: Compound,
    pub condition: f64,
    pub wear_per_lap: f64,
    pub laps_remaining: u32,
    pub t_lap_ref: f64,
    pub pit_stop_multiplier: f64,
    pub tier: StrategyTier,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitDecision {
    pub pit: bool,
    pub compound_next: Compound,
    pub t_pit: f64,
    pub t_stay_out: f64,
    pub t_pit_now: f64,
}

/// draw_pit_duration draws the standstill time of a pit stop from a normal distribution that
/// is scaled by the pit crew's multiplier, bounded to [t_pit_min, t_pit_max].
pub fn draw_pit_duration<R: Rng>(
    rng: &mut R,
    strategy_pars: &StrategyPars,
    pit_stop_multiplier: f64,
) -> f64 {
    let t_mean = strategy_pars.t_pit_base * pit_stop_multiplier;
    let t_pit = match Normal::new(t_mean, strategy_pars.t_pit_sd) {
        Ok(normal) => normal.sample(rng),
        Err(_) => t_mean,
    };
    t_pit.max(strategy_pars.t_pit_min).min(strategy_pars.t_pit_max)
}

/// simulate_remaining_laps returns the projected time for `no_laps` laps starting on tires with
/// `condition`. A stop is inserted whenever the condition would drop below `critical_condition`.
#[allow(clippy::too_many_arguments)]
pub fn simulate_remaining_laps(
    no_laps: u32,
    condition: f64,
    compound_grip: f64,
    wear_per_lap: f64,
    t_lap_ref: f64,
    t_pit: f64,
    critical_condition: f64,
    tire_cliff: f64,
) -> f64 {
    let mut t_tot = 0.0;
    let mut condition = condition;

    for _ in 0..no_laps {
        if condition - wear_per_lap < critical_condition && condition < 1.0 {
            t_tot += t_pit;
            condition = 1.0;
        }

        let tire_state_factor = 0.5 + condition * 0.5;
        t_tot += t_lap_ref / (compound_grip * tire_state_factor).sqrt();
        condition = (condition - wear_per_lap).max(tire_cliff);
    }

    t_tot
}

/// plan_pit_stop decides at a lap transition whether the car should pit and which compound it
/// gets. Random numbers are drawn in a fixed order: pit duration first, then (only when
/// stopping) the out-of-band compound choice.
pub fn plan_pit_stop<R: Rng>(
    rng: &mut R,
    stint: &StintState,
    strategy_pars: &StrategyPars,
    tire_config: &TireConfig,
    sim_consts: &SimConstants,
) -> PitDecision {
    let t_pit = draw_pit_duration(rng, strategy_pars, stint.pit_stop_multiplier);
    let tier_pars = strategy_pars.for_tier(stint.tier);
    let mut compound_next = tier_pars.choose_compound(stint.laps_remaining);

    let pars_cur = tire_config.for_compound(stint.compound);
    let pars_next = tire_config.for_compound(compound_next);
    let wear_per_lap_next = if pars_cur.wear_rate > 0.0 {
        stint.wear_per_lap * pars_next.wear_rate / pars_cur.wear_rate
    } else {
        stint.wear_per_lap
    };

    let t_stay_out = simulate_remaining_laps(
        stint.laps_remaining,
        stint.condition,
        pars_cur.grip,
        stint.wear_per_lap,
        stint.t_lap_ref,
        t_pit,
        tier_pars.critical_condition,
        sim_consts.tire_cliff,
    );
    let t_pit_now = t_pit
        + simulate_remaining_laps(
            stint.laps_remaining,
            1.0,
            pars_next.grip,
            wear_per_lap_next,
            stint.t_lap_ref,
            t_pit,
            tier_pars.critical_condition,
            sim_consts.tire_cliff,
        );

    let pit = stint.laps_remaining > strategy_pars.min_laps_remaining
        && (stint.condition < tier_pars.critical_condition
            || t_stay_out - t_pit_now > strategy_pars.t_safety_margin);

    if pit && rng.gen::<f64>() < strategy_pars.random_compound_prob {
        let others: Vec<Compound> = Compound::ALL
            .iter()
            .copied()
            .filter(|&c| c != compound_next)
            .collect();
        compound_next = others[rng.gen_range(0..others.len())];
    }

    PitDecision {
        pit,
        compound_next,
        t_pit,
        t_stay_out,
        t_pit_now,
    }
}
