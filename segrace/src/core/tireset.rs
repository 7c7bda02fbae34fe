use crate::core::error::{check_non_negative, check_positive, SetupError};
use crate::core::race::SimConstants;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
}

impl Compound {
    pub const ALL: [Compound; 3] = [Compound::Soft, Compound::Medium, Compound::Hard];

    /// abbr returns the single-letter abbreviation used in strategy strings.
    pub fn abbr(&self) -> &'static str {
        match self {
            Compound::Soft => "S",
            Compound::Medium => "M",
            Compound::Hard => "H",
        }
    }
}

impl Default for Compound {
    fn default() -> Self {
        Compound::Medium
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Compound::Soft => "Soft",
            Compound::Medium => "Medium",
            Compound::Hard => "Hard",
        };
        write!(f, "{}", name)
    }
}

/// * `grip` - (-) Grip multiplier of the compound
/// * `wear_rate` - (-) Wear rate multiplier of the compound
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CompoundPars {
    pub grip: f64,
    pub wear_rate: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TireConfig {
    #[serde(default = "TireConfig::default_soft")]
    pub soft: CompoundPars,
    #[serde(default = "TireConfig::default_medium")]
    pub medium: CompoundPars,
    #[serde(default = "TireConfig::default_hard")]
    pub hard: CompoundPars,
}

impl TireConfig {
    fn default_soft() -> CompoundPars {
        CompoundPars {
            grip: 1.1,
            wear_rate: 1.5,
        }
    }

    fn default_medium() -> CompoundPars {
        CompoundPars {
            grip: 1.0,
            wear_rate: 1.0,
        }
    }

    fn default_hard() -> CompoundPars {
        CompoundPars {
            grip: 0.9,
            wear_rate: 0.6,
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        check_positive("soft compound grip", self.soft.grip)?;
        check_positive("medium compound grip", self.medium.grip)?;
        check_positive("hard compound grip", self.hard.grip)?;
        check_non_negative("soft compound wear rate", self.soft.wear_rate)?;
        check_non_negative("medium compound wear rate", self.medium.wear_rate)?;
        check_non_negative("hard compound wear rate", self.hard.wear_rate)
    }

    pub fn for_compound(&self, compound: Compound) -> &CompoundPars {
        match compound {
            Compound::Soft => &self.soft,
            Compound::Medium => &self.medium,
            Compound::Hard => &self.hard,
        }
    }
}

impl Default for TireConfig {
    fn default() -> Self {
        TireConfig {
            soft: TireConfig::default_soft(),
            medium: TireConfig::default_medium(),
            hard: TireConfig::default_hard(),
        }
    }
}

/// Tireset tracks the state of the currently fitted tires.
///
/// `condition` is the remaining tread: 1.0 for a fresh set, decreasing while driving and floored
/// at the cliff value, where the tire stops degrading any further.
#[derive(Debug, Clone)]
pub struct Tireset {
    pub compound: Compound,
    pub condition: f64,
    pub age_cur_stint: u32,
    condition_lap_start: f64,
    wear_last_lap: Option<f64>,
}

impl Tireset {
    pub fn new(compound: Compound) -> Tireset {
        Tireset {
            compound,
            condition: 1.0,
            age_cur_stint: 0,
            condition_lap_start: 1.0,
            wear_last_lap: None,
        }
    }

    /// tire_state_factor returns the grip factor due to the tire condition (0.5 for a completely
    /// worn tire, 1.0 for a fresh one).
    pub fn tire_state_factor(&self) -> f64 {
        0.5 + self.condition * 0.5
    }

    /// apply_wear reduces the condition for a timestep.
    ///
    /// wear = base_wear_rate * segment factor * carefulness factor * compound wear rate * dt
    pub fn apply_wear(
        &mut self,
        in_corner: bool,
        awareness: f64,
        tire_config: &TireConfig,
        sim_consts: &SimConstants,
        timestep_size: f64,
    ) {
        let seg_factor = if in_corner {
            sim_consts.wear_factor_corner
        } else {
            sim_consts.wear_factor_straight
        };
        let carefulness_factor = 1.0 + (100.0 - awareness) / 200.0;
        let wear = sim_consts.base_wear_rate
            * seg_factor
            * carefulness_factor
            * tire_config.for_compound(self.compound).wear_rate
            * timestep_size;

        self.reduce_condition(wear, sim_consts);
    }

    /// reduce_condition removes `wear` from the condition, respecting the cliff and fresh bounds.
    pub fn reduce_condition(&mut self, wear: f64, sim_consts: &SimConstants) {
        self.condition = (self.condition - wear)
            .max(sim_consts.tire_cliff)
            .min(1.0);
    }

    /// drive_lap increases the stint age by one lap and remembers the wear of the completed lap.
    pub fn drive_lap(&mut self) {
        self.age_cur_stint += 1;
        self.wear_last_lap = Some((self.condition_lap_start - self.condition).max(0.0));
        self.condition_lap_start = self.condition;
    }

    /// wear_last_lap returns the condition lost on the last completed lap of this stint.
    pub fn wear_last_lap(&self) -> Option<f64> {
        self.wear_last_lap
    }
}
