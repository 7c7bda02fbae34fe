use crate::core::error::{check_bounds, check_non_negative, check_probability, SetupError};
use crate::core::race::SimConstants;
use rand::Rng;
use serde::Deserialize;
use std::fmt;

/// * `lap_event_prob` - (-) Probability that a transient event is triggered at a lap transition
/// * `t_event_min` - (s) Minimum duration of a transient event
/// * `t_event_max` - (s) Maximum duration of a transient event
#[derive(Debug, Deserialize, Clone)]
pub struct EventPars {
    #[serde(default = "EventPars::default_lap_event_prob")]
    pub lap_event_prob: f64,
    #[serde(default = "EventPars::default_t_event_min")]
    pub t_event_min: f64,
    #[serde(default = "EventPars::default_t_event_max")]
    pub t_event_max: f64,
}

impl EventPars {
    fn default_lap_event_prob() -> f64 {
        0.05
    }

    fn default_t_event_min() -> f64 {
        10.0
    }

    fn default_t_event_max() -> f64 {
        30.0
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        check_probability("lap event probability", self.lap_event_prob)?;
        check_non_negative("minimum event duration", self.t_event_min)?;
        check_bounds("event duration", self.t_event_min, self.t_event_max)
    }
}

impl Default for EventPars {
    fn default() -> Self {
        EventPars {
            lap_event_prob: EventPars::default_lap_event_prob(),
            t_event_min: EventPars::default_t_event_min(),
            t_event_max: EventPars::default_t_event_max(),
        }
    }
}

/// PerfModifiers are multiplicative factors on the car performance that are changed by transient
/// events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfModifiers {
    pub top_speed: f64,
    pub acceleration: f64,
    pub grip: f64,
}

impl Default for PerfModifiers {
    fn default() -> Self {
        PerfModifiers {
            top_speed: 1.0,
            acceleration: 1.0,
            grip: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    MinorGlitch,
    DriverError,
    LuckyBreak,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::MinorGlitch,
        EventKind::DriverError,
        EventKind::LuckyBreak,
    ];

    /// apply returns the modifiers while the event is active.
    pub fn apply(&self, mods: &PerfModifiers) -> PerfModifiers {
        match self {
            EventKind::MinorGlitch => PerfModifiers {
                top_speed: mods.top_speed * 0.95,
                ..*mods
            },
            EventKind::DriverError => PerfModifiers {
                acceleration: mods.acceleration * 0.9,
                grip: mods.grip * 0.9,
                ..*mods
            },
            EventKind::LuckyBreak => PerfModifiers {
                top_speed: mods.top_speed * 1.02,
                ..*mods
            },
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EventKind::MinorGlitch => "minor glitch",
            EventKind::DriverError => "driver error",
            EventKind::LuckyBreak => "lucky break",
        };
        write!(f, "{}", name)
    }
}

/// ActiveEvent stores a running transient event together with the modifiers that were in place
/// before it started, such that they can be restored exactly.
#[derive(Debug, Clone)]
pub struct ActiveEvent {
    pub kind: EventKind,
    pub t_remaining: f64,
    baseline: PerfModifiers,
}

impl ActiveEvent {
    pub fn new(kind: EventKind, t_duration: f64, baseline: PerfModifiers) -> ActiveEvent {
        ActiveEvent {
            kind,
            t_remaining: t_duration,
            baseline,
        }
    }

    pub fn baseline(&self) -> PerfModifiers {
        self.baseline
    }
}

/// LapEvent is a transient event drawn at a lap transition for the car with index `car_idx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapEvent {
    pub car_idx: usize,
    pub kind: EventKind,
    pub t_duration: f64,
}

/// check_mistake draws whether the driver makes a mistake in the current timestep.
pub fn check_mistake<R: Rng>(rng: &mut R, awareness: f64, sim_consts: &SimConstants) -> bool {
    let p_mistake = sim_consts.mistake_prob * (1.0 - awareness / 100.0);
    rng.gen::<f64>() < p_mistake
}

/// draw_lap_event draws whether a transient event occurs at a lap transition. If so, the affected
/// car is picked from `candidate_idxs`, followed by the kind and duration of the event.
pub fn draw_lap_event<R: Rng>(
    rng: &mut R,
    event_pars: &EventPars,
    candidate_idxs: &[usize],
) -> Option<LapEvent> {
    if rng.gen::<f64>() >= event_pars.lap_event_prob || candidate_idxs.is_empty() {
        return None;
    }

    let car_idx = candidate_idxs[rng.gen_range(0..candidate_idxs.len())];
    let kind = EventKind::ALL[rng.gen_range(0..EventKind::ALL.len())];
    let t_duration = rng.gen_range(event_pars.t_event_min..=event_pars.t_event_max);

    Some(LapEvent {
        car_idx,
        kind,
        t_duration,
    })
}
