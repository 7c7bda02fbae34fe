use crate::core::race::SimConstants;
use serde::Deserialize;

/// * `name` - Team name
/// * `top_speed` - (0-100) Top speed rating, scaled to m/s by the top speed scale
/// * `acceleration` - (m/s^2) Acceleration on fresh tires in dry conditions
/// * `braking` - (m/s^2) Deceleration on fresh tires in dry conditions
/// * `base_tire_grip` - (-) Base friction coefficient of the car
/// * `pit_stop_multiplier` - (-) Scales the pit stop standstill time of the crew
#[derive(Debug, Deserialize, Clone)]
pub struct TeamPars {
    pub name: String,
    pub top_speed: f64,
    pub acceleration: f64,
    pub braking: f64,
    pub base_tire_grip: f64,
    pub pit_stop_multiplier: f64,
}

#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub top_speed: f64,
    pub acceleration: f64,
    pub braking: f64,
    pub base_tire_grip: f64,
    pub pit_stop_multiplier: f64,
}

impl Team {
    pub fn new(team_pars: &TeamPars) -> Team {
        Team {
            name: team_pars.name.to_owned(),
            top_speed: team_pars.top_speed,
            acceleration: team_pars.acceleration,
            braking: team_pars.braking,
            base_tire_grip: team_pars.base_tire_grip,
            pit_stop_multiplier: team_pars.pit_stop_multiplier,
        }
    }

    /// v_max_straight returns the top speed in m/s (before the physical ceiling is applied).
    pub fn v_max_straight(&self, sim_consts: &SimConstants) -> f64 {
        self.top_speed / 100.0 * sim_consts.topspeed_scale
    }
}
