use serde::Deserialize;

/// * `name` - Driver name, e.g. Valtteri Bottas
/// * `experience` - (0-100) Experience rating
/// * `racecraft` - (0-100) Racecraft rating, improves cornering and attacking
/// * `awareness` - (0-100) Awareness rating, reduces mistakes, tire wear and being overtaken
/// * `pace` - (0-100) Pace rating
#[derive(Debug, Deserialize, Clone)]
pub struct DriverPars {
    pub name: String,
    pub experience: f64,
    pub racecraft: f64,
    pub awareness: f64,
    pub pace: f64,
}

#[derive(Debug, Clone)]
pub struct Driver {
    pub name: String,
    pub experience: f64,
    pub racecraft: f64,
    pub awareness: f64,
    pub pace: f64,
}

impl Driver {
    pub fn new(driver_pars: &DriverPars) -> Driver {
        Driver {
            name: driver_pars.name.to_owned(),
            experience: driver_pars.experience,
            racecraft: driver_pars.racecraft,
            awareness: driver_pars.awareness,
            pace: driver_pars.pace,
        }
    }

    /// skill_factor returns the cornering grip factor due to the driver's racecraft (1.0 at 100).
    pub fn skill_factor(&self) -> f64 {
        0.8 + self.racecraft / 500.0
    }
}
