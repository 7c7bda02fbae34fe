use thiserror::Error;

/// SetupError is raised while constructing a race if the inserted parameters cannot be simulated.
/// None of these errors can occur once the tick loop has started.
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error("track {name:?} does not contain any segments")]
    EmptyTrack { name: String },
    #[error("segment {idx} of track {name:?} has an invalid length of {length:.3}m")]
    InvalidSegmentLength { name: String, idx: usize, length: f64 },
    #[error("race has no entries")]
    NoEntries,
    #[error("race must have at least one lap")]
    NoLaps,
    #[error("entry references unknown driver {driver:?}")]
    UnknownDriver { driver: String },
    #[error("driver {driver:?} references unknown team {team:?}")]
    UnknownTeam { driver: String, team: String },
    #[error("timestep size must be positive and finite (got {timestep_size})")]
    InvalidTimestep { timestep_size: f64 },
    #[error(
        "timestep size {timestep_size:.3}s allows covering {distance:.1}m per step, which exceeds the track length of {track_length:.1}m"
    )]
    TimestepTooLarge {
        timestep_size: f64,
        distance: f64,
        track_length: f64,
    },
    #[error("{field} must be a probability in [0, 1] (got {value})")]
    Probability { field: &'static str, value: f64 },
    #[error("{field} bounds invalid (min {min} > max {max})")]
    Bounds {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
}

/// check_probability returns an error if `value` is not a valid probability.
pub fn check_probability(field: &'static str, value: f64) -> Result<(), SetupError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SetupError::Probability { field, value })
    }
}

/// check_bounds returns an error if the lower bound exceeds the upper bound.
pub fn check_bounds(field: &'static str, min: f64, max: f64) -> Result<(), SetupError> {
    if min <= max {
        Ok(())
    } else {
        Err(SetupError::Bounds { field, min, max })
    }
}

/// check_non_negative returns an error if `value` is negative or not a number.
pub fn check_non_negative(field: &'static str, value: f64) -> Result<(), SetupError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SetupError::Negative { field, value })
    }
}

/// check_positive returns an error if `value` is zero, negative or not a number.
pub fn check_positive(field: &'static str, value: f64) -> Result<(), SetupError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SetupError::NotPositive { field, value })
    }
}
