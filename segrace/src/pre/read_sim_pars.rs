use crate::core::driver::DriverPars;
use crate::core::events::EventPars;
use crate::core::race::{RacePars, SimConstants};
use crate::core::strategy::StrategyPars;
use crate::core::team::TeamPars;
use crate::core::tireset::TireConfig;
use crate::core::track::{SegmentKind, SegmentPars, TrackPars};
use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

/// SimPars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Clone)]
pub struct SimPars {
    pub race_pars: RacePars,
    #[serde(default)]
    pub track_pars: TrackPars,
    pub driver_pars_all: Vec<DriverPars>,
    pub team_pars_all: Vec<TeamPars>,
    #[serde(default)]
    pub tire_config: TireConfig,
    #[serde(default)]
    pub sim_constants: SimConstants,
    #[serde(default)]
    pub strategy_pars: StrategyPars,
    #[serde(default)]
    pub event_pars: EventPars,
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the simulation parameters
/// struct.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .with_context(|| format!("Failed to open parameter file {}!", filepath.display()))?;
    let pars = serde_json::from_reader(&fh)
        .with_context(|| format!("Failed to parse parameter file {}!", filepath.display()))?;
    Ok(pars)
}

/// CsvSegment is a single row of a track file: `kind,length,radius,angle`. Columns that do not
/// apply to the segment kind may be left empty.
#[derive(Debug, Deserialize, Clone)]
struct CsvSegment {
    kind: SegmentKind,
    length: Option<f64>,
    radius: Option<f64>,
    angle: Option<f64>,
}

/// read_track_csv reads the segments of a track from a CSV file. The track is named after the
/// file stem.
pub fn read_track_csv(filepath: &Path) -> anyhow::Result<TrackPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .with_context(|| format!("Failed to open track file {}!", filepath.display()))?;
    let name = filepath
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_owned());

    parse_track_csv(fh, &name)
        .with_context(|| format!("Failed to parse track file {}!", filepath.display()))
}

fn parse_track_csv<R: Read>(reader: R, name: &str) -> anyhow::Result<TrackPars> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut segments = vec![];

    for result in csv_reader.deserialize() {
        let csv_segment: CsvSegment = result?;
        segments.push(SegmentPars {
            kind: csv_segment.kind,
            length: csv_segment.length.unwrap_or(0.0),
            radius: csv_segment.radius.unwrap_or(0.0),
            angle: csv_segment.angle.unwrap_or(0.0),
        });
    }

    Ok(TrackPars {
        name: name.to_owned(),
        segments,
    })
}
