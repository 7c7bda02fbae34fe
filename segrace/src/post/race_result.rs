use crate::core::race::WeatherCondition;
use serde::Serialize;
use std::fmt::Write;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// ResultEntry contains the final classification of a single car.
#[derive(Debug, Serialize, Clone)]
pub struct ResultEntry {
    pub position: usize,
    pub driver_name: String,
    pub team_name: String,
    pub t_finish: Option<f64>,
    pub compl_laps: u32,
    pub strategy: String,
    pub no_pitstops: usize,
    pub t_pit_total: f64,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Serialize, Clone)]
pub struct RaceResult {
    pub track_name: String,
    pub tot_no_laps: u32,
    pub weather: WeatherCondition,
    pub seed: u64,
    pub entries: Vec<ResultEntry>,
}

impl RaceResult {
    /// get_winner returns the name of the winning driver.
    pub fn get_winner(&self) -> Option<&str> {
        self.entries
            .first()
            .filter(|entry| entry.t_finish.is_some())
            .map(|entry| entry.driver_name.as_str())
    }

    fn format_results(&self) -> Result<String, std::fmt::Error> {
        let mut content = String::new();

        writeln!(
            &mut content,
            "RESULT: {} - {} laps, weather {}, seed {}",
            self.track_name, self.tot_no_laps, self.weather, self.seed
        )?;
        writeln!(
            &mut content,
            "{:<4}{:<18}{:<16}{:>12}  {:>10}  STRATEGY",
            "POS", "DRIVER", "TEAM", "TIME", "PIT TIME"
        )?;

        for entry in self.entries.iter() {
            let t_finish = match entry.t_finish {
                Some(t_finish) => format!("{:.3}s", t_finish),
                None => format!("DNF ({}L)", entry.compl_laps),
            };
            writeln!(
                &mut content,
                "{:<4}{:<18}{:<16}{:>12}  {:>9.3}s  {}",
                entry.position,
                entry.driver_name,
                entry.team_name,
                t_finish,
                entry.t_pit_total,
                entry.strategy
            )?;
        }

        Ok(content)
    }

    /// print_results prints the final classification to the console output.
    pub fn print_results(&self) -> anyhow::Result<()> {
        print!("{}", self.format_results()?);
        Ok(())
    }

    /// write_results_to_file writes the final classification to a text file in output/ (or to
    /// `path` if set). Returns the path to the written file.
    pub fn write_results_to_file(&self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let out_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let out_dir = Path::new("output");
                std::fs::create_dir_all(out_dir)?;
                out_dir.join(format!("result_{}_seed{}.txt", self.track_name, self.seed))
            }
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(self.format_results()?.as_bytes())?;
        file.flush()?;

        Ok(out_path)
    }
}
