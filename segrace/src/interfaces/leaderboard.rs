use std::fmt;

pub const MAX_DISPLAY_UPDATE_FREQUENCY: f64 = 2.0;

/// (m/s) Reference speed used to convert distance gaps into time gaps during the race.
const V_GAP_REF: f64 = 60.0;

/// Number of characters of the lap progress bar.
const PROGRESS_BAR_WIDTH: usize = 15;

/// GapInfo contains the data of a car that is needed to compute its gap to the leader.
#[derive(Debug, Clone, Copy)]
pub struct GapInfo {
    pub t_finish: Option<f64>,
    pub s_total: f64,
}

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub driver_name: String,
    pub cur_lap: u32,
    pub lap_frac: f64,
    pub gap: String,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct LeaderboardSnapshot {
    pub race_time: f64,
    pub tot_no_laps: u32,
    pub entries: Vec<LeaderboardEntry>,
}

fn laps_down_string(laps: u32) -> String {
    if laps > 1 {
        format!("+{} LAPS", laps)
    } else {
        format!("+{} LAP", laps)
    }
}

/// calc_gap_string returns the gap of the car at 0-based position `pos` to the leader.
///
/// Once both cars are finished, the gap is the difference of the finish times, or the number of
/// laps down if it exceeds the leader's average lap time. Before that, the distance gap is
/// converted into an estimated time gap, or the number of laps down if it exceeds a lap.
pub fn calc_gap_string(
    pos: usize,
    leader: &GapInfo,
    car: &GapInfo,
    track_length: f64,
    tot_no_laps: u32,
) -> String {
    if pos == 0 {
        return "Leader".to_owned();
    }

    if let (Some(t_leader), Some(t_car)) = (leader.t_finish, car.t_finish) {
        let t_diff = t_car - t_leader;
        let t_lap_avg = t_leader / tot_no_laps as f64;

        if t_lap_avg > 0.0 && t_diff > t_lap_avg {
            laps_down_string((t_diff / t_lap_avg) as u32)
        } else {
            format!("+{:.3}s", t_diff)
        }
    } else {
        let s_gap = leader.s_total - car.s_total;

        if s_gap > track_length {
            laps_down_string((s_gap / track_length) as u32)
        } else {
            format!("+{:.3}s", s_gap / V_GAP_REF)
        }
    }
}

fn progress_bar(lap_frac: f64) -> String {
    let progress = (lap_frac * PROGRESS_BAR_WIDTH as f64) as usize;
    let bar: String = (0..PROGRESS_BAR_WIDTH)
        .map(|k| {
            if k < progress {
                '='
            } else if k == progress {
                '>'
            } else {
                ' '
            }
        })
        .collect();
    format!("[{}]", bar)
}

impl fmt::Display for LeaderboardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "RACE TIME: {:.1}s | LAPS: {}",
            self.race_time, self.tot_no_laps
        )?;
        writeln!(f, "{}", "=".repeat(79))?;
        writeln!(
            f,
            "{:<4}{:<18}{:<8}{:<18}{:<12}STATUS",
            "POS", "DRIVER", "LAP", "PROGRESS", "GAP"
        )?;
        writeln!(f, "{}", "-".repeat(79))?;

        for entry in self.entries.iter() {
            writeln!(
                f,
                "{:<4}{:<18}{:<8}{:<18}{:<12}{}",
                entry.position,
                entry.driver_name,
                format!("{}/{}", entry.cur_lap, self.tot_no_laps),
                progress_bar(entry.lap_frac),
                entry.gap,
                entry.status
            )?;
        }

        Ok(())
    }
}
