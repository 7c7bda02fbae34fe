use clap::Parser;
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record};
use rayon::prelude::*;
use segrace::core::handle_race::handle_race;
use segrace::post::race_result::RaceResult;
use segrace::pre::read_sim_pars::{read_sim_pars, read_track_csv};
use segrace::pre::sim_opts::SimOpts;
use std::collections::BTreeMap;
use std::thread;
use std::time::Instant;

/// ConsoleLogger prints log records as `LEVEL: message` lines.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARNING",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };

        if record.level() <= Level::Warn {
            eprintln!("{}: {}", level, record.args());
        } else {
            println!("{}: {}", level, record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logger(debug: bool) -> anyhow::Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
    log::set_max_level(if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    Ok(())
}

fn print_win_counts(race_results: &[RaceResult]) {
    let mut win_counts: BTreeMap<&str, u32> = BTreeMap::new();

    for race_result in race_results.iter() {
        if let Some(winner) = race_result.get_winner() {
            *win_counts.entry(winner).or_insert(0) += 1;
        }
    }

    info!("Wins over {} simulation runs:", race_results.len());
    for (driver_name, no_wins) in win_counts.iter() {
        info!("{:<18}{:>5}", driver_name, no_wins);
    }
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();
    init_logger(sim_opts.debug)?;

    // get simulation parameters
    info!("Reading simulation parameters from {:?}", sim_opts.parfile_path);
    let mut sim_pars = read_sim_pars(&sim_opts.parfile_path)?;

    if let Some(trackfile_path) = &sim_opts.trackfile_path {
        info!("Loading track from {:?}", trackfile_path);
        sim_pars.track_pars = read_track_csv(trackfile_path)?;
    }

    let seed = sim_opts.seed.unwrap_or(sim_pars.race_pars.seed);

    // print race details
    info!(
        "Simulating {} over {} laps with a time step size of {:.3}s",
        sim_pars.track_pars.name, sim_pars.race_pars.tot_no_laps, sim_opts.timestep_size
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if !sim_opts.live {
        let t_start = Instant::now();

        if sim_opts.no_sim_runs <= 1 {
            let race_result = handle_race(
                &sim_pars,
                sim_opts.timestep_size,
                seed,
                sim_opts.debug,
                None,
                1.0,
            )?;

            info!("Execution time: {}ms", t_start.elapsed().as_millis());

            race_result.print_results()?;
            match race_result.write_results_to_file(None) {
                Ok(path) => info!("Results written to {:?}", path),
                Err(e) => warn!("Could not write results: {}", e),
            }
        } else {
            // runs are independent races, each one deterministic for its seed
            let race_results = (0..sim_opts.no_sim_runs as u64)
                .into_par_iter()
                .map(|run| {
                    handle_race(
                        &sim_pars,
                        sim_opts.timestep_size,
                        seed.wrapping_add(run),
                        false,
                        None,
                        1.0,
                    )
                })
                .collect::<anyhow::Result<Vec<RaceResult>>>()?;

            info!(
                "Execution time for {} runs: {}ms",
                sim_opts.no_sim_runs,
                t_start.elapsed().as_millis()
            );

            print_win_counts(&race_results);
        }
    } else {
        info!("Starting live simulation...");

        // create channel for the communication between simulator and display
        let (tx, rx) = flume::unbounded();

        // run simulator in a separate thread
        let sim_opts_thread = sim_opts.clone();
        let sim_pars_thread = sim_pars.clone();

        let sim_thread = thread::spawn(move || {
            handle_race(
                &sim_pars_thread,
                sim_opts_thread.timestep_size,
                seed,
                false,
                Some(&tx),
                sim_opts_thread.realtime_factor,
            )
        });

        // print snapshots until the simulator hangs up
        for snapshot in rx.iter() {
            print!("\x1b[2J\x1b[1;1H{}", snapshot);
        }

        let race_result = sim_thread
            .join()
            .map_err(|_| anyhow::anyhow!("Simulation thread panicked!"))??;

        race_result.print_results()?;
        match race_result.write_results_to_file(None) {
            Ok(path) => info!("Results written to {:?}", path),
            Err(e) => warn!("Could not write results: {}", e),
        }
    }

    Ok(())
}
