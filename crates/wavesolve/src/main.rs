//! The shared-memory solver binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use wavesolve_engine::{solve, SolverConfig};
use wavesolve_state::read_state;

const LONG_ABOUT: &str = "\
Damped 2D wave solver (shared-memory build).

Integrates the state in <input.wo> until the total mechanical energy
falls to 0.001 per interior cell, then writes <output.wo> plus a final
time-stamped snapshot (chk-NNNNNNN.NN.wo).

This build reads the state file's `t` field as ELAPSED simulation time
and advances it by dt per step. (The distributed wavesolve-mpi build
reads the same field as remaining time; see its --help.)

If <output.wo> already exists the run resumes from it, which makes
rerunning the same command after a crash pick up from the most recent
durable checkpoint.

Environment:
  INTVL               wall-clock checkpoint interval in seconds (float);
                      absent, malformed, or <= 0 disables checkpoints
  SOLVER_NUM_THREADS  worker count when --threads is not given
  OMP_NUM_THREADS     fallback worker count";

#[derive(Parser, Debug)]
#[command(name = "wavesolve", version, about = "Damped 2D wave solver", long_about = LONG_ABOUT)]
struct Cli {
    /// Initial state file (.wo).
    input: PathBuf,
    /// Output state file; also the restart and checkpoint target.
    output: PathBuf,
    /// Worker thread count (overrides SOLVER_NUM_THREADS / OMP_NUM_THREADS).
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    // Restart preference: an existing output holds the most recently
    // durable state of this very run.
    let source = if cli.output.exists() {
        log::info!("resuming from existing output {}", cli.output.display());
        &cli.output
    } else {
        &cli.input
    };

    let grid = match read_state(source) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let config = SolverConfig::from_env(cli.threads);
    match solve(grid, &cli.output, &config) {
        Ok(summary) => {
            log::info!(
                "done: {} steps, t = {:.4}, E = {:.6e}",
                summary.steps,
                summary.final_time,
                summary.final_energy
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
