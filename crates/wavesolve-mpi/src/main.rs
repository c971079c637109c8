//! The distributed solver binary.
//!
//! ```text
//! mpirun -np P wavesolve-mpi <input.wo> <output.wo>
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use mpi::traits::*;

use wavesolve_engine::config::interval_from_env;

const USAGE: &str = "\
Usage: wavesolve-mpi <input.wo> <output.wo>

Distributed damped-wave solver. Rows are partitioned across MPI ranks;
halo rows are exchanged every step and termination is a collective
energy decision.

This build reads the state file's `t` field as REMAINING simulation
time: it runs at most floor(t / dt) steps, counting t down by dt per
step, and records the remaining time reached in the output header.

If the output file already exists the run resumes from it instead of
the input.

Environment:
  INTVL   wall-clock checkpoint interval in seconds (float);
          absent, malformed, or <= 0 disables periodic checkpoints
";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print!("{USAGE}");
        return ExitCode::SUCCESS;
    }
    if args.len() != 3 {
        eprint!("{USAGE}");
        return ExitCode::from(1);
    }
    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);

    let Some(universe) = mpi::initialize() else {
        eprintln!("error: MPI environment failed to initialize");
        return ExitCode::from(2);
    };
    let world = universe.world();
    let interval = interval_from_env();

    match wavesolve_mpi::solver::run(&world, &input, &output, interval) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error (rank {}): {e}", world.rank());
            ExitCode::from(2)
        }
    }
}
