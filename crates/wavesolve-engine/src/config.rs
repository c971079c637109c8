//! Runtime configuration: worker count and checkpoint cadence.
//!
//! Both knobs come from the environment (with an optional CLI override for
//! the worker count). Malformed values never abort a run: a bad `INTVL`
//! disables periodic checkpointing with a warning, a bad thread count
//! falls back to 1.

use std::env;
use std::time::Duration;

/// Wall-clock checkpoint interval, in seconds (float). Absent, malformed,
/// non-finite, or <= 0 disables periodic checkpointing.
pub const INTERVAL_ENV: &str = "INTVL";

/// Preferred worker-count variable.
pub const THREADS_ENV: &str = "SOLVER_NUM_THREADS";

/// Fallback worker-count variable honoured for compatibility with
/// OpenMP-style launch scripts.
pub const THREADS_ENV_FALLBACK: &str = "OMP_NUM_THREADS";

/// Resolved configuration for one solver run.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Number of worker threads (clamped to the interior row count by the
    /// pool).
    pub threads: usize,
    /// Wall-clock interval between periodic checkpoints; `None` disables
    /// them.
    pub checkpoint_interval: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            checkpoint_interval: None,
        }
    }
}

impl SolverConfig {
    /// Resolve the configuration from the environment, with `cli_threads`
    /// (from `--threads`) taking precedence over both thread variables.
    pub fn from_env(cli_threads: Option<usize>) -> Self {
        Self {
            threads: resolve_threads(cli_threads),
            checkpoint_interval: interval_from_env(),
        }
    }
}

/// Parse a thread count; `None` for anything that is not a positive integer.
fn parse_threads(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

/// Worker count resolution order: CLI flag, `SOLVER_NUM_THREADS`,
/// `OMP_NUM_THREADS`, then 1.
pub fn resolve_threads(cli_threads: Option<usize>) -> usize {
    if let Some(n) = cli_threads.filter(|&n| n > 0) {
        return n;
    }
    for var in [THREADS_ENV, THREADS_ENV_FALLBACK] {
        if let Some(n) = env::var(var).ok().as_deref().and_then(parse_threads) {
            return n;
        }
    }
    1
}

/// Parse an `INTVL`-style interval; `None` unless finite and > 0.
fn parse_interval(raw: &str) -> Option<Duration> {
    let seconds: f64 = raw.trim().parse().ok()?;
    if seconds.is_finite() && seconds > 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

/// Read the checkpoint interval from `INTVL`. A present-but-malformed
/// value is logged and treated as disabled rather than aborting the run.
pub fn interval_from_env() -> Option<Duration> {
    let raw = env::var(INTERVAL_ENV).ok()?;
    match parse_interval(&raw) {
        Some(d) => Some(d),
        None => {
            if !raw.trim().is_empty() && raw.trim().parse::<f64>().is_err() {
                log::warn!("ignoring malformed {INTERVAL_ENV}={raw:?}; checkpointing disabled");
            }
            None
        }
    }
}
