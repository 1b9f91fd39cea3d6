//! Command-line argument parsing: the five positional simulation
//! parameters plus a protocol selector, since this crate hosts all five
//! protocol variants the reference implementation ships as separate binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::error::SimError;
use crate::protocols::Protocol;

/// Bit in `debug_flags` requesting a trace line on every frame transmit.
pub const DEBUG_SENDS: u32 = 0x1;
/// Bit in `debug_flags` requesting a trace line on every frame arrival.
pub const DEBUG_RECEIVES: u32 = 0x2;
/// Bit in `debug_flags` requesting a trace line on every timer expiry.
pub const DEBUG_TIMEOUTS: u32 = 0x4;
/// Bit in `debug_flags` requesting a periodic progress printout.
pub const DEBUG_PERIODIC: u32 = 0x8;

/// A pedagogical data-link protocol simulator: drives two symmetric worker
/// endpoints exchanging frames over a virtual channel with configurable loss
/// and corruption, running one of five textbook link-layer protocols.
#[derive(Debug, Parser)]
#[command(name = "dlsim", version, about)]
pub struct Cli {
    /// Which protocol variant to run.
    #[arg(long, value_enum)]
    pub protocol: Protocol,

    /// Simulation length, in endpoint ticks.
    pub events: u64,

    /// Timeout interval, in ticks.
    pub timeout: u64,

    /// Percent of transmissions dropped by the virtual channel (0-99).
    pub pct_loss: u8,

    /// Percent of surviving frames marked corrupt (0-99).
    pub pct_cksum: u8,

    /// Debug bitmask: 0x1 sends, 0x2 receives, 0x4 timeouts, 0x8 periodic.
    pub debug_flags: u32,

    /// Seeds the scheduler's and both endpoints' RNG streams for a
    /// reproducible run. Defaults to a value drawn from the OS RNG.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory the per-process trace files are written into.
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,
}

impl Cli {
    /// Validates the numeric ranges `clap`'s type-level parsing can't
    /// express: `events`/`timeout` must be positive, and the two percentages
    /// must fall in `0..=99`.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.events == 0 {
            return Err(SimError::Configuration(
                "events must be a positive integer".into(),
            ));
        }
        if self.timeout == 0 {
            return Err(SimError::Configuration(
                "timeout must be a positive integer".into(),
            ));
        }
        if self.pct_loss > 99 {
            return Err(SimError::Configuration(
                "pct_loss must be between 0 and 99".into(),
            ));
        }
        if self.pct_cksum > 99 {
            return Err(SimError::Configuration(
                "pct_cksum must be between 0 and 99".into(),
            ));
        }
        Ok(())
    }
}
