//! Top-level orchestration: wires the scheduler, the two virtual-channel
//! directions, and the chosen protocol's pair of endpoint routines together
//! into one runnable simulation.

use std::path::Path;
use std::sync::mpsc::sync_channel;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::channel::link;
use crate::cli::Cli;
use crate::error::SimError;
use crate::protocols::{self, Protocol, Role};
use crate::scheduler::{EndpointHandle, Scheduler};
use crate::stats::Stats;
use crate::worker::{Halt, WorkerContext};

/// Per-endpoint and merged statistics for one completed (or aborted) run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOutcome {
    /// M0's own traffic counters.
    pub m0: Stats,
    /// M1's own traffic counters.
    pub m1: Stats,
    /// The sum of both endpoints' counters.
    pub total: Stats,
}

/// Builds a `tracing` subscriber that writes to its own non-blocking file
/// under `log_dir`, mirroring the reference implementation's one-trace-file-
/// per-process layout. The returned guard must be kept alive for
/// as long as the subscriber may be in use, or buffered lines are dropped.
fn file_subscriber(
    log_dir: &Path,
    file_name: &str,
) -> std::io::Result<(impl Subscriber + Send + Sync, WorkerGuard)> {
    let file = std::fs::File::create(log_dir.join(file_name))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let subscriber = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("dlsim=trace")),
            ),
    );
    Ok((subscriber, guard))
}

/// Runs one endpoint's protocol routine to completion (`Halt::Terminate`) or
/// to a fatal error (already reported to the scheduler via `Reply::Fatal`,
/// so the caller only needs the final counters), returning its stats either
/// way.
fn run_endpoint(protocol: Protocol, role: Role, mut ctx: WorkerContext) -> Stats {
    match protocols::run(protocol, role, &mut ctx) {
        Err(Halt::Terminate) | Err(Halt::Fatal(_)) => {}
        Ok(()) => unreachable!("protocol routines loop until halted"),
    }
    *ctx.stats()
}

/// Runs the simulation described by `cli` to completion, deadlock, or a
/// fatal error. `on_tick` is called once per scheduler step purely for
/// progress reporting.
pub fn run(cli: &Cli, on_tick: impl FnMut(u64)) -> Result<RunOutcome, SimError> {
    cli.validate()?;

    let mut seed_rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let scheduler_seed: u64 = seed_rng.random();
    let m0_seed: u64 = seed_rng.random();
    let m1_seed: u64 = seed_rng.random();

    std::fs::create_dir_all(&cli.log_dir)
        .map_err(|e| SimError::Configuration(format!("cannot create log dir: {e}")))?;
    let (m0_sub, _m0_guard) = file_subscriber(&cli.log_dir, "m0.log")
        .map_err(|e| SimError::Configuration(format!("cannot open M0's log file: {e}")))?;
    let (m1_sub, _m1_guard) = file_subscriber(&cli.log_dir, "m1.log")
        .map_err(|e| SimError::Configuration(format!("cannot open M1's log file: {e}")))?;

    let (m0_to_m1_tx, m1_inbound) = link();
    let (m1_to_m0_tx, m0_inbound) = link();

    let (tick_tx0, tick_rx0) = sync_channel(0);
    let (reply_tx0, reply_rx0) = sync_channel(0);
    let (tick_tx1, tick_rx1) = sync_channel(0);
    let (reply_tx1, reply_rx1) = sync_channel(0);

    let ctx0 = WorkerContext::new(
        "M0",
        tick_rx0,
        reply_tx0,
        m0_inbound,
        m1_to_m0_tx,
        cli.pct_loss,
        cli.pct_cksum,
        cli.timeout,
        StdRng::seed_from_u64(m0_seed),
        cli.debug_flags,
    );
    let ctx1 = WorkerContext::new(
        "M1",
        tick_rx1,
        reply_tx1,
        m1_inbound,
        m0_to_m1_tx,
        cli.pct_loss,
        cli.pct_cksum,
        cli.timeout,
        StdRng::seed_from_u64(m1_seed),
        cli.debug_flags,
    );

    let protocol = cli.protocol;
    let m0_thread = thread::Builder::new()
        .name("dlsim-m0".into())
        .spawn(move || tracing::subscriber::with_default(m0_sub, || run_endpoint(protocol, Role::Sender, ctx0)))
        .expect("failed to spawn M0's worker thread");
    let m1_thread = thread::Builder::new()
        .name("dlsim-m1".into())
        .spawn(move || tracing::subscriber::with_default(m1_sub, || run_endpoint(protocol, Role::Receiver, ctx1)))
        .expect("failed to spawn M1's worker thread");

    let mut scheduler = Scheduler::new(cli.timeout, StdRng::seed_from_u64(scheduler_seed));
    let m0_handle = EndpointHandle {
        tick_tx: tick_tx0,
        reply_rx: reply_rx0,
    };
    let m1_handle = EndpointHandle {
        tick_tx: tick_tx1,
        reply_rx: reply_rx1,
    };
    let sim_result = scheduler.run(cli.events, m0_handle, m1_handle, on_tick);

    let m0_stats = m0_thread.join().expect("M0's worker thread panicked");
    let m1_stats = m1_thread.join().expect("M1's worker thread panicked");
    let mut total = Stats::new();
    total.merge(&m0_stats);
    total.merge(&m1_stats);
    let outcome = RunOutcome {
        m0: m0_stats,
        m1: m1_stats,
        total,
    };

    if let Err(ref err) = sim_result {
        tracing::warn!(
            %err,
            data_sent = outcome.total.data_sent,
            payloads_accepted = outcome.total.payloads_accepted,
            "final statistics at abort"
        );
    }
    sim_result?;
    Ok(outcome)
}
