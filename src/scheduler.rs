//! Event scheduler: owns the global tick counter, picks
//! which endpoint gets to run next, and detects deadlock when both
//! endpoints have gone quiet for too long.

use rand::rngs::StdRng;
use rand::Rng;
use std::sync::mpsc::{Receiver, SyncSender};
use tracing::{info, warn};

use crate::common::DELTA;
use crate::error::SimError;
use crate::worker::{Reply, TickCue};

/// Which of the two symmetric endpoints a tick is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointId {
    /// The first endpoint.
    M0,
    /// The second endpoint.
    M1,
}

/// One endpoint's scheduling handles, as seen from the scheduler thread.
pub struct EndpointHandle {
    pub tick_tx: SyncSender<TickCue>,
    pub reply_rx: Receiver<Reply>,
}

/// Drives the two endpoints' worker threads to completion or to a detected
/// deadlock.
pub struct Scheduler {
    timeout_interval: u64,
    deadline: u64,
    rng: StdRng,
}

impl Scheduler {
    /// Builds a scheduler for the given timeout interval (in ticks) and its
    /// own RNG stream, used only to pick which endpoint runs next.
    pub fn new(timeout_interval: u64, rng: StdRng) -> Self {
        Scheduler {
            timeout_interval,
            deadline: crate::common::DEADLOCK_TIMEOUTS * timeout_interval,
            rng,
        }
    }

    /// Runs the simulation for `events` ticks, or until a deadlock is
    /// detected or an endpoint reports a fatal error.
    ///
    /// `on_tick` is called once per tick with the current tick value, purely
    /// for progress reporting; it performs no scheduling work.
    pub fn run(
        &mut self,
        events: u64,
        m0: EndpointHandle,
        m1: EndpointHandle,
        mut on_tick: impl FnMut(u64),
    ) -> Result<(), SimError> {
        let handles = [m0, m1];
        let mut hanging = [0u64; 2];
        let mut tick = 0u64;

        let result = (|| {
            for _ in 0..events {
                tick += DELTA;
                on_tick(tick);

                let chosen = self.rng.random_range(0..2usize);
                handles[chosen]
                    .tick_tx
                    .send(TickCue::Tick(tick))
                    .map_err(|_| {
                        SimError::Transport(format!("endpoint {chosen} is gone"))
                    })?;
                let reply = handles[chosen].reply_rx.recv().map_err(|_| {
                    SimError::Transport(format!("endpoint {chosen} is gone"))
                })?;

                match reply {
                    Reply::Ok => hanging[chosen] = 0,
                    Reply::Nothing => hanging[chosen] += DELTA,
                    Reply::Fatal(err) => return Err(err),
                }

                if hanging[0] >= self.deadline && hanging[1] >= self.deadline {
                    warn!(tick, "deadlock detected");
                    return Err(SimError::Deadlock { tick });
                }
            }
            Ok(())
        })();

        for handle in &handles {
            let _ = handle.tick_tx.send(TickCue::Terminate);
        }

        match &result {
            Ok(()) => info!(ticks = tick, "simulation completed"),
            Err(err) => warn!(%err, ticks = tick, "simulation aborted"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Reply;
    use rand::SeedableRng;
    use std::sync::mpsc::sync_channel;
    use std::thread;

    #[test]
    fn detects_deadlock_when_both_endpoints_idle() {
        let mut sched = Scheduler::new(10, StdRng::seed_from_u64(1));

        let (tick_tx0, tick_rx0) = sync_channel(0);
        let (reply_tx0, reply_rx0) = sync_channel(0);
        let (tick_tx1, tick_rx1) = sync_channel(0);
        let (reply_tx1, reply_rx1) = sync_channel(0);

        let t0 = thread::spawn(move || loop {
            match tick_rx0.recv() {
                Ok(TickCue::Tick(_)) => {
                    if reply_tx0.send(Reply::Nothing).is_err() {
                        break;
                    }
                }
                _ => break,
            }
        });
        let t1 = thread::spawn(move || loop {
            match tick_rx1.recv() {
                Ok(TickCue::Tick(_)) => {
                    if reply_tx1.send(Reply::Nothing).is_err() {
                        break;
                    }
                }
                _ => break,
            }
        });

        let m0 = EndpointHandle {
            tick_tx: tick_tx0,
            reply_rx: reply_rx0,
        };
        let m1 = EndpointHandle {
            tick_tx: tick_tx1,
            reply_rx: reply_rx1,
        };

        let result = sched.run(100_000, m0, m1, |_| {});
        assert!(matches!(result, Err(SimError::Deadlock { .. })));
        t0.join().unwrap();
        t1.join().unwrap();
    }
}
