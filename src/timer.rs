//! Per-endpoint timer bank: `NR_TIMERS` independent data-frame
//! timers plus one auxiliary ack timer, with a cached lowest-deadline slot so
//! `check_timers` is O(`NR_TIMERS`) instead of requiring a heap.

use crate::common::{AUX_TIMER_DIVISOR, NR_TIMERS};

/// Sentinel deadline meaning "this slot is not armed".
const INACTIVE: u64 = 0;

/// `NR_TIMERS` data-frame timers plus one auxiliary ack timer.
///
/// Invariant: at most one timer slot is active per outbound buffer slot,
/// since `start_timer` always targets `seq % NR_TIMERS` and a protocol is
/// only supposed to have one outstanding frame per slot at a time.
#[derive(Debug)]
pub struct TimerBank {
    ack_timer: [u64; NR_TIMERS],
    seqs: [u32; NR_TIMERS],
    lowest_timer: u64,
    aux_timer: u64,
    offset: u64,
    timeout_interval: u64,
}

impl TimerBank {
    /// Creates an empty timer bank for a given timeout interval (in ticks).
    pub fn new(timeout_interval: u64) -> Self {
        TimerBank {
            ack_timer: [INACTIVE; NR_TIMERS],
            seqs: [0; NR_TIMERS],
            lowest_timer: INACTIVE,
            aux_timer: INACTIVE,
            offset: 0,
            timeout_interval,
        }
    }

    /// Resets the per-tick offset counter. Called once at the start of every
    /// `wait_for_event` turn so distinct timers set within the same tick
    /// still get distinct deadlines (see `start_timer`).
    pub fn reset_offset(&mut self) {
        self.offset = 0;
    }

    /// Arms the timer for data frame `seq`, guaranteeing a deadline distinct
    /// from any other timer armed in the same tick via the `offset` counter.
    pub fn start_timer(&mut self, tick: u64, seq: u32) {
        let slot = seq as usize % NR_TIMERS;
        self.ack_timer[slot] = tick + self.timeout_interval + self.offset;
        self.offset += 1;
        self.seqs[slot] = seq;
        self.recalc();
    }

    /// Disarms the timer for data frame `seq`. Idempotent.
    pub fn stop_timer(&mut self, seq: u32) {
        self.ack_timer[seq as usize % NR_TIMERS] = INACTIVE;
        self.recalc();
    }

    /// Arms the auxiliary ack timer, firing at half the main timeout.
    pub fn start_ack_timer(&mut self, tick: u64) {
        self.aux_timer = tick + self.timeout_interval / AUX_TIMER_DIVISOR;
        self.offset += 1;
    }

    /// Disarms the auxiliary ack timer. Idempotent.
    pub fn stop_ack_timer(&mut self) {
        self.aux_timer = INACTIVE;
    }

    /// If a data-frame timer has expired by `tick`, disarms it and returns
    /// the sequence number that timed out. Exactly one slot can match a
    /// given `lowest_timer` value because `offset` guarantees distinct
    /// deadlines within a tick.
    pub fn check_timers(&mut self, tick: u64) -> Option<u32> {
        if self.lowest_timer == INACTIVE || tick < self.lowest_timer {
            return None;
        }
        for i in 0..NR_TIMERS {
            if self.ack_timer[i] == self.lowest_timer {
                self.ack_timer[i] = INACTIVE;
                let seq = self.seqs[i];
                self.recalc();
                return Some(seq);
            }
        }
        unreachable!("lowest_timer did not match any armed slot");
    }

    /// If the ack timer has expired by `tick`, disarms it and returns true.
    pub fn check_ack_timer(&mut self, tick: u64) -> bool {
        if self.aux_timer != INACTIVE && tick >= self.aux_timer {
            self.aux_timer = INACTIVE;
            true
        } else {
            false
        }
    }

    /// True iff no data-frame timer is currently armed. Used by
    /// `wait_for_event` to decide between an `Ok` and a `Nothing` reply when
    /// no event is possible this tick.
    pub fn is_empty(&self) -> bool {
        self.lowest_timer == INACTIVE
    }

    fn recalc(&mut self) {
        self.lowest_timer = self
            .ack_timer
            .iter()
            .copied()
            .filter(|&t| t > INACTIVE)
            .min()
            .unwrap_or(INACTIVE);
    }
}
