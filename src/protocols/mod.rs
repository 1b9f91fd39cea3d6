//! Protocol state machines: five textbook data-link protocols,
//! each driven by a [`crate::worker::WorkerContext`] through repeated
//! `wait_for_event` calls until the scheduler halts the endpoint.

mod go_back_n;
mod par;
mod selective_repeat;
mod sliding_one_bit;
mod stop_and_wait;

use crate::worker::{Halt, WorkerContext};
use clap::ValueEnum;

/// Which of the five reference protocols to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    /// Stop-and-wait, no sequence numbers.
    P2,
    /// Positive Acknowledgement with Retransmission (alternating bit).
    P3,
    /// Symmetric one-bit sliding window with piggybacked acks.
    P4,
    /// Go-Back-N sliding window, `MAX_SEQ = 7`.
    P5,
    /// Selective Repeat sliding window, `MAX_SEQ = 7`, `NR_BUFS = 4`.
    P6,
}

/// Which asymmetric role an endpoint plays. Only meaningful for [`Protocol::P2`]
/// and [`Protocol::P3`], whose sender and receiver run different code; P4
/// through P6 are fully symmetric and ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The endpoint that originates data frames in an asymmetric protocol.
    Sender,
    /// The endpoint that only delivers data frames upward in an asymmetric protocol.
    Receiver,
}

/// Runs the chosen protocol's routine for one endpoint until the scheduler
/// halts it or a fatal error propagates.
pub fn run(protocol: Protocol, role: Role, ctx: &mut WorkerContext) -> Result<(), Halt> {
    match protocol {
        Protocol::P2 => match role {
            Role::Sender => stop_and_wait::sender(ctx),
            Role::Receiver => stop_and_wait::receiver(ctx),
        },
        Protocol::P3 => match role {
            Role::Sender => par::sender(ctx),
            Role::Receiver => par::receiver(ctx),
        },
        Protocol::P4 => sliding_one_bit::run(ctx),
        Protocol::P5 => go_back_n::run(ctx),
        Protocol::P6 => selective_repeat::run(ctx),
    }
}
