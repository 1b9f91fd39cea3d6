//! Data-link protocol simulator.
//!
//! Drives two symmetric worker endpoints ("M0" and "M1") exchanging frames
//! over a simulated point-to-point channel with configurable loss and
//! corruption, and validates five textbook link-layer protocols against a
//! deterministic, turn-based event model.

#![forbid(unsafe_code, unused_must_use)]
#![warn(clippy::all, missing_docs)]

/// Command-line argument parsing.
pub mod cli;

/// Simulation-wide constants.
pub mod common;

/// Typed error taxonomy.
pub mod error;

/// Packet and frame wire types, plus circular sequence-number arithmetic.
pub mod frame;

/// Network-layer stub: monotone packet source and in-order sink.
pub mod network_layer;

/// Virtual channel: per-direction FIFO with stochastic loss and corruption.
pub mod channel;

/// Per-endpoint timer bank.
pub mod timer;

/// Run statistics.
pub mod stats;

/// Worker runtime: endpoint context and `wait_for_event`.
pub mod worker;

/// Event scheduler: global tick, turn arbitration, deadlock detection.
pub mod scheduler;

/// Protocol state machines (P2 through P6).
pub mod protocols;

/// Top-level orchestration: wires scheduler, channel, and protocol together.
pub mod simulation;
