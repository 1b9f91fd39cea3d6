use thiserror::Error;

/// Simulation-wide error taxonomy.
///
/// Configuration errors are raised before a run starts; the rest are raised
/// mid-run on a worker thread and forwarded to the scheduler so the whole
/// simulation can abort instead of hanging on a reply that will never come.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A CLI argument failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A transport-level invariant was violated (e.g. a channel FIFO overflowed).
    #[error("transport error: {0}")]
    Transport(String),

    /// The network layer received a payload out of order.
    #[error("protocol error: expected payload {expected} but got {got}")]
    Protocol {
        /// The payload number the sink expected next.
        expected: u32,
        /// The payload number it actually received.
        got: u32,
    },

    /// Both endpoints were quiescent for `3 * timeout_interval`.
    #[error("a deadlock has been detected at tick {tick}")]
    Deadlock {
        /// The tick at which the deadlock was declared.
        tick: u64,
    },
}
