/// Internal ticks per simulated event. Must be greater than [`NR_TIMERS`] so
/// each timer can expire at a distinct sub-tick deadline within one event.
pub static DELTA: u64 = 10;

/// Number of independent per-frame timer slots in the timer bank.
pub static NR_TIMERS: usize = 8;

/// Maximum number of frames a direction's virtual channel FIFO may hold
/// before an enqueue is treated as fatal.
pub static MAX_QUEUE: usize = 1000;

/// `aux_timer`'s length is the main timeout divided by this factor.
pub static AUX_TIMER_DIVISOR: u64 = 2;

/// Number of consecutive `DELTA`-ticks of mutual inactivity that define a
/// deadlock, expressed as a multiple of the configured timeout interval.
pub static DEADLOCK_TIMEOUTS: u64 = 3;

/// Tick interval between periodic progress printouts (debug flag `0x8`).
pub static PERIODIC_INTERVAL: u64 = 100_000;

/// Packet payload width in bytes.
pub static MAX_PKT: usize = 4;

/// Maximum sequence number for protocols 5 and 6 (must be `2^n - 1`).
pub static PIPELINED_MAX_SEQ: u32 = 7;

/// Maximum sequence number for protocols 3 and 4 (fixed at 1 by their design).
pub static ONE_BIT_MAX_SEQ: u32 = 1;
