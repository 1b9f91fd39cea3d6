//! Run statistics, mirroring the counters the reference simulator prints at
//! the end of a run.

use std::fmt;

/// Per-endpoint traffic counters, aggregated across a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Data frames handed to the virtual channel.
    pub data_sent: u64,
    /// Data frames resent after a timeout.
    pub data_retransmitted: u64,
    /// Data frames the channel discarded (loss draw).
    pub data_lost: u64,
    /// Data frames the channel delivered (not lost).
    pub data_not_lost: u64,
    /// Data frames delivered undamaged.
    pub good_data_recd: u64,
    /// Data frames delivered with a simulated checksum error.
    pub cksum_data_recd: u64,
    /// Ack/nak frames handed to the virtual channel.
    pub acks_sent: u64,
    /// Ack/nak frames the channel discarded (loss draw).
    pub acks_lost: u64,
    /// Ack/nak frames the channel delivered (not lost).
    pub acks_not_lost: u64,
    /// Ack/nak frames delivered undamaged.
    pub good_acks_recd: u64,
    /// Ack/nak frames delivered with a simulated checksum error.
    pub cksum_acks_recd: u64,
    /// Payloads accepted by this endpoint's network-layer sink.
    pub payloads_accepted: u64,
    /// Data-frame timer expirations observed.
    pub timeouts: u64,
    /// Ack-timer expirations observed.
    pub ack_timeouts: u64,
}

impl Stats {
    /// An all-zero counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds another endpoint's counters into this one, for producing a
    /// whole-run total out of the two endpoints' individual stats.
    pub fn merge(&mut self, other: &Stats) {
        self.data_sent += other.data_sent;
        self.data_retransmitted += other.data_retransmitted;
        self.data_lost += other.data_lost;
        self.data_not_lost += other.data_not_lost;
        self.good_data_recd += other.good_data_recd;
        self.cksum_data_recd += other.cksum_data_recd;
        self.acks_sent += other.acks_sent;
        self.acks_lost += other.acks_lost;
        self.acks_not_lost += other.acks_not_lost;
        self.good_acks_recd += other.good_acks_recd;
        self.cksum_acks_recd += other.cksum_acks_recd;
        self.payloads_accepted += other.payloads_accepted;
        self.timeouts += other.timeouts;
        self.ack_timeouts += other.ack_timeouts;
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data sent:            {}", self.data_sent)?;
        writeln!(f, "data retransmitted:   {}", self.data_retransmitted)?;
        writeln!(f, "data lost:            {}", self.data_lost)?;
        writeln!(f, "data not lost:        {}", self.data_not_lost)?;
        writeln!(f, "good data received:   {}", self.good_data_recd)?;
        writeln!(f, "cksum data received:  {}", self.cksum_data_recd)?;
        writeln!(f, "acks sent:            {}", self.acks_sent)?;
        writeln!(f, "acks lost:            {}", self.acks_lost)?;
        writeln!(f, "acks not lost:        {}", self.acks_not_lost)?;
        writeln!(f, "good acks received:   {}", self.good_acks_recd)?;
        writeln!(f, "cksum acks received:  {}", self.cksum_acks_recd)?;
        writeln!(f, "payloads accepted:    {}", self.payloads_accepted)?;
        writeln!(f, "timeouts:             {}", self.timeouts)?;
        writeln!(f, "ack timeouts:         {}", self.ack_timeouts)
    }
}
