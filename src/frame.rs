//! Packet and frame wire types, and circular sequence-number arithmetic.

use crate::common::MAX_PKT;

/// Fixed-width network-layer payload: an opaque `MAX_PKT`-byte array carrying
/// a monotone 32-bit counter for end-to-end sequencing verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packet {
    data: [u8; MAX_PKT],
}

impl Packet {
    /// Builds a packet whose payload is the big-endian encoding of `num`.
    pub fn from_counter(num: u32) -> Self {
        Packet {
            data: num.to_be_bytes(),
        }
    }

    /// Extracts the big-endian 32-bit counter carried in the payload.
    pub fn counter(&self) -> u32 {
        u32::from_be_bytes(self.data)
    }
}

/// Tagged union over the three frame kinds a data-link protocol exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Carries a network-layer payload.
    Data,
    /// Positive acknowledgement; `info` is meaningless.
    Ack,
    /// Negative acknowledgement (selective reject); `info` is meaningless.
    Nak,
}

/// A frame as transported across the virtual channel.
///
/// `seq` is only meaningful when `kind == Data`; `ack` piggybacks an
/// acknowledgement on every frame kind; `info` is the network-layer payload,
/// meaningful only when `kind == Data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// What kind of frame this is.
    pub kind: FrameKind,
    /// Sequence number (meaningful for `Data` frames).
    pub seq: u32,
    /// Piggybacked acknowledgement number.
    pub ack: u32,
    /// The network-layer packet (meaningful for `Data` frames).
    pub info: Packet,
}

impl Frame {
    /// Builds a frame with all fields zeroed, matching the reference
    /// implementation's `init_frame`: not strictly required for correctness,
    /// but it keeps traces free of stale fields from a previous frame.
    pub fn init(kind: FrameKind) -> Self {
        Frame {
            kind,
            seq: 0,
            ack: 0,
            info: Packet::default(),
        }
    }
}

/// Events a protocol's `wait_for_event` call can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// An undamaged frame has arrived.
    FrameArrival,
    /// A frame arrived with a simulated checksum error.
    ChecksumError,
    /// A data-frame timer expired.
    Timeout,
    /// The network layer has a new packet ready to send.
    NetworkLayerReady,
    /// The auxiliary ack timer expired.
    AckTimeout,
}

/// Returns true iff `b` lies in the half-open circular interval `[a, c)`
/// modulo the sequence space, i.e. `a <= b < c` when walking forward from
/// `a` and wrapping past the top of the sequence space at most once.
///
/// Implemented as the three-clause disjunction from the reference
/// implementation rather than collapsed to modular subtraction, since the
/// collapsed form is easy to get subtly wrong at the wrap boundary.
pub fn between(a: u32, b: u32, c: u32) -> bool {
    (a <= b && b < c) || (c < a && a <= b) || (b < c && c < a)
}

/// Increments `seq` circularly within `[0, max_seq]`.
pub fn inc(seq: u32, max_seq: u32) -> u32 {
    if seq < max_seq { seq + 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_roundtrips_counter() {
        let p = Packet::from_counter(0xDEAD_BEEF);
        assert_eq!(p.counter(), 0xDEAD_BEEF);
    }

    #[test]
    fn inc_wraps_at_max_seq() {
        assert_eq!(inc(0, 1), 1);
        assert_eq!(inc(1, 1), 0);
        assert_eq!(inc(6, 7), 7);
        assert_eq!(inc(7, 7), 0);
    }

    #[test]
    fn between_plain_interval() {
        assert!(between(2, 3, 5));
        assert!(!between(2, 5, 5));
        assert!(!between(2, 1, 5));
    }

    #[test]
    fn between_wraps_across_top_of_sequence_space() {
        // MAX_SEQ = 7, interval [6, 2) wraps: contains 6, 7, 0, 1 but not 2..5
        assert!(between(6, 7, 2));
        assert!(between(6, 0, 2));
        assert!(between(6, 1, 2));
        assert!(!between(6, 2, 2));
        assert!(!between(6, 4, 2));
    }

    #[test]
    fn between_empty_interval_when_a_equals_c() {
        // a == c describes the full circle only when distinguishable from
        // an empty interval by construction elsewhere; here we only check
        // the literal disjunction's behavior at that degenerate point.
        assert!(!between(3, 3, 3));
    }
}
