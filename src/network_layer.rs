//! Network-layer stub: a deterministic monotone counter source and an
//! in-order sink that aborts the simulation on a gap.

use crate::error::SimError;
use crate::frame::Packet;

/// One endpoint's view of "the network layer above": a packet source that
/// counts up forever, and a sink that insists on strict in-order delivery.
#[derive(Debug, Default)]
pub struct NetworkLayer {
    next_net_pkt: u32,
    last_pkt_given: Option<u32>,
    payloads_accepted: u32,
}

impl NetworkLayer {
    /// Creates a fresh network-layer stub with both counters at their
    /// initial values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches a packet from the network layer for transmission, writing a
    /// monotone 32-bit counter into its payload and advancing that counter.
    pub fn from_network_layer(&mut self) -> Packet {
        let p = Packet::from_counter(self.next_net_pkt);
        self.next_net_pkt += 1;
        p
    }

    /// Delivers an inbound packet's payload to the network layer, verifying
    /// it strictly continues the previously delivered sequence.
    ///
    /// Returns `SimError::Protocol` (fatal) if a gap or duplicate is seen.
    pub fn to_network_layer(&mut self, p: &Packet) -> Result<(), SimError> {
        let num = p.counter();
        let expected = self.last_pkt_given.map_or(0, |n| n + 1);
        if num != expected {
            return Err(SimError::Protocol { expected, got: num });
        }
        self.last_pkt_given = Some(num);
        self.payloads_accepted += 1;
        Ok(())
    }

    /// Number of payloads this endpoint has accepted so far.
    pub fn payloads_accepted(&self) -> u32 {
        self.payloads_accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_order() {
        let mut nl = NetworkLayer::new();
        let p0 = nl.from_network_layer();
        let p1 = nl.from_network_layer();
        assert_eq!(p0.counter(), 0);
        assert_eq!(p1.counter(), 1);

        nl.to_network_layer(&p0).unwrap();
        nl.to_network_layer(&p1).unwrap();
        assert_eq!(nl.payloads_accepted(), 2);
    }

    #[test]
    fn rejects_out_of_order_delivery() {
        let mut nl = NetworkLayer::new();
        let p0 = nl.from_network_layer();
        let _p1 = nl.from_network_layer();
        let p2 = nl.from_network_layer();

        nl.to_network_layer(&p0).unwrap();
        let err = nl.to_network_layer(&p2).unwrap_err();
        assert_eq!(
            err,
            SimError::Protocol {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn rejects_duplicate_delivery() {
        let mut nl = NetworkLayer::new();
        let p0 = nl.from_network_layer();
        nl.to_network_layer(&p0).unwrap();
        assert!(nl.to_network_layer(&p0).is_err());
    }
}
