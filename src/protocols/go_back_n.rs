//! Protocol 5: Go-Back-N. Sender window width
//! `MAX_SEQ`, receiver window width 1: any out-of-order data frame is simply
//! dropped, and a timeout resends the whole outstanding burst starting at
//! `ack_expected`.

use crate::common::PIPELINED_MAX_SEQ;
use crate::frame::{between, inc, Event, Frame, FrameKind, Packet};
use crate::worker::{Halt, WorkerContext};

const MAX_SEQ: u32 = PIPELINED_MAX_SEQ;

fn slot(seq: u32) -> usize {
    seq as usize % (MAX_SEQ as usize + 1)
}

fn send_data(ctx: &mut WorkerContext, seq: u32, frame_expected: u32, buf: Packet) -> Result<(), Halt> {
    let mut s = Frame::init(FrameKind::Data);
    s.info = buf;
    s.seq = seq;
    s.ack = (frame_expected + MAX_SEQ) % (MAX_SEQ + 1);
    ctx.to_physical_layer(s).map_err(|e| ctx.fail(e))?;
    ctx.start_timer(seq);
    Ok(())
}

/// Runs protocol 5 for one endpoint. The ring holds `MAX_SEQ + 1` outbound
/// buffers, wide enough to cover every sequence number that can be in flight
/// at once.
pub fn run(ctx: &mut WorkerContext) -> Result<(), Halt> {
    let mut next_frame_to_send = 0u32;
    let mut ack_expected = 0u32;
    let mut frame_expected = 0u32;
    let mut nbuffered = 0u32;
    let mut buffer = [Packet::default(); MAX_SEQ as usize + 1];

    loop {
        match ctx.wait_for_event()? {
            Event::NetworkLayerReady => {
                let pkt = ctx.from_network_layer();
                buffer[slot(next_frame_to_send)] = pkt;
                nbuffered += 1;
                send_data(ctx, next_frame_to_send, frame_expected, pkt)?;
                next_frame_to_send = inc(next_frame_to_send, MAX_SEQ);
            }
            Event::FrameArrival => {
                let r = ctx.from_physical_layer();
                if r.seq == frame_expected {
                    ctx.to_network_layer(&r.info).map_err(|e| ctx.fail(e))?;
                    frame_expected = inc(frame_expected, MAX_SEQ);
                }
                while between(ack_expected, r.ack, next_frame_to_send) {
                    nbuffered -= 1;
                    ctx.stop_timer(ack_expected);
                    ack_expected = inc(ack_expected, MAX_SEQ);
                }
            }
            Event::ChecksumError => {}
            Event::Timeout => {
                let resend_from = ack_expected;
                next_frame_to_send = resend_from;
                for _ in 0..nbuffered {
                    let seq = next_frame_to_send;
                    let pkt = buffer[slot(seq)];
                    send_data(ctx, seq, frame_expected, pkt)?;
                    next_frame_to_send = inc(next_frame_to_send, MAX_SEQ);
                }
            }
            Event::AckTimeout => {}
        }
        if nbuffered < MAX_SEQ {
            ctx.enable_network_layer();
        } else {
            ctx.disable_network_layer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_wraps_within_the_outbound_ring() {
        assert_eq!(slot(0), 0);
        assert_eq!(slot(7), 7);
        assert_eq!(slot(8), 0);
    }
}
