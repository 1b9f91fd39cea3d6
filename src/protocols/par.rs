//! Protocol 3: Positive Acknowledgement with Retransmission, the classic
//! alternating-bit protocol (protocol P3). `MAX_SEQ = 1`: exactly
//! one frame may be outstanding at a time.

use crate::common::ONE_BIT_MAX_SEQ;
use crate::frame::{inc, Event, Frame, FrameKind};
use crate::worker::{Halt, WorkerContext};

const MAX_SEQ: u32 = ONE_BIT_MAX_SEQ;

/// Sends one frame at a time, retransmitting only on `ChecksumError` or
/// `Timeout`; advances to the next packet only once the matching ack
/// arrives. The outbound window is always full (one frame), so the network
/// layer is disabled for the routine's whole lifetime and packets are
/// fetched directly instead.
pub fn sender(ctx: &mut WorkerContext) -> Result<(), Halt> {
    ctx.disable_network_layer();
    let mut next_frame_to_send = 0u32;
    let mut buffer = ctx.from_network_layer();

    let send = |ctx: &mut WorkerContext, buffer, seq| -> Result<(), Halt> {
        let mut frame = Frame::init(FrameKind::Data);
        frame.info = buffer;
        frame.seq = seq;
        ctx.to_physical_layer(frame).map_err(|e| ctx.fail(e))?;
        ctx.start_timer(seq);
        Ok(())
    };

    send(ctx, buffer, next_frame_to_send)?;

    loop {
        match ctx.wait_for_event()? {
            Event::FrameArrival => {
                let r = ctx.from_physical_layer();
                if r.ack == next_frame_to_send {
                    ctx.stop_timer(r.ack);
                    buffer = ctx.from_network_layer();
                    next_frame_to_send = inc(next_frame_to_send, MAX_SEQ);
                    send(ctx, buffer, next_frame_to_send)?;
                }
            }
            Event::ChecksumError | Event::Timeout => {
                send(ctx, buffer, next_frame_to_send)?;
            }
            Event::NetworkLayerReady | Event::AckTimeout => {}
        }
    }
}

/// Accepts the expected frame and delivers it, discarding anything out of
/// sequence; always acks the complement of what it's still waiting for.
pub fn receiver(ctx: &mut WorkerContext) -> Result<(), Halt> {
    let mut frame_expected = 0u32;
    ctx.disable_network_layer();

    loop {
        match ctx.wait_for_event()? {
            Event::FrameArrival => {
                let r = ctx.from_physical_layer();
                if r.seq == frame_expected {
                    ctx.to_network_layer(&r.info).map_err(|e| ctx.fail(e))?;
                    frame_expected = inc(frame_expected, MAX_SEQ);
                }
                let mut s = Frame::init(FrameKind::Ack);
                s.ack = 1 - frame_expected;
                ctx.to_physical_layer(s).map_err(|e| ctx.fail(e))?;
            }
            Event::ChecksumError | Event::Timeout | Event::NetworkLayerReady | Event::AckTimeout => {}
        }
    }
}
