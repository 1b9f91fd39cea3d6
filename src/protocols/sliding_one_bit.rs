//! Protocol 4: a symmetric one-bit sliding window with piggybacked
//! acknowledgements (protocol P4). Both endpoints run the same
//! routine; every event — good, bad, or a timeout — provokes a resend of
//! the current frame so the peer's retransmission is the only recovery
//! mechanism needed.

use crate::common::ONE_BIT_MAX_SEQ;
use crate::frame::{inc, Event, Frame, FrameKind};
use crate::worker::{Halt, WorkerContext};

const MAX_SEQ: u32 = ONE_BIT_MAX_SEQ;

/// Runs protocol 4 for one endpoint. The network layer is disabled for the
/// routine's whole lifetime, same as P2/P3: the sender fetches its next
/// packet explicitly once an ack matches, rather than reacting to
/// `NetworkLayerReady`.
pub fn run(ctx: &mut WorkerContext) -> Result<(), Halt> {
    ctx.disable_network_layer();
    let mut next_frame_to_send = 0u32;
    let mut frame_expected = 0u32;
    let mut buffer = ctx.from_network_layer();

    let send = |ctx: &mut WorkerContext, buffer, seq, ack| -> Result<(), Halt> {
        let mut s = Frame::init(FrameKind::Data);
        s.info = buffer;
        s.seq = seq;
        s.ack = ack;
        ctx.to_physical_layer(s).map_err(|e| ctx.fail(e))?;
        ctx.start_timer(s.seq);
        Ok(())
    };

    send(ctx, buffer, next_frame_to_send, 1 - frame_expected)?;

    loop {
        if let Event::FrameArrival = ctx.wait_for_event()? {
            let r = ctx.from_physical_layer();
            if r.seq == frame_expected {
                ctx.to_network_layer(&r.info).map_err(|e| ctx.fail(e))?;
                frame_expected = inc(frame_expected, MAX_SEQ);
            }
            if r.ack == next_frame_to_send {
                ctx.stop_timer(r.ack);
                buffer = ctx.from_network_layer();
                next_frame_to_send = inc(next_frame_to_send, MAX_SEQ);
            }
        }
        send(ctx, buffer, next_frame_to_send, 1 - frame_expected)?;
    }
}
