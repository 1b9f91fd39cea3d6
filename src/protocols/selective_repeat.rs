//! Protocol 6: Selective-Repeat. `MAX_SEQ = 7`,
//! `NR_BUFS = (MAX_SEQ+1)/2 = 4`: both sender and receiver windows are four
//! wide, so a timeout retransmits only the one frame that actually timed
//! out, and the receiver buffers out-of-order arrivals within its window
//! instead of discarding them.

use crate::common::PIPELINED_MAX_SEQ;
use crate::frame::{between, inc, Event, Frame, FrameKind, Packet};
use crate::worker::{Halt, WorkerContext};

const MAX_SEQ: u32 = PIPELINED_MAX_SEQ;
const NR_BUFS: usize = (MAX_SEQ as usize + 1) / 2;

fn slot(seq: u32) -> usize {
    seq as usize % NR_BUFS
}

/// Builds and transmits a frame the way the reference `send_frame` helper
/// does: the piggybacked ack always names the last correctly received seq
/// (`frame_expected - 1`), and sending anything stops the ack timer, since a
/// piggyback supersedes the need for a standalone ack. Sending a nak also
/// clears `no_nak` so at most one nak is outstanding per gap.
fn send_frame(
    ctx: &mut WorkerContext,
    kind: FrameKind,
    seq: u32,
    frame_expected: u32,
    out_buf: Option<Packet>,
    no_nak: &mut bool,
) -> Result<(), Halt> {
    let mut s = Frame::init(kind);
    s.seq = seq;
    s.ack = (frame_expected + MAX_SEQ) % (MAX_SEQ + 1);
    if kind == FrameKind::Nak {
        *no_nak = false;
    }
    if let Some(buf) = out_buf {
        s.info = buf;
    }
    ctx.to_physical_layer(s).map_err(|e| ctx.fail(e))?;
    if kind == FrameKind::Data {
        ctx.start_timer(seq);
    }
    ctx.stop_ack_timer();
    Ok(())
}

/// Runs protocol 6 for one endpoint.
pub fn run(ctx: &mut WorkerContext) -> Result<(), Halt> {
    let mut next_frame_to_send = 0u32;
    let mut ack_expected = 0u32;
    let mut frame_expected = 0u32;
    let mut too_far = NR_BUFS as u32;
    let mut nbuffered = 0u32;
    let mut no_nak = true;

    let mut out_buf = [Packet::default(); NR_BUFS];
    let mut in_buf = [Packet::default(); NR_BUFS];
    let mut arrived = [false; NR_BUFS];

    loop {
        match ctx.wait_for_event()? {
            Event::NetworkLayerReady => {
                nbuffered += 1;
                let pkt = ctx.from_network_layer();
                out_buf[slot(next_frame_to_send)] = pkt;
                send_frame(
                    ctx,
                    FrameKind::Data,
                    next_frame_to_send,
                    frame_expected,
                    Some(pkt),
                    &mut no_nak,
                )?;
                next_frame_to_send = inc(next_frame_to_send, MAX_SEQ);
            }
            Event::FrameArrival => {
                let r = ctx.from_physical_layer();
                match r.kind {
                    FrameKind::Data => {
                        if r.seq != frame_expected && no_nak {
                            send_frame(
                                ctx,
                                FrameKind::Nak,
                                0,
                                frame_expected,
                                None,
                                &mut no_nak,
                            )?;
                        } else {
                            ctx.start_ack_timer();
                        }
                        if between(frame_expected, r.seq, too_far) && !arrived[slot(r.seq)] {
                            in_buf[slot(r.seq)] = r.info;
                            arrived[slot(r.seq)] = true;
                            while arrived[slot(frame_expected)] {
                                ctx.to_network_layer(&in_buf[slot(frame_expected)])
                                    .map_err(|e| ctx.fail(e))?;
                                no_nak = true;
                                arrived[slot(frame_expected)] = false;
                                frame_expected = inc(frame_expected, MAX_SEQ);
                                too_far = inc(too_far, MAX_SEQ);
                                ctx.start_ack_timer();
                            }
                        }
                    }
                    FrameKind::Nak => {
                        let retransmit = (r.ack + 1) % (MAX_SEQ + 1);
                        if between(ack_expected, retransmit, next_frame_to_send) {
                            send_frame(
                                ctx,
                                FrameKind::Data,
                                retransmit,
                                frame_expected,
                                Some(out_buf[slot(retransmit)]),
                                &mut no_nak,
                            )?;
                        }
                    }
                    FrameKind::Ack => {}
                }
                while between(ack_expected, r.ack, next_frame_to_send) {
                    nbuffered -= 1;
                    ctx.stop_timer(ack_expected);
                    ack_expected = inc(ack_expected, MAX_SEQ);
                }
            }
            Event::ChecksumError => {
                if no_nak {
                    send_frame(ctx, FrameKind::Nak, 0, frame_expected, None, &mut no_nak)?;
                }
            }
            Event::Timeout => {
                let seq = ctx.get_timedout_seqnr();
                send_frame(
                    ctx,
                    FrameKind::Data,
                    seq,
                    frame_expected,
                    Some(out_buf[slot(seq)]),
                    &mut no_nak,
                )?;
            }
            Event::AckTimeout => {
                send_frame(ctx, FrameKind::Ack, 0, frame_expected, None, &mut no_nak)?;
            }
        }
        if nbuffered < NR_BUFS as u32 {
            ctx.enable_network_layer();
        } else {
            ctx.disable_network_layer();
        }
    }
}
