//! Protocol 2: stop-and-wait, no sequence numbers at all. The sender holds
//! exactly one frame in flight; the receiver replies with a dummy frame
//! purely to pace the sender (protocol P2).

use crate::frame::{Event, Frame, FrameKind};
use crate::worker::{Halt, WorkerContext};

/// Sends one network-layer packet at a time, waiting for the receiver's
/// pacing frame before fetching the next one.
pub fn sender(ctx: &mut WorkerContext) -> Result<(), Halt> {
    loop {
        ctx.disable_network_layer();
        let buffer = ctx.from_network_layer();
        let mut frame = Frame::init(FrameKind::Data);
        frame.info = buffer;
        ctx.to_physical_layer(frame).map_err(|e| ctx.fail(e))?;

        loop {
            match ctx.wait_for_event()? {
                Event::FrameArrival => {
                    let _ = ctx.from_physical_layer();
                    ctx.enable_network_layer();
                    break;
                }
                // No sequence numbers or checksums to react to in this
                // protocol; any other event is simply waited out.
                _ => continue,
            }
        }
    }
}

/// Accepts whatever arrives, hands it to the network layer, and sends back a
/// dummy frame so the sender knows it may send the next packet.
pub fn receiver(ctx: &mut WorkerContext) -> Result<(), Halt> {
    ctx.disable_network_layer();
    loop {
        match ctx.wait_for_event()? {
            Event::FrameArrival => {
                let frame = ctx.from_physical_layer();
                ctx.to_network_layer(&frame.info).map_err(|e| ctx.fail(e))?;
                let dummy = Frame::init(FrameKind::Ack);
                ctx.to_physical_layer(dummy).map_err(|e| ctx.fail(e))?;
            }
            _ => continue,
        }
    }
}
