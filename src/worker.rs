//! Worker runtime: the per-endpoint context a protocol state machine drives
//! through `wait_for_event`, and the primitives (`from_network_layer`,
//! `to_physical_layer`, timers, ...) the reference protocols call (spec
//! §4.3, §4.4).

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, SyncSender};

use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::channel::{classify_arrival, ArrivalKind, LinkRx, LinkTx};
use crate::cli::{DEBUG_RECEIVES, DEBUG_SENDS, DEBUG_TIMEOUTS};
use crate::error::SimError;
use crate::frame::{Event, Frame, Packet};
use crate::network_layer::NetworkLayer;
use crate::stats::Stats;
use crate::timer::TimerBank;

/// A scheduling cue sent from the scheduler thread to a worker thread.
#[derive(Debug, Clone, Copy)]
pub enum TickCue {
    /// Advance to this internal tick and compute the next event, if any.
    Tick(u64),
    /// Shut down; no further frames will be scheduled.
    Terminate,
}

/// A worker thread's reply to a single `TickCue::Tick`.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Something happened, or a timer is still armed: the endpoint is not
    /// idle even though `wait_for_event` hasn't resolved to an `Event` yet.
    Ok,
    /// Nothing happened and no timer is armed: this endpoint is fully idle
    /// this tick, counted towards deadlock detection.
    Nothing,
    /// The endpoint hit a fatal error and is shutting down.
    Fatal(SimError),
}

/// Why `wait_for_event` stopped producing events.
#[derive(Debug, Clone)]
pub enum Halt {
    /// The scheduler asked this worker to shut down.
    Terminate,
    /// A fatal error occurred and was already reported via `Reply::Fatal`.
    Fatal(SimError),
}

/// Everything one endpoint's protocol routine needs: the channel halves, its
/// own network-layer stub, its own timer bank and RNG, and the tick-cue
/// handshake with the scheduler thread.
pub struct WorkerContext {
    label: &'static str,
    tick_rx: Receiver<TickCue>,
    reply_tx: SyncSender<Reply>,
    inbound: LinkRx,
    outbound: LinkTx,
    pct_loss: u8,
    pct_cksum: u8,
    debug_flags: u32,
    rng: StdRng,
    net: NetworkLayer,
    timers: TimerBank,
    stats: Stats,
    network_layer_enabled: bool,
    pending_arrivals: VecDeque<Frame>,
    latest_frame: Option<Frame>,
    latest_timeout_seq: Option<u32>,
    current_tick: u64,
    retransmitting: bool,
}

impl WorkerContext {
    /// Builds a fresh context for one endpoint.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        label: &'static str,
        tick_rx: Receiver<TickCue>,
        reply_tx: SyncSender<Reply>,
        inbound: LinkRx,
        outbound: LinkTx,
        pct_loss: u8,
        pct_cksum: u8,
        timeout_interval: u64,
        rng: StdRng,
        debug_flags: u32,
    ) -> Self {
        WorkerContext {
            label,
            tick_rx,
            reply_tx,
            inbound,
            outbound,
            pct_loss,
            pct_cksum,
            debug_flags,
            rng,
            net: NetworkLayer::new(),
            timers: TimerBank::new(timeout_interval),
            stats: Stats::new(),
            network_layer_enabled: true,
            pending_arrivals: VecDeque::new(),
            latest_frame: None,
            latest_timeout_seq: None,
            current_tick: 0,
            retransmitting: false,
        }
    }

    /// This endpoint's accumulated traffic counters.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Requests a fresh outbound payload from the network layer.
    pub fn from_network_layer(&mut self) -> Packet {
        self.net.from_network_layer()
    }

    /// Delivers an inbound payload to the network layer. Fatal on a gap or
    /// duplicate.
    pub fn to_network_layer(&mut self, p: &Packet) -> Result<(), SimError> {
        let result = self.net.to_network_layer(p);
        if result.is_ok() {
            self.stats.payloads_accepted += 1;
        }
        result
    }

    /// Allows `NetworkLayerReady` events to fire again.
    pub fn enable_network_layer(&mut self) {
        self.network_layer_enabled = true;
    }

    /// Suppresses `NetworkLayerReady` events (the outbound window is full).
    pub fn disable_network_layer(&mut self) {
        self.network_layer_enabled = false;
    }

    /// Returns the frame that caused the most recent `FrameArrival` event.
    ///
    /// # Panics
    /// Panics if called without a pending `FrameArrival`, mirroring the
    /// reference implementation's assumption that `from_physical_layer` is
    /// only ever called in response to that event.
    pub fn from_physical_layer(&mut self) -> Frame {
        self.latest_frame
            .take()
            .expect("from_physical_layer called without a pending frame arrival")
    }

    /// Transmits a frame, recording loss/sent statistics for its kind.
    pub fn to_physical_layer(&mut self, frame: Frame) -> Result<(), SimError> {
        use crate::frame::FrameKind;
        let lost = self.outbound.transmit(frame, self.pct_loss, &mut self.rng)?;
        if self.debug_flags & DEBUG_SENDS != 0 {
            debug!(
                endpoint = self.label,
                tick = self.current_tick,
                kind = ?frame.kind,
                seq = frame.seq,
                ack = frame.ack,
                lost,
                "send"
            );
        }
        match frame.kind {
            FrameKind::Data => {
                self.stats.data_sent += 1;
                if self.retransmitting {
                    self.stats.data_retransmitted += 1;
                }
                if lost {
                    self.stats.data_lost += 1;
                } else {
                    self.stats.data_not_lost += 1;
                }
            }
            FrameKind::Ack | FrameKind::Nak => {
                self.stats.acks_sent += 1;
                if lost {
                    self.stats.acks_lost += 1;
                } else {
                    self.stats.acks_not_lost += 1;
                }
            }
        }
        Ok(())
    }

    /// Arms the data-frame timer for `seq`.
    pub fn start_timer(&mut self, seq: u32) {
        self.timers.start_timer(self.current_tick, seq);
    }

    /// Disarms the data-frame timer for `seq`.
    pub fn stop_timer(&mut self, seq: u32) {
        self.timers.stop_timer(seq);
    }

    /// Arms the auxiliary ack timer.
    pub fn start_ack_timer(&mut self) {
        self.timers.start_ack_timer(self.current_tick);
    }

    /// Disarms the auxiliary ack timer.
    pub fn stop_ack_timer(&mut self) {
        self.timers.stop_ack_timer();
    }

    /// Returns the sequence number that caused the most recent `Timeout`.
    ///
    /// # Panics
    /// Panics if called without a pending `Timeout`.
    pub fn get_timedout_seqnr(&mut self) -> u32 {
        self.latest_timeout_seq
            .take()
            .expect("get_timedout_seqnr called without a pending timeout")
    }

    /// Drains every frame currently sitting in the inbound FIFO into the
    /// local pending-arrival queue, mirroring the reference implementation's
    /// `queue_frames`.
    fn queue_frames(&mut self) {
        while let Some(frame) = self.inbound.try_recv_frame() {
            self.pending_arrivals.push_back(frame);
        }
    }

    /// Priority-ordered event selection for the current tick: ack timeout,
    /// then a queued frame arrival (good or corrupted), then a ready network
    /// layer, then a data-frame timeout, then nothing.
    fn pick_event(&mut self) -> Option<Event> {
        if self.timers.check_ack_timer(self.current_tick) {
            self.stats.ack_timeouts += 1;
            return Some(Event::AckTimeout);
        }
        if let Some(frame) = self.pending_arrivals.pop_front() {
            use crate::frame::FrameKind;
            return match classify_arrival(self.pct_cksum, &mut self.rng) {
                ArrivalKind::Good => {
                    match frame.kind {
                        FrameKind::Data => self.stats.good_data_recd += 1,
                        FrameKind::Ack => self.stats.good_acks_recd += 1,
                        FrameKind::Nak => {}
                    }
                    if self.debug_flags & DEBUG_RECEIVES != 0 {
                        debug!(
                            endpoint = self.label,
                            tick = self.current_tick,
                            seq = frame.seq,
                            ack = frame.ack,
                            "recv good"
                        );
                    }
                    self.latest_frame = Some(frame);
                    Some(Event::FrameArrival)
                }
                ArrivalKind::Corrupt => {
                    match frame.kind {
                        FrameKind::Data => self.stats.cksum_data_recd += 1,
                        FrameKind::Ack => self.stats.cksum_acks_recd += 1,
                        FrameKind::Nak => {}
                    }
                    if self.debug_flags & DEBUG_RECEIVES != 0 {
                        debug!(endpoint = self.label, tick = self.current_tick, "recv cksum_err");
                    }
                    Some(Event::ChecksumError)
                }
            };
        }
        if self.network_layer_enabled {
            return Some(Event::NetworkLayerReady);
        }
        if let Some(seq) = self.timers.check_timers(self.current_tick) {
            self.stats.timeouts += 1;
            self.retransmitting = true;
            if self.debug_flags & DEBUG_TIMEOUTS != 0 {
                debug!(endpoint = self.label, tick = self.current_tick, seq, "timeout");
            }
            self.latest_timeout_seq = Some(seq);
            return Some(Event::Timeout);
        }
        None
    }

    /// Blocks until the scheduler has produced a resolvable event for this
    /// endpoint, replying `Ok`/`Nothing` for every tick that doesn't, or
    /// returns `Halt` if the scheduler asked this endpoint to stop or a
    /// fatal error already propagated.
    pub fn wait_for_event(&mut self) -> Result<Event, Halt> {
        self.timers.reset_offset();
        self.retransmitting = false;
        loop {
            match self.tick_rx.recv() {
                Ok(TickCue::Tick(tick)) => self.current_tick = tick,
                Ok(TickCue::Terminate) | Err(_) => return Err(Halt::Terminate),
            }
            self.queue_frames();
            match self.pick_event() {
                Some(event) => {
                    trace!(endpoint = self.label, tick = self.current_tick, ?event, "event");
                    let _ = self.reply_tx.send(Reply::Ok);
                    return Ok(event);
                }
                None => {
                    let reply = if self.timers.is_empty() {
                        Reply::Nothing
                    } else {
                        Reply::Ok
                    };
                    if self.reply_tx.send(reply).is_err() {
                        return Err(Halt::Terminate);
                    }
                }
            }
        }
    }

    /// Reports a fatal error to the scheduler and halts this endpoint.
    pub fn fail(&mut self, err: SimError) -> Halt {
        let _ = self.reply_tx.send(Reply::Fatal(err.clone()));
        Halt::Fatal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::link;
    use rand::SeedableRng;
    use std::sync::mpsc::sync_channel;
    use std::thread;

    fn make_context(
        label: &'static str,
    ) -> (
        WorkerContext,
        SyncSender<TickCue>,
        Receiver<Reply>,
        LinkTx,
    ) {
        let (tick_tx, tick_rx) = sync_channel(0);
        let (reply_tx, reply_rx) = sync_channel(0);
        let (to_peer_tx, to_peer_rx) = link();
        let (from_peer_tx, from_peer_rx) = link();
        let ctx = WorkerContext::new(
            label,
            tick_rx,
            reply_tx,
            from_peer_rx,
            to_peer_tx,
            0,
            0,
            100,
            StdRng::seed_from_u64(42),
            0,
        );
        // to_peer_rx is unused by the test harness directly; keep the
        // matching tx/rx pairing straight by returning from_peer_tx, which
        // the test drives to simulate inbound arrivals.
        let _ = to_peer_rx;
        (ctx, tick_tx, reply_rx, from_peer_tx)
    }

    #[test]
    fn nothing_event_replies_nothing_and_loops() {
        let (mut ctx, tick_tx, reply_rx, _peer_tx) = make_context("T");
        ctx.disable_network_layer();
        let handle = thread::spawn(move || ctx.wait_for_event());
        tick_tx.send(TickCue::Tick(10)).unwrap();
        assert!(matches!(reply_rx.recv().unwrap(), Reply::Nothing));
        tick_tx.send(TickCue::Terminate).unwrap();
        let result = handle.join().unwrap();
        assert!(matches!(result, Err(Halt::Terminate)));
    }

    #[test]
    fn network_layer_ready_resolves_immediately() {
        let (mut ctx, tick_tx, reply_rx, _peer_tx) = make_context("T");
        let handle = thread::spawn(move || ctx.wait_for_event());
        tick_tx.send(TickCue::Tick(10)).unwrap();
        assert!(matches!(reply_rx.recv().unwrap(), Reply::Ok));
        let event = handle.join().unwrap().unwrap();
        assert_eq!(event, Event::NetworkLayerReady);
    }

    #[test]
    fn frame_arrival_is_prioritized_over_network_layer_ready() {
        let (mut ctx, tick_tx, reply_rx, peer_tx) = make_context("T");
        let mut rng = StdRng::seed_from_u64(1);
        peer_tx
            .transmit(Frame::init(crate::frame::FrameKind::Data), 0, &mut rng)
            .unwrap();
        let handle = thread::spawn(move || ctx.wait_for_event());
        tick_tx.send(TickCue::Tick(10)).unwrap();
        assert!(matches!(reply_rx.recv().unwrap(), Reply::Ok));
        let event = handle.join().unwrap().unwrap();
        assert_eq!(event, Event::FrameArrival);
    }

    #[test]
    fn only_a_data_frame_sent_while_handling_a_timeout_counts_as_a_retransmit() {
        let (mut ctx, tick_tx, reply_rx, _peer_tx) = make_context("T");
        ctx.disable_network_layer();
        ctx.start_timer(0);

        let handle = thread::spawn(move || {
            let event = ctx.wait_for_event().unwrap();
            assert_eq!(event, Event::Timeout);
            let mut frame = Frame::init(crate::frame::FrameKind::Data);
            frame.seq = ctx.get_timedout_seqnr();
            ctx.to_physical_layer(frame).unwrap();
            ctx
        });
        tick_tx.send(TickCue::Tick(200)).unwrap();
        assert!(matches!(reply_rx.recv().unwrap(), Reply::Ok));
        let ctx = handle.join().unwrap();
        assert_eq!(ctx.stats().data_retransmitted, 1);
    }

    #[test]
    fn a_fresh_data_frame_sent_outside_a_timeout_is_not_counted_as_a_retransmit() {
        let (mut ctx, tick_tx, reply_rx, _peer_tx) = make_context("T");

        let handle = thread::spawn(move || {
            let event = ctx.wait_for_event().unwrap();
            assert_eq!(event, Event::NetworkLayerReady);
            let frame = Frame::init(crate::frame::FrameKind::Data);
            ctx.to_physical_layer(frame).unwrap();
            ctx
        });
        tick_tx.send(TickCue::Tick(10)).unwrap();
        assert!(matches!(reply_rx.recv().unwrap(), Reply::Ok));
        let ctx = handle.join().unwrap();
        assert_eq!(ctx.stats().data_sent, 1);
        assert_eq!(ctx.stats().data_retransmitted, 0);
    }
}
