//! Virtual channel: a bounded, per-direction FIFO between the two
//! endpoints, with independent stochastic loss at enqueue time and
//! corruption at dequeue time.

use rand::Rng;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

use crate::common::MAX_QUEUE;
use crate::error::SimError;
use crate::frame::Frame;

/// Ten-bit random draws, matching the reference implementation's
/// `rand() & 01777` (0o1777 == 1023) masking.
const DRAW_RANGE: u32 = 1024;

/// Classification of a frame that survived the loss draw and actually
/// reached the receiving endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalKind {
    /// Delivered undamaged.
    Good,
    /// Delivered but flagged as corrupted by the checksum-error draw.
    Corrupt,
}

/// The sending half of one direction of the virtual channel.
#[derive(Debug, Clone)]
pub struct LinkTx {
    tx: SyncSender<Frame>,
}

/// The receiving half of one direction of the virtual channel.
#[derive(Debug)]
pub struct LinkRx {
    rx: Receiver<Frame>,
}

/// Creates one direction's FIFO, bounded to [`MAX_QUEUE`] frames.
pub fn link() -> (LinkTx, LinkRx) {
    let (tx, rx) = sync_channel(MAX_QUEUE);
    (LinkTx { tx }, LinkRx { rx })
}

impl LinkTx {
    /// Draws for loss (threshold `10 * pct_loss` against a 10-bit random
    /// value) and, if the frame survives, enqueues it.
    ///
    /// Returns `Ok(true)` if the frame was lost, `Ok(false)` if it was
    /// enqueued. An enqueue onto a full queue is treated as fatal: it means
    /// a protocol is pushing frames faster than its peer drains them, which
    /// should never happen for a correctly windowed protocol.
    pub fn transmit(
        &self,
        frame: Frame,
        pct_loss: u8,
        rng: &mut impl Rng,
    ) -> Result<bool, SimError> {
        let draw = rng.random_range(0..DRAW_RANGE);
        let threshold = 10 * pct_loss as u32;
        if draw < threshold {
            return Ok(true);
        }
        match self.tx.try_send(frame) {
            Ok(()) => Ok(false),
            Err(TrySendError::Full(_)) => Err(SimError::Transport(
                "virtual channel queue overflowed".into(),
            )),
            Err(TrySendError::Disconnected(_)) => Err(SimError::Transport(
                "virtual channel's peer has disconnected".into(),
            )),
        }
    }
}

impl LinkRx {
    /// Non-blocking FIFO pop. Returns `None` if no frame is queued. Plays the
    /// role of the reference implementation's `nframes > 0` check and the
    /// subsequent dequeue combined, since `mpsc` has no separate peek.
    pub fn try_recv_frame(&self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

/// Draws for checksum corruption at delivery time (threshold `10 *
/// pct_cksum` against a 10-bit random value).
pub fn classify_arrival(pct_cksum: u8, rng: &mut impl Rng) -> ArrivalKind {
    let draw = rng.random_range(0..DRAW_RANGE);
    let threshold = 10 * pct_cksum as u32;
    if draw < threshold {
        ArrivalKind::Corrupt
    } else {
        ArrivalKind::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, FrameKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_loss_always_delivers() {
        let (tx, rx) = link();
        let mut rng = StdRng::seed_from_u64(1);
        let lost = tx
            .transmit(Frame::init(FrameKind::Data), 0, &mut rng)
            .unwrap();
        assert!(!lost);
        assert!(rx.try_recv_frame().is_some());
    }

    #[test]
    fn full_loss_never_delivers() {
        let (tx, rx) = link();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let lost = tx
                .transmit(Frame::init(FrameKind::Data), 99, &mut rng)
                .unwrap();
            assert!(lost);
        }
        assert!(rx.try_recv_frame().is_none());
    }

    #[test]
    fn zero_cksum_pct_never_corrupts() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(classify_arrival(0, &mut rng), ArrivalKind::Good);
        }
    }

    #[test]
    fn full_cksum_pct_always_corrupts() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(classify_arrival(99, &mut rng), ArrivalKind::Corrupt);
        }
    }

    #[test]
    fn queue_overflow_is_fatal() {
        let (tx, _rx) = link();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..MAX_QUEUE {
            tx.transmit(Frame::init(FrameKind::Data), 0, &mut rng)
                .unwrap();
        }
        let err = tx
            .transmit(Frame::init(FrameKind::Data), 0, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SimError::Transport(_)));
    }
}
