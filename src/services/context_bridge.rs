//! Context Bridge for Privacy Guard.
//!
//! One-way channel from an instrumented page context to the privileged
//! collector. Dispatch never blocks and never fails the caller: with no
//! listener the detection is dropped. Delivery is in dispatch order for a
//! single page and at most once; nothing survives the listener being dropped
//! on navigation.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{trace, warn};

use crate::types::detection::{DetectionEvent, RawDetection};
use crate::types::session::{Session, SiteIdentity};

/// Open a fresh bridge for one page load.
pub fn channel() -> (BridgeEmitter, BridgeListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (BridgeEmitter { tx }, BridgeListener { rx })
}

/// Page-side end. Cheap to clone into every hook.
#[derive(Clone)]
pub struct BridgeEmitter {
    tx: mpsc::UnboundedSender<RawDetection>,
}

impl BridgeEmitter {
    /// Fire-and-forget. Returns whether a listener was still attached.
    pub fn dispatch(&self, detection: RawDetection) -> bool {
        match self.tx.send(detection) {
            Ok(()) => true,
            Err(mpsc::error::SendError(lost)) => {
                trace!(category = %lost.category, detail = %lost.detail, "no bridge listener, detection dropped");
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Privileged-side end.
pub struct BridgeListener {
    rx: mpsc::UnboundedReceiver<RawDetection>,
}

impl BridgeListener {
    /// Wait for the next detection. `None` once every emitter is gone.
    pub async fn recv(&mut self) -> Option<RawDetection> {
        self.rx.recv().await
    }

    /// Take whatever is queued right now without waiting.
    pub fn try_drain(&mut self) -> Vec<RawDetection> {
        let mut drained = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(detection) => drained.push(detection),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    /// Stop accepting detections. Already queued ones can still be drained.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Attach site and session to a page detection.
///
/// Detections for a site without a live session are dropped, never given a
/// made-up session.
pub fn attribute(
    raw: RawDetection,
    site: &SiteIdentity,
    session: Option<&Session>,
) -> Option<DetectionEvent> {
    match session {
        Some(session) => Some(DetectionEvent::attach(raw, site.clone(), session.id.clone())),
        None => {
            warn!(site = %site, category = %raw.category, "no session for site, detection dropped");
            None
        }
    }
}
