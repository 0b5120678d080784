//! The network → simulation event queue.
//!
//! Link outcomes are produced on the messaging network's worker threads but
//! must take effect inside the single-threaded simulation loop. The queue
//! is the only channel between the two: producers enqueue completed
//! operations, and the simulation drains the queue once per tick, applying
//! transitions in arrival order. No other cross-domain mutation exists, so
//! neither domain ever blocks on the other.

use gatelink_protocol::LinkEvent;
use tokio::sync::mpsc;

/// Producer half, cloned into the link coordinator. Unbounded: link events
/// are rare and tiny, and a send must never block a gateway callback.
pub type LinkEventSender = mpsc::UnboundedSender<LinkEvent>;

/// Consumer half, owned by the simulation loop.
pub struct LinkEventQueue {
    receiver: mpsc::UnboundedReceiver<LinkEvent>,
}

impl LinkEventQueue {
    /// Removes and returns every queued event without waiting.
    ///
    /// Called once per simulation tick. Returns them in arrival order.
    pub fn drain(&mut self) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Creates a connected sender/queue pair.
pub fn link_event_channel() -> (LinkEventSender, LinkEventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, LinkEventQueue { receiver: rx })
}
