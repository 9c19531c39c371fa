//! EventBus — Fan-out of machine events to any number of subscribers
//!
//! Each subscriber owns an unbounded channel. Publishing never blocks the
//! sequencer; subscribers that dropped their receiver are pruned lazily.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::event::MachineEvent;

/// Multi-subscriber event fan-out
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<MachineEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber; it only sees events published after this call
    pub fn subscribe(&mut self) -> Receiver<MachineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber
    pub fn publish(&mut self, event: MachineEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of subscribers still connected at the last publish
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
