//! Commands from outside the simulation
//!
//! Input handlers, the physics layer and the one-second clock all push into a shared
//! [`CommandQueue`]; the simulation drains it at the start of each tick, so every mutation
//! happens on the tick boundary. Each command carries the session epoch it was sent in;
//! commands from a finished session are dropped after a retry.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::collision::CollisionEvent;

/// Normalized player intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentEvent {
    ForwardPressed,
    ForwardReleased,
    BackwardPressed,
    BackwardReleased,
    /// Edge-triggered
    LaneLeft,
    /// Edge-triggered
    LaneRight,
    /// Edge-triggered
    Boost,
}

impl IntentEvent {
    /// Held-key changes mirror the physical keyboard and apply in any phase or epoch
    pub fn is_held_change(&self) -> bool {
        matches!(
            self,
            IntentEvent::ForwardPressed
                | IntentEvent::ForwardReleased
                | IntentEvent::BackwardPressed
                | IntentEvent::BackwardReleased
        )
    }
}

/// Anything that can change session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Intent(IntentEvent),
    Collision(CollisionEvent),
    /// One wall-clock second elapsed
    SecondElapsed,
    /// Start a new session after game over
    Retry,
}

/// A command tagged with the epoch it was sent in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped {
    pub epoch: u32,
    pub command: Command,
}

#[derive(Debug, Default)]
struct Shared {
    pending: Mutex<Vec<Stamped>>,
    epoch: AtomicU32,
}

/// Cloneable, thread-safe handle for pushing commands
#[derive(Debug, Clone)]
pub struct CommandSender {
    shared: Arc<Shared>,
}

impl CommandSender {
    pub fn send(&self, command: Command) {
        let epoch = self.shared.epoch.load(Ordering::Acquire);
        self.shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Stamped { epoch, command });
    }

    /// Epoch new commands are stamped with
    pub fn epoch(&self) -> u32 {
        self.shared.epoch.load(Ordering::Acquire)
    }
}

/// The receiving end, owned by the simulation
#[derive(Debug, Default)]
pub struct CommandQueue {
    shared: Arc<Shared>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn epoch(&self) -> u32 {
        self.shared.epoch.load(Ordering::Acquire)
    }

    /// Start a new epoch; commands already queued keep their old stamp
    pub fn advance_epoch(&self) -> u32 {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Take everything pending, in send order
    pub fn drain(&self) -> Vec<Stamped> {
        std::mem::take(
            &mut *self
                .shared
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drain_preserves_order() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        sender.send(Command::Intent(IntentEvent::LaneLeft));
        sender.send(Command::SecondElapsed);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].command, Command::Intent(IntentEvent::LaneLeft));
        assert_eq!(drained[1].command, Command::SecondElapsed);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_epoch_stamping() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        sender.send(Command::SecondElapsed);
        assert_eq!(queue.advance_epoch(), 1);
        sender.send(Command::SecondElapsed);

        let drained = queue.drain();
        assert_eq!(drained[0].epoch, 0);
        assert_eq!(drained[1].epoch, 1);
        assert_eq!(sender.epoch(), 1);
    }

    #[test]
    fn test_senders_from_other_threads() {
        let queue = CommandQueue::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sender = queue.sender();
                thread::spawn(move || {
                    for _ in 0..25 {
                        sender.send(Command::SecondElapsed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.drain().len(), 100);
    }

    #[test]
    fn test_held_changes() {
        assert!(IntentEvent::ForwardPressed.is_held_change());
        assert!(IntentEvent::BackwardReleased.is_held_change());
        assert!(!IntentEvent::LaneLeft.is_held_change());
        assert!(!IntentEvent::Boost.is_held_change());
    }
}
