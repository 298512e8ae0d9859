//! Cross-thread event marshaling onto the display context
//!
//! All display state (registry, rows, trackers) is owned by one serial
//! context: the display thread. Producers — the capture thread and the
//! hotkey listener — never touch that state directly; they submit events
//! through an [`EventBridge`] and the display thread drains its
//! [`EventInbox`] once per loop iteration.
//!
//! The queue is bounded. Submission is fire-and-forget: events submitted
//! after the inbox is gone are dropped silently, which is the deliberate
//! choice during shutdown rather than surfacing an error nobody can act on.

use std::sync::Arc;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::trace;

/// Default depth of the bridged event queue.
pub const DEFAULT_CAPACITY: usize = 256;

/// Identity of the thread that owns the consuming end.
struct Owner {
    thread: OnceLock<ThreadId>,
}

/// Producer-side handle. Cheap to clone; one per producer thread.
pub struct EventBridge<T> {
    tx: mpsc::Sender<T>,
    owner: Arc<Owner>,
}

impl<T> Clone for EventBridge<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            owner: self.owner.clone(),
        }
    }
}

impl<T> EventBridge<T> {
    /// Submit an event for execution on the owning display context.
    ///
    /// Events are delivered in submission order (FIFO). If the inbox has
    /// been torn down, the event is silently discarded; a full queue drops
    /// the event the same way.
    ///
    /// # Panics
    ///
    /// Panics when called from the owning thread itself. Code already on
    /// the display context must mutate state directly instead of
    /// re-queueing through the bridge.
    pub fn submit(&self, event: T) {
        if let Some(owner) = self.owner.thread.get() {
            assert_ne!(
                *owner,
                thread::current().id(),
                "EventBridge::submit called from the owning display thread"
            );
        }
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!("event queue full, dropping event"),
            Err(TrySendError::Closed(_)) => trace!("display context gone, dropping event"),
        }
    }
}

/// Consumer-side handle, held by the display thread.
pub struct EventInbox<T> {
    rx: mpsc::Receiver<T>,
    owner: Arc<Owner>,
}

impl<T> EventInbox<T> {
    /// Claim the current thread as the owning serial context.
    ///
    /// Must be called from the display thread before it starts draining.
    /// Binding is one-shot; later calls are ignored.
    pub fn bind(&self) {
        let _ = self.owner.thread.set(thread::current().id());
    }

    /// Take the next pending event without blocking.
    pub fn try_next(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Create a bridge with the given queue capacity.
pub fn channel<T>(capacity: usize) -> (EventBridge<T>, EventInbox<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    let owner = Arc::new(Owner {
        thread: OnceLock::new(),
    });
    (
        EventBridge {
            tx,
            owner: owner.clone(),
        },
        EventInbox { rx, owner },
    )
}
