//! Typed realtime change feed.
//!
//! The feed is a cancellable subscription yielding [`ChangeEvent`]s over a
//! channel. The list store consumes it as a plain iterator on a dedicated
//! thread; cancelling from any thread ends the iteration at the next poll
//! tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::types::bookmark::Bookmark;

/// How often a blocked consumer re-checks the cancel flag.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// A single row change delivered over the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Inserted(Bookmark),
    Deleted(String),
}

/// Cancellation handle shared between a [`Subscription`] and whoever owns
/// its lifecycle. Cloneable; cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A cancellable stream of [`ChangeEvent`]s for one owner's bookmarks.
///
/// Yields events until cancelled or until the backend closes the sending
/// side. Dropping the subscription closes the receiving end, which lets the
/// backend prune its sender on the next publish.
pub struct Subscription {
    rx: Receiver<ChangeEvent>,
    cancel: CancelToken,
}

impl Subscription {
    pub fn new(rx: Receiver<ChangeEvent>, cancel: CancelToken) -> Self {
        Self { rx, cancel }
    }

    /// A handle that cancels this subscription from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Non-blocking poll. `None` when no event is queued, the feed is
    /// cancelled, or the sender is gone.
    pub fn try_next(&self) -> Option<ChangeEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Iterator for Subscription {
    type Item = ChangeEvent;

    /// Blocks until the next event, re-checking the cancel flag between
    /// short waits so cancellation from another thread ends the stream.
    fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            match self.rx.recv_timeout(CANCEL_POLL) {
                Ok(event) => return Some(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}
