//! Notification channel.
//!
//! A single slot holding at most one feedback message. Success and error
//! messages hide themselves after a fixed delay; pending messages stay until
//! replaced or dismissed. Hosts observe the slot through a
//! [`watch::Receiver`], which by construction never stacks messages.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Kind of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Pending,
    Success,
    Error,
}

impl NotificationKind {
    /// Terminal kinds arm the auto-dismiss timer.
    pub fn is_terminal(self) -> bool {
        matches!(self, NotificationKind::Success | NotificationKind::Error)
    }
}

/// One feedback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// What the channel is currently displaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Idle,
    Pending,
    Success,
    Error,
}

struct Timer {
    /// Bumped on every show/hide so a stale timer can tell it lost.
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

struct Shared {
    tx: watch::Sender<Option<Notification>>,
    timer: Mutex<Timer>,
    dismiss_after: Duration,
}

impl Shared {
    fn expire(&self, generation: u64) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.generation != generation {
            return;
        }
        timer.handle = None;
        self.tx.send_replace(None);
        tracing::trace!("Notification auto-dismissed");
    }
}

/// Cloneable handle to one notification slot.
#[derive(Clone)]
pub struct NotificationChannel {
    shared: Arc<Shared>,
}

impl NotificationChannel {
    pub fn new(dismiss_after: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                tx,
                timer: Mutex::new(Timer {
                    generation: 0,
                    handle: None,
                }),
                dismiss_after,
            }),
        }
    }

    /// Replace whatever is displayed with a new message.
    ///
    /// Must be called inside a tokio runtime for the auto-dismiss timer to
    /// be armed; outside one the message stays until replaced.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) {
        let message = message.into();
        let mut timer = self
            .shared
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        timer.cancel();
        timer.generation += 1;
        let generation = timer.generation;

        tracing::debug!("Notification ({:?}): {}", kind, message);
        self.shared.tx.send_replace(Some(Notification { message, kind }));

        if !kind.is_terminal() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let shared: Weak<Shared> = Arc::downgrade(&self.shared);
                let delay = self.shared.dismiss_after;
                timer.handle = Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(shared) = shared.upgrade() {
                        shared.expire(generation);
                    }
                }));
            }
            Err(_) => {
                tracing::warn!("No tokio runtime; notification will not auto-dismiss");
            }
        }
    }

    pub fn pending(&self, message: impl Into<String>) {
        self.show(message, NotificationKind::Pending);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, NotificationKind::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, NotificationKind::Error);
    }

    /// Clear the display immediately and cancel any armed timer.
    pub fn hide(&self) {
        let mut timer = self
            .shared
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        timer.cancel();
        timer.generation += 1;
        self.shared.tx.send_replace(None);
    }

    /// User-initiated close.
    pub fn dismiss(&self) {
        self.hide();
    }

    pub fn current(&self) -> Option<Notification> {
        self.shared.tx.borrow().clone()
    }

    pub fn state(&self) -> NotificationState {
        match self.shared.tx.borrow().as_ref().map(|n| n.kind) {
            None => NotificationState::Idle,
            Some(NotificationKind::Pending) => NotificationState::Pending,
            Some(NotificationKind::Success) => NotificationState::Success,
            Some(NotificationKind::Error) => NotificationState::Error,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.shared.tx.subscribe()
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}
