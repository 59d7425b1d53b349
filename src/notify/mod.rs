//! Notification queue (toasts)
//!
//! Toasts live until dismissed or until their TTL runs out. Each toast owns an
//! expiry task; dismissing the toast aborts it, and tearing the queue down
//! aborts all of them.

use crate::util::Sequence;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

/// How long a toast stays up unless dismissed
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(4500);

/// Identifier unique within one queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Ok,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Ok => "✓",
            ToastKind::Error => "✗",
            ToastKind::Warning => "!",
            ToastKind::Info => "i",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub title: String,
    pub message: Option<String>,
    pub kind: ToastKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct QueueState {
    toasts: Vec<Toast>,
    timers: HashMap<ToastId, AbortHandle>,
}

impl QueueState {
    fn remove(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }
}

struct Inner {
    state: Arc<Mutex<QueueState>>,
    ids: Sequence,
    ttl: Duration,
}

impl Inner {
    fn abort_timers(&self) {
        let mut state = lock(&self.state);
        for (_, handle) in state.timers.drain() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.abort_timers();
    }
}

fn lock(state: &Mutex<QueueState>) -> MutexGuard<'_, QueueState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle to the toast list; clones see the same toasts.
///
/// `push` spawns the expiry task, so it must run inside a Tokio runtime.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<Inner>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Arc::new(Mutex::new(QueueState::default())),
                ids: Sequence::new(),
                ttl,
            }),
        }
    }

    /// Append a toast and schedule its removal
    pub fn push(
        &self,
        title: impl Into<String>,
        message: Option<String>,
        kind: ToastKind,
    ) -> ToastId {
        let id = ToastId(self.inner.ids.next_value());
        let toast = Toast {
            id,
            title: title.into(),
            message,
            kind,
            created_at: Utc::now(),
        };
        tracing::debug!("Toast {} ({:?}): {}", id, kind, toast.title);

        // Hold the lock until the timer is registered so an expiry can never
        // run ahead of its own bookkeeping
        let mut state = lock(&self.inner.state);
        state.toasts.push(toast);

        let shared = Arc::clone(&self.inner.state);
        let ttl = self.inner.ttl;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = lock(&shared);
            state.timers.remove(&id);
            state.remove(id);
        });
        state.timers.insert(id, timer.abort_handle());

        id
    }

    pub fn ok(&self, title: impl Into<String>, message: Option<String>) -> ToastId {
        self.push(title, message, ToastKind::Ok)
    }

    pub fn error(&self, title: impl Into<String>, message: Option<String>) -> ToastId {
        self.push(title, message, ToastKind::Error)
    }

    pub fn warning(&self, title: impl Into<String>, message: Option<String>) -> ToastId {
        self.push(title, message, ToastKind::Warning)
    }

    pub fn info(&self, title: impl Into<String>, message: Option<String>) -> ToastId {
        self.push(title, message, ToastKind::Info)
    }

    /// Remove a toast now. Returns false if it was already gone.
    pub fn dismiss(&self, id: ToastId) -> bool {
        let mut state = lock(&self.inner.state);
        if let Some(timer) = state.timers.remove(&id) {
            timer.abort();
        }
        state.remove(id)
    }

    /// Current toasts, oldest first
    pub fn toasts(&self) -> Vec<Toast> {
        lock(&self.inner.state).toasts.clone()
    }

    /// Most recently pushed toast still on screen
    pub fn newest(&self) -> Option<ToastId> {
        lock(&self.inner.state).toasts.last().map(|t| t.id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        lock(&self.inner.state).toasts.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every pending expiry. Toasts already shown stay where they are.
    pub fn shutdown(&self) {
        self.inner.abort_timers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn titles(queue: &NotificationQueue) -> Vec<String> {
        queue.toasts().into_iter().map(|t| t.title).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_at_ttl_and_not_before() {
        let queue = NotificationQueue::default();
        queue.ok("Welcome!", Some("Signed in as asha@firm.in".into()));
        settle().await;

        tokio::time::advance(Duration::from_millis(4499)).await;
        settle().await;
        assert_eq!(queue.len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_removes_exactly_one_duplicate_title() {
        let queue = NotificationQueue::default();
        let a = queue.info("Saved", None);
        let b = queue.info("Saved", None);
        let c = queue.info("Saved", None);
        assert!(a < b && b < c);

        assert!(queue.dismiss(b));
        let ids: Vec<_> = queue.toasts().iter().map(|t| t.id).collect();
        assert_eq!(ids, [a, c]);

        // Second dismissal is a no-op
        assert!(!queue.dismiss(b));
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_preserves_order_of_remaining() {
        let queue = NotificationQueue::new(Duration::from_secs(2));
        queue.ok("first", None);
        settle().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        queue.warning("second", None);
        queue.error("third", None);
        settle().await;

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(titles(&queue), ["second", "third"]);
        assert_eq!(queue.newest(), queue.toasts().last().map(|t| t.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_timer() {
        let queue = NotificationQueue::default();
        let id = queue.error("Send failed", None);
        settle().await;
        assert!(queue.dismiss(id));

        let state = lock(&queue.inner.state);
        assert!(state.timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_expiry() {
        let queue = NotificationQueue::default();
        queue.ok("Signed Out", None);
        settle().await;
        queue.shutdown();

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(titles(&queue), ["Signed Out"]);
    }

    #[tokio::test]
    async fn test_ids_are_per_queue() {
        let first = NotificationQueue::default();
        let second = NotificationQueue::default();
        assert_eq!(first.ok("a", None), second.ok("b", None));
        assert_ne!(first.ok("c", None), first.ok("d", None));
    }

    #[tokio::test]
    async fn test_kind_defaults_to_ok() {
        let queue = NotificationQueue::default();
        queue.push("Welcome!", None, ToastKind::default());
        assert_eq!(queue.toasts()[0].kind, ToastKind::Ok);
    }
}
