use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::watch, task::AbortHandle};

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

#[derive(Debug)]
struct Inner {
    tx: watch::Sender<Option<Toast>>,
    dismiss_after: Duration,
    timer: Mutex<Option<AbortHandle>>,
    next_id: AtomicU64,
}

/// Single notification channel with auto-dismiss. A new toast replaces the
/// visible one and restarts the dismiss timer.
#[derive(Debug, Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    pub fn new(dismiss_after: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                tx,
                dismiss_after,
                timer: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn show(&self, message: impl Into<String>) {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut timer = self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        self.inner.tx.send_replace(Some(Toast {
            id,
            message: message.into(),
        }));

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.dismiss_after).await;
            inner.tx.send_if_modified(|current| match current {
                Some(toast) if toast.id == id => {
                    *current = None;
                    true
                }
                _ => false,
            });
        });
        *timer = Some(handle.abort_handle());
    }

    pub fn dismiss(&self) {
        if let Some(timer) = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
        self.inner.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<Toast> {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Toast>> {
        self.inner.tx.subscribe()
    }
}
