//! Toast notifications with timed auto-dismissal.
//!
//! The queue is shared with its timer tasks and lives behind
//! `Arc<Mutex<_>>`. Timers are tokio tasks; a timer that fires after its
//! toast was removed or cleared does nothing.

use log::{debug, warn};
use shared::{Toast, ToastType};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

/// Ordered list of active toasts
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        lock_toasts(&self.toasts)
    }

    /// Append a toast and schedule its removal.
    ///
    /// `duration_ms` defaults to the type's default (5000 ms for errors,
    /// 3000 ms otherwise); `Some(0)` keeps the toast until it is removed.
    pub fn show(
        &self,
        message: impl Into<String>,
        toast_type: ToastType,
        duration_ms: Option<u64>,
    ) -> String {
        let duration = duration_ms.unwrap_or_else(|| toast_type.default_duration_ms());
        let toast = Toast {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            toast_type,
            duration,
        };
        let id = toast.id.clone();

        debug!("🔔 Showing {} toast {}: {}", toast.toast_type, toast.id, toast.message);
        self.lock().push(toast);

        if duration > 0 {
            self.schedule_removal(id.clone(), duration);
        }

        id
    }

    pub fn success(&self, message: impl Into<String>, duration_ms: Option<u64>) -> String {
        self.show(message, ToastType::Success, duration_ms)
    }

    pub fn error(&self, message: impl Into<String>, duration_ms: Option<u64>) -> String {
        self.show(message, ToastType::Error, duration_ms)
    }

    pub fn warning(&self, message: impl Into<String>, duration_ms: Option<u64>) -> String {
        self.show(message, ToastType::Warning, duration_ms)
    }

    pub fn info(&self, message: impl Into<String>, duration_ms: Option<u64>) -> String {
        self.show(message, ToastType::Info, duration_ms)
    }

    /// Remove a toast by id; returns false if it is not active
    pub fn remove(&self, id: &str) -> bool {
        remove_from(&self.toasts, id)
    }

    /// Drop every active toast; pending timers are left to fire harmlessly
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Snapshot of the active toasts, oldest first
    pub fn toasts(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn schedule_removal(&self, id: String, duration: u64) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("⚠️ No async runtime, toast {} will stay until removed", id);
                return;
            }
        };

        let toasts = Arc::clone(&self.toasts);
        handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(duration)).await;
            remove_from(&toasts, &id);
        });
    }
}

fn lock_toasts(toasts: &Mutex<Vec<Toast>>) -> MutexGuard<'_, Vec<Toast>> {
    match toasts.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn remove_from(toasts: &Mutex<Vec<Toast>>, id: &str) -> bool {
    let mut toasts = lock_toasts(toasts);
    match toasts.iter().position(|toast| toast.id == id) {
        Some(index) => {
            toasts.remove(index);
            true
        }
        None => false,
    }
}
