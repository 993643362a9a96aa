use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace};

/// How long a notification stays attached before it removes itself
pub const NOTIFICATION_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    /// Style classes, e.g. `notificacion notificacion-error`
    pub fn class_name(&self) -> String {
        format!("notificacion notificacion-{}", self.kind)
    }
}

type Renderer = Box<dyn Fn(&Notification) + Send + Sync>;

struct AreaInner {
    visible: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
    renderer: Option<Renderer>,
}

impl AreaInner {
    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.visible.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|n| n.id != id);
        trace!(id, "Notification expired");
    }
}

/// The part of the page where transient notifications are attached.
///
/// Cloning yields another handle on the same area.
#[derive(Clone)]
pub struct NotificationArea {
    inner: Arc<AreaInner>,
}

impl NotificationArea {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Area that also hands each notification to `renderer` when shown
    pub fn with_renderer<F>(renderer: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        Self::build(Some(Box::new(renderer)))
    }

    fn build(renderer: Option<Renderer>) -> Self {
        Self {
            inner: Arc::new(AreaInner {
                visible: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                renderer,
            }),
        }
    }

    /// Attach a notification and schedule its removal.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) {
        let notification = Notification {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            kind,
        };
        debug!(id = notification.id, kind = %kind, "Showing notification");

        if let Some(ref render) = self.inner.renderer {
            render(&notification);
        }

        let id = notification.id;
        self.inner.lock().push(notification);

        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(NOTIFICATION_LIFETIME).await;
                    inner.remove(id);
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(NOTIFICATION_LIFETIME);
                    inner.remove(id);
                });
            }
        }
    }

    /// Notifications currently attached, oldest first
    pub fn visible(&self) -> Vec<Notification> {
        self.inner.lock().clone()
    }
}

impl Default for NotificationArea {
    fn default() -> Self {
        Self::new()
    }
}
