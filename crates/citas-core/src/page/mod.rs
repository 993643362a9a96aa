//! The page the client runs in: where it navigates and where it shows
//! notifications.

pub mod notification;

use std::sync::Mutex;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::models::UserRecord;

pub use notification::{Notification, NotificationArea, NotificationKind, NOTIFICATION_LIFETIME};

/// Full-page navigation, triggered on logout
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

pub struct Page {
    location: Mutex<String>,
    notifications: NotificationArea,
}

impl Page {
    pub fn new(notifications: NotificationArea) -> Self {
        Self {
            location: Mutex::new("/".to_string()),
            notifications,
        }
    }

    /// Path of the last navigation
    pub fn location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn notifications(&self) -> &NotificationArea {
        &self.notifications
    }

    pub fn show_notification(&self, message: impl Into<String>, kind: NotificationKind) {
        self.notifications.show(message, kind);
    }

    /// Page-ready hook: log who is signed in, if anyone.
    pub fn ready(&self, client: &ApiClient) -> Option<UserRecord> {
        match client.current_user() {
            Ok(Some(user)) => {
                info!("Usuario autenticado: {}", user.name().unwrap_or_default());
                Some(user)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read stored user");
                None
            }
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(NotificationArea::new())
    }
}

impl Navigator for Page {
    fn navigate(&self, path: &str) {
        info!(path, "Navigating");
        *self
            .location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = path.to_string();
    }
}
