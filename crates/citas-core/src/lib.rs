//! Client library for the barbershop booking backend.
//!
//! `ApiClient` talks to the REST API and owns the session; `Page` stands in
//! for the browser page (navigation and notifications); `utils` holds the
//! es-CO date and price formatting.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod page;
pub mod utils;

pub use api::{ApiClient, ApiError, RequestOptions};
pub use config::{Config, StorageBackend};
pub use page::{Navigator, Notification, NotificationArea, NotificationKind, Page};
