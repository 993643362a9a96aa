//! REST API client module for the booking backend.
//!
//! This module provides the `ApiClient` for logging in, listing services
//! and professionals, and booking appointments.
//!
//! The backend uses JWT bearer token authentication obtained from the
//! `/auth/login` and `/auth/registro` endpoints.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestOptions, API_URL};
pub use error::{ApiError, FALLBACK_ERROR_MESSAGE};
