//! Data models for the booking backend.
//!
//! Payloads are loosely typed: each record wraps the JSON object the
//! server sent and exposes accessors for the handful of fields the client
//! reads.
//!
//! - `UserRecord`, `Registration`: authentication payloads
//! - `Service`, `Professional`, `Appointment`: listing records
//! - `NewAppointment`: booking request body

pub mod booking;
pub mod user;

pub use booking::{Appointment, NewAppointment, Professional, Service};
pub use user::{Registration, UserRecord};
