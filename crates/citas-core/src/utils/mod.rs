//! Formatting helpers for dates, prices and display strings.

pub mod format;

pub use format::{format_date, format_optional, format_phone, format_price, truncate_string};
