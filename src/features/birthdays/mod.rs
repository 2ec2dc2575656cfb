//! # Birthdays Feature
//!
//! Personal birthday records and per-guild announcement channels.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true

pub mod dates;

pub use dates::{format_birthday_info, parse_birthday_date, resolve_timezone, search_timezones};
