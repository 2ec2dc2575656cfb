//! # Dispatch
//!
//! Routes inbound platform events to registered handlers with cooldown gating
//! and failure containment.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, Dispatcher};
