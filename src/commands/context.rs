//! Shared context for handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Reduce to the services the dispatch core hands to handlers
//! - 1.0.0: Initial implementation with core shared state

use std::time::{Duration, Instant};

use crate::database::Database;

/// Services available to every command and event handler
#[derive(Clone)]
pub struct DispatchContext {
    pub database: Database,
    pub start_time: Instant,
}

impl DispatchContext {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            start_time: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
pub(crate) async fn test_context() -> std::sync::Arc<DispatchContext> {
    std::sync::Arc::new(DispatchContext::new(crate::database::test_database().await))
}
