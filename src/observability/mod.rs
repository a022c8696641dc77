//! Observability for filedb
//!
//! Structured one-line JSON logging of typed events. Logging is
//! synchronous and never fails the operation being logged.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
