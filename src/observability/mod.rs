//! Observability for the record store
//!
//! Structured JSON logging of typed lifecycle events. Observability is
//! read-only: it never changes what an operation returns, and a failed log
//! write is dropped.
//!
//! # Usage
//!
//! ```
//! use fastannotation::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! log_event_with_fields(Event::ParseComplete, &[("records", "42")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
