//! Core types: tokens, calendars, events, formatting, tracing

pub mod calendar;
pub mod format;
pub mod time;
pub mod token;
pub mod tracing;

pub use calendar::{CalendarSummary, EventSummary, FIELD_PREVIEW_CHARS};
pub use format::{ellipsis, render_table};
pub use time::{EventTime, EventWindow, MAX_EVENT_RESULTS, TimeError, parse_user_datetime};
pub use token::{AuthState, RefreshOutcome, TokenPair, ValidationOutcome};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
