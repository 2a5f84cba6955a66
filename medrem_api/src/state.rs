//! Shared request-handling state.

use medrem_core::{JsonlIntakeLog, ReminderEngine, TomlScheduleSource};

/// State shared by all handlers and the auth middleware.
///
/// The engine itself is stateless apart from the volatile snooze map;
/// schedule and log are re-read per request.
pub struct AppState {
    pub engine: ReminderEngine<TomlScheduleSource, JsonlIntakeLog>,
    /// Bearer token required on protected routes; `None` runs the
    /// service open (development mode)
    pub auth_token: Option<String>,
}
