//! Weekday token parsing for schedule configuration.
//!
//! Day lists accept German and English names, full or abbreviated,
//! case-insensitive. Tokens are resolved through a static table built
//! once at startup and normalized to [`chrono::Weekday`]; unknown
//! tokens are a load-time configuration error, never an
//! evaluation-time one.

use chrono::Weekday;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static WEEKDAY_TOKENS: Lazy<HashMap<&'static str, Weekday>> = Lazy::new(|| {
    use Weekday::*;
    let mut map = HashMap::new();
    let entries: [(&[&str], Weekday); 7] = [
        (&["mo", "mon", "monday", "montag"], Mon),
        (&["di", "tue", "tuesday", "dienstag"], Tue),
        (&["mi", "wed", "wednesday", "mittwoch"], Wed),
        (&["do", "thu", "thursday", "donnerstag"], Thu),
        (&["fr", "fri", "friday", "freitag"], Fri),
        (&["sa", "sat", "saturday", "samstag"], Sat),
        (&["so", "sun", "sunday", "sonntag"], Sun),
    ];
    for (tokens, day) in entries {
        for token in tokens {
            map.insert(*token, day);
        }
    }
    map
});

/// Resolve a configured day token to its canonical weekday
pub fn parse_weekday(token: &str) -> Option<Weekday> {
    WEEKDAY_TOKENS
        .get(token.trim().to_lowercase().as_str())
        .copied()
}

/// Canonical short token for a weekday, as used in example
/// configuration and error messages
pub fn canonical(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}
