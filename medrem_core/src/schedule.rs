//! Schedule configuration: document shape, validation, and the
//! file-backed source.
//!
//! The configured schedule lives in a TOML document with a
//! `[[medications]]` array and a `[settings]` table. It is re-read and
//! re-validated on every engine operation through [`ScheduleSource`],
//! so operator edits take effect on the next request. A malformed
//! document is rejected whole at load time - silently dropping one
//! rule could hide a missed dose.

use crate::{weekday, Error, MedicationRule, Result, ScheduleSnapshot, Settings, MAX_NAME_LEN};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default tolerance band when `reminder_window` is omitted, in minutes
pub const DEFAULT_REMINDER_WINDOW: i64 = 30;

// ============================================================================
// Document shape
// ============================================================================

/// The schedule document as persisted: raw strings, round-trippable.
///
/// Validation into a [`ScheduleSnapshot`] is a separate step so the
/// configuration API can read and write the document as the operator
/// wrote it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,
    pub settings: SettingsEntry,
}

/// One `[[medications]]` entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<String>>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// The `[settings]` table
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettingsEntry {
    #[serde(default = "default_reminder_window")]
    pub reminder_window: i64,
    /// IANA zone name, e.g. "Europe/Berlin"
    pub timezone: String,
}

fn default_enabled() -> bool {
    true
}

fn default_reminder_window() -> i64 {
    DEFAULT_REMINDER_WINDOW
}

impl ScheduleDocument {
    /// Validate the document into an immutable snapshot.
    ///
    /// All problems are collected and reported together, each naming
    /// the offending medication and field.
    pub fn validate(&self) -> Result<ScheduleSnapshot> {
        let mut errors = Vec::new();

        let timezone: chrono_tz::Tz = match self.settings.timezone.parse() {
            Ok(tz) => tz,
            Err(_) => {
                errors.push(format!(
                    "settings.timezone: unknown IANA zone {:?}",
                    self.settings.timezone
                ));
                chrono_tz::UTC
            }
        };

        if self.settings.reminder_window < 0 {
            errors.push(format!(
                "settings.reminder_window: must be >= 0 minutes, got {}",
                self.settings.reminder_window
            ));
        }

        let mut medications = Vec::with_capacity(self.medications.len());
        let mut seen_names = HashSet::new();

        for entry in &self.medications {
            let label = if entry.name.is_empty() {
                "<unnamed>"
            } else {
                entry.name.as_str()
            };

            if entry.name.trim().is_empty() {
                errors.push("medication name: must not be empty".into());
            }
            if entry.name.len() > MAX_NAME_LEN {
                errors.push(format!(
                    "medication {label:?}: name longer than {MAX_NAME_LEN} characters"
                ));
            }
            if !seen_names.insert(entry.name.clone()) {
                errors.push(format!("medication {label:?}: duplicate name"));
            }

            let mut times = Vec::with_capacity(entry.times.len());
            for raw in &entry.times {
                match crate::parse_hhmm(raw) {
                    Some(time) if times.contains(&time) => {
                        errors.push(format!(
                            "medication {label:?}: duplicate time {raw:?}"
                        ));
                    }
                    Some(time) => times.push(time),
                    None => errors.push(format!(
                        "medication {label:?}: invalid time {raw:?} (use HH:MM)"
                    )),
                }
            }
            if entry.enabled && times.is_empty() {
                errors.push(format!(
                    "medication {label:?}: enabled but has no valid times"
                ));
            }

            let mut days = Vec::new();
            for token in entry.days.as_deref().unwrap_or_default() {
                match weekday::parse_weekday(token) {
                    Some(day) => {
                        if !days.contains(&day) {
                            days.push(day);
                        }
                    }
                    None => errors.push(format!(
                        "medication {label:?}: unknown weekday token {token:?}"
                    )),
                }
            }

            medications.push(MedicationRule {
                name: entry.name.clone(),
                display_text: entry.display_text.clone(),
                times,
                days,
                enabled: entry.enabled,
            });
        }

        if !errors.is_empty() {
            return Err(Error::Config(errors.join("; ")));
        }

        Ok(ScheduleSnapshot {
            medications,
            settings: Settings {
                reminder_window: self.settings.reminder_window,
                timezone,
            },
        })
    }

    /// A small working document, used to bootstrap a fresh install
    pub fn example() -> Self {
        ScheduleDocument {
            medications: vec![
                MedicationEntry {
                    name: "Vitamin D3".into(),
                    display_text: Some("Vitamin D3 1000 IE".into()),
                    times: vec!["12:00".into()],
                    days: None,
                    enabled: true,
                },
                MedicationEntry {
                    name: "Magnesium".into(),
                    display_text: None,
                    times: vec!["08:00".into(), "20:00".into()],
                    days: Some(vec!["Mon".into(), "Mi".into(), "Fri".into()]),
                    enabled: true,
                },
            ],
            settings: SettingsEntry {
                reminder_window: DEFAULT_REMINDER_WINDOW,
                timezone: "Europe/Berlin".into(),
            },
        }
    }
}

// ============================================================================
// Configuration source
// ============================================================================

/// Supplies the current schedule on demand.
///
/// Implementations must return a fresh snapshot per call - the engine
/// holds no schedule cache by design.
pub trait ScheduleSource: Send + Sync {
    fn load(&self) -> Result<ScheduleSnapshot>;
}

/// Schedule source backed by a TOML file on disk
pub struct TomlScheduleSource {
    path: PathBuf,
}

impl TomlScheduleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the raw document.
    ///
    /// A missing file is a configuration error, not a silent default:
    /// the operator must create the schedule explicitly (see
    /// [`ScheduleDocument::example`]).
    pub fn read_document(&self) -> Result<ScheduleDocument> {
        if !self.path.exists() {
            return Err(Error::Config(format!(
                "schedule file not found: {}",
                self.path.display()
            )));
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", self.path.display()))
        })?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", self.path.display())))
    }

    /// Replace the document on disk.
    ///
    /// The new document is validated first and written via a temp file
    /// plus rename, so concurrent readers never observe a torn write.
    pub fn write_document(&self, document: &ScheduleDocument) -> Result<()> {
        document.validate()?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Config("schedule path has no parent directory".into()))?;
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("cannot create {}: {e}", parent.display())))?;

        let contents = toml::to_string_pretty(document)
            .map_err(|e| Error::Config(format!("cannot serialize schedule: {e}")))?;

        let temp = NamedTempFile::new_in(parent)
            .map_err(|e| Error::Config(format!("cannot stage schedule write: {e}")))?;
        std::fs::write(temp.path(), contents)
            .map_err(|e| Error::Config(format!("cannot write schedule: {e}")))?;
        temp.persist(&self.path)
            .map_err(|e| Error::Config(format!("cannot replace schedule: {}", e.error)))?;

        tracing::info!("Saved schedule to {}", self.path.display());
        Ok(())
    }
}

impl ScheduleSource for TomlScheduleSource {
    fn load(&self) -> Result<ScheduleSnapshot> {
        self.read_document()?.validate()
    }
}
