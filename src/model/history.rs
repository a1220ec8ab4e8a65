use tracing::debug;

use crate::sys::storage::{Storage, StorageError};

pub const HISTORY_KEY: &str = "hud.chat.history";
pub const LANGUAGE_KEY: &str = "hud.language";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Previously submitted chat lines, newest first.
#[derive(Clone, Debug, PartialEq)]
pub struct InputHistory {
    entries: Vec<String>,
    limit: usize,
    cursor: Option<usize>,
}

impl InputHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
            cursor: None,
        }
    }

    /// Reads the stored history. Anything unreadable is treated as empty.
    pub fn load(storage: &dyn Storage, limit: usize) -> Self {
        let mut history = Self::new(limit);
        let Some(raw) = storage.get(HISTORY_KEY) else {
            return history;
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(limit);
                history.entries = entries;
            }
            Err(err) => debug!(%err, "ignoring corrupt input history"),
        }
        history
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.set(HISTORY_KEY, serde_json::to_string(&self.entries)?)
    }

    /// Records a submitted line. Blank lines and repeats of the newest entry
    /// are ignored. Browsing starts over either way.
    pub fn push(&mut self, line: &str) -> bool {
        self.cursor = None;
        let line = line.trim();
        if line.is_empty() || self.entries.first().is_some_and(|e| e == line) {
            return false;
        }
        self.entries.insert(0, line.to_string());
        self.entries.truncate(self.limit);
        true
    }

    /// Steps to the next older entry.
    pub fn older(&mut self) -> Option<&str> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.entries.len() {
            return self.cursor.map(|c| self.entries[c].as_str());
        }
        self.cursor = Some(next);
        Some(&self.entries[next])
    }

    /// Steps back toward the newest entry; `None` once past it.
    pub fn newer(&mut self) -> Option<&str> {
        match self.cursor {
            None | Some(0) => {
                self.cursor = None;
                None
            }
            Some(c) => {
                self.cursor = Some(c - 1);
                Some(&self.entries[c - 1])
            }
        }
    }

    pub fn entries(&self) -> &[String] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguagePreference {
    code: String,
}

impl Default for LanguagePreference {
    fn default() -> Self { Self { code: DEFAULT_LANGUAGE.to_string() } }
}

fn valid_code(code: &str) -> bool {
    (2..=8).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
}

impl LanguagePreference {
    pub fn load(storage: &dyn Storage) -> Self {
        let Some(raw) = storage.get(LANGUAGE_KEY) else {
            return Self::default();
        };
        match serde_json::from_str::<String>(&raw) {
            Ok(code) if valid_code(&code) => Self { code },
            Ok(code) => {
                debug!(code, "ignoring invalid stored language");
                Self::default()
            }
            Err(err) => {
                debug!(%err, "ignoring corrupt stored language");
                Self::default()
            }
        }
    }

    pub fn code(&self) -> &str { &self.code }

    /// Returns whether the code was accepted and differs from the current one.
    pub fn set(&mut self, code: &str) -> bool {
        let code = code.trim();
        if !valid_code(code) || code == self.code {
            return false;
        }
        self.code = code.to_string();
        true
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.set(LANGUAGE_KEY, serde_json::to_string(&self.code)?)
    }
}
