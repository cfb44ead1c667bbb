//! Command parser - Extracts a recognized command from raw message text

use crate::domain::entities::Command;

/// Parses raw chat text into a [`Command`].
///
/// The first whitespace-delimited token must equal the configured trigger
/// word exactly (case-sensitive); everything after it is the argument,
/// trimmed but otherwise untouched. Text that does not match yields `None`,
/// never an error.
pub struct CommandParser {
    trigger: String,
}

impl CommandParser {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
        }
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Parse a raw message. Pure and deterministic, no I/O.
    pub fn parse(&self, raw: &str) -> Option<Command> {
        let mut tokens = raw.split_whitespace();
        let first = tokens.next()?;
        if first != self.trigger {
            return None;
        }

        // Argument is the remainder of the original text, not the re-joined
        // tokens, so inner spacing in a slug-like argument survives trimming.
        let rest = raw.trim_start();
        let argument = rest[first.len()..].trim();
        Some(Command::new(first, argument))
    }
}
