//! Table-driven parser for `[Section]` / `key = value` files.
//!
//! Callers describe the keys they understand with a slice of [`ConfigItem`]s;
//! every recognised assignment is handed to the item's callback together with
//! the target being filled. Unknown sections and keys are skipped.

use std::path::Path;

use super::ConfigError;

/// Maximum number of distinct sections accepted in one file.
pub const MAX_SECTIONS: usize = 64;

/// One `key = value` line, as seen by an item callback.
#[derive(Debug, Clone, Copy)]
pub struct Assignment<'a> {
    pub source: &'a str,
    pub line: usize,
    pub section: &'a str,
    pub key: &'a str,
    pub value: &'a str,
}

pub type ConfigCallback<T> = fn(&mut T, &Assignment<'_>) -> Result<(), ConfigError>;

/// Binds a `(section, key)` pair to the callback that applies it.
pub struct ConfigItem<T> {
    pub section: &'static str,
    pub key: &'static str,
    pub apply: ConfigCallback<T>,
}

impl<T> ConfigItem<T> {
    pub const fn new(section: &'static str, key: &'static str, apply: ConfigCallback<T>) -> Self {
        Self {
            section,
            key,
            apply,
        }
    }
}

/// Read `path` and apply it to `target`.
///
/// A file that cannot be opened is reported as [`ConfigError::Open`], which
/// callers can tell apart from an empty file (an empty file applies nothing).
pub fn parse_file<T>(
    path: &Path,
    table: &[ConfigItem<T>],
    target: &mut T,
) -> Result<(), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        tracing::error!(path = %path.display(), error = %source, "Failed to open config file");
        ConfigError::Open {
            path: path.to_path_buf(),
            source,
        }
    })?;

    parse_str(&path.display().to_string(), &content, table, target)
}

/// Parse already-loaded content. `source` only labels diagnostics.
pub fn parse_str<T>(
    source: &str,
    content: &str,
    table: &[ConfigItem<T>],
    target: &mut T,
) -> Result<(), ConfigError> {
    let mut sections: Vec<&str> = Vec::new();
    let mut section: Option<&str> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();

        if text.is_empty() || text.starts_with('#') || text.starts_with(';') {
            continue;
        }

        if text.starts_with('[') {
            if !text.ends_with(']') {
                tracing::error!(source, line, header = text, "Invalid section header");
                return Err(ConfigError::InvalidSection {
                    source_name: source.to_string(),
                    line,
                    header: text.to_string(),
                });
            }

            let name = &text[1..text.len() - 1];
            if !sections.contains(&name) {
                sections.push(name);
                if sections.len() > MAX_SECTIONS {
                    tracing::error!(source, max = MAX_SECTIONS, "Too many config sections");
                    return Err(ConfigError::TooManySections {
                        source_name: source.to_string(),
                        max: MAX_SECTIONS,
                    });
                }
            }
            section = Some(name);
            continue;
        }

        // Assignments before the first section header have no owner.
        let Some(current) = section else {
            continue;
        };

        let Some((key, value)) = text.split_once('=') else {
            tracing::error!(source, line, text, "No '=' in config assignment");
            return Err(ConfigError::MissingAssignment {
                source_name: source.to_string(),
                line,
                text: text.to_string(),
            });
        };

        let assignment = Assignment {
            source,
            line,
            section: current,
            key: key.trim(),
            value: value.trim(),
        };

        match table
            .iter()
            .find(|item| item.section == assignment.section && item.key == assignment.key)
        {
            Some(item) => (item.apply)(target, &assignment)?,
            None => tracing::debug!(
                section = assignment.section,
                key = assignment.key,
                "Ignoring unknown config key"
            ),
        }
    }

    Ok(())
}

/// Parse a yes/no style boolean. Case-insensitive; `None` if unrecognised.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "t" | "true" | "on" => Some(true),
        "0" | "n" | "no" | "f" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Apply a boolean assignment, keeping the previous value when it does not parse.
pub fn apply_bool(slot: &mut bool, assignment: &Assignment<'_>) -> Result<(), ConfigError> {
    match parse_boolean(assignment.value) {
        Some(value) => *slot = value,
        None => tracing::warn!(
            source = assignment.source,
            line = assignment.line,
            key = assignment.key,
            value = assignment.value,
            "Failed to parse boolean value, ignoring"
        ),
    }
    Ok(())
}
