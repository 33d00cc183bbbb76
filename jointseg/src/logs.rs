//! Leveled progress reporting.
//!
//! Pipeline stages report progress as [`LogEntry`] values. Entries are
//! emitted as `tracing` events under the `jointseg::progress` target, so
//! the subscriber installed by the binary decides where they end up.

use serde::{Deserialize, Serialize};

/// Log level of a progress line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
}

/// A single progress line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth under the previous top-level line
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Message with indentation and level marker applied.
    pub fn rendered(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info | LogLevel::Warning => "",
            LogLevel::Success => "✓ ",
        };
        format!("{}{}{}", "  ".repeat(self.indent as usize), prefix, self.message)
    }

    /// Emit the entry as a `tracing` event.
    pub fn emit(&self) {
        let line = self.rendered();
        match self.level {
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(target: "jointseg::progress", "{line}")
            }
            LogLevel::Warning => tracing::warn!(target: "jointseg::progress", "{line}"),
        }
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LogEntry::info(msg).emit();
}

pub fn log_success(msg: impl Into<String>) {
    LogEntry::success(msg).emit();
}

pub fn log_warning(msg: impl Into<String>) {
    LogEntry::warning(msg).emit();
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::info(msg).with_indent(indent).emit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_indent_and_prefix() {
        assert_eq!(LogEntry::info("Loaded 5 rows").rendered(), "Loaded 5 rows");
        assert_eq!(LogEntry::success("Saved").with_indent(1).rendered(), "  ✓ Saved");
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&LogEntry::warning("w")).unwrap();
        assert!(json.contains("\"warning\""));
    }
}
