use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::format::LoggerFormat;

/// Where formatted records are written.
///
/// Provisioning prints its URL summary on stdout, so records default to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogWriter {
    #[default]
    Stderr,
    Stdout,
}

impl LogWriter {
    fn is_terminal(self) -> bool {
        match self {
            LogWriter::Stderr => std::io::stderr().is_terminal(),
            LogWriter::Stdout => std::io::stdout().is_terminal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Level or full filter directive (`debug`, `fleet.core=trace,info`).
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
    pub writer: LogWriter,
}

impl LoggerConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LoggerFormat) -> Self {
        self.format = format;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let writer = LogWriter::default();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: writer.is_terminal(),
            writer,
        }
    }
}
