use serde::{Deserialize, Serialize};

/// Command run inside an existing environment.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommand {
    pub argv: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
}

impl ExecCommand {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            workdir: None,
        }
    }

    /// `bash -c <script>`.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new(["bash".to_string(), "-c".to_string(), script.into()])
    }

    pub fn with_workdir(mut self, dir: impl Into<String>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Program name, for logging.
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }
}

/// Captured result of a foreground exec.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecOutput {
    /// `None` when the engine could not report it.
    pub exit_code: Option<i64>,
    /// Stdout and stderr, interleaved as received.
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Output with surrounding whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.output.trim()
    }
}
