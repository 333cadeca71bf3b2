use std::process::Stdio;

use tokio::process::Command;

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Lossy UTF-8 with trailing whitespace removed.
pub fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

/// Stdout followed by stderr, skipping whichever is empty.
pub fn combined(stdout: &[u8], stderr: &[u8]) -> String {
    let (out, err) = (text(stdout), text(stderr));
    match (out.is_empty(), err.is_empty()) {
        (_, true) => out,
        (true, false) => err,
        (false, false) => format!("{out}\n{err}"),
    }
}
