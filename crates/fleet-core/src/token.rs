use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"token=([^&\s]+)").expect("token pattern is valid"));

/// First `token=<value>` in `text`; the value runs up to `&`, whitespace or end of input.
pub fn extract_token(text: &str) -> Option<&str> {
    TOKEN_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
