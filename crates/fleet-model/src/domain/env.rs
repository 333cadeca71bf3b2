use serde::{Deserialize, Serialize};

/// Single environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    key: String,
    value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// `KEY=value`, as both engines expect it.
    pub fn as_assignment(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

/// Environment variables passed to an environment.
///
/// Serialized as a transparent array. Later entries override earlier ones in [`EnvVars::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvVars(pub Vec<KeyValue>);

impl EnvVars {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Value for `key`, last entry wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(KeyValue::new(key, value));
    }

    /// `KEY=value` list.
    pub fn assignments(&self) -> Vec<String> {
        self.0.iter().map(KeyValue::as_assignment).collect()
    }
}
