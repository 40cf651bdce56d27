//! Request transformer plugin configuration
//!
//! Mirrors the gateway engine's `request-transformer` plugin: header entries
//! are `name:value` strings grouped per action. The compiler also uses the
//! `append` section as the channel for the sidecar handoff header.

use serde::{Deserialize, Serialize};

use super::PluginConfig;
use crate::errors::{Error, Result};

/// Header names for the `remove` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HeaderNames {
    #[serde(default)]
    pub headers: Vec<String>,
}

impl HeaderNames {
    /// Add a name once.
    pub fn add(&mut self, name: &str) {
        if !self.contains(name) {
            self.headers.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// `name:value` entries for the add, replace and append actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HeaderValues {
    #[serde(default)]
    pub headers: Vec<String>,
}

fn entry_name(entry: &str) -> &str {
    entry.split_once(':').map(|(name, _)| name).unwrap_or(entry)
}

impl HeaderValues {
    /// Set `name` to `value`, replacing an earlier entry of the same name in place.
    pub fn set(&mut self, name: &str, value: &str) {
        let entry = format!("{}:{}", name, value);
        match self.headers.iter().position(|h| entry_name(h) == name) {
            Some(idx) => self.headers[idx] = entry,
            None => self.headers.push(entry),
        }
    }

    /// Drop the entry for `name`, if any.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.headers.len();
        self.headers.retain(|h| entry_name(h) != name);
        self.headers.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| entry_name(h) == name)
            .and_then(|h| h.split_once(':').map(|(_, value)| value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestTransformerConfig {
    #[serde(default)]
    pub remove: HeaderNames,
    #[serde(default)]
    pub replace: HeaderValues,
    #[serde(default)]
    pub add: HeaderValues,
    #[serde(default)]
    pub append: HeaderValues,
}

impl RequestTransformerConfig {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty()
            && self.replace.is_empty()
            && self.add.is_empty()
            && self.append.is_empty()
    }
}

impl PluginConfig for RequestTransformerConfig {
    const NAME: &'static str = "request-transformer";

    fn validate(&self) -> Result<()> {
        for section in [&self.replace, &self.add, &self.append] {
            for entry in &section.headers {
                match entry.split_once(':') {
                    Some((name, _)) if !name.trim().is_empty() => {}
                    _ => {
                        return Err(Error::validation(format!(
                            "request-transformer entry '{}' must be 'name:value'",
                            entry
                        )))
                    }
                }
            }
        }
        if self.remove.headers.iter().any(|h| h.trim().is_empty()) {
            return Err(Error::validation("request-transformer remove entries cannot be empty"));
        }
        Ok(())
    }
}
