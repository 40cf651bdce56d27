//! ACL plugin configuration

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::PluginConfig;
use crate::errors::{Error, Result};

/// Consumer groups allowed on a route. Every consumer is its own group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AclConfig {
    pub allow: BTreeSet<String>,
    pub hide_groups_header: bool,
}

impl AclConfig {
    pub fn allow<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { allow: groups.into_iter().map(Into::into).collect(), hide_groups_header: true }
    }
}

impl PluginConfig for AclConfig {
    const NAME: &'static str = "acl";

    fn validate(&self) -> Result<()> {
        if self.allow.is_empty() {
            return Err(Error::validation("acl plugin needs at least one allowed group"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_is_sorted_and_deduplicated() {
        let config = AclConfig::allow(["b", "a", "b"]);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["allow"], serde_json::json!(["a", "b"]));
        assert_eq!(json["hide_groups_header"], true);
    }
}
