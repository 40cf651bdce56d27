//! IP restriction plugin configuration

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::PluginConfig;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IpRestrictionConfig {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allow: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deny: BTreeSet<String>,
}

impl IpRestrictionConfig {
    pub fn extend_allow<I: IntoIterator<Item = String>>(&mut self, addresses: I) {
        self.allow.extend(addresses);
    }

    pub fn extend_deny<I: IntoIterator<Item = String>>(&mut self, addresses: I) {
        self.deny.extend(addresses);
    }
}

impl PluginConfig for IpRestrictionConfig {
    const NAME: &'static str = "ip-restriction";

    fn validate(&self) -> Result<()> {
        if self.allow.is_empty() && self.deny.is_empty() {
            return Err(Error::validation("ip-restriction needs an allow or deny entry"));
        }
        if let Some(addr) = self.allow.intersection(&self.deny).next() {
            return Err(Error::validation(format!(
                "ip-restriction address '{}' is both allowed and denied",
                addr
            )));
        }
        Ok(())
    }
}
