//! JWT issuer-verification plugin configuration

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::PluginConfig;
use crate::errors::{Error, Result};

/// Tokens are accepted only when their `iss` claim is one of `allowed_iss`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JwtConfig {
    pub allowed_iss: BTreeSet<String>,
}

impl JwtConfig {
    pub fn allowed_issuers<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { allowed_iss: issuers.into_iter().map(Into::into).collect() }
    }
}

impl PluginConfig for JwtConfig {
    const NAME: &'static str = "jwt-keycloak";

    fn validate(&self) -> Result<()> {
        if self.allowed_iss.is_empty() {
            return Err(Error::validation("jwt plugin needs at least one allowed issuer"));
        }
        Ok(())
    }
}
