//! Security declarations for routes and subscriptions

use serde::{Deserialize, Serialize};

/// Provider-side security of a route (or of its failover block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m2m: Option<Machine2MachineAuthentication>,
}

/// Machine-to-machine authentication towards the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Machine2MachineAuthentication {
    #[serde(default, rename = "externalIDP", skip_serializing_if = "Option::is_none")]
    pub external_idp: Option<ExternalIdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicAuthCredentials>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

/// An identity provider outside this system that mints upstream tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentityProvider {
    pub token_endpoint: String,
    /// How the sidecar sends the token request (`body` or `header`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_request: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grant_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<OAuth2ClientCredentials>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2ClientCredentials {
    pub client_id: String,
    /// Literal secret or `$<key>` reference
    #[serde(default)]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuthCredentials {
    pub username: String,
    /// Literal password or `$<key>` reference
    pub password: String,
}

impl Security {
    /// Security with only M2M scopes
    pub fn scopes<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            m2m: Some(Machine2MachineAuthentication {
                scopes: scopes.into_iter().map(Into::into).collect(),
                ..Default::default()
            }),
        }
    }

    /// Security with only Basic credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            m2m: Some(Machine2MachineAuthentication {
                basic: Some(BasicAuthCredentials {
                    username: username.into(),
                    password: password.into(),
                }),
                ..Default::default()
            }),
        }
    }

    /// Security backed by an external identity provider
    pub fn external_idp(provider: ExternalIdentityProvider) -> Self {
        Self {
            m2m: Some(Machine2MachineAuthentication {
                external_idp: Some(provider),
                ..Default::default()
            }),
        }
    }

    pub fn basic_credentials(&self) -> Option<&BasicAuthCredentials> {
        self.m2m.as_ref().and_then(|m2m| m2m.basic.as_ref())
    }

    /// The external IDP, only when it declares a token endpoint
    pub fn external_idp_provider(&self) -> Option<&ExternalIdentityProvider> {
        self.m2m
            .as_ref()
            .and_then(|m2m| m2m.external_idp.as_ref())
            .filter(|idp| !idp.token_endpoint.is_empty())
    }

    pub fn m2m_scopes(&self) -> &[String] {
        self.m2m.as_ref().map(|m2m| m2m.scopes.as_slice()).unwrap_or_default()
    }
}

/// Subscriber-side security of a ConsumeRoute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSecurity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m2m: Option<SubscriberMachine2MachineAuthentication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberMachine2MachineAuthentication {
    /// Client registered at the route's external IDP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<OAuth2ClientCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicAuthCredentials>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl ConsumerSecurity {
    pub fn client_credentials(&self) -> Option<&OAuth2ClientCredentials> {
        self.m2m.as_ref().and_then(|m2m| m2m.client.as_ref())
    }

    pub fn basic_credentials(&self) -> Option<&BasicAuthCredentials> {
        self.m2m.as_ref().and_then(|m2m| m2m.basic.as_ref())
    }

    pub fn m2m_scopes(&self) -> &[String] {
        self.m2m.as_ref().map(|m2m| m2m.scopes.as_slice()).unwrap_or_default()
    }
}
