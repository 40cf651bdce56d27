//! `routeplane compile`: run the compiler on a YAML bundle.
//!
//! A bundle holds everything a reconciliation loop would hand the compiler:
//!
//! ```yaml
//! realm: { name: default, environment: prod }
//! gateway: { name: gateway-a, redis: { host: redis.internal } }
//! route: { name: orders-v1, namespace: zone-a, spec: { ... } }
//! consumers: [ ... ]   # ConsumeRoutes allowed on the route
//! consumer: { name: client-a }
//! secrets: { redis-password: s3cr3t }   # memory backend only
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Deserialize;

use crate::admin::{GatewayAdmin, HttpGatewayAdmin, InMemoryGatewayAdmin};
use crate::config::{AppConfig, SecretsBackend};
use crate::domain::{ConsumeRoute, Consumer, Gateway, Realm, Route};
use crate::features::{BuildContext, Builder};
use crate::observability::MetricsRecorder;
use crate::secrets::{
    CachedSecretsClient, EnvVarSecretsClient, InMemorySecretsClient, SecretResolver,
    SecretsClient,
};

use super::output::{print_output, OutputFormat};

#[derive(Subcommand)]
pub enum CompileCommands {
    /// Compile the route of a bundle
    Route {
        /// Path to the YAML bundle
        #[arg(short, long)]
        input: PathBuf,

        /// Record admin calls in memory instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Compile the consumer of a bundle
    Consumer {
        /// Path to the YAML bundle
        #[arg(short, long)]
        input: PathBuf,

        /// Record admin calls in memory instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Declarative inputs of one compilation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileInput {
    pub realm: Realm,
    #[serde(default)]
    pub gateway: Gateway,
    #[serde(default)]
    pub route: Option<Route>,
    #[serde(default)]
    pub consumer: Option<Consumer>,
    #[serde(default)]
    pub consumers: Vec<ConsumeRoute>,
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
}

impl CompileInput {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bundle {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid bundle {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let input: Self = serde_yaml::from_str(raw).context("Failed to parse bundle YAML")?;
        input.realm.validate()?;
        if let Some(route) = &input.route {
            route.validate()?;
        }
        if let Some(consumer) = &input.consumer {
            consumer.validate()?;
        }
        for subscription in &input.consumers {
            subscription.validate()?;
        }
        Ok(input)
    }
}

/// Secrets backend selected by configuration, cached when a TTL is set.
pub fn secret_resolver(config: &AppConfig, seed: &BTreeMap<String, String>) -> SecretResolver {
    let ttl = config.secrets.cache_ttl();
    let client: Arc<dyn SecretsClient> = match (config.secrets.backend, ttl) {
        (SecretsBackend::Env, Some(ttl)) => {
            Arc::new(CachedSecretsClient::new(EnvVarSecretsClient::new(), ttl))
        }
        (SecretsBackend::Env, None) => Arc::new(EnvVarSecretsClient::new()),
        (SecretsBackend::Memory, _) => {
            let memory = InMemorySecretsClient::new();
            for (key, value) in seed {
                memory.insert(key.clone(), value.clone());
            }
            Arc::new(memory)
        }
    };
    SecretResolver::new(client)
}

/// Admin client for a run: in-memory for dry runs, HTTP otherwise.
pub fn admin_client(config: &AppConfig, dry_run: bool) -> Result<Arc<dyn GatewayAdmin>> {
    if dry_run {
        return Ok(Arc::new(InMemoryGatewayAdmin::new()));
    }
    let client = HttpGatewayAdmin::new(config.admin.client_config())
        .context("Failed to create admin API client")?;
    Ok(Arc::new(client))
}

pub async fn handle_compile_command(
    command: CompileCommands,
    config: &AppConfig,
    metrics: MetricsRecorder,
    format: OutputFormat,
) -> Result<()> {
    let builder = Builder::new().with_metrics(metrics);

    match command {
        CompileCommands::Route { input, dry_run } => {
            let input = CompileInput::from_file(&input)?;
            let route = input.route.context("Bundle has no route")?;
            let name = route.name.clone();
            let mut ctx = BuildContext::for_route(
                route,
                input.realm,
                input.gateway,
                input.consumers,
                admin_client(config, dry_run)?,
                secret_resolver(config, &input.secrets),
            );
            let outcome = builder
                .build(&mut ctx)
                .await
                .with_context(|| format!("Failed to compile route '{}'", name))?;
            print_output(&outcome, format)?;
        }
        CompileCommands::Consumer { input, dry_run } => {
            let input = CompileInput::from_file(&input)?;
            let consumer = input.consumer.context("Bundle has no consumer")?;
            let name = consumer.name.clone();
            let mut ctx = BuildContext::for_consumer(
                consumer,
                input.realm,
                input.gateway,
                admin_client(config, dry_run)?,
                secret_resolver(config, &input.secrets),
            );
            let outcome = builder
                .build_for_consumer(&mut ctx)
                .await
                .with_context(|| format!("Failed to compile consumer '{}'", name))?;
            print_output(&outcome, format)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"
realm:
  name: default
  environment: prod
gateway:
  name: gateway-a
  redis:
    host: redis.internal
    password: $<redis-password>
route:
  name: orders-v1
  namespace: zone-a
  spec:
    realm: default
    upstreams:
      - scheme: https
        host: orders.internal
        port: 8443
        path: /api/v1
    downstreams:
      - host: api.zone-a.example.com
        path: /orders/v1
    traffic:
      rateLimit:
        limits:
          second: 100
consumers:
  - name: orders-v1--client-a
    route:
      name: orders-v1
      namespace: zone-a
    consumerName: client-a
secrets:
  redis-password: r3dis
"#;

    #[test]
    fn test_parse_bundle() {
        let input = CompileInput::from_yaml(BUNDLE).unwrap();
        let route = input.route.unwrap();
        assert_eq!(route.spec.upstreams[0].port, 8443);
        assert!(route.provider_limits().is_some());
        assert_eq!(input.consumers[0].consumer_name, "client-a");
        assert_eq!(input.gateway.redis.port, 6379);
    }

    #[test]
    fn test_bundle_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUNDLE.as_bytes()).unwrap();
        let input = CompileInput::from_file(file.path()).unwrap();
        assert_eq!(input.gateway.name, "gateway-a");

        let err = CompileInput::from_file(Path::new("/nonexistent/bundle.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read bundle"));
    }

    #[test]
    fn test_invalid_bundle_rejected() {
        let raw = "realm: {name: default, environment: prod}\nroute: {name: '', namespace: a}\n";
        assert!(CompileInput::from_yaml(raw).is_err());
    }

    #[tokio::test]
    async fn test_memory_secrets_seeded_from_bundle() {
        let mut config = AppConfig::default();
        config.secrets.backend = SecretsBackend::Memory;
        let input = CompileInput::from_yaml(BUNDLE).unwrap();

        let resolver = secret_resolver(&config, &input.secrets);
        assert_eq!(resolver.resolve("$<redis-password>").await.unwrap(), "r3dis");
    }

    #[tokio::test]
    async fn test_dry_run_compiles_bundle() {
        let mut config = AppConfig::default();
        config.secrets.backend = SecretsBackend::Memory;
        let input = CompileInput::from_yaml(BUNDLE).unwrap();

        let mut ctx = BuildContext::for_route(
            input.route.unwrap(),
            input.realm,
            input.gateway,
            input.consumers,
            admin_client(&config, true).unwrap(),
            secret_resolver(&config, &input.secrets),
        );
        let outcome = Builder::new().build(&mut ctx).await.unwrap();
        let rate_limit = outcome.plugins.iter().find(|p| p.key == "rate-limiting").unwrap();
        assert_eq!(rate_limit.config["redis_password"], "r3dis");
    }
}
