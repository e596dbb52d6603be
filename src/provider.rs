//! The AppStream provider: configuration and dispatch to the adapters.
//!
//! [`AppStreamProvider`] implements [`ProviderService`]. `configure` decodes
//! [`ProviderConfig`], asks the [`ClientFactory`] for the remote client and
//! wires the shared [`Clients`]; every lifecycle call after that is looked up
//! in the adapter registry by type name.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{debug, info, instrument, warn};

use crate::api::AppStreamApi;
use crate::context::RequestContext;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ProviderError;
use crate::resources::{Clients, Registry};
use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::tags::DefaultTags;
use crate::types::{ImportResponse, PlanResult, ResourceResponse};
use crate::validation;
use crate::value::decode;

/// Region variables consulted when the configuration has none, in order.
const REGION_VARIABLES: &[&str] = &["AWS_REGION", "AWS_DEFAULT_REGION"];

/// Backoff overrides, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// First sleep between attempts.
    pub initial_backoff_ms: Option<u64>,
    /// Cap for the doubling backoff.
    pub max_backoff_ms: Option<u64>,
}

/// Provider configuration block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Region of the remote API.
    pub region: Option<String>,
    /// Tags applied to every taggable resource.
    pub default_tags: DefaultTags,
    /// Backoff overrides.
    pub retry: RetryConfig,
}

impl ProviderConfig {
    /// Fill in the region from `lookup` (normally the environment) when the
    /// configuration leaves it out.
    pub fn resolve_region(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.region = self.region.take().filter(|r| !r.is_empty()).or_else(|| {
            REGION_VARIABLES
                .iter()
                .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
        });
        self
    }

    fn apply_backoff(&self, clients: Clients) -> Clients {
        let RetryConfig {
            initial_backoff_ms,
            max_backoff_ms,
        } = self.retry;
        if initial_backoff_ms.is_none() && max_backoff_ms.is_none() {
            return clients;
        }
        let initial = initial_backoff_ms.map_or(clients.backoff.initial_backoff, Duration::from_millis);
        let max = max_backoff_ms.map_or(clients.backoff.max_backoff, Duration::from_millis);
        clients.with_backoff(initial, max)
    }

    /// Schema of the configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "region",
                Attribute::optional_string()
                    .with_description("Region of the AppStream API; defaults to AWS_REGION or AWS_DEFAULT_REGION"),
            )
            .with_block(
                "default_tags",
                NestedBlock::single(Block::new().with_attribute(
                    "tags",
                    Attribute::string_map(AttributeFlags::optional()),
                ))
                .with_max_items(1),
            )
            .with_block(
                "retry",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("initial_backoff_ms", Attribute::optional_int32())
                        .with_attribute("max_backoff_ms", Attribute::optional_int32()),
                )
                .with_max_items(1),
            )
    }
}

/// Builds the remote client once the configuration is known.
pub trait ClientFactory: Send + Sync + 'static {
    /// Client for `config`.
    fn build(&self, config: &ProviderConfig) -> Result<Arc<dyn AppStreamApi>, ProviderError>;
}

impl<F> ClientFactory for F
where
    F: Fn(&ProviderConfig) -> Result<Arc<dyn AppStreamApi>, ProviderError> + Send + Sync + 'static,
{
    fn build(&self, config: &ProviderConfig) -> Result<Arc<dyn AppStreamApi>, ProviderError> {
        self(config)
    }
}

/// The AppStream provider.
pub struct AppStreamProvider {
    factory: Box<dyn ClientFactory>,
    registry: Registry,
    clients: RwLock<Option<Arc<Clients>>>,
}

impl AppStreamProvider {
    /// A provider that builds its client with `factory` on `configure`.
    pub fn new(factory: impl ClientFactory) -> Self {
        Self {
            factory: Box::new(factory),
            registry: Registry::appstream(),
            clients: RwLock::new(None),
        }
    }

    /// A provider bound to an existing client, e.g. a test double.
    pub fn with_api(api: Arc<dyn AppStreamApi>) -> Self {
        Self::new(move |_: &ProviderConfig| -> Result<Arc<dyn AppStreamApi>, ProviderError> { Ok(api.clone()) })
    }

    fn clients(&self) -> Result<Arc<Clients>, ProviderError> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(ProviderError::not_configured)
    }
}

impl std::fmt::Debug for AppStreamProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStreamProvider")
            .field("configured", &self.clients().is_ok())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderService for AppStreamProvider {
    fn schema(&self) -> ProviderSchema {
        self.registry
            .schema()
            .with_provider_config(ProviderConfig::schema())
    }

    async fn validate_provider_config(&self, config: Json) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&ProviderConfig::schema(), &config))
    }

    #[instrument(skip(self, config), name = "provider.configure")]
    async fn configure(&self, config: Json) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = if config.is_null() { Json::Object(Default::default()) } else { config };
        let mut diags = Diagnostics::new();
        diags.extend(validation::validate(&ProviderConfig::schema(), &config));
        if diags.has_error() {
            return Ok(diags.into_vec());
        }
        let Some(config) = decode::<ProviderConfig>(&config, "provider configuration", &mut diags) else {
            return Ok(diags.into_vec());
        };
        let config = config.resolve_region(|var| std::env::var(var).ok());
        if config.region.is_none() {
            diags.attribute_error(
                "region",
                "Missing Region",
                "Set region in the provider block or export AWS_REGION.",
            );
            return Ok(diags.into_vec());
        }

        let api = self.factory.build(&config)?;
        let clients = config.apply_backoff(Clients::new(api, config.default_tags.clone()));
        *self.clients.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(clients));
        info!(region = config.region.as_deref().unwrap_or_default(), "Provider configured");
        Ok(diags.into_vec())
    }

    #[instrument(skip(self), name = "provider.stop")]
    async fn stop(&self) -> Result<(), ProviderError> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner).take();
        info!("Provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Json,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.registry.resource(resource_type)?.validate(&config).into_vec())
    }

    #[instrument(skip(self, _ctx, prior_state, proposed_state, config), name = "provider.plan")]
    async fn plan(
        &self,
        _ctx: &RequestContext,
        resource_type: &str,
        prior_state: Option<Json>,
        proposed_state: Json,
        config: Json,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        let result = resource.plan(prior_state.as_ref(), proposed_state, &config);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "Planned resource"
        );
        Ok(result)
    }

    #[instrument(skip(self, ctx, planned_state), name = "provider.create")]
    async fn create(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        planned_state: Json,
    ) -> Result<ResourceResponse, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        let clients = self.clients()?;
        Ok(resource.create(&clients, ctx, planned_state).await)
    }

    #[instrument(skip(self, ctx, current_state), name = "provider.read")]
    async fn read(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        current_state: Json,
    ) -> Result<ResourceResponse, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        let clients = self.clients()?;
        Ok(resource.read(&clients, ctx, current_state).await)
    }

    #[instrument(skip(self, ctx, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        prior_state: Json,
        planned_state: Json,
    ) -> Result<ResourceResponse, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        let clients = self.clients()?;
        Ok(resource.update(&clients, ctx, prior_state, planned_state).await)
    }

    #[instrument(skip(self, ctx, current_state), name = "provider.delete")]
    async fn delete(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        current_state: Json,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        let clients = self.clients()?;
        let diagnostics = resource.delete(&clients, ctx, current_state).await;
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!("Delete reported errors");
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, _ctx), name = "provider.import")]
    async fn import_resource(
        &self,
        _ctx: &RequestContext,
        resource_type: &str,
        id: &str,
    ) -> Result<ImportResponse, ProviderError> {
        Ok(self.registry.resource(resource_type)?.import(id))
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Json,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.registry.data_source(data_source_type)?.validate(&config).into_vec())
    }

    #[instrument(skip(self, ctx, config), name = "provider.read_data_source")]
    async fn read_data_source(
        &self,
        ctx: &RequestContext,
        data_source_type: &str,
        config: Json,
    ) -> Result<ResourceResponse, ProviderError> {
        let data_source = self.registry.data_source(data_source_type)?;
        let clients = self.clients()?;
        Ok(data_source.read(&clients, ctx, config).await)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::testing::FakeAppStream;
    use pretty_assertions::assert_eq;

    fn provider() -> (Arc<FakeAppStream>, AppStreamProvider) {
        let fake = Arc::new(FakeAppStream::new());
        (fake.clone(), AppStreamProvider::with_api(fake))
    }

    #[test]
    fn test_region_falls_back_to_environment() {
        let env: HashMap<&str, &str> = [("AWS_DEFAULT_REGION", "eu-west-1")].into();
        let lookup = |var: &str| env.get(var).map(|v| v.to_string());

        let config = ProviderConfig::default().resolve_region(lookup);
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));

        let config = ProviderConfig {
            region: Some("us-east-1".into()),
            ..Default::default()
        }
        .resolve_region(lookup);
        assert_eq!(config.region.as_deref(), Some("us-east-1"));

        let env: HashMap<&str, &str> =
            [("AWS_REGION", "ap-south-1"), ("AWS_DEFAULT_REGION", "eu-west-1")].into();
        let config = ProviderConfig::default().resolve_region(|var| env.get(var).map(|v| v.to_string()));
        assert_eq!(config.region.as_deref(), Some("ap-south-1"));
    }

    #[test]
    fn test_config_decodes_blocks() {
        let config: ProviderConfig = assert_ok!(serde_json::from_value(json!({
            "region": "us-east-1",
            "default_tags": {"tags": {"team": "vdi"}},
            "retry": {"initial_backoff_ms": 50}
        })));
        assert_eq!(config.default_tags.tags.get("team").map(String::as_str), Some("vdi"));
        assert_eq!(config.retry.initial_backoff_ms, Some(50));
        assert_eq!(config.retry.max_backoff_ms, None);

        let clients = config.apply_backoff(Clients::new(Arc::new(FakeAppStream::new()), DefaultTags::default()));
        assert_eq!(clients.backoff.initial_backoff, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_calls_before_configure_fail() {
        let (_, provider) = provider();
        let ctx = RequestContext::new();
        let err = assert_err!(provider.read(&ctx, "appstream_stack", json!({"name": "s1"})).await);
        assert!(matches!(err, ProviderError::Configuration(_)));
        let err = assert_err!(
            provider
                .read_data_source(&ctx, "appstream_fleet", json!({"name": "f1"}))
                .await
        );
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_and_dispatch() {
        let (fake, provider) = provider();
        let diags = assert_ok!(provider.configure(json!({"region": "us-east-1"})).await);
        assert!(diags.is_empty());

        let ctx = RequestContext::new();
        let err = assert_err!(provider.create(&ctx, "appstream_image", json!({})).await);
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let plan = assert_ok!(
            provider
                .plan(&ctx, "appstream_stack", None, json!({"name": "s1"}), json!({"name": "s1"}))
                .await
        );
        let response = assert_ok!(provider.create(&ctx, "appstream_stack", plan.planned_state).await);
        assert!(!response.has_error());
        assert!(fake.stack("s1").is_some());

        assert_ok!(provider.stop().await);
        assert_err!(provider.read(&ctx, "appstream_stack", json!({"name": "s1"})).await);
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_retry_block() {
        let (_, provider) = provider();
        let diags = assert_ok!(
            provider
                .configure(json!({"region": "us-east-1", "retry": {"initial_backoff_ms": "fast"}}))
                .await
        );
        assert!(diags.iter().any(Diagnostic::is_error));
        assert!(provider.clients().is_err());
    }

    #[test]
    fn test_schema_carries_provider_block() {
        let (_, provider) = provider();
        let schema = provider.schema();
        assert!(schema.provider.block.attributes.contains_key("region"));
        assert!(schema.provider.block.blocks.contains_key("default_tags"));
        assert_eq!(schema.resources.len(), 9);
        assert_eq!(provider.metadata().data_sources, vec!["appstream_fleet".to_string()]);
    }
}
