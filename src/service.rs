//! The host-facing provider seam.
//!
//! The host drives a provider through [`ProviderService`]. Each lifecycle
//! call carries a [`RequestContext`] with the host's deadline and
//! cancellation, and answers with a response that carries the diagnostics
//! accumulated along the way. Only plumbing failures (unknown resource type,
//! a call before `configure`, malformed payloads) are returned as
//! [`ProviderError`].
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_appstream::{ProviderService, ProviderError, PlanResult, ProviderSchema};
//! use hemmer_provider_appstream::context::RequestContext;
//! use hemmer_provider_appstream::diagnostics::Diagnostic;
//!
//! struct MyProvider;
//!
//! #[async_trait::async_trait]
//! impl ProviderService for MyProvider {
//!     fn schema(&self) -> ProviderSchema {
//!         ProviderSchema::new()
//!     }
//!
//!     async fn configure(&self, config: serde_json::Value) -> Result<Vec<Diagnostic>, ProviderError> {
//!         Ok(vec![])
//!     }
//!
//!     // ... implement the resource operations
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value as Json;

use crate::context::RequestContext;
use crate::diagnostics::Diagnostic;
use crate::error::ProviderError;
use crate::schema::ProviderSchema;
use crate::types::{ImportResponse, PlanResult, ProviderMetadata, ResourceResponse};

/// Operations a provider serves to the host.
#[async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata.
    /// By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Json) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider: build the remote client and shared helpers.
    async fn configure(&self, config: Json) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Json,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Plan changes for a resource. `prior_state` is `None` for a create.
    async fn plan(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        prior_state: Option<Json>,
        proposed_state: Json,
        config: Json,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a resource from its planned state.
    async fn create(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        planned_state: Json,
    ) -> Result<ResourceResponse, ProviderError>;

    /// Refresh a resource. A response without state removes it.
    async fn read(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        current_state: Json,
    ) -> Result<ResourceResponse, ProviderError>;

    /// Update a resource in place.
    async fn update(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        prior_state: Json,
        planned_state: Json,
    ) -> Result<ResourceResponse, ProviderError>;

    /// Delete a resource.
    async fn delete(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        current_state: Json,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Turn an import identifier into a seed record.
    async fn import_resource(
        &self,
        ctx: &RequestContext,
        resource_type: &str,
        id: &str,
    ) -> Result<ImportResponse, ProviderError> {
        let _ = (ctx, id);
        Err(ProviderError::InvalidRequest(format!(
            "Import not supported for resource type: {resource_type}"
        )))
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Json,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        ctx: &RequestContext,
        data_source_type: &str,
        config: Json,
    ) -> Result<ResourceResponse, ProviderError> {
        let _ = (ctx, config);
        Err(ProviderError::UnknownDataSource(data_source_type.to_string()))
    }
}
