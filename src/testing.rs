//! Testing utilities for the provider.
//!
//! [`ProviderTester`] drives a [`ProviderService`] the way the host does,
//! without any transport, and [`FakeAppStream`] stands in for the remote
//! API.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hemmer_provider_appstream::testing::{FakeAppStream, ProviderTester};
//! use hemmer_provider_appstream::AppStreamProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_stack_lifecycle() {
//!     let fake = Arc::new(FakeAppStream::new());
//!     let tester = ProviderTester::new(AppStreamProvider::with_api(fake.clone()));
//!     tester.configure(json!({"region": "us-east-1"})).await.unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("appstream_stack", json!({"name": "s1"}))
//!         .await
//!         .unwrap();
//!     assert_eq!(state["name"], "s1");
//! }
//! ```

mod fake;

use serde_json::Value;

pub use fake::{fake_arn, Call, FakeAppStream, FakeState, CREATED_TIME};

use crate::context::RequestContext;
use crate::diagnostics::Diagnostic;
use crate::error::ProviderError;
use crate::schema::ProviderSchema;
use crate::service::ProviderService;
use crate::types::{ImportResponse, PlanResult, ResourceResponse};

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
    ctx: RequestContext,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            ctx: RequestContext::new(),
        }
    }

    /// Run every call under `ctx`, e.g. one with a deadline.
    pub fn with_context(mut self, ctx: RequestContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The context calls run under.
    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration, failing on error diagnostics.
    pub async fn validate_resource_config(&self, resource_type: &str, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_resource_config(resource_type, config).await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation from `config`.
    pub async fn plan_create(&self, resource_type: &str, config: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(&self.ctx, resource_type, None, config.clone(), config)
            .await
    }

    /// Plan `config` against `prior_state`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(&self.ctx, resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Create a resource from its planned state.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<ResourceResponse, ProviderError> {
        self.provider.create(&self.ctx, resource_type, planned_state).await
    }

    /// Refresh a resource.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<ResourceResponse, ProviderError> {
        self.provider.read(&self.ctx, resource_type, current_state).await
    }

    /// Update a resource in place.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<ResourceResponse, ProviderError> {
        self.provider
            .update(&self.ctx, resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        self.provider.delete(&self.ctx, resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(&self, resource_type: &str, id: &str) -> Result<ImportResponse, ProviderError> {
        self.provider.import_resource(&self.ctx, resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<ResourceResponse, ProviderError> {
        self.provider.read_data_source(&self.ctx, data_source_type, config).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan → create → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, TestError> {
        let plan = self.plan_create(resource_type, config).await?;
        check_diagnostics(plan.diagnostics)?;

        let created = expect_state(self.create(resource_type, plan.planned_state).await?)?;
        expect_state(self.read(resource_type, created).await?)
    }

    /// Run a full update lifecycle: plan → update → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan = self.plan_update(resource_type, prior_state.clone(), config).await?;
        check_diagnostics(plan.diagnostics)?;
        if plan.requires_replace {
            return Err(TestError::RequiresReplace);
        }

        let updated = expect_state(self.update(resource_type, prior_state, plan.planned_state).await?)?;
        expect_state(self.read(resource_type, updated).await?)
    }

    /// Delete and confirm a follow-up read drops the resource.
    pub async fn lifecycle_delete(&self, resource_type: &str, current_state: Value) -> Result<(), TestError> {
        check_diagnostics(self.delete(resource_type, current_state.clone()).await?)?;

        let response = self.read(resource_type, current_state).await?;
        check_diagnostics(response.diagnostics)?;
        match response.state {
            None => Ok(()),
            Some(state) => Err(TestError::StillPresent(state)),
        }
    }

    /// Run a full CRUD lifecycle: create → read → update → read → delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self.lifecycle_update(resource_type, created, updated_config).await?;
        self.lifecycle_delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
    /// The provider dropped the resource from state.
    Removed,
    /// The plan needs a replacement where an in-place update was expected.
    RequiresReplace,
    /// The resource was still readable after delete.
    StillPresent(Value),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
            TestError::Removed => write!(f, "Resource was removed from state"),
            TestError::RequiresReplace => write!(f, "Plan requires replacement"),
            TestError::StillPresent(state) => write!(f, "Resource still present after delete: {}", state),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

/// Check diagnostics and return an error if there are any errors.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

fn expect_state(response: ResourceResponse) -> Result<Value, TestError> {
    check_diagnostics(response.diagnostics)?;
    response.state.ok_or(TestError::Removed)
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "Expected plan to require replacement, but it does not");
}

/// Assert that a plan does not require resource replacement.
///
/// # Panics
///
/// Panics if the plan requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| (&d.summary, &d.detail)).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error whose summary or detail contains
/// `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics.iter().any(|d| {
        d.is_error() && (d.summary.contains(substring) || d.detail.as_deref().is_some_and(|s| s.contains(substring)))
    });

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}
