//! Resource adapters.
//!
//! Each managed entity kind implements [`Resource`] over a typed state
//! record. The record is decoded from the host's JSON, handed to the
//! adapter, and encoded back; [`DynResource`] does that erasure once for
//! every adapter so the provider can keep them in a [`Registry`].
//!
//! Lifecycle contract:
//!
//! - `create` issues the remote create and returns a seed record with the
//!   key fields filled in. The shared read path then runs with that seed as
//!   prior so the ownership rules apply from the first read. Failures after
//!   the entity exists are recorded as diagnostics, and the seed is still
//!   written so the host does not lose track of the entity.
//! - `read` returns `Ok(None)` when the entity is gone.
//! - `update` returns `Ok(None)` when the entity vanished mid-update.
//! - `delete` may fail with not-found; that counts as success.

mod app_block;
mod application;
mod application_entitlement;
mod application_fleet;
mod directory_config;
mod fleet;
mod fleet_stack;
pub mod shapes;
mod stack;
mod user_stack;

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;
use tracing::{debug, info, warn};

pub use app_block::{AppBlockModel, AppBlockResource};
pub use application::{ApplicationModel, ApplicationResource};
pub use application_entitlement::{ApplicationEntitlementModel, ApplicationEntitlementResource};
pub use application_fleet::{ApplicationFleetModel, ApplicationFleetResource};
pub use directory_config::{DirectoryConfigModel, DirectoryConfigResource};
pub use fleet::{FleetDataSource, FleetModel, FleetResource};
pub use fleet_stack::{FleetStackModel, FleetStackResource};
pub use stack::{StackModel, StackResource};
pub use user_stack::{UserStackModel, UserStackResource};

use crate::api::model::EntityError;
use crate::api::{AppStreamApi, Error};
use crate::arn::Arn;
use crate::context::RequestContext;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ProviderError;
use crate::id;
use crate::plan;
use crate::retry::RetryPolicy;
use crate::schema::{ProviderSchema, Schema};
use crate::tags::{DefaultTags, TagManager};
use crate::types::{ImportResponse, ImportedResource, PlanResult, ResourceResponse};
use crate::validation;
use crate::validators::{Excludes, RegexValidator};
use crate::value::{decode, encode, MapValue, ReadRule, StringValue, Value};

const INVALID_PLAN: &str = "Invalid Plan";
const INVALID_STATE: &str = "Invalid State";
const UNEXPECTED_IMPORT_ID: &str = "Unexpected Import Identifier";

/// Shared handles every adapter works through.
#[derive(Clone)]
pub struct Clients {
    /// Remote API.
    pub api: Arc<dyn AppStreamApi>,
    /// Tag reconciliation over the same API.
    pub tags: TagManager,
    /// Backoff bounds; each call site picks its own timeout.
    pub backoff: RetryPolicy,
}

impl Clients {
    /// Wire the API with the default-tag policy.
    pub fn new(api: Arc<dyn AppStreamApi>, defaults: DefaultTags) -> Self {
        let tags = TagManager::new(api.clone(), defaults);
        Self {
            api,
            tags,
            backoff: RetryPolicy::default(),
        }
    }

    /// Override the backoff bounds.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = self.backoff.with_backoff(initial, max);
        self
    }

    /// Retry policy with `timeout` and the configured backoff.
    pub fn policy(&self, timeout: Duration) -> RetryPolicy {
        RetryPolicy {
            timeout,
            ..self.backoff
        }
    }
}

impl std::fmt::Debug for Clients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clients")
            .field("tags", &self.tags)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

/// A managed entity kind over a typed state record.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// State record.
    type State: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static;

    /// Host-facing type name.
    const TYPE_NAME: &'static str;

    /// Schema of the state record.
    fn schema(&self) -> Schema;

    /// Cross-field rules over the decoded configuration.
    fn validate(&self, config: &Self::State, diags: &mut Diagnostics) {
        let _ = (config, diags);
    }

    /// Issue the remote create and return the seed for the first read.
    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &Self::State,
        diags: &mut Diagnostics,
    ) -> Result<Option<Self::State>, Error>;

    /// Refresh against the remote entity.
    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &Self::State,
        diags: &mut Diagnostics,
    ) -> Result<Option<Self::State>, Error>;

    /// Converge the remote entity on `plan`.
    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &Self::State,
        plan: &Self::State,
        diags: &mut Diagnostics,
    ) -> Result<Option<Self::State>, Error>;

    /// Delete the remote entity.
    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &Self::State,
        diags: &mut Diagnostics,
    ) -> Result<(), Error>;

    /// Turn an import identifier into a seed record.
    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<Self::State>;
}

/// A read-only lookup.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Result record.
    type State: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static;

    /// Host-facing type name.
    const TYPE_NAME: &'static str;

    /// Schema of the result record.
    fn schema(&self) -> Schema;

    /// Look the entity up from the decoded configuration.
    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        config: &Self::State,
        diags: &mut Diagnostics,
    ) -> Result<Option<Self::State>, Error>;
}

/// A [`Resource`] behind the host's JSON records.
#[async_trait]
pub(crate) trait DynResource: Send + Sync {
    fn schema(&self) -> Schema;

    fn validate(&self, config: &Json) -> Diagnostics;

    fn plan(&self, prior: Option<&Json>, proposed: Json, config: &Json) -> PlanResult;

    async fn create(&self, clients: &Clients, ctx: &RequestContext, planned: Json) -> ResourceResponse;

    async fn read(&self, clients: &Clients, ctx: &RequestContext, current: Json) -> ResourceResponse;

    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: Json,
        planned: Json,
    ) -> ResourceResponse;

    async fn delete(&self, clients: &Clients, ctx: &RequestContext, current: Json) -> Vec<Diagnostic>;

    fn import(&self, id: &str) -> ImportResponse;
}

#[async_trait]
impl<R: Resource> DynResource for R {
    fn schema(&self) -> Schema {
        <R as Resource>::schema(self)
    }

    fn validate(&self, config: &Json) -> Diagnostics {
        let mut diags = Diagnostics::new();
        diags.extend(validation::validate(&<R as Resource>::schema(self), config));
        if diags.has_error() {
            return diags;
        }
        if let Some(record) = decode::<R::State>(config, "configuration", &mut diags) {
            <R as Resource>::validate(self, &record, &mut diags);
        }
        diags
    }

    fn plan(&self, prior: Option<&Json>, proposed: Json, config: &Json) -> PlanResult {
        let diags = DynResource::validate(self, config);
        if diags.has_error() {
            return PlanResult::no_change(proposed).with_diagnostics(diags);
        }
        plan::plan_resource(&<R as Resource>::schema(self), prior, proposed).with_diagnostics(diags)
    }

    async fn create(&self, clients: &Clients, ctx: &RequestContext, planned: Json) -> ResourceResponse {
        let mut diags = Diagnostics::new();
        diags.extend(validation::validate_planned(&<R as Resource>::schema(self), &planned));
        if diags.has_error() {
            return ResourceResponse::new(None, diags);
        }
        let Some(plan) = decode::<R::State>(&planned, "planned state", &mut diags) else {
            return ResourceResponse::new(None, diags);
        };

        let seed = match <R as Resource>::create(self, clients, ctx, &plan, &mut diags).await {
            Ok(Some(seed)) => seed,
            Ok(None) => return ResourceResponse::new(None, diags),
            Err(err) => {
                diags.remote_error(format!("Error creating {}", R::TYPE_NAME), &err);
                return ResourceResponse::new(None, diags);
            },
        };

        let state = match <R as Resource>::read(self, clients, ctx, &seed, &mut diags).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                diags.error(
                    format!("Error reading {} after create", R::TYPE_NAME),
                    "The entity was not found right after it was created.",
                );
                seed
            },
            Err(err) => {
                diags.remote_error(format!("Error reading {} after create", R::TYPE_NAME), &err);
                seed
            },
        };
        info!(resource_type = R::TYPE_NAME, "Created resource");
        let state = encode(&state, "state", &mut diags);
        ResourceResponse::new(state, diags)
    }

    async fn read(&self, clients: &Clients, ctx: &RequestContext, current: Json) -> ResourceResponse {
        let mut diags = Diagnostics::new();
        let Some(prior) = decode::<R::State>(&current, "prior state", &mut diags) else {
            return ResourceResponse::new(Some(current), diags);
        };

        match <R as Resource>::read(self, clients, ctx, &prior, &mut diags).await {
            Ok(Some(state)) => {
                debug!(resource_type = R::TYPE_NAME, "Read resource");
                let state = encode(&state, "state", &mut diags);
                ResourceResponse::new(state, diags)
            },
            Ok(None) if diags.has_error() => ResourceResponse::new(Some(current), diags),
            Ok(None) => {
                warn!(resource_type = R::TYPE_NAME, "Resource not found, removing from state");
                ResourceResponse::new(None, diags)
            },
            Err(err) => {
                diags.remote_error(format!("Error reading {}", R::TYPE_NAME), &err);
                ResourceResponse::new(Some(current), diags)
            },
        }
    }

    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: Json,
        planned: Json,
    ) -> ResourceResponse {
        let mut diags = Diagnostics::new();
        diags.extend(validation::validate_planned(&<R as Resource>::schema(self), &planned));
        if diags.has_error() {
            return ResourceResponse::new(Some(prior), diags);
        }
        let state = decode::<R::State>(&prior, "prior state", &mut diags);
        let plan = decode::<R::State>(&planned, "planned state", &mut diags);
        let (Some(state), Some(plan)) = (state, plan) else {
            return ResourceResponse::new(Some(prior), diags);
        };

        match <R as Resource>::update(self, clients, ctx, &state, &plan, &mut diags).await {
            Ok(Some(state)) => {
                info!(resource_type = R::TYPE_NAME, "Updated resource");
                let state = encode(&state, "state", &mut diags);
                ResourceResponse::new(state, diags)
            },
            Ok(None) if diags.has_error() => ResourceResponse::new(Some(prior), diags),
            Ok(None) => {
                warn!(resource_type = R::TYPE_NAME, "Resource not found during update, removing from state");
                ResourceResponse::new(None, diags)
            },
            Err(err) => {
                diags.remote_error(format!("Error updating {}", R::TYPE_NAME), &err);
                ResourceResponse::new(Some(prior), diags)
            },
        }
    }

    async fn delete(&self, clients: &Clients, ctx: &RequestContext, current: Json) -> Vec<Diagnostic> {
        let mut diags = Diagnostics::new();
        let Some(state) = decode::<R::State>(&current, "state", &mut diags) else {
            return diags.into_vec();
        };

        match <R as Resource>::delete(self, clients, ctx, &state, &mut diags).await {
            Ok(()) => info!(resource_type = R::TYPE_NAME, "Deleted resource"),
            Err(err) if err.is_not_found() => {
                debug!(resource_type = R::TYPE_NAME, "Resource already gone");
            },
            Err(err) => diags.remote_error(format!("Error deleting {}", R::TYPE_NAME), &err),
        }
        diags.into_vec()
    }

    fn import(&self, id: &str) -> ImportResponse {
        let mut diags = Diagnostics::new();
        let resources = <R as Resource>::import(self, id, &mut diags)
            .and_then(|seed| encode(&seed, "import seed", &mut diags))
            .map(|state| vec![ImportedResource::new(R::TYPE_NAME, state)])
            .unwrap_or_default();
        ImportResponse::new(resources, diags)
    }
}

/// A [`DataSource`] behind the host's JSON records.
#[async_trait]
pub(crate) trait DynDataSource: Send + Sync {
    fn schema(&self) -> Schema;

    fn validate(&self, config: &Json) -> Diagnostics;

    async fn read(&self, clients: &Clients, ctx: &RequestContext, config: Json) -> ResourceResponse;
}

#[async_trait]
impl<D: DataSource> DynDataSource for D {
    fn schema(&self) -> Schema {
        <D as DataSource>::schema(self)
    }

    fn validate(&self, config: &Json) -> Diagnostics {
        let mut diags = Diagnostics::new();
        diags.extend(validation::validate(&<D as DataSource>::schema(self), config));
        diags
    }

    async fn read(&self, clients: &Clients, ctx: &RequestContext, config: Json) -> ResourceResponse {
        let mut diags = DynDataSource::validate(self, &config);
        if diags.has_error() {
            return ResourceResponse::new(None, diags);
        }
        let Some(query) = decode::<D::State>(&config, "configuration", &mut diags) else {
            return ResourceResponse::new(None, diags);
        };

        match <D as DataSource>::read(self, clients, ctx, &query, &mut diags).await {
            Ok(Some(state)) => {
                debug!(data_source_type = D::TYPE_NAME, "Read data source");
                let state = encode(&state, "state", &mut diags);
                ResourceResponse::new(state, diags)
            },
            Ok(None) => ResourceResponse::new(None, diags),
            Err(err) => {
                diags.remote_error(format!("Error reading {}", D::TYPE_NAME), &err);
                ResourceResponse::new(None, diags)
            },
        }
    }
}

/// Resource and data source adapters by type name.
pub(crate) struct Registry {
    resources: BTreeMap<&'static str, Box<dyn DynResource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DynDataSource>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    /// Every AppStream adapter.
    pub(crate) fn appstream() -> Self {
        Self::new()
            .with_resource(AppBlockResource)
            .with_resource(ApplicationResource)
            .with_resource(FleetResource)
            .with_resource(StackResource)
            .with_resource(DirectoryConfigResource)
            .with_resource(FleetStackResource)
            .with_resource(ApplicationFleetResource)
            .with_resource(UserStackResource)
            .with_resource(ApplicationEntitlementResource)
            .with_data_source(FleetDataSource)
    }

    pub(crate) fn with_resource<R: Resource>(mut self, resource: R) -> Self {
        self.resources.insert(R::TYPE_NAME, Box::new(resource));
        self
    }

    pub(crate) fn with_data_source<D: DataSource>(mut self, data_source: D) -> Self {
        self.data_sources.insert(D::TYPE_NAME, Box::new(data_source));
        self
    }

    pub(crate) fn resource(&self, type_name: &str) -> Result<&dyn DynResource, ProviderError> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub(crate) fn data_source(&self, type_name: &str) -> Result<&dyn DynDataSource, ProviderError> {
        self.data_sources
            .get(type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }

    /// Schemas of every adapter, without the provider block.
    pub(crate) fn schema(&self) -> ProviderSchema {
        let schema = self
            .resources
            .iter()
            .fold(ProviderSchema::new(), |schema, (name, r)| schema.with_resource(*name, r.schema()));
        self.data_sources
            .iter()
            .fold(schema, |schema, (name, d)| schema.with_data_source(*name, d.schema()))
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the adapters
// ---------------------------------------------------------------------------

static NAME: LazyLock<RegexValidator> = LazyLock::new(|| {
    RegexValidator::new(
        r"^[a-zA-Z0-9][a-zA-Z0-9_.-]{0,100}$",
        "must start with a letter or digit and contain only letters, digits, '_', '.' and '-' (at most 101 characters)",
    )
});

/// Entity names accepted by the service.
pub(crate) fn name_validator() -> &'static RegexValidator {
    &NAME
}

/// Free-form key segments of a composite identifier.
pub(crate) fn id_segment() -> Excludes {
    Excludes(id::SEPARATOR)
}

/// A key attribute of a plan; records "Invalid Plan" when it is not known.
pub(crate) fn plan_key<'a>(diags: &mut Diagnostics, path: &str, value: &'a StringValue) -> Option<&'a str> {
    require_known(diags, path, value, INVALID_PLAN)
}

/// A key attribute of prior state; records "Invalid State" when it is not known.
pub(crate) fn state_key<'a>(diags: &mut Diagnostics, path: &str, value: &'a StringValue) -> Option<&'a str> {
    require_known(diags, path, value, INVALID_STATE)
}

fn require_known<'a>(
    diags: &mut Diagnostics,
    path: &str,
    value: &'a StringValue,
    summary: &str,
) -> Option<&'a str> {
    match value {
        Value::Known(value) => Some(value),
        other => {
            let what = if other.is_null() { "null" } else { "unknown" };
            diags.attribute_error(path, summary, format!("{path} must be known here, but it is {what}."));
            None
        },
    }
}

/// Keys that must not change in place. Records an error and returns false
/// on mismatch.
pub(crate) fn same_identity(diags: &mut Diagnostics, path: &str, state: &StringValue, plan: &StringValue) -> bool {
    match (state, plan) {
        (Value::Known(before), Value::Known(after)) if before != after => {
            diags.attribute_error(
                path,
                "Unexpected Identity Change",
                format!("{path} changed from {before:?} to {after:?} in place; the resource must be replaced."),
            );
            false
        },
        _ => true,
    }
}

/// Import identifier that must be a bare, non-empty name.
pub(crate) fn import_name(diags: &mut Diagnostics, id: &str, what: &str) -> Option<String> {
    if id.is_empty() || id.contains(id::SEPARATOR) {
        diags.error(
            UNEXPECTED_IMPORT_ID,
            format!("Expected the {what} as import identifier, got {id:?}."),
        );
        return None;
    }
    Some(id.to_string())
}

/// Import identifier that must be an ARN of `service` under `prefix`;
/// returns the resource name it carries.
pub(crate) fn import_arn(diags: &mut Diagnostics, id: &str, service: &str, prefix: &str) -> Option<String> {
    let parsed = id.parse::<Arn>().and_then(|arn| arn.expect(service, prefix).map(|()| arn));
    let detail = match parsed {
        Ok(arn) => match arn.resource_name() {
            Some(name) => return Some(name.to_string()),
            None => format!("ARN {id:?} has no resource name"),
        },
        Err(err) => err.to_string(),
    };
    diags.error(
        UNEXPECTED_IMPORT_ID,
        format!("Expected an ARN of the form arn:<partition>:{service}:<region>:<account>:{prefix}<name>: {detail}"),
    );
    None
}

/// Import identifier made of `names.len()` pipe-delimited segments.
pub(crate) fn import_composite<const N: usize>(
    diags: &mut Diagnostics,
    id: &str,
    names: [&str; N],
) -> Option<[String; N]> {
    match id::parse::<N>(id) {
        Ok(parts) => Some(parts),
        Err(err) => {
            diags.error(
                UNEXPECTED_IMPORT_ID,
                format!("Expected an identifier of the form {}: {err}", id::describe_format(&names)),
            );
            None
        },
    }
}

/// Read rule for owned attributes.
///
/// An import seed has its computed `marker` null; its first read projects
/// everything. Any other prior keeps the ownership rules.
pub(crate) fn read_rule<T>(marker: &Value<T>) -> ReadRule {
    if marker.is_null() {
        ReadRule::DataSource
    } else {
        ReadRule::Owned
    }
}

/// Surface the entity's own error telemetry as warnings.
pub(crate) fn warn_entity_errors(diags: &mut Diagnostics, kind: &str, name: &str, errors: Option<&Vec<EntityError>>) {
    for error in errors.into_iter().flatten() {
        let code = error.error_code.as_deref().unwrap_or("UNKNOWN");
        let message = error.error_message.as_deref().unwrap_or_default();
        diags.warning(format!("{kind} {name} reported an error"), format!("{code}: {message}"));
    }
}

/// Converge remote tags on the planned `tags`; an unknown plan is left alone.
pub(crate) async fn apply_tags(
    clients: &Clients,
    ctx: &RequestContext,
    arn: &str,
    tags: &MapValue<String>,
) -> Result<(), Error> {
    match tags {
        Value::Unknown => Ok(()),
        tags => {
            let declared = tags.known_cloned().unwrap_or_default();
            clients.tags.apply(ctx, arn, &declared).await
        },
    }
}

/// Record a failure that happened after the entity already exists.
pub(crate) fn record(diags: &mut Diagnostics, summary: impl Into<String>, result: Result<(), Error>) {
    if let Err(err) = result {
        diags.remote_error(summary, &err);
    }
}

/// Not-found as absence.
pub(crate) trait OrGone<T> {
    /// Map a not-found error to `Ok(None)`.
    fn or_gone(self) -> Result<Option<T>, Error>;
}

impl<T> OrGone<T> for Result<Option<T>, Error> {
    fn or_gone(self) -> Result<Option<T>, Error> {
        match self {
            Err(err) if err.is_not_found() => Ok(None),
            other => other,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Drive an adapter the way the host does.

    use super::*;
    use crate::testing::FakeAppStream;

    /// A fake remote with fast backoff.
    pub(crate) fn clients() -> (Arc<FakeAppStream>, Clients) {
        let fake = Arc::new(FakeAppStream::new());
        let clients = Clients::new(fake.clone(), DefaultTags::default())
            .with_backoff(Duration::from_millis(10), Duration::from_millis(100));
        (fake, clients)
    }

    /// Plan from `config` and create; panics if the plan carries an error.
    pub(crate) async fn create(resource: &dyn DynResource, clients: &Clients, config: Json) -> ResourceResponse {
        let plan = resource.plan(None, config.clone(), &config);
        assert!(!plan.has_error(), "plan failed: {:?}", plan.diagnostics);
        resource.create(clients, &RequestContext::new(), plan.planned_state).await
    }

    /// Create and return the state, panicking on any error.
    pub(crate) async fn created(resource: &dyn DynResource, clients: &Clients, config: Json) -> Json {
        let response = create(resource, clients, config).await;
        assert!(!response.has_error(), "create failed: {:?}", response.diagnostics);
        response.state.unwrap_or_default()
    }

    /// Plan `config` against `state` and update.
    pub(crate) async fn update(
        resource: &dyn DynResource,
        clients: &Clients,
        state: Json,
        config: Json,
    ) -> ResourceResponse {
        let plan = resource.plan(Some(&state), config.clone(), &config);
        assert!(!plan.has_error(), "plan failed: {:?}", plan.diagnostics);
        resource.update(clients, &RequestContext::new(), state, plan.planned_state).await
    }

    /// Refresh `state`.
    pub(crate) async fn read(resource: &dyn DynResource, clients: &Clients, state: Json) -> ResourceResponse {
        resource.read(clients, &RequestContext::new(), state).await
    }

    /// Delete `state`.
    pub(crate) async fn delete(resource: &dyn DynResource, clients: &Clients, state: Json) -> Vec<Diagnostic> {
        resource.delete(clients, &RequestContext::new(), state).await
    }

    /// A context that is already cancelled.
    pub(crate) fn cancelled() -> RequestContext {
        let ctx = RequestContext::new();
        ctx.cancel();
        ctx
    }

    /// Summaries of the error diagnostics in `response`.
    pub(crate) fn errors(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| format!("{}: {}", d.summary, d.detail.as_deref().unwrap_or_default()))
            .collect()
    }
}
