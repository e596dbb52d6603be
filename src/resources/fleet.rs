//! `appstream_fleet`: streaming instances, plus the `appstream_fleet` lookup.
//!
//! A fleet only streams while it is running, and the remote refuses several
//! updates on a running fleet. Create therefore starts the fleet and waits for
//! `RUNNING`; updates touching stop-only attributes cycle the fleet through
//! `STOPPED`; delete stops it first.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::shapes::{
    expand_object, expand_strings, flatten_errors, ComputeCapacityModel, DomainJoinInfoModel, EntityErrorModel,
    S3LocationModel, VolumeConfigModel, VpcConfigModel, PLATFORMS,
};
use super::{
    apply_tags, import_name, name_validator, plan_key, read_rule, record, same_identity, state_key,
    warn_entity_errors, Clients, DataSource, OrGone, Resource,
};
use crate::api::model::{CreateFleetInput, Fleet, FleetAttribute, FleetState, UpdateFleetInput};
use crate::api::{ApiError, Error};
use crate::context::RequestContext;
use crate::delta::UpdateDelta;
use crate::diagnostics::Diagnostics;
use crate::retry::{is_conflict, is_transient, retry};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};
use crate::tags::TagState;
use crate::validators::{
    check, conflicts, exactly_one_of, presence, required, ArnValidator, OneOf, StepValidator, INVALID_COMBINATION,
};
use crate::value::{BoolValue, Int32Value, MapValue, ReadRule, SetValue, StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Budget for a fleet to reach `RUNNING` or `STOPPED`.
const STATE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

const FLEET_TYPES: &[&str] = &["ON_DEMAND", "ALWAYS_ON", "ELASTIC"];
const STREAM_VIEWS: &[&str] = &["APP", "DESKTOP"];

/// State of a fleet. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct FleetModel {
    /// The fleet name.
    pub id: StringValue,
    pub name: StringValue,
    pub display_name: StringValue,
    pub description: StringValue,
    pub image_name: StringValue,
    pub image_arn: StringValue,
    pub instance_type: StringValue,
    pub fleet_type: StringValue,
    pub compute_capacity: Value<ComputeCapacityModel>,
    pub max_user_duration_in_seconds: Int32Value,
    pub disconnect_timeout_in_seconds: Int32Value,
    pub idle_disconnect_timeout_in_seconds: Int32Value,
    pub vpc_config: Value<VpcConfigModel>,
    pub enable_default_internet_access: BoolValue,
    pub domain_join_info: Value<DomainJoinInfoModel>,
    pub iam_role_arn: StringValue,
    pub stream_view: StringValue,
    pub platform: StringValue,
    pub max_concurrent_sessions: Int32Value,
    pub usb_device_filter_strings: SetValue<String>,
    pub session_script_s3_location: Value<S3LocationModel>,
    pub max_sessions_per_instance: Int32Value,
    pub root_volume_config: Value<VolumeConfigModel>,
    pub tags: MapValue<String>,
    pub tags_all: MapValue<String>,
    pub arn: StringValue,
    pub created_time: StringValue,
    pub state: StringValue,
    pub fleet_errors: SetValue<EntityErrorModel>,
}

impl FleetModel {
    /// Project a described fleet.
    fn flatten(rule: ReadRule, prior: &FleetModel, fleet: Fleet, tags: TagState) -> Self {
        Self {
            id: Value::known(fleet.name.clone()),
            name: Value::known(fleet.name.clone()),
            display_name: Value::read(rule, &prior.display_name, fleet.display_name.as_ref()),
            description: Value::read(rule, &prior.description, fleet.description.as_ref()),
            image_name: Value::computed_optional(&prior.image_name, fleet.image_name.as_ref()),
            image_arn: Value::computed_optional(&prior.image_arn, fleet.image_arn.as_ref()),
            instance_type: Value::known(fleet.instance_type.clone()),
            fleet_type: Value::computed_optional(&prior.fleet_type, fleet.fleet_type.as_ref()),
            compute_capacity: Value::read(rule, &prior.compute_capacity, fleet.compute_capacity_status.as_ref()),
            max_user_duration_in_seconds: Value::computed_optional(
                &prior.max_user_duration_in_seconds,
                fleet.max_user_duration_in_seconds.as_ref(),
            ),
            disconnect_timeout_in_seconds: Value::computed_optional(
                &prior.disconnect_timeout_in_seconds,
                fleet.disconnect_timeout_in_seconds.as_ref(),
            ),
            idle_disconnect_timeout_in_seconds: Value::read(
                rule,
                &prior.idle_disconnect_timeout_in_seconds,
                fleet.idle_disconnect_timeout_in_seconds.as_ref(),
            ),
            vpc_config: Value::read(rule, &prior.vpc_config, fleet.vpc_config.as_ref()),
            enable_default_internet_access: Value::computed_optional(
                &prior.enable_default_internet_access,
                fleet.enable_default_internet_access.as_ref(),
            ),
            domain_join_info: Value::read(rule, &prior.domain_join_info, fleet.domain_join_info.as_ref()),
            iam_role_arn: Value::read(rule, &prior.iam_role_arn, fleet.iam_role_arn.as_ref()),
            stream_view: Value::computed_optional(&prior.stream_view, fleet.stream_view.as_ref()),
            platform: Value::computed_optional(&prior.platform, fleet.platform.as_ref()),
            max_concurrent_sessions: Value::read(
                rule,
                &prior.max_concurrent_sessions,
                fleet.max_concurrent_sessions.as_ref(),
            ),
            usb_device_filter_strings: Value::read(
                rule,
                &prior.usb_device_filter_strings,
                fleet.usb_device_filter_strings.as_ref(),
            ),
            session_script_s3_location: Value::read(
                rule,
                &prior.session_script_s3_location,
                fleet.session_script_s3_location.as_ref(),
            ),
            max_sessions_per_instance: Value::read(
                rule,
                &prior.max_sessions_per_instance,
                fleet.max_sessions_per_instance.as_ref(),
            ),
            root_volume_config: Value::read(rule, &prior.root_volume_config, fleet.root_volume_config.as_ref()),
            tags: tags.tags,
            tags_all: tags.tags_all,
            arn: Value::known(fleet.arn),
            created_time: Value::computed(fleet.created_time.as_ref()),
            state: Value::known(fleet.state.to_string()),
            fleet_errors: flatten_errors(fleet.fleet_errors.as_ref()),
        }
    }
}

/// Whether a planned attribute differs from state.
fn changed<T: PartialEq>(plan: &Value<T>, state: &Value<T>) -> bool {
    !plan.is_unknown() && plan != state
}

/// Attributes the remote only accepts on a stopped fleet.
fn needs_stop(state: &FleetModel, plan: &FleetModel) -> bool {
    changed(&plan.instance_type, &state.instance_type)
        || changed(&plan.vpc_config, &state.vpc_config)
        || changed(&plan.domain_join_info, &state.domain_join_info)
        || changed(&plan.enable_default_internet_access, &state.enable_default_internet_access)
        || changed(&plan.iam_role_arn, &state.iam_role_arn)
        || changed(&plan.platform, &state.platform)
        || changed(&plan.max_concurrent_sessions, &state.max_concurrent_sessions)
        || changed(&plan.max_sessions_per_instance, &state.max_sessions_per_instance)
        || changed(&plan.root_volume_config, &state.root_volume_config)
}

/// Poll until the fleet reports `target`.
async fn wait_for_state(clients: &Clients, ctx: &RequestContext, name: &str, target: FleetState) -> Result<(), Error> {
    debug!(fleet = name, %target, "Waiting for fleet state");
    retry(ctx, &clients.policy(STATE_TIMEOUT), &[is_transient], "wait_fleet_state", || async move {
        let fleet = clients
            .api
            .describe_fleet(name)
            .await?
            .ok_or_else(|| Error::from(ApiError::not_found(format!("fleet {name} not found"))))?;
        if fleet.state == target {
            Ok(())
        } else {
            Err(Error::not_ready(
                "FleetState",
                format!("fleet {name} is {}, waiting for {target}", fleet.state),
            ))
        }
    })
    .await
}

async fn start_fleet(clients: &Clients, ctx: &RequestContext, name: &str) -> Result<(), Error> {
    retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "start_fleet", || async move {
        clients.api.start_fleet(name).await.map_err(Error::from)
    })
    .await?;
    wait_for_state(clients, ctx, name, FleetState::Running).await
}

async fn stop_fleet(clients: &Clients, ctx: &RequestContext, name: &str) -> Result<(), Error> {
    ctx.call(clients.api.stop_fleet(name)).await?;
    wait_for_state(clients, ctx, name, FleetState::Stopped).await
}

/// Fleet adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetResource;

#[async_trait]
impl Resource for FleetResource {
    type State = FleetModel;

    const TYPE_NAME: &'static str = "appstream_fleet";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("display_name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("image_name", Attribute::optional_computed_string())
            .with_attribute("image_arn", Attribute::optional_computed_string())
            .with_attribute("instance_type", Attribute::required_string())
            .with_attribute("fleet_type", Attribute::optional_computed_string().with_force_new())
            .with_attribute("max_user_duration_in_seconds", Attribute::optional_computed_int32())
            .with_attribute("disconnect_timeout_in_seconds", Attribute::optional_computed_int32())
            .with_attribute("idle_disconnect_timeout_in_seconds", Attribute::optional_int32())
            .with_attribute("enable_default_internet_access", Attribute::optional_computed_bool())
            .with_attribute("iam_role_arn", Attribute::optional_string())
            .with_attribute("stream_view", Attribute::optional_computed_string())
            .with_attribute("platform", Attribute::optional_computed_string())
            .with_attribute("max_concurrent_sessions", Attribute::optional_int32())
            .with_attribute("usb_device_filter_strings", Attribute::string_set(AttributeFlags::optional()))
            .with_attribute("max_sessions_per_instance", Attribute::optional_int32())
            .with_attribute("arn", Attribute::computed_string())
            .with_attribute("created_time", Attribute::computed_string())
            .with_attribute("state", Attribute::computed_string())
            .with_attribute("fleet_errors", EntityErrorModel::attribute())
            .with_block(
                "compute_capacity",
                NestedBlock::single(ComputeCapacityModel::block()).with_max_items(1),
            )
            .with_block("vpc_config", NestedBlock::single(VpcConfigModel::block()).with_max_items(1))
            .with_block(
                "domain_join_info",
                NestedBlock::single(DomainJoinInfoModel::block()).with_max_items(1),
            )
            .with_block(
                "session_script_s3_location",
                NestedBlock::single(S3LocationModel::block()).with_max_items(1),
            )
            .with_block(
                "root_volume_config",
                NestedBlock::single(VolumeConfigModel::block()).with_max_items(1),
            )
            .with_tags()
    }

    fn validate(&self, config: &FleetModel, diags: &mut Diagnostics) {
        check(diags, "name", &config.name, &name_validator());
        exactly_one_of(
            diags,
            &[("image_name", presence(&config.image_name)), ("image_arn", presence(&config.image_arn))],
        );
        check(diags, "image_arn", &config.image_arn, &ArnValidator::of("appstream", "image/"));
        check(diags, "iam_role_arn", &config.iam_role_arn, &ArnValidator::of("iam", "role/"));
        check(diags, "fleet_type", &config.fleet_type, &OneOf(FLEET_TYPES));
        check(diags, "stream_view", &config.stream_view, &OneOf(STREAM_VIEWS));
        check(diags, "platform", &config.platform, &OneOf(PLATFORMS));
        check(
            diags,
            "max_user_duration_in_seconds",
            &config.max_user_duration_in_seconds,
            &StepValidator::new(600, 432_000, 60),
        );
        check(
            diags,
            "disconnect_timeout_in_seconds",
            &config.disconnect_timeout_in_seconds,
            &StepValidator::new(60, 360_000, 60),
        );
        check(
            diags,
            "idle_disconnect_timeout_in_seconds",
            &config.idle_disconnect_timeout_in_seconds,
            &StepValidator::new(60, 360_000, 60).or_zero(),
        );

        match &config.fleet_type {
            Value::Known(fleet_type) if fleet_type == "ELASTIC" => {
                let reason = "fleet_type is ELASTIC";
                required(diags, "vpc_config", presence(&config.vpc_config), reason);
                if let Value::Known(vpc) = &config.vpc_config {
                    if vpc.subnet_ids.as_known().is_some_and(|ids| ids.len() < 2) || vpc.subnet_ids.is_null() {
                        diags.attribute_error(
                            "vpc_config.subnet_ids",
                            INVALID_COMBINATION,
                            "an ELASTIC fleet needs at least two subnets",
                        );
                    }
                }
                conflicts(diags, "compute_capacity", presence(&config.compute_capacity), reason);
                conflicts(diags, "domain_join_info", presence(&config.domain_join_info), reason);
                conflicts(
                    diags,
                    "max_sessions_per_instance",
                    presence(&config.max_sessions_per_instance),
                    reason,
                );
            },
            Value::Unknown => {},
            _ => {
                let reason = "fleet_type is not ELASTIC";
                required(diags, "compute_capacity", presence(&config.compute_capacity), reason);
                conflicts(diags, "max_concurrent_sessions", presence(&config.max_concurrent_sessions), reason);
                conflicts(
                    diags,
                    "session_script_s3_location",
                    presence(&config.session_script_s3_location),
                    reason,
                );
            },
        }

        if let Value::Known(capacity) = &config.compute_capacity {
            exactly_one_of(
                diags,
                &[
                    ("compute_capacity.desired_instances", presence(&capacity.desired_instances)),
                    ("compute_capacity.desired_sessions", presence(&capacity.desired_sessions)),
                ],
            );
            if capacity.desired_sessions.is_known() {
                match &config.max_sessions_per_instance {
                    Value::Known(n) if *n > 1 => {},
                    Value::Unknown => {},
                    _ => diags.attribute_error(
                        "compute_capacity.desired_sessions",
                        INVALID_COMBINATION,
                        "desired_sessions requires max_sessions_per_instance greater than 1",
                    ),
                }
            }
        }
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &FleetModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<FleetModel>, Error> {
        let Some(name) = plan_key(diags, "name", &plan.name) else {
            return Ok(None);
        };
        let Some(instance_type) = plan_key(diags, "instance_type", &plan.instance_type) else {
            return Ok(None);
        };

        let input = CreateFleetInput {
            name: name.to_string(),
            display_name: plan.display_name.known_cloned(),
            description: plan.description.known_cloned(),
            image_name: plan.image_name.known_cloned(),
            image_arn: plan.image_arn.known_cloned(),
            instance_type: instance_type.to_string(),
            fleet_type: plan.fleet_type.known_cloned(),
            compute_capacity: expand_object(&plan.compute_capacity, ComputeCapacityModel::expand),
            max_user_duration_in_seconds: plan.max_user_duration_in_seconds.known_cloned(),
            disconnect_timeout_in_seconds: plan.disconnect_timeout_in_seconds.known_cloned(),
            idle_disconnect_timeout_in_seconds: plan.idle_disconnect_timeout_in_seconds.known_cloned(),
            vpc_config: expand_object(&plan.vpc_config, VpcConfigModel::expand),
            enable_default_internet_access: plan.enable_default_internet_access.known_cloned(),
            domain_join_info: expand_object(&plan.domain_join_info, DomainJoinInfoModel::expand),
            iam_role_arn: plan.iam_role_arn.known_cloned(),
            stream_view: plan.stream_view.known_cloned(),
            platform: plan.platform.known_cloned(),
            max_concurrent_sessions: plan.max_concurrent_sessions.known_cloned(),
            usb_device_filter_strings: expand_strings(&plan.usb_device_filter_strings),
            session_script_s3_location: expand_object(&plan.session_script_s3_location, S3LocationModel::expand),
            max_sessions_per_instance: plan.max_sessions_per_instance.known_cloned(),
            root_volume_config: expand_object(&plan.root_volume_config, VolumeConfigModel::expand),
        };

        let fleet = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "create_fleet", || {
            let input = input.clone();
            async move { clients.api.create_fleet(input).await.map_err(Error::from) }
        })
        .await?;

        warn_entity_errors(diags, "Fleet", name, fleet.fleet_errors.as_ref());
        record(
            diags,
            format!("Error starting fleet {name}"),
            start_fleet(clients, ctx, name).await,
        );
        record(
            diags,
            format!("Error tagging fleet {name}"),
            apply_tags(clients, ctx, &fleet.arn, &plan.tags).await,
        );

        Ok(Some(FleetModel {
            id: Value::known(fleet.name),
            arn: Value::known(fleet.arn),
            ..plan.clone()
        }))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &FleetModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<FleetModel>, Error> {
        let Some(name) = state_key(diags, "name", &prior.name) else {
            return Ok(None);
        };
        let Some(fleet) = ctx.call(clients.api.describe_fleet(name)).await.or_gone()? else {
            return Ok(None);
        };

        let rule = read_rule(&prior.created_time);
        let tags = clients.tags.read_state(ctx, &fleet.arn, &prior.tags).await?;
        Ok(Some(FleetModel::flatten(rule, prior, fleet, tags)))
    }

    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &FleetModel,
        plan: &FleetModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<FleetModel>, Error> {
        let Some(name) = state_key(diags, "name", &state.name) else {
            return Ok(None);
        };
        if !same_identity(diags, "name", &state.name, &plan.name) {
            return Ok(None);
        }

        let mut delta = UpdateDelta::new();
        if let (Value::Known(planned), Value::Known(current)) = (&plan.vpc_config, &state.vpc_config) {
            if planned.security_group_ids.is_null() && !current.security_group_ids.is_null() {
                delta.delete(FleetAttribute::VpcConfigurationSecurityGroupIds);
            }
        }
        let mut input = UpdateFleetInput {
            name: name.to_string(),
            display_name: delta.field(&plan.display_name, &state.display_name, Some(FleetAttribute::DisplayName)),
            description: delta.field(&plan.description, &state.description, Some(FleetAttribute::Description)),
            image_name: delta.field(&plan.image_name, &state.image_name, None),
            image_arn: delta.field(&plan.image_arn, &state.image_arn, None),
            instance_type: delta.field(&plan.instance_type, &state.instance_type, None),
            compute_capacity: delta.field_with(
                &plan.compute_capacity,
                &state.compute_capacity,
                None,
                ComputeCapacityModel::expand,
            ),
            max_user_duration_in_seconds: delta.field(
                &plan.max_user_duration_in_seconds,
                &state.max_user_duration_in_seconds,
                None,
            ),
            disconnect_timeout_in_seconds: delta.field(
                &plan.disconnect_timeout_in_seconds,
                &state.disconnect_timeout_in_seconds,
                None,
            ),
            idle_disconnect_timeout_in_seconds: delta.field(
                &plan.idle_disconnect_timeout_in_seconds,
                &state.idle_disconnect_timeout_in_seconds,
                None,
            ),
            vpc_config: delta.field_with(
                &plan.vpc_config,
                &state.vpc_config,
                Some(FleetAttribute::VpcConfiguration),
                VpcConfigModel::expand,
            ),
            enable_default_internet_access: delta.field(
                &plan.enable_default_internet_access,
                &state.enable_default_internet_access,
                None,
            ),
            domain_join_info: delta.field_with(
                &plan.domain_join_info,
                &state.domain_join_info,
                Some(FleetAttribute::DomainJoinInfo),
                DomainJoinInfoModel::expand,
            ),
            iam_role_arn: delta.field(&plan.iam_role_arn, &state.iam_role_arn, Some(FleetAttribute::IamRoleArn)),
            stream_view: delta.field(&plan.stream_view, &state.stream_view, None),
            platform: delta.field(&plan.platform, &state.platform, None),
            max_concurrent_sessions: delta.field(&plan.max_concurrent_sessions, &state.max_concurrent_sessions, None),
            usb_device_filter_strings: delta.field_with(
                &plan.usb_device_filter_strings,
                &state.usb_device_filter_strings,
                Some(FleetAttribute::UsbDeviceFilterStrings),
                |set| set.iter().cloned().collect(),
            ),
            session_script_s3_location: delta.field_with(
                &plan.session_script_s3_location,
                &state.session_script_s3_location,
                Some(FleetAttribute::SessionScriptS3Location),
                S3LocationModel::expand,
            ),
            max_sessions_per_instance: delta.field(
                &plan.max_sessions_per_instance,
                &state.max_sessions_per_instance,
                Some(FleetAttribute::MaxSessionsPerInstance),
            ),
            root_volume_config: delta.field_with(
                &plan.root_volume_config,
                &state.root_volume_config,
                None,
                VolumeConfigModel::expand,
            ),
            attributes_to_delete: Vec::new(),
        };

        if !delta.is_empty() {
            input.attributes_to_delete = delta.into_deletions();

            let mut restart = false;
            if needs_stop(state, plan) {
                let Some(current) = ctx.call(clients.api.describe_fleet(name)).await.or_gone()? else {
                    return Ok(None);
                };
                if matches!(current.state, FleetState::Running | FleetState::Starting) {
                    info!(fleet = name, "Stopping fleet to apply update");
                    stop_fleet(clients, ctx, name).await?;
                    restart = true;
                }
            }

            let updated = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "update_fleet", || {
                let input = input.clone();
                async move { clients.api.update_fleet(input).await.map_err(Error::from) }
            })
            .await;

            // A fleet stopped here is started again even when the update failed.
            if restart && !matches!(&updated, Err(err) if err.is_not_found()) {
                record(
                    diags,
                    format!("Error restarting fleet {name}"),
                    start_fleet(clients, ctx, name).await,
                );
            }

            let Some(updated) = updated.map(Some).or_gone()? else {
                return Ok(None);
            };
            warn_entity_errors(diags, "Fleet", name, updated.fleet_errors.as_ref());
        }

        if let Some(arn) = state.arn.as_known() {
            apply_tags(clients, ctx, arn, &plan.tags).await?;
        }

        self.read(clients, ctx, plan, diags).await
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &FleetModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let Some(name) = state_key(diags, "name", &state.name) else {
            return Ok(());
        };
        let Some(fleet) = ctx.call(clients.api.describe_fleet(name)).await.or_gone()? else {
            return Ok(());
        };

        match fleet.state {
            FleetState::Stopped => {},
            FleetState::Stopping => wait_for_state(clients, ctx, name, FleetState::Stopped).await?,
            FleetState::Running | FleetState::Starting => stop_fleet(clients, ctx, name).await?,
        }

        retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "delete_fleet", || async move {
            clients.api.delete_fleet(name).await.map_err(Error::from)
        })
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<FleetModel> {
        let name = import_name(diags, id, "fleet name")?;
        Some(FleetModel {
            id: Value::known(name.clone()),
            name: Value::known(name),
            ..Default::default()
        })
    }
}

/// Fleet lookup by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetDataSource;

#[async_trait]
impl DataSource for FleetDataSource {
    type State = FleetModel;

    const TYPE_NAME: &'static str = "appstream_fleet";

    fn schema(&self) -> Schema {
        let computed_block = |block: Block| NestedBlock::single(block).computed();
        let mut schema = Schema::v0().with_attribute("name", Attribute::required_string());
        for name in [
            "id",
            "display_name",
            "description",
            "image_name",
            "image_arn",
            "instance_type",
            "fleet_type",
            "iam_role_arn",
            "stream_view",
            "platform",
            "arn",
            "created_time",
            "state",
        ] {
            schema = schema.with_attribute(name, Attribute::computed_string());
        }
        for name in [
            "max_user_duration_in_seconds",
            "disconnect_timeout_in_seconds",
            "idle_disconnect_timeout_in_seconds",
            "max_concurrent_sessions",
            "max_sessions_per_instance",
        ] {
            schema = schema.with_attribute(name, Attribute::computed_int32());
        }
        schema
            .with_attribute(
                "enable_default_internet_access",
                Attribute::new(AttributeType::Bool, AttributeFlags::computed()),
            )
            .with_attribute("usb_device_filter_strings", Attribute::string_set(AttributeFlags::computed()))
            .with_attribute("tags", Attribute::string_map(AttributeFlags::computed()))
            .with_attribute("tags_all", Attribute::string_map(AttributeFlags::computed()))
            .with_attribute("fleet_errors", EntityErrorModel::attribute())
            .with_block("compute_capacity", computed_block(ComputeCapacityModel::block()))
            .with_block("vpc_config", computed_block(VpcConfigModel::block()))
            .with_block("domain_join_info", computed_block(DomainJoinInfoModel::block()))
            .with_block("session_script_s3_location", computed_block(S3LocationModel::block()))
            .with_block("root_volume_config", computed_block(VolumeConfigModel::block()))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        config: &FleetModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<FleetModel>, Error> {
        let Some(name) = plan_key(diags, "name", &config.name) else {
            return Ok(None);
        };
        let Some(fleet) = ctx.call(clients.api.describe_fleet(name)).await.or_gone()? else {
            diags.attribute_error("name", "Fleet not found", format!("no fleet named {name}"));
            return Ok(None);
        };

        let tags = clients.tags.read(ctx, &fleet.arn).await?;
        let tags = TagState {
            tags: Value::known(tags.clone()),
            tags_all: Value::known(tags),
        };
        Ok(Some(FleetModel::flatten(ReadRule::DataSource, &FleetModel::default(), fleet, tags)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value as Json};

    use super::super::fixtures::{clients, create, created, errors, read, update};
    use super::super::{DynDataSource, DynResource};
    use super::*;
    use crate::context::RequestContext;
    use crate::testing::{fake_arn, Call, FakeAppStream, CREATED_TIME};
    use pretty_assertions::assert_eq;

    fn config() -> Json {
        json!({
            "name": "f1",
            "image_name": "AppStream-WinServer2019",
            "instance_type": "stream.standard.small",
            "compute_capacity": {"desired_instances": 2},
        })
    }

    fn fleet_updates(calls: Vec<Call>) -> Vec<UpdateFleetInput> {
        calls
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateFleet(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    fn mutations(fake: &FakeAppStream) -> Vec<&'static str> {
        fake.mutations().iter().map(Call::operation).collect()
    }

    #[tokio::test]
    async fn test_create_starts_fleet_and_waits_for_running() {
        let (fake, clients) = clients();
        let state = created(&FleetResource, &clients, config()).await;

        assert_eq!(state["id"], json!("f1"));
        assert_eq!(state["state"], json!("RUNNING"));
        assert_eq!(state["arn"], json!(fake_arn("fleet", "f1")));
        assert_eq!(state["created_time"], json!(CREATED_TIME));
        assert_eq!(state["compute_capacity"]["desired_instances"], json!(2));
        assert_eq!(state["compute_capacity"]["desired_sessions"], Json::Null);
        assert_eq!(state["compute_capacity"]["running"], json!(2));
        assert_eq!(state["fleet_type"], json!("ON_DEMAND"));
        assert_eq!(state["enable_default_internet_access"], json!(false));
        assert_eq!(state["idle_disconnect_timeout_in_seconds"], Json::Null);

        assert_eq!(mutations(&fake), vec!["create_fleet", "start_fleet"]);
        let polls = fake.calls_matching(|c| matches!(c, Call::DescribeFleet { .. }));
        assert!(polls.len() >= 2);
    }

    #[tokio::test]
    async fn test_unchanged_plan_issues_no_mutation() {
        let (fake, clients) = clients();
        let state = created(&FleetResource, &clients, config()).await;
        fake.clear_calls();

        let response = update(&FleetResource, &clients, state.clone(), config()).await;
        assert!(errors(&response.diagnostics).is_empty());
        assert_eq!(mutations(&fake), Vec::<&str>::new());
        assert_eq!(response.state, Some(state));
    }

    #[tokio::test]
    async fn test_stop_only_attribute_cycles_running_fleet() {
        let (fake, clients) = clients();
        let state = created(&FleetResource, &clients, config()).await;
        fake.clear_calls();

        let mut planned = config();
        planned["instance_type"] = json!("stream.standard.medium");
        let response = update(&FleetResource, &clients, state, planned).await;
        assert!(errors(&response.diagnostics).is_empty());

        assert_eq!(mutations(&fake), vec!["stop_fleet", "update_fleet", "start_fleet"]);
        let state = response.state.unwrap_or_default();
        assert_eq!(state["instance_type"], json!("stream.standard.medium"));
        assert_eq!(state["state"], json!("RUNNING"));
    }

    #[tokio::test]
    async fn test_running_update_without_stop() {
        let (fake, clients) = clients();
        let mut planned = config();
        planned["description"] = json!("v1");
        let state = created(&FleetResource, &clients, planned.clone()).await;
        fake.clear_calls();

        planned["description"] = Json::Null;
        planned["compute_capacity"] = json!({"desired_instances": 3});
        let response = update(&FleetResource, &clients, state, planned).await;
        assert!(errors(&response.diagnostics).is_empty());

        let updates = fleet_updates(fake.calls());
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].attributes_to_delete, vec![FleetAttribute::Description]);
        assert_eq!(updates[0].compute_capacity.as_ref().and_then(|c| c.desired_instances), Some(3));
        assert_eq!(updates[0].instance_type, None);
        assert_eq!(mutations(&fake), vec!["update_fleet"]);
    }

    #[tokio::test]
    async fn test_dropping_security_groups_sends_element_token() {
        let (fake, clients) = clients();
        let mut planned = config();
        planned["vpc_config"] = json!({"subnet_ids": ["subnet-a"], "security_group_ids": ["sg-1"]});
        let state = created(&FleetResource, &clients, planned.clone()).await;
        fake.clear_calls();

        planned["vpc_config"] = json!({"subnet_ids": ["subnet-a"]});
        let response = update(&FleetResource, &clients, state, planned).await;
        assert!(errors(&response.diagnostics).is_empty());

        let updates = fleet_updates(fake.calls());
        assert_eq!(updates.len(), 1);
        assert_eq!(
            updates[0].attributes_to_delete,
            vec![FleetAttribute::VpcConfigurationSecurityGroupIds]
        );
        let vpc = fake.fleet("f1").and_then(|f| f.vpc_config).unwrap_or_default();
        assert_eq!(vpc.security_group_ids, None);
    }

    #[tokio::test]
    async fn test_delete_stops_running_fleet_first() {
        let (fake, clients) = clients();
        let state = created(&FleetResource, &clients, config()).await;
        fake.clear_calls();

        let diags = DynResource::delete(&FleetResource, &clients, &RequestContext::new(), state).await;
        assert!(errors(&diags).is_empty());
        assert_eq!(mutations(&fake), vec!["stop_fleet", "delete_fleet"]);
        assert!(fake.fleet("f1").is_none());
    }

    #[tokio::test]
    async fn test_delete_of_vanished_fleet_succeeds() {
        let (fake, clients) = clients();
        let state = created(&FleetResource, &clients, config()).await;
        fake.edit(|s| s.fleets.remove("f1"));

        let diags = DynResource::delete(&FleetResource, &clients, &RequestContext::new(), state).await;
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn test_failed_start_is_recorded_and_state_kept() {
        let (fake, clients) = clients();
        fake.fail_next("start_fleet", ApiError::new("InvalidRoleException", "role cannot be assumed"));

        let response = create(&FleetResource, &clients, config()).await;
        let errors = errors(&response.diagnostics);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Error starting fleet f1"));
        let state = response.state.unwrap_or_default();
        assert_eq!(state["state"], json!("STOPPED"));
    }

    #[test]
    fn test_validation() {
        let cases = [
            (json!({"name": "f1", "instance_type": "t", "compute_capacity": {"desired_instances": 1}}), "image_name"),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i", "image_arn": "arn:aws:appstream:us-east-1::image/i",
                    "compute_capacity": {"desired_instances": 1}}),
                "image_name",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_arn": "arn:aws:ec2:us-east-1::image/i",
                    "compute_capacity": {"desired_instances": 1}}),
                "image_arn",
            ),
            (json!({"name": "f1", "instance_type": "t", "image_name": "i"}), "compute_capacity"),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i",
                    "compute_capacity": {"desired_instances": 1, "desired_sessions": 2}, "max_sessions_per_instance": 2}),
                "compute_capacity.desired_instances",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i",
                    "compute_capacity": {"desired_sessions": 2}}),
                "compute_capacity.desired_sessions",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i",
                    "compute_capacity": {"desired_instances": 1}, "max_user_duration_in_seconds": 601}),
                "max_user_duration_in_seconds",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i",
                    "compute_capacity": {"desired_instances": 1}, "max_concurrent_sessions": 5}),
                "max_concurrent_sessions",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i", "fleet_type": "ELASTIC"}),
                "vpc_config",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i", "fleet_type": "ELASTIC",
                    "vpc_config": {"subnet_ids": ["a"]}}),
                "vpc_config.subnet_ids",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i", "fleet_type": "ELASTIC",
                    "vpc_config": {"subnet_ids": ["a", "b"]}, "compute_capacity": {"desired_instances": 1}}),
                "compute_capacity",
            ),
            (
                json!({"name": "f1", "instance_type": "t", "image_name": "i", "fleet_type": "SPOT",
                    "compute_capacity": {"desired_instances": 1}}),
                "fleet_type",
            ),
        ];
        for (config, path) in cases {
            let diags = DynResource::validate(&FleetResource, &config);
            let paths: Vec<&str> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
            assert_eq!(paths, vec![path], "config: {config}");
        }

        let elastic = json!({
            "name": "f1",
            "instance_type": "stream.standard.small",
            "image_arn": "arn:aws:appstream:us-east-1::image/i",
            "fleet_type": "ELASTIC",
            "max_concurrent_sessions": 10,
            "vpc_config": {"subnet_ids": ["a", "b"]},
            "idle_disconnect_timeout_in_seconds": 0,
        });
        assert!(DynResource::validate(&FleetResource, &elastic).is_empty());

        let multi_session = json!({
            "name": "f1",
            "instance_type": "stream.standard.small",
            "image_name": "i",
            "compute_capacity": {"desired_sessions": 4},
            "max_sessions_per_instance": 2,
        });
        assert!(DynResource::validate(&FleetResource, &multi_session).is_empty());
    }

    #[tokio::test]
    async fn test_import_then_read() {
        let (_fake, clients) = clients();
        created(&FleetResource, &clients, config()).await;

        let imported = DynResource::import(&FleetResource, "f1");
        assert!(!imported.has_error());
        let seed = imported.resources[0].state.clone();
        let state = read(&FleetResource, &clients, seed).await.state.unwrap_or_default();
        assert_eq!(state["instance_type"], json!("stream.standard.small"));
        assert_eq!(state["compute_capacity"]["desired_instances"], json!(2));
        assert_eq!(state["max_user_duration_in_seconds"], json!(57600));
        assert_eq!(state["stream_view"], json!("APP"));
    }

    #[tokio::test]
    async fn test_data_source_projects_everything() {
        let (fake, clients) = clients();
        let mut planned = config();
        planned["tags"] = json!({"team": "streaming"});
        created(&FleetResource, &clients, planned).await;
        fake.clear_calls();

        let response = DynDataSource::read(&FleetDataSource, &clients, &RequestContext::new(), json!({"name": "f1"})).await;
        assert!(response.diagnostics.is_empty());
        let state = response.state.unwrap_or_default();
        assert_eq!(state["image_name"], json!("AppStream-WinServer2019"));
        assert_eq!(state["platform"], json!("WINDOWS_SERVER_2019"));
        assert_eq!(state["state"], json!("RUNNING"));
        assert_eq!(state["tags"], json!({"team": "streaming"}));
        assert_eq!(mutations(&fake), Vec::<&str>::new());

        let missing =
            DynDataSource::read(&FleetDataSource, &clients, &RequestContext::new(), json!({"name": "nope"})).await;
        assert_eq!(missing.state, None);
        assert_eq!(errors(&missing.diagnostics).len(), 1);
    }
}
