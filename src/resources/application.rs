//! `appstream_application`: an application launched from an app block.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::shapes::{expand_object, expand_strings, S3LocationModel, PLATFORMS};
use super::{
    apply_tags, import_arn, name_validator, plan_key, read_rule, record, same_identity, state_key, Clients, OrGone,
    Resource,
};
use crate::api::model::{ApplicationAttribute, CreateApplicationInput, UpdateApplicationInput};
use crate::api::Error;
use crate::context::RequestContext;
use crate::delta::UpdateDelta;
use crate::diagnostics::Diagnostics;
use crate::retry::{is_conflict, is_not_found, retry};
use crate::schema::{Attribute, AttributeFlags, NestedBlock, Schema};
use crate::validators::{check, check_each, ArnValidator, NonEmpty, OneOf};
use crate::value::{MapValue, SetValue, StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// State of an application. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ApplicationModel {
    /// The application ARN.
    pub id: StringValue,
    pub name: StringValue,
    pub display_name: StringValue,
    pub description: StringValue,
    pub icon_s3_location: Value<S3LocationModel>,
    pub launch_path: StringValue,
    pub working_directory: StringValue,
    pub launch_parameters: StringValue,
    pub platforms: SetValue<String>,
    pub instance_families: SetValue<String>,
    pub app_block_arn: StringValue,
    pub tags: MapValue<String>,
    pub tags_all: MapValue<String>,
    pub arn: StringValue,
    pub created_time: StringValue,
}

/// Application adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationResource;

#[async_trait]
impl Resource for ApplicationResource {
    type State = ApplicationModel;

    const TYPE_NAME: &'static str = "appstream_application";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("display_name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("launch_path", Attribute::required_string())
            .with_attribute("working_directory", Attribute::optional_string())
            .with_attribute("launch_parameters", Attribute::optional_string())
            .with_attribute(
                "platforms",
                Attribute::string_set(AttributeFlags::required()).with_force_new(),
            )
            .with_attribute(
                "instance_families",
                Attribute::string_set(AttributeFlags::required()).with_force_new(),
            )
            .with_attribute("app_block_arn", Attribute::required_string())
            .with_attribute("arn", Attribute::computed_string())
            .with_attribute("created_time", Attribute::computed_string())
            .with_block(
                "icon_s3_location",
                NestedBlock::single(S3LocationModel::block()).with_min_items(1),
            )
            .with_tags()
    }

    fn validate(&self, config: &ApplicationModel, diags: &mut Diagnostics) {
        check(diags, "name", &config.name, &name_validator());
        check(diags, "platforms", &config.platforms, &NonEmpty);
        check_each(diags, "platforms", &config.platforms, &OneOf(PLATFORMS));
        check(diags, "instance_families", &config.instance_families, &NonEmpty);
        check(
            diags,
            "app_block_arn",
            &config.app_block_arn,
            &ArnValidator::of("appstream", "app-block/"),
        );
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &ApplicationModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationModel>, Error> {
        let Some(name) = plan_key(diags, "name", &plan.name) else {
            return Ok(None);
        };
        let Some(app_block_arn) = plan_key(diags, "app_block_arn", &plan.app_block_arn) else {
            return Ok(None);
        };

        let input = CreateApplicationInput {
            name: name.to_string(),
            display_name: plan.display_name.known_cloned(),
            description: plan.description.known_cloned(),
            icon_s3_location: expand_object(&plan.icon_s3_location, S3LocationModel::expand).unwrap_or_default(),
            launch_path: plan.launch_path.known_cloned().unwrap_or_default(),
            working_directory: plan.working_directory.known_cloned(),
            launch_parameters: plan.launch_parameters.known_cloned(),
            platforms: expand_strings(&plan.platforms).unwrap_or_default(),
            instance_families: expand_strings(&plan.instance_families).unwrap_or_default(),
            app_block_arn: app_block_arn.to_string(),
        };

        // The app block may have been created in the same run.
        let app = retry(
            ctx,
            &clients.policy(TIMEOUT),
            &[is_conflict, is_not_found],
            "create_application",
            || {
                let input = input.clone();
                async move { clients.api.create_application(input).await.map_err(Error::from) }
            },
        )
        .await?;

        record(
            diags,
            format!("Error tagging application {name}"),
            apply_tags(clients, ctx, &app.arn, &plan.tags).await,
        );

        Ok(Some(ApplicationModel {
            id: Value::known(app.arn.clone()),
            arn: Value::known(app.arn),
            ..plan.clone()
        }))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &ApplicationModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationModel>, Error> {
        let Some(arn) = state_key(diags, "id", &prior.id) else {
            return Ok(None);
        };
        let Some(app) = ctx.call(clients.api.describe_application(arn)).await.or_gone()? else {
            return Ok(None);
        };

        let rule = read_rule(&prior.created_time);
        let tags = clients.tags.read_state(ctx, &app.arn, &prior.tags).await?;

        Ok(Some(ApplicationModel {
            id: Value::known(app.arn.clone()),
            name: Value::known(app.name),
            display_name: Value::read(rule, &prior.display_name, app.display_name.as_ref()),
            description: Value::read(rule, &prior.description, app.description.as_ref()),
            icon_s3_location: Value::read(rule, &prior.icon_s3_location, app.icon_s3_location.as_ref()),
            launch_path: Value::read(rule, &prior.launch_path, app.launch_path.as_ref()),
            working_directory: Value::read(rule, &prior.working_directory, app.working_directory.as_ref()),
            launch_parameters: Value::read(rule, &prior.launch_parameters, app.launch_parameters.as_ref()),
            platforms: Value::read(rule, &prior.platforms, app.platforms.as_ref()),
            instance_families: Value::read(rule, &prior.instance_families, app.instance_families.as_ref()),
            app_block_arn: Value::read(rule, &prior.app_block_arn, app.app_block_arn.as_ref()),
            tags: tags.tags,
            tags_all: tags.tags_all,
            arn: Value::known(app.arn),
            created_time: Value::computed(app.created_time.as_ref()),
        }))
    }

    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &ApplicationModel,
        plan: &ApplicationModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationModel>, Error> {
        let Some(arn) = state_key(diags, "id", &state.id) else {
            return Ok(None);
        };
        let Some(name) = state_key(diags, "name", &state.name) else {
            return Ok(None);
        };
        if !same_identity(diags, "name", &state.name, &plan.name) {
            return Ok(None);
        }

        let mut delta = UpdateDelta::new();
        let mut input = UpdateApplicationInput {
            name: name.to_string(),
            display_name: delta.field(
                &plan.display_name,
                &state.display_name,
                Some(ApplicationAttribute::DisplayName),
            ),
            description: delta.field(
                &plan.description,
                &state.description,
                Some(ApplicationAttribute::Description),
            ),
            icon_s3_location: delta.field_with(
                &plan.icon_s3_location,
                &state.icon_s3_location,
                None,
                S3LocationModel::expand,
            ),
            launch_path: delta.field(&plan.launch_path, &state.launch_path, None),
            working_directory: delta.field(
                &plan.working_directory,
                &state.working_directory,
                Some(ApplicationAttribute::WorkingDirectory),
            ),
            launch_parameters: delta.field(
                &plan.launch_parameters,
                &state.launch_parameters,
                Some(ApplicationAttribute::LaunchParameters),
            ),
            app_block_arn: delta.field(&plan.app_block_arn, &state.app_block_arn, None),
            attributes_to_delete: Vec::new(),
        };

        if !delta.is_empty() {
            input.attributes_to_delete = delta.into_deletions();
            let updated = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "update_application", || {
                let input = input.clone();
                async move { clients.api.update_application(input).await.map_err(Error::from) }
            })
            .await
            .map(Some)
            .or_gone()?;
            if updated.is_none() {
                return Ok(None);
            }
        }

        apply_tags(clients, ctx, arn, &plan.tags).await?;
        self.read(clients, ctx, plan, diags).await
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &ApplicationModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let Some(name) = state_key(diags, "name", &state.name) else {
            return Ok(());
        };
        retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "delete_application", || async move {
            clients.api.delete_application(name).await.map_err(Error::from)
        })
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<ApplicationModel> {
        let name = import_arn(diags, id, "appstream", "application/")?;
        Some(ApplicationModel {
            id: Value::known(id.to_string()),
            name: Value::known(name),
            arn: Value::known(id.to_string()),
            ..Default::default()
        })
    }
}
