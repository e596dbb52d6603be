//! `appstream_app_block`: application packaging in S3.
//!
//! The remote has no update call for application blocks. Every body
//! attribute forces replacement; update only reconciles tags.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::shapes::{expand_object, flatten_errors, EntityErrorModel, S3LocationModel, ScriptDetailsModel};
use super::{
    apply_tags, import_arn, name_validator, plan_key, read_rule, record, same_identity, state_key,
    warn_entity_errors, Clients, OrGone, Resource,
};
use crate::api::model::CreateAppBlockInput;
use crate::api::Error;
use crate::context::RequestContext;
use crate::diagnostics::Diagnostics;
use crate::retry::{is_conflict, retry};
use crate::schema::{Attribute, NestedBlock, Schema};
use crate::validators::{check, conflicts, presence, required, OneOf, StepValidator};
use crate::value::{MapValue, SetValue, StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(2 * 60);

const PACKAGING_TYPES: &[&str] = &["CUSTOM", "APPSTREAM2"];

/// State of an application block. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct AppBlockModel {
    /// The block ARN.
    pub id: StringValue,
    pub name: StringValue,
    pub display_name: StringValue,
    pub description: StringValue,
    pub source_s3_location: Value<S3LocationModel>,
    pub setup_script_details: Value<ScriptDetailsModel>,
    pub post_setup_script_details: Value<ScriptDetailsModel>,
    pub packaging_type: StringValue,
    pub state: StringValue,
    pub tags: MapValue<String>,
    pub tags_all: MapValue<String>,
    pub arn: StringValue,
    pub created_time: StringValue,
    pub app_block_errors: SetValue<EntityErrorModel>,
}

/// Application block adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppBlockResource;

fn validate_script(diags: &mut Diagnostics, path: &str, script: &Value<ScriptDetailsModel>) {
    if let Value::Known(script) = script {
        check(
            diags,
            &format!("{path}.timeout_in_seconds"),
            &script.timeout_in_seconds,
            &StepValidator::at_least(1),
        );
    }
}

#[async_trait]
impl Resource for AppBlockResource {
    type State = AppBlockModel;

    const TYPE_NAME: &'static str = "appstream_app_block";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("display_name", Attribute::optional_string().with_force_new())
            .with_attribute("description", Attribute::optional_string().with_force_new())
            .with_attribute("packaging_type", Attribute::optional_computed_string().with_force_new())
            .with_attribute("state", Attribute::computed_string())
            .with_attribute("arn", Attribute::computed_string())
            .with_attribute("created_time", Attribute::computed_string())
            .with_attribute("app_block_errors", EntityErrorModel::attribute())
            .with_block(
                "source_s3_location",
                NestedBlock::single(S3LocationModel::block())
                    .with_min_items(1)
                    .with_force_new(),
            )
            .with_block(
                "setup_script_details",
                NestedBlock::single(ScriptDetailsModel::block()).with_force_new(),
            )
            .with_block(
                "post_setup_script_details",
                NestedBlock::single(ScriptDetailsModel::block()).with_force_new(),
            )
            .with_tags()
    }

    fn validate(&self, config: &AppBlockModel, diags: &mut Diagnostics) {
        check(diags, "name", &config.name, &name_validator());
        check(diags, "packaging_type", &config.packaging_type, &OneOf(PACKAGING_TYPES));
        validate_script(diags, "setup_script_details", &config.setup_script_details);
        validate_script(diags, "post_setup_script_details", &config.post_setup_script_details);

        // The remote packages as CUSTOM when no type is given.
        let packaging = match &config.packaging_type {
            Value::Known(packaging) => Some(packaging.as_str()),
            Value::Null => Some("CUSTOM"),
            Value::Unknown => None,
        };
        match packaging {
            Some("CUSTOM") => {
                let reason = "packaging_type is CUSTOM";
                required(diags, "setup_script_details", presence(&config.setup_script_details), reason);
                conflicts(
                    diags,
                    "post_setup_script_details",
                    presence(&config.post_setup_script_details),
                    reason,
                );
                if let Value::Known(source) = &config.source_s3_location {
                    required(diags, "source_s3_location.s3_key", presence(&source.s3_key), reason);
                }
            },
            Some("APPSTREAM2") => {
                conflicts(
                    diags,
                    "setup_script_details",
                    presence(&config.setup_script_details),
                    "packaging_type is APPSTREAM2",
                );
            },
            _ => {},
        }
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &AppBlockModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<AppBlockModel>, Error> {
        let Some(name) = plan_key(diags, "name", &plan.name) else {
            return Ok(None);
        };

        let input = CreateAppBlockInput {
            name: name.to_string(),
            display_name: plan.display_name.known_cloned(),
            description: plan.description.known_cloned(),
            source_s3_location: expand_object(&plan.source_s3_location, S3LocationModel::expand).unwrap_or_default(),
            setup_script_details: expand_object(&plan.setup_script_details, ScriptDetailsModel::expand),
            post_setup_script_details: expand_object(&plan.post_setup_script_details, ScriptDetailsModel::expand),
            packaging_type: plan.packaging_type.known_cloned(),
        };

        let block = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "create_app_block", || {
            let input = input.clone();
            async move { clients.api.create_app_block(input).await.map_err(Error::from) }
        })
        .await?;

        warn_entity_errors(diags, "Application block", name, block.app_block_errors.as_ref());
        record(
            diags,
            format!("Error tagging application block {name}"),
            apply_tags(clients, ctx, &block.arn, &plan.tags).await,
        );

        Ok(Some(AppBlockModel {
            id: Value::known(block.arn.clone()),
            arn: Value::known(block.arn),
            ..plan.clone()
        }))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &AppBlockModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<AppBlockModel>, Error> {
        let Some(arn) = state_key(diags, "id", &prior.id) else {
            return Ok(None);
        };
        let Some(block) = ctx.call(clients.api.describe_app_block(arn)).await.or_gone()? else {
            return Ok(None);
        };

        let rule = read_rule(&prior.created_time);
        let tags = clients.tags.read_state(ctx, &block.arn, &prior.tags).await?;

        Ok(Some(AppBlockModel {
            id: Value::known(block.arn.clone()),
            name: Value::known(block.name),
            display_name: Value::read(rule, &prior.display_name, block.display_name.as_ref()),
            description: Value::read(rule, &prior.description, block.description.as_ref()),
            source_s3_location: Value::read(rule, &prior.source_s3_location, block.source_s3_location.as_ref()),
            setup_script_details: Value::read(
                rule,
                &prior.setup_script_details,
                block.setup_script_details.as_ref(),
            ),
            post_setup_script_details: Value::read(
                rule,
                &prior.post_setup_script_details,
                block.post_setup_script_details.as_ref(),
            ),
            packaging_type: Value::computed_optional(&prior.packaging_type, block.packaging_type.as_ref()),
            state: Value::computed(block.state.as_ref()),
            tags: tags.tags,
            tags_all: tags.tags_all,
            arn: Value::known(block.arn),
            created_time: Value::computed(block.created_time.as_ref()),
            app_block_errors: flatten_errors(block.app_block_errors.as_ref()),
        }))
    }

    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &AppBlockModel,
        plan: &AppBlockModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<AppBlockModel>, Error> {
        let Some(arn) = state_key(diags, "id", &state.id) else {
            return Ok(None);
        };
        if !same_identity(diags, "name", &state.name, &plan.name) {
            return Ok(None);
        }
        apply_tags(clients, ctx, arn, &plan.tags).await?;
        self.read(clients, ctx, plan, diags).await
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &AppBlockModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let Some(name) = state_key(diags, "name", &state.name) else {
            return Ok(());
        };
        retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "delete_app_block", || async move {
            clients.api.delete_app_block(name).await.map_err(Error::from)
        })
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<AppBlockModel> {
        let name = import_arn(diags, id, "appstream", "app-block/")?;
        Some(AppBlockModel {
            id: Value::known(id.to_string()),
            name: Value::known(name),
            arn: Value::known(id.to_string()),
            ..Default::default()
        })
    }
}
