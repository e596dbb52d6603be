//! `appstream_stack`: a streaming stack and its user-facing settings.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::shapes::{
    expand_object, expand_set, expand_strings, flatten_errors, AccessEndpointModel, ApplicationSettingsModel,
    EntityErrorModel, StorageConnectorModel, StreamingExperienceSettingsModel, UserSettingModel, CLIPBOARD_ACTIONS,
    CONNECTOR_TYPES, PERMISSIONS, USER_SETTING_ACTIONS,
};
use super::{
    apply_tags, import_name, name_validator, plan_key, read_rule, record, same_identity, state_key,
    warn_entity_errors, Clients, OrGone, Resource,
};
use crate::api::model::{CreateStackInput, StackAttribute, UpdateStackInput};
use crate::api::Error;
use crate::context::RequestContext;
use crate::delta::UpdateDelta;
use crate::diagnostics::Diagnostics;
use crate::retry::{is_conflict, retry};
use crate::schema::{Attribute, AttributeFlags, NestedBlock, Schema};
use crate::validators::{check, conflicts, presence, required, OneOf, StepValidator};
use crate::value::{MapValue, SetValue, StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(4 * 60);

/// State of a stack. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct StackModel {
    /// The stack name.
    pub id: StringValue,
    pub name: StringValue,
    pub display_name: StringValue,
    pub description: StringValue,
    pub storage_connectors: SetValue<StorageConnectorModel>,
    pub redirect_url: StringValue,
    pub feedback_url: StringValue,
    pub user_settings: SetValue<UserSettingModel>,
    pub application_settings: Value<ApplicationSettingsModel>,
    pub access_endpoints: SetValue<AccessEndpointModel>,
    pub embed_host_domains: SetValue<String>,
    pub streaming_experience_settings: Value<StreamingExperienceSettingsModel>,
    pub tags: MapValue<String>,
    pub tags_all: MapValue<String>,
    pub arn: StringValue,
    pub created_time: StringValue,
    pub stack_errors: SetValue<EntityErrorModel>,
}

/// Stack adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackResource;

#[async_trait]
impl Resource for StackResource {
    type State = StackModel;

    const TYPE_NAME: &'static str = "appstream_stack";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("display_name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("redirect_url", Attribute::optional_string())
            .with_attribute("feedback_url", Attribute::optional_string())
            .with_attribute("embed_host_domains", Attribute::string_set(AttributeFlags::optional()))
            .with_attribute("arn", Attribute::computed_string())
            .with_attribute("created_time", Attribute::computed_string())
            .with_attribute("stack_errors", EntityErrorModel::attribute())
            .with_block("storage_connectors", NestedBlock::set(StorageConnectorModel::block()))
            .with_block("user_settings", NestedBlock::set(UserSettingModel::block()))
            .with_block(
                "application_settings",
                NestedBlock::single(ApplicationSettingsModel::block()).with_max_items(1),
            )
            .with_block("access_endpoints", NestedBlock::set(AccessEndpointModel::block()))
            .with_block(
                "streaming_experience_settings",
                NestedBlock::single(StreamingExperienceSettingsModel::block()).with_max_items(1),
            )
            .with_tags()
    }

    fn validate(&self, config: &StackModel, diags: &mut Diagnostics) {
        check(diags, "name", &config.name, &name_validator());

        for connector in config.storage_connectors.as_known().into_iter().flatten() {
            let path = "storage_connectors.connector_type";
            check(diags, path, &connector.connector_type, &OneOf(CONNECTOR_TYPES));
            if connector.connector_type.as_known().is_some_and(|t| t != "ONE_DRIVE") {
                conflicts(
                    diags,
                    "storage_connectors.domains_require_admin_consent",
                    presence(&connector.domains_require_admin_consent),
                    "connector_type is not ONE_DRIVE",
                );
            }
        }

        for setting in config.user_settings.as_known().into_iter().flatten() {
            check(diags, "user_settings.action", &setting.action, &OneOf(USER_SETTING_ACTIONS));
            check(diags, "user_settings.permission", &setting.permission, &OneOf(PERMISSIONS));
            check(
                diags,
                "user_settings.maximum_length",
                &setting.maximum_length,
                &StepValidator::range(1, 20_971_520),
            );
            let clipboard = setting.action.as_known().map(|a| CLIPBOARD_ACTIONS.contains(&a.as_str()));
            let enabled = setting.permission.as_known().map(|p| p == "ENABLED");
            if clipboard == Some(false) || enabled == Some(false) {
                conflicts(
                    diags,
                    "user_settings.maximum_length",
                    presence(&setting.maximum_length),
                    "the action is not a clipboard action with permission ENABLED",
                );
            }
        }

        if let Value::Known(settings) = &config.application_settings {
            if settings.enabled.as_known() == Some(&true) {
                required(
                    diags,
                    "application_settings.settings_group",
                    presence(&settings.settings_group),
                    "application_settings.enabled is true",
                );
            }
        }

        if let Value::Known(streaming) = &config.streaming_experience_settings {
            check(
                diags,
                "streaming_experience_settings.preferred_protocol",
                &streaming.preferred_protocol,
                &OneOf(&["TCP", "UDP"]),
            );
        }

        for endpoint in config.access_endpoints.as_known().into_iter().flatten() {
            check(diags, "access_endpoints.endpoint_type", &endpoint.endpoint_type, &OneOf(&["STREAMING"]));
        }
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &StackModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<StackModel>, Error> {
        let Some(name) = plan_key(diags, "name", &plan.name) else {
            return Ok(None);
        };

        let input = CreateStackInput {
            name: name.to_string(),
            display_name: plan.display_name.known_cloned(),
            description: plan.description.known_cloned(),
            storage_connectors: expand_set(&plan.storage_connectors, StorageConnectorModel::expand),
            redirect_url: plan.redirect_url.known_cloned(),
            feedback_url: plan.feedback_url.known_cloned(),
            user_settings: expand_set(&plan.user_settings, UserSettingModel::expand),
            application_settings: expand_object(&plan.application_settings, ApplicationSettingsModel::expand),
            access_endpoints: expand_set(&plan.access_endpoints, AccessEndpointModel::expand),
            embed_host_domains: expand_strings(&plan.embed_host_domains),
            streaming_experience_settings: expand_object(
                &plan.streaming_experience_settings,
                StreamingExperienceSettingsModel::expand,
            ),
        };

        let stack = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "create_stack", || {
            let input = input.clone();
            async move { clients.api.create_stack(input).await.map_err(Error::from) }
        })
        .await?;

        warn_entity_errors(diags, "Stack", name, stack.stack_errors.as_ref());
        record(
            diags,
            format!("Error tagging stack {name}"),
            apply_tags(clients, ctx, &stack.arn, &plan.tags).await,
        );

        Ok(Some(StackModel {
            id: Value::known(stack.name),
            arn: Value::known(stack.arn),
            ..plan.clone()
        }))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &StackModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<StackModel>, Error> {
        let Some(name) = state_key(diags, "name", &prior.name) else {
            return Ok(None);
        };
        let Some(stack) = ctx.call(clients.api.describe_stack(name)).await.or_gone()? else {
            return Ok(None);
        };

        let rule = read_rule(&prior.created_time);
        let tags = clients.tags.read_state(ctx, &stack.arn, &prior.tags).await?;

        Ok(Some(StackModel {
            id: Value::known(stack.name.clone()),
            name: Value::known(stack.name.clone()),
            display_name: Value::read(rule, &prior.display_name, stack.display_name.as_ref()),
            description: Value::read(rule, &prior.description, stack.description.as_ref()),
            storage_connectors: StorageConnectorModel::read_set(
                rule,
                &prior.storage_connectors,
                stack.storage_connectors.as_deref(),
            ),
            redirect_url: Value::read(rule, &prior.redirect_url, stack.redirect_url.as_ref()),
            feedback_url: Value::read(rule, &prior.feedback_url, stack.feedback_url.as_ref()),
            user_settings: UserSettingModel::read_set(rule, &prior.user_settings, stack.user_settings.as_deref()),
            application_settings: Value::read(
                rule,
                &prior.application_settings,
                stack.application_settings.as_ref(),
            ),
            access_endpoints: AccessEndpointModel::read_set(
                rule,
                &prior.access_endpoints,
                stack.access_endpoints.as_deref(),
            ),
            embed_host_domains: Value::read(rule, &prior.embed_host_domains, stack.embed_host_domains.as_ref()),
            streaming_experience_settings: Value::read(
                rule,
                &prior.streaming_experience_settings,
                stack.streaming_experience_settings.as_ref(),
            ),
            tags: tags.tags,
            tags_all: tags.tags_all,
            arn: Value::known(stack.arn),
            created_time: Value::computed(stack.created_time.as_ref()),
            stack_errors: flatten_errors(stack.stack_errors.as_ref()),
        }))
    }

    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &StackModel,
        plan: &StackModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<StackModel>, Error> {
        let Some(name) = state_key(diags, "name", &state.name) else {
            return Ok(None);
        };
        if !same_identity(diags, "name", &state.name, &plan.name) {
            return Ok(None);
        }

        let mut delta = UpdateDelta::new();
        delta.removed_elements(
            &plan.storage_connectors,
            &state.storage_connectors,
            |c| c.connector_type.known_cloned(),
            |t| StackAttribute::for_connector(t),
        );
        let mut input = UpdateStackInput {
            name: name.to_string(),
            display_name: delta.field(&plan.display_name, &state.display_name, Some(StackAttribute::DisplayName)),
            description: delta.field(&plan.description, &state.description, Some(StackAttribute::Description)),
            storage_connectors: delta.field_with(
                &plan.storage_connectors,
                &state.storage_connectors,
                Some(StackAttribute::StorageConnectors),
                |set| set.iter().map(StorageConnectorModel::expand).collect(),
            ),
            redirect_url: delta.field(&plan.redirect_url, &state.redirect_url, Some(StackAttribute::RedirectUrl)),
            feedback_url: delta.field(&plan.feedback_url, &state.feedback_url, Some(StackAttribute::FeedbackUrl)),
            user_settings: delta.field_with(
                &plan.user_settings,
                &state.user_settings,
                Some(StackAttribute::UserSettings),
                |set| set.iter().map(UserSettingModel::expand).collect(),
            ),
            application_settings: delta.field_with(
                &plan.application_settings,
                &state.application_settings,
                None,
                ApplicationSettingsModel::expand,
            ),
            access_endpoints: delta.field_with(
                &plan.access_endpoints,
                &state.access_endpoints,
                Some(StackAttribute::AccessEndpoints),
                |set| set.iter().map(AccessEndpointModel::expand).collect(),
            ),
            embed_host_domains: delta.field_with(
                &plan.embed_host_domains,
                &state.embed_host_domains,
                Some(StackAttribute::EmbedHostDomains),
                |set| set.iter().cloned().collect(),
            ),
            streaming_experience_settings: delta.field_with(
                &plan.streaming_experience_settings,
                &state.streaming_experience_settings,
                Some(StackAttribute::StreamingExperienceSettings),
                StreamingExperienceSettingsModel::expand,
            ),
            attributes_to_delete: Vec::new(),
        };

        if !delta.is_empty() {
            input.attributes_to_delete = delta.into_deletions();
            let updated = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "update_stack", || {
                let input = input.clone();
                async move { clients.api.update_stack(input).await.map_err(Error::from) }
            })
            .await
            .map(Some)
            .or_gone()?;
            let Some(updated) = updated else {
                return Ok(None);
            };
            warn_entity_errors(diags, "Stack", name, updated.stack_errors.as_ref());
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
        state: &StackModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let Some(name) = state_key(diags, "name", &state.name) else {
            return Ok(());
        };
        retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "delete_stack", || async move {
            clients.api.delete_stack(name).await.map_err(Error::from)
        })
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<StackModel> {
        let name = import_name(diags, id, "stack name")?;
        Some(StackModel {
            id: Value::known(name.clone()),
            name: Value::known(name),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value as Json};

    use super::super::fixtures::{cancelled, clients, create, created, delete, errors, read, update};
    use super::super::DynResource;
    use super::*;
    use crate::api::{codes, ApiError};
    use crate::testing::{fake_arn, Call, CREATED_TIME};
    use pretty_assertions::assert_eq;

    fn stack_updates(calls: Vec<Call>) -> Vec<UpdateStackInput> {
        calls
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateStack(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_create_rehydrates_from_remote() {
        let (_fake, clients) = clients();
        let state = created(
            &StackResource,
            &clients,
            json!({"name": "s1", "redirect_url": "https://x/logout"}),
        )
        .await;

        assert_eq!(state["id"], json!("s1"));
        assert_eq!(state["name"], json!("s1"));
        assert_eq!(state["redirect_url"], json!("https://x/logout"));
        assert_eq!(state["arn"], json!(fake_arn("stack", "s1")));
        assert_eq!(state["created_time"], json!(CREATED_TIME));
        assert_eq!(state["display_name"], Json::Null);
        assert_eq!(state["tags_all"], json!({}));
    }

    #[tokio::test]
    async fn test_read_keeps_unmanaged_attributes_null() {
        let (fake, clients) = clients();
        let state = created(&StackResource, &clients, json!({"name": "s1"})).await;

        fake.edit(|s| {
            if let Some(stack) = s.stacks.get_mut("s1") {
                stack.display_name = Some("Auto".to_string());
            }
        });

        let response = read(&StackResource, &clients, state.clone()).await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(response.state, Some(state));
    }

    #[tokio::test]
    async fn test_clearing_attribute_sends_deletion_token() {
        let (fake, clients) = clients();
        let state = created(&StackResource, &clients, json!({"name": "s1", "description": "v1"})).await;
        fake.clear_calls();

        let response = update(&StackResource, &clients, state, json!({"name": "s1"})).await;
        assert!(errors(&response.diagnostics).is_empty());

        let updates = stack_updates(fake.calls());
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].attributes_to_delete, vec![StackAttribute::Description]);
        assert_eq!(updates[0].description, None);

        let state = response.state.unwrap_or_default();
        assert_eq!(state["description"], Json::Null);
        assert_eq!(fake.stack("s1").and_then(|s| s.description), None);
    }

    #[tokio::test]
    async fn test_external_deletion_drops_state() {
        let (fake, clients) = clients();
        let state = created(&StackResource, &clients, json!({"name": "s1"})).await;
        fake.edit(|s| s.stacks.remove("s1"));

        let response = read(&StackResource, &clients, state).await;
        assert_eq!(response.state, None);
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_removed_stack_succeeds() {
        let (fake, clients) = clients();
        let state = created(&StackResource, &clients, json!({"name": "s1"})).await;
        fake.edit(|s| s.stacks.remove("s1"));

        let diags = delete(&StackResource, &clients, state).await;
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(fake.mutations().last().map(Call::operation), Some("delete_stack"));
    }

    #[tokio::test]
    async fn test_cancelled_context_is_silent() {
        let (fake, clients) = clients();
        let ctx = cancelled();

        let planned = DynResource::plan(&StackResource, None, json!({"name": "s1"}), &json!({"name": "s1"})).planned_state;
        let response = DynResource::create(&StackResource, &clients, &ctx, planned).await;
        assert_eq!(response.state, None);
        assert!(response.diagnostics.is_empty());
        assert!(fake.stack("s1").is_none());

        let state = created(&StackResource, &clients, json!({"name": "s1"})).await;
        fake.clear_calls();

        let response = DynResource::read(&StackResource, &clients, &ctx, state.clone()).await;
        assert_eq!(response.state, Some(state.clone()));
        assert!(response.diagnostics.is_empty());

        let diags = DynResource::delete(&StackResource, &clients, &ctx, state).await;
        assert!(diags.is_empty());
        assert!(fake.stack("s1").is_some());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_required_nested_field_is_rejected_before_create() {
        let (fake, clients) = clients();
        let planned = json!({
            "name": "s1",
            "storage_connectors": [{"connector_type": crate::value::UNKNOWN_VALUE}],
        });

        let response = DynResource::create(&StackResource, &clients, &RequestContext::new(), planned).await;
        assert_eq!(response.state, None);
        let paths: Vec<_> = response.diagnostics.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(paths, vec!["storage_connectors.0.connector_type"]);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_already_exists_suggests_import() {
        let (fake, clients) = clients();
        fake.fail_next(
            "create_stack",
            ApiError::new(codes::RESOURCE_ALREADY_EXISTS, "Stack s1 already exists"),
        );

        let response = create(&StackResource, &clients, json!({"name": "s1"})).await;
        assert_eq!(response.state, None);
        let errors = errors(&response.diagnostics);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Stack s1 already exists"));
        assert!(errors[0].contains("terraform import"));
    }

    #[tokio::test]
    async fn test_unchanged_plan_issues_no_mutation() {
        let (fake, clients) = clients();
        let config = json!({
            "name": "s1",
            "description": "streaming",
            "storage_connectors": [{"connector_type": "HOMEFOLDERS"}],
            "user_settings": [
                {"action": "CLIPBOARD_COPY_FROM_LOCAL_DEVICE", "permission": "ENABLED", "maximum_length": 100},
                {"action": "FILE_UPLOAD", "permission": "DISABLED"},
            ],
            "application_settings": {"enabled": true, "settings_group": "grp"},
            "tags": {"env": "dev"},
        });
        let state = created(&StackResource, &clients, config.clone()).await;
        fake.clear_calls();

        let response = update(&StackResource, &clients, state.clone(), config).await;
        assert!(errors(&response.diagnostics).is_empty());
        assert_eq!(fake.mutations(), vec![]);
        assert_eq!(response.state, Some(state));
    }

    #[tokio::test]
    async fn test_dropped_connector_sends_its_token() {
        let (fake, clients) = clients();
        let state = created(
            &StackResource,
            &clients,
            json!({
                "name": "s1",
                "storage_connectors": [
                    {"connector_type": "HOMEFOLDERS"},
                    {"connector_type": "ONE_DRIVE", "domains": ["example.com"]},
                ],
            }),
        )
        .await;
        fake.clear_calls();

        let response = update(
            &StackResource,
            &clients,
            state,
            json!({"name": "s1", "storage_connectors": [{"connector_type": "HOMEFOLDERS"}]}),
        )
        .await;
        assert!(errors(&response.diagnostics).is_empty());

        let updates = stack_updates(fake.calls());
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].attributes_to_delete, vec![StackAttribute::StorageConnectorOneDrive]);

        let connectors = fake.stack("s1").and_then(|s| s.storage_connectors).unwrap_or_default();
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].connector_type, "HOMEFOLDERS");
    }

    #[tokio::test]
    async fn test_tag_change_reconciles_tags_only() {
        let (fake, clients) = clients();
        let state = created(&StackResource, &clients, json!({"name": "s1", "tags": {"env": "dev"}})).await;
        fake.clear_calls();

        let response = update(&StackResource, &clients, state, json!({"name": "s1", "tags": {"env": "prod"}})).await;
        assert!(errors(&response.diagnostics).is_empty());
        assert!(stack_updates(fake.calls()).is_empty());

        let state = response.state.unwrap_or_default();
        assert_eq!(state["tags"], json!({"env": "prod"}));
        assert_eq!(state["tags_all"], json!({"env": "prod"}));
        assert_eq!(fake.tags_of(&fake_arn("stack", "s1")).get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_validation() {
        let cases = [
            (json!({"name": "-bad"}), "name"),
            (
                json!({"name": "s1", "storage_connectors": [{"connector_type": "DROPBOX"}]}),
                "storage_connectors.connector_type",
            ),
            (
                json!({"name": "s1", "storage_connectors": [
                    {"connector_type": "HOMEFOLDERS", "domains_require_admin_consent": ["example.com"]}
                ]}),
                "storage_connectors.domains_require_admin_consent",
            ),
            (
                json!({"name": "s1", "user_settings": [
                    {"action": "FILE_UPLOAD", "permission": "ENABLED", "maximum_length": 10}
                ]}),
                "user_settings.maximum_length",
            ),
            (
                json!({"name": "s1", "user_settings": [
                    {"action": "CLIPBOARD_COPY_TO_LOCAL_DEVICE", "permission": "ENABLED", "maximum_length": 0}
                ]}),
                "user_settings.maximum_length",
            ),
            (
                json!({"name": "s1", "application_settings": {"enabled": true}}),
                "application_settings.settings_group",
            ),
            (
                json!({"name": "s1", "streaming_experience_settings": {"preferred_protocol": "QUIC"}}),
                "streaming_experience_settings.preferred_protocol",
            ),
        ];
        for (config, path) in cases {
            let diags = DynResource::validate(&StackResource, &config);
            let paths: Vec<&str> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
            assert_eq!(paths, vec![path], "config: {config}");
        }

        let ok = json!({
            "name": "s1",
            "storage_connectors": [{"connector_type": "ONE_DRIVE", "domains_require_admin_consent": ["example.com"]}],
            "user_settings": [{"action": "CLIPBOARD_COPY_TO_LOCAL_DEVICE", "permission": "ENABLED", "maximum_length": 10}],
        });
        assert!(DynResource::validate(&StackResource, &ok).is_empty());
    }

    #[tokio::test]
    async fn test_import_projects_everything_on_first_read() {
        let (_fake, clients) = clients();
        created(
            &StackResource,
            &clients,
            json!({"name": "s1", "display_name": "Stack One", "embed_host_domains": ["example.com"]}),
        )
        .await;

        let imported = DynResource::import(&StackResource, "s1");
        assert!(!imported.has_error());
        let seed = imported.resources[0].state.clone();
        assert_eq!(seed["id"], json!("s1"));
        assert_eq!(seed["created_time"], Json::Null);

        let state = read(&StackResource, &clients, seed).await.state.unwrap_or_default();
        assert_eq!(state["display_name"], json!("Stack One"));
        assert_eq!(state["embed_host_domains"], json!(["example.com"]));
        assert_eq!(state["created_time"], json!(CREATED_TIME));

        let rejected = DynResource::import(&StackResource, "s1|extra");
        assert!(rejected.has_error());
        assert!(rejected.resources.is_empty());
    }
}
