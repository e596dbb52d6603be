//! `appstream_directory_config`: Active Directory settings for domain-joined
//! fleets and image builders.
//!
//! The service account credentials are write-only. The remote never returns
//! the password, so state always holds them as null and the planner leaves
//! them out of the diff. They are sent on create, and again on any update that
//! changes another attribute.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::shapes::{
    expand_object, expand_strings, CertificateBasedAuthModel, ServiceAccountCredentialsModel, CERTIFICATE_STATUSES,
};
use super::{import_name, plan_key, read_rule, same_identity, state_key, Clients, OrGone, Resource};
use crate::api::model::DirectoryConfigInput;
use crate::api::Error;
use crate::context::RequestContext;
use crate::delta::UpdateDelta;
use crate::diagnostics::Diagnostics;
use crate::retry::{is_conflict, retry};
use crate::schema::{Attribute, AttributeFlags, NestedBlock, Schema};
use crate::validators::{check, ArnValidator, NonEmpty, OneOf};
use crate::value::{SetValue, StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// State of a directory config. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct DirectoryConfigModel {
    /// The directory name.
    pub id: StringValue,
    pub directory_name: StringValue,
    pub organizational_unit_distinguished_names: SetValue<String>,
    pub service_account_credentials: Value<ServiceAccountCredentialsModel>,
    pub certificate_based_auth_properties: Value<CertificateBasedAuthModel>,
    pub created_time: StringValue,
}

/// Directory config adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryConfigResource;

#[async_trait]
impl Resource for DirectoryConfigResource {
    type State = DirectoryConfigModel;

    const TYPE_NAME: &'static str = "appstream_directory_config";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("directory_name", Attribute::required_string().with_force_new())
            .with_attribute(
                "organizational_unit_distinguished_names",
                Attribute::string_set(AttributeFlags::required()),
            )
            .with_attribute("service_account_credentials", ServiceAccountCredentialsModel::attribute())
            .with_attribute("created_time", Attribute::computed_string())
            .with_block(
                "certificate_based_auth_properties",
                NestedBlock::single(CertificateBasedAuthModel::block()).with_max_items(1),
            )
    }

    fn validate(&self, config: &DirectoryConfigModel, diags: &mut Diagnostics) {
        check(
            diags,
            "organizational_unit_distinguished_names",
            &config.organizational_unit_distinguished_names,
            &NonEmpty,
        );
        if let Value::Known(auth) = &config.certificate_based_auth_properties {
            check(
                diags,
                "certificate_based_auth_properties.status",
                &auth.status,
                &OneOf(CERTIFICATE_STATUSES),
            );
            check(
                diags,
                "certificate_based_auth_properties.certificate_authority_arn",
                &auth.certificate_authority_arn,
                &ArnValidator::service("acm-pca"),
            );
        }
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &DirectoryConfigModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<DirectoryConfigModel>, Error> {
        let Some(name) = plan_key(diags, "directory_name", &plan.directory_name) else {
            return Ok(None);
        };

        let input = DirectoryConfigInput {
            directory_name: name.to_string(),
            organizational_unit_distinguished_names: expand_strings(&plan.organizational_unit_distinguished_names),
            service_account_credentials: plan
                .service_account_credentials
                .as_known()
                .and_then(ServiceAccountCredentialsModel::expand),
            certificate_based_auth_properties: expand_object(
                &plan.certificate_based_auth_properties,
                CertificateBasedAuthModel::expand,
            ),
        };

        let config = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "create_directory_config", || {
            let input = input.clone();
            async move { clients.api.create_directory_config(input).await.map_err(Error::from) }
        })
        .await?;

        Ok(Some(DirectoryConfigModel {
            id: Value::known(config.directory_name),
            ..plan.clone()
        }))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &DirectoryConfigModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<DirectoryConfigModel>, Error> {
        let Some(name) = state_key(diags, "directory_name", &prior.directory_name) else {
            return Ok(None);
        };
        let Some(config) = ctx.call(clients.api.describe_directory_config(name)).await.or_gone()? else {
            return Ok(None);
        };

        let rule = read_rule(&prior.created_time);
        Ok(Some(DirectoryConfigModel {
            id: Value::known(config.directory_name.clone()),
            directory_name: Value::known(config.directory_name),
            organizational_unit_distinguished_names: Value::read(
                rule,
                &prior.organizational_unit_distinguished_names,
                config.organizational_unit_distinguished_names.as_ref(),
            ),
            service_account_credentials: Value::Null,
            certificate_based_auth_properties: Value::read(
                rule,
                &prior.certificate_based_auth_properties,
                config.certificate_based_auth_properties.as_ref(),
            ),
            created_time: Value::computed(config.created_time.as_ref()),
        }))
    }

    async fn update(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &DirectoryConfigModel,
        plan: &DirectoryConfigModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<DirectoryConfigModel>, Error> {
        let Some(name) = state_key(diags, "directory_name", &state.directory_name) else {
            return Ok(None);
        };
        if !same_identity(diags, "directory_name", &state.directory_name, &plan.directory_name) {
            return Ok(None);
        }

        let mut delta = UpdateDelta::<()>::new();
        let input = DirectoryConfigInput {
            directory_name: name.to_string(),
            organizational_unit_distinguished_names: delta.field_with(
                &plan.organizational_unit_distinguished_names,
                &state.organizational_unit_distinguished_names,
                None,
                |set| set.iter().cloned().collect(),
            ),
            service_account_credentials: plan
                .service_account_credentials
                .as_known()
                .and_then(ServiceAccountCredentialsModel::expand),
            certificate_based_auth_properties: delta.field_with(
                &plan.certificate_based_auth_properties,
                &state.certificate_based_auth_properties,
                None,
                CertificateBasedAuthModel::expand,
            ),
        };

        if !delta.is_empty() {
            let updated = retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "update_directory_config", || {
                let input = input.clone();
                async move { clients.api.update_directory_config(input).await.map_err(Error::from) }
            })
            .await
            .map(Some)
            .or_gone()?;
            if updated.is_none() {
                return Ok(None);
            }
        }

        self.read(clients, ctx, plan, diags).await
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &DirectoryConfigModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let Some(name) = state_key(diags, "directory_name", &state.directory_name) else {
            return Ok(());
        };
        retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "delete_directory_config", || async move {
            clients.api.delete_directory_config(name).await.map_err(Error::from)
        })
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<DirectoryConfigModel> {
        let name = import_name(diags, id, "directory name")?;
        Some(DirectoryConfigModel {
            id: Value::known(name.clone()),
            directory_name: Value::known(name),
            ..Default::default()
        })
    }
}
