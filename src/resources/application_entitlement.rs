//! `appstream_application_entitlement_association`: an application granted
//! through a stack entitlement.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{id_segment, import_composite, name_validator, plan_key, state_key, Clients, OrGone, Resource};
use crate::api::{find_in_pages, Error};
use crate::context::RequestContext;
use crate::diagnostics::Diagnostics;
use crate::id;
use crate::retry::{is_conflict, retry};
use crate::schema::{Attribute, Schema};
use crate::validators::check;
use crate::value::{StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(60);

/// State of an application/entitlement association. Fields are the schema
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ApplicationEntitlementModel {
    /// `<stack>|<entitlement>|<application>`.
    pub id: StringValue,
    pub stack_name: StringValue,
    pub entitlement_name: StringValue,
    pub application_identifier: StringValue,
}

impl ApplicationEntitlementModel {
    fn new(stack: &str, entitlement: &str, application: &str) -> Self {
        Self {
            id: Value::known(id::build(&[stack, entitlement, application])),
            stack_name: Value::known(stack.to_string()),
            entitlement_name: Value::known(entitlement.to_string()),
            application_identifier: Value::known(application.to_string()),
        }
    }

    fn keys<'a>(
        &'a self,
        diags: &mut Diagnostics,
        key: fn(&mut Diagnostics, &str, &'a StringValue) -> Option<&'a str>,
    ) -> Option<(&'a str, &'a str, &'a str)> {
        Some((
            key(diags, "stack_name", &self.stack_name)?,
            key(diags, "entitlement_name", &self.entitlement_name)?,
            key(diags, "application_identifier", &self.application_identifier)?,
        ))
    }
}

/// Application/entitlement association adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationEntitlementResource;

#[async_trait]
impl Resource for ApplicationEntitlementResource {
    type State = ApplicationEntitlementModel;

    const TYPE_NAME: &'static str = "appstream_application_entitlement_association";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("stack_name", Attribute::required_string().with_force_new())
            .with_attribute("entitlement_name", Attribute::required_string().with_force_new())
            .with_attribute("application_identifier", Attribute::required_string().with_force_new())
    }

    fn validate(&self, config: &ApplicationEntitlementModel, diags: &mut Diagnostics) {
        check(diags, "stack_name", &config.stack_name, &name_validator());
        check(diags, "entitlement_name", &config.entitlement_name, &name_validator());
        check(diags, "application_identifier", &config.application_identifier, &id_segment());
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &ApplicationEntitlementModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationEntitlementModel>, Error> {
        let Some((stack, entitlement, application)) = plan.keys(diags, plan_key) else {
            return Ok(None);
        };

        retry(
            ctx,
            &clients.policy(TIMEOUT),
            &[is_conflict],
            "associate_application_to_entitlement",
            || async move {
                clients
                    .api
                    .associate_application_to_entitlement(stack, entitlement, application)
                    .await
                    .map_err(Error::from)
            },
        )
        .await?;

        Ok(Some(ApplicationEntitlementModel::new(stack, entitlement, application)))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &ApplicationEntitlementModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationEntitlementModel>, Error> {
        let Some((stack, entitlement, application)) = prior.keys(diags, state_key) else {
            return Ok(None);
        };

        let found = find_in_pages(
            ctx,
            |token| clients.api.list_entitled_applications(stack, entitlement, token),
            |a| a.application_identifier == application,
        )
        .await
        .or_gone()?;
        Ok(found.map(|_| ApplicationEntitlementModel::new(stack, entitlement, application)))
    }

    async fn update(
        &self,
        _clients: &Clients,
        _ctx: &RequestContext,
        _state: &ApplicationEntitlementModel,
        plan: &ApplicationEntitlementModel,
        _diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationEntitlementModel>, Error> {
        Ok(Some(plan.clone()))
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &ApplicationEntitlementModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let Some((stack, entitlement, application)) = state.keys(diags, state_key) else {
            return Ok(());
        };
        retry(
            ctx,
            &clients.policy(TIMEOUT),
            &[is_conflict],
            "disassociate_application_from_entitlement",
            || async move {
                clients
                    .api
                    .disassociate_application_from_entitlement(stack, entitlement, application)
                    .await
                    .map_err(Error::from)
            },
        )
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<ApplicationEntitlementModel> {
        let [stack, entitlement, application] = import_composite(
            diags,
            id,
            ["stack_name", "entitlement_name", "application_identifier"],
        )?;
        Some(ApplicationEntitlementModel::new(&stack, &entitlement, &application))
    }
}
