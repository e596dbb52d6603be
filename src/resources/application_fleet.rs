//! `appstream_application_fleet_association`: an application installed on a
//! fleet.

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
use crate::validators::{check, ArnValidator};
use crate::value::{StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(60);

/// State of an application/fleet association. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ApplicationFleetModel {
    /// `<fleet>|<application_arn>`.
    pub id: StringValue,
    pub fleet_name: StringValue,
    pub application_arn: StringValue,
}

impl ApplicationFleetModel {
    fn new(fleet: &str, application_arn: &str) -> Self {
        Self {
            id: Value::known(id::build(&[fleet, application_arn])),
            fleet_name: Value::known(fleet.to_string()),
            application_arn: Value::known(application_arn.to_string()),
        }
    }
}

/// Application/fleet association adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationFleetResource;

#[async_trait]
impl Resource for ApplicationFleetResource {
    type State = ApplicationFleetModel;

    const TYPE_NAME: &'static str = "appstream_application_fleet_association";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("fleet_name", Attribute::required_string().with_force_new())
            .with_attribute("application_arn", Attribute::required_string().with_force_new())
    }

    fn validate(&self, config: &ApplicationFleetModel, diags: &mut Diagnostics) {
        check(diags, "fleet_name", &config.fleet_name, &name_validator());
        check(
            diags,
            "application_arn",
            &config.application_arn,
            &ArnValidator::of("appstream", "application/"),
        );
        check(diags, "application_arn", &config.application_arn, &id_segment());
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &ApplicationFleetModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationFleetModel>, Error> {
        let (Some(fleet), Some(arn)) = (
            plan_key(diags, "fleet_name", &plan.fleet_name),
            plan_key(diags, "application_arn", &plan.application_arn),
        ) else {
            return Ok(None);
        };

        let association = retry(
            ctx,
            &clients.policy(TIMEOUT),
            &[is_conflict],
            "associate_application_fleet",
            || async move { clients.api.associate_application_fleet(fleet, arn).await.map_err(Error::from) },
        )
        .await?;

        Ok(Some(ApplicationFleetModel::new(
            &association.fleet_name,
            &association.application_arn,
        )))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &ApplicationFleetModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationFleetModel>, Error> {
        let (Some(fleet), Some(arn)) = (
            state_key(diags, "fleet_name", &prior.fleet_name),
            state_key(diags, "application_arn", &prior.application_arn),
        ) else {
            return Ok(None);
        };

        let found = find_in_pages(
            ctx,
            |token| {
                clients
                    .api
                    .describe_application_fleet_associations(Some(fleet), Some(arn), token)
            },
            |a| a.fleet_name == fleet && a.application_arn == arn,
        )
        .await
        .or_gone()?;
        Ok(found.map(|a| ApplicationFleetModel::new(&a.fleet_name, &a.application_arn)))
    }

    async fn update(
        &self,
        _clients: &Clients,
        _ctx: &RequestContext,
        _state: &ApplicationFleetModel,
        plan: &ApplicationFleetModel,
        _diags: &mut Diagnostics,
    ) -> Result<Option<ApplicationFleetModel>, Error> {
        Ok(Some(plan.clone()))
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &ApplicationFleetModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let (Some(fleet), Some(arn)) = (
            state_key(diags, "fleet_name", &state.fleet_name),
            state_key(diags, "application_arn", &state.application_arn),
        ) else {
            return Ok(());
        };
        retry(
            ctx,
            &clients.policy(TIMEOUT),
            &[is_conflict],
            "disassociate_application_fleet",
            || async move { clients.api.disassociate_application_fleet(fleet, arn).await.map_err(Error::from) },
        )
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<ApplicationFleetModel> {
        let [fleet, arn] = import_composite(diags, id, ["fleet_name", "application_arn"])?;
        Some(ApplicationFleetModel::new(&fleet, &arn))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::fixtures::{clients, created, errors, read};
    use super::super::DynResource;
    use super::*;
    use crate::api::model::{Application, Fleet};
    use crate::api::{codes, ApiError};
    use crate::context::RequestContext;
    use crate::testing::{fake_arn, Call, FakeAppStream};
    use pretty_assertions::assert_eq;

    fn seed(fake: &FakeAppStream) -> String {
        let arn = fake_arn("application", "notepad");
        let application_arn = arn.clone();
        fake.edit(move |s| {
            s.fleets.insert(
                "f1".to_string(),
                Fleet {
                    name: "f1".to_string(),
                    arn: fake_arn("fleet", "f1"),
                    ..Default::default()
                },
            );
            s.applications.insert(
                "notepad".to_string(),
                Application {
                    name: "notepad".to_string(),
                    arn: application_arn,
                    ..Default::default()
                },
            );
        });
        arn
    }

    #[tokio::test]
    async fn test_create_read_delete() {
        let (fake, clients) = clients();
        let arn = seed(&fake);

        let state = created(
            &ApplicationFleetResource,
            &clients,
            json!({"fleet_name": "f1", "application_arn": arn}),
        )
        .await;
        assert_eq!(state["id"], json!(format!("f1|{arn}")));
        assert_eq!(read(&ApplicationFleetResource, &clients, state.clone()).await.state, Some(state.clone()));

        let diags =
            DynResource::delete(&ApplicationFleetResource, &clients, &RequestContext::new(), state.clone()).await;
        assert!(errors(&diags).is_empty());
        assert_eq!(read(&ApplicationFleetResource, &clients, state).await.state, None);
    }

    #[tokio::test]
    async fn test_conflict_is_retried() {
        let (fake, clients) = clients();
        let arn = seed(&fake);
        fake.fail_next(
            "associate_application_fleet",
            ApiError::new(codes::CONCURRENT_MODIFICATION, "fleet is updating"),
        );

        created(
            &ApplicationFleetResource,
            &clients,
            json!({"fleet_name": "f1", "application_arn": arn}),
        )
        .await;
        let attempts = fake.calls_matching(|c| matches!(c, Call::AssociateApplicationFleet { .. }));
        assert_eq!(attempts.len(), 2);
    }

    #[test]
    fn test_import_and_validation() {
        let arn = fake_arn("application", "notepad");
        let imported = DynResource::import(&ApplicationFleetResource, &format!("f1|{arn}"));
        assert!(!imported.has_error());
        assert_eq!(imported.resources[0].state["application_arn"], json!(arn));

        let diags = DynResource::validate(
            &ApplicationFleetResource,
            &json!({"fleet_name": "f1", "application_arn": fake_arn("fleet", "f1")}),
        );
        let paths: Vec<&str> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(paths, vec!["application_arn"]);
    }
}
