//! `appstream_fleet_stack_association`: a fleet serving a stack.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{import_composite, name_validator, plan_key, state_key, Clients, OrGone, Resource};
use crate::api::{find_in_pages, Error};
use crate::context::RequestContext;
use crate::diagnostics::Diagnostics;
use crate::id;
use crate::retry::{is_conflict, retry};
use crate::schema::{Attribute, Schema};
use crate::validators::check;
use crate::value::{StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(60);

/// State of a fleet/stack association. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct FleetStackModel {
    /// `<fleet>|<stack>`.
    pub id: StringValue,
    pub fleet_name: StringValue,
    pub stack_name: StringValue,
}

impl FleetStackModel {
    fn new(fleet: &str, stack: &str) -> Self {
        Self {
            id: Value::known(id::build(&[fleet, stack])),
            fleet_name: Value::known(fleet.to_string()),
            stack_name: Value::known(stack.to_string()),
        }
    }
}

/// Fleet/stack association adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetStackResource;

#[async_trait]
impl Resource for FleetStackResource {
    type State = FleetStackModel;

    const TYPE_NAME: &'static str = "appstream_fleet_stack_association";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("fleet_name", Attribute::required_string().with_force_new())
            .with_attribute("stack_name", Attribute::required_string().with_force_new())
    }

    fn validate(&self, config: &FleetStackModel, diags: &mut Diagnostics) {
        check(diags, "fleet_name", &config.fleet_name, &name_validator());
        check(diags, "stack_name", &config.stack_name, &name_validator());
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &FleetStackModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<FleetStackModel>, Error> {
        let (Some(fleet), Some(stack)) = (
            plan_key(diags, "fleet_name", &plan.fleet_name),
            plan_key(diags, "stack_name", &plan.stack_name),
        ) else {
            return Ok(None);
        };

        retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "associate_fleet", || async move {
            clients.api.associate_fleet(fleet, stack).await.map_err(Error::from)
        })
        .await?;

        Ok(Some(FleetStackModel::new(fleet, stack)))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &FleetStackModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<FleetStackModel>, Error> {
        let (Some(fleet), Some(stack)) = (
            state_key(diags, "fleet_name", &prior.fleet_name),
            state_key(diags, "stack_name", &prior.stack_name),
        ) else {
            return Ok(None);
        };

        let found = find_in_pages(
            ctx,
            |token| clients.api.list_associated_stacks(fleet, token),
            |name| name == stack,
        )
        .await
        .or_gone()?;
        Ok(found.map(|_| FleetStackModel::new(fleet, stack)))
    }

    async fn update(
        &self,
        _clients: &Clients,
        _ctx: &RequestContext,
        _state: &FleetStackModel,
        plan: &FleetStackModel,
        _diags: &mut Diagnostics,
    ) -> Result<Option<FleetStackModel>, Error> {
        Ok(Some(plan.clone()))
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &FleetStackModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let (Some(fleet), Some(stack)) = (
            state_key(diags, "fleet_name", &state.fleet_name),
            state_key(diags, "stack_name", &state.stack_name),
        ) else {
            return Ok(());
        };
        retry(ctx, &clients.policy(TIMEOUT), &[is_conflict], "disassociate_fleet", || async move {
            clients.api.disassociate_fleet(fleet, stack).await.map_err(Error::from)
        })
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<FleetStackModel> {
        let [fleet, stack] = import_composite(diags, id, ["fleet_name", "stack_name"])?;
        Some(FleetStackModel::new(&fleet, &stack))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::fixtures::{clients, create, created, errors, read};
    use super::super::DynResource;
    use super::*;
    use crate::api::model::{Fleet, Stack};
    use crate::context::RequestContext;
    use crate::testing::{fake_arn, FakeAppStream};
    use pretty_assertions::assert_eq;

    fn seed(fake: &FakeAppStream) {
        fake.edit(|s| {
            s.fleets.insert(
                "fleetA".to_string(),
                Fleet {
                    name: "fleetA".to_string(),
                    arn: fake_arn("fleet", "fleetA"),
                    ..Default::default()
                },
            );
            s.stacks.insert(
                "stackB".to_string(),
                Stack {
                    name: "stackB".to_string(),
                    arn: fake_arn("stack", "stackB"),
                    ..Default::default()
                },
            );
        });
    }

    #[tokio::test]
    async fn test_create_read_delete() {
        let (fake, clients) = clients();
        seed(&fake);

        let state = created(
            &FleetStackResource,
            &clients,
            json!({"fleet_name": "fleetA", "stack_name": "stackB"}),
        )
        .await;
        assert_eq!(state["id"], json!("fleetA|stackB"));

        let response = read(&FleetStackResource, &clients, state.clone()).await;
        assert_eq!(response.state, Some(state.clone()));

        let diags = DynResource::delete(&FleetStackResource, &clients, &RequestContext::new(), state.clone()).await;
        assert!(errors(&diags).is_empty());
        assert_eq!(read(&FleetStackResource, &clients, state).await.state, None);
    }

    #[tokio::test]
    async fn test_missing_fleet_fails_create_and_drops_on_read() {
        let (fake, clients) = clients();
        let response = create(
            &FleetStackResource,
            &clients,
            json!({"fleet_name": "fleetA", "stack_name": "stackB"}),
        )
        .await;
        assert_eq!(response.state, None);
        assert_eq!(errors(&response.diagnostics).len(), 1);

        seed(&fake);
        let state = created(
            &FleetStackResource,
            &clients,
            json!({"fleet_name": "fleetA", "stack_name": "stackB"}),
        )
        .await;
        fake.edit(|s| s.fleets.clear());
        let response = read(&FleetStackResource, &clients, state).await;
        assert_eq!(response.state, None);
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_read_follows_pagination() {
        let (fake, clients) = clients();
        seed(&fake);
        fake.set_page_size(1);
        fake.edit(|s| {
            for stack in ["a0", "a1", "a2"] {
                s.fleet_stacks.insert(("fleetA".to_string(), stack.to_string()));
            }
        });
        let state = created(
            &FleetStackResource,
            &clients,
            json!({"fleet_name": "fleetA", "stack_name": "stackB"}),
        )
        .await;
        assert_eq!(state["stack_name"], json!("stackB"));
    }

    #[test]
    fn test_import_composite_id() {
        let imported = DynResource::import(&FleetStackResource, "fleetA|stackB");
        assert!(!imported.has_error());
        assert_eq!(
            imported.resources[0].state,
            json!({"id": "fleetA|stackB", "fleet_name": "fleetA", "stack_name": "stackB"})
        );

        let rejected = DynResource::import(&FleetStackResource, "fleetA|");
        assert!(rejected.has_error());
        assert!(rejected.resources.is_empty());
        let summaries: Vec<&str> = rejected.diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Unexpected Import Identifier"]);
    }
}
