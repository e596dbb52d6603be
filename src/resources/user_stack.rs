//! `appstream_user_stack_association`: a user entitled to a stack.
//!
//! The batch calls succeed at the transport level and report failures per
//! item. Codes that mean a dependency has not propagated yet become
//! [`Error::NotReady`] so the retry loop waits them out; any other code fails
//! the operation as is.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{id_segment, import_composite, name_validator, plan_key, state_key, Clients, OrGone, Resource};
use crate::api::model::{UserStackAssociation, UserStackAssociationError};
use crate::api::{codes, find_in_pages, ApiError, Error};
use crate::context::RequestContext;
use crate::diagnostics::Diagnostics;
use crate::id;
use crate::retry::{is_transient, retry};
use crate::schema::{Attribute, Schema};
use crate::validators::{check, OneOf};
use crate::value::{BoolValue, StringValue, Value};

const TIMEOUT: Duration = Duration::from_secs(4 * 60);

const AUTHENTICATION_TYPES: &[&str] = &["API", "SAML", "USERPOOL", "AWS_AD"];

/// Per-item codes worth waiting out.
const PENDING_CODES: &[&str] = &[
    codes::STACK_NOT_FOUND,
    codes::USER_NAME_NOT_FOUND,
    codes::DIRECTORY_NOT_FOUND,
    codes::INTERNAL_ERROR,
];

/// State of a user/stack association. Fields are the schema attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct UserStackModel {
    /// `<stack>|<authentication_type>|<user>`.
    pub id: StringValue,
    pub stack_name: StringValue,
    pub user_name: StringValue,
    pub authentication_type: StringValue,
    pub send_email_notification: BoolValue,
}

/// Outcome of a batch call for a single association.
///
/// The first error outside [`PENDING_CODES`] fails the call. The call is
/// retried only when every item is pending.
fn batch_outcome(errors: Vec<UserStackAssociationError>) -> Result<(), Error> {
    let mut pending = None;
    for error in errors {
        let message = error.error_message.unwrap_or_else(|| error.error_code.clone());
        if !PENDING_CODES.contains(&error.error_code.as_str()) {
            return Err(ApiError::new(error.error_code, message).into());
        }
        pending.get_or_insert(Error::not_ready(error.error_code, message));
    }
    match pending {
        Some(err) => {
            debug!(code = err.code().unwrap_or_default(), "User stack association pending");
            Err(err)
        },
        None => Ok(()),
    }
}

type KeyGuard = for<'a> fn(&mut Diagnostics, &str, &'a StringValue) -> Option<&'a str>;

/// Key parts of a record, if all are known.
fn keys<'a>(diags: &mut Diagnostics, model: &'a UserStackModel, key: KeyGuard) -> Option<(&'a str, &'a str, &'a str)> {
    Some((
        key(diags, "stack_name", &model.stack_name)?,
        key(diags, "authentication_type", &model.authentication_type)?,
        key(diags, "user_name", &model.user_name)?,
    ))
}

/// User/stack association adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserStackResource;

#[async_trait]
impl Resource for UserStackResource {
    type State = UserStackModel;

    const TYPE_NAME: &'static str = "appstream_user_stack_association";

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("stack_name", Attribute::required_string().with_force_new())
            .with_attribute("user_name", Attribute::required_string().with_force_new().sensitive())
            .with_attribute("authentication_type", Attribute::required_string().with_force_new())
            .with_attribute(
                "send_email_notification",
                Attribute::optional_computed_bool().with_force_new(),
            )
    }

    fn validate(&self, config: &UserStackModel, diags: &mut Diagnostics) {
        check(diags, "stack_name", &config.stack_name, &name_validator());
        check(diags, "user_name", &config.user_name, &id_segment());
        check(
            diags,
            "authentication_type",
            &config.authentication_type,
            &OneOf(AUTHENTICATION_TYPES),
        );
    }

    async fn create(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        plan: &UserStackModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<UserStackModel>, Error> {
        let Some((stack, auth, user)) = keys(diags, plan, plan_key) else {
            return Ok(None);
        };

        let association = UserStackAssociation {
            stack_name: stack.to_string(),
            user_name: user.to_string(),
            authentication_type: auth.to_string(),
            send_email_notification: plan.send_email_notification.known_cloned(),
        };
        retry(ctx, &clients.policy(TIMEOUT), &[is_transient], "batch_associate_user_stack", || {
            let batch = vec![association.clone()];
            async move { batch_outcome(clients.api.batch_associate_user_stack(batch).await?) }
        })
        .await?;

        Ok(Some(UserStackModel {
            id: Value::known(id::build(&[stack, auth, user])),
            ..plan.clone()
        }))
    }

    async fn read(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        prior: &UserStackModel,
        diags: &mut Diagnostics,
    ) -> Result<Option<UserStackModel>, Error> {
        let Some((stack, auth, user)) = keys(diags, prior, state_key) else {
            return Ok(None);
        };

        let found = find_in_pages(
            ctx,
            |token| {
                clients
                    .api
                    .describe_user_stack_associations(Some(stack), Some(user), Some(auth), token)
            },
            |a| a.stack_name == stack && a.user_name == user && a.authentication_type == auth,
        )
        .await
        .or_gone()?;
        let Some(association) = found else {
            return Ok(None);
        };

        Ok(Some(UserStackModel {
            id: Value::known(id::build(&[stack, auth, user])),
            stack_name: Value::known(association.stack_name),
            user_name: Value::known(association.user_name),
            authentication_type: Value::known(association.authentication_type),
            send_email_notification: Value::computed_optional(
                &prior.send_email_notification,
                association.send_email_notification.as_ref(),
            ),
        }))
    }

    async fn update(
        &self,
        _clients: &Clients,
        _ctx: &RequestContext,
        _state: &UserStackModel,
        plan: &UserStackModel,
        _diags: &mut Diagnostics,
    ) -> Result<Option<UserStackModel>, Error> {
        Ok(Some(plan.clone()))
    }

    async fn delete(
        &self,
        clients: &Clients,
        ctx: &RequestContext,
        state: &UserStackModel,
        diags: &mut Diagnostics,
    ) -> Result<(), Error> {
        let Some((stack, auth, user)) = keys(diags, state, state_key) else {
            return Ok(());
        };

        let association = UserStackAssociation {
            stack_name: stack.to_string(),
            user_name: user.to_string(),
            authentication_type: auth.to_string(),
            send_email_notification: None,
        };
        retry(ctx, &clients.policy(TIMEOUT), &[is_transient], "batch_disassociate_user_stack", || {
            let batch = vec![association.clone()];
            async move {
                let errors = clients.api.batch_disassociate_user_stack(batch).await?;
                // The stack or user is already gone, and the association with it.
                let gone = [codes::STACK_NOT_FOUND, codes::USER_NAME_NOT_FOUND];
                batch_outcome(errors.into_iter().filter(|e| !gone.contains(&e.error_code.as_str())).collect())
            }
        })
        .await
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<UserStackModel> {
        let [stack, auth, user] = import_composite(diags, id, ["stack_name", "authentication_type", "user_name"])?;
        Some(UserStackModel {
            id: Value::known(id.to_string()),
            stack_name: Value::known(stack),
            user_name: Value::known(user),
            authentication_type: Value::known(auth),
            send_email_notification: Value::Null,
        })
    }
}
