//! Remote streaming API seam.
//!
//! [`AppStreamApi`] is the set of remote operations the engine consumes.
//! Transport, signing and retries at the HTTP level belong to the
//! implementation; the engine only sees typed shapes and [`ApiError`]s.
//! Describe calls return `Ok(None)` when the service answers with an empty
//! result instead of a not-found error.

mod error;
pub mod model;

use std::future::Future;

use async_trait::async_trait;

pub use error::{classify, codes, ApiError, Error, ErrorKind};
use model::*;

use crate::context::RequestContext;

/// Result of a remote call.
pub type ApiResult<T> = Result<T, ApiError>;

/// Remote operations used by the resource adapters.
#[async_trait]
pub trait AppStreamApi: Send + Sync {
    // Application blocks

    /// Create an application block.
    async fn create_app_block(&self, input: CreateAppBlockInput) -> ApiResult<AppBlock>;

    /// Describe an application block by ARN.
    async fn describe_app_block(&self, arn: &str) -> ApiResult<Option<AppBlock>>;

    /// Delete an application block by name.
    async fn delete_app_block(&self, name: &str) -> ApiResult<()>;

    // Applications

    /// Create an application.
    async fn create_application(&self, input: CreateApplicationInput) -> ApiResult<Application>;

    /// Describe an application by ARN.
    async fn describe_application(&self, arn: &str) -> ApiResult<Option<Application>>;

    /// Update an application.
    async fn update_application(&self, input: UpdateApplicationInput) -> ApiResult<Application>;

    /// Delete an application by name.
    async fn delete_application(&self, name: &str) -> ApiResult<()>;

    // Fleets

    /// Create a fleet.
    async fn create_fleet(&self, input: CreateFleetInput) -> ApiResult<Fleet>;

    /// Describe a fleet by name.
    async fn describe_fleet(&self, name: &str) -> ApiResult<Option<Fleet>>;

    /// Update a fleet.
    async fn update_fleet(&self, input: UpdateFleetInput) -> ApiResult<Fleet>;

    /// Delete a stopped fleet.
    async fn delete_fleet(&self, name: &str) -> ApiResult<()>;

    /// Start provisioning fleet instances.
    async fn start_fleet(&self, name: &str) -> ApiResult<()>;

    /// Stop fleet instances.
    async fn stop_fleet(&self, name: &str) -> ApiResult<()>;

    // Stacks

    /// Create a stack.
    async fn create_stack(&self, input: CreateStackInput) -> ApiResult<Stack>;

    /// Describe a stack by name.
    async fn describe_stack(&self, name: &str) -> ApiResult<Option<Stack>>;

    /// Update a stack.
    async fn update_stack(&self, input: UpdateStackInput) -> ApiResult<Stack>;

    /// Delete a stack.
    async fn delete_stack(&self, name: &str) -> ApiResult<()>;

    // Directory configs

    /// Create a directory config.
    async fn create_directory_config(&self, input: DirectoryConfigInput)
        -> ApiResult<DirectoryConfig>;

    /// Describe a directory config by directory name.
    async fn describe_directory_config(&self, name: &str) -> ApiResult<Option<DirectoryConfig>>;

    /// Update a directory config.
    async fn update_directory_config(&self, input: DirectoryConfigInput)
        -> ApiResult<DirectoryConfig>;

    /// Delete a directory config.
    async fn delete_directory_config(&self, name: &str) -> ApiResult<()>;

    // Fleet <-> stack

    /// Associate a fleet with a stack.
    async fn associate_fleet(&self, fleet_name: &str, stack_name: &str) -> ApiResult<()>;

    /// Disassociate a fleet from a stack.
    async fn disassociate_fleet(&self, fleet_name: &str, stack_name: &str) -> ApiResult<()>;

    /// List the stacks a fleet is associated with.
    async fn list_associated_stacks(
        &self,
        fleet_name: &str,
        next_token: Option<String>,
    ) -> ApiResult<Page<String>>;

    // Application <-> fleet

    /// Attach an application to a fleet.
    async fn associate_application_fleet(
        &self,
        fleet_name: &str,
        application_arn: &str,
    ) -> ApiResult<ApplicationFleetAssociation>;

    /// Detach an application from a fleet.
    async fn disassociate_application_fleet(
        &self,
        fleet_name: &str,
        application_arn: &str,
    ) -> ApiResult<()>;

    /// List application/fleet associations matching the filters.
    async fn describe_application_fleet_associations(
        &self,
        fleet_name: Option<&str>,
        application_arn: Option<&str>,
        next_token: Option<String>,
    ) -> ApiResult<Page<ApplicationFleetAssociation>>;

    // User <-> stack

    /// Associate users with stacks. Per-item failures are returned, not raised.
    async fn batch_associate_user_stack(
        &self,
        associations: Vec<UserStackAssociation>,
    ) -> ApiResult<Vec<UserStackAssociationError>>;

    /// Disassociate users from stacks. Per-item failures are returned, not raised.
    async fn batch_disassociate_user_stack(
        &self,
        associations: Vec<UserStackAssociation>,
    ) -> ApiResult<Vec<UserStackAssociationError>>;

    /// List user/stack associations matching the filters.
    async fn describe_user_stack_associations(
        &self,
        stack_name: Option<&str>,
        user_name: Option<&str>,
        authentication_type: Option<&str>,
        next_token: Option<String>,
    ) -> ApiResult<Page<UserStackAssociation>>;

    // Application <-> entitlement

    /// Grant an application through an entitlement.
    async fn associate_application_to_entitlement(
        &self,
        stack_name: &str,
        entitlement_name: &str,
        application_identifier: &str,
    ) -> ApiResult<()>;

    /// Revoke an application from an entitlement.
    async fn disassociate_application_from_entitlement(
        &self,
        stack_name: &str,
        entitlement_name: &str,
        application_identifier: &str,
    ) -> ApiResult<()>;

    /// List the applications granted by an entitlement.
    async fn list_entitled_applications(
        &self,
        stack_name: &str,
        entitlement_name: &str,
        next_token: Option<String>,
    ) -> ApiResult<Page<EntitledApplication>>;

    // Tags

    /// Tags of the entity at `arn`.
    async fn list_tags_for_resource(&self, arn: &str) -> ApiResult<Tags>;

    /// Add or overwrite tags.
    async fn tag_resource(&self, arn: &str, tags: Tags) -> ApiResult<()>;

    /// Remove tags by key.
    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> ApiResult<()>;
}

/// Walk a paginated listing under `ctx` until `matches` accepts an item.
pub async fn find_in_pages<T, F, Fut>(
    ctx: &RequestContext,
    mut fetch: F,
    matches: impl Fn(&T) -> bool,
) -> Result<Option<T>, Error>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut token = None;
    loop {
        let page = ctx.run(async { fetch(token.take()).await.map_err(Error::from) }).await?;
        if let Some(found) = page.items.into_iter().find(|item| matches(item)) {
            return Ok(Some(found));
        }
        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_in_pages_follows_tokens() {
        let ctx = RequestContext::new();
        let pages = [
            Page {
                items: vec!["a", "b"],
                next_token: Some("1".to_string()),
            },
            Page::last(vec!["c", "d"]),
        ];

        let found = find_in_pages(
            &ctx,
            |token| {
                let index = token.map_or(0, |t: String| t.parse::<usize>().unwrap_or(0));
                let page = pages[index].clone();
                async move { Ok(page) }
            },
            |item| *item == "d",
        )
        .await
        .unwrap();
        assert_eq!(found, Some("d"));

        let missing = find_in_pages(
            &ctx,
            |_| async { Ok(Page::last(Vec::<&str>::new())) },
            |_| true,
        )
        .await
        .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_find_in_pages_propagates_errors() {
        let ctx = RequestContext::new();
        let result = find_in_pages(
            &ctx,
            |_| async { Err::<Page<String>, _>(ApiError::not_found("fleet gone")) },
            |_| true,
        )
        .await;
        assert!(result.unwrap_err().is_not_found());
    }
}
