//! Tag reconciliation.
//!
//! Tags live on the remote entity and are addressed by ARN. The effective
//! tag set is the provider's default tags overlaid with the resource's own
//! tags. State carries both views: `tags` (what the resource declares) and
//! `tags_all` (what is on the entity).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::model::Tags;
use crate::api::{AppStreamApi, Error};
use crate::context::RequestContext;
use crate::value::{MapValue, Value};

/// Keys reserved by the cloud provider; never read into state or removed.
const RESERVED_PREFIX: &str = "aws:";

fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Provider-level tags applied to every taggable resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTags {
    /// Tag set.
    pub tags: Tags,
}

impl DefaultTags {
    /// Default tags from a map.
    pub fn new(tags: Tags) -> Self {
        Self { tags }
    }

    /// Effective tag set: defaults overlaid with `resource` tags.
    pub fn merge(&self, resource: &Tags) -> Tags {
        let mut merged = self.tags.clone();
        merged.extend(resource.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Both views of a tag set, ready for state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagState {
    /// Tags the resource declares.
    pub tags: MapValue<String>,
    /// Tags on the remote entity.
    pub tags_all: MapValue<String>,
}

/// Read-modify-write access to remote tag sets.
#[derive(Clone)]
pub struct TagManager {
    api: Arc<dyn AppStreamApi>,
    defaults: DefaultTags,
}

impl TagManager {
    /// Create a tag manager over `api`.
    pub fn new(api: Arc<dyn AppStreamApi>, defaults: DefaultTags) -> Self {
        Self { api, defaults }
    }

    /// Tags on the entity at `arn`, without reserved keys.
    pub async fn read(&self, ctx: &RequestContext, arn: &str) -> Result<Tags, Error> {
        let mut tags = ctx
            .run(async { self.api.list_tags_for_resource(arn).await.map_err(Error::from) })
            .await?;
        tags.retain(|key, _| !is_reserved(key));
        Ok(tags)
    }

    /// Read the tags of `arn` and split them against the prior `tags` value.
    pub async fn read_state(
        &self,
        ctx: &RequestContext,
        arn: &str,
        prior: &MapValue<String>,
    ) -> Result<TagState, Error> {
        let remote = self.read(ctx, arn).await?;
        Ok(self.split(prior, &remote))
    }

    /// Separate resource-declared tags from inherited defaults.
    ///
    /// A remote key counts as the resource's own when the prior state
    /// declared it, or when it is not a default tag with the same value.
    pub fn split(&self, prior: &MapValue<String>, remote: &Tags) -> TagState {
        let tags_all = Value::Known(remote.clone());
        if prior.is_unknown() {
            return TagState {
                tags: Value::Unknown,
                tags_all,
            };
        }
        let declared = prior.as_known();
        let own: BTreeMap<String, String> = remote
            .iter()
            .filter(|(key, value)| {
                declared.is_some_and(|d| d.contains_key(*key))
                    || self.defaults.tags.get(*key) != Some(*value)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let tags = match prior {
            Value::Null if own.is_empty() => Value::Null,
            _ => Value::Known(own),
        };
        TagState { tags, tags_all }
    }

    /// Converge the entity's tags to defaults overlaid with `resource`.
    ///
    /// Issues at most one untag and one tag call.
    pub async fn apply(&self, ctx: &RequestContext, arn: &str, resource: &Tags) -> Result<(), Error> {
        let desired = self.defaults.merge(resource);
        let current = self.read(ctx, arn).await?;

        let removed: Vec<String> = current
            .keys()
            .filter(|key| !desired.contains_key(*key))
            .cloned()
            .collect();
        let changed: Tags = desired
            .iter()
            .filter(|(key, value)| !is_reserved(key) && current.get(*key) != Some(*value))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if !removed.is_empty() {
            debug!(arn, keys = ?removed, "Removing tags");
            ctx.run(async { self.api.untag_resource(arn, removed).await.map_err(Error::from) })
                .await?;
        }
        if !changed.is_empty() {
            debug!(arn, count = changed.len(), "Tagging resource");
            ctx.run(async { self.api.tag_resource(arn, changed).await.map_err(Error::from) })
                .await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TagManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagManager")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
