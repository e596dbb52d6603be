//! Request and response types exchanged with the host.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<serde_json::Value>,
    /// The value after the change (None if deleting).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
    /// Validation findings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
            diagnostics: Vec::new(),
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: serde_json::Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
            diagnostics: Vec::new(),
        }
    }

    /// Attach diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics.into_vec();
        self
    }

    /// Whether the plan carries an error.
    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// The result of a create, read, update or data source read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceResponse {
    /// The new state; `None` tells the host to remove the resource from state.
    pub state: Option<serde_json::Value>,
    /// Diagnostics accumulated during the call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ResourceResponse {
    /// A response carrying `state`.
    pub fn new(state: Option<serde_json::Value>, diagnostics: Diagnostics) -> Self {
        Self {
            state,
            diagnostics: diagnostics.into_vec(),
        }
    }

    /// A response telling the host to forget the resource.
    pub fn removed() -> Self {
        Self {
            state: None,
            diagnostics: Vec::new(),
        }
    }

    /// Whether the response carries an error.
    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// The result of an import.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportResponse {
    /// Seed records for the imported resources; the host reads each next.
    pub resources: Vec<ImportedResource>,
    /// Diagnostics accumulated during the call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportResponse {
    /// A response carrying `resources`.
    pub fn new(resources: Vec<ImportedResource>, diagnostics: Diagnostics) -> Self {
        Self {
            resources,
            diagnostics: diagnostics.into_vec(),
        }
    }

    /// Whether the response carries an error.
    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", serde_json::json!("test"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(serde_json::json!("test")));

        let removed = AttributeChange::removed("name", serde_json::json!("old"));
        assert_eq!(removed.before, Some(serde_json::json!("old")));
        assert!(removed.after.is_none());

        let modified =
            AttributeChange::modified("count", serde_json::json!(1), serde_json::json!(2));
        assert_eq!(modified.before, Some(serde_json::json!(1)));
        assert_eq!(modified.after, Some(serde_json::json!(2)));
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(serde_json::json!({"id": "123"}));
        assert!(no_change.changes.is_empty());
        assert!(!no_change.requires_replace);
        assert!(!no_change.has_error());

        let mut diags = Diagnostics::new();
        diags.attribute_error("name", "Invalid Attribute Value", "too long");
        let with_changes = PlanResult::with_changes(
            serde_json::json!({"id": "123", "name": "new"}),
            vec![AttributeChange::modified(
                "name",
                serde_json::json!("old"),
                serde_json::json!("new"),
            )],
            false,
        )
        .with_diagnostics(diags);
        assert_eq!(with_changes.changes.len(), 1);
        assert!(with_changes.has_error());
    }

    #[test]
    fn test_resource_response() {
        let removed = ResourceResponse::removed();
        assert!(removed.state.is_none());
        assert!(!removed.has_error());

        let mut diags = Diagnostics::new();
        diags.warning("Fleet error", "IAM_SERVICE_ROLE_MISSING");
        let response = ResourceResponse::new(Some(serde_json::json!({"name": "f"})), diags);
        assert!(!response.has_error());
        assert_eq!(response.diagnostics.len(), 1);
    }

    #[test]
    fn test_imported_resource() {
        let imported =
            ImportedResource::new("appstream_fleet", serde_json::json!({"id": "my-fleet"}));
        assert_eq!(imported.resource_type, "appstream_fleet");
        assert_eq!(imported.state["id"], "my-fleet");

        let mut diags = Diagnostics::new();
        diags.error("Unexpected Import Identifier", "expected <fleet_name>|<stack_name>");
        let response = ImportResponse::new(Vec::new(), diags);
        assert!(response.has_error());
        assert!(response.resources.is_empty());
    }
}
