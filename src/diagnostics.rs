//! Diagnostics reported back to the host.
//!
//! Lifecycle callbacks never fail by unwinding. Each step takes a
//! `&mut Diagnostics`, appends what went wrong, and returns its best-effort
//! value; callers check [`Diagnostics::has_error`] before using that value.

use serde::{Deserialize, Serialize};

use crate::api::Error;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        matches!(self.severity, DiagnosticSeverity::Error)
    }
}

/// Additive collector of diagnostics for one host request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Append an error with a summary and detail.
    pub fn error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::error(summary).with_detail(detail));
    }

    /// Append an error bound to an attribute path.
    pub fn attribute_error(
        &mut self,
        path: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(
            Diagnostic::error(summary)
                .with_detail(detail)
                .with_attribute(path),
        );
    }

    /// Append a warning with a summary and detail.
    pub fn warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary).with_detail(detail));
    }

    /// Append an error for a failed remote operation.
    ///
    /// Cancellation is a silent exit: nothing is recorded for it.
    pub fn remote_error(&mut self, summary: impl Into<String>, err: &Error) {
        if err.is_cancelled() {
            return;
        }
        let mut detail = err.to_string();
        if let Some(suggestion) = err.suggestion() {
            detail = format!("{detail}\n\n{suggestion}");
        }
        self.error(summary, detail);
    }

    /// Append every diagnostic from `other`.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(other);
    }

    /// Whether any error has been recorded.
    pub fn has_error(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over the recorded diagnostics.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Consume the collector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl From<Diagnostics> for Vec<Diagnostic> {
    fn from(diags: Diagnostics) -> Self {
        diags.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    #[test]
    fn test_diagnostic_builder() {
        let err = Diagnostic::error("Invalid configuration")
            .with_detail("The value must be positive")
            .with_attribute("count");

        assert_eq!(err.severity, DiagnosticSeverity::Error);
        assert_eq!(err.summary, "Invalid configuration");
        assert_eq!(err.detail, Some("The value must be positive".to_string()));
        assert_eq!(err.attribute, Some("count".to_string()));
    }

    #[test]
    fn test_accumulates_additively() {
        let mut diags = Diagnostics::new();
        diags.warning("heads up", "something odd");
        assert!(!diags.has_error());

        diags.attribute_error("name", "Invalid Attribute Value", "too long");
        diags.error("second", "detail");
        assert!(diags.has_error());
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.iter().filter(|d| d.is_error()).count(), 2);
    }

    #[test]
    fn test_remote_error_skips_cancellation() {
        let mut diags = Diagnostics::new();
        diags.remote_error("reading fleet", &Error::Cancelled);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_remote_error_includes_message_and_suggestion() {
        let mut diags = Diagnostics::new();
        let err = Error::from(ApiError::new(
            "ResourceAlreadyExistsException",
            "The stack already exists.",
        ));
        diags.remote_error("creating stack (s1)", &err);

        let diag = diags.iter().next().unwrap();
        let detail = diag.detail.as_deref().unwrap();
        assert!(detail.contains("The stack already exists."));
        assert!(detail.contains("terraform import"));
    }
}
