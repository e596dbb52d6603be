//! Composite identifiers for association resources.
//!
//! An association has no remote identifier of its own; its `id` is the
//! pipe-delimited concatenation of its endpoints, e.g. `fleetA|stackB`. The
//! same format is accepted by import.

use thiserror::Error;

/// Separator between identifier segments.
pub const SEPARATOR: char = '|';

/// Error decoding a composite identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The identifier did not split into the expected number of segments.
    #[error("expected {expected} segments separated by '|', got {found} in {id:?}")]
    SegmentCount {
        /// The offending identifier.
        id: String,
        /// Expected number of segments.
        expected: usize,
        /// Number of segments found.
        found: usize,
    },

    /// One of the segments was empty.
    #[error("segment {index} of {id:?} is empty")]
    EmptySegment {
        /// The offending identifier.
        id: String,
        /// Zero-based position of the empty segment.
        index: usize,
    },
}

/// Join identifier segments.
pub fn build(parts: &[&str]) -> String {
    let mut id = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            id.push(SEPARATOR);
        }
        id.push_str(part);
    }
    id
}

/// Split an identifier into exactly `N` non-empty segments.
pub fn parse<const N: usize>(id: &str) -> Result<[String; N], IdError> {
    let parts: Vec<String> = id.split(SEPARATOR).map(str::to_owned).collect();
    if parts.len() != N {
        return Err(IdError::SegmentCount {
            id: id.to_owned(),
            expected: N,
            found: parts.len(),
        });
    }
    if let Some(index) = parts.iter().position(String::is_empty) {
        return Err(IdError::EmptySegment {
            id: id.to_owned(),
            index,
        });
    }
    parts.try_into().map_err(|parts: Vec<String>| IdError::SegmentCount {
        id: id.to_owned(),
        expected: N,
        found: parts.len(),
    })
}

/// Human-readable description of the expected format, for diagnostics.
pub fn describe_format(names: &[&str]) -> String {
    let placeholders: Vec<String> = names.iter().map(|n| format!("<{n}>")).collect();
    let refs: Vec<&str> = placeholders.iter().map(String::as_str).collect();
    build(&refs)
}
