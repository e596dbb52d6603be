//! Remote error classification.
//!
//! The remote API reports failures with a stable error code. The engine never
//! matches on messages; every decision (retry, drop from state, surface to the
//! user) is taken from [`classify`], which is a pure function of the code.

use thiserror::Error;

/// Error returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Stable error code, e.g. `ResourceNotFoundException`.
    pub code: String,
    /// Human-readable message from the remote service.
    pub message: String,
}

impl ApiError {
    /// Create a new remote error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a `ResourceNotFoundException`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(codes::RESOURCE_NOT_FOUND, message)
    }

    /// The taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        classify(&self.code)
    }
}

/// Error codes the classifier recognizes.
pub mod codes {
    /// The entity does not exist.
    pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
    /// The entitlement does not exist.
    pub const ENTITLEMENT_NOT_FOUND: &str = "EntitlementNotFoundException";
    /// The entity already exists.
    pub const RESOURCE_ALREADY_EXISTS: &str = "ResourceAlreadyExistsException";
    /// The entitlement already exists.
    pub const ENTITLEMENT_ALREADY_EXISTS: &str = "EntitlementAlreadyExistsException";
    /// Another mutation of the entity is in flight.
    pub const CONCURRENT_MODIFICATION: &str = "ConcurrentModificationException";
    /// The entity is in a state that does not permit the operation yet.
    pub const OPERATION_NOT_PERMITTED: &str = "OperationNotPermittedException";

    /// Batch user-stack item: the stack has not propagated.
    pub const STACK_NOT_FOUND: &str = "STACK_NOT_FOUND";
    /// Batch user-stack item: the user has not propagated.
    pub const USER_NAME_NOT_FOUND: &str = "USER_NAME_NOT_FOUND";
    /// Batch user-stack item: the directory has not propagated.
    pub const DIRECTORY_NOT_FOUND: &str = "DIRECTORY_NOT_FOUND";
    /// Batch user-stack item: transient service failure.
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

const NOT_FOUND_CODES: &[&str] = &[codes::RESOURCE_NOT_FOUND, codes::ENTITLEMENT_NOT_FOUND];

const ALREADY_EXISTS_CODES: &[&str] = &[
    codes::RESOURCE_ALREADY_EXISTS,
    codes::ENTITLEMENT_ALREADY_EXISTS,
];

const CONFLICT_CODES: &[&str] = &[
    codes::CONCURRENT_MODIFICATION,
    codes::OPERATION_NOT_PERMITTED,
];

/// Taxonomy every remote failure is mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The entity is gone: drop from state on read/update, success on delete.
    NotFound,
    /// Create collided with an existing entity: tell the user to import it.
    AlreadyExists,
    /// Concurrent mutation or premature operation: retry.
    Conflict,
    /// Dependency not yet propagated: retry.
    Transient,
    /// The request context was cancelled or hit its deadline.
    Cancelled,
    /// Everything else: surface to the user.
    Fatal,
}

/// Map a remote error code to its taxonomy bucket.
pub fn classify(code: &str) -> ErrorKind {
    if NOT_FOUND_CODES.contains(&code) {
        ErrorKind::NotFound
    } else if ALREADY_EXISTS_CODES.contains(&code) {
        ErrorKind::AlreadyExists
    } else if CONFLICT_CODES.contains(&code) {
        ErrorKind::Conflict
    } else {
        ErrorKind::Fatal
    }
}

/// Error produced by engine operations against the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The remote API rejected the call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request context was cancelled or its deadline passed.
    #[error("operation cancelled")]
    Cancelled,

    /// A dependency has not propagated yet; the call should be retried.
    #[error("{code}: {message}")]
    NotReady {
        /// Code describing what is not ready.
        code: String,
        /// Detail of the pending condition.
        message: String,
    },
}

impl Error {
    /// Create a retryable "not ready" sentinel.
    pub fn not_ready(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotReady {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(err) => err.kind(),
            Self::Cancelled => ErrorKind::Cancelled,
            Self::NotReady { .. } => ErrorKind::Transient,
        }
    }

    /// Whether the entity is gone.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether create collided with an existing entity.
    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    /// Whether the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    /// The remote error code, if this error came from the remote API.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api(err) => Some(&err.code),
            Self::NotReady { code, .. } => Some(code),
            _ => None,
        }
    }

    /// User guidance for resolving this error, if any.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::AlreadyExists => Some(
                "The resource already exists remotely. To manage it with this \
                 configuration, bring it under management with `terraform import` \
                 (or your host's import command) instead of creating it.",
            ),
            _ => None,
        }
    }
}
