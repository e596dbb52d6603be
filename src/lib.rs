//! Hemmer provider for AppStream
//!
//! This crate manages AppStream desktop-streaming infrastructure (app blocks,
//! applications, fleets, stacks, directory configs and the associations
//! between them) for the Hemmer declarative engine.
//!
//! # Overview
//!
//! - **ProviderService**: the host-facing trait, implemented by
//!   [`AppStreamProvider`]
//! - **Resource adapters**: one per entity kind, translating typed state
//!   records to remote calls and back (see [`resources`])
//! - **Attribute values**: tri-state carriers (`Null`, `Unknown`, `Known`) with
//!   ownership-preserving read rules (see [`value`])
//! - **Diagnostics**: an accumulator threaded through every lifecycle call
//! - **Retry**: bounded exponential backoff keyed on the remote error kind
//! - **Logging**: integration with `tracing` for structured logging
//! - **Testing**: [`testing::ProviderTester`] and an in-memory remote API
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use hemmer_provider_appstream::{AppStreamProvider, ProviderConfig, ProviderService};
//!
//! let provider = AppStreamProvider::new(|config: &ProviderConfig| {
//!     Ok(Arc::new(MyAppStreamClient::new(config.region.as_deref())) as Arc<_>)
//! });
//! provider.configure(serde_json::json!({"region": "us-east-1"})).await?;
//! ```
//!
//! # Identifiers
//!
//! Entity resources are imported by ARN or name; associations use the
//! pipe-delimited composite form, e.g. `fleetA|stackB`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod arn;
pub mod context;
pub mod delta;
pub mod diagnostics;
pub mod error;
pub mod id;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod retry;
pub mod schema;
pub mod service;
pub mod tags;
pub mod testing;
pub mod types;
pub mod validation;
pub mod validators;
pub mod value;

// Re-export main types at crate root
pub use api::{ApiError, AppStreamApi, Error, ErrorKind};
pub use context::RequestContext;
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{AppStreamProvider, ClientFactory, ProviderConfig, RetryConfig};
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportResponse, ImportedResource, PlanResult, ProviderMetadata, ResourceResponse};
pub use validation::{is_valid, validate, validate_result};
pub use value::Value;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
