//! Host-side plumbing for Terraform-style providers.
//!
//! A provider implements [`Provider`] and hands out one [`Resource`] per managed resource type.
//! [`ProviderServer`] indexes those resources by full type name and runs the operations a host
//! requests by name (`create_resource`, `read_resource`, ...), and [`serve`] exposes the server
//! over newline delimited JSON.
//!
//! Plan and state travel as JSON objects ([`Plan`], [`State`]) and are decoded into typed
//! models by the resource. Attributes declared [`sensitive`](schema::Attribute::sensitive) are
//! replaced by [`Schema::redact`](schema::Schema::redact) wherever state is logged, and model
//! fields holding such values use [`Sensitive`] so they cannot be printed by accident.

pub mod diagnostics;
pub mod error;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod sensitive;
pub mod server;
pub mod value;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{OperationResult, ProviderError};
pub use provider::{Provider, ProviderMetadata};
pub use resource::{
    import_state_passthrough_id, ConfigureRequest, CreateRequest, DeleteRequest,
    ImportStateRequest, MetadataRequest, ReadRequest, Resource, UpdateRequest,
    ValidateConfigRequest,
};
pub use schema::{Attribute, AttributeType, Schema};
pub use sensitive::Sensitive;
pub use server::{
    serve, MetadataResponse, ProviderServer, Request, Response, SchemaResponse,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use value::{AttributePath, Plan, State};
