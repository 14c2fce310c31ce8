//! The [`Resource`] trait and the request/response types of each lifecycle operation

use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::error::OperationResult;
use crate::schema::Schema;
use crate::value::{AttributePath, Plan, State};

#[derive(Clone, Debug)]
pub struct MetadataRequest {
    /// Type name of the provider serving the resource, e.g. `nats`
    pub provider_type_name: String,
}

#[derive(Clone, Debug)]
pub struct ConfigureRequest {
    /// Data returned from [`Provider::configure`](crate::Provider::configure)
    pub provider_data: Value,
}

#[derive(Clone, Debug)]
pub struct ValidateConfigRequest {
    pub config: Value,
}

#[derive(Clone, Debug)]
pub struct CreateRequest {
    pub plan: Plan,
}

#[derive(Clone, Debug)]
pub struct ReadRequest {
    pub state: State,
}

#[derive(Clone, Debug)]
pub struct UpdateRequest {
    pub plan: Plan,
    pub state: State,
}

#[derive(Clone, Debug)]
pub struct DeleteRequest {
    pub state: State,
}

#[derive(Clone, Debug)]
pub struct ImportStateRequest {
    /// Opaque identifier supplied by the practitioner
    pub id: String,
}

/// A managed resource. The host invokes these operations by name; an operation either returns
/// the resulting state or a set of diagnostics, never both.
pub trait Resource: Send + Sync {
    /// Returns the full type name of the resource, usually the provider type name plus a suffix
    fn metadata(&self, req: &MetadataRequest) -> String;

    fn schema(&self) -> Schema;

    /// Receives provider level data. Most resources have nothing to do here.
    fn configure(&mut self, _req: ConfigureRequest) -> OperationResult<()> {
        Ok(())
    }

    /// Resource specific configuration checks, run after the schema level checks pass
    fn validate_config(&self, _req: ValidateConfigRequest) -> Diagnostics {
        Diagnostics::new()
    }

    fn create(&self, req: CreateRequest) -> OperationResult<State>;

    fn read(&self, req: ReadRequest) -> OperationResult<State>;

    fn update(&self, req: UpdateRequest) -> OperationResult<State>;

    /// Removes the resource. The host drops the state once this returns `Ok`.
    fn delete(&self, req: DeleteRequest) -> OperationResult<()>;

    fn import_state(&self, req: ImportStateRequest) -> OperationResult<State>;
}

/// Writes the import identifier to `attribute` of an otherwise empty state. Nothing else is
/// derived from the identifier; a later read fills in whatever the resource can.
pub fn import_state_passthrough_id(
    attribute: &AttributePath,
    req: &ImportStateRequest,
) -> OperationResult<State> {
    let mut state = State::null();
    state.set_attribute(attribute, req.id.as_str())?;
    Ok(state)
}
