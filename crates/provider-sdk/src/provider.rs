use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OperationResult;
use crate::resource::Resource;
use crate::schema::Schema;

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ProviderMetadata {
    /// Prefix of every resource type name served by the provider, e.g. `nats`
    pub type_name: String,
    pub version: String,
}

/// A provider groups resources under a common type name prefix and configuration
pub trait Provider: Send + Sync {
    fn metadata(&self) -> ProviderMetadata;

    /// Schema of the provider configuration block
    fn schema(&self) -> Schema {
        Schema::v0()
    }

    /// Validates provider configuration and returns data handed to every resource's
    /// [`Resource::configure`]
    fn configure(&self, _config: Value) -> OperationResult<Value> {
        Ok(Value::Null)
    }

    /// Creates one instance of every resource the provider serves
    fn resources(&self) -> Vec<Box<dyn Resource>>;
}
