use nats_provider_sdk::{Provider, ProviderMetadata, Resource};

use crate::nkey::NkeyResource;

/// Type name of the provider, and the prefix of every resource it serves
pub const PROVIDER_TYPE_NAME: &str = "nats";

/// The `nats` provider. It has no configuration; its only resource is `nats_nkey`.
#[derive(Clone, Debug)]
pub struct NatsProvider {
    version: String,
}

impl NatsProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for NatsProvider {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl Provider for NatsProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: self.version.clone(),
        }
    }

    fn resources(&self) -> Vec<Box<dyn Resource>> {
        vec![Box::new(NkeyResource::new())]
    }
}
