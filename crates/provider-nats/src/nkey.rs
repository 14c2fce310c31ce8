//! The `nkey` resource: an ed25519 (or x25519 for curve) key pair formatted for use with NATS.
//!
//! The key pair only exists in state, so reads, deletes and updates that keep the type are
//! pass-throughs. Keys are generated on create and regenerated in place when the type changes.

use nats_provider_sdk::{
    import_state_passthrough_id, Attribute, AttributePath, CreateRequest, DeleteRequest,
    Diagnostic, Diagnostics, ImportStateRequest, MetadataRequest, OperationResult, ReadRequest,
    Resource, Schema, Sensitive, State, UpdateRequest, ValidateConfigRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::generator::{GeneratedKeys, KeyGenerator, NkeysGenerator};
use crate::key_type::KeyType;

/// Appended to the provider type name to form the resource type name
pub const TYPE_NAME_SUFFIX: &str = "_nkey";

pub const ID_ATTRIBUTE: &str = "id";
pub const TYPE_ATTRIBUTE: &str = "type";
pub const PUBLIC_KEY_ATTRIBUTE: &str = "public_key";
pub const PRIVATE_KEY_ATTRIBUTE: &str = "private_key";

/// State of a single nkey resource
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NkeyModel {
    #[serde(default)]
    pub id: Option<String>,
    /// Requested key type as written in configuration
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub private_key: Option<Sensitive>,
}

impl NkeyModel {
    fn has_keys(&self) -> bool {
        self.public_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.private_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Replaces both keys (and the id) with a freshly generated pair
    fn set_keys(&mut self, keys: GeneratedKeys) {
        self.id = Some(keys.public_key.clone());
        self.public_key = Some(keys.public_key);
        self.private_key = Some(keys.private_key);
    }
}

/// The `<provider>_nkey` resource
#[derive(Clone, Debug, Default)]
pub struct NkeyResource<G = NkeysGenerator> {
    generator: G,
}

impl NkeyResource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G: KeyGenerator> NkeyResource<G> {
    /// Uses `generator` instead of the `nkeys` backed default
    pub fn with_generator(generator: G) -> Self {
        Self { generator }
    }

    fn generate(&self, key_type: Option<&str>) -> OperationResult<GeneratedKeys> {
        let key_type = parse_key_type(key_type)?;
        self.generator.generate(key_type).map_err(|e| {
            error!(%key_type, error = %e, "failed to generate nkey");
            Diagnostic::error(e.summary(), e.to_string()).into()
        })
    }
}

fn parse_key_type(value: Option<&str>) -> OperationResult<KeyType> {
    KeyType::from_attribute(value).map_err(|e| {
        Diagnostic::error("invalid nkey type", e.to_string())
            .with_attribute(AttributePath::root(TYPE_ATTRIBUTE))
            .into()
    })
}

impl<G: KeyGenerator> Resource for NkeyResource<G> {
    fn metadata(&self, req: &MetadataRequest) -> String {
        format!("{}{TYPE_NAME_SUFFIX}", req.provider_type_name)
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_markdown_description(
                "An nkey is an ed25519 key pair formatted for use with NATS.",
            )
            .with_attribute(
                ID_ATTRIBUTE,
                Attribute::string()
                    .computed()
                    .markdown_description("Identifier of the nkey, the public key unless imported"),
            )
            .with_attribute(
                TYPE_ATTRIBUTE,
                Attribute::string()
                    .optional()
                    .computed()
                    .default_value(KeyType::default().as_str())
                    .description(
                        "The type of nkey to generate. Must be one of user|account|server|cluster|operator|curve",
                    ),
            )
            .with_attribute(
                PUBLIC_KEY_ATTRIBUTE,
                Attribute::string()
                    .computed()
                    .markdown_description(
                        "Public key of the nkey to be given in config to the nats server",
                    ),
            )
            .with_attribute(
                PRIVATE_KEY_ATTRIBUTE,
                Attribute::string()
                    .computed()
                    .sensitive()
                    .markdown_description(
                        "Private key of the nkey to be given to the client for authentication",
                    ),
            )
    }

    fn validate_config(&self, req: ValidateConfigRequest) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if let Some(Value::String(key_type)) = req.config.get(TYPE_ATTRIBUTE) {
            if let Err(e) = parse_key_type(Some(key_type.as_str())) {
                diags.append(e);
            }
        }
        diags
    }

    fn create(&self, req: CreateRequest) -> OperationResult<State> {
        let mut data: NkeyModel = req.plan.get()?;

        let keys = self.generate(data.key_type.as_deref())?;
        data.key_type.get_or_insert_with(|| keys.key_type.to_string());
        data.set_keys(keys);

        trace!(key_type = ?data.key_type, public_key = ?data.public_key, "created nkey resource");
        State::from_model(&data)
    }

    fn read(&self, req: ReadRequest) -> OperationResult<State> {
        let data: NkeyModel = req.state.get()?;
        State::from_model(&data)
    }

    fn update(&self, req: UpdateRequest) -> OperationResult<State> {
        let planned: NkeyModel = req.plan.get()?;
        let mut data: NkeyModel = req.state.get()?;

        let next = parse_key_type(planned.key_type.as_deref())?;
        let unchanged = data.key_type.is_some()
            && KeyType::from_attribute(data.key_type.as_deref()) == Ok(next)
            && data.has_keys();

        if unchanged {
            debug!(key_type = %next, "nkey type unchanged, keeping keys");
        } else {
            let keys = self.generate(planned.key_type.as_deref())?;
            debug!(
                from = ?data.key_type,
                to = %keys.key_type,
                "regenerating nkey"
            );
            data.set_keys(keys);
        }
        data.key_type = Some(planned.key_type.unwrap_or_else(|| next.to_string()));

        trace!(key_type = ?data.key_type, "updated nkey resource");
        State::from_model(&data)
    }

    fn delete(&self, req: DeleteRequest) -> OperationResult<()> {
        let data: NkeyModel = req.state.get()?;
        trace!(id = ?data.id, "deleted nkey resource");
        Ok(())
    }

    fn import_state(&self, req: ImportStateRequest) -> OperationResult<State> {
        import_state_passthrough_id(&AttributePath::root(ID_ATTRIBUTE), &req)
    }
}
