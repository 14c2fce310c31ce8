//! Dispatches named operations to a provider's resources, and a line based transport for them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{OperationResult, ProviderError};
use crate::provider::{Provider, ProviderMetadata};
use crate::resource::{
    ConfigureRequest, CreateRequest, DeleteRequest, ImportStateRequest, MetadataRequest,
    ReadRequest, Resource, UpdateRequest, ValidateConfigRequest,
};
use crate::schema::Schema;
use crate::value::{Plan, State};

/// Version of the request/response format spoken by [`serve`]
pub const PROTOCOL_VERSION: u32 = 1;

/// First token of the handshake line written by [`serve`]
pub const HANDSHAKE_PREFIX: &str = "NATS_PROVIDER";

/// A single operation requested by the host, tagged by its name
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    GetMetadata,
    GetSchema,
    ConfigureProvider {
        #[serde(default)]
        config: Value,
    },
    ValidateResourceConfig {
        type_name: String,
        #[serde(default)]
        config: Value,
    },
    CreateResource {
        type_name: String,
        #[serde(default)]
        plan: Plan,
    },
    ReadResource {
        type_name: String,
        state: State,
    },
    UpdateResource {
        type_name: String,
        prior_state: State,
        plan: Plan,
    },
    DeleteResource {
        type_name: String,
        state: State,
    },
    ImportResourceState {
        type_name: String,
        id: String,
    },
}

impl Request {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::GetMetadata => "get_metadata",
            Self::GetSchema => "get_schema",
            Self::ConfigureProvider { .. } => "configure_provider",
            Self::ValidateResourceConfig { .. } => "validate_resource_config",
            Self::CreateResource { .. } => "create_resource",
            Self::ReadResource { .. } => "read_resource",
            Self::UpdateResource { .. } => "update_resource",
            Self::DeleteResource { .. } => "delete_resource",
            Self::ImportResourceState { .. } => "import_resource_state",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MetadataResponse {
    pub provider: ProviderMetadata,
    pub resources: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SchemaResponse {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
}

/// The answer to a [`Request`]. Only the field matching the operation is set; `diagnostics` is
/// set whenever something went wrong.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
}

impl Response {
    fn with_state(result: OperationResult<State>) -> Self {
        match result {
            Ok(state) => Self {
                state: Some(state),
                ..Default::default()
            },
            Err(diagnostics) => diagnostics.into(),
        }
    }
}

impl From<Diagnostics> for Response {
    fn from(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Default::default()
        }
    }
}

impl From<Diagnostic> for Response {
    fn from(diagnostic: Diagnostic) -> Self {
        Diagnostics::from(diagnostic).into()
    }
}

/// Owns a provider and its resources, keyed by full resource type name
pub struct ProviderServer {
    provider: Box<dyn Provider>,
    metadata: ProviderMetadata,
    resources: BTreeMap<String, Box<dyn Resource>>,
}

impl std::fmt::Debug for ProviderServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderServer")
            .field("provider", &self.metadata)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderServer {
    pub fn new(provider: impl Provider + 'static) -> Result<Self, ProviderError> {
        let metadata = provider.metadata();
        let mut resources = BTreeMap::new();
        for resource in provider.resources() {
            let type_name = resource.metadata(&MetadataRequest {
                provider_type_name: metadata.type_name.clone(),
            });
            if resources.contains_key(&type_name) {
                return Err(ProviderError::DuplicateResource(type_name));
            }
            resources.insert(type_name, resource);
        }
        Ok(Self {
            provider: Box::new(provider),
            metadata,
            resources,
        })
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    /// Full type names of every served resource
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Runs a single operation to completion
    #[instrument(level = "debug", skip_all, fields(operation = request.operation()))]
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::GetMetadata => Response {
                metadata: Some(MetadataResponse {
                    provider: self.metadata.clone(),
                    resources: self.resources.keys().cloned().collect(),
                }),
                ..Default::default()
            },
            Request::GetSchema => Response {
                schema: Some(SchemaResponse {
                    provider: self.provider.schema(),
                    resources: self
                        .resources
                        .iter()
                        .map(|(name, resource)| (name.clone(), resource.schema()))
                        .collect(),
                }),
                ..Default::default()
            },
            Request::ConfigureProvider { config } => match self.configure(config) {
                Ok(()) => Response::default(),
                Err(diagnostics) => diagnostics.into(),
            },
            Request::ValidateResourceConfig { type_name, config } => {
                match self.resource(&type_name) {
                    Ok(resource) => {
                        let mut diagnostics = resource.schema().validate_config(&config);
                        if !diagnostics.has_error() {
                            diagnostics.append(
                                resource.validate_config(ValidateConfigRequest { config }),
                            );
                        }
                        diagnostics.into()
                    }
                    Err(diagnostics) => diagnostics.into(),
                }
            }
            Request::CreateResource {
                type_name,
                mut plan,
            } => Response::with_state(self.resource(&type_name).and_then(|resource| {
                resource.schema().apply_defaults(plan.raw_mut());
                let state = resource.create(CreateRequest { plan })?;
                log_state(&type_name, resource, &state, "created resource");
                Ok(state)
            })),
            Request::ReadResource { type_name, state } => {
                Response::with_state(self.resource(&type_name).and_then(|resource| {
                    let state = resource.read(ReadRequest { state })?;
                    log_state(&type_name, resource, &state, "read resource");
                    Ok(state)
                }))
            }
            Request::UpdateResource {
                type_name,
                prior_state,
                mut plan,
            } => Response::with_state(self.resource(&type_name).and_then(|resource| {
                resource.schema().apply_defaults(plan.raw_mut());
                let state = resource.update(UpdateRequest {
                    plan,
                    state: prior_state,
                })?;
                log_state(&type_name, resource, &state, "updated resource");
                Ok(state)
            })),
            Request::DeleteResource { type_name, state } => {
                Response::with_state(self.resource(&type_name).and_then(|resource| {
                    resource.delete(DeleteRequest { state })?;
                    debug!(type_name = %type_name, "deleted resource");
                    Ok(State::null())
                }))
            }
            Request::ImportResourceState { type_name, id } => {
                Response::with_state(self.resource(&type_name).and_then(|resource| {
                    let state = resource.import_state(ImportStateRequest { id })?;
                    log_state(&type_name, resource, &state, "imported resource");
                    Ok(state)
                }))
            }
        }
    }

    fn configure(&mut self, config: Value) -> OperationResult<()> {
        let diagnostics = self.provider.schema().validate_config(&config);
        if diagnostics.has_error() {
            return Err(diagnostics);
        }
        let provider_data = self.provider.configure(config)?;
        let mut diagnostics = Diagnostics::new();
        for (type_name, resource) in &mut self.resources {
            if let Err(errors) = resource.configure(ConfigureRequest {
                provider_data: provider_data.clone(),
            }) {
                warn!(type_name = %type_name, "failed to configure resource");
                diagnostics.append(errors);
            }
        }
        if diagnostics.has_error() {
            return Err(diagnostics);
        }
        info!(provider = %self.metadata.type_name, "configured provider");
        Ok(())
    }

    fn resource(&self, type_name: &str) -> OperationResult<&dyn Resource> {
        self.resources
            .get(type_name)
            .map(|resource| &**resource)
            .ok_or_else(|| {
                Diagnostic::error(
                    "unknown resource type",
                    format!(
                        "provider `{}` does not serve `{type_name}`",
                        self.metadata.type_name
                    ),
                )
                .into()
            })
    }
}

fn log_state(type_name: &str, resource: &dyn Resource, state: &State, message: &str) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let redacted = resource.schema().redact(state.raw());
        debug!(type_name, state = %redacted, "{message}");
    }
}

/// Serves `provider` over a line based transport: after writing the handshake line
/// `NATS_PROVIDER|<version>|stdio`, every line read is decoded as a [`Request`] and answered
/// with exactly one [`Response`] line. Returns when the reader is exhausted.
pub async fn serve<P, R, W>(provider: P, reader: R, mut writer: W) -> Result<(), ProviderError>
where
    P: Provider + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut server = ProviderServer::new(provider)?;
    info!(
        provider = %server.metadata().type_name,
        version = %server.metadata().version,
        resources = ?server.resource_types().collect::<Vec<_>>(),
        "serving provider"
    );

    writer
        .write_all(format!("{HANDSHAKE_PREFIX}|{PROTOCOL_VERSION}|stdio\n").as_bytes())
        .await?;
    writer.flush().await?;

    // Lines are split on raw bytes so that invalid UTF-8 surfaces as a decode error
    let mut lines = reader.split(b'\n');
    while let Some(line) = lines.next_segment().await? {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }
        // The raw line may carry sensitive state, so only the decode error is logged
        let response = match serde_json::from_slice::<Request>(line) {
            Ok(request) => server.handle(request),
            Err(e) => {
                warn!(error = %e, "failed to decode request");
                Diagnostic::error("invalid request", e.to_string()).into()
            }
        };
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }
    info!("request stream closed, stopping provider");
    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::resource::import_state_passthrough_id;
    use crate::schema::Attribute;
    use crate::value::AttributePath;

    /// Stores its plan as state and nothing else
    struct Echo;

    impl Resource for Echo {
        fn metadata(&self, req: &MetadataRequest) -> String {
            format!("{}_echo", req.provider_type_name)
        }

        fn schema(&self) -> Schema {
            Schema::v0()
                .with_attribute("word", Attribute::string().optional().default_value("hi"))
                .with_attribute("secret", Attribute::string().computed().sensitive())
        }

        fn create(&self, req: CreateRequest) -> OperationResult<State> {
            Ok(State::new(req.plan.into_value()))
        }

        fn read(&self, req: ReadRequest) -> OperationResult<State> {
            Ok(req.state)
        }

        fn update(&self, req: UpdateRequest) -> OperationResult<State> {
            Ok(State::new(req.plan.into_value()))
        }

        fn delete(&self, _req: DeleteRequest) -> OperationResult<()> {
            Ok(())
        }

        fn import_state(&self, req: ImportStateRequest) -> OperationResult<State> {
            import_state_passthrough_id(&AttributePath::root("word"), &req)
        }
    }

    struct Toy {
        resources: usize,
    }

    impl Provider for Toy {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                type_name: "toy".to_string(),
                version: "0.0.0".to_string(),
            }
        }

        fn resources(&self) -> Vec<Box<dyn Resource>> {
            (0..self.resources)
                .map(|_| Box::new(Echo) as Box<dyn Resource>)
                .collect()
        }
    }

    fn server() -> ProviderServer {
        ProviderServer::new(Toy { resources: 1 }).expect("server should build")
    }

    #[test]
    fn duplicate_resources_are_rejected() {
        let err = ProviderServer::new(Toy { resources: 2 }).unwrap_err();
        assert!(matches!(err, ProviderError::DuplicateResource(name) if name == "toy_echo"));
    }

    #[test]
    fn metadata_lists_resources() {
        let resp = server().handle(Request::GetMetadata);
        let metadata = resp.metadata.expect("metadata should be set");
        assert_eq!(metadata.provider.type_name, "toy");
        assert_eq!(metadata.resources, ["toy_echo"]);
    }

    #[test]
    fn create_applies_schema_defaults() {
        let resp = server().handle(Request::CreateResource {
            type_name: "toy_echo".to_string(),
            plan: Plan::new(json!({ "word": null })),
        });
        assert!(resp.diagnostics.is_empty());
        assert_eq!(resp.state.unwrap().raw(), &json!({ "word": "hi" }));
    }

    #[test]
    fn unknown_resource_type_is_a_diagnostic() {
        let resp = server().handle(Request::ReadResource {
            type_name: "toy_nope".to_string(),
            state: State::new(json!({})),
        });
        assert!(resp.state.is_none());
        assert!(resp.diagnostics.has_error());
        assert_eq!(
            resp.diagnostics.iter().next().unwrap().summary,
            "unknown resource type"
        );
    }

    #[test]
    fn validate_runs_schema_checks() {
        let resp = server().handle(Request::ValidateResourceConfig {
            type_name: "toy_echo".to_string(),
            config: json!({ "secret": "set by hand" }),
        });
        assert!(resp.diagnostics.has_error());
    }

    #[test]
    fn request_tags_use_operation_names() {
        let request: Request = serde_json::from_value(json!({
            "operation": "import_resource_state",
            "type_name": "toy_echo",
            "id": "abc123",
        }))
        .unwrap();
        assert_eq!(request.operation(), "import_resource_state");
    }

    #[tokio::test]
    async fn serve_answers_every_line() {
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"operation":"get_metadata"}"#);
        input.extend_from_slice(b"\n\nthis is not json\n");
        input.extend_from_slice(b"\xff\xfe not utf8\r\n");
        input.extend_from_slice(
            br#"{"operation":"delete_resource","type_name":"toy_echo","state":{"word":"hi"}}"#,
        );
        input.push(b'\n');
        let mut output = Vec::new();
        serve(
            Toy { resources: 1 },
            tokio::io::BufReader::new(input.as_slice()),
            &mut output,
        )
        .await
        .expect("serve should finish cleanly");

        let output = String::from_utf8(output).unwrap();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("NATS_PROVIDER|1|stdio"));

        let metadata: Response = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert!(metadata.metadata.is_some());

        for _ in ["not json", "not utf8"] {
            let invalid: Response = serde_json::from_str(lines.next().unwrap()).unwrap();
            assert!(invalid.state.is_none());
            assert_eq!(
                invalid.diagnostics.iter().next().unwrap().summary,
                "invalid request"
            );
        }

        let deleted: Response = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert!(deleted.diagnostics.is_empty());
        assert!(deleted.state.is_none(), "deleted state is null");

        assert_eq!(lines.next(), None);
    }
}
