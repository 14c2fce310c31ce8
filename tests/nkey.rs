use nats_provider::{NatsProvider, NkeyModel};
use nats_provider_sdk::{Plan, ProviderServer, Request, Response, State};
use nkeys::{KeyPair, XKey};
use serde_json::{json, Value};
use test_case::test_case;

const TYPE_NAME: &str = "nats_nkey";

fn server() -> ProviderServer {
    ProviderServer::new(NatsProvider::default()).expect("provider should register its resources")
}

/// Decodes a raw request the way the transport does, then handles it
fn call(server: &mut ProviderServer, request: Value) -> Response {
    let request: Request = serde_json::from_value(request).expect("request should decode");
    server.handle(request)
}

fn state_of(resp: Response) -> NkeyModel {
    assert!(
        !resp.diagnostics.has_error(),
        "unexpected diagnostics: {:?}",
        resp.diagnostics
    );
    resp.state
        .expect("state should be set")
        .get()
        .expect("state should decode")
}

fn create(server: &mut ProviderServer, plan: Value) -> Response {
    call(
        server,
        json!({ "operation": "create_resource", "type_name": TYPE_NAME, "plan": plan }),
    )
}

#[test_case("user", 'U'; "user")]
#[test_case("account", 'A'; "account")]
#[test_case("server", 'N'; "server")]
#[test_case("cluster", 'C'; "cluster")]
#[test_case("operator", 'O'; "operator")]
#[test_case("curve", 'X'; "curve")]
fn create_generates_matching_pair(key_type: &str, prefix: char) {
    let mut server = server();
    let data = state_of(create(&mut server, json!({ "type": key_type })));

    let public_key = data.public_key.expect("public key should be set");
    let seed = data.private_key.expect("private key should be set");
    assert!(public_key.starts_with(prefix));
    assert!(seed.expose().starts_with(&format!("S{prefix}")));

    let derived = if key_type == "curve" {
        XKey::from_seed(seed.expose()).unwrap().public_key()
    } else {
        KeyPair::from_seed(seed.expose()).unwrap().public_key()
    };
    assert_eq!(derived, public_key);
}

#[test]
fn create_without_type_defaults_to_account() {
    let mut server = server();
    let data = state_of(create(&mut server, Value::Null));
    assert_eq!(data.key_type.as_deref(), Some("account"));
    assert!(data.public_key.unwrap().starts_with('A'));
}

#[test]
fn create_with_unknown_type_fails_without_state() {
    let mut server = server();
    let resp = create(&mut server, json!({ "type": "bogus" }));
    assert!(resp.state.is_none());
    let diag = resp.diagnostics.errors().next().expect("an error diagnostic");
    assert_eq!(diag.summary, "invalid nkey type");
    assert!(diag.detail.contains("bogus"));
}

#[test]
fn read_after_create_is_identical() {
    let mut server = server();
    let created = create(&mut server, json!({ "type": "user" })).state.unwrap();

    let read = call(
        &mut server,
        json!({ "operation": "read_resource", "type_name": TYPE_NAME, "state": created }),
    );
    assert_eq!(read.state, Some(created));
}

#[test]
fn update_only_regenerates_on_type_change() {
    let mut server = server();
    let created = create(&mut server, json!({ "type": "user" })).state.unwrap();
    let original: NkeyModel = created.get().unwrap();

    let same = state_of(call(
        &mut server,
        json!({
            "operation": "update_resource",
            "type_name": TYPE_NAME,
            "prior_state": created,
            "plan": { "type": "user" },
        }),
    ));
    assert_eq!(same, original);

    let changed = state_of(call(
        &mut server,
        json!({
            "operation": "update_resource",
            "type_name": TYPE_NAME,
            "prior_state": created,
            "plan": { "type": "operator" },
        }),
    ));
    assert_ne!(changed.public_key, original.public_key);
    assert_ne!(changed.private_key, original.private_key);
    assert!(changed.public_key.unwrap().starts_with('O'));
}

#[test]
fn import_keeps_the_identifier_only() {
    let mut server = server();
    let resp = call(
        &mut server,
        json!({ "operation": "import_resource_state", "type_name": TYPE_NAME, "id": "abc123" }),
    );
    assert_eq!(resp.state, Some(State::new(json!({ "id": "abc123" }))));
}

#[test]
fn delete_drops_state() {
    let mut server = server();
    let created = create(&mut server, json!({})).state.unwrap();
    let resp = call(
        &mut server,
        json!({ "operation": "delete_resource", "type_name": TYPE_NAME, "state": created }),
    );
    assert!(resp.diagnostics.is_empty());
    assert!(resp.state.unwrap().is_null());
}

#[test]
fn validate_flags_bad_type_and_computed_attributes() {
    let mut server = server();
    let bad_type = call(
        &mut server,
        json!({
            "operation": "validate_resource_config",
            "type_name": TYPE_NAME,
            "config": { "type": "module" },
        }),
    );
    assert!(bad_type.diagnostics.has_error());

    let computed = call(
        &mut server,
        json!({
            "operation": "validate_resource_config",
            "type_name": TYPE_NAME,
            "config": { "public_key": "UABC" },
        }),
    );
    assert!(computed.diagnostics.has_error());

    let ok = call(
        &mut server,
        json!({
            "operation": "validate_resource_config",
            "type_name": TYPE_NAME,
            "config": { "type": "Curve" },
        }),
    );
    assert!(ok.diagnostics.is_empty());
}

#[test]
fn schema_exposes_nkey_attributes() {
    let mut server = server();
    let schema = call(&mut server, json!({ "operation": "get_schema" }))
        .schema
        .expect("schema should be set");
    let nkey = &schema.resources[TYPE_NAME];
    assert!(nkey.attributes["private_key"].sensitive);
    assert!(!nkey.attributes["public_key"].sensitive);
    assert_eq!(nkey.attributes["type"].default, Some(json!("account")));
}

#[test]
fn state_returned_to_host_keeps_the_seed() {
    // only logs are redacted
    let mut server = server();
    let resp = create(&mut server, json!({ "type": "account" }));
    let encoded = serde_json::to_string(&resp).unwrap();
    assert!(!encoded.contains(nats_provider_sdk::sensitive::REDACTED));
    assert!(encoded.contains("\"private_key\":\"SA"));
}

#[tokio::test]
async fn serve_round_trip() {
    let requests = [
        json!({ "operation": "get_metadata" }),
        json!({
            "operation": "create_resource",
            "type_name": TYPE_NAME,
            "plan": { "type": "server" },
        }),
        json!({ "operation": "import_resource_state", "type_name": "nats_other", "id": "x" }),
    ];
    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();

    let mut output = Vec::new();
    nats_provider_sdk::serve(
        NatsProvider::new("0.0.1"),
        tokio::io::BufReader::new(input.as_bytes()),
        &mut output,
    )
    .await
    .expect("serve should succeed");

    let output = String::from_utf8(output).unwrap();
    let mut lines = output.lines();
    let handshake = format!(
        "{}|{}|stdio",
        nats_provider_sdk::HANDSHAKE_PREFIX,
        nats_provider_sdk::PROTOCOL_VERSION
    );
    assert_eq!(lines.next(), Some(handshake.as_str()));

    let metadata: Response = serde_json::from_str(lines.next().unwrap()).unwrap();
    let metadata = metadata.metadata.unwrap();
    assert_eq!(metadata.provider.type_name, "nats");
    assert_eq!(metadata.provider.version, "0.0.1");
    assert_eq!(metadata.resources, [TYPE_NAME]);

    let created: Response = serde_json::from_str(lines.next().unwrap()).unwrap();
    let data = state_of(created);
    assert!(data.public_key.unwrap().starts_with('N'));

    let unknown: Response = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert!(unknown.diagnostics.has_error());

    assert_eq!(lines.next(), None);
}

#[test]
fn plan_defaults_apply_to_update() {
    let mut server = server();
    let created = create(&mut server, json!({})).state.unwrap();
    let resp = server.handle(Request::UpdateResource {
        type_name: TYPE_NAME.to_string(),
        prior_state: created.clone(),
        plan: Plan::new(json!({ "type": null })),
    });
    assert_eq!(resp.state, Some(created));
}
