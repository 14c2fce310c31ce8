//! A provider that generates [NATS nkeys](https://docs.nats.io/running-a-nats-service/configuration/securing_nats/auth_intro/nkey_auth).
//!
//! The `nats_nkey` resource creates an ed25519 key pair of the requested type (user, account,
//! server, cluster, operator, or an x25519 curve key) and keeps the encoded public key and seed
//! in state. Use [`NatsProvider`] with [`nats_provider_sdk::serve`] to expose it to a host.

pub mod generator;
pub mod key_type;
pub mod nkey;
pub mod provider;

pub use generator::{GenerateError, GeneratedKeys, KeyGenerator, NkeysGenerator};
pub use key_type::{KeyType, ParseKeyTypeError};
pub use nkey::{NkeyModel, NkeyResource};
pub use provider::{NatsProvider, PROVIDER_TYPE_NAME};
