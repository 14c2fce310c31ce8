//! Generation of nkey pairs

use nats_provider_sdk::Sensitive;
use nkeys::{KeyPair, XKey};
use thiserror::Error;

use crate::key_type::KeyType;

/// Errors that can occur while producing a key pair
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The key pair could not be created
    #[error("failed to create {0} key pair: {1}")]
    Create(KeyType, String),
    /// The public key could not be encoded
    #[error("failed to encode public key: {0}")]
    PublicKey(String),
    /// The seed could not be encoded
    #[error("failed to encode seed: {0}")]
    PrivateKey(#[source] nkeys::error::Error),
}

impl GenerateError {
    /// Summary shown to practitioners when this error aborts an operation
    pub fn summary(&self) -> &'static str {
        match self {
            GenerateError::Create(..) => "generating nkey",
            GenerateError::PublicKey(_) => "accessing public nkey",
            GenerateError::PrivateKey(_) => "accessing private nkey",
        }
    }
}

/// An encoded key pair. Both halves always come from the same generation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedKeys {
    pub key_type: KeyType,
    /// Encoded public key, e.g. `UB...`
    pub public_key: String,
    /// Encoded seed, e.g. `SU...`
    pub private_key: Sensitive,
}

/// Produces fresh key pairs. Implementations must never return the same pair twice.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self, key_type: KeyType) -> Result<GeneratedKeys, GenerateError>;
}

/// [`KeyGenerator`] backed by the `nkeys` crate
#[derive(Clone, Copy, Debug, Default)]
pub struct NkeysGenerator;

impl KeyGenerator for NkeysGenerator {
    fn generate(&self, key_type: KeyType) -> Result<GeneratedKeys, GenerateError> {
        let (public_key, seed) = match nkeys::KeyPairType::try_from(key_type) {
            Ok(kind) => {
                let kp = KeyPair::new(kind);
                (kp.public_key(), kp.seed())
            }
            Err(_) => {
                let xkey = XKey::new();
                (xkey.public_key(), xkey.seed())
            }
        };
        // Encoding the public key is infallible in `nkeys`, but an empty key must never reach state
        if public_key.is_empty() {
            return Err(GenerateError::PublicKey(format!(
                "{key_type} key pair produced an empty public key"
            )));
        }
        let seed = seed.map_err(GenerateError::PrivateKey)?;
        Ok(GeneratedKeys {
            key_type,
            public_key,
            private_key: Sensitive::new(seed),
        })
    }
}
