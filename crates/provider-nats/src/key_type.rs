use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The category of an nkey, which decides the prefix of its encoded public key and seed
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    User,
    #[default]
    Account,
    Server,
    Cluster,
    Operator,
    /// x25519 key used for sealing payloads (an "xkey")
    Curve,
}

/// Returned when a key type string is none of the supported categories
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid nkey type `{0}`. Must be one of user|account|server|cluster|operator|curve")]
pub struct ParseKeyTypeError(pub String);

impl KeyType {
    pub const ALL: [KeyType; 6] = [
        KeyType::User,
        KeyType::Account,
        KeyType::Server,
        KeyType::Cluster,
        KeyType::Operator,
        KeyType::Curve,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            KeyType::User => "user",
            KeyType::Account => "account",
            KeyType::Server => "server",
            KeyType::Cluster => "cluster",
            KeyType::Operator => "operator",
            KeyType::Curve => "curve",
        }
    }

    /// First character of an encoded public key of this type. Seeds start with `S` followed by
    /// the same character.
    pub const fn prefix(self) -> char {
        match self {
            KeyType::User => 'U',
            KeyType::Account => 'A',
            KeyType::Server => 'N',
            KeyType::Cluster => 'C',
            KeyType::Operator => 'O',
            KeyType::Curve => 'X',
        }
    }

    /// Parses an optional type attribute, falling back to the default when unset
    pub fn from_attribute(value: Option<&str>) -> Result<Self, ParseKeyTypeError> {
        value.map_or(Ok(Self::default()), str::parse)
    }
}

impl FromStr for KeyType {
    type Err = ParseKeyTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(KeyType::User),
            "account" => Ok(KeyType::Account),
            "server" => Ok(KeyType::Server),
            "cluster" => Ok(KeyType::Cluster),
            "operator" => Ok(KeyType::Operator),
            "curve" => Ok(KeyType::Curve),
            _ => Err(ParseKeyTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<KeyType> for nkeys::KeyPairType {
    type Error = KeyType;

    /// Curve keys are not ed25519 key pairs and have no [`nkeys::KeyPairType`]
    fn try_from(kind: KeyType) -> Result<Self, Self::Error> {
        match kind {
            KeyType::User => Ok(nkeys::KeyPairType::User),
            KeyType::Account => Ok(nkeys::KeyPairType::Account),
            KeyType::Server => Ok(nkeys::KeyPairType::Server),
            KeyType::Cluster => Ok(nkeys::KeyPairType::Cluster),
            KeyType::Operator => Ok(nkeys::KeyPairType::Operator),
            KeyType::Curve => Err(kind),
        }
    }
}
