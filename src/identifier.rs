//! Random identifiers for uploads

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 128-bit random value, rendered as a hyphenated UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier(Uuid);

impl Identifier {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<Uuid> for Identifier {
    fn from(value: Uuid) -> Self {
        Identifier(value)
    }
}

pub trait IdentifierGenerator: Send + Sync {
    fn generate(&self) -> Identifier;
}

/// UUID v4 from the OS random source. Holds no state between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentifiers;

impl IdentifierGenerator for RandomIdentifiers {
    fn generate(&self) -> Identifier {
        Identifier(Uuid::new_v4())
    }
}

/// Key under which a stored file is retrieved.
///
/// Wraps whatever the server confirmed, which need not be the UUID the
/// client proposed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIdentifier(String);

impl FileIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        FileIdentifier(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Message handed to a share target so someone else can fetch the file
    pub fn share_message(&self) -> String {
        format!("Here's the file ID: {}", self.0)
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Identifier> for FileIdentifier {
    fn from(value: Identifier) -> Self {
        FileIdentifier(value.to_string())
    }
}

/// The `iv` field sent with every upload. Nothing reads it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxiliaryToken(Identifier);

impl AuxiliaryToken {
    pub fn new(value: Identifier) -> Self {
        AuxiliaryToken(value)
    }
}

impl fmt::Display for AuxiliaryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
