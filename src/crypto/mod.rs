//! Transparent field-level encryption for customer-identifying data.
//!
//! `EncryptedString` and `EncryptedStringList` are value-object carrier types:
//! they marshal as plain strings/arrays at the API (serde) layer, and encrypt
//! themselves under the process-wide key automatically at the persistence
//! (sqlx) layer. No handler or service should ever branch on "is this field
//! encrypted" — it is a property of the column type, not of the call site.

use crate::utils::encryption::EncryptionKey;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, Postgres, Type};
use std::fmt;

static ENCRYPTION_KEY: OnceCell<EncryptionKey> = OnceCell::new();

/// Install the process-wide encryption key. Must be called exactly once
/// during bootstrap, before any `EncryptedString`/`EncryptedStringList`
/// value is encoded to or decoded from the database.
pub fn init_encryption_key(key: EncryptionKey) -> Result<(), &'static str> {
    ENCRYPTION_KEY
        .set(key)
        .map_err(|_| "encryption key already initialized")
}

fn key() -> &'static EncryptionKey {
    ENCRYPTION_KEY
        .get()
        .expect("encryption key not initialized; call crypto::init_encryption_key at startup")
}

/// A single string field that is encrypted at rest and transparent in code:
/// `Customer.insurance_id`, `OnlineOrder.delivery_address`, government ID
/// numbers, and similar fields all use this type.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedString(pub String);

impl EncryptedString {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for EncryptedString {
    /// Redacted debug output: ciphertext is already opaque, but plaintext
    /// values must never show up in logs incidentally.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedString(<redacted>)")
    }
}

impl From<String> for EncryptedString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Type<Postgres> for EncryptedString {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}

impl Encode<'_, Postgres> for EncryptedString {
    fn encode_by_ref(
        &self,
        buf: &mut PgArgumentBuffer,
    ) -> Result<IsNull, BoxDynError> {
        let ciphertext = key().encrypt(&self.0)?;
        <String as Encode<Postgres>>::encode(ciphertext, buf)
    }
}

impl Decode<'_, Postgres> for EncryptedString {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        let stored = <String as Decode<Postgres>>::decode(value)?;
        if EncryptionKey::is_ciphertext(&stored) {
            Ok(Self(key().decrypt(&stored)?))
        } else {
            // Legacy plaintext, pre-dating the encryption kernel. Surfaced
            // as-is rather than failing the read; the next write re-encrypts it.
            Ok(Self(stored))
        }
    }
}

/// A list of strings encrypted as a single ciphertext blob: medical history
/// entries, allergies, current medications.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedStringList(pub Vec<String>);

impl EncryptedStringList {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Debug for EncryptedStringList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedStringList(<{} redacted items>)", self.0.len())
    }
}

impl From<Vec<String>> for EncryptedStringList {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl Type<Postgres> for EncryptedStringList {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}

impl Encode<'_, Postgres> for EncryptedStringList {
    fn encode_by_ref(
        &self,
        buf: &mut PgArgumentBuffer,
    ) -> Result<IsNull, BoxDynError> {
        let ciphertext = key().encrypt_json(&self.0)?;
        <String as Encode<Postgres>>::encode(ciphertext, buf)
    }
}

impl Decode<'_, Postgres> for EncryptedStringList {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        let stored = <String as Decode<Postgres>>::decode(value)?;
        if EncryptionKey::is_ciphertext(&stored) {
            Ok(Self(key().decrypt_json(&stored)?))
        } else if stored.is_empty() {
            Ok(Self(Vec::new()))
        } else {
            // Legacy plaintext JSON array, pre-dating the encryption kernel.
            let items: Vec<String> = serde_json::from_str(&stored).unwrap_or_default();
            Ok(Self(items))
        }
    }
}
