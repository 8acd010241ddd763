//! Structured textual keyset encoding (Tink JSON form).
//!
//! ```text
//! {
//!     "primaryKeyId": 2596996162,
//!     "key": [{
//!         "keyData": { "typeUrl": "...", "value": "<base64>", "keyMaterialType": "SYMMETRIC" },
//!         "status": "ENABLED",
//!         "keyId": 2596996162,
//!         "outputPrefixType": "TINK"
//!     }]
//! }
//! ```
//!
//! Field order is fixed by the document structs below. Every field is
//! required and unknown fields are rejected, so a document that decodes is
//! structurally complete.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::{
    error::{KeysetError, Result},
    keyset::{KeyEntry, KeyMaterialType, KeyStatus, Keyset, OutputPrefixType},
};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct KeysetDocument {
    primary_key_id: u32,
    key: Vec<KeyDocument>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct KeyDocument {
    key_data: KeyDataDocument,
    status: KeyStatus,
    key_id: u32,
    output_prefix_type: OutputPrefixType,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct KeyDataDocument {
    type_url: String,
    #[serde(with = "base64_bytes")]
    value: Vec<u8>,
    key_material_type: KeyMaterialType,
}

impl From<&Keyset> for KeysetDocument {
    fn from(keyset: &Keyset) -> Self {
        Self {
            primary_key_id: keyset.primary_key_id(),
            key: keyset
                .entries()
                .iter()
                .map(|entry| KeyDocument {
                    key_data: KeyDataDocument {
                        type_url: entry.type_url.clone(),
                        value: entry.value.clone(),
                        key_material_type: entry.key_material_type,
                    },
                    status: entry.status,
                    key_id: entry.key_id,
                    output_prefix_type: entry.output_prefix,
                })
                .collect(),
        }
    }
}

impl TryFrom<KeysetDocument> for Keyset {
    type Error = KeysetError;

    fn try_from(document: KeysetDocument) -> Result<Self> {
        let entries = document
            .key
            .into_iter()
            .map(|key| KeyEntry {
                key_id: key.key_id,
                status: key.status,
                output_prefix: key.output_prefix_type,
                type_url: key.key_data.type_url,
                key_material_type: key.key_data.key_material_type,
                value: key.key_data.value,
            })
            .collect();

        Keyset::new(document.primary_key_id, entries)
    }
}

/// Encode `keyset` as compact JSON.
pub fn encode(keyset: &Keyset) -> String {
    let Ok(text) = serde_json::to_string(&KeysetDocument::from(keyset)) else {
        unreachable!("keyset documents contain only strings, integers and arrays");
    };
    text
}

/// Encode `keyset` as JSON indented with tabs, for display.
///
/// Decodes identically to [`encode`]'s output.
pub fn encode_pretty(keyset: &Keyset) -> String {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));

    let Ok(()) = KeysetDocument::from(keyset).serialize(&mut serializer) else {
        unreachable!("keyset documents contain only strings, integers and arrays");
    };

    let Ok(text) = String::from_utf8(buf) else {
        unreachable!("serde_json only writes valid UTF-8");
    };
    text
}

/// Decode a JSON keyset (compact or pretty).
///
/// # Errors
///
/// - `MalformedKeyset`: invalid JSON, a missing, unknown or mistyped field,
///   an unknown enum name, invalid base64, an empty keyset, or duplicate
///   key ids
pub fn decode(text: &str) -> Result<Keyset> {
    let document: KeysetDocument = serde_json::from_str(text)
        .map_err(|err| KeysetError::malformed(format!("keyset JSON: {err}")))?;

    let keyset = Keyset::try_from(document)?;
    tracing::trace!(
        primary_key_id = keyset.primary_key_id(),
        keys = keyset.entries().len(),
        "decoded JSON keyset"
    );
    Ok(keyset)
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(|err| D::Error::custom(format!("invalid base64 in value: {err}")))
    }
}
