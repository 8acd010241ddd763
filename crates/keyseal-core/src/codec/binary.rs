//! Compact binary keyset encoding.
//!
//! Protobuf layout of a cleartext Tink keyset:
//!
//! ```text
//! Keyset
//!   1: primary_key_id      uint32
//!   2: key                 repeated Key
//! Key
//!   1: key_data            KeyData
//!   2: status              enum KeyStatus
//!   3: key_id              uint32
//!   4: output_prefix_type  enum OutputPrefixType
//! KeyData
//!   1: type_url            string
//!   2: value               bytes
//!   3: key_material_type   enum KeyMaterialType
//! ```
//!
//! The encoder writes fields in field-number order and omits proto3 default
//! scalars, so equal keysets always produce identical bytes. The decoder
//! accepts any field order but rejects unknown fields, wrong wire types,
//! duplicate singular fields and unknown enum values.

use bytes::BufMut;

use crate::{
    codec::wire::{self, Reader, WireType},
    error::Result,
    keyset::{KeyEntry, KeyMaterialType, KeyStatus, Keyset, OutputPrefixType},
};

mod field {
    pub(super) const KEYSET_PRIMARY_KEY_ID: u32 = 1;
    pub(super) const KEYSET_KEY: u32 = 2;

    pub(super) const KEY_KEY_DATA: u32 = 1;
    pub(super) const KEY_STATUS: u32 = 2;
    pub(super) const KEY_KEY_ID: u32 = 3;
    pub(super) const KEY_OUTPUT_PREFIX_TYPE: u32 = 4;

    pub(super) const KEY_DATA_TYPE_URL: u32 = 1;
    pub(super) const KEY_DATA_VALUE: u32 = 2;
    pub(super) const KEY_DATA_KEY_MATERIAL_TYPE: u32 = 3;
}

/// Encode `keyset` into `dst`.
pub fn encode_into(keyset: &Keyset, dst: &mut impl BufMut) {
    wire::put_uint_field(dst, field::KEYSET_PRIMARY_KEY_ID, u64::from(keyset.primary_key_id()));
    for entry in keyset.entries() {
        wire::put_message_field(dst, field::KEYSET_KEY, &encode_key(entry));
    }
}

/// Encode `keyset` into a new buffer.
pub fn encode(keyset: &Keyset) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(keyset, &mut buf);
    buf
}

/// Decode a keyset.
///
/// # Errors
///
/// - `MalformedKeyset`: truncated input, trailing bytes, any structural or
///   enum error, an empty keyset, or duplicate key ids
pub fn decode(bytes: &[u8]) -> Result<Keyset> {
    let mut reader = Reader::new(bytes, "Keyset");
    let mut primary_key_id = None;
    let mut entries = Vec::new();

    while !reader.is_empty() {
        match reader.read_tag()? {
            (field::KEYSET_PRIMARY_KEY_ID, WireType::Varint) => {
                let value = reader.read_u32()?;
                wire::set_once(&mut primary_key_id, value, &reader, "primary_key_id")?;
            },
            (field::KEYSET_KEY, WireType::LengthDelimited) => {
                entries.push(decode_key(reader.read_bytes()?)?);
            },
            (field, wire_type) => return Err(reader.unexpected_field(field, wire_type)),
        }
    }

    let keyset = Keyset::new(primary_key_id.unwrap_or(0), entries)?;
    tracing::trace!(
        primary_key_id = keyset.primary_key_id(),
        keys = keyset.entries().len(),
        "decoded binary keyset"
    );
    Ok(keyset)
}

fn encode_key(entry: &KeyEntry) -> Vec<u8> {
    let mut key_data = Vec::with_capacity(entry.type_url.len() + entry.value.len() + 8);
    wire::put_bytes_field(&mut key_data, field::KEY_DATA_TYPE_URL, entry.type_url.as_bytes());
    wire::put_bytes_field(&mut key_data, field::KEY_DATA_VALUE, &entry.value);
    put_enum_field(
        &mut key_data,
        field::KEY_DATA_KEY_MATERIAL_TYPE,
        entry.key_material_type.to_proto(),
    );

    let mut key = Vec::with_capacity(key_data.len() + 16);
    wire::put_message_field(&mut key, field::KEY_KEY_DATA, &key_data);
    put_enum_field(&mut key, field::KEY_STATUS, entry.status.to_proto());
    wire::put_uint_field(&mut key, field::KEY_KEY_ID, u64::from(entry.key_id));
    put_enum_field(&mut key, field::KEY_OUTPUT_PREFIX_TYPE, entry.output_prefix.to_proto());
    key
}

fn put_enum_field(dst: &mut impl BufMut, field: u32, value: i32) {
    // int32 on the wire: negative values are sign-extended to 64 bits
    wire::put_uint_field(dst, field, value as i64 as u64);
}

struct KeyData {
    type_url: String,
    value: Vec<u8>,
    key_material_type: KeyMaterialType,
}

fn decode_key(bytes: &[u8]) -> Result<KeyEntry> {
    let mut reader = Reader::new(bytes, "Keyset.Key");
    let mut key_data = None;
    let mut status = None;
    let mut key_id = None;
    let mut output_prefix = None;

    while !reader.is_empty() {
        match reader.read_tag()? {
            (field::KEY_KEY_DATA, WireType::LengthDelimited) => {
                let value = decode_key_data(reader.read_bytes()?)?;
                wire::set_once(&mut key_data, value, &reader, "key_data")?;
            },
            (field::KEY_STATUS, WireType::Varint) => {
                let value = reader.read_enum()?;
                wire::set_once(&mut status, value, &reader, "status")?;
            },
            (field::KEY_KEY_ID, WireType::Varint) => {
                let value = reader.read_u32()?;
                wire::set_once(&mut key_id, value, &reader, "key_id")?;
            },
            (field::KEY_OUTPUT_PREFIX_TYPE, WireType::Varint) => {
                let value = reader.read_enum()?;
                wire::set_once(&mut output_prefix, value, &reader, "output_prefix_type")?;
            },
            (field, wire_type) => return Err(reader.unexpected_field(field, wire_type)),
        }
    }

    let key_data = key_data.ok_or_else(|| reader.error("missing key_data"))?;
    let status = status.unwrap_or(0);
    let status = KeyStatus::from_proto(status)
        .ok_or_else(|| reader.error(format!("unknown status {status}")))?;
    let output_prefix = output_prefix.unwrap_or(0);
    let output_prefix = OutputPrefixType::from_proto(output_prefix)
        .ok_or_else(|| reader.error(format!("unknown output_prefix_type {output_prefix}")))?;

    Ok(KeyEntry {
        key_id: key_id.unwrap_or(0),
        status,
        output_prefix,
        type_url: key_data.type_url,
        key_material_type: key_data.key_material_type,
        value: key_data.value,
    })
}

fn decode_key_data(bytes: &[u8]) -> Result<KeyData> {
    let mut reader = Reader::new(bytes, "KeyData");
    let mut type_url = None;
    let mut value = None;
    let mut key_material_type = None;

    while !reader.is_empty() {
        match reader.read_tag()? {
            (field::KEY_DATA_TYPE_URL, WireType::LengthDelimited) => {
                let parsed = reader.read_string()?;
                wire::set_once(&mut type_url, parsed, &reader, "type_url")?;
            },
            (field::KEY_DATA_VALUE, WireType::LengthDelimited) => {
                let parsed = reader.read_bytes()?.to_vec();
                wire::set_once(&mut value, parsed, &reader, "value")?;
            },
            (field::KEY_DATA_KEY_MATERIAL_TYPE, WireType::Varint) => {
                let parsed = reader.read_enum()?;
                wire::set_once(&mut key_material_type, parsed, &reader, "key_material_type")?;
            },
            (field, wire_type) => return Err(reader.unexpected_field(field, wire_type)),
        }
    }

    let key_material_type = key_material_type.unwrap_or(0);
    let key_material_type = KeyMaterialType::from_proto(key_material_type)
        .ok_or_else(|| reader.error(format!("unknown key_material_type {key_material_type}")))?;

    Ok(KeyData {
        type_url: type_url.unwrap_or_default(),
        value: value.unwrap_or_default(),
        key_material_type,
    })
}
