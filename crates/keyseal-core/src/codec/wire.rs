//! Protobuf wire primitives.
//!
//! Only the two wire types keysets use are supported: varint (0) and
//! length-delimited (2). The reader is strict: every read is bounds checked
//! and any structural surprise is a `MalformedKeyset` error.

use bytes::BufMut;

use crate::error::{KeysetError, Result};

/// Longest valid varint encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Protobuf wire type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireType {
    Varint,
    LengthDelimited,
}

impl WireType {
    fn to_bits(self) -> u64 {
        match self {
            Self::Varint => 0,
            Self::LengthDelimited => 2,
        }
    }
}

pub(crate) fn put_varint(dst: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        dst.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

pub(crate) fn put_tag(dst: &mut impl BufMut, field: u32, wire_type: WireType) {
    put_varint(dst, (u64::from(field) << 3) | wire_type.to_bits());
}

/// Writes a varint field. Zero is the proto3 default and is omitted.
pub(crate) fn put_uint_field(dst: &mut impl BufMut, field: u32, value: u64) {
    if value == 0 {
        return;
    }
    put_tag(dst, field, WireType::Varint);
    put_varint(dst, value);
}

/// Writes a bytes or string field. Empty is the proto3 default and is omitted.
pub(crate) fn put_bytes_field(dst: &mut impl BufMut, field: u32, value: &[u8]) {
    if value.is_empty() {
        return;
    }
    put_message_field(dst, field, value);
}

/// Writes an embedded message. Always emitted, even when empty, so that
/// presence survives a round trip.
pub(crate) fn put_message_field(dst: &mut impl BufMut, field: u32, encoded: &[u8]) {
    put_tag(dst, field, WireType::LengthDelimited);
    put_varint(dst, encoded.len() as u64);
    dst.put_slice(encoded);
}

/// Cursor over an encoded message.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    message: &'static str,
}

impl<'a> Reader<'a> {
    /// `message` names the message being decoded, for error reports.
    pub(crate) fn new(buf: &'a [u8], message: &'static str) -> Self {
        Self { buf, message }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64> {
        let buf = self.buf;
        let mut value: u64 = 0;
        for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
            // The tenth byte may only carry the single remaining bit
            if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
                return Err(self.error("varint overflows 64 bits"));
            }
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                self.buf = &buf[i + 1..];
                return Ok(value);
            }
        }

        Err(self.error("truncated varint"))
    }

    /// Reads a field tag, returning `(field_number, wire_type)`.
    pub(crate) fn read_tag(&mut self) -> Result<(u32, WireType)> {
        let tag = self.read_varint()?;
        let field = u32::try_from(tag >> 3)
            .ok()
            .filter(|&field| field != 0)
            .ok_or_else(|| self.error(format!("invalid field number in tag {tag:#x}")))?;

        let wire_type = match tag & 0x07 {
            0 => WireType::Varint,
            2 => WireType::LengthDelimited,
            other => {
                return Err(self.error(format!("unsupported wire type {other} for field {field}")));
            },
        };

        Ok((field, wire_type))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let value = self.read_varint()?;
        u32::try_from(value).map_err(|_| self.error(format!("value {value} overflows uint32")))
    }

    pub(crate) fn read_enum(&mut self) -> Result<i32> {
        // Enums are int32 on the wire; negative values are sign-extended to 64 bits
        let value = self.read_varint()?;
        Ok(value as i64 as i32)
    }

    pub(crate) fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let declared = self.read_varint()?;
        let len = usize::try_from(declared)
            .ok()
            .filter(|&len| len <= self.buf.len())
            .ok_or_else(|| {
                self.error(format!(
                    "length-delimited field claims {declared} bytes, {} remain",
                    self.buf.len()
                ))
            })?;

        let (value, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(value)
    }

    pub(crate) fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| self.error("string field is not UTF-8"))
    }

    /// Error for a field this message does not define (or defines with a
    /// different wire type).
    pub(crate) fn unexpected_field(&self, field: u32, wire_type: WireType) -> KeysetError {
        self.error(format!("unexpected field {field} with wire type {wire_type:?}"))
    }

    pub(crate) fn error(&self, reason: impl std::fmt::Display) -> KeysetError {
        KeysetError::malformed(format!("{}: {reason}", self.message))
    }
}

/// Stores a singular field, rejecting a second occurrence.
pub(crate) fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    reader: &Reader<'_>,
    name: &str,
) -> Result<()> {
    if slot.is_some() {
        return Err(reader.error(format!("duplicate field {name}")));
    }
    *slot = Some(value);
    Ok(())
}
