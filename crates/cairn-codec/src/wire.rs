//! Byte layout of a container.
//!
//! ```text
//! "CRNC" | u32 BE version | u32 BE element count
//! per element:
//!   32-byte key | varint object_id | varint version | flags
//!   | varint raw length | varint stored length | u32 BE CRC32 | stored bytes
//! 32-byte BLAKE3 (container domain) of everything above
//! ```
//!
//! Flags: bit 0 marks a leaf, bit 1 marks a zstd-compressed value. The first
//! element is the head.

use std::collections::HashSet;

use cairn_crypto::ContentHasher;
use cairn_store::{StoreError, StructureElement};
use cairn_types::{ObjectKey, ObjectType};

use crate::config::CodecConfig;
use crate::error::{decode_err, CodecError, CodecResult};

pub const MAGIC: &[u8; 4] = b"CRNC";
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 12;
const TRAILER_LEN: usize = 32;
const FLAG_LEAF: u8 = 0b01;
const FLAG_ZSTD: u8 = 0b10;

/// Serialize elements, head first.
///
/// Both the encoded container and the sum of the raw values must fit in
/// `max_container_size`.
pub fn encode<'a>(
    elements: impl IntoIterator<Item = &'a StructureElement>,
    config: &CodecConfig,
) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());

    let mut count: u32 = 0;
    let mut raw_total: usize = 0;
    for element in elements {
        raw_total = raw_total.saturating_add(element.value.len());
        if raw_total > config.max_container_size {
            return Err(CodecError::TooLarge {
                size: raw_total,
                max: config.max_container_size,
            });
        }
        count = count
            .checked_add(1)
            .ok_or(CodecError::TooLarge {
                size: out.len(),
                max: config.max_container_size,
            })?;
        let (stored, compressed) = compress_value(&element.value, config)?;
        let mut flags = 0;
        if element.is_leaf {
            flags |= FLAG_LEAF;
        }
        if compressed {
            flags |= FLAG_ZSTD;
        }

        out.extend_from_slice(element.key.as_bytes());
        encode_varint(&mut out, u64::from(element.object_type.object_id));
        encode_varint(&mut out, u64::from(element.object_type.version));
        out.push(flags);
        encode_varint(&mut out, element.value.len() as u64);
        encode_varint(&mut out, stored.len() as u64);
        out.extend_from_slice(&crc32fast::hash(&stored).to_be_bytes());
        out.extend_from_slice(&stored);
    }
    out[8..HEADER_LEN].copy_from_slice(&count.to_be_bytes());

    let checksum = ContentHasher::CONTAINER.hash(&out);
    out.extend_from_slice(checksum.as_bytes());

    if out.len() > config.max_container_size {
        return Err(CodecError::TooLarge {
            size: out.len(),
            max: config.max_container_size,
        });
    }
    Ok(out)
}

/// Parse and verify a container, returning its elements head first.
///
/// Every element's key is recomputed from its value; duplicates are
/// rejected. Decompressed values share one `max_container_size` budget. An
/// empty element list is returned as-is.
pub fn decode(data: &[u8], config: &CodecConfig) -> CodecResult<Vec<StructureElement>> {
    if data.len() > config.max_container_size {
        return Err(decode_err(format!(
            "container of {} bytes exceeds limit of {}",
            data.len(),
            config.max_container_size
        )));
    }
    if data.len() < HEADER_LEN + TRAILER_LEN {
        return Err(decode_err(format!("container too short: {} bytes", data.len())));
    }

    let (body, trailer) = data.split_at(data.len() - TRAILER_LEN);
    if ContentHasher::CONTAINER.hash(body).as_bytes().as_slice() != trailer {
        return Err(decode_err("container checksum mismatch"));
    }
    if &body[0..4] != MAGIC {
        return Err(decode_err(format!(
            "invalid magic: expected {:?}, got {:?}",
            String::from_utf8_lossy(MAGIC),
            String::from_utf8_lossy(&body[0..4])
        )));
    }

    let mut cursor = Cursor::new(body, 4);
    let version = cursor.u32_be()?;
    if version != FORMAT_VERSION {
        return Err(decode_err(format!("unsupported container version: {version}")));
    }
    let count = cursor.u32_be()?;

    let mut seen = HashSet::new();
    let mut elements = Vec::new();
    let mut budget = config.max_container_size;
    for index in 0..count {
        let element = read_element(&mut cursor, config, &mut budget).map_err(|e| match e {
            CodecError::Decode(reason) => decode_err(format!("element {index}: {reason}")),
            other => other,
        })?;
        if !seen.insert(element.key) {
            return Err(decode_err(format!("duplicate key {}", element.key)));
        }
        elements.push(element);
    }

    if !cursor.is_at_end() {
        return Err(decode_err(format!(
            "{} unexpected bytes after last element",
            cursor.remaining()
        )));
    }
    Ok(elements)
}

fn read_element(cursor: &mut Cursor<'_>, config: &CodecConfig, budget: &mut usize) -> CodecResult<StructureElement> {
    let key = ObjectKey::from_slice(cursor.take(ObjectKey::LEN)?).map_err(|e| decode_err(e.to_string()))?;
    let object_id = cursor.varint_u32("object id")?;
    let version = cursor.varint_u32("type version")?;
    let flags = cursor.u8()?;
    if flags & !(FLAG_LEAF | FLAG_ZSTD) != 0 {
        return Err(decode_err(format!("unknown flag bits: {flags:#04x}")));
    }
    let raw_len = cursor.varint_len("raw length")?;
    let stored_len = cursor.varint_len("stored length")?;
    let crc = cursor.u32_be()?;
    let stored = cursor.take(stored_len)?;

    if crc32fast::hash(stored) != crc {
        return Err(decode_err(format!("CRC32 mismatch for {}", key.short_hex())));
    }
    if raw_len > *budget {
        return Err(decode_err(format!(
            "value of {raw_len} bytes exceeds the remaining {} of {} decoded bytes",
            *budget, config.max_container_size
        )));
    }
    *budget -= raw_len;

    let value = if flags & FLAG_ZSTD != 0 {
        zstd::bulk::decompress(stored, raw_len).map_err(|e| decode_err(format!("decompression failed: {e}")))?
    } else {
        stored.to_vec()
    };
    if value.len() != raw_len {
        return Err(decode_err(format!(
            "size mismatch: expected {raw_len}, got {}",
            value.len()
        )));
    }

    let element = StructureElement::from_parts(
        key,
        ObjectType::new(object_id, version),
        flags & FLAG_LEAF != 0,
        value,
    );
    match element.verify() {
        Ok(()) => Ok(element),
        Err(StoreError::KeyMismatch { key, computed }) => Err(decode_err(format!(
            "key {} does not match value (hashes to {})",
            key.short_hex(),
            computed.short_hex()
        ))),
        Err(e) => Err(e.into()),
    }
}

fn compress_value(value: &[u8], config: &CodecConfig) -> CodecResult<(Vec<u8>, bool)> {
    if config.compression_threshold == 0 || value.len() < config.compression_threshold {
        return Ok((value.to_vec(), false));
    }
    let compressed = zstd::bulk::compress(value, config.compression_level)
        .map_err(|e| CodecError::Compression(e.to_string()))?;
    if compressed.len() < value.len() {
        Ok((compressed, true))
    } else {
        Ok((value.to_vec(), false))
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(decode_err(format!(
                "truncated: need {n} bytes at offset {}, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32_be(&mut self) -> CodecResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn varint(&mut self) -> CodecResult<u64> {
        let (value, consumed) = decode_varint(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    fn varint_u32(&mut self, what: &str) -> CodecResult<u32> {
        let value = self.varint()?;
        u32::try_from(value).map_err(|_| decode_err(format!("{what} out of range: {value}")))
    }

    fn varint_len(&mut self, what: &str) -> CodecResult<usize> {
        let value = self.varint()?;
        usize::try_from(value).map_err(|_| decode_err(format!("{what} out of range: {value}")))
    }
}

/// Encode a u64 as a LEB128 variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> CodecResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        if shift >= 64 {
            return Err(decode_err("varint overflow"));
        }
        value |= u64::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(decode_err("truncated varint"))
}
