//! Versioned table encoding for untrusted intent payloads.
//!
//! A table is `u8 version | u8 field_count | u32 offsets[field_count]`
//! followed by one `u32 length | bytes` segment per field. A list is
//! `u32 count | u32 offsets[count]` followed by the same segments. All
//! integers are big-endian and offsets are relative to the start of the
//! enclosing buffer.
//!
//! Decoding is a validation pass: every offset and length is checked with
//! checked arithmetic before any byte is sliced, segments must be laid out
//! back to back in field order, and trailing bytes are rejected. A single
//! corrupted header byte therefore always surfaces as a [`DecodeError`].

use thiserror::Error;

pub const TABLE_VERSION: u8 = 1;

/// Upper bound for address-like string fields
pub const MAX_STRING_LEN: usize = 128;

const TABLE_PREFIX_LEN: usize = 2;
const WORD: usize = 4;

/// Errors produced while validating an encoded payload
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("truncated payload: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("unsupported table version {0}")]
    UnsupportedVersion(u8),

    #[error("expected {expected} fields, got {got}")]
    FieldCount { expected: usize, got: usize },

    #[error("field {field}: offset {offset} points inside the header")]
    OffsetInHeader { field: usize, offset: usize },

    #[error("field {field}: offset {offset} is out of bounds")]
    OffsetOutOfBounds { field: usize, offset: usize },

    #[error("field {field}: offset {offset} does not follow the previous segment at {expected}")]
    NonCanonicalOffset {
        field: usize,
        offset: usize,
        expected: usize,
    },

    #[error("field {field}: length {len} runs past the end of the payload")]
    LengthOutOfBounds { field: usize, len: usize },

    #[error("field {field}: length {len} exceeds limit of {max}")]
    FieldTooLarge { field: usize, len: usize, max: usize },

    #[error("list of {len} entries exceeds limit of {max}")]
    ListTooLong { len: usize, max: usize },

    #[error("{0} trailing bytes after last segment")]
    TrailingBytes(usize),

    #[error("field {field}: expected {expected} bytes, got {got}")]
    InvalidWidth {
        field: usize,
        expected: usize,
        got: usize,
    },

    #[error("field {field}: invalid boolean byte {value}")]
    InvalidBool { field: usize, value: u8 },

    #[error("field {field}: invalid utf-8")]
    InvalidUtf8 { field: usize },

    #[error("field {field}: {reason}")]
    Invalid { field: usize, reason: String },
}

/// Structural limits applied while decoding untrusted input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_encoded_len: usize,
    pub max_field_len: usize,
    pub max_list_len: usize,
    pub max_pre_calls: usize,
    pub max_calls: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_encoded_len: 128 * 1024,
            max_field_len: 64 * 1024,
            max_list_len: 256,
            max_pre_calls: 16,
            max_calls: 64,
        }
    }
}

/// Builds a table field by field
#[derive(Debug, Default, Clone)]
pub struct TableWriter {
    fields: Vec<Vec<u8>>,
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.fields.push(value.to_vec());
        self
    }

    pub fn str(self, value: &str) -> Self {
        self.bytes(value.as_bytes())
    }

    pub fn u32(self, value: u32) -> Self {
        self.bytes(&value.to_be_bytes())
    }

    pub fn u64(self, value: u64) -> Self {
        self.bytes(&value.to_be_bytes())
    }

    pub fn u128(self, value: u128) -> Self {
        self.bytes(&value.to_be_bytes())
    }

    pub fn bool(self, value: bool) -> Self {
        self.bytes(&[value as u8])
    }

    pub fn list<I, T>(self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let encoded = encode_list(items);
        self.bytes(&encoded)
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(TABLE_VERSION);
        out.push(self.fields.len() as u8);
        write_segments(&mut out, &self.fields);
        out
    }
}

/// Encode a list of opaque items
pub fn encode_list<I, T>(items: I) -> Vec<u8>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let items: Vec<Vec<u8>> = items.into_iter().map(|i| i.as_ref().to_vec()).collect();
    let mut out = Vec::new();
    out.extend_from_slice(&(items.len() as u32).to_be_bytes());
    write_segments(&mut out, &items);
    out
}

fn write_segments(out: &mut Vec<u8>, segments: &[Vec<u8>]) {
    let header_end = out.len() + segments.len() * WORD;
    let mut cursor = header_end;
    for segment in segments {
        out.extend_from_slice(&(cursor as u32).to_be_bytes());
        cursor += WORD + segment.len();
    }
    for segment in segments {
        out.extend_from_slice(&(segment.len() as u32).to_be_bytes());
        out.extend_from_slice(segment);
    }
}

fn read_u32(buf: &[u8], at: usize) -> Result<usize, DecodeError> {
    let end = at.checked_add(WORD).ok_or(DecodeError::Truncated {
        needed: usize::MAX,
        available: buf.len(),
    })?;
    let word = buf.get(at..end).ok_or(DecodeError::Truncated {
        needed: end,
        available: buf.len(),
    })?;
    Ok(u32::from_be_bytes([word[0], word[1], word[2], word[3]]) as usize)
}

/// Walk `count` offset/segment pairs starting at `offsets_at`
fn parse_segments<'a>(
    buf: &'a [u8],
    offsets_at: usize,
    count: usize,
    limits: &DecodeLimits,
) -> Result<Vec<&'a [u8]>, DecodeError> {
    let header_end = count
        .checked_mul(WORD)
        .and_then(|n| n.checked_add(offsets_at))
        .ok_or(DecodeError::Truncated {
            needed: usize::MAX,
            available: buf.len(),
        })?;
    if header_end > buf.len() {
        return Err(DecodeError::Truncated {
            needed: header_end,
            available: buf.len(),
        });
    }

    let mut segments = Vec::with_capacity(count);
    let mut cursor = header_end;
    for field in 0..count {
        let offset = read_u32(buf, offsets_at + field * WORD)?;
        if offset < header_end {
            return Err(DecodeError::OffsetInHeader { field, offset });
        }
        let body_start = offset
            .checked_add(WORD)
            .filter(|end| *end <= buf.len())
            .ok_or(DecodeError::OffsetOutOfBounds { field, offset })?;
        if offset != cursor {
            return Err(DecodeError::NonCanonicalOffset {
                field,
                offset,
                expected: cursor,
            });
        }

        let len = read_u32(buf, offset)?;
        if len > limits.max_field_len {
            return Err(DecodeError::FieldTooLarge {
                field,
                len,
                max: limits.max_field_len,
            });
        }
        let body_end = body_start
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or(DecodeError::LengthOutOfBounds { field, len })?;

        segments.push(&buf[body_start..body_end]);
        cursor = body_end;
    }

    if cursor != buf.len() {
        return Err(DecodeError::TrailingBytes(buf.len() - cursor));
    }
    Ok(segments)
}

/// Decode a list produced by [`encode_list`]
pub fn decode_list<'a>(
    buf: &'a [u8],
    max_items: usize,
    limits: &DecodeLimits,
) -> Result<Vec<&'a [u8]>, DecodeError> {
    let count = read_u32(buf, 0)?;
    let max = max_items.min(limits.max_list_len);
    if count > max {
        return Err(DecodeError::ListTooLong { len: count, max });
    }
    parse_segments(buf, WORD, count, limits)
}

/// A validated view over an encoded table
#[derive(Debug, Clone)]
pub struct Table<'a> {
    fields: Vec<&'a [u8]>,
    limits: DecodeLimits,
}

impl<'a> Table<'a> {
    pub fn parse(
        buf: &'a [u8],
        expected_fields: usize,
        limits: &DecodeLimits,
    ) -> Result<Self, DecodeError> {
        if buf.len() > limits.max_encoded_len {
            return Err(DecodeError::PayloadTooLarge {
                len: buf.len(),
                max: limits.max_encoded_len,
            });
        }
        if buf.len() < TABLE_PREFIX_LEN {
            return Err(DecodeError::Truncated {
                needed: TABLE_PREFIX_LEN,
                available: buf.len(),
            });
        }
        if buf[0] != TABLE_VERSION {
            return Err(DecodeError::UnsupportedVersion(buf[0]));
        }
        let count = buf[1] as usize;
        if count != expected_fields {
            return Err(DecodeError::FieldCount {
                expected: expected_fields,
                got: count,
            });
        }

        let fields = parse_segments(buf, TABLE_PREFIX_LEN, count, limits)?;
        Ok(Self {
            fields,
            limits: *limits,
        })
    }

    pub fn bytes(&self, field: usize) -> Result<&'a [u8], DecodeError> {
        self.fields
            .get(field)
            .copied()
            .ok_or(DecodeError::Invalid {
                field,
                reason: "missing field".to_string(),
            })
    }

    pub fn fixed<const N: usize>(&self, field: usize) -> Result<[u8; N], DecodeError> {
        let raw = self.bytes(field)?;
        raw.try_into().map_err(|_| DecodeError::InvalidWidth {
            field,
            expected: N,
            got: raw.len(),
        })
    }

    pub fn u32(&self, field: usize) -> Result<u32, DecodeError> {
        self.fixed::<4>(field).map(u32::from_be_bytes)
    }

    pub fn u64(&self, field: usize) -> Result<u64, DecodeError> {
        self.fixed::<8>(field).map(u64::from_be_bytes)
    }

    pub fn u128(&self, field: usize) -> Result<u128, DecodeError> {
        self.fixed::<16>(field).map(u128::from_be_bytes)
    }

    pub fn bool(&self, field: usize) -> Result<bool, DecodeError> {
        match self.fixed::<1>(field)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidBool { field, value }),
        }
    }

    /// UTF-8 string bounded by [`MAX_STRING_LEN`]
    pub fn string(&self, field: usize) -> Result<String, DecodeError> {
        let raw = self.bytes(field)?;
        if raw.len() > MAX_STRING_LEN {
            return Err(DecodeError::FieldTooLarge {
                field,
                len: raw.len(),
                max: MAX_STRING_LEN,
            });
        }
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Nested list field, capped at `max_items`
    pub fn list(&self, field: usize, max_items: usize) -> Result<Vec<&'a [u8]>, DecodeError> {
        let raw = self.bytes(field)?;
        decode_list(raw, max_items, &self.limits).map_err(|e| DecodeError::Invalid {
            field,
            reason: e.to_string(),
        })
    }
}
