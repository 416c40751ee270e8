//! Binary document codec
//!
//! ## Format (version 0x01)
//!
//! ```text
//! [Magic: "SCD"][Version: u8]
//! [Value]
//!
//! Value :=
//!   0x00                                   null
//!   0x01 | 0x02                            false | true
//!   0x03 [i64 BE]                          int
//!   0x04 [f64 bits BE]                     float
//!   0x05 [len: u32 BE][UTF-8 bytes]        string
//!   0x06 [count: u32 BE][Value]*           sequence
//!   0x07 [count: u32 BE]([len: u32 BE][key][Value])*   mapping
//! ```
//!
//! Decoding is all-or-nothing: any malformation yields a `DecodeError`
//! carrying the byte offset where it was detected. Lengths are checked
//! against `Limits` before anything is allocated.

use crate::document::{Document, Fields};
use crate::error::DecodeError;
use crate::limits::Limits;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Magic prefix of every encoded document
pub const MAGIC: &[u8; 3] = b"SCD";

/// Current format version
pub const FORMAT_VERSION: u8 = 0x01;

const TAG_NULL: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STRING: u8 = 0x05;
const TAG_SEQUENCE: u8 = 0x06;
const TAG_MAPPING: u8 = 0x07;

/// Encode a document to bytes
pub fn encode(doc: &Document) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(MAGIC);
    buf.push(FORMAT_VERSION);
    encode_value(doc, &mut buf);
    buf
}

fn encode_value(doc: &Document, buf: &mut Vec<u8>) {
    match doc {
        Document::Null => buf.push(TAG_NULL),
        Document::Bool(false) => buf.push(TAG_FALSE),
        Document::Bool(true) => buf.push(TAG_TRUE),
        Document::Int(i) => {
            buf.push(TAG_INT);
            buf.extend_from_slice(&i.to_be_bytes());
        }
        Document::Float(f) => {
            buf.push(TAG_FLOAT);
            buf.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Document::String(s) => {
            buf.push(TAG_STRING);
            encode_str(s, buf);
        }
        Document::Sequence(items) => {
            buf.push(TAG_SEQUENCE);
            encode_len(items.len(), buf);
            for item in items {
                encode_value(item, buf);
            }
        }
        Document::Mapping(fields) => {
            buf.push(TAG_MAPPING);
            encode_len(fields.len(), buf);
            for (key, value) in fields.iter() {
                encode_str(key, buf);
                encode_value(value, buf);
            }
        }
    }
}

fn encode_str(s: &str, buf: &mut Vec<u8>) {
    encode_len(s.len(), buf);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_len(len: usize, buf: &mut Vec<u8>) {
    debug_assert!(len <= u32::MAX as usize, "length prefix overflow");
    buf.extend_from_slice(&(len as u32).to_be_bytes());
}

/// Decode bytes with default limits
pub fn decode(bytes: &[u8]) -> Result<Document, DecodeError> {
    decode_with_limits(bytes, &Limits::default())
}

/// Decode bytes, enforcing explicit limits
pub fn decode_with_limits(bytes: &[u8], limits: &Limits) -> Result<Document, DecodeError> {
    let mut decoder = Decoder {
        cursor: Cursor::new(bytes),
        limits,
    };
    decoder.header()?;
    let doc = decoder.value(0)?;
    let end = decoder.offset();
    if end != bytes.len() {
        return Err(DecodeError::new(
            end,
            format!("{} trailing bytes after document", bytes.len() - end),
        ));
    }
    Ok(doc)
}

struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
    limits: &'a Limits,
}

impl<'a> Decoder<'a> {
    fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.offset())
    }

    fn truncated(&self) -> DecodeError {
        DecodeError::new(self.offset(), "truncated input")
    }

    fn header(&mut self) -> Result<(), DecodeError> {
        let mut magic = [0u8; 3];
        self.cursor
            .read_exact(&mut magic)
            .map_err(|_| DecodeError::new(0, "missing header"))?;
        if &magic != MAGIC {
            return Err(DecodeError::new(0, "bad magic; not an encoded document"));
        }
        let version = self.u8()?;
        if version != FORMAT_VERSION {
            return Err(DecodeError::new(
                3,
                format!("unsupported format version {version}"),
            ));
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        self.cursor.read_u8().map_err(|_| self.truncated())
    }

    fn len(&mut self) -> Result<usize, DecodeError> {
        self.cursor
            .read_u32::<BigEndian>()
            .map(|n| n as usize)
            .map_err(|_| self.truncated())
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let at = self.offset();
        let len = self.len()?;
        if len > self.limits.max_string_bytes {
            return Err(DecodeError::new(
                at,
                format!(
                    "string length {len} exceeds limit {}",
                    self.limits.max_string_bytes
                ),
            ));
        }
        if len > self.remaining() {
            return Err(self.truncated());
        }
        let start = self.offset();
        let mut bytes = vec![0u8; len];
        self.cursor
            .read_exact(&mut bytes)
            .map_err(|_| self.truncated())?;
        String::from_utf8(bytes).map_err(|e| {
            DecodeError::new(start + e.utf8_error().valid_up_to(), "invalid UTF-8 in string")
        })
    }

    fn value(&mut self, depth: usize) -> Result<Document, DecodeError> {
        let at = self.offset();
        let tag = self.u8()?;
        match tag {
            TAG_NULL => Ok(Document::Null),
            TAG_FALSE => Ok(Document::Bool(false)),
            TAG_TRUE => Ok(Document::Bool(true)),
            TAG_INT => self
                .cursor
                .read_i64::<BigEndian>()
                .map(Document::Int)
                .map_err(|_| self.truncated()),
            TAG_FLOAT => self
                .cursor
                .read_u64::<BigEndian>()
                .map(|bits| Document::Float(f64::from_bits(bits)))
                .map_err(|_| self.truncated()),
            TAG_STRING => self.string().map(Document::String),
            TAG_SEQUENCE => {
                self.enter(at, depth)?;
                let count = self.len()?;
                if count > self.limits.max_sequence_len {
                    return Err(DecodeError::new(
                        at + 1,
                        format!(
                            "sequence length {count} exceeds limit {}",
                            self.limits.max_sequence_len
                        ),
                    ));
                }
                // every value takes at least its tag byte
                if count > self.remaining() {
                    return Err(self.truncated());
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.value(depth + 1)?);
                }
                Ok(Document::Sequence(items))
            }
            TAG_MAPPING => {
                self.enter(at, depth)?;
                let count = self.len()?;
                if count > self.limits.max_mapping_entries {
                    return Err(DecodeError::new(
                        at + 1,
                        format!(
                            "mapping size {count} exceeds limit {}",
                            self.limits.max_mapping_entries
                        ),
                    ));
                }
                // key length prefix plus a value tag per entry
                if count.saturating_mul(5) > self.remaining() {
                    return Err(self.truncated());
                }
                let mut fields = Fields::with_capacity(count);
                for _ in 0..count {
                    let key_at = self.offset();
                    let key = self.string()?;
                    if fields.contains_key(&key) {
                        return Err(DecodeError::new(
                            key_at,
                            format!("duplicate mapping key '{key}'"),
                        ));
                    }
                    let value = self.value(depth + 1)?;
                    fields.insert(key, value);
                }
                Ok(Document::Mapping(fields))
            }
            other => Err(DecodeError::new(at, format!("unknown tag 0x{other:02x}"))),
        }
    }

    fn enter(&self, at: usize, depth: usize) -> Result<(), DecodeError> {
        if depth + 1 > self.limits.max_nesting_depth {
            return Err(DecodeError::new(
                at,
                format!(
                    "nesting depth exceeds limit {}",
                    self.limits.max_nesting_depth
                ),
            ));
        }
        Ok(())
    }
}
