//! Minimal GGUF metadata reader.
//!
//! Walks the key/value section of a GGUF header and keeps the two values
//! needed to size a KV cache: `<arch>.embedding_length` and
//! `<arch>.block_count`. Works on a prefix of the file, so a ranged
//! download of the first few megabytes is enough.

use crate::error::{HubError, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::Path;

/// GGUF format magic bytes.
pub const MAGIC: &[u8; 4] = b"GGUF";

/// Longest string accepted in a header.
const MAX_STRING_LEN: u64 = 1024 * 1024;

/// Nested array limit.
const MAX_ARRAY_DEPTH: usize = 10;

/// GGUF metadata value types.
mod value_type {
    pub const UINT8: u32 = 0;
    pub const INT8: u32 = 1;
    pub const UINT16: u32 = 2;
    pub const INT16: u32 = 3;
    pub const UINT32: u32 = 4;
    pub const INT32: u32 = 5;
    pub const FLOAT32: u32 = 6;
    pub const BOOL: u32 = 7;
    pub const STRING: u32 = 8;
    pub const ARRAY: u32 = 9;
    pub const UINT64: u32 = 10;
    pub const INT64: u32 = 11;
    pub const FLOAT64: u32 = 12;
}

/// Model dimensions read from a GGUF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParams {
    /// `<arch>.embedding_length`
    pub hidden_size: u64,
    /// `<arch>.block_count`
    pub hidden_layers: u64,
}

/// Outcome of scanning a (possibly partial) header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderScan {
    Found(ModelParams),
    /// The bytes ended before both values were seen.
    Incomplete,
    /// The whole key/value section was read without both values.
    Missing,
}

enum ReadError {
    Truncated,
    Invalid(String),
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ReadError::Truncated
        } else {
            ReadError::Invalid(err.to_string())
        }
    }
}

type ReadResult<T> = std::result::Result<T, ReadError>;

/// Scan the start of a GGUF file for model dimensions.
///
/// Fails only when the bytes are not a GGUF header this reader supports
/// (wrong magic, version other than 2 or 3, malformed values).
pub fn scan_header(bytes: &[u8]) -> Result<HeaderScan> {
    let mut reader = bytes;
    match read_params(&mut reader) {
        Ok(Some(params)) => Ok(HeaderScan::Found(params)),
        Ok(None) => Ok(HeaderScan::Missing),
        Err(ReadError::Truncated) => Ok(HeaderScan::Incomplete),
        Err(ReadError::Invalid(message)) => Err(HubError::Gguf { message }),
    }
}

/// Read model dimensions from a local GGUF file.
pub fn read_model_params(path: &Path) -> Result<Option<ModelParams>> {
    let file = std::fs::File::open(path).map_err(|e| HubError::io_with_path(e, path))?;
    let mut reader = io::BufReader::new(file);
    match read_params(&mut reader) {
        Ok(params) => Ok(params),
        Err(ReadError::Truncated) => Err(HubError::Gguf {
            message: format!("{} ends inside its header", path.display()),
        }),
        Err(ReadError::Invalid(message)) => Err(HubError::Gguf { message }),
    }
}

fn read_params<R: Read>(reader: &mut R) -> ReadResult<Option<ModelParams>> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(ReadError::Invalid(format!("Not a GGUF file (magic {:02x?})", magic)));
    }

    let version = read_u32(reader)?;
    if !(2..=3).contains(&version) {
        return Err(ReadError::Invalid(format!("Unsupported GGUF version {}", version)));
    }
    let _tensor_count = read_u64(reader)?;
    let metadata_count = read_u64(reader)?;

    let mut hidden_size = None;
    let mut hidden_layers = None;
    for _ in 0..metadata_count {
        let key = read_string(reader)?;
        let value_type = read_u32(reader)?;

        if key.ends_with(".embedding_length") {
            hidden_size = read_unsigned(reader, value_type)?;
        } else if key.ends_with(".block_count") {
            hidden_layers = read_unsigned(reader, value_type)?;
        } else {
            skip_value(reader, value_type, 0)?;
        }

        if let (Some(hidden_size), Some(hidden_layers)) = (hidden_size, hidden_layers) {
            return Ok(Some(ModelParams {
                hidden_size,
                hidden_layers,
            }));
        }
    }

    Ok(None)
}

fn read_u32<R: Read>(reader: &mut R) -> ReadResult<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> ReadResult<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a GGUF string (u64 length + UTF-8 bytes).
fn read_string<R: Read>(reader: &mut R) -> ReadResult<String> {
    let len = read_u64(reader)?;
    if len > MAX_STRING_LEN {
        return Err(ReadError::Invalid(format!("GGUF string too long ({} bytes)", len)));
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| ReadError::Invalid("Invalid UTF-8 in GGUF string".into()))
}

/// Read an integer value as `u64`. Negative or non-integer values yield
/// `None` after being skipped.
fn read_unsigned<R: Read>(reader: &mut R, ty: u32) -> ReadResult<Option<u64>> {
    let value = match ty {
        value_type::UINT8 => {
            let mut buf = [0u8; 1];
            reader.read_exact(&mut buf)?;
            Some(u64::from(buf[0]))
        }
        value_type::UINT16 => {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            Some(u64::from(u16::from_le_bytes(buf)))
        }
        value_type::UINT32 => Some(u64::from(read_u32(reader)?)),
        value_type::INT32 => u64::try_from(read_u32(reader)? as i32).ok(),
        value_type::UINT64 => Some(read_u64(reader)?),
        value_type::INT64 => u64::try_from(read_u64(reader)? as i64).ok(),
        other => {
            skip_value(reader, other, 0)?;
            None
        }
    };
    Ok(value)
}

fn fixed_size(ty: u32) -> Option<u64> {
    match ty {
        value_type::UINT8 | value_type::INT8 | value_type::BOOL => Some(1),
        value_type::UINT16 | value_type::INT16 => Some(2),
        value_type::UINT32 | value_type::INT32 | value_type::FLOAT32 => Some(4),
        value_type::UINT64 | value_type::INT64 | value_type::FLOAT64 => Some(8),
        _ => None,
    }
}

fn skip_bytes<R: Read>(reader: &mut R, count: u64) -> ReadResult<()> {
    let skipped = io::copy(&mut reader.take(count), &mut io::sink())?;
    if skipped < count {
        return Err(ReadError::Truncated);
    }
    Ok(())
}

fn skip_value<R: Read>(reader: &mut R, ty: u32, depth: usize) -> ReadResult<()> {
    if depth > MAX_ARRAY_DEPTH {
        return Err(ReadError::Invalid("GGUF array nesting too deep".into()));
    }

    if let Some(size) = fixed_size(ty) {
        return skip_bytes(reader, size);
    }
    match ty {
        value_type::STRING => {
            let len = read_u64(reader)?;
            skip_bytes(reader, len)
        }
        value_type::ARRAY => {
            let element_type = read_u32(reader)?;
            let len = read_u64(reader)?;
            if let Some(size) = fixed_size(element_type) {
                let total = size.checked_mul(len).ok_or_else(|| {
                    ReadError::Invalid(format!("GGUF array too large ({} elements)", len))
                })?;
                return skip_bytes(reader, total);
            }
            for _ in 0..len {
                skip_value(reader, element_type, depth + 1)?;
            }
            Ok(())
        }
        other => Err(ReadError::Invalid(format!("Unknown GGUF value type {}", other))),
    }
}
