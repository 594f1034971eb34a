//! Persistence of quoted functions.
//!
//! Two formats are supported: pretty-printed JSON, and a binary envelope
//! laid out as
//!
//! ```text
//! +-------+-------------+-----------------+
//! | LMBD  | version u16 | bincode payload |
//! +-------+-------------+-----------------+
//!  4 bytes  little-endian
//! ```
//!
//! Decoding re-validates the function, so a decoded [`Lambda`] upholds the
//! same invariants as one built in memory. Binary payloads are capped at
//! [`MAX_PAYLOAD_SIZE`] bytes and bodies at [`MAX_DEPTH`] levels, which
//! bounds the recursion a crafted file can cause.

use crate::expression::lambda::LambdaDef;
use crate::expression::{ExpressionError, Lambda};
use bincode::Options;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

/// Leading bytes of the binary format
pub const MAGIC: &[u8; 4] = b"LMBD";

/// Current binary format version
pub const FORMAT_VERSION: u16 = 1;

/// Largest binary payload accepted, in bytes
pub const MAX_PAYLOAD_SIZE: u64 = 16 * 1024;

/// Deepest function body accepted
pub const MAX_DEPTH: usize = 128;

const HEADER_SIZE: usize = MAGIC.len() + std::mem::size_of::<u16>();

/// Errors that can occur while encoding or decoding quoted functions.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Bad magic: expected {expected:?}, got {actual:?}")]
    BadMagic { expected: [u8; 4], actual: Vec<u8> },

    #[error("Unsupported format version {version} (supported: {supported})")]
    UnsupportedVersion { version: u16, supported: u16 },

    #[error("Payload is too large: {size} bytes (max: {limit})")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Function body is too deep: {depth} levels (max: {limit})")]
    TooDeep { depth: usize, limit: usize },

    #[error("Invalid function: {0}")]
    InvalidLambda(#[from] ExpressionError),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Encode a function in the binary format
pub fn encode(lambda: &Lambda) -> CodecResult<Vec<u8>> {
    check_depth(lambda)?;
    let payload = binary_options().serialize(lambda)?;
    let size = payload.len() as u64;
    if size > MAX_PAYLOAD_SIZE {
        return Err(CodecError::PayloadTooLarge {
            size,
            limit: MAX_PAYLOAD_SIZE,
        });
    }
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.write_u16::<LittleEndian>(FORMAT_VERSION)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a function from the binary format
pub fn decode(data: &[u8]) -> CodecResult<Lambda> {
    let mut cursor = Cursor::new(data);

    let mut magic = [0u8; 4];
    if cursor.read_exact(&mut magic).is_err() || &magic != MAGIC {
        return Err(CodecError::BadMagic {
            expected: *MAGIC,
            actual: data.iter().take(MAGIC.len()).copied().collect(),
        });
    }

    let version = cursor.read_u16::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            version,
            supported: FORMAT_VERSION,
        });
    }

    let def: LambdaDef = binary_options()
        .with_limit(MAX_PAYLOAD_SIZE)
        .deserialize(&data[HEADER_SIZE..])?;
    let lambda = Lambda::try_from(def)?;
    check_depth(&lambda)?;
    Ok(lambda)
}

/// Encode a function as pretty-printed JSON
pub fn to_json(lambda: &Lambda) -> CodecResult<String> {
    Ok(serde_json::to_string_pretty(lambda)?)
}

/// Decode a function from JSON
pub fn from_json(text: &str) -> CodecResult<Lambda> {
    let def: LambdaDef = serde_json::from_str(text)?;
    let lambda = Lambda::try_from(def)?;
    check_depth(&lambda)?;
    Ok(lambda)
}

/// Read a function from `path`, in either format
pub fn load(path: impl AsRef<Path>) -> CodecResult<Lambda> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    log::debug!("loading {} ({} bytes)", path.display(), data.len());

    if data.starts_with(MAGIC) {
        decode(&data)
    } else {
        let text = String::from_utf8_lossy(&data);
        from_json(&text)
    }
}

pub fn save_json(lambda: &Lambda, path: impl AsRef<Path>) -> CodecResult<()> {
    let mut text = to_json(lambda)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

pub fn save_binary(lambda: &Lambda, path: impl AsRef<Path>) -> CodecResult<()> {
    fs::write(path, encode(lambda)?)?;
    Ok(())
}

fn binary_options() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

fn check_depth(lambda: &Lambda) -> CodecResult<()> {
    let depth = lambda.body().depth();
    if depth > MAX_DEPTH {
        return Err(CodecError::TooDeep {
            depth,
            limit: MAX_DEPTH,
        });
    }
    Ok(())
}
