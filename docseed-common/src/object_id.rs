//! Object identifier utilities
//!
//! 12-byte document identifiers rendered as 24 lowercase hex characters.
//! Generated ids are laid out as `seconds (4) | process random (5) | counter (3)`.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Random bytes fixed for the lifetime of the process
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| rand::thread_rng().gen());

/// Per-process counter, seeded randomly so restarts do not replay sequences
static COUNTER: Lazy<AtomicU32> =
    Lazy::new(|| AtomicU32::new(rand::thread_rng().gen_range(0..0x00FF_FFFF)));

/// Native document identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        let seconds = crate::time::now().timestamp() as u32;
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) & 0x00FF_FFFF;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Parse from a 24-character hex string (either case)
    pub fn parse_str(s: &str) -> Result<Self> {
        if s.len() != 24 {
            return Err(Error::InvalidObjectId(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}
