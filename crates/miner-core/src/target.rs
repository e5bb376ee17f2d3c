use std::fmt;
use std::str::FromStr;

use crate::constants::{HASH_BITS, HASH_HEX_SIZE, HASH_SIZE};
use crate::{Error, Hash, Result};

/// Difficulty threshold. A block hash qualifies when, read as a 256-bit
/// big-endian unsigned integer, it is strictly below the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target([u8; HASH_SIZE]);

impl Target {
    /// Every digest except `ff..ff` itself qualifies.
    pub const MAX: Target = Target([0xff; HASH_SIZE]);

    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a hex threshold. Shorter inputs are treated as integers and
    /// left-padded with zeros.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidTarget("empty string".into()));
        }
        if s.len() > HASH_HEX_SIZE {
            return Err(Error::InvalidTarget(format!(
                "{} hex digits, at most {HASH_HEX_SIZE} allowed",
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidTarget(format!("not hexadecimal: {s}")));
        }
        let padded = format!("{s:0>width$}", width = HASH_HEX_SIZE);
        let mut out = [0u8; HASH_SIZE];
        hex::decode_to_slice(padded, &mut out)
            .map_err(|e| Error::InvalidTarget(e.to_string()))?;
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Fixed-width unsigned comparison; byte arrays order big-endian.
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        hash < &self.0
    }

    /// Expected number of nonce attempts, roughly 2^256 / target.
    pub fn expected_steps(&self) -> f64 {
        let value = self.0.iter().fold(0f64, |acc, b| acc * 256.0 + f64::from(*b));
        if value == 0.0 {
            return f64::INFINITY;
        }
        2f64.powi(HASH_BITS as i32) / value
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
