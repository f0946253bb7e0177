//! Reservation code generation.
//!
//! The default generator draws 80 random bits per code and renders them in
//! Crockford base32, giving codes like `RES-7GQ2M4XKD9TPZC3A`. The
//! `UNIQUE` constraint on the stored code is the final backstop; the workflow
//! regenerates once when it fires.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::RngCore;

use crate::reservation::{ReservationCode, ValidationError};

/// Default code prefix.
pub const DEFAULT_CODE_PREFIX: &str = "RES";

/// Number of random bytes behind each code.
const ENTROPY_BYTES: usize = 10;

/// Crockford base32 alphabet (no I, L, O or U).
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Produces reservation codes.
pub trait CodeGenerator: Send + Sync {
    /// Returns a fresh code.
    fn generate(&self) -> ReservationCode;
}

pub(crate) fn validate_prefix(prefix: &str) -> Result<String, ValidationError> {
    let prefix = prefix.trim();
    if prefix.is_empty()
        || prefix.len() > 8
        || !prefix.bytes().all(|b| b.is_ascii_uppercase())
    {
        return Err(ValidationError {
            field: "code_prefix".into(),
            message: format!("code prefix '{prefix}' must be 1-8 uppercase ASCII letters"),
        });
    }
    Ok(prefix.to_string())
}

fn encode_base32(bytes: &[u8; ENTROPY_BYTES]) -> String {
    let mut out = String::with_capacity(ENTROPY_BYTES * 8 / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[((buffer >> bits) & 0x1f) as usize]));
        }
    }
    out
}

/// Generates codes from the thread-local CSPRNG.
///
/// # Examples
///
/// ```
/// use ticketbook::code::{CodeGenerator, RandomCodeGenerator};
///
/// let generator = RandomCodeGenerator::default();
/// let code = generator.generate();
/// assert!(code.as_str().starts_with("RES-"));
/// assert_eq!(code.as_str().len(), 4 + 16);
/// ```
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    prefix: String,
}

impl RandomCodeGenerator {
    /// Creates a generator with a custom prefix.
    ///
    /// # Errors
    ///
    /// Returns an error unless the prefix is 1 to 8 uppercase ASCII letters.
    pub fn with_prefix(prefix: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            prefix: validate_prefix(prefix)?,
        })
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CODE_PREFIX.to_string(),
        }
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> ReservationCode {
        let mut bytes = [0u8; ENTROPY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        ReservationCode::from_trusted(format!("{}-{}", self.prefix, encode_base32(&bytes)))
    }
}

/// Generates strictly increasing codes, `RES-000001`, `RES-000002`, ...
///
/// Only unique within one generator instance; meant for tests and demos
/// against a fresh database.
#[derive(Debug)]
pub struct SequentialCodeGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialCodeGenerator {
    /// Creates a generator starting at 1 with the default prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_CODE_PREFIX.to_string(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for SequentialCodeGenerator {
    fn generate(&self) -> ReservationCode {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ReservationCode::from_trusted(format!("{}-{n:06}", self.prefix))
    }
}

/// Hands out a scripted list of codes, then falls back to random ones.
///
/// Used to force collisions against codes already stored.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedCodeGenerator {
    script: std::sync::Mutex<std::collections::VecDeque<ReservationCode>>,
    fallback: RandomCodeGenerator,
}

#[cfg(test)]
impl ScriptedCodeGenerator {
    pub(crate) fn new(codes: impl IntoIterator<Item = ReservationCode>) -> Self {
        Self {
            script: std::sync::Mutex::new(codes.into_iter().collect()),
            fallback: RandomCodeGenerator::default(),
        }
    }
}

#[cfg(test)]
impl CodeGenerator for ScriptedCodeGenerator {
    fn generate(&self) -> ReservationCode {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        scripted.unwrap_or_else(|| self.fallback.generate())
    }
}
