//! API Key Generator
//!
//! Generates opaque API credentials as the lowercase hex encoding of
//! cryptographically-random bytes. The OS entropy source is the only
//! acceptable input here; a predictable key defeats the whole scheme.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::shared::error::{PlatformError, Result};

/// Default credential size in random bytes (encodes to 128 hex characters).
pub const DEFAULT_API_KEY_BYTES: usize = 64;

/// API key generator backed by the OS CSPRNG
pub struct ApiKeyGenerator;

impl ApiKeyGenerator {
    /// Generate a new API key from `byte_length` random bytes.
    ///
    /// Fails with `EntropyUnavailable` if the OS random source cannot
    /// supply bytes; that is fatal to the request being served.
    pub fn generate(byte_length: usize) -> Result<String> {
        let mut buf = vec![0u8; byte_length];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| PlatformError::entropy_unavailable(e.to_string()))?;
        Ok(hex::encode(buf))
    }

    /// Generate a key of the default length.
    pub fn generate_default() -> Result<String> {
        Self::generate(DEFAULT_API_KEY_BYTES)
    }
}
