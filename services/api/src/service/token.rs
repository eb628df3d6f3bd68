//! services/api/src/service/token.rs
//!
//! Session token generation.
//!
//! Tokens are 32 bytes from the operating system's CSPRNG, encoded as unpadded
//! URL-safe base64 (43 characters). Uniqueness is not re-checked against the
//! store: a collision between 256-bit random values is an accepted risk.

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};

pub const TOKEN_BYTES: usize = 32;

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
