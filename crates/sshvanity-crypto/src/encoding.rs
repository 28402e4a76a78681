//! OpenSSH public key encoding: SSH wire blob, base64 line, fingerprint

use std::fmt;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;

use crate::hash::sha256;

/// Algorithm identifier for Ed25519 keys
pub const ALGORITHM: &str = "ssh-ed25519";

/// Length of the wire blob: 4 + 11 (algorithm) + 4 + 32 (key)
pub const WIRE_BLOB_LEN: usize = 4 + ALGORITHM.len() + 4 + 32;

/// Length of `ssh-ed25519 <base64>` without a comment
pub const ENCODED_LEN: usize = ALGORITHM.len() + 1 + WIRE_BLOB_LEN.div_ceil(3) * 4;

/// Base64 lead-in shared by every Ed25519 public key (algorithm name and key length)
pub const BASE64_LEAD_IN: &str = "AAAAC3NzaC1lZDI1NTE5AAAAI";

/// Canonical single-line OpenSSH public key, without comment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedPublicKey(String);

impl EncodedPublicKey {
    /// The full `ssh-ed25519 <base64>` line
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Only the base64 wire blob
    pub fn base64_part(&self) -> &str {
        &self.0[ALGORITHM.len() + 1..]
    }

    /// The line with a trailing comment field, as written to `.pub` files
    pub fn with_comment(&self, comment: &str) -> String {
        if comment.is_empty() {
            self.0.clone()
        } else {
            format!("{} {}", self.0, comment)
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for EncodedPublicKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SSH wire format of an Ed25519 public key.
///
/// Each field is preceded by its length as a 4-byte big-endian integer:
/// `string "ssh-ed25519"`, then `string <32 key bytes>`.
pub fn wire_blob(public_key: &[u8; 32]) -> [u8; WIRE_BLOB_LEN] {
    let mut blob = [0u8; WIRE_BLOB_LEN];
    let mut offset = 0;

    for field in [ALGORITHM.as_bytes(), public_key.as_slice()] {
        blob[offset..offset + 4].copy_from_slice(&(field.len() as u32).to_be_bytes());
        offset += 4;
        blob[offset..offset + field.len()].copy_from_slice(field);
        offset += field.len();
    }

    debug_assert_eq!(offset, WIRE_BLOB_LEN);
    blob
}

/// Encode a raw Ed25519 public key as `ssh-ed25519 <base64 wire blob>`
pub fn encode_public_key(public_key: &[u8; 32]) -> EncodedPublicKey {
    let blob = wire_blob(public_key);

    let mut line = String::with_capacity(ENCODED_LEN);
    line.push_str(ALGORITHM);
    line.push(' ');
    STANDARD.encode_string(blob, &mut line);

    EncodedPublicKey(line)
}

/// Slice variant of [`encode_public_key`].
///
/// # Panics
/// Panics if `public_key` is not exactly 32 bytes. Keys always come from the
/// generator, so a wrong length is a bug in the caller.
pub fn encode_public_key_slice(public_key: &[u8]) -> EncodedPublicKey {
    let bytes: &[u8; 32] = public_key
        .try_into()
        .unwrap_or_else(|_| panic!("Ed25519 public key must be 32 bytes, got {}", public_key.len()));
    encode_public_key(bytes)
}

/// `SHA256:<unpadded base64>` fingerprint, as printed by `ssh-keygen -l`
pub fn fingerprint(public_key: &[u8; 32]) -> String {
    let digest = sha256(&wire_blob(public_key));
    format!("SHA256:{}", STANDARD_NO_PAD.encode(digest))
}
