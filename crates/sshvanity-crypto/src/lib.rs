//! sshvanity Crypto Primitives
//!
//! Ed25519 key generation and the OpenSSH encodings that vanity patterns are
//! matched against.

pub mod ed25519;
pub mod encoding;
pub mod hash;
pub mod openssh;

pub use self::ed25519::{KeyError, KeyPair};
pub use self::encoding::{encode_public_key, fingerprint, EncodedPublicKey};

// Secret-holding return types
pub use zeroize::Zeroizing;
