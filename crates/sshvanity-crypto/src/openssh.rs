//! OpenSSH private key armor (`openssh-key-v1`)

use ssh_key::private::{Ed25519Keypair, Ed25519PrivateKey, KeypairData};
use ssh_key::public::Ed25519PublicKey;
use ssh_key::{LineEnding, PrivateKey};
use zeroize::Zeroizing;

use crate::ed25519::{KeyError, KeyPair};

/// Serialize an unencrypted OpenSSH private key with LF line endings
pub fn private_key_pem(keypair: &KeyPair, comment: &str) -> Result<Zeroizing<String>, KeyError> {
    let seed = keypair.private_key_bytes();
    let ssh_keypair = Ed25519Keypair {
        public: Ed25519PublicKey(keypair.public_key_bytes()),
        private: Ed25519PrivateKey::from_bytes(&seed),
    };

    let private_key = PrivateKey::new(KeypairData::Ed25519(ssh_keypair), comment)
        .map_err(|e| KeyError::Encoding(e.to_string()))?;

    private_key
        .to_openssh(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(e.to_string()))
}
