use base64::Engine;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;

use crate::digest::ContentHash;

const SIGNATURE_LEN: usize = 64;

/// Errors from key handling and signature checks.
#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    /// The PEM block did not contain a usable Ed25519 public key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    /// The signature value was not valid base64 of 64 bytes.
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),
    /// The signature did not verify over the given hash bytes.
    #[error("signature verification failed")]
    VerificationFailed,
    /// The key material could not be exported.
    #[error("key export failed: {0}")]
    ExportFailed(String),
}

/// A registered Ed25519 public key, parsed from an SPKI PEM block.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
}

impl PublicKey {
    /// Parses a `-----BEGIN PUBLIC KEY-----` PEM block.
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let key = VerifyingKey::from_public_key_pem(pem)
            .map_err(|err| KeyError::InvalidPublicKey(err.to_string()))?;
        Ok(Self { key })
    }

    /// Verifies a base64 signature over the raw 32 bytes of `hash`.
    ///
    /// The hex hash is decoded first; the signature never covers the JSON
    /// text or the hex string itself.
    pub fn verify_hash(&self, hash: &ContentHash, signature_b64: &str) -> Result<(), KeyError> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(signature_b64)
            .map_err(|err| KeyError::InvalidSignatureEncoding(err.to_string()))?;
        if raw.len() != SIGNATURE_LEN {
            return Err(KeyError::InvalidSignatureEncoding(format!(
                "signature is {} bytes, expected {}",
                raw.len(),
                SIGNATURE_LEN
            )));
        }
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes.copy_from_slice(&raw);
        let signature = Signature::from_bytes(&bytes);
        self.key
            .verify(&hash.to_raw(), &signature)
            .map_err(|_| KeyError::VerificationFailed)
    }

    /// Hex form of the raw public key bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

/// A signing keypair used when emitting events.
///
/// Key material at rest lives with the signing-key provider; this type only
/// exists in memory at event-emission time.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generates a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Derives a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            key: self.signing_key.verifying_key(),
        }
    }

    /// SPKI PEM encoding of the public half, as registered in manifests.
    pub fn public_pem(&self) -> Result<String, KeyError> {
        self.signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|err| KeyError::ExportFailed(err.to_string()))
    }

    /// Signs the raw 32 bytes of `hash`, returning base64 signature bytes.
    pub fn sign_hash(&self, hash: &ContentHash) -> String {
        let signature = self.signing_key.sign(&hash.to_raw());
        base64::engine::general_purpose::STANDARD.encode(signature.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}
