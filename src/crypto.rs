//! Signature capability used by the proxy protocol
//!
//! The command layer only talks to [`SignatureService`]. [`Ed25519Signatures`]
//! is the production implementation: SHA-512 digests signed with Ed25519.

use crate::error::KeyFormatError;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest as _, Sha512};
use std::fmt;

/// SHA-512 digest of a message
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Digest([u8; 64]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

/// A public key registered against an account
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a PEM `PUBLIC KEY` block
    pub fn from_pem(pem: &str) -> Result<Self, KeyFormatError> {
        VerifyingKey::from_public_key_pem(pem.trim())
            .map(PublicKey)
            .map_err(|e| KeyFormatError(e.to_string()))
    }

    pub fn to_pem(&self) -> Result<String, KeyFormatError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyFormatError(e.to_string()))
    }

    /// Get public key as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// A signing key. Only clients composing proxy messages hold one.
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generate a new Ed25519 key
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        PrivateKey(SigningKey::generate(&mut csprng))
    }

    /// Parse a PEM `PRIVATE KEY` (PKCS#8) block
    pub fn from_pem(pem: &str) -> Result<Self, KeyFormatError> {
        SigningKey::from_pkcs8_pem(pem.trim())
            .map(PrivateKey)
            .map_err(|e| KeyFormatError(e.to_string()))
    }

    pub fn to_pem(&self) -> Result<String, KeyFormatError> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| KeyFormatError(e.to_string()))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }
}

/// Cryptographic primitives consumed by the command layer.
pub trait SignatureService: Send + Sync {
    fn hash(&self, data: &[u8]) -> Digest;

    /// `true` only if `signature` is a valid signature of `digest` under `key`.
    /// Undecodable signatures are simply invalid.
    fn verify(&self, digest: &Digest, signature: &[u8], key: &PublicKey) -> bool;

    fn sign(&self, digest: &Digest, key: &PrivateKey) -> Vec<u8>;

    fn parse_public_key(&self, encoded: &str) -> Result<PublicKey, KeyFormatError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Signatures;

impl SignatureService for Ed25519Signatures {
    fn hash(&self, data: &[u8]) -> Digest {
        let mut out = [0u8; 64];
        out.copy_from_slice(&Sha512::digest(data));
        Digest(out)
    }

    fn verify(&self, digest: &Digest, signature: &[u8], key: &PublicKey) -> bool {
        match Signature::from_slice(signature) {
            Ok(signature) => key.0.verify(digest.as_bytes(), &signature).is_ok(),
            Err(_) => false,
        }
    }

    fn sign(&self, digest: &Digest, key: &PrivateKey) -> Vec<u8> {
        key.0.sign(digest.as_bytes()).to_bytes().to_vec()
    }

    fn parse_public_key(&self, encoded: &str) -> Result<PublicKey, KeyFormatError> {
        PublicKey::from_pem(encoded)
    }
}
