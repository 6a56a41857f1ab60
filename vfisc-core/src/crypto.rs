//! Cryptographic primitives for the MRA handshake.
//!
//! The gateway mandates a hybrid scheme: a fresh AES-256 session key is
//! wrapped with the MRA RSA public key (PKCS#1 v1.5) inside the credential
//! envelope, the token endpoint answers with a second AES key encrypted
//! under the session key, and the document array travels AES-256-ECB
//! encrypted under that returned key.
use base64ct::{Base64, Encoding};
use openssl::pkey::Public;
use openssl::rsa::{Padding, Rsa};
use openssl::symm::{decrypt, encrypt, Cipher};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("failed to generate random key material: {0}")]
    KeyGeneration(openssl::error::ErrorStack),
    #[error("failed to read public key file {path}: {source}")]
    PublicKeyRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse RSA public key: {0}")]
    PublicKeyParse(openssl::error::ErrorStack),
    #[error("payload of {len} bytes exceeds the {max} byte PKCS#1 v1.5 limit for this key")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("RSA encryption failed: {0}")]
    RsaWrap(openssl::error::ErrorStack),
    #[error("symmetric key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("invalid base64: {0}")]
    Base64(base64ct::Error),
    #[error("AES decryption failed: {0}")]
    Decryption(openssl::error::ErrorStack),
    #[error("decrypted payload is not valid UTF-8")]
    DecryptedNotUtf8(#[from] std::string::FromUtf8Error),
    #[error("AES encryption failed: {0}")]
    PayloadEncryption(openssl::error::ErrorStack),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A 32-byte AES-256 key. Carried around base64-encoded, since that is the
/// form both the credential envelope and the ECB routines consume.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: [u8; 32],
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.write_str("SymmetricKey(..)")
    }
}

impl SymmetricKey {
    /// Generate a fresh key from the OpenSSL CSPRNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 32];
        openssl::rand::rand_bytes(&mut bytes).map_err(CryptoError::KeyGeneration)?;
        Ok(Self { bytes })
    }

    /// Reconstruct a key from its base64 form, e.g. the decrypted key
    /// returned by the token endpoint.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let raw = Base64::decode_vec(encoded.trim()).map_err(CryptoError::Base64)?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(raw.len()))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.bytes)
    }
}

/// The MRA RSA public key, loaded from PEM, used to wrap the credential
/// envelope during token generation.
pub struct RsaWrapper {
    key: Rsa<Public>,
}

impl RsaWrapper {
    /// Load the gateway public key from a PEM file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| CryptoError::PublicKeyRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pem(&pem)
    }

    pub fn from_pem(pem: &[u8]) -> Result<Self, CryptoError> {
        let key = Rsa::public_key_from_pem(pem).map_err(CryptoError::PublicKeyParse)?;
        Ok(Self { key })
    }

    /// RSA-encrypt `payload` with PKCS#1 v1.5 padding and return it
    /// base64-encoded. PKCS#1 v1.5 caps the plaintext at modulus - 11
    /// bytes; anything larger is rejected up front.
    pub fn wrap(&self, payload: &[u8]) -> Result<String, CryptoError> {
        let max = self.key.size() as usize - 11;
        if payload.len() > max {
            return Err(CryptoError::PayloadTooLarge {
                len: payload.len(),
                max,
            });
        }
        let mut out = vec![0u8; self.key.size() as usize];
        let written = self
            .key
            .public_encrypt(payload, &mut out, Padding::PKCS1)
            .map_err(CryptoError::RsaWrap)?;
        out.truncate(written);
        Ok(Base64::encode_string(&out))
    }
}

/// AES-256-ECB encrypt `plaintext` with PKCS#7 padding, returning base64.
///
/// ECB with no IV is what the gateway specifies for both the document
/// array and the returned-key unwrap; it is not a choice this crate makes.
pub fn aes_ecb_encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    let ciphertext = encrypt(Cipher::aes_256_ecb(), key.as_bytes(), None, plaintext)
        .map_err(CryptoError::PayloadEncryption)?;
    Ok(Base64::encode_string(&ciphertext))
}

/// Decrypt a base64 AES-256-ECB ciphertext and return the UTF-8 plaintext.
pub fn aes_ecb_decrypt(key: &SymmetricKey, encoded: &str) -> Result<String, CryptoError> {
    let ciphertext = Base64::decode_vec(encoded.trim()).map_err(CryptoError::Base64)?;
    let plaintext = decrypt(Cipher::aes_256_ecb(), key.as_bytes(), None, &ciphertext)
        .map_err(CryptoError::Decryption)?;
    Ok(String::from_utf8(plaintext)?)
}
