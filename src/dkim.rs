// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DKIM key pair generation and public key derivation.
//!
//! Private keys are PEM encoded: RSA keys as PKCS#1 (`RSA PRIVATE KEY`),
//! Ed25519 keys as PKCS#8 (`PRIVATE KEY`). Public keys are the DER-encoded
//! `SubjectPublicKeyInfo`, base64 (standard alphabet, no line wraps), which is
//! what the `p=` tag of a DKIM record carries.
//!
//! Deriving a public key is a pure function of the algorithm and the private
//! key bytes. The reconciler relies on this to recover after a crash between
//! storing the private key and publishing the DNS record: it re-derives the
//! public half from the stored secret instead of generating a new pair.
//!
//! # Example
//!
//! ```rust,no_run
//! use dkim_manager::crd::KeyAlgorithm;
//! use dkim_manager::dkim;
//!
//! let material = dkim::generate(KeyAlgorithm::Ed25519).unwrap();
//! let public = dkim::derive_public(KeyAlgorithm::Ed25519, &material.private_key_pem).unwrap();
//! assert_eq!(public, material.public_key);
//! ```

use crate::crd::KeyAlgorithm;
use crate::errors::KeyError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::pkcs8::{EncodePrivateKey as _, PrivateKeyInfo, ALGORITHM_OID};
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey as _, EncodeRsaPrivateKey as _};
use rsa::pkcs8::{EncodePublicKey, LineEnding, SecretDocument};
use rsa::traits::PublicKeyParts as _;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;

/// PEM label of a PKCS#1 RSA private key.
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// PEM label of a PKCS#8 private key.
pub const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// A generated key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// PEM-encoded private key, exactly as stored in the secret.
    pub private_key_pem: Vec<u8>,
    /// Base64 DER `SubjectPublicKeyInfo`.
    pub public_key: String,
    pub algorithm: KeyAlgorithm,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("private_key_pem", &"<redacted>")
            .field("public_key", &self.public_key)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Generate a key pair for `algorithm`.
///
/// # Errors
///
/// Returns [`KeyError::Generation`] or [`KeyError::Encoding`] if the entropy
/// source or the encoder fails.
pub fn generate(algorithm: KeyAlgorithm) -> Result<KeyMaterial, KeyError> {
    match algorithm {
        KeyAlgorithm::Rsa { bits } => generate_rsa(bits),
        KeyAlgorithm::Ed25519 => generate_ed25519(),
    }
}

/// Derive the base64 public key from a stored private key.
///
/// # Errors
///
/// Returns a permanent [`KeyError`] if the PEM block is of the wrong type, the
/// key cannot be parsed, it is not of the declared algorithm, or (for RSA) its
/// modulus size differs from the declared one.
pub fn derive_public(algorithm: KeyAlgorithm, private_key_pem: &[u8]) -> Result<String, KeyError> {
    match algorithm {
        KeyAlgorithm::Rsa { bits } => derive_rsa_public(private_key_pem, bits),
        KeyAlgorithm::Ed25519 => derive_ed25519_public(private_key_pem),
    }
}

/// Generate an RSA key pair with a `bits`-sized modulus.
///
/// # Errors
///
/// Returns an error if key generation or encoding fails.
pub fn generate_rsa(bits: u32) -> Result<KeyMaterial, KeyError> {
    let bit_size = usize::try_from(bits).map_err(|e| KeyError::Generation(e.to_string()))?;
    let private_key = RsaPrivateKey::new(&mut OsRng, bit_size)
        .map_err(|e| KeyError::Generation(e.to_string()))?;

    let pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(e.to_string()))?;

    Ok(KeyMaterial {
        private_key_pem: pem.as_bytes().to_vec(),
        public_key: encode_rsa_public(&private_key)?,
        algorithm: KeyAlgorithm::Rsa { bits },
    })
}

/// Generate an Ed25519 key pair.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn generate_ed25519() -> Result<KeyMaterial, KeyError> {
    let signing_key = SigningKey::generate(&mut OsRng);

    let pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(e.to_string()))?;

    Ok(KeyMaterial {
        private_key_pem: pem.as_bytes().to_vec(),
        public_key: encode_ed25519_public(&signing_key)?,
        algorithm: KeyAlgorithm::Ed25519,
    })
}

/// Derive the public key of a PKCS#1 RSA private key, asserting its size.
///
/// # Errors
///
/// Fails on a non-`RSA PRIVATE KEY` block, a malformed key, or a modulus that
/// is not exactly `expected_bits` long.
pub fn derive_rsa_public(private_key_pem: &[u8], expected_bits: u32) -> Result<String, KeyError> {
    let document = decode_pem(private_key_pem, RSA_PRIVATE_KEY_LABEL)?;

    let private_key = RsaPrivateKey::from_pkcs1_der(document.as_bytes())
        .map_err(|e| KeyError::Parse(e.to_string()))?;

    let actual = u32::try_from(private_key.n().bits()).unwrap_or(u32::MAX);
    if actual != expected_bits {
        return Err(KeyError::BitLengthMismatch {
            expected: expected_bits,
            actual,
        });
    }

    encode_rsa_public(&private_key)
}

/// Derive the public key of a PKCS#8 Ed25519 private key.
///
/// # Errors
///
/// Fails on a non-`PRIVATE KEY` block, a malformed key, or a PKCS#8 key of
/// another algorithm.
pub fn derive_ed25519_public(private_key_pem: &[u8]) -> Result<String, KeyError> {
    let document = decode_pem(private_key_pem, PKCS8_PRIVATE_KEY_LABEL)?;

    let info: PrivateKeyInfo<'_> = document
        .decode_msg()
        .map_err(|e| KeyError::Parse(e.to_string()))?;
    if info.algorithm.oid != ALGORITHM_OID {
        return Err(KeyError::WrongAlgorithm);
    }

    let signing_key = SigningKey::try_from(info).map_err(|e| KeyError::Parse(e.to_string()))?;
    encode_ed25519_public(&signing_key)
}

/// Decode a PEM document, requiring the given block label.
fn decode_pem(private_key_pem: &[u8], expected: &'static str) -> Result<SecretDocument, KeyError> {
    let text = std::str::from_utf8(private_key_pem).map_err(|_| KeyError::WrongBlockType {
        expected,
        found: None,
    })?;

    let (label, document) = SecretDocument::from_pem(text).map_err(|_| KeyError::WrongBlockType {
        expected,
        found: None,
    })?;

    if label != expected {
        return Err(KeyError::WrongBlockType {
            expected,
            found: Some(label.to_string()),
        });
    }

    Ok(document)
}

fn encode_rsa_public(private_key: &RsaPrivateKey) -> Result<String, KeyError> {
    let der = RsaPublicKey::from(private_key)
        .to_public_key_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(STANDARD.encode(der.as_bytes()))
}

fn encode_ed25519_public(signing_key: &SigningKey) -> Result<String, KeyError> {
    let der = signing_key
        .verifying_key()
        .to_public_key_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(STANDARD.encode(der.as_bytes()))
}
