// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the DKIM manager.
//!
//! This module provides specialized error types for:
//! - Key generation and public key derivation
//! - Reconciliation outcomes and their status classification
//! - Admission webhook payload decoding
//! - Schema revision conversion
//!
//! Reconciliation errors are never returned to the controller runtime as-is.
//! [`ReconcileError::reason`] maps each one onto the `Ready` condition reason
//! that is written to the resource status instead.

use crate::status_reasons::{REASON_FAILED, REASON_INVALID};
use thiserror::Error;

/// Errors produced while generating or deriving DKIM key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The PEM block type does not match the declared key type
    #[error("failed to decode PEM block containing {expected} private key (found {found:?})")]
    WrongBlockType {
        /// The block label the key type requires
        expected: &'static str,
        /// The block label actually found, if any
        found: Option<String>,
    },

    /// The PEM body could not be parsed as a private key
    #[error("failed to parse private key: {0}")]
    Parse(String),

    /// A PKCS#8 key holding something other than Ed25519
    #[error("not an ed25519 private key")]
    WrongAlgorithm,

    /// The stored RSA key does not have the declared modulus size
    #[error("key size mismatch: expected {expected} bits, got {actual} bits")]
    BitLengthMismatch {
        /// Bits declared in the spec
        expected: u32,
        /// Bits of the stored key's modulus
        actual: u32,
    },

    /// Key pair generation failed (entropy source or arithmetic failure)
    #[error("failed to generate key: {0}")]
    Generation(String),

    /// A freshly generated key could not be encoded
    #[error("failed to encode key: {0}")]
    Encoding(String),
}

impl KeyError {
    /// `true` for errors caused by the key material itself.
    ///
    /// Generation and encoding failures are not permanent: retrying may succeed.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !matches!(self, KeyError::Generation(_) | KeyError::Encoding(_))
    }
}

/// Errors produced by one reconciliation pass.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The resource or its stored state is malformed
    #[error("{0}")]
    Validation(String),

    /// A target name is already occupied by an object this resource does not own
    #[error("{0}")]
    Conflict(String),

    /// Key material could not be generated or derived
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The resource store failed
    #[error("{0:#}")]
    Operational(#[from] anyhow::Error),
}

impl ReconcileError {
    /// `true` when a later pass with unchanged inputs cannot succeed.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        match self {
            ReconcileError::Validation(_) | ReconcileError::Conflict(_) => true,
            ReconcileError::Key(e) => e.is_permanent(),
            ReconcileError::Operational(_) => false,
        }
    }

    /// The `Ready` condition reason this error is reported under.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        if self.is_permanent() {
            REASON_INVALID
        } else {
            REASON_FAILED
        }
    }
}

/// Errors decoding an admission review payload.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The review did not carry the object the operation requires
    #[error("admission request for {operation} is missing {field}")]
    MissingObject {
        /// Operation named by the request
        operation: String,
        /// `object` or `oldObject`
        field: &'static str,
    },

    /// The object could not be decoded into the expected type
    #[error("failed to decode {kind}: {source}")]
    Decode {
        /// Kind being decoded
        kind: &'static str,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

/// Errors converting between `DKIMKey` schema revisions.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The object or desired revision is not one this bridge knows
    #[error("unsupported apiVersion {0}")]
    UnsupportedVersion(String),

    /// The object could not be decoded or encoded
    #[error("failed to convert DKIMKey: {0}")]
    Serde(#[from] serde_json::Error),
}
