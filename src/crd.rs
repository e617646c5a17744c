// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for DKIM key management.
//!
//! # Resource Types
//!
//! - [`v2::DKIMKey`] - the storage (hub) revision, status as conditions
//! - [`v1::DKIMKey`] - the legacy revision, status as a bare string
//! - [`DNSEndpoint`] - the external-dns record object the controller publishes into
//!
//! Both `DKIMKey` revisions share the same spec shape. The controller always works
//! on `v2`; `v1` only exists on the wire and is bridged by [`crate::conversion`].
//!
//! # Example: Declaring a DKIM key
//!
//! ```rust,no_run
//! use dkim_manager::crd::{DKIMKeySpec, KeyLength, KeyType};
//!
//! let spec = DKIMKeySpec {
//!     secret_name: "example-com-s1".to_string(),
//!     selector: "s1".to_string(),
//!     domain: "example.com".to_string(),
//!     ttl: 86400,
//!     key_length: KeyLength::Bits2048,
//!     key_type: KeyType::Rsa,
//! };
//! assert_eq!(spec.dns_name(), "s1._domainkey.example.com");
//! ```

use crate::constants::{DEFAULT_DKIM_RECORD_TTL_SECS, DOMAINKEY_LABEL};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

pub use v2::{DKIMKey, DKIMKeySpec, DKIMKeyStatus};

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. `DKIMKey` only reports `Ready`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The `metadata.generation` this condition was computed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// DKIM key algorithm as declared in the spec.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Rsa,
    Ed25519,
}

impl KeyType {
    /// The `k=` tag value used in the DKIM record.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Rsa => "rsa",
            KeyType::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RSA modulus size. Only meaningful for [`KeyType::Rsa`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeyLength {
    Bits1024,
    #[default]
    Bits2048,
    Bits4096,
}

impl KeyLength {
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            KeyLength::Bits1024 => 1024,
            KeyLength::Bits2048 => 2048,
            KeyLength::Bits4096 => 4096,
        }
    }
}

impl From<KeyLength> for u32 {
    fn from(length: KeyLength) -> Self {
        length.bits()
    }
}

impl TryFrom<u32> for KeyLength {
    type Error = String;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            1024 => Ok(KeyLength::Bits1024),
            2048 => Ok(KeyLength::Bits2048),
            4096 => Ok(KeyLength::Bits4096),
            other => Err(format!(
                "unsupported key length {other}, expected one of 1024, 2048, 4096"
            )),
        }
    }
}

impl JsonSchema for KeyLength {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> Cow<'static, str> {
        "KeyLength".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "integer",
            "enum": [1024, 2048, 4096],
        })
    }
}

/// The concrete algorithm a `DKIMKey` resolves to.
///
/// Folds `keyType` and `keyLength` together so a bit length can only exist
/// alongside RSA.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa { bits: u32 },
    Ed25519,
}

impl KeyAlgorithm {
    #[must_use]
    pub fn from_parts(key_type: KeyType, key_length: KeyLength) -> Self {
        match key_type {
            KeyType::Rsa => KeyAlgorithm::Rsa {
                bits: key_length.bits(),
            },
            KeyType::Ed25519 => KeyAlgorithm::Ed25519,
        }
    }

    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyAlgorithm::Rsa { .. } => KeyType::Rsa,
            KeyAlgorithm::Ed25519 => KeyType::Ed25519,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa { bits } => write!(f, "rsa-{bits}"),
            KeyAlgorithm::Ed25519 => f.write_str("ed25519"),
        }
    }
}

fn default_ttl() -> u64 {
    DEFAULT_DKIM_RECORD_TTL_SECS
}

/// Current `DKIMKey` revision.
pub mod v2 {
    use super::{default_ttl, Condition, KeyAlgorithm, KeyLength, KeyType, DOMAINKEY_LABEL};
    use crate::status_reasons::{CONDITION_STATUS_TRUE, CONDITION_TYPE_READY};
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    /// `DKIMKey` declares a DKIM key pair for a domain/selector.
    ///
    /// The controller generates the key pair, stores the private half in an
    /// immutable `Secret` named `secretName`, and publishes the public half as a
    /// `DNSEndpoint` TXT record at `{selector}._domainkey.{domain}`.
    ///
    /// # Example
    ///
    /// ```yaml
    /// apiVersion: dkim-manager.atelierhsn.com/v2
    /// kind: DKIMKey
    /// metadata:
    ///   name: example-com-s1
    ///   namespace: mail
    /// spec:
    ///   secretName: example-com-s1
    ///   selector: s1
    ///   domain: example.com
    ///   keyType: rsa
    ///   keyLength: 2048
    /// ```
    #[derive(CustomResource, Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
    #[kube(
        group = "dkim-manager.atelierhsn.com",
        version = "v2",
        kind = "DKIMKey",
        namespaced,
        shortname = "dk",
        derive = "PartialEq",
        doc = "DKIMKey declares a DKIM key pair whose private key is stored in a Secret and whose public key is published as a DNSEndpoint TXT record.",
        printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
        printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
    )]
    #[kube(status = "DKIMKeyStatus")]
    #[serde(rename_all = "camelCase")]
    pub struct DKIMKeySpec {
        /// Name of the `Secret` holding the private key.
        pub secret_name: String,

        /// DKIM selector.
        pub selector: String,

        /// Domain the DKIM record is published under.
        pub domain: String,

        /// TTL of the DKIM record, in seconds. The only mutable spec field.
        #[serde(default = "default_ttl")]
        pub ttl: u64,

        /// RSA modulus size in bits. Ignored for ed25519 keys.
        #[serde(default)]
        pub key_length: KeyLength,

        /// Key algorithm.
        #[serde(default)]
        pub key_type: KeyType,
    }

    impl DKIMKeySpec {
        #[must_use]
        pub fn algorithm(&self) -> KeyAlgorithm {
            KeyAlgorithm::from_parts(self.key_type, self.key_length)
        }

        /// Data key under which the private key is stored in the secret.
        #[must_use]
        pub fn private_key_name(&self) -> String {
            format!("{}.{}.key", self.domain, self.selector)
        }

        /// Fully qualified name of the DKIM TXT record.
        #[must_use]
        pub fn dns_name(&self) -> String {
            format!("{}.{DOMAINKEY_LABEL}.{}", self.selector, self.domain)
        }
    }

    /// `DKIMKey` status.
    #[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct DKIMKeyStatus {
        /// The last `metadata.generation` the controller acted on.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub observed_generation: Option<i64>,

        #[serde(default)]
        pub conditions: Vec<Condition>,
    }

    impl DKIMKey {
        /// `true` when a `Ready=True` condition is present.
        #[must_use]
        pub fn is_ready(&self) -> bool {
            self.status.as_ref().is_some_and(|status| {
                status.conditions.iter().any(|c| {
                    c.r#type == CONDITION_TYPE_READY && c.status == CONDITION_STATUS_TRUE
                })
            })
        }

        /// `true` when a condition with exactly this type, status and reason is present.
        #[must_use]
        pub fn has_condition(&self, condition_type: &str, status: &str, reason: &str) -> bool {
            self.status.as_ref().is_some_and(|s| {
                s.conditions.iter().any(|c| {
                    c.r#type == condition_type
                        && c.status == status
                        && c.reason.as_deref() == Some(reason)
                })
            })
        }

        #[must_use]
        pub fn observed_generation(&self) -> Option<i64> {
            self.status.as_ref().and_then(|s| s.observed_generation)
        }
    }
}

/// Legacy `DKIMKey` revision.
pub mod v1 {
    use super::{default_ttl, KeyLength, KeyType};
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    /// Legacy `DKIMKey` with a single-string status.
    #[derive(CustomResource, Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
    #[kube(
        group = "dkim-manager.atelierhsn.com",
        version = "v1",
        kind = "DKIMKey",
        namespaced,
        shortname = "dk",
        derive = "PartialEq",
        doc = "DKIMKey (legacy revision) declares a DKIM key pair. Superseded by v2."
    )]
    #[kube(status = "LegacyStatus")]
    #[serde(rename_all = "camelCase")]
    pub struct DKIMKeySpec {
        /// Name of the `Secret` holding the private key.
        pub secret_name: String,

        /// DKIM selector.
        pub selector: String,

        /// Domain the DKIM record is published under.
        pub domain: String,

        /// TTL of the DKIM record, in seconds.
        #[serde(default = "default_ttl")]
        pub ttl: u64,

        /// RSA modulus size in bits.
        #[serde(default)]
        pub key_length: KeyLength,

        /// Key algorithm.
        #[serde(default)]
        pub key_type: KeyType,
    }

    /// Legacy status: `""`, `"ok"` or `"invalid"`.
    #[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
    pub enum LegacyStatus {
        #[default]
        #[serde(rename = "")]
        Unset,
        #[serde(rename = "ok")]
        Ok,
        #[serde(rename = "invalid")]
        Invalid,
    }
}

/// external-dns `DNSEndpoint` spec.
///
/// Only the fields the controller writes are modelled; everything is defaulted
/// so endpoints written by other tools still decode.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[kube(
    group = "externaldns.k8s.io",
    version = "v1alpha1",
    kind = "DNSEndpoint",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct DNSEndpointSpec {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// A single DNS record published by external-dns.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully qualified record name.
    #[serde(default)]
    pub dns_name: String,

    /// Record values. For TXT records each entry is one record value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Record type (e.g. `TXT`).
    #[serde(default)]
    pub record_type: String,

    /// TTL in seconds.
    #[serde(rename = "recordTTL", default, skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<u64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}
