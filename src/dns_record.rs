// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DKIM TXT record encoding.
//!
//! A DKIM public key is published as a TXT record at
//! `{selector}._domainkey.{domain}` holding a policy value such as:
//!
//! ```text
//! v=DKIM1; h=sha256; k=rsa;p=MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA...
//! ```
//!
//! A single TXT character-string is limited to 255 bytes (RFC 1035 section 3.3),
//! so a 2048-bit RSA policy value has to be split across several
//! character-strings that resolvers concatenate back together.

use crate::constants::{DKIM_RECORD_TYPE, TXT_SEGMENT_MAX_BYTES};
use crate::crd::{DKIMKeySpec, Endpoint, KeyType};

/// Build the DKIM policy value for a base64 public key.
#[must_use]
pub fn build_policy_value(public_key: &str, key_type: KeyType) -> String {
    let header = match key_type {
        KeyType::Rsa => "v=DKIM1; h=sha256; k=rsa;",
        KeyType::Ed25519 => "v=DKIM1; k=ed25519;",
    };
    format!("{header}p={public_key}")
}

/// Split `value` into consecutive pieces of at most 255 bytes.
///
/// Pieces are cut at exactly 255 bytes; a multi-byte UTF-8 character is never
/// split, so a piece can end early when one straddles the boundary. Joining the
/// pieces reproduces `value`. A value of 255 bytes or less (including the
/// empty string) yields exactly one piece.
#[must_use]
pub fn chunk(value: &str) -> Vec<String> {
    let mut pieces = Vec::with_capacity(value.len() / TXT_SEGMENT_MAX_BYTES + 1);
    let mut rest = value;

    while rest.len() > TXT_SEGMENT_MAX_BYTES {
        let mut end = TXT_SEGMENT_MAX_BYTES;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        pieces.push(head.to_string());
        rest = tail;
    }
    pieces.push(rest.to_string());

    pieces
}

/// A DKIM TXT record ready to be published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsRecord {
    pub dns_name: String,
    pub ttl: u64,
    /// Ordered character-strings of the policy value, each at most 255 bytes.
    pub segments: Vec<String>,
}

impl DnsRecord {
    /// Build the record for `spec` publishing `public_key`.
    #[must_use]
    pub fn new(spec: &DKIMKeySpec, public_key: &str) -> Self {
        Self {
            dns_name: spec.dns_name(),
            ttl: spec.ttl,
            segments: chunk(&build_policy_value(public_key, spec.key_type)),
        }
    }

    /// The record value in zone-file form: each segment quoted, space separated.
    ///
    /// external-dns publishes each target as its own TXT record, so the whole
    /// policy value must travel as a single target.
    #[must_use]
    pub fn target(&self) -> String {
        self.segments
            .iter()
            .map(|segment| format!("\"{segment}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The external-dns endpoint for this record.
    #[must_use]
    pub fn to_endpoint(&self) -> Endpoint {
        Endpoint {
            dns_name: self.dns_name.clone(),
            targets: vec![self.target()],
            record_type: DKIM_RECORD_TYPE.to_string(),
            record_ttl: Some(self.ttl),
            labels: Default::default(),
        }
    }
}
