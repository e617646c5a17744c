// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission guards protecting generated DKIM material.
//!
//! Each guard is a pure function of the objects involved and the identity of
//! the requester. Transport (decoding the `AdmissionReview`, building the
//! response) lives in [`crate::webhook`].
//!
//! - [`validate_dkimkey_update`] - `DKIMKey` specs are immutable except `ttl`
//! - [`validate_secret_change`] - generated secrets may only be changed by the controller
//! - [`validate_dns_endpoint_delete`] - generated records may only be deleted by the controller

use crate::constants::SERVICE_ACCOUNTS_GROUP;
use crate::crd::{DKIMKey, DKIMKeySpec, DNSEndpoint};
use crate::ownership::is_owned_by_dkim_key;
use k8s_openapi::api::core::v1::Secret;
use kube::core::admission::Operation;
use kube::ResourceExt;
use tracing::info;

pub const DENY_NAME_CHANGE: &str = "changing dkimkey name is not allowed";
pub const DENY_SPEC_CHANGE: &str = "changing dkimkey spec is not allowed";
pub const DENY_SECRET_DELETE: &str = "directly deleting DKIM private keys is not allowed";
pub const DENY_SECRET_UPDATE: &str = "directly updating DKIM private keys is not allowed";
pub const DENY_RECORD_DELETE: &str = "directly deleting DKIM record is not allowed";

/// Outcome of an admission guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(String),
}

impl Verdict {
    fn deny(reason: &str) -> Self {
        Verdict::Deny(reason.to_string())
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    /// Label used for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allow => "allowed",
            Verdict::Deny(_) => "denied",
        }
    }
}

/// The authenticated user behind an admission request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequesterIdentity {
    pub username: String,
    pub groups: Vec<String>,
}

/// The identity the controller itself runs as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerIdentity {
    service_account: String,
}

impl ControllerIdentity {
    pub fn new(service_account: impl Into<String>) -> Self {
        Self {
            service_account: service_account.into(),
        }
    }

    #[must_use]
    pub fn service_account(&self) -> &str {
        &self.service_account
    }

    /// `true` if `requester` is the controller: an exact username match, or
    /// any member of the service-account group.
    #[must_use]
    pub fn matches(&self, requester: &RequesterIdentity) -> bool {
        requester.username == self.service_account
            || requester.groups.iter().any(|g| g == SERVICE_ACCOUNTS_GROUP)
    }
}

/// Reject updates that rename a `DKIMKey` or change any spec field but `ttl`.
///
/// Label and annotation changes are allowed.
#[must_use]
pub fn validate_dkimkey_update(old: &DKIMKey, new: &DKIMKey) -> Verdict {
    if old.name_any() != new.name_any() {
        return Verdict::deny(DENY_NAME_CHANGE);
    }

    let new_spec_without_ttl = DKIMKeySpec {
        ttl: old.spec.ttl,
        ..new.spec.clone()
    };
    if new_spec_without_ttl != old.spec {
        return Verdict::deny(DENY_SPEC_CHANGE);
    }

    Verdict::Allow
}

/// Reject updates and deletes of a `DKIMKey`-owned secret by anyone but the controller.
///
/// Secrets not owned by a `DKIMKey`, and other operations, are allowed.
#[must_use]
pub fn validate_secret_change(
    operation: &Operation,
    secret: &Secret,
    requester: &RequesterIdentity,
    controller: &ControllerIdentity,
) -> Verdict {
    let reason = match operation {
        Operation::Delete => DENY_SECRET_DELETE,
        Operation::Update => DENY_SECRET_UPDATE,
        _ => return Verdict::Allow,
    };

    if !is_owned_by_dkim_key(&secret.metadata, None) || controller.matches(requester) {
        return Verdict::Allow;
    }

    info!(
        namespace = %secret.namespace().unwrap_or_default(),
        name = %secret.name_any(),
        username = %requester.username,
        "Denied {:?} of DKIM private key secret", operation
    );
    Verdict::deny(reason)
}

/// Reject deletes of a `DKIMKey`-owned `DNSEndpoint` by anyone but the controller.
#[must_use]
pub fn validate_dns_endpoint_delete(
    endpoint: &DNSEndpoint,
    requester: &RequesterIdentity,
    controller: &ControllerIdentity,
) -> Verdict {
    if !is_owned_by_dkim_key(&endpoint.metadata, None) || controller.matches(requester) {
        return Verdict::Allow;
    }

    info!(
        namespace = %endpoint.namespace().unwrap_or_default(),
        name = %endpoint.name_any(),
        username = %requester.username,
        "Denied delete of DKIM record"
    );
    Verdict::deny(DENY_RECORD_DELETE)
}
