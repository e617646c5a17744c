// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Owner references linking generated objects back to their `DKIMKey`.
//!
//! Ownership is matched by API group, kind and name only. The version part of
//! `apiVersion` is ignored so objects stamped by either `DKIMKey` revision are
//! recognised.

use crate::constants::{API_GROUP, API_GROUP_VERSION_V2, KIND_DKIM_KEY};
use crate::crd::DKIMKey;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::ResourceExt;

/// The API group of an `apiVersion` (`""` for the core group).
#[must_use]
pub fn api_group(api_version: &str) -> &str {
    api_version
        .rsplit_once('/')
        .map_or("", |(group, _version)| group)
}

/// `true` if `owner` points at an object of `expected_kind` in `expected_group`.
#[must_use]
pub fn matches_owner(owner: &OwnerReference, expected_group: &str, expected_kind: &str) -> bool {
    owner.kind == expected_kind && api_group(&owner.api_version) == expected_group
}

/// `true` if `meta` carries an owner reference to a `DKIMKey`.
///
/// With `name`, the reference must also point at that `DKIMKey`.
#[must_use]
pub fn is_owned_by_dkim_key(meta: &ObjectMeta, name: Option<&str>) -> bool {
    meta.owner_references.as_ref().is_some_and(|owners| {
        owners.iter().any(|owner| {
            matches_owner(owner, API_GROUP, KIND_DKIM_KEY)
                && name.is_none_or(|expected| owner.name == expected)
        })
    })
}

/// Builds the controller owner reference stamped on objects generated for `key`.
///
/// Garbage collection deletes the children together with the `DKIMKey`, and
/// `blockOwnerDeletion` keeps the key around until they are gone.
#[must_use]
pub fn build_owner_references(key: &DKIMKey) -> Vec<OwnerReference> {
    vec![OwnerReference {
        api_version: API_GROUP_VERSION_V2.to_string(),
        kind: KIND_DKIM_KEY.to_string(),
        name: key.name_any(),
        uid: key.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }]
}
