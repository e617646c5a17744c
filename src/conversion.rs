// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Conversion between the `v1` and `v2` `DKIMKey` revisions.
//!
//! `v2` is the hub. The spec is copied verbatim in both directions; only the
//! status changes shape:
//!
//! | v1 status   | v2 conditions                        |
//! |-------------|--------------------------------------|
//! | `"ok"`      | `Ready=True`, reason `Succeeded`     |
//! | `"invalid"` | `Ready=False`, reason `Invalid`      |
//! | `""`        | none                                 |
//!
//! Downgrading maps any `Ready=True` condition to `"ok"`, any other non-empty
//! condition list to `"invalid"`, and an empty one to `""`. A `Ready=False`
//! condition with reason `Failed` therefore comes back as `"invalid"`.

use crate::constants::{API_GROUP_VERSION_V1, API_GROUP_VERSION_V2};
use crate::crd::{v1, v2, Condition};
use crate::errors::ConversionError;
use crate::status_reasons::{
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY, MESSAGE_INVALID,
    MESSAGE_SUCCEEDED, REASON_INVALID, REASON_SUCCEEDED,
};
use serde_json::Value;

/// Upgrade a legacy `DKIMKey` to the current revision.
#[must_use]
pub fn upgrade(legacy: &v1::DKIMKey) -> v2::DKIMKey {
    let spec = &legacy.spec;
    let mut current = v2::DKIMKey::new(
        "",
        v2::DKIMKeySpec {
            secret_name: spec.secret_name.clone(),
            selector: spec.selector.clone(),
            domain: spec.domain.clone(),
            ttl: spec.ttl,
            key_length: spec.key_length,
            key_type: spec.key_type,
        },
    );
    current.metadata = legacy.metadata.clone();
    current.status = legacy
        .status
        .map(|status| upgrade_status(status, legacy.metadata.generation));
    current
}

/// Downgrade a current `DKIMKey` to the legacy revision.
#[must_use]
pub fn downgrade(current: &v2::DKIMKey) -> v1::DKIMKey {
    let spec = &current.spec;
    let mut legacy = v1::DKIMKey::new(
        "",
        v1::DKIMKeySpec {
            secret_name: spec.secret_name.clone(),
            selector: spec.selector.clone(),
            domain: spec.domain.clone(),
            ttl: spec.ttl,
            key_length: spec.key_length,
            key_type: spec.key_type,
        },
    );
    legacy.metadata = current.metadata.clone();
    legacy.status = current.status.as_ref().map(downgrade_status);
    legacy
}

/// Map a legacy status string onto conditions.
#[must_use]
pub fn upgrade_status(status: v1::LegacyStatus, generation: Option<i64>) -> v2::DKIMKeyStatus {
    let ready = |status: &str, reason: &str, message: &str| Condition {
        r#type: CONDITION_TYPE_READY.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        observed_generation: generation,
        last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
    };

    let conditions = match status {
        v1::LegacyStatus::Ok => vec![ready(CONDITION_STATUS_TRUE, REASON_SUCCEEDED, MESSAGE_SUCCEEDED)],
        v1::LegacyStatus::Invalid => vec![ready(CONDITION_STATUS_FALSE, REASON_INVALID, MESSAGE_INVALID)],
        v1::LegacyStatus::Unset => Vec::new(),
    };

    v2::DKIMKeyStatus {
        observed_generation: generation,
        conditions,
    }
}

/// Collapse conditions onto a legacy status string.
#[must_use]
pub fn downgrade_status(status: &v2::DKIMKeyStatus) -> v1::LegacyStatus {
    let ready = status
        .conditions
        .iter()
        .any(|c| c.r#type == CONDITION_TYPE_READY && c.status == CONDITION_STATUS_TRUE);

    if ready {
        v1::LegacyStatus::Ok
    } else if status.conditions.is_empty() {
        v1::LegacyStatus::Unset
    } else {
        v1::LegacyStatus::Invalid
    }
}

/// Convert a raw `DKIMKey` object to `desired_api_version`.
///
/// Objects already at the desired revision are returned untouched.
///
/// # Errors
///
/// Returns [`ConversionError::UnsupportedVersion`] if either revision is
/// unknown, or [`ConversionError::Serde`] if the object does not decode.
pub fn convert_object(object: Value, desired_api_version: &str) -> Result<Value, ConversionError> {
    let api_version = object
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match (api_version.as_str(), desired_api_version) {
        (from, to) if from == to && is_known(from) => Ok(object),
        (API_GROUP_VERSION_V1, API_GROUP_VERSION_V2) => {
            let legacy: v1::DKIMKey = serde_json::from_value(object)?;
            Ok(serde_json::to_value(upgrade(&legacy))?)
        }
        (API_GROUP_VERSION_V2, API_GROUP_VERSION_V1) => {
            let current: v2::DKIMKey = serde_json::from_value(object)?;
            Ok(serde_json::to_value(downgrade(&current))?)
        }
        (from, to) if is_known(from) => Err(ConversionError::UnsupportedVersion(to.to_string())),
        (from, _) => Err(ConversionError::UnsupportedVersion(from.to_string())),
    }
}

fn is_known(api_version: &str) -> bool {
    api_version == API_GROUP_VERSION_V1 || api_version == API_GROUP_VERSION_V2
}
