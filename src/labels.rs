// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants stamped on every object the controller generates.

use std::collections::BTreeMap;

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

// ============================================================================
// Label Values
// ============================================================================

/// Value for `app.kubernetes.io/managed-by` and `app.kubernetes.io/part-of`
pub const DKIM_MANAGER: &str = "dkim-manager";

/// Component value for the private key secret
pub const COMPONENT_PRIVATE_KEY: &str = "private-key";

/// Component value for the published DNS record
pub const COMPONENT_DNS_RECORD: &str = "dns-record";

// ============================================================================
// DKIM-Manager-Specific Labels
// ============================================================================

/// Label naming the `DKIMKey` that generated this object
pub const DKIM_KEY_LABEL: &str = "dkim-manager.atelierhsn.com/dkimkey";

/// Build the label set for an object generated on behalf of `key_name`.
#[must_use]
pub fn generated_labels(key_name: &str, component: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (K8S_MANAGED_BY.to_string(), DKIM_MANAGER.to_string()),
        (K8S_PART_OF.to_string(), DKIM_MANAGER.to_string()),
        (K8S_COMPONENT.to_string(), component.to_string()),
        (DKIM_KEY_LABEL.to_string(), key_name.to_string()),
    ])
}
