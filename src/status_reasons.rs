// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for `DKIMKey` resources.
//!
//! A `DKIMKey` carries a single encompassing `type: Ready` condition. Its reason
//! says which way the last reconciliation went:
//!
//! - `Succeeded` - the private key secret and DNS record exist and match
//! - `Invalid` - a permanent problem that needs a spec or cluster change
//! - `Failed` - a transient problem, retried on the next change event
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   observedGeneration: 1
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: Invalid
//!       message: "a secret with the same name already exists"
//!       observedGeneration: 1
//!       lastTransitionTime: "2025-01-01T00:00:00Z"
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// The encompassing readiness condition.
pub const CONDITION_TYPE_READY: &str = "Ready";

// ============================================================================
// Condition Status Values
// ============================================================================

/// Condition holds.
pub const CONDITION_STATUS_TRUE: &str = "True";

/// Condition does not hold.
pub const CONDITION_STATUS_FALSE: &str = "False";

// ============================================================================
// Reasons
// ============================================================================

/// The key pair exists, the secret holds the private key and the DNS record is published.
pub const REASON_SUCCEEDED: &str = "Succeeded";

/// A transient failure (API server I/O, entropy source) prevented convergence.
///
/// Retried on the next change event.
pub const REASON_FAILED: &str = "Failed";

/// A permanent problem: malformed key material, wrong algorithm, bit-length
/// mismatch, a name collision with an unrelated object, or a namespace the
/// controller does not manage.
pub const REASON_INVALID: &str = "Invalid";

// ============================================================================
// Messages
// ============================================================================

/// Message used when the resource converges.
pub const MESSAGE_SUCCEEDED: &str = "DKIM key created successfully";

/// Message used when the resource lives outside the managed namespace.
pub const MESSAGE_INVALID_NAMESPACE: &str = "DKIMKey is in an invalid namespace";

/// Message used when a legacy `invalid` status is upgraded.
pub const MESSAGE_INVALID: &str = "DKIMKey is invalid";

/// Message used when `spec.secretName` is taken by a secret this key does not own.
pub const MESSAGE_SECRET_CONFLICT: &str = "a secret with the same name already exists";

/// Message used when the record name is taken by a `DNSEndpoint` this key does not own.
pub const MESSAGE_RECORD_CONFLICT: &str = "a DKIM record with the same name already exists";

/// Message used when the owned secret lacks the private key entry.
pub const MESSAGE_PRIVATE_KEY_NOT_FOUND: &str = "private key not found";
