// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the DKIM manager operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `DKIMKey` CRD
pub const API_GROUP: &str = "dkim-manager.atelierhsn.com";

/// Current API version (conditions status, storage version)
pub const API_VERSION_V2: &str = "v2";

/// Fully qualified legacy API version (group/version)
pub const API_GROUP_VERSION_V1: &str = "dkim-manager.atelierhsn.com/v1";

/// Fully qualified current API version (group/version)
pub const API_GROUP_VERSION_V2: &str = "dkim-manager.atelierhsn.com/v2";

/// Kind name for `DKIMKey` resource
pub const KIND_DKIM_KEY: &str = "DKIMKey";

// ============================================================================
// Controller Identity
// ============================================================================

/// Finalizer placed on every managed `DKIMKey`
pub const DKIM_KEY_FINALIZER: &str = "dkim-manager.atelierhsn.com/finalizer";

/// Field manager used for server-side apply of `DNSEndpoint` objects
pub const FIELD_MANAGER: &str = "dkim-manager";

/// Controller identity used when the service account token cannot be read
pub const FALLBACK_SERVICE_ACCOUNT: &str =
    "system:serviceaccount:dkim-manager:dkim-manager-controller-manager";

/// Group every service account identity belongs to
pub const SERVICE_ACCOUNTS_GROUP: &str = "system:serviceaccounts";

/// Mounted service account token
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Mounted service account namespace
pub const SERVICE_ACCOUNT_NAMESPACE_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

// ============================================================================
// DKIM Constants
// ============================================================================

/// Default TTL of the published DKIM record (1 day)
pub const DEFAULT_DKIM_RECORD_TTL_SECS: u64 = 86400;

/// Maximum length of a single TXT character-string (RFC 1035 section 3.3)
pub const TXT_SEGMENT_MAX_BYTES: usize = 255;

/// Subdomain label under which DKIM keys are published
pub const DOMAINKEY_LABEL: &str = "_domainkey";

/// Record type of the published DKIM record
pub const DKIM_RECORD_TYPE: &str = "TXT";

// ============================================================================
// Controller Timing
// ============================================================================

/// Requeue interval after an operational (retryable) failure
pub const FAILED_REQUEUE_SECS: u64 = 60;

/// Requeue interval used by the controller error policy
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Network Defaults
// ============================================================================

/// Default bind address of the admission/conversion webhook listener
pub const DEFAULT_WEBHOOK_BIND_ADDRESS: &str = "0.0.0.0:9443";

/// Default bind address of the metrics and health probe listener
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";
