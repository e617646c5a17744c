// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line configuration of the `dkim-manager` binary.
//!
//! Besides the flags themselves, two settings are resolved from the pod's
//! mounted service-account files when not given explicitly:
//!
//! - the namespace to manage, with `--namespaced`
//! - the controller identity the admission guards trust

use crate::constants::{
    DEFAULT_METRICS_BIND_ADDRESS, DEFAULT_WEBHOOK_BIND_ADDRESS, FALLBACK_SERVICE_ACCOUNT,
    SERVICE_ACCOUNT_NAMESPACE_PATH, SERVICE_ACCOUNT_TOKEN_PATH,
};
use anyhow::{Context as _, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use clap::{ArgAction, Parser};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Parser, Clone, Debug)]
#[command(name = "dkim-manager", version, about = "Kubernetes operator for DKIM keys")]
pub struct OperatorArgs {
    /// Only manage DKIMKeys in this namespace
    #[arg(long)]
    pub namespace: Option<String>,

    /// Only manage DKIMKeys in the controller's own namespace
    #[arg(long)]
    pub namespaced: bool,

    /// Service account the admission webhooks trust (default: from the mounted token)
    #[arg(long)]
    pub service_account: Option<String>,

    /// Serve the admission and conversion webhooks
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub webhooks: bool,

    #[arg(long, default_value = DEFAULT_WEBHOOK_BIND_ADDRESS)]
    pub webhook_bind_address: String,

    #[arg(long, default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    pub metrics_bind_address: String,
}

impl OperatorArgs {
    /// The namespace to restrict the controller to, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if `--namespaced` is set and the pod namespace file
    /// cannot be read.
    pub fn watch_namespace(&self) -> Result<Option<String>> {
        resolve_watch_namespace(
            self.namespace.clone(),
            self.namespaced,
            Path::new(SERVICE_ACCOUNT_NAMESPACE_PATH),
        )
    }

    /// The controller's service account subject.
    #[must_use]
    pub fn service_account(&self) -> String {
        resolve_service_account(
            self.service_account.clone(),
            Path::new(SERVICE_ACCOUNT_TOKEN_PATH),
        )
    }
}

/// An explicit `namespace` wins; otherwise `namespaced` reads the pod namespace.
///
/// # Errors
///
/// Returns an error if the namespace file is needed but unreadable or empty.
pub fn resolve_watch_namespace(
    namespace: Option<String>,
    namespaced: bool,
    namespace_path: &Path,
) -> Result<Option<String>> {
    if namespace.is_some() || !namespaced {
        return Ok(namespace);
    }

    let namespace = std::fs::read_to_string(namespace_path)
        .with_context(|| format!("failed to read namespace from {}", namespace_path.display()))?;
    let namespace = namespace.trim();
    if namespace.is_empty() {
        anyhow::bail!("namespace file {} is empty", namespace_path.display());
    }
    Ok(Some(namespace.to_string()))
}

/// An explicit `service_account` wins, then the `sub` claim of the token at
/// `token_path`, then the fallback identity.
#[must_use]
pub fn resolve_service_account(service_account: Option<String>, token_path: &Path) -> String {
    if let Some(service_account) = service_account {
        return service_account;
    }

    let subject = std::fs::read_to_string(token_path)
        .ok()
        .and_then(|token| subject_from_token(&token));
    match subject {
        Some(subject) => {
            debug!("Using service account {} from {}", subject, token_path.display());
            subject
        }
        None => {
            warn!(
                "Could not read service account from {}, using {}",
                token_path.display(),
                FALLBACK_SERVICE_ACCOUNT
            );
            FALLBACK_SERVICE_ACCOUNT.to_string()
        }
    }
}

#[derive(Deserialize)]
struct Claims {
    sub: Option<String>,
}

/// The `sub` claim of a JWT. The signature is not verified.
#[must_use]
pub fn subject_from_token(token: &str) -> Option<String> {
    let payload = token.trim().split('.').nth(1)?;
    let payload = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&payload).ok()?;
    claims.sub.filter(|sub| !sub.is_empty())
}
