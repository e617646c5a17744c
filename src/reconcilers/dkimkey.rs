// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `DKIMKey` reconciliation.
//!
//! One pass moves a `DKIMKey` at most one observable step forward:
//!
//! 1. Missing object: nothing to do.
//! 2. Namespace not managed: mark `Ready=False/Invalid` once, then ignore.
//! 3. Deletion requested: delete owned children, drop the finalizer.
//! 4. No finalizer yet: add it and stop; the patch triggers the next pass.
//! 5. Ready at the current generation: nothing to do.
//! 6. Otherwise converge and report the result in the `Ready` condition.
//!
//! Convergence writes the private key secret and then the DNS record as two
//! separate commits. If the process dies between them, the next pass finds the
//! secret, re-derives the public key from it and publishes the record; a key
//! pair is only ever generated while no secret exists.
//!
//! Errors met while converging never escape: they are classified as `Invalid`
//! (permanent) or `Failed` (transient) and written to the status. Only a failed
//! status or finalizer write is returned as `Err`.

use crate::constants::DKIM_KEY_FINALIZER;
use crate::context::Context;
use crate::crd::DKIMKey;
use crate::dkim;
use crate::dkim_resources::{build_dns_endpoint, build_private_key_secret};
use crate::dns_record::DnsRecord;
use crate::errors::ReconcileError;
use crate::metrics;
use crate::ownership::is_owned_by_dkim_key;
use crate::reconcilers::finalizers::{ensure_finalizer, handle_deletion};
use crate::reconcilers::should_reconcile;
use crate::reconcilers::status::DKIMKeyStatusUpdater;
use crate::status_reasons::{
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY, MESSAGE_INVALID_NAMESPACE,
    MESSAGE_PRIVATE_KEY_NOT_FOUND, MESSAGE_RECORD_CONFLICT, MESSAGE_SECRET_CONFLICT,
    MESSAGE_SUCCEEDED, REASON_INVALID, REASON_SUCCEEDED,
};
use crate::store::DkimStore;
use anyhow::Result;
use kube::ResourceExt;
use tracing::{debug, info, warn};

/// What a reconciliation pass did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The `DKIMKey` no longer exists.
    Missing,
    /// The `DKIMKey` lives in a namespace this controller does not manage.
    OutOfScope,
    /// The finalizer was added; work continues on the next pass.
    FinalizerAdded,
    /// Owned children were deleted and the finalizer removed.
    Finalized,
    /// Already ready at the current generation.
    UpToDate,
    /// The secret and DNS record exist and match the spec.
    Ready,
    /// A permanent problem; needs a spec or cluster change.
    Invalid(String),
    /// A transient problem; worth retrying.
    Failed(String),
}

impl ReconcileOutcome {
    /// `true` when retrying with unchanged inputs may succeed.
    #[must_use]
    pub fn retry_worthy(&self) -> bool {
        matches!(self, ReconcileOutcome::Failed(_))
    }

    /// Label used for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Missing => "missing",
            ReconcileOutcome::OutOfScope => "out_of_scope",
            ReconcileOutcome::FinalizerAdded => "finalizer_added",
            ReconcileOutcome::Finalized => "finalized",
            ReconcileOutcome::UpToDate => "up_to_date",
            ReconcileOutcome::Ready => "ready",
            ReconcileOutcome::Invalid(_) => "invalid",
            ReconcileOutcome::Failed(_) => "failed",
        }
    }
}

/// Reconcile the `DKIMKey` `namespace/name`.
///
/// # Errors
///
/// Returns an error only if reading the `DKIMKey`, cleaning up on deletion, or
/// writing its finalizers or status fails.
pub async fn reconcile_dkimkey(ctx: &Context, namespace: &str, name: &str) -> Result<ReconcileOutcome> {
    let store = ctx.store.as_ref();

    let Some(dkim_key) = store.get_dkim_key(namespace, name).await? else {
        debug!("DKIMKey {}/{} not found, nothing to do", namespace, name);
        return Ok(ReconcileOutcome::Missing);
    };

    if !ctx.manages_namespace(namespace) {
        if !dkim_key.has_condition(CONDITION_TYPE_READY, CONDITION_STATUS_FALSE, REASON_INVALID) {
            warn!(
                namespace = %namespace,
                name = %name,
                "DKIMKey is outside the managed namespace"
            );
            let mut status_updater = DKIMKeyStatusUpdater::new(&dkim_key);
            status_updater.set_condition(
                CONDITION_TYPE_READY,
                CONDITION_STATUS_FALSE,
                REASON_INVALID,
                MESSAGE_INVALID_NAMESPACE,
            );
            status_updater.apply(store).await?;
        }
        return Ok(ReconcileOutcome::OutOfScope);
    }

    if dkim_key.metadata.deletion_timestamp.is_some() {
        handle_deletion(store, &dkim_key, DKIM_KEY_FINALIZER).await?;
        return Ok(ReconcileOutcome::Finalized);
    }

    if ensure_finalizer(store, &dkim_key, DKIM_KEY_FINALIZER).await? {
        return Ok(ReconcileOutcome::FinalizerAdded);
    }

    if dkim_key.is_ready()
        && !should_reconcile(dkim_key.metadata.generation, dkim_key.observed_generation())
    {
        debug!("DKIMKey {}/{} is up to date", namespace, name);
        return Ok(ReconcileOutcome::UpToDate);
    }

    let mut status_updater = DKIMKeyStatusUpdater::new(&dkim_key);
    let outcome = match converge(store, &dkim_key).await {
        Ok(()) => {
            info!(namespace = %namespace, name = %name, "DKIMKey is ready");
            status_updater.set_condition(
                CONDITION_TYPE_READY,
                CONDITION_STATUS_TRUE,
                REASON_SUCCEEDED,
                MESSAGE_SUCCEEDED,
            );
            ReconcileOutcome::Ready
        }
        Err(e) => {
            let message = e.to_string();
            warn!(
                namespace = %namespace,
                name = %name,
                reason = e.reason(),
                "DKIMKey reconciliation failed: {}", message
            );
            status_updater.set_condition(
                CONDITION_TYPE_READY,
                CONDITION_STATUS_FALSE,
                e.reason(),
                &message,
            );
            if e.is_permanent() {
                ReconcileOutcome::Invalid(message)
            } else {
                ReconcileOutcome::Failed(message)
            }
        }
    };
    status_updater.apply(store).await?;

    Ok(outcome)
}

/// Make the secret and DNS record match `dkim_key`.
async fn converge(store: &dyn DkimStore, dkim_key: &DKIMKey) -> Result<(), ReconcileError> {
    let namespace = dkim_key.namespace().unwrap_or_default();
    let name = dkim_key.name_any();
    let spec = &dkim_key.spec;

    if let Some(endpoint) = store.get_dns_endpoint(&namespace, &name).await? {
        if !is_owned_by_dkim_key(&endpoint.metadata, Some(&name)) {
            return Err(ReconcileError::Conflict(MESSAGE_RECORD_CONFLICT.to_string()));
        }
    }

    let public_key = match store.get_secret(&namespace, &spec.secret_name).await? {
        Some(secret) => {
            if !is_owned_by_dkim_key(&secret.metadata, Some(&name)) {
                return Err(ReconcileError::Conflict(MESSAGE_SECRET_CONFLICT.to_string()));
            }
            let private_key = secret
                .data
                .as_ref()
                .and_then(|data| data.get(&spec.private_key_name()))
                .ok_or_else(|| ReconcileError::Validation(MESSAGE_PRIVATE_KEY_NOT_FOUND.to_string()))?;

            debug!(
                "Recovering public key of DKIMKey {}/{} from Secret {}",
                namespace, name, spec.secret_name
            );
            dkim::derive_public(spec.algorithm(), &private_key.0)?
        }
        None => {
            let algorithm = spec.algorithm();
            info!(
                namespace = %namespace,
                name = %name,
                algorithm = %algorithm,
                "Generating DKIM key pair"
            );
            let material = dkim::generate(algorithm)?;
            store
                .create_secret(&build_private_key_secret(dkim_key, &material))
                .await?;
            metrics::record_key_generated(algorithm.key_type().as_str());
            material.public_key
        }
    };

    let record = DnsRecord::new(spec, &public_key);
    store
        .apply_dns_endpoint(&build_dns_endpoint(dkim_key, &record))
        .await?;
    debug!(
        "Published DKIM record {} for DKIMKey {}/{} ({} segment(s))",
        record.dns_name,
        namespace,
        name,
        record.segments.len()
    );

    Ok(())
}
