// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for `DKIMKey` resources.
//!
//! A `DKIMKey` carries a finalizer so that its generated secret and DNS record
//! are removed before the key itself disappears. Cleanup only touches objects
//! whose owner reference names this `DKIMKey`; anything else in the namespace
//! is left alone, whatever its name.
//!
//! # Example
//!
//! ```rust,ignore
//! use dkim_manager::reconcilers::finalizers::{ensure_finalizer, handle_deletion};
//! use dkim_manager::constants::DKIM_KEY_FINALIZER;
//!
//! if dkim_key.metadata.deletion_timestamp.is_some() {
//!     return handle_deletion(store, &dkim_key, DKIM_KEY_FINALIZER).await;
//! }
//! ensure_finalizer(store, &dkim_key, DKIM_KEY_FINALIZER).await?;
//! ```

use crate::crd::DKIMKey;
use crate::ownership::is_owned_by_dkim_key;
use crate::store::DkimStore;
use anyhow::Result;
use kube::ResourceExt;
use tracing::info;

/// Cleanup that must run before a resource's finalizer is removed.
#[async_trait::async_trait]
pub trait FinalizerCleanup {
    /// Delete everything this resource generated.
    ///
    /// # Errors
    ///
    /// If this fails the finalizer stays and deletion is retried.
    async fn cleanup(&self, store: &dyn DkimStore) -> Result<()>;
}

#[async_trait::async_trait]
impl FinalizerCleanup for DKIMKey {
    async fn cleanup(&self, store: &dyn DkimStore) -> Result<()> {
        let namespace = self.namespace().unwrap_or_default();
        let name = self.name_any();

        for endpoint in store.list_dns_endpoints(&namespace).await? {
            if is_owned_by_dkim_key(&endpoint.metadata, Some(&name)) {
                info!(
                    "Deleting DNSEndpoint {}/{} owned by DKIMKey {}",
                    namespace,
                    endpoint.name_any(),
                    name
                );
                store
                    .delete_dns_endpoint(&namespace, &endpoint.name_any())
                    .await?;
            }
        }

        for secret in store.list_secrets(&namespace).await? {
            if is_owned_by_dkim_key(&secret.metadata, Some(&name)) {
                info!(
                    "Deleting Secret {}/{} owned by DKIMKey {}",
                    namespace,
                    secret.name_any(),
                    name
                );
                store.delete_secret(&namespace, &secret.name_any()).await?;
            }
        }

        Ok(())
    }
}

/// `true` if `finalizer` is present on the resource.
#[must_use]
pub fn has_finalizer(dkim_key: &DKIMKey, finalizer: &str) -> bool {
    dkim_key.finalizers().iter().any(|f| f == finalizer)
}

/// Add a finalizer if not already present.
///
/// Returns `true` when the finalizer was added (and the resource therefore
/// changed), `false` when it was already there.
///
/// # Errors
///
/// Returns an error if the finalizer patch fails.
pub async fn ensure_finalizer(
    store: &dyn DkimStore,
    dkim_key: &DKIMKey,
    finalizer: &str,
) -> Result<bool> {
    if has_finalizer(dkim_key, finalizer) {
        return Ok(false);
    }

    let namespace = dkim_key.namespace().unwrap_or_default();
    let name = dkim_key.name_any();
    info!("Adding finalizer {} to DKIMKey {}/{}", finalizer, namespace, name);

    let mut finalizers = dkim_key.finalizers().to_vec();
    finalizers.push(finalizer.to_string());
    store
        .set_dkim_key_finalizers(&namespace, &name, &finalizers)
        .await?;

    Ok(true)
}

/// Remove a finalizer if present.
///
/// # Errors
///
/// Returns an error if the finalizer patch fails.
pub async fn remove_finalizer(
    store: &dyn DkimStore,
    dkim_key: &DKIMKey,
    finalizer: &str,
) -> Result<()> {
    if !has_finalizer(dkim_key, finalizer) {
        return Ok(());
    }

    let namespace = dkim_key.namespace().unwrap_or_default();
    let name = dkim_key.name_any();
    info!("Removing finalizer {} from DKIMKey {}/{}", finalizer, namespace, name);

    let finalizers: Vec<String> = dkim_key
        .finalizers()
        .iter()
        .filter(|f| *f != finalizer)
        .cloned()
        .collect();
    store
        .set_dkim_key_finalizers(&namespace, &name, &finalizers)
        .await
}

/// Run cleanup and then remove the finalizer of a resource being deleted.
///
/// Does nothing if the finalizer is already gone.
///
/// # Errors
///
/// Returns an error if cleanup or the finalizer patch fails; the finalizer is
/// then kept and deletion is retried on the next pass.
pub async fn handle_deletion(
    store: &dyn DkimStore,
    dkim_key: &DKIMKey,
    finalizer: &str,
) -> Result<()> {
    let namespace = dkim_key.namespace().unwrap_or_default();
    let name = dkim_key.name_any();

    info!("DKIMKey {}/{} is being deleted", namespace, name);

    if has_finalizer(dkim_key, finalizer) {
        dkim_key.cleanup(store).await?;
        remove_finalizer(store, dkim_key, finalizer).await?;
    }

    Ok(())
}
