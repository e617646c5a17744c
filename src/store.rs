// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Access to the cluster objects the reconciler reads and writes.
//!
//! The reconciler never talks to the API server directly: everything goes
//! through a [`DkimStore`] held by the [`crate::context::Context`].
//! [`KubeStore`] is the production implementation.

use crate::constants::FIELD_MANAGER;
use crate::crd::{DKIMKey, DKIMKeyStatus, DNSEndpoint};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

#[cfg(test)]
pub mod fake;

/// Reads and writes of `DKIMKey` objects and their generated children.
///
/// Reads of missing objects return `Ok(None)`; deletes of missing objects
/// succeed.
#[async_trait]
pub trait DkimStore: Send + Sync {
    async fn get_dkim_key(&self, namespace: &str, name: &str) -> Result<Option<DKIMKey>>;

    /// Replace the finalizer list of a `DKIMKey`.
    async fn set_dkim_key_finalizers(
        &self,
        namespace: &str,
        name: &str,
        finalizers: &[String],
    ) -> Result<()>;

    async fn patch_dkim_key_status(
        &self,
        namespace: &str,
        name: &str,
        status: &DKIMKeyStatus,
    ) -> Result<()>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>>;

    /// Create a secret. Fails if one already exists under the same name.
    async fn create_secret(&self, secret: &Secret) -> Result<()>;

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()>;

    async fn get_dns_endpoint(&self, namespace: &str, name: &str) -> Result<Option<DNSEndpoint>>;

    async fn list_dns_endpoints(&self, namespace: &str) -> Result<Vec<DNSEndpoint>>;

    /// Create or overwrite a `DNSEndpoint` with server-side apply.
    async fn apply_dns_endpoint(&self, endpoint: &DNSEndpoint) -> Result<()>;

    async fn delete_dns_endpoint(&self, namespace: &str, name: &str) -> Result<()>;
}

/// [`DkimStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn dkim_keys(&self, namespace: &str) -> Api<DKIMKey> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn dns_endpoints(&self, namespace: &str) -> Api<DNSEndpoint> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 404)
}

#[async_trait]
impl DkimStore for KubeStore {
    async fn get_dkim_key(&self, namespace: &str, name: &str) -> Result<Option<DKIMKey>> {
        self.dkim_keys(namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("failed to get DKIMKey {namespace}/{name}"))
    }

    async fn set_dkim_key_finalizers(
        &self,
        namespace: &str,
        name: &str,
        finalizers: &[String],
    ) -> Result<()> {
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        self.dkim_keys(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("failed to update finalizers of DKIMKey {namespace}/{name}"))?;
        Ok(())
    }

    async fn patch_dkim_key_status(
        &self,
        namespace: &str,
        name: &str,
        status: &DKIMKeyStatus,
    ) -> Result<()> {
        let patch = json!({ "status": status });
        self.dkim_keys(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("failed to update status of DKIMKey {namespace}/{name}"))?;
        Ok(())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        self.secrets(namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("failed to get Secret {namespace}/{name}"))
    }

    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>> {
        let list = self
            .secrets(namespace)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list Secrets in {namespace}"))?;
        Ok(list.items)
    }

    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        let namespace = secret.namespace().unwrap_or_default();
        self.secrets(&namespace)
            .create(&PostParams::default(), secret)
            .await
            .with_context(|| format!("failed to create Secret {namespace}/{}", secret.name_any()))?;
        Ok(())
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        match self.secrets(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!("Secret {}/{} already deleted", namespace, name);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("failed to delete Secret {namespace}/{name}")),
        }
    }

    async fn get_dns_endpoint(&self, namespace: &str, name: &str) -> Result<Option<DNSEndpoint>> {
        self.dns_endpoints(namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("failed to get DNSEndpoint {namespace}/{name}"))
    }

    async fn list_dns_endpoints(&self, namespace: &str) -> Result<Vec<DNSEndpoint>> {
        let list = self
            .dns_endpoints(namespace)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list DNSEndpoints in {namespace}"))?;
        Ok(list.items)
    }

    async fn apply_dns_endpoint(&self, endpoint: &DNSEndpoint) -> Result<()> {
        let namespace = endpoint.namespace().unwrap_or_default();
        let name = endpoint.name_any();
        self.dns_endpoints(&namespace)
            .patch(
                &name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(endpoint),
            )
            .await
            .with_context(|| format!("failed to apply DNSEndpoint {namespace}/{name}"))?;
        Ok(())
    }

    async fn delete_dns_endpoint(&self, namespace: &str, name: &str) -> Result<()> {
        match self
            .dns_endpoints(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!("DNSEndpoint {}/{} already deleted", namespace, name);
                Ok(())
            }
            Err(e) => {
                Err(e).with_context(|| format!("failed to delete DNSEndpoint {namespace}/{name}"))
            }
        }
    }
}
