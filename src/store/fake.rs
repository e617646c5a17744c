// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`DkimStore`] for reconciler tests.

use super::DkimStore;
use crate::crd::{DKIMKey, DKIMKeyStatus, DNSEndpoint};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
pub struct FakeStore {
    dkim_keys: Mutex<BTreeMap<Key, DKIMKey>>,
    secrets: Mutex<BTreeMap<Key, Secret>>,
    dns_endpoints: Mutex<BTreeMap<Key, DNSEndpoint>>,
    writes: AtomicUsize,
    fail_secret_create: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_dkim_key(&self, dkim_key: DKIMKey) {
        let k = key(&dkim_key.namespace().unwrap_or_default(), &dkim_key.name_any());
        self.dkim_keys.lock().unwrap().insert(k, dkim_key);
    }

    pub fn insert_secret(&self, secret: Secret) {
        let k = key(&secret.namespace().unwrap_or_default(), &secret.name_any());
        self.secrets.lock().unwrap().insert(k, secret);
    }

    pub fn insert_dns_endpoint(&self, endpoint: DNSEndpoint) {
        let k = key(&endpoint.namespace().unwrap_or_default(), &endpoint.name_any());
        self.dns_endpoints.lock().unwrap().insert(k, endpoint);
    }

    pub fn dkim_key(&self, namespace: &str, name: &str) -> Option<DKIMKey> {
        self.dkim_keys.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn dns_endpoint(&self, namespace: &str, name: &str) -> Option<DNSEndpoint> {
        self.dns_endpoints.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn secret_count(&self) -> usize {
        self.secrets.lock().unwrap().len()
    }

    pub fn dns_endpoint_count(&self) -> usize {
        self.dns_endpoints.lock().unwrap().len()
    }

    /// Number of mutating calls made so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Bump the generation of a stored `DKIMKey`, as a spec edit would.
    pub fn bump_generation(&self, namespace: &str, name: &str) {
        if let Some(dkim_key) = self.dkim_keys.lock().unwrap().get_mut(&key(namespace, name)) {
            dkim_key.metadata.generation = Some(dkim_key.metadata.generation.unwrap_or(0) + 1);
        }
    }

    /// Request deletion of a `DKIMKey`; it disappears once its finalizers are gone.
    pub fn request_deletion(&self, namespace: &str, name: &str) {
        if let Some(dkim_key) = self.dkim_keys.lock().unwrap().get_mut(&key(namespace, name)) {
            dkim_key.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
        }
    }

    pub fn fail_secret_create(&self, fail: bool) {
        self.fail_secret_create.store(fail, Ordering::SeqCst);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DkimStore for FakeStore {
    async fn get_dkim_key(&self, namespace: &str, name: &str) -> Result<Option<DKIMKey>> {
        Ok(self.dkim_key(namespace, name))
    }

    async fn set_dkim_key_finalizers(
        &self,
        namespace: &str,
        name: &str,
        finalizers: &[String],
    ) -> Result<()> {
        self.record_write();
        let mut dkim_keys = self.dkim_keys.lock().unwrap();
        let k = key(namespace, name);
        let dkim_key = dkim_keys
            .get_mut(&k)
            .ok_or_else(|| anyhow!("dkimkeys \"{name}\" not found"))?;
        dkim_key.metadata.finalizers = Some(finalizers.to_vec());
        if finalizers.is_empty() && dkim_key.metadata.deletion_timestamp.is_some() {
            dkim_keys.remove(&k);
        }
        Ok(())
    }

    async fn patch_dkim_key_status(
        &self,
        namespace: &str,
        name: &str,
        status: &DKIMKeyStatus,
    ) -> Result<()> {
        self.record_write();
        let mut dkim_keys = self.dkim_keys.lock().unwrap();
        let dkim_key = dkim_keys
            .get_mut(&key(namespace, name))
            .ok_or_else(|| anyhow!("dkimkeys \"{name}\" not found"))?;
        dkim_key.status = Some(status.clone());
        Ok(())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self.secret(namespace, name))
    }

    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>> {
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, secret)| secret.clone())
            .collect())
    }

    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        self.record_write();
        if self.fail_secret_create.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        let k = key(&secret.namespace().unwrap_or_default(), &secret.name_any());
        let mut secrets = self.secrets.lock().unwrap();
        if secrets.contains_key(&k) {
            bail!("secrets \"{}\" already exists", k.1);
        }
        secrets.insert(k, secret.clone());
        Ok(())
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        self.record_write();
        self.secrets.lock().unwrap().remove(&key(namespace, name));
        Ok(())
    }

    async fn get_dns_endpoint(&self, namespace: &str, name: &str) -> Result<Option<DNSEndpoint>> {
        Ok(self.dns_endpoint(namespace, name))
    }

    async fn list_dns_endpoints(&self, namespace: &str) -> Result<Vec<DNSEndpoint>> {
        Ok(self
            .dns_endpoints
            .lock()
            .unwrap()
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, endpoint)| endpoint.clone())
            .collect())
    }

    async fn apply_dns_endpoint(&self, endpoint: &DNSEndpoint) -> Result<()> {
        self.record_write();
        self.insert_dns_endpoint(endpoint.clone());
        Ok(())
    }

    async fn delete_dns_endpoint(&self, namespace: &str, name: &str) -> Result<()> {
        self.record_write();
        self.dns_endpoints.lock().unwrap().remove(&key(namespace, name));
        Ok(())
    }
}
