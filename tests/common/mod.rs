// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

use dkim_manager::crd::{DKIMKey, DKIMKeySpec, KeyLength, KeyType};
use kube::{
    api::{Api, DeleteParams, PostParams},
    client::Client,
    ResourceExt,
};
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {}", e);
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());

    let ns = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "labels": {
                "test": "integration",
                "managed-by": "dkim-manager-test"
            }
        }
    }))?;

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("Created test namespace: {}", name);
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("Test namespace already exists: {}", name);
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Cleanup test namespace
pub async fn cleanup_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());

    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            println!("Deleted test namespace: {}", name);
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            println!("Test namespace already deleted: {}", name);
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Create a `DKIMKey` for testing
pub async fn create_dkim_key(
    client: &Client,
    namespace: &str,
    name: &str,
    key_type: KeyType,
) -> Result<DKIMKey, Box<dyn std::error::Error>> {
    let api: Api<DKIMKey> = Api::namespaced(client.clone(), namespace);

    let mut dkim_key = DKIMKey::new(
        name,
        DKIMKeySpec {
            secret_name: name.to_string(),
            selector: "s1".to_string(),
            domain: "example.com".to_string(),
            ttl: 300,
            key_length: KeyLength::Bits2048,
            key_type,
        },
    );
    dkim_key.metadata.namespace = Some(namespace.to_string());

    let created = api.create(&PostParams::default(), &dkim_key).await?;
    println!("Created DKIMKey: {}/{}", namespace, created.name_any());
    Ok(created)
}

/// Poll until the `DKIMKey` reports `Ready=True`
pub async fn wait_for_ready(
    client: &Client,
    namespace: &str,
    name: &str,
    timeout: Duration,
) -> Result<DKIMKey, Box<dyn std::error::Error>> {
    let api: Api<DKIMKey> = Api::namespaced(client.clone(), namespace);
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let dkim_key = api.get(name).await?;
        if dkim_key.is_ready() {
            return Ok(dkim_key);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(format!("DKIMKey {namespace}/{name} not ready after {timeout:?}").into());
        }
        sleep(Duration::from_secs(2)).await;
    }
}
