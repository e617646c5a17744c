// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for finalizer management.

#[cfg(test)]
mod tests {
    use crate::crd::{DKIMKey, DKIMKeySpec, DNSEndpoint, DNSEndpointSpec, KeyLength, KeyType};
    use crate::ownership::build_owner_references;
    use crate::reconcilers::finalizers::{
        ensure_finalizer, handle_deletion, has_finalizer, remove_finalizer,
    };
    use crate::store::fake::FakeStore;
    use k8s_openapi::api::core::v1::Secret;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    const FINALIZER: &str = "dkim-manager.atelierhsn.com/finalizer";

    fn dkim_key(name: &str, finalizers: Option<Vec<String>>) -> DKIMKey {
        let mut key = DKIMKey::new(
            name,
            DKIMKeySpec {
                secret_name: name.into(),
                selector: "s1".into(),
                domain: "example.com".into(),
                ttl: 86400,
                key_length: KeyLength::Bits2048,
                key_type: KeyType::Rsa,
            },
        );
        key.metadata.namespace = Some("mail".into());
        key.metadata.finalizers = finalizers;
        key
    }

    fn secret(name: &str, owner: Option<&DKIMKey>) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some("mail".into()),
                owner_references: owner.map(build_owner_references),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn endpoint(name: &str, owner: Option<&DKIMKey>) -> DNSEndpoint {
        let mut endpoint = DNSEndpoint::new(name, DNSEndpointSpec::default());
        endpoint.metadata.namespace = Some("mail".into());
        endpoint.metadata.owner_references = owner.map(build_owner_references);
        endpoint
    }

    #[test]
    fn test_has_finalizer() {
        assert!(!has_finalizer(&dkim_key("k", None), FINALIZER));
        assert!(has_finalizer(
            &dkim_key("k", Some(vec![FINALIZER.to_string()])),
            FINALIZER
        ));
    }

    #[tokio::test]
    async fn test_ensure_finalizer_adds_once() {
        let store = FakeStore::new();
        let key = dkim_key("k", None);
        store.insert_dkim_key(key.clone());

        assert!(ensure_finalizer(&store, &key, FINALIZER).await.unwrap());

        let stored = store.dkim_key("mail", "k").unwrap();
        assert!(has_finalizer(&stored, FINALIZER));
        assert!(!ensure_finalizer(&store, &stored, FINALIZER).await.unwrap());
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_remove_finalizer_keeps_others() {
        let store = FakeStore::new();
        let key = dkim_key("k", Some(vec!["other".to_string(), FINALIZER.to_string()]));
        store.insert_dkim_key(key.clone());

        remove_finalizer(&store, &key, FINALIZER).await.unwrap();

        let stored = store.dkim_key("mail", "k").unwrap();
        assert_eq!(stored.metadata.finalizers, Some(vec!["other".to_string()]));
    }

    #[tokio::test]
    async fn test_handle_deletion_only_deletes_owned_children() {
        let store = FakeStore::new();
        let key = dkim_key("k", Some(vec![FINALIZER.to_string()]));
        let other_key = dkim_key("other", None);
        store.insert_dkim_key(key.clone());
        store.insert_secret(secret("k", Some(&key)));
        store.insert_secret(secret("foreign", None));
        store.insert_secret(secret("other", Some(&other_key)));
        store.insert_dns_endpoint(endpoint("k", Some(&key)));
        store.insert_dns_endpoint(endpoint("www", None));
        store.request_deletion("mail", "k");

        handle_deletion(&store, &key, FINALIZER).await.unwrap();

        assert!(store.secret("mail", "k").is_none());
        assert!(store.secret("mail", "foreign").is_some());
        assert!(store.secret("mail", "other").is_some());
        assert!(store.dns_endpoint("mail", "k").is_none());
        assert!(store.dns_endpoint("mail", "www").is_some());
        assert!(store.dkim_key("mail", "k").is_none());
    }

    #[tokio::test]
    async fn test_handle_deletion_without_finalizer_is_noop() {
        let store = FakeStore::new();
        let key = dkim_key("k", None);
        store.insert_secret(secret("k", Some(&key)));

        handle_deletion(&store, &key, FINALIZER).await.unwrap();

        assert!(store.secret("mail", "k").is_some());
        assert_eq!(store.writes(), 0);
    }
}
