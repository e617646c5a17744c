// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `webhook`

#[cfg(test)]
mod tests {
    use crate::admission::{
        ControllerIdentity, DENY_RECORD_DELETE, DENY_SECRET_DELETE, DENY_SECRET_UPDATE,
        DENY_SPEC_CHANGE,
    };
    use crate::webhook::{review_admission, review_conversion, Guard};
    use kube::core::admission::{AdmissionResponse, AdmissionReview};
    use kube::core::conversion::ConversionReview;
    use kube::core::DynamicObject;
    use serde_json::{json, Value};

    const CONTROLLER: &str = "system:serviceaccount:dkim-manager:dkim-manager-controller-manager";

    fn controller() -> ControllerIdentity {
        ControllerIdentity::new(CONTROLLER)
    }

    fn owner_references() -> Value {
        json!([{
            "apiVersion": "dkim-manager.atelierhsn.com/v2",
            "kind": "DKIMKey",
            "name": "example-com-s1",
            "uid": "uid-1",
            "controller": true,
            "blockOwnerDeletion": true
        }])
    }

    fn owned_secret() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {
                "name": "example-com-s1",
                "namespace": "mail",
                "ownerReferences": owner_references()
            },
            "immutable": true,
            "data": {"example.com.s1.key": "c2VjcmV0"}
        })
    }

    fn owned_endpoint() -> Value {
        json!({
            "apiVersion": "externaldns.k8s.io/v1alpha1",
            "kind": "DNSEndpoint",
            "metadata": {
                "name": "example-com-s1",
                "namespace": "mail",
                "ownerReferences": owner_references()
            },
            "spec": {"endpoints": [{
                "dnsName": "s1._domainkey.example.com",
                "recordType": "TXT",
                "targets": ["\"v=DKIM1; k=ed25519;p=AAAA\""]
            }]}
        })
    }

    fn dkim_key(domain: &str, ttl: u64) -> Value {
        json!({
            "apiVersion": "dkim-manager.atelierhsn.com/v2",
            "kind": "DKIMKey",
            "metadata": {"name": "example-com-s1", "namespace": "mail"},
            "spec": {
                "secretName": "example-com-s1",
                "selector": "s1",
                "domain": domain,
                "ttl": ttl,
                "keyLength": 2048,
                "keyType": "rsa"
            }
        })
    }

    fn legacy_dkim_key(domain: &str, ttl: u64) -> Value {
        let mut key = dkim_key(domain, ttl);
        key["apiVersion"] = json!("dkim-manager.atelierhsn.com/v1");
        key["status"] = json!("ok");
        key
    }

    fn review(
        kind: &str,
        operation: &str,
        username: &str,
        object: Option<Value>,
        old_object: Option<Value>,
    ) -> AdmissionReview<DynamicObject> {
        serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "", "version": "v1", "kind": kind},
                "resource": {"group": "", "version": "v1", "resource": kind.to_lowercase()},
                "name": "example-com-s1",
                "namespace": "mail",
                "operation": operation,
                "userInfo": {"username": username, "groups": ["system:authenticated"]},
                "object": object,
                "oldObject": old_object,
                "dryRun": false
            }
        }))
        .unwrap()
    }

    fn response(review: AdmissionReview<DynamicObject>) -> AdmissionResponse {
        review.response.unwrap()
    }

    #[test]
    fn test_secret_delete_by_user_denied() {
        let review = review("Secret", "DELETE", "alice", None, Some(owned_secret()));

        let response = response(review_admission(Guard::Secret, review, &controller()));

        assert!(!response.allowed);
        assert_eq!(response.result.message, DENY_SECRET_DELETE);
    }

    #[test]
    fn test_secret_update_by_user_denied() {
        let review = review(
            "Secret",
            "UPDATE",
            "alice",
            Some(owned_secret()),
            Some(owned_secret()),
        );

        let response = response(review_admission(Guard::Secret, review, &controller()));

        assert!(!response.allowed);
        assert_eq!(response.result.message, DENY_SECRET_UPDATE);
    }

    #[test]
    fn test_secret_delete_by_controller_allowed() {
        let review = review("Secret", "DELETE", CONTROLLER, None, Some(owned_secret()));

        assert!(response(review_admission(Guard::Secret, review, &controller())).allowed);
    }

    #[test]
    fn test_secret_create_allowed_without_decoding() {
        let review = review("Secret", "CREATE", "alice", Some(owned_secret()), None);

        assert!(response(review_admission(Guard::Secret, review, &controller())).allowed);
    }

    #[test]
    fn test_unowned_secret_delete_allowed() {
        let mut secret = owned_secret();
        secret["metadata"]
            .as_object_mut()
            .unwrap()
            .remove("ownerReferences");
        let review = review("Secret", "DELETE", "alice", None, Some(secret));

        assert!(response(review_admission(Guard::Secret, review, &controller())).allowed);
    }

    #[test]
    fn test_delete_without_old_object_denied() {
        let review = review("Secret", "DELETE", "alice", None, None);

        let response = response(review_admission(Guard::Secret, review, &controller()));

        assert!(!response.allowed);
        assert!(response.result.message.contains("oldObject"));
    }

    #[test]
    fn test_dns_endpoint_delete_by_user_denied() {
        let review = review("DNSEndpoint", "DELETE", "alice", None, Some(owned_endpoint()));

        let response = response(review_admission(Guard::DNSEndpoint, review, &controller()));

        assert!(!response.allowed);
        assert_eq!(response.result.message, DENY_RECORD_DELETE);
    }

    #[test]
    fn test_dns_endpoint_update_allowed() {
        let review = review(
            "DNSEndpoint",
            "UPDATE",
            "alice",
            Some(owned_endpoint()),
            Some(owned_endpoint()),
        );

        assert!(response(review_admission(Guard::DNSEndpoint, review, &controller())).allowed);
    }

    #[test]
    fn test_dkimkey_ttl_change_allowed() {
        let review = review(
            "DKIMKey",
            "UPDATE",
            "alice",
            Some(dkim_key("example.com", 300)),
            Some(dkim_key("example.com", 86400)),
        );

        assert!(response(review_admission(Guard::DKIMKey, review, &controller())).allowed);
    }

    #[test]
    fn test_dkimkey_domain_change_denied() {
        let review = review(
            "DKIMKey",
            "UPDATE",
            "alice",
            Some(dkim_key("example.org", 86400)),
            Some(dkim_key("example.com", 86400)),
        );

        let response = response(review_admission(Guard::DKIMKey, review, &controller()));

        assert!(!response.allowed);
        assert_eq!(response.result.message, DENY_SPEC_CHANGE);
    }

    #[test]
    fn test_legacy_dkimkey_ttl_change_allowed() {
        let review = review(
            "DKIMKey",
            "UPDATE",
            "alice",
            Some(legacy_dkim_key("example.com", 300)),
            Some(legacy_dkim_key("example.com", 86400)),
        );

        let response = response(review_admission(Guard::DKIMKey, review, &controller()));

        assert!(response.allowed, "{}", response.result.message);
    }

    #[test]
    fn test_legacy_dkimkey_domain_change_denied() {
        let review = review(
            "DKIMKey",
            "UPDATE",
            "alice",
            Some(legacy_dkim_key("example.org", 86400)),
            Some(legacy_dkim_key("example.com", 86400)),
        );

        let response = response(review_admission(Guard::DKIMKey, review, &controller()));

        assert!(!response.allowed);
        assert_eq!(response.result.message, DENY_SPEC_CHANGE);
    }

    #[test]
    fn test_dkimkey_finalizer_patch_on_legacy_object_allowed() {
        let old = legacy_dkim_key("example.com", 86400);
        let mut new = old.clone();
        new["metadata"]["finalizers"] = json!(["dkim-manager.atelierhsn.com/finalizer"]);
        let review = review("DKIMKey", "UPDATE", CONTROLLER, Some(new), Some(old));

        assert!(response(review_admission(Guard::DKIMKey, review, &controller())).allowed);
    }

    #[test]
    fn test_undecodable_object_denied() {
        let mut broken = dkim_key("example.com", 86400);
        broken["spec"]["keyLength"] = json!(512);
        let review = review(
            "DKIMKey",
            "UPDATE",
            "alice",
            Some(broken),
            Some(dkim_key("example.com", 86400)),
        );

        let response = response(review_admission(Guard::DKIMKey, review, &controller()));

        assert!(!response.allowed);
        assert!(response.result.message.contains("failed to decode DKIMKey"));
    }

    #[test]
    fn test_review_without_request_is_invalid() {
        let review: AdmissionReview<DynamicObject> = serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        }))
        .unwrap();

        let response = response(review_admission(Guard::Secret, review, &controller()));

        assert!(!response.allowed);
    }

    fn conversion_review(desired: &str, objects: Vec<Value>) -> ConversionReview {
        serde_json::from_value(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "ConversionReview",
            "request": {
                "uid": "f7c0a5d3-0000-4000-8000-000000000001",
                "desiredAPIVersion": desired,
                "objects": objects
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_conversion_downgrades_objects() {
        let mut object = dkim_key("example.com", 86400);
        object["status"] = json!({
            "observedGeneration": 1,
            "conditions": [{"type": "Ready", "status": "True", "reason": "Succeeded"}]
        });
        let review = conversion_review("dkim-manager.atelierhsn.com/v1", vec![object]);

        let response = review_conversion(review).response.unwrap();

        assert_eq!(response.uid, "f7c0a5d3-0000-4000-8000-000000000001");
        assert_eq!(response.converted_objects.len(), 1);
        let converted = &response.converted_objects[0];
        assert_eq!(converted["apiVersion"], "dkim-manager.atelierhsn.com/v1");
        assert_eq!(converted["status"], "ok");
        assert_eq!(converted["spec"]["domain"], "example.com");
    }

    #[test]
    fn test_conversion_to_unknown_version_fails() {
        let review = conversion_review(
            "dkim-manager.atelierhsn.com/v3",
            vec![dkim_key("example.com", 86400)],
        );

        let response = review_conversion(review).response.unwrap();

        assert!(response.converted_objects.is_empty());
        assert!(response.result.message.contains("unsupported apiVersion"));
    }
}
