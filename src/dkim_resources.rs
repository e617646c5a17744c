// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Builders for the objects generated on behalf of a `DKIMKey`.
//!
//! - the private key `Secret`, named `spec.secretName`, immutable
//! - the `DNSEndpoint` publishing the DKIM TXT record, named after the `DKIMKey`
//!
//! Both carry the standard labels and a controller owner reference.

use crate::crd::{DKIMKey, DNSEndpoint, DNSEndpointSpec};
use crate::dkim::KeyMaterial;
use crate::dns_record::DnsRecord;
use crate::labels::{generated_labels, COMPONENT_DNS_RECORD, COMPONENT_PRIVATE_KEY};
use crate::ownership::build_owner_references;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Builds the immutable `Secret` holding the private key of `dkim_key`.
///
/// The PEM is stored under the data key `{domain}.{selector}.key`.
#[must_use]
pub fn build_private_key_secret(dkim_key: &DKIMKey, material: &KeyMaterial) -> Secret {
    let name = dkim_key.name_any();

    Secret {
        metadata: ObjectMeta {
            name: Some(dkim_key.spec.secret_name.clone()),
            namespace: dkim_key.namespace(),
            labels: Some(generated_labels(&name, COMPONENT_PRIVATE_KEY)),
            owner_references: Some(build_owner_references(dkim_key)),
            ..Default::default()
        },
        immutable: Some(true),
        type_: Some("Opaque".to_string()),
        data: Some(BTreeMap::from([(
            dkim_key.spec.private_key_name(),
            ByteString(material.private_key_pem.clone()),
        )])),
        ..Default::default()
    }
}

/// Builds the `DNSEndpoint` publishing `record` for `dkim_key`.
#[must_use]
pub fn build_dns_endpoint(dkim_key: &DKIMKey, record: &DnsRecord) -> DNSEndpoint {
    let name = dkim_key.name_any();

    let mut endpoint = DNSEndpoint::new(
        &name,
        DNSEndpointSpec {
            endpoints: vec![record.to_endpoint()],
        },
    );
    endpoint.metadata.namespace = dkim_key.namespace();
    endpoint.metadata.labels = Some(generated_labels(&name, COMPONENT_DNS_RECORD));
    endpoint.metadata.owner_references = Some(build_owner_references(dkim_key));
    endpoint
}
