// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # dkim-manager - DKIM Key Operator for Kubernetes
//!
//! dkim-manager is a Kubernetes operator that manages DKIM key pairs through a
//! `DKIMKey` Custom Resource Definition.
//!
//! ## Overview
//!
//! For every `DKIMKey` the operator:
//!
//! - generates an RSA or Ed25519 key pair exactly once
//! - stores the private key in an immutable `Secret`
//! - publishes the public key as an external-dns `DNSEndpoint` TXT record
//! - reports progress in a `Ready` status condition
//!
//! Admission webhooks keep users from editing or deleting the generated
//! objects, and a conversion webhook bridges the `v1` and `v2` revisions.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`dkim`] - key pair generation and public key derivation
//! - [`dns_record`] - DKIM TXT record formatting
//! - [`reconcilers`] - reconciliation logic
//! - [`store`] - the resource store seam the reconciler writes through
//! - [`admission`] - admission guards for generated objects
//! - [`conversion`] - `DKIMKey` revision bridge
//! - [`webhook`] - HTTP transport for admission, conversion and metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use dkim_manager::crd::{DKIMKeySpec, KeyLength, KeyType};
//! use dkim_manager::dns_record::DnsRecord;
//!
//! let spec = DKIMKeySpec {
//!     secret_name: "example-com-s1".to_string(),
//!     selector: "s1".to_string(),
//!     domain: "example.com".to_string(),
//!     ttl: 86400,
//!     key_length: KeyLength::Bits2048,
//!     key_type: KeyType::Ed25519,
//! };
//!
//! let record = DnsRecord::new(&spec, "MCowBQYDK2VwAyEA");
//! assert_eq!(record.dns_name, "s1._domainkey.example.com");
//! ```

pub mod admission;
pub mod config;
pub mod constants;
pub mod context;
pub mod conversion;
pub mod crd;
pub mod dkim;
pub mod dkim_resources;
pub mod dns_record;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod ownership;
pub mod reconcilers;
pub mod status_reasons;
pub mod store;
pub mod webhook;

#[cfg(test)]
mod dns_record_tests;
#[cfg(test)]
mod webhook_tests;
