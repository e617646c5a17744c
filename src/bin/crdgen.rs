// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Generates the `DKIMKey` CRD YAML from the Rust types defined in src/crd.rs.
//! Both revisions are merged into one CRD with `v2` as the storage version and
//! conversion delegated to the `/convert` webhook.
//!
//! Usage:
//!   cargo run --bin crdgen
//!
//! The generated file is written to deploy/crds/ with proper headers.

use dkim_manager::constants::API_VERSION_V2;
use dkim_manager::crd::{v1, v2};
use dkim_manager::webhook::CONVERSION_WEBHOOK_PATH;
use kube::core::crd::merge_crds;
use kube::CustomResourceExt;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

const WEBHOOK_SERVICE_NAME: &str = "dkim-manager-webhook-service";
const WEBHOOK_SERVICE_NAMESPACE: &str = "dkim-manager";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/crds");

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    println!("Generating CRD YAML files from src/crd.rs...");

    let crd = merge_crds(vec![v1::DKIMKey::crd(), v2::DKIMKey::crd()], API_VERSION_V2)?;
    let mut crd_json: Value = serde_json::to_value(&crd)?;

    crd_json["spec"]["conversion"] = json!({
        "strategy": "Webhook",
        "webhook": {
            "conversionReviewVersions": ["v1"],
            "clientConfig": {
                "service": {
                    "name": WEBHOOK_SERVICE_NAME,
                    "namespace": WEBHOOK_SERVICE_NAMESPACE,
                    "path": CONVERSION_WEBHOOK_PATH,
                }
            }
        }
    });

    let yaml = serde_yaml::to_string(&crd_json)?;
    let content = format!("{COPYRIGHT_HEADER}{yaml}");

    let output_path = output_dir.join("dkimkeys.crd.yaml");
    fs::write(&output_path, content)?;

    println!("  ✓ Generated dkimkeys.crd.yaml");
    println!("\nNext steps:");
    println!("  1. Review the generated file");
    println!("  2. Deploy with: kubectl apply -f deploy/crds/");

    Ok(())
}
