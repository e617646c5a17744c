// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation for `DKIMKey` resources.
//!
//! The DKIM manager follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor `DKIMKey` changes via the Kubernetes API
//! 2. **Reconcile** - Compare the spec with the generated secret and DNS record
//! 3. **Update** - Generate or recover key material and publish the record
//! 4. **Status** - Report the result in the `Ready` condition
//!
//! # Example: Using the Reconciler
//!
//! ```rust,no_run
//! use dkim_manager::context::Context;
//! use dkim_manager::reconcilers::reconcile_dkimkey;
//!
//! async fn reconcile(ctx: &Context) -> anyhow::Result<()> {
//!     let outcome = reconcile_dkimkey(ctx, "mail", "example-com-s1").await?;
//!     println!("retry: {}", outcome.retry_worthy());
//!     Ok(())
//! }
//! ```

pub mod dkimkey;
pub mod finalizers;
pub mod status;

#[cfg(test)]
mod finalizers_tests;

pub use dkimkey::{reconcile_dkimkey, ReconcileOutcome};

/// Check if a resource's spec has changed by comparing generation with `observed_generation`.
///
/// The `metadata.generation` field is incremented by Kubernetes only when the spec changes,
/// while `status.observed_generation` is set by the controller after processing a spec.
///
/// # Returns
///
/// * `true` - Reconciliation is needed (spec changed or first reconciliation)
/// * `false` - No reconciliation needed (spec unchanged, status-only update)
#[must_use]
pub fn should_reconcile(current_generation: Option<i64>, observed_generation: Option<i64>) -> bool {
    match (current_generation, observed_generation) {
        (Some(current), Some(observed)) => current != observed,
        (Some(_), None) => true, // First reconciliation
        _ => false,              // No generation tracking available
    }
}
