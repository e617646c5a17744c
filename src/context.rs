// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the `DKIMKey` controller.
//!
//! The controller receives an `Arc<Context>` holding:
//! - the [`DkimStore`] every read and write goes through
//! - the namespace the controller is restricted to, if any

use crate::store::DkimStore;
use std::sync::Arc;

/// Shared context passed to the reconciler.
#[derive(Clone)]
pub struct Context {
    /// Access to `DKIMKey`, `Secret` and `DNSEndpoint` objects
    pub store: Arc<dyn DkimStore>,

    /// Only `DKIMKey`s in this namespace are managed; `None` manages all namespaces
    pub watch_namespace: Option<String>,
}

impl Context {
    #[must_use]
    pub fn new(store: Arc<dyn DkimStore>, watch_namespace: Option<String>) -> Self {
        Self {
            store,
            watch_namespace,
        }
    }

    /// `true` if `DKIMKey`s in `namespace` are managed by this controller.
    #[must_use]
    pub fn manages_namespace(&self, namespace: &str) -> bool {
        self.watch_namespace
            .as_deref()
            .is_none_or(|watched| watched == namespace)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
