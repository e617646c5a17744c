// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `DKIMKey` resources.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (always `Ready` here)
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `observedGeneration`: The generation the condition was computed from
//! - `lastTransitionTime`: RFC3339 timestamp when the status last changed
//!
//! Setting a condition that already holds the same type, status and reason is
//! a no-op apart from advancing `observedGeneration`: the message and the
//! transition time are kept, so repeated failures do not churn the object.
//!
//! # Example
//!
//! ```rust,no_run
//! use dkim_manager::reconcilers::status::create_condition;
//!
//! let condition = create_condition("Ready", "True", "Succeeded", "DKIM key created successfully", Some(1));
//! assert_eq!(condition.r#type, "Ready");
//! ```

use crate::crd::{Condition, DKIMKey, DKIMKeyStatus};
use crate::store::DkimStore;
use anyhow::Result;
use chrono::Utc;
use kube::ResourceExt;
use tracing::debug;

/// Create a new condition stamped with the current time.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        observed_generation,
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// - Same status and reason: only `observedGeneration` moves forward.
/// - Same status, different reason: reason and message are replaced, the
///   transition time is kept.
/// - Different status: the condition is replaced with a fresh transition time.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) {
    let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) else {
        conditions.push(create_condition(
            condition_type,
            status,
            reason,
            message,
            observed_generation,
        ));
        return;
    };

    existing.observed_generation = max_generation(existing.observed_generation, observed_generation);

    if existing.status == status && existing.reason.as_deref() == Some(reason) {
        return;
    }

    if existing.status != status || existing.last_transition_time.is_none() {
        existing.last_transition_time = Some(Utc::now().to_rfc3339());
    }
    existing.status = status.to_string();
    existing.reason = Some(reason.to_string());
    existing.message = Some(message.to_string());
}

/// Compare two condition lists for semantic equality.
///
/// Messages and transition times are ignored; type, status, reason and
/// observed generation are compared.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new.iter().all(|new_cond| {
            find_condition(current, &new_cond.r#type).is_some_and(|curr_cond| {
                curr_cond.status == new_cond.status
                    && curr_cond.reason == new_cond.reason
                    && curr_cond.observed_generation == new_cond.observed_generation
            })
        })
}

fn max_generation(current: Option<i64>, new: Option<i64>) -> Option<i64> {
    match (current, new) {
        (Some(c), Some(n)) => Some(c.max(n)),
        (c, n) => n.or(c),
    }
}

/// Collects status changes for a `DKIMKey` and writes them in one patch.
///
/// `observedGeneration` never moves backwards.
///
/// # Example
///
/// ```rust,ignore
/// let mut status_updater = DKIMKeyStatusUpdater::new(&dkim_key);
/// status_updater.set_ready(REASON_SUCCEEDED, MESSAGE_SUCCEEDED);
/// status_updater.apply(store).await?;
/// ```
pub struct DKIMKeyStatusUpdater {
    namespace: String,
    name: String,
    generation: Option<i64>,
    current_status: Option<DKIMKeyStatus>,
    new_status: DKIMKeyStatus,
}

impl DKIMKeyStatusUpdater {
    #[must_use]
    pub fn new(dkim_key: &DKIMKey) -> Self {
        let current_status = dkim_key.status.clone();
        let new_status = current_status.clone().unwrap_or_default();

        Self {
            namespace: dkim_key.namespace().unwrap_or_default(),
            name: dkim_key.name_any(),
            generation: dkim_key.metadata.generation,
            current_status,
            new_status,
        }
    }

    /// Set the `Ready` condition and advance `observedGeneration` (in-memory only).
    pub fn set_condition(&mut self, condition_type: &str, status: &str, reason: &str, message: &str) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
            self.generation,
        );
        self.new_status.observed_generation =
            max_generation(self.new_status.observed_generation, self.generation);
    }

    /// `true` if the collected status differs semantically from the stored one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.observed_generation != self.new_status.observed_generation
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> &DKIMKeyStatus {
        &self.new_status
    }

    /// Persist the collected status, skipping the write when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the status patch fails.
    pub async fn apply(&self, store: &dyn DkimStore) -> Result<()> {
        if !self.has_changes() {
            debug!(
                "DKIMKey {}/{} status unchanged, skipping update",
                self.namespace, self.name
            );
            return Ok(());
        }

        store
            .patch_dkim_key_status(&self.namespace, &self.name, &self.new_status)
            .await?;

        debug!(
            "Updated DKIMKey {}/{} status: observedGeneration={:?}",
            self.namespace, self.name, self.new_status.observed_generation
        );

        Ok(())
    }
}
