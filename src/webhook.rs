// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP transport for the admission guards and the `DKIMKey` conversion bridge.
//!
//! Two routers are served:
//!
//! - [`webhook_router`] - admission reviews and conversion reviews from the API server
//! - [`probe_router`] - `/healthz`, `/readyz` and Prometheus `/metrics`
//!
//! Decoding and decision making happen in [`review_admission`] and
//! [`review_conversion`]; the axum handlers only unwrap and wrap JSON.
//!
//! TLS for the webhook listener is terminated in front of the process.

use crate::admission::{
    validate_dkimkey_update, validate_dns_endpoint_delete, validate_secret_change,
    ControllerIdentity, RequesterIdentity, Verdict,
};
use crate::constants::API_GROUP_VERSION_V1;
use crate::conversion::{convert_object, upgrade};
use crate::crd::{v1, DKIMKey, DNSEndpoint};
use crate::errors::WebhookError;
use crate::metrics;
use anyhow::{Context as _, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use k8s_openapi::api::core::v1::Secret;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use kube::core::conversion::{ConversionRequest, ConversionResponse, ConversionReview};
use kube::core::{DynamicObject, Status};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

pub const DKIMKEY_WEBHOOK_PATH: &str = "/validate-dkim-manager-atelierhsn-com-v1-dkimkey";
pub const SECRET_WEBHOOK_PATH: &str = "/validate-secret";
pub const DNS_ENDPOINT_WEBHOOK_PATH: &str = "/validate-externaldns-k8s-io-v1alpha1-dnsendpoint";
pub const CONVERSION_WEBHOOK_PATH: &str = "/convert";

/// The validating webhooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard {
    /// `DKIMKey` updates
    DKIMKey,
    /// `Secret` updates and deletes
    Secret,
    /// `DNSEndpoint` deletes
    DNSEndpoint,
}

impl Guard {
    /// Label used for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Guard::DKIMKey => "dkimkey",
            Guard::Secret => "secret",
            Guard::DNSEndpoint => "dnsendpoint",
        }
    }

    /// Decide on `request`.
    ///
    /// Operations a guard does not cover are allowed without decoding.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] if the object the operation needs is missing
    /// or does not decode.
    pub fn evaluate(
        &self,
        request: &AdmissionRequest<DynamicObject>,
        controller: &ControllerIdentity,
    ) -> Result<Verdict, WebhookError> {
        let requester = RequesterIdentity {
            username: request.user_info.username.clone().unwrap_or_default(),
            groups: request.user_info.groups.clone().unwrap_or_default(),
        };

        match (self, &request.operation) {
            (Guard::DKIMKey, Operation::Update) => {
                let old = decode_dkim_key(request, Field::OldObject)?;
                let new = decode_dkim_key(request, Field::Object)?;
                Ok(validate_dkimkey_update(&old, &new))
            }
            (Guard::Secret, operation @ (Operation::Update | Operation::Delete)) => {
                let secret: Secret = decode(request, Field::OldObject, "Secret")?;
                Ok(validate_secret_change(operation, &secret, &requester, controller))
            }
            (Guard::DNSEndpoint, Operation::Delete) => {
                let endpoint: DNSEndpoint = decode(request, Field::OldObject, "DNSEndpoint")?;
                Ok(validate_dns_endpoint_delete(&endpoint, &requester, controller))
            }
            _ => Ok(Verdict::Allow),
        }
    }
}

#[derive(Clone, Copy)]
enum Field {
    Object,
    OldObject,
}

fn decode<K: DeserializeOwned>(
    request: &AdmissionRequest<DynamicObject>,
    field: Field,
    kind: &'static str,
) -> Result<K, WebhookError> {
    let (object, field_name) = match field {
        Field::Object => (request.object.as_ref(), "object"),
        Field::OldObject => (request.old_object.as_ref(), "oldObject"),
    };
    let object = object.ok_or_else(|| WebhookError::MissingObject {
        operation: format!("{:?}", request.operation),
        field: field_name,
    })?;

    serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(|source| WebhookError::Decode { kind, source })
}

/// Decode a `DKIMKey` of either served revision.
///
/// The hook is registered for v1, whose status is a bare string, so legacy
/// objects are decoded as v1 and upgraded before comparison.
fn decode_dkim_key(
    request: &AdmissionRequest<DynamicObject>,
    field: Field,
) -> Result<DKIMKey, WebhookError> {
    let value: Value = decode(request, field, "DKIMKey")?;
    let decode_error = |source| WebhookError::Decode {
        kind: "DKIMKey",
        source,
    };

    if value.get("apiVersion").and_then(Value::as_str) == Some(API_GROUP_VERSION_V1) {
        let legacy: v1::DKIMKey = serde_json::from_value(value).map_err(decode_error)?;
        Ok(upgrade(&legacy))
    } else {
        serde_json::from_value(value).map_err(decode_error)
    }
}

/// Answer an admission review with `guard`.
///
/// A review without a request is answered as invalid; an object that does not
/// decode is denied with the decode error.
#[must_use]
pub fn review_admission(
    guard: Guard,
    review: AdmissionReview<DynamicObject>,
    controller: &ControllerIdentity,
) -> AdmissionReview<DynamicObject> {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!(webhook = guard.as_str(), "Malformed admission review: {}", e);
            return AdmissionResponse::invalid(e.to_string()).into_review();
        }
    };

    let response = AdmissionResponse::from(&request);
    let response = match guard.evaluate(&request, controller) {
        Ok(verdict) => {
            metrics::record_admission(guard.as_str(), verdict.as_str());
            match verdict {
                Verdict::Allow => response,
                Verdict::Deny(reason) => response.deny(reason),
            }
        }
        Err(e) => {
            warn!(webhook = guard.as_str(), name = %request.name, "Rejecting admission request: {}", e);
            metrics::record_admission(guard.as_str(), "denied");
            response.deny(e.to_string())
        }
    };

    response.into_review()
}

/// Answer a conversion review.
///
/// Every object is converted to the desired revision; if any one fails the
/// whole review fails.
#[must_use]
pub fn review_conversion(review: ConversionReview) -> ConversionReview {
    let mut request = match ConversionRequest::from_review(review) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed conversion review: {}", e);
            return ConversionResponse::invalid(Status::failure(&e.to_string(), "InvalidRequest"))
                .into_review();
        }
    };

    let desired_api_version = request.desired_api_version.clone();
    let objects = std::mem::take(&mut request.objects);
    let response = ConversionResponse::for_request(request);

    let converted: Result<Vec<Value>, _> = objects
        .into_iter()
        .map(|object| convert_object(object, &desired_api_version))
        .collect();

    match converted {
        Ok(objects) => {
            debug!(
                desired_api_version = %desired_api_version,
                "Converted {} DKIMKey object(s)",
                objects.len()
            );
            metrics::record_conversion(&desired_api_version, "success");
            response.success(objects)
        }
        Err(e) => {
            warn!(desired_api_version = %desired_api_version, "DKIMKey conversion failed: {}", e);
            metrics::record_conversion(&desired_api_version, "failure");
            response.failure(Status::failure(&e.to_string(), "ConversionFailed"))
        }
    }
    .into_review()
}

/// Shared state of the webhook handlers.
#[derive(Clone, Debug)]
pub struct WebhookState {
    pub controller: ControllerIdentity,
}

/// Router for the validating and conversion webhooks.
pub fn webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route(DKIMKEY_WEBHOOK_PATH, post(validate_dkimkey))
        .route(SECRET_WEBHOOK_PATH, post(validate_secret))
        .route(DNS_ENDPOINT_WEBHOOK_PATH, post(validate_dns_endpoint))
        .route(CONVERSION_WEBHOOK_PATH, post(convert))
        .with_state(Arc::new(state))
}

/// Router for health probes and metrics.
pub fn probe_router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(healthz))
        .route("/metrics", get(serve_metrics))
}

/// Serve `router` on `addr` until the listener fails.
///
/// # Errors
///
/// Returns an error if `addr` cannot be bound or the server stops with an error.
pub async fn serve(addr: &str, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn validate_dkimkey(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    Json(review_admission(Guard::DKIMKey, review, &state.controller))
}

async fn validate_secret(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    Json(review_admission(Guard::Secret, review, &state.controller))
}

async fn validate_dns_endpoint(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    Json(review_admission(Guard::DNSEndpoint, review, &state.controller))
}

async fn convert(Json(review): Json<ConversionReview>) -> Json<ConversionReview> {
    Json(review_conversion(review))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn serve_metrics() -> Response {
    match metrics::gather_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
