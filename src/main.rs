// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use dkim_manager::{
    admission::ControllerIdentity,
    config::OperatorArgs,
    constants::{ERROR_REQUEUE_DURATION_SECS, FAILED_REQUEUE_SECS},
    context::Context,
    crd::{DKIMKey, DNSEndpoint},
    labels::{DKIM_MANAGER, K8S_MANAGED_BY},
    metrics,
    reconcilers::{reconcile_dkimkey, ReconcileOutcome},
    store::KubeStore,
    webhook::{self, WebhookState},
};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    let args = OperatorArgs::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("dkim-manager")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: OperatorArgs) -> Result<()> {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json|text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting DKIM manager");

    let watch_namespace = args.watch_namespace()?;
    match &watch_namespace {
        Some(namespace) => info!("Managing DKIMKeys in namespace {}", namespace),
        None => info!("Managing DKIMKeys in all namespaces"),
    }

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    let ctx = Arc::new(Context::new(
        Arc::new(KubeStore::new(client.clone())),
        watch_namespace.clone(),
    ));

    let webhooks = async {
        if args.webhooks {
            let state = WebhookState {
                controller: ControllerIdentity::new(args.service_account()),
            };
            info!(
                "Admission webhooks trust service account {}",
                state.controller.service_account()
            );
            webhook::serve(&args.webhook_bind_address, webhook::webhook_router(state)).await
        } else {
            warn!("Webhooks are disabled");
            std::future::pending().await
        }
    };

    tokio::select! {
        result = run_dkimkey_controller(client, watch_namespace, ctx) => {
            error!("CRITICAL: DKIMKey controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("DKIMKey controller exited unexpectedly without error")
        }
        result = webhook::serve(&args.metrics_bind_address, webhook::probe_router()) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        result = webhooks => {
            error!("CRITICAL: webhook server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("webhook server exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
            Ok(())
        }
    }
}

/// Run the `DKIMKey` controller
async fn run_dkimkey_controller(
    client: Client,
    watch_namespace: Option<String>,
    ctx: Arc<Context>,
) -> Result<()> {
    info!("Starting DKIMKey controller");

    let (dkim_keys, secrets, endpoints) = match &watch_namespace {
        Some(namespace) => (
            Api::<DKIMKey>::namespaced(client.clone(), namespace),
            Api::<Secret>::namespaced(client.clone(), namespace),
            Api::<DNSEndpoint>::namespaced(client, namespace),
        ),
        None => (
            Api::<DKIMKey>::all(client.clone()),
            Api::<Secret>::all(client.clone()),
            Api::<DNSEndpoint>::all(client),
        ),
    };
    let generated = Config::default().labels(&format!("{K8S_MANAGED_BY}={DKIM_MANAGER}"));

    Controller::new(dkim_keys, Config::default())
        .owns(secrets, generated.clone())
        .owns(endpoints, generated)
        .run(reconcile_dkimkey_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `DKIMKey`
async fn reconcile_dkimkey_wrapper(
    dkim_key: Arc<DKIMKey>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let namespace = dkim_key.namespace().unwrap_or_default();
    let name = dkim_key.name_any();
    let start = Instant::now();

    match reconcile_dkimkey(&ctx, &namespace, &name).await {
        Ok(outcome) => {
            metrics::record_reconciliation(outcome.as_str(), start.elapsed());
            debug!(
                namespace = %namespace,
                name = %name,
                outcome = outcome.as_str(),
                "Reconciled DKIMKey"
            );

            if let ReconcileOutcome::Failed(_) = outcome {
                Ok(Action::requeue(Duration::from_secs(FAILED_REQUEUE_SECS)))
            } else {
                Ok(Action::await_change())
            }
        }
        Err(e) => {
            metrics::record_reconciliation("error", start.elapsed());
            error!("Failed to reconcile DKIMKey {}/{}: {:#}", namespace, name, e);
            Err(e.into())
        }
    }
}

/// Error policy for controller
fn error_policy(_resource: Arc<DKIMKey>, _err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}
