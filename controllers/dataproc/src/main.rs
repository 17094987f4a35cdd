//! gcdataproc
//!
//! Automation module that converges a Google Cloud Dataproc cluster to a
//! desired state:
//! - `present`: create the cluster if it does not exist, optionally waiting
//!   until it is RUNNING
//! - `absent`: delete the cluster if it exists
//!
//! Module arguments are read as JSON from a file or stdin, and a single JSON
//! result document is written to stdout. Logs go to stderr.

mod args;
mod cluster;
mod config;
mod error;
mod output;
mod poller;
mod reconciler;
mod request_body;


use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dataproc_client::{DataprocClient, ServiceAccountKey};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::args::ModuleArgs;
use crate::config::{Cli, ProviderConfig};
use crate::error::{ControllerError, ReconcileFailure};
use crate::reconciler::{ReconcileResult, Reconciler};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    // Read before the handler is installed: a signal here still kills the process.
    let outcome = match read_args(cli.args_file.as_deref()) {
        Ok(raw) => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                on_signal.cancel();
            });
            run(&cli, &raw, cancel).await
        }
        Err(e) => Err(ControllerError::InvalidArgs(format!("{e:#}")).into()),
    };

    match outcome {
        Ok(result) => {
            output::emit(&output::success_document(&result));
            ExitCode::SUCCESS
        }
        Err(failure) => {
            output::emit(&output::failure_document(&failure));
            ExitCode::FAILURE
        }
    }
}

async fn run(
    cli: &Cli,
    raw: &str,
    cancel: CancellationToken,
) -> Result<ReconcileResult, ReconcileFailure> {
    let module_args = ModuleArgs::from_json(raw)?;
    let config = ProviderConfig::from_cli(cli)?;
    let request = module_args.into_request(&config.project)?;

    let key = ServiceAccountKey::from_file(&config.credentials_path)?;
    if key.client_email != config.email {
        warn!(
            "GCE_EMAIL {} differs from the key's client_email {}; authenticating as the latter",
            config.email, key.client_email
        );
    }

    info!("Connecting to Dataproc for project {}", config.project);
    let client = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(ControllerError::Cancelled("while authenticating to Google Cloud".to_string()).into());
        }
        connected = DataprocClient::connect(config.endpoint.clone(), config.project.clone(), &key) => connected?,
    };

    Reconciler::new(Box::new(client), cancel)
        .reconcile(&request.spec, request.state, request.sync, &request.poll)
        .await
}

fn read_args(args_file: Option<&Path>) -> anyhow::Result<String> {
    match args_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read module arguments from {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read module arguments from stdin")?;
            Ok(raw)
        }
    }
}

/// Initialize tracing subscriber, writing to stderr
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
