//! Reconciliation logic for a Dataproc cluster.
//!
//! One existence check, then at most one mutating call:
//! - `present`: create the cluster when the check reports NotFound, then
//!   optionally wait for it to become `RUNNING`
//! - `absent`: delete the cluster when the check finds it
//!
//! NotFound is a control-flow signal on both paths. Any other error ends the
//! run with the `changed` flag computed so far.
//!
//! A cancelled token interrupts the existence check and the status poll, and
//! stops the run before a create or delete is sent. A mutating call that is
//! already in flight runs to completion.

use dataproc_client::{DataprocClientTrait, DataprocError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cluster::{ClusterSpec, DesiredState};
use crate::error::{ControllerError, ReconcileFailure};
use crate::poller::{PollSettings, wait_for_running};
use crate::request_body::build_request_body;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileResult {
    pub changed: bool,
    /// Body returned by the last API call that ran
    pub resource: serde_json::Value,
}

/// Converges one cluster to its desired state.
pub struct Reconciler {
    dataproc_client: Box<dyn DataprocClientTrait>,
    cancel: CancellationToken,
}

impl Reconciler {
    pub fn new(dataproc_client: Box<dyn DataprocClientTrait>, cancel: CancellationToken) -> Self {
        Self {
            dataproc_client,
            cancel,
        }
    }

    /// Converge the cluster described by `spec` to `desired`.
    ///
    /// With `sync`, a freshly created cluster is polled per `poll` until it
    /// reports `RUNNING`.
    pub async fn reconcile(
        &self,
        spec: &ClusterSpec,
        desired: DesiredState,
        sync: bool,
        poll: &PollSettings,
    ) -> Result<ReconcileResult, ReconcileFailure> {
        info!(
            "Reconciling cluster {} (project {}, region {}) to {}",
            spec.name, spec.project, spec.api_region, desired
        );
        let result = match desired {
            DesiredState::Present => self.ensure_present(spec, sync, poll).await,
            DesiredState::Absent => self.ensure_absent(spec).await,
        };
        if let Err(failure) = &result {
            error!(
                "Reconciliation of cluster {} failed (changed: {}): {}",
                spec.name, failure.changed, failure.error
            );
        }
        result
    }

    async fn ensure_present(
        &self,
        spec: &ClusterSpec,
        sync: bool,
        poll: &PollSettings,
    ) -> Result<ReconcileResult, ReconcileFailure> {
        match self.existing_cluster(spec).await? {
            Ok(existing) => {
                info!("Cluster {} already exists, nothing to create", spec.name);
                return Ok(ReconcileResult {
                    changed: false,
                    resource: existing,
                });
            }
            Err(DataprocError::NotFound(_)) => {
                info!("Cluster {} not found, creating", spec.name);
            }
            Err(e) => return Err(e.into()),
        }

        self.ensure_not_cancelled(&format!("before creating cluster {}", spec.name))?;
        let request = build_request_body(spec);
        let operation = self
            .dataproc_client
            .create_cluster(&spec.api_region, &request)
            .await?;
        info!(
            "Create requested for cluster {} (operation {})",
            spec.name,
            operation.get("name").and_then(|n| n.as_str()).unwrap_or("unknown")
        );

        if !sync {
            return Ok(ReconcileResult {
                changed: true,
                resource: operation,
            });
        }

        let resource = wait_for_running(
            self.dataproc_client.as_ref(),
            &spec.api_region,
            &spec.name,
            operation,
            poll,
            &self.cancel,
        )
        .await
        .map_err(ReconcileFailure::after_change)?;

        Ok(ReconcileResult {
            changed: true,
            resource,
        })
    }

    async fn ensure_absent(&self, spec: &ClusterSpec) -> Result<ReconcileResult, ReconcileFailure> {
        match self.existing_cluster(spec).await? {
            Ok(_) => {
                info!("Cluster {} exists, deleting", spec.name);
            }
            Err(DataprocError::NotFound(_)) => {
                info!("Cluster {} already absent", spec.name);
                return Ok(ReconcileResult {
                    changed: false,
                    resource: serde_json::json!({}),
                });
            }
            Err(e) => return Err(e.into()),
        }

        self.ensure_not_cancelled(&format!("before deleting cluster {}", spec.name))?;
        let operation = self
            .dataproc_client
            .delete_cluster(&spec.api_region, &spec.name)
            .await?;
        info!("Delete requested for cluster {}", spec.name);

        Ok(ReconcileResult {
            changed: true,
            resource: operation,
        })
    }

    /// Existence check, abandoned as soon as the token is cancelled
    async fn existing_cluster(
        &self,
        spec: &ClusterSpec,
    ) -> Result<Result<serde_json::Value, DataprocError>, ControllerError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ControllerError::Cancelled(format!(
                "while checking whether cluster {} exists",
                spec.name
            ))),
            found = self.dataproc_client.get_cluster(&spec.api_region, &spec.name) => Ok(found),
        }
    }

    fn ensure_not_cancelled(&self, step: &str) -> Result<(), ControllerError> {
        if self.cancel.is_cancelled() {
            return Err(ControllerError::Cancelled(step.to_string()));
        }
        Ok(())
    }
}
