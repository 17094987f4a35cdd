//! Controller-specific error types.
//!
//! Errors raised by the gcdataproc module itself, on top of the Dataproc
//! client errors it propagates.

use std::time::Duration;

use dataproc_client::DataprocError;
use thiserror::Error;

/// Errors that can occur while converging a cluster.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Dataproc API error
    #[error("Dataproc error: {0}")]
    Dataproc(#[from] DataprocError),

    /// Invalid provider configuration (environment)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid module arguments
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Cluster did not reach RUNNING before the poll deadline
    #[error("Cluster {name} not RUNNING after {waited:?} (last state: {last_state})")]
    PollTimeout {
        name: String,
        waited: Duration,
        last_state: String,
    },

    /// Run interrupted by a shutdown signal; the message names the step
    #[error("Cancelled {0}")]
    Cancelled(String),

    /// Cluster entered a state it will not recover from
    #[error("Cluster {name} entered state {state}")]
    ClusterFailed { name: String, state: String },
}

/// A fatal outcome together with the `changed` flag computed so far.
#[derive(Debug)]
pub struct ReconcileFailure {
    pub changed: bool,
    pub error: ControllerError,
}

impl ReconcileFailure {
    /// Failure after a mutating call was already issued
    pub fn after_change(error: impl Into<ControllerError>) -> Self {
        Self {
            changed: true,
            error: error.into(),
        }
    }
}

// Failures raised before anything was changed
impl From<ControllerError> for ReconcileFailure {
    fn from(error: ControllerError) -> Self {
        Self {
            changed: false,
            error,
        }
    }
}

impl From<DataprocError> for ReconcileFailure {
    fn from(error: DataprocError) -> Self {
        ControllerError::from(error).into()
    }
}

impl std::fmt::Display for ReconcileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}
