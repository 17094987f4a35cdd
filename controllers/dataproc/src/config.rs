//! Command line and provider configuration
//!
//! Credentials come from the environment (or the equivalent flags); the
//! module arguments come from a JSON file or stdin.

use std::path::PathBuf;

use clap::Parser;

use crate::error::ControllerError;

const MISSING_AUTH: &str = "Please define Google auth environment variables GCE_EMAIL, GCE_PROJECT and GCE_CREDENTIALS_FILE_PATH";

/// Converge a Google Cloud Dataproc cluster to a desired state
#[derive(Debug, Parser)]
#[command(name = "gcdataproc", version, about)]
pub struct Cli {
    /// File holding the module arguments as JSON; read from stdin when omitted
    pub args_file: Option<PathBuf>,

    /// Service account email
    #[arg(long, env = "GCE_EMAIL")]
    pub gce_email: Option<String>,

    /// Google Cloud project that owns the cluster
    #[arg(long, env = "GCE_PROJECT")]
    pub gce_project: Option<String>,

    /// Path to the service account JSON key
    #[arg(long, env = "GCE_CREDENTIALS_FILE_PATH")]
    pub gce_credentials_file_path: Option<String>,

    /// Override the Dataproc API endpoint
    #[arg(long, env = "DATAPROC_ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Google Cloud provider settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub email: String,
    pub project: String,
    pub credentials_path: PathBuf,
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    /// All three auth settings are required and must be non-blank.
    pub fn new(
        email: Option<String>,
        project: Option<String>,
        credentials_path: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, ControllerError> {
        let required = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ControllerError::InvalidConfig(MISSING_AUTH.to_string()))
        };

        Ok(Self {
            email: required(email)?,
            project: required(project)?,
            credentials_path: PathBuf::from(required(credentials_path)?),
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
        })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ControllerError> {
        Self::new(
            cli.gce_email.clone(),
            cli.gce_project.clone(),
            cli.gce_credentials_file_path.clone(),
            cli.endpoint.clone(),
        )
    }
}
