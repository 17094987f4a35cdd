//! Desired cluster definition
//!
//! `ClusterSpec` is the typed form of the module arguments. Argument parsing
//! runs [`ClusterSpec::validate`] before handing one out, so the zone/region
//! and network/subnetwork invariants hold before any API call.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ControllerError;

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_ZONE: &str = "us-central1-a";
/// Dataproc region the API calls are addressed to
pub const DEFAULT_API_REGION: &str = "global";

/// Desired state of the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

impl FromStr for DesiredState {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" | "active" => Ok(DesiredState::Present),
            "absent" | "deleted" => Ok(DesiredState::Absent),
            other => Err(ControllerError::InvalidArgs(format!(
                "value of state must be one of: present, active, absent, deleted, got: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Present => write!(f, "present"),
            DesiredState::Absent => write!(f, "absent"),
        }
    }
}

/// Cluster definition as requested by the caller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterSpec {
    pub name: String,
    pub project: String,
    pub region: String,
    pub zone: String,
    pub api_region: String,
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    pub tags: Vec<String>,
    pub image_version: Option<String>,
    pub bucket: Option<String>,
    pub service_account_scopes: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub init_actions: Vec<serde_json::Value>,
    pub master_config: Option<serde_json::Value>,
    pub worker_config: Option<serde_json::Value>,
    pub second_worker_config: Option<serde_json::Value>,
}

impl ClusterSpec {
    /// Check the invariants every API call relies on.
    pub fn validate(self) -> Result<Self, ControllerError> {
        if self.name.trim().is_empty() {
            return Err(ControllerError::InvalidArgs("name must not be empty".to_string()));
        }
        if self.project.trim().is_empty() {
            return Err(ControllerError::InvalidConfig("project must not be empty".to_string()));
        }
        if self.network.is_some() && self.subnetwork.is_some() {
            return Err(ControllerError::InvalidArgs(
                "parameters are mutually exclusive: network|subnetwork".to_string(),
            ));
        }
        if !self.zone.starts_with(&self.region) {
            return Err(ControllerError::InvalidArgs(format!(
                "Region {} must contain zone {}",
                self.region, self.zone
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ClusterSpec {
        ClusterSpec {
            name: "demo".to_string(),
            project: "proj".to_string(),
            region: DEFAULT_REGION.to_string(),
            zone: DEFAULT_ZONE.to_string(),
            api_region: DEFAULT_API_REGION.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_desired_state_aliases() {
        assert_eq!("present".parse::<DesiredState>().unwrap(), DesiredState::Present);
        assert_eq!("active".parse::<DesiredState>().unwrap(), DesiredState::Present);
        assert_eq!("absent".parse::<DesiredState>().unwrap(), DesiredState::Absent);
        assert_eq!("deleted".parse::<DesiredState>().unwrap(), DesiredState::Absent);
        assert!("running".parse::<DesiredState>().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(spec().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zone_outside_region() {
        let mut bad = spec();
        bad.zone = "europe-west1-b".to_string();
        let err = bad.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments: Region us-central1 must contain zone europe-west1-b"
        );
    }

    #[test]
    fn test_validate_rejects_network_and_subnetwork() {
        let mut bad = spec();
        bad.network = Some("default".to_string());
        bad.subnetwork = Some("data".to_string());
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut bad = spec();
        bad.name = "  ".to_string();
        assert!(bad.validate().is_err());
    }
}
