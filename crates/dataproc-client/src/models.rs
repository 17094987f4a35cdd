//! Dataproc API models
//!
//! Request models follow the Dataproc v1 `Cluster` resource
//! (`projects.regions.clusters`). Responses are kept as opaque JSON so the
//! caller can hand them back verbatim; only `status.state` is interpreted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Base of Compute Engine resource URIs
pub const COMPUTE_BASE_URI: &str = "https://www.googleapis.com/compute/v1/projects";

/// Prefix applied to short OAuth scope names
pub const AUTH_SCOPE_PREFIX: &str = "https://www.googleapis.com/auth/";

/// Build a Compute Engine resource URI below a project
///
/// `compute_resource_uri("p", &["zones", "us-central1-a"])` yields
/// `https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a`.
#[must_use]
pub fn compute_resource_uri(project: &str, segments: &[&str]) -> String {
    let mut uri = format!("{}/{}", COMPUTE_BASE_URI, project);
    for segment in segments {
        uri.push('/');
        uri.push_str(segment);
    }
    uri
}

/// Expand a short scope name (`bigquery`) into a full OAuth scope URI.
/// Scopes that are already URIs pass through unchanged.
#[must_use]
pub fn expand_scope(scope: &str) -> String {
    if scope.starts_with("https://") {
        scope.to_string()
    } else {
        format!("{}{}", AUTH_SCOPE_PREFIX, scope)
    }
}

/// Cluster create request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    pub cluster_name: String,
    pub project_id: String,
    pub config: ClusterConfig,
}

/// `Cluster.config`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_bucket: Option<String>,
    pub gce_cluster_config: GceClusterConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_config: Option<SoftwareConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialization_actions: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_worker_config: Option<serde_json::Value>,
}

/// `Cluster.config.gceClusterConfig`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceClusterConfig {
    pub zone_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// `Cluster.config.softwareConfig`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareConfig {
    pub image_version: String,
}

/// Builder for [`ClusterRequest`]
///
/// Every optional setter ignores `None` and empty values, so the built
/// request only carries the fields that were actually populated.
#[derive(Debug, Clone)]
pub struct ClusterRequestBuilder {
    project: String,
    request: ClusterRequest,
}

impl ClusterRequestBuilder {
    /// Start a request for `name` in `project`, placed in `zone`
    #[must_use]
    pub fn new(name: impl Into<String>, project: impl Into<String>, zone: &str) -> Self {
        let project = project.into();
        let zone_uri = compute_resource_uri(&project, &["zones", zone]);
        Self {
            request: ClusterRequest {
                cluster_name: name.into(),
                project_id: project.clone(),
                config: ClusterConfig {
                    gce_cluster_config: GceClusterConfig {
                        zone_uri,
                        ..Default::default()
                    },
                    ..Default::default()
                },
            },
            project,
        }
    }

    /// Dataproc image version (`softwareConfig.imageVersion`)
    #[must_use]
    pub fn image_version(mut self, version: Option<&str>) -> Self {
        if let Some(version) = non_empty(version) {
            self.request.config.software_config = Some(SoftwareConfig {
                image_version: version.to_string(),
            });
        }
        self
    }

    /// Staging bucket (`configBucket`)
    #[must_use]
    pub fn config_bucket(mut self, bucket: Option<&str>) -> Self {
        if let Some(bucket) = non_empty(bucket) {
            self.request.config.config_bucket = Some(bucket.to_string());
        }
        self
    }

    /// VPC network by name (`networkUri`)
    #[must_use]
    pub fn network(mut self, network: Option<&str>) -> Self {
        if let Some(network) = non_empty(network) {
            self.request.config.gce_cluster_config.network_uri = Some(compute_resource_uri(
                &self.project,
                &["global", "networks", network],
            ));
        }
        self
    }

    /// Regional subnetwork by name (`subnetworkUri`)
    #[must_use]
    pub fn subnetwork(mut self, region: &str, subnetwork: Option<&str>) -> Self {
        if let Some(subnetwork) = non_empty(subnetwork) {
            self.request.config.gce_cluster_config.subnetwork_uri = Some(compute_resource_uri(
                &self.project,
                &["regions", region, "subnetworks", subnetwork],
            ));
        }
        self
    }

    /// Network tags
    #[must_use]
    pub fn tags(mut self, tags: &[String]) -> Self {
        let tags: Vec<String> = tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(ToString::to_string)
            .collect();
        if !tags.is_empty() {
            self.request.config.gce_cluster_config.tags = Some(tags);
        }
        self
    }

    /// Service-account scopes; short names are expanded to full URIs
    #[must_use]
    pub fn service_account_scopes(mut self, scopes: &[String]) -> Self {
        let scopes: Vec<String> = scopes
            .iter()
            .filter(|scope| !scope.is_empty())
            .map(|scope| expand_scope(scope))
            .collect();
        if !scopes.is_empty() {
            self.request.config.gce_cluster_config.service_account_scopes = Some(scopes);
        }
        self
    }

    /// Instance metadata
    #[must_use]
    pub fn metadata(mut self, metadata: &BTreeMap<String, String>) -> Self {
        if !metadata.is_empty() {
            self.request.config.gce_cluster_config.metadata = Some(metadata.clone());
        }
        self
    }

    /// Initialization actions, passed through verbatim
    #[must_use]
    pub fn initialization_actions(mut self, actions: &[serde_json::Value]) -> Self {
        if !actions.is_empty() {
            self.request.config.initialization_actions = Some(actions.to_vec());
        }
        self
    }

    /// Master instance group config, passed through verbatim
    #[must_use]
    pub fn master_config(mut self, config: Option<&serde_json::Value>) -> Self {
        self.request.config.master_config = populated(config);
        self
    }

    /// Primary worker instance group config, passed through verbatim
    #[must_use]
    pub fn worker_config(mut self, config: Option<&serde_json::Value>) -> Self {
        self.request.config.worker_config = populated(config);
        self
    }

    /// Secondary (preemptible) worker instance group config, passed through verbatim
    #[must_use]
    pub fn secondary_worker_config(mut self, config: Option<&serde_json::Value>) -> Self {
        self.request.config.secondary_worker_config = populated(config);
        self
    }

    #[must_use]
    pub fn build(self) -> ClusterRequest {
        self.request
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn populated(value: Option<&serde_json::Value>) -> Option<serde_json::Value> {
    match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Object(map)) if map.is_empty() => None,
        Some(value) => Some(value.clone()),
    }
}

/// Lifecycle state reported in `Cluster.status.state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    Creating,
    Running,
    Error,
    ErrorDueToUpdate,
    Deleting,
    Updating,
    Stopping,
    Stopped,
    Starting,
    Repairing,
    #[serde(other)]
    Unknown,
}

impl ClusterState {
    /// Read `status.state` out of a cluster body.
    /// Returns `None` when the body has no status (e.g. an operation).
    #[must_use]
    pub fn from_resource(resource: &serde_json::Value) -> Option<Self> {
        resource
            .get("status")
            .and_then(|status| status.get("state"))
            .and_then(|state| serde_json::from_value(state.clone()).ok())
    }

    /// Wire name of the state
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClusterState::Creating => "CREATING",
            ClusterState::Running => "RUNNING",
            ClusterState::Error => "ERROR",
            ClusterState::ErrorDueToUpdate => "ERROR_DUE_TO_UPDATE",
            ClusterState::Deleting => "DELETING",
            ClusterState::Updating => "UPDATING",
            ClusterState::Stopping => "STOPPING",
            ClusterState::Stopped => "STOPPED",
            ClusterState::Starting => "STARTING",
            ClusterState::Repairing => "REPAIRING",
            ClusterState::Unknown => "UNKNOWN",
        }
    }

    /// States from which the cluster will not reach `RUNNING` on its own
    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, ClusterState::Error | ClusterState::ErrorDueToUpdate)
    }
}
