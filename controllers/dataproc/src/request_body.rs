//! Cluster create request construction

use dataproc_client::{ClusterRequest, ClusterRequestBuilder};

use crate::cluster::ClusterSpec;

/// Map a cluster spec onto the Dataproc create request.
///
/// Only populated fields end up in the body; unset or empty options are
/// omitted rather than sent as null.
pub fn build_request_body(spec: &ClusterSpec) -> ClusterRequest {
    ClusterRequestBuilder::new(&spec.name, &spec.project, &spec.zone)
        .image_version(spec.image_version.as_deref())
        .config_bucket(spec.bucket.as_deref())
        .network(spec.network.as_deref())
        .subnetwork(&spec.region, spec.subnetwork.as_deref())
        .tags(&spec.tags)
        .service_account_scopes(&spec.service_account_scopes)
        .metadata(&spec.metadata)
        .initialization_actions(&spec.init_actions)
        .master_config(spec.master_config.as_ref())
        .worker_config(spec.worker_config.as_ref())
        .secondary_worker_config(spec.second_worker_config.as_ref())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{DEFAULT_API_REGION, DEFAULT_REGION, DEFAULT_ZONE};
    use serde_json::json;

    fn demo_spec() -> ClusterSpec {
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
    fn test_minimal_spec_body() {
        let body = serde_json::to_value(build_request_body(&demo_spec())).unwrap();
        assert_eq!(
            body,
            json!({
                "clusterName": "demo",
                "projectId": "proj",
                "config": {
                    "gceClusterConfig": {
                        "zoneUri": "https://www.googleapis.com/compute/v1/projects/proj/zones/us-central1-a"
                    }
                }
            })
        );
    }

    #[test]
    fn test_full_spec_body() {
        let mut spec = demo_spec();
        spec.subnetwork = Some("analytics".to_string());
        spec.tags = vec!["hadoop".to_string(), "spark".to_string()];
        spec.image_version = Some("2.1-debian11".to_string());
        spec.bucket = Some("staging-bucket".to_string());
        spec.service_account_scopes = vec!["bigquery".to_string(), "devstorage.read_write".to_string()];
        spec.metadata.insert("enable-oslogin".to_string(), "true".to_string());
        spec.init_actions = vec![json!({"executableFile": "gs://bucket/init.sh"})];
        spec.master_config = Some(json!({"numInstances": 1, "machineTypeUri": "n1-standard-4"}));
        spec.worker_config = Some(json!({"numInstances": 2}));
        spec.second_worker_config = Some(json!({"numInstances": 4, "isPreemptible": true}));

        let body = serde_json::to_value(build_request_body(&spec)).unwrap();
        assert_eq!(
            body,
            json!({
                "clusterName": "demo",
                "projectId": "proj",
                "config": {
                    "configBucket": "staging-bucket",
                    "gceClusterConfig": {
                        "zoneUri": "https://www.googleapis.com/compute/v1/projects/proj/zones/us-central1-a",
                        "subnetworkUri": "https://www.googleapis.com/compute/v1/projects/proj/regions/us-central1/subnetworks/analytics",
                        "tags": ["hadoop", "spark"],
                        "serviceAccountScopes": [
                            "https://www.googleapis.com/auth/bigquery",
                            "https://www.googleapis.com/auth/devstorage.read_write"
                        ],
                        "metadata": {"enable-oslogin": "true"}
                    },
                    "softwareConfig": {"imageVersion": "2.1-debian11"},
                    "initializationActions": [{"executableFile": "gs://bucket/init.sh"}],
                    "masterConfig": {"numInstances": 1, "machineTypeUri": "n1-standard-4"},
                    "workerConfig": {"numInstances": 2},
                    "secondaryWorkerConfig": {"numInstances": 4, "isPreemptible": true}
                }
            })
        );
    }

    #[test]
    fn test_network_by_name() {
        let mut spec = demo_spec();
        spec.network = Some("default".to_string());
        let request = build_request_body(&spec);
        assert_eq!(
            request.config.gce_cluster_config.network_uri.as_deref(),
            Some("https://www.googleapis.com/compute/v1/projects/proj/global/networks/default")
        );
        assert!(request.config.gce_cluster_config.subnetwork_uri.is_none());
    }

    #[test]
    fn test_body_is_deterministic() {
        let mut spec = demo_spec();
        spec.metadata.insert("b".to_string(), "2".to_string());
        spec.metadata.insert("a".to_string(), "1".to_string());
        let first = serde_json::to_string(&build_request_body(&spec)).unwrap();
        let second = serde_json::to_string(&build_request_body(&spec)).unwrap();
        assert_eq!(first, second);
    }
}
