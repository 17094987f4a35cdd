//! Mock DataprocClient for unit testing
//!
//! This module provides a mock implementation of DataprocClientTrait that can be used
//! in unit tests without a Google Cloud project. Clusters live in memory, every call
//! is counted, and failures or state progressions can be scripted.

use crate::error::DataprocError;
use crate::models::ClusterRequest;
use crate::dataproc_trait::DataprocClientTrait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Calls observed by the mock
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    pub get: usize,
    pub create: usize,
    pub delete: usize,
    /// Every create request, in call order
    pub created: Vec<ClusterRequest>,
    /// Region of every call, in call order
    pub regions: Vec<String>,
}

/// Mock DataprocClient for testing
#[derive(Clone)]
pub struct MockDataprocClient {
    project: String,
    // (region, name) -> cluster body
    clusters: Arc<Mutex<HashMap<(String, String), serde_json::Value>>>,
    // States handed out by successive get calls on a created cluster
    state_script: Arc<Mutex<VecDeque<String>>>,
    get_failure: Arc<Mutex<Option<String>>>,
    create_failure: Arc<Mutex<Option<String>>>,
    delete_failure: Arc<Mutex<Option<String>>>,
    // Gets never complete while set
    stall_get: Arc<Mutex<bool>>,
    calls: Arc<Mutex<MockCalls>>,
    next_operation: Arc<Mutex<u64>>,
}

impl MockDataprocClient {
    /// Create a new mock client
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            clusters: Arc::new(Mutex::new(HashMap::new())),
            state_script: Arc::new(Mutex::new(VecDeque::new())),
            get_failure: Arc::new(Mutex::new(None)),
            create_failure: Arc::new(Mutex::new(None)),
            delete_failure: Arc::new(Mutex::new(None)),
            stall_get: Arc::new(Mutex::new(false)),
            calls: Arc::new(Mutex::new(MockCalls::default())),
            next_operation: Arc::new(Mutex::new(1)),
        }
    }

    /// Add an existing cluster in the given state (for test setup)
    pub fn add_cluster(&self, region: &str, name: &str, state: &str) {
        let body = json!({
            "projectId": self.project,
            "clusterName": name,
            "status": { "state": state },
        });
        self.clusters
            .lock()
            .unwrap()
            .insert((region.to_string(), name.to_string()), body);
    }

    /// States returned by successive gets after a create, e.g. `["CREATING", "RUNNING"]`.
    /// Once exhausted the last state sticks.
    pub fn script_states(&self, states: &[&str]) {
        let mut script = self.state_script.lock().unwrap();
        script.clear();
        script.extend(states.iter().map(|s| (*s).to_string()));
    }

    /// Make every get fail with an API error
    pub fn fail_get_with(&self, message: impl Into<String>) {
        *self.get_failure.lock().unwrap() = Some(message.into());
    }

    /// Make every create fail with an API error
    pub fn fail_create_with(&self, message: impl Into<String>) {
        *self.create_failure.lock().unwrap() = Some(message.into());
    }

    /// Make every delete fail with an API error
    pub fn fail_delete_with(&self, message: impl Into<String>) {
        *self.delete_failure.lock().unwrap() = Some(message.into());
    }

    /// Make every get hang forever, like a request stuck on the network
    pub fn stall_gets(&self) {
        *self.stall_get.lock().unwrap() = true;
    }

    /// Snapshot of the calls made so far
    pub fn calls(&self) -> MockCalls {
        self.calls.lock().unwrap().clone()
    }

    /// Whether a cluster is currently stored
    pub fn has_cluster(&self, region: &str, name: &str) -> bool {
        self.clusters
            .lock()
            .unwrap()
            .contains_key(&(region.to_string(), name.to_string()))
    }

    fn operation(&self, region: &str, name: &str, verb: &str) -> serde_json::Value {
        let mut id = self.next_operation.lock().unwrap();
        let current = *id;
        *id += 1;
        json!({
            "name": format!("projects/{}/regions/{}/operations/op-{}", self.project, region, current),
            "metadata": {
                "@type": "type.googleapis.com/google.cloud.dataproc.v1.ClusterOperationMetadata",
                "clusterName": name,
                "operationType": verb,
                "status": { "state": "PENDING" },
            },
        })
    }
}

#[async_trait::async_trait]
impl DataprocClientTrait for MockDataprocClient {
    async fn get_cluster(&self, region: &str, name: &str) -> Result<serde_json::Value, DataprocError> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.get += 1;
            calls.regions.push(region.to_string());
        }
        if let Some(message) = self.get_failure.lock().unwrap().clone() {
            return Err(DataprocError::Api(message));
        }
        let stalled = *self.stall_get.lock().unwrap();
        if stalled {
            std::future::pending::<()>().await;
        }

        let mut clusters = self.clusters.lock().unwrap();
        let cluster = clusters
            .get_mut(&(region.to_string(), name.to_string()))
            .ok_or_else(|| DataprocError::NotFound(format!("Cluster {} not found", name)))?;

        let mut script = self.state_script.lock().unwrap();
        let next = if script.len() > 1 { script.pop_front() } else { script.front().cloned() };
        if let Some(state) = next {
            cluster["status"] = json!({ "state": state });
        }
        Ok(cluster.clone())
    }

    async fn create_cluster(&self, region: &str, request: &ClusterRequest) -> Result<serde_json::Value, DataprocError> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.create += 1;
            calls.created.push(request.clone());
            calls.regions.push(region.to_string());
        }
        if let Some(message) = self.create_failure.lock().unwrap().clone() {
            return Err(DataprocError::Api(message));
        }

        let key = (region.to_string(), request.cluster_name.clone());
        let mut clusters = self.clusters.lock().unwrap();
        if clusters.contains_key(&key) {
            return Err(DataprocError::Api(format!(
                "409 Conflict - Already exists: cluster {}",
                request.cluster_name
            )));
        }
        let mut body = serde_json::to_value(request)?;
        body["status"] = json!({ "state": "CREATING" });
        clusters.insert(key, body);
        drop(clusters);

        Ok(self.operation(region, &request.cluster_name, "CREATE"))
    }

    async fn delete_cluster(&self, region: &str, name: &str) -> Result<serde_json::Value, DataprocError> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.delete += 1;
            calls.regions.push(region.to_string());
        }
        if let Some(message) = self.delete_failure.lock().unwrap().clone() {
            return Err(DataprocError::Api(message));
        }

        self.clusters
            .lock()
            .unwrap()
            .remove(&(region.to_string(), name.to_string()))
            .ok_or_else(|| DataprocError::NotFound(format!("Cluster {} not found", name)))?;

        Ok(self.operation(region, name, "DELETE"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClusterRequestBuilder;

    #[tokio::test]
    async fn test_get_missing_cluster_is_not_found() {
        let mock = MockDataprocClient::new("proj");
        let err = mock.get_cluster("global", "demo").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(mock.calls().get, 1);
    }

    #[tokio::test]
    async fn test_create_then_scripted_states() {
        let mock = MockDataprocClient::new("proj");
        mock.script_states(&["CREATING", "RUNNING"]);
        let request = ClusterRequestBuilder::new("demo", "proj", "us-central1-a").build();

        let op = mock.create_cluster("global", &request).await.unwrap();
        assert_eq!(op["metadata"]["operationType"], "CREATE");

        let first = mock.get_cluster("global", "demo").await.unwrap();
        assert_eq!(first["status"]["state"], "CREATING");
        let second = mock.get_cluster("global", "demo").await.unwrap();
        assert_eq!(second["status"]["state"], "RUNNING");
        let third = mock.get_cluster("global", "demo").await.unwrap();
        assert_eq!(third["status"]["state"], "RUNNING");
    }

    #[tokio::test]
    async fn test_delete_removes_cluster() {
        let mock = MockDataprocClient::new("proj");
        mock.add_cluster("global", "demo", "RUNNING");
        mock.delete_cluster("global", "demo").await.unwrap();
        assert!(!mock.has_cluster("global", "demo"));
        assert!(mock.delete_cluster("global", "demo").await.unwrap_err().is_not_found());
    }
}
