//! DataprocClient trait for mocking
//!
//! This trait abstracts the DataprocClient to enable mocking in unit tests.
//! The concrete DataprocClient implements this trait, and tests can use mock implementations.

use crate::error::DataprocError;
use crate::models::ClusterRequest;

/// Trait for Dataproc cluster operations
///
/// Cluster and operation bodies are returned as raw JSON. A missing cluster
/// is reported as `DataprocError::NotFound`.
#[async_trait::async_trait]
pub trait DataprocClientTrait: Send + Sync {
    /// `projects.regions.clusters.get`
    async fn get_cluster(&self, region: &str, name: &str) -> Result<serde_json::Value, DataprocError>;

    /// `projects.regions.clusters.create`; returns the long-running operation
    async fn create_cluster(&self, region: &str, request: &ClusterRequest) -> Result<serde_json::Value, DataprocError>;

    /// `projects.regions.clusters.delete`; returns the long-running operation
    async fn delete_cluster(&self, region: &str, name: &str) -> Result<serde_json::Value, DataprocError>;
}
