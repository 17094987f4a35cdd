//! Dataproc API client
//!
//! Implements the cluster operations of the Dataproc v1 REST API.
//! Resource layout: /v1/projects/{project}/regions/{region}/clusters/{clusterName}

use crate::auth::{CLOUD_PLATFORM_SCOPE, ServiceAccountKey};
use crate::common::HttpClient;
use crate::dataproc_trait::DataprocClientTrait;
use crate::error::DataprocError;
use crate::models::ClusterRequest;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Dataproc API client
pub struct DataprocClient {
    http: HttpClient,
    project: String,
}

impl DataprocClient {
    /// Public Dataproc endpoint
    pub const DEFAULT_ENDPOINT: &'static str = "https://dataproc.googleapis.com";

    /// Authenticate with a service-account key and create a client
    ///
    /// # Arguments
    /// * `endpoint` - API base URL, `None` for the public endpoint
    /// * `project` - Project ID all requests are scoped to
    /// * `key` - Service-account key used to obtain the access token
    pub async fn connect(
        endpoint: Option<String>,
        project: String,
        key: &ServiceAccountKey,
    ) -> Result<Self, DataprocError> {
        let client = Self::http_client()?;
        let token = key.fetch_access_token(&client, CLOUD_PLATFORM_SCOPE).await?;
        info!("Authenticated to Google Cloud as {}", key.client_email);
        Self::from_parts(client, endpoint, project, token.access_token)
    }

    /// Create a client from an already obtained access token
    pub fn with_token(
        endpoint: Option<String>,
        project: String,
        token: String,
    ) -> Result<Self, DataprocError> {
        Self::from_parts(Self::http_client()?, endpoint, project, token)
    }

    fn http_client() -> Result<Client, DataprocError> {
        Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataprocError::Http)
    }

    fn from_parts(
        client: Client,
        endpoint: Option<String>,
        project: String,
        token: String,
    ) -> Result<Self, DataprocError> {
        if project.trim().is_empty() {
            return Err(DataprocError::InvalidRequest("project ID is empty".to_string()));
        }
        let base_url = endpoint.unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_string());
        Ok(Self {
            http: HttpClient::new(client, base_url, token),
            project,
        })
    }

    fn clusters_path(&self, region: &str) -> String {
        format!(
            "/v1/projects/{}/regions/{}/clusters",
            urlencoding::encode(&self.project),
            urlencoding::encode(region)
        )
    }

    fn cluster_path(&self, region: &str, name: &str) -> Result<String, DataprocError> {
        if name.is_empty() {
            return Err(DataprocError::InvalidRequest("cluster name is empty".to_string()));
        }
        Ok(format!(
            "{}/{}",
            self.clusters_path(region),
            urlencoding::encode(name)
        ))
    }
}

#[async_trait::async_trait]
impl DataprocClientTrait for DataprocClient {
    async fn get_cluster(&self, region: &str, name: &str) -> Result<serde_json::Value, DataprocError> {
        debug!("Fetching cluster {} in region {}", name, region);
        let path = self.cluster_path(region, name)?;
        self.http.get(&path).await
    }

    async fn create_cluster(&self, region: &str, request: &ClusterRequest) -> Result<serde_json::Value, DataprocError> {
        if request.cluster_name.is_empty() {
            return Err(DataprocError::InvalidRequest("cluster name is empty".to_string()));
        }
        debug!("Creating cluster {} in region {}", request.cluster_name, region);
        let body = serde_json::to_value(request)?;
        self.http.post(&self.clusters_path(region), &body).await
    }

    async fn delete_cluster(&self, region: &str, name: &str) -> Result<serde_json::Value, DataprocError> {
        debug!("Deleting cluster {} in region {}", name, region);
        let path = self.cluster_path(region, name)?;
        self.http.delete(&path).await
    }
}
