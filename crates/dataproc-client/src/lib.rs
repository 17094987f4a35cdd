//! Google Cloud Dataproc REST API Client
//!
//! A Rust client library for the subset of the Dataproc v1 REST API needed to
//! converge a single cluster: get, create and delete, keyed by
//! `(project, region, clusterName)`.
//!
//! # Example
//!
//! ```no_run
//! use dataproc_client::{
//!     ClusterRequestBuilder, DataprocClient, DataprocClientTrait, ServiceAccountKey,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Authenticate with a service-account key file
//! let key = ServiceAccountKey::from_file("/etc/gcp/sa.json")?;
//! let client = DataprocClient::connect(None, "my-project".to_string(), &key).await?;
//!
//! // Build a minimal cluster request
//! let request = ClusterRequestBuilder::new("demo", "my-project", "us-central1-a")
//!     .image_version(Some("2.1"))
//!     .build();
//!
//! // Create it in the global Dataproc region
//! let operation = client.create_cluster("global", &request).await?;
//! println!("{}", operation);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Service-account auth**: RS256 JWT assertion exchanged for an OAuth token
//! - **Typed requests**: builder that only serializes populated fields
//! - **Opaque responses**: cluster and operation bodies are returned as JSON
//! - **Mocking**: `MockDataprocClient` behind the `test-util` feature

pub mod auth;
pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod dataproc_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use auth::{AccessToken, CLOUD_PLATFORM_SCOPE, ServiceAccountKey};
pub use client::DataprocClient;
pub use common::HttpClient;
pub use dataproc_trait::DataprocClientTrait;
pub use error::DataprocError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::{MockCalls, MockDataprocClient};
