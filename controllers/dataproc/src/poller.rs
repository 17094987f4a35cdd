//! Status polling for synchronous creates
//!
//! Polls the cluster at a fixed interval until it reports `RUNNING`. The wait
//! is bounded by a deadline and can be interrupted through a
//! `CancellationToken`; reaching a failed state ends it early.

use std::time::Duration;

use dataproc_client::{ClusterState, DataprocClientTrait};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ControllerError;

/// Poll cadence and deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

fn describe(state: Option<ClusterState>) -> String {
    state.unwrap_or(ClusterState::Unknown).as_str().to_string()
}

/// Wait until the cluster reports `RUNNING` and return its body.
///
/// `initial` is checked first, so a body that is already running returns
/// without any API call.
pub async fn wait_for_running(
    client: &dyn DataprocClientTrait,
    region: &str,
    name: &str,
    initial: serde_json::Value,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<serde_json::Value, ControllerError> {
    let started = Instant::now();
    let deadline = started + settings.timeout;
    let mut resource = initial;

    loop {
        let state = ClusterState::from_resource(&resource);
        match state {
            Some(ClusterState::Running) => {
                info!("Cluster {} is RUNNING after {:?}", name, started.elapsed());
                return Ok(resource);
            }
            Some(s) if s.is_failed() => {
                return Err(ControllerError::ClusterFailed {
                    name: name.to_string(),
                    state: describe(state),
                });
            }
            _ => debug!("Cluster {} state: {}", name, describe(state)),
        }

        if Instant::now() >= deadline {
            return Err(ControllerError::PollTimeout {
                name: name.to_string(),
                waited: settings.timeout,
                last_state: describe(state),
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(name)),
            _ = tokio::time::sleep_until(deadline.min(Instant::now() + settings.interval)) => {}
        }

        resource = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(name)),
            polled = client.get_cluster(region, name) => polled?,
        };
    }
}

fn cancelled(name: &str) -> ControllerError {
    ControllerError::Cancelled(format!("while waiting for cluster {} to become RUNNING", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataproc_client::{ClusterRequestBuilder, MockDataprocClient};
    use serde_json::json;

    fn settings(interval_secs: u64, timeout_secs: u64) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn created_cluster(states: &[&str]) -> MockDataprocClient {
        let mock = MockDataprocClient::new("proj");
        mock.script_states(states);
        let request = ClusterRequestBuilder::new("demo", "proj", "us-central1-a").build();
        mock.create_cluster("global", &request).await.unwrap();
        mock
    }

    #[tokio::test]
    async fn test_running_initial_body_needs_no_poll() {
        let mock = MockDataprocClient::new("proj");
        let body = json!({"clusterName": "demo", "status": {"state": "RUNNING"}});
        let result = wait_for_running(
            &mock,
            "global",
            "demo",
            body.clone(),
            &settings(1, 10),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(result, body);
        assert_eq!(mock.calls().get, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_running() {
        let mock = created_cluster(&["CREATING", "CREATING", "RUNNING"]).await;
        let operation = json!({"name": "projects/proj/regions/global/operations/op-1"});

        let result = wait_for_running(
            &mock,
            "global",
            "demo",
            operation,
            &settings(5, 600),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result["status"]["state"], "RUNNING");
        assert_eq!(mock.calls().get, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_never_running() {
        let mock = created_cluster(&["CREATING"]).await;

        let err = wait_for_running(
            &mock,
            "global",
            "demo",
            json!({}),
            &settings(10, 60),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ControllerError::PollTimeout { ref last_state, .. } if last_state == "CREATING"));
        assert_eq!(mock.calls().get, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_state_fails_fast() {
        let mock = created_cluster(&["CREATING", "ERROR"]).await;

        let err = wait_for_running(
            &mock,
            "global",
            "demo",
            json!({}),
            &settings(1, 600),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ControllerError::ClusterFailed { ref state, .. } if state == "ERROR"));
        assert_eq!(mock.calls().get, 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let mock = created_cluster(&["CREATING"]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = wait_for_running(
            &mock,
            "global",
            "demo",
            json!({}),
            &settings(3600, 7200),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ControllerError::Cancelled(_)));
        assert_eq!(mock.calls().get, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_inflight_get() {
        let mock = created_cluster(&["CREATING"]).await;
        mock.stall_gets();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let err = wait_for_running(
            &mock,
            "global",
            "demo",
            json!({}),
            &settings(1, 600),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ControllerError::Cancelled(_)));
        assert_eq!(mock.calls().get, 1);
    }

    #[tokio::test]
    async fn test_get_error_is_propagated() {
        let mock = created_cluster(&["CREATING"]).await;
        mock.fail_get_with("503 Service Unavailable");

        let err = wait_for_running(
            &mock,
            "global",
            "demo",
            json!({}),
            &settings(0, 60),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("503 Service Unavailable"));
    }
}
