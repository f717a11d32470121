/// Docker integration
///
/// `ContainerRuntime` is the narrow capability the monitor needs from a
/// container runtime: one listing of every container (stopped included) and
/// a health lookup for a single container. `DockerRuntime` implements it on
/// top of the Docker Engine API.

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::models::{ContainerSummary, HealthStatusEnum};
use bollard::Docker;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to connect to Docker daemon: {0}")]
    Connect(#[source] bollard::errors::Error),

    #[error("Docker daemon is not responding: {0}")]
    Ping(#[source] bollard::errors::Error),

    #[error("failed to list containers: {0}")]
    List(#[source] bollard::errors::Error),

    #[error("failed to inspect container {id}: {source}")]
    Inspect {
        id: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("{operation} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

/// Container as reported by the runtime listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContainer {
    pub id: String,
    /// Docker reports names with a leading slash, e.g. `/ms-kotlin-kafka`
    pub names: Vec<String>,
    /// Coarse state: running, restarting, paused, exited, ...
    pub state: String,
}

impl RuntimeContainer {
    pub fn new(id: &str, names: &[&str], state: &str) -> Self {
        Self {
            id: id.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            state: state.to_string(),
        }
    }
}

impl From<ContainerSummary> for RuntimeContainer {
    fn from(summary: ContainerSummary) -> Self {
        Self {
            id: summary.id.unwrap_or_default(),
            names: summary.names.unwrap_or_default(),
            state: summary.state.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List all containers, including stopped ones
    async fn list_containers(&self) -> Result<Vec<RuntimeContainer>, RuntimeError>;

    /// Health status literal of a container, or `None` when it has no healthcheck
    async fn inspect_health(&self, id: &str) -> Result<Option<String>, RuntimeError>;
}

#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using the local defaults (`DOCKER_HOST` or the platform socket)
    /// and make sure the daemon actually answers.
    pub async fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults().map_err(RuntimeError::Connect)?;
        docker.ping().await.map_err(RuntimeError::Ping)?;

        if let Ok(version) = docker.version().await {
            debug!(
                version = version.version.as_deref().unwrap_or("unknown"),
                api_version = version.api_version.as_deref().unwrap_or("unknown"),
                "connected to Docker daemon"
            );
        }

        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<RuntimeContainer>, RuntimeError> {
        let options = Some(ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        });

        let containers = self
            .docker
            .list_containers(options)
            .await
            .map_err(RuntimeError::List)?;

        Ok(containers.into_iter().map(RuntimeContainer::from).collect())
    }

    async fn inspect_health(&self, id: &str) -> Result<Option<String>, RuntimeError> {
        let inspect = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|source| RuntimeError::Inspect {
                id: id.to_string(),
                source,
            })?;

        let status = inspect
            .state
            .and_then(|state| state.health)
            .and_then(|health| health.status);

        Ok(status.and_then(health_literal))
    }
}

fn health_literal(status: HealthStatusEnum) -> Option<String> {
    match status {
        HealthStatusEnum::HEALTHY => Some("healthy".to_string()),
        HealthStatusEnum::STARTING => Some("starting".to_string()),
        HealthStatusEnum::UNHEALTHY => Some("unhealthy".to_string()),
        // No healthcheck configured
        HealthStatusEnum::EMPTY | HealthStatusEnum::NONE => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_from_summary() {
        let summary = ContainerSummary {
            id: Some("abc123".to_string()),
            names: Some(vec!["/ms-kotlin-kafka".to_string()]),
            state: Some("running".to_string()),
            ..Default::default()
        };

        let container = RuntimeContainer::from(summary);
        assert_eq!(container, RuntimeContainer::new("abc123", &["/ms-kotlin-kafka"], "running"));
    }

    #[test]
    fn test_container_from_sparse_summary() {
        let container = RuntimeContainer::from(ContainerSummary::default());
        assert!(container.id.is_empty());
        assert!(container.names.is_empty());
        assert_eq!(container.state, "unknown");
    }

    #[test]
    fn test_health_literal() {
        assert_eq!(health_literal(HealthStatusEnum::HEALTHY).as_deref(), Some("healthy"));
        assert_eq!(health_literal(HealthStatusEnum::STARTING).as_deref(), Some("starting"));
        assert_eq!(health_literal(HealthStatusEnum::UNHEALTHY).as_deref(), Some("unhealthy"));
        assert_eq!(health_literal(HealthStatusEnum::NONE), None);
        assert_eq!(health_literal(HealthStatusEnum::EMPTY), None);
    }

    #[test]
    fn test_timeout_message() {
        let err = RuntimeError::Timeout {
            operation: "inspect",
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "inspect timed out after 250ms");
    }

    #[tokio::test]
    async fn test_docker_runtime_listing() {
        // This test requires Docker to be running
        if let Ok(runtime) = DockerRuntime::connect().await {
            assert!(runtime.list_containers().await.is_ok());
        }
    }
}
