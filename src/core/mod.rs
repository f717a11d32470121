pub mod collector;
pub mod docker;
pub mod registry;
pub mod status;

pub use collector::{CollectorConfig, StatusCollector, StatusReport};
pub use docker::{ContainerRuntime, DockerRuntime, RuntimeContainer, RuntimeError};
pub use registry::{Registry, Service, ServiceCategory};
pub use status::{classify, ContainerStatus, DisplayCategory, Health};
