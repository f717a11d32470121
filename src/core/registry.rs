/// Tracked service definitions
///
/// The registry is built once at startup, either from the built-in stack
/// below or from the `[[services]]` tables of a config file, and is then
/// handed by reference to the collector and the dashboard. It never changes
/// while the monitor runs.

use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use thiserror::Error;

/// Service categories for grouping in the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    #[serde(alias = "infrastructure")]
    Infra,
    #[serde(alias = "micro", alias = "application")]
    App,
}

impl ServiceCategory {
    pub fn title(&self) -> &'static str {
        match self {
            ServiceCategory::Infra => "Infrastructure",
            ServiceCategory::App => "Application Services",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ServiceCategory::Infra => "🏗️",
            ServiceCategory::App => "🚀",
        }
    }
}

/// Service definition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Service {
    pub name: String,
    /// Substring matched against the runtime's container names
    #[serde(rename = "container")]
    pub container_id: String,
    #[serde(deserialize_with = "port_as_string")]
    pub port: String,
    pub category: ServiceCategory,
}

impl Service {
    pub fn new(name: &str, container_id: &str, port: &str, category: ServiceCategory) -> Self {
        Self {
            name: name.to_string(),
            container_id: container_id.to_string(),
            port: port.to_string(),
            category,
        }
    }
}

// Ports may be written as `port = 8082` or `port = "8082"`
fn port_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        Text(String),
    }

    Ok(match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => port.to_string(),
        PortValue::Text(port) => port,
    })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no services configured")]
    Empty,

    #[error("service #{index} has an empty `{field}`")]
    EmptyField { index: usize, field: &'static str },

    #[error("container `{0}` is tracked by more than one service")]
    DuplicateContainer(String),
}

/// Ordered, validated list of tracked services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    services: Vec<Service>,
}

impl Registry {
    pub fn new(services: Vec<Service>) -> Result<Self, RegistryError> {
        if services.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, service) in services.iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(RegistryError::EmptyField { index, field: "name" });
            }
            if service.container_id.trim().is_empty() {
                return Err(RegistryError::EmptyField { index, field: "container" });
            }
            if !seen.insert(service.container_id.as_str()) {
                return Err(RegistryError::DuplicateContainer(service.container_id.clone()));
            }
        }

        Ok(Self { services })
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Services of one category, in registry order
    pub fn in_category(&self, category: ServiceCategory) -> impl Iterator<Item = &Service> {
        self.services.iter().filter(move |s| s.category == category)
    }
}

impl Default for Registry {
    /// The local Kotlin microservices stack
    fn default() -> Self {
        use ServiceCategory::{App, Infra};

        Self {
            services: vec![
                Service::new("MongoDB", "ms-kotlin-mongodb", "27018", Infra),
                Service::new("MySQL", "ms-kotlin-mysql", "3307", Infra),
                Service::new("Zookeeper", "ms-kotlin-zookeeper", "2181", Infra),
                Service::new("Kafka", "ms-kotlin-kafka", "9092", Infra),
                Service::new("Kafka-UI", "ms-kotlin-kafka-ui", "8090", Infra),
                Service::new("Vault", "ms-kotlin-vault", "8200", Infra),
                Service::new("Config", "ms-kotlin-configuration-server", "8888", App),
                Service::new("Discovery", "ms-kotlin-discover-server", "8761", App),
                Service::new("Products", "ms-kotlin-product-service", "8082", App),
                Service::new("Orders", "ms-kotlin-order-service", "8083", App),
            ],
        }
    }
}
