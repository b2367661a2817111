//! Component health for the traffic monitor service
//!
//! Each service component (ingestion, shared state, live push) reports its
//! own status. Liveness is the worst component status; readiness also
//! requires the service to have finished starting up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Service components that report health
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Sensor message parsing and application
    Ingest,
    State,
    /// Live update stream to dashboard clients
    Push,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Ingest, Component::State, Component::Push];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Ingest => "ingest",
            Component::State => "state",
            Component::Push => "push",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health status, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, but recent input was rejected or a client fell behind
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

/// Last reported health of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the component entered its current status
    pub since: DateTime<Utc>,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            since: Utc::now(),
        }
    }

    /// Move to a new status; `since` only changes when the status does
    fn transition(&mut self, status: ComponentStatus, message: Option<String>) {
        if self.status != status {
            self.status = status;
            self.since = Utc::now();
        }
        self.message = message;
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<Component, ComponentHealth>,
}

impl HealthResponse {
    fn from_components(components: BTreeMap<Component, ComponentHealth>) -> Self {
        let status = components
            .values()
            .map(|h| h.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy);
        Self { status, components }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    components: BTreeMap<Component, ComponentHealth>,
    started: bool,
}

/// Shared, cloneable registry of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component as healthy
    pub async fn register(&self, component: Component) {
        self.inner
            .write()
            .await
            .components
            .insert(component, ComponentHealth::new(ComponentStatus::Healthy, None));
    }

    /// Record a status for a component, registering it if needed
    pub async fn report(&self, component: Component, status: ComponentStatus, message: Option<String>) {
        let mut inner = self.inner.write().await;
        match inner.components.get_mut(&component) {
            Some(health) => health.transition(status, message),
            None => {
                inner
                    .components
                    .insert(component, ComponentHealth::new(status, message));
            }
        }
    }

    pub async fn set_healthy(&self, component: Component) {
        self.report(component, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_degraded(&self, component: Component, message: impl Into<String>) {
        self.report(component, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn set_unhealthy(&self, component: Component, message: impl Into<String>) {
        self.report(component, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    /// Mark startup complete (or shutdown begun)
    pub async fn set_ready(&self, ready: bool) {
        self.inner.write().await.started = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.inner.read().await.components.clone();
        HealthResponse::from_components(components)
    }

    /// Ready once started and no component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        let inner = self.inner.read().await;

        let reason = if !inner.started {
            Some("Service not yet initialized".to_string())
        } else {
            inner
                .components
                .iter()
                .find(|(_, h)| !h.status.is_operational())
                .map(|(component, _)| format!("Component {} unhealthy", component))
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }
}
