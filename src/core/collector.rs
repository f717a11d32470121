/// Status collection
///
/// Each poll lists the runtime's containers once and resolves every tracked
/// service against that snapshot concurrently: one future per service, each
/// reporting its single result into its own slot. The fan-in is bounded by a
/// deadline so a hung runtime call degrades the frame instead of freezing the
/// dashboard.

use futures::stream::{FuturesUnordered, StreamExt};
use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use crate::core::docker::{ContainerRuntime, RuntimeContainer, RuntimeError};
use crate::core::registry::{Registry, Service};
use crate::core::status::{ContainerStatus, Health};

/// Lower bound for the per-cycle fan-in budget
const MIN_JOIN_BUDGET: Duration = Duration::from_millis(250);

/// Stand-in deadline for budgets too large to add to an `Instant`
const MAX_DEADLINE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Timeouts applied to runtime calls during one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    pub list_timeout: Duration,
    pub inspect_timeout: Duration,
    /// Budget for all per-service lookups of a cycle to report
    pub join_timeout: Duration,
}

impl CollectorConfig {
    pub fn for_interval(interval: Duration, list_timeout: Duration, inspect_timeout: Duration) -> Self {
        Self {
            list_timeout,
            inspect_timeout,
            join_timeout: join_budget(interval),
        }
    }
}

/// 80% of the refresh interval, never below `MIN_JOIN_BUDGET`
pub fn join_budget(interval: Duration) -> Duration {
    interval.mul_f64(0.8).max(MIN_JOIN_BUDGET)
}

/// Outcome of one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Exactly one entry per registered service, keyed by container id
    pub statuses: HashMap<String, ContainerStatus>,
    /// Set when the container listing itself failed for this cycle
    pub runtime_error: Option<String>,
    /// Services whose identifier matched more than one container
    pub ambiguous: Vec<String>,
    /// Services that did not report before the cycle deadline
    pub timed_out: Vec<String>,
}

impl StatusReport {
    /// Every service at its default status, flagged with the listing error
    fn unreachable(registry: &Registry, err: &RuntimeError) -> Self {
        Self {
            statuses: registry
                .services()
                .iter()
                .map(|s| (s.container_id.clone(), ContainerStatus::not_found(&s.container_id)))
                .collect(),
            runtime_error: Some(err.to_string()),
            ..Default::default()
        }
    }

    pub fn status_of(&self, container_id: &str) -> Cow<'_, ContainerStatus> {
        match self.statuses.get(container_id) {
            Some(status) => Cow::Borrowed(status),
            None => Cow::Owned(ContainerStatus::not_found(container_id)),
        }
    }
}

/// First container (in listing order) with a name containing `container_id`,
/// plus the total number of matching containers.
pub fn find_container<'a>(
    live: &'a [RuntimeContainer],
    container_id: &str,
) -> (Option<&'a RuntimeContainer>, usize) {
    let mut matching = live
        .iter()
        .filter(|c| c.names.iter().any(|name| name.contains(container_id)));

    let first = matching.next();
    let count = first.map_or(0, |_| 1 + matching.count());
    (first, count)
}

struct Lookup {
    status: ContainerStatus,
    matches: usize,
}

#[derive(Debug, Clone)]
pub struct StatusCollector {
    config: CollectorConfig,
}

impl StatusCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// List containers once and resolve every service against that snapshot.
    ///
    /// A failed or timed-out listing never escapes: every service keeps its
    /// default status and the error is carried in `runtime_error`.
    pub async fn poll<R>(&self, runtime: &R, registry: &Registry) -> StatusReport
    where
        R: ContainerRuntime + ?Sized,
    {
        let listed = match timeout(self.config.list_timeout, runtime.list_containers()).await {
            Ok(result) => result,
            Err(_) => Err(RuntimeError::Timeout {
                operation: "container listing",
                timeout: self.config.list_timeout,
            }),
        };

        match listed {
            Ok(live) => self.collect(runtime, registry, &live).await,
            Err(err) => {
                debug!(error = %err, "container listing failed");
                StatusReport::unreachable(registry, &err)
            }
        }
    }

    /// Resolve every service of `registry` against the `live` snapshot
    pub async fn collect<R>(
        &self,
        runtime: &R,
        registry: &Registry,
        live: &[RuntimeContainer],
    ) -> StatusReport
    where
        R: ContainerRuntime + ?Sized,
    {
        let now = Instant::now();
        // Far-future deadline when the budget does not fit in an Instant
        let deadline = now
            .checked_add(self.config.join_timeout)
            .unwrap_or_else(|| now + MAX_DEADLINE);
        let services = registry.services();
        let mut slots: Vec<Option<Lookup>> = services.iter().map(|_| None).collect();

        let mut pending: FuturesUnordered<_> = services
            .iter()
            .enumerate()
            .map(|(index, service)| async move { (index, self.resolve(runtime, service, live).await) })
            .collect();

        loop {
            let next = timeout_at(deadline, pending.next()).await;
            match next {
                Ok(Some((index, lookup))) => slots[index] = Some(lookup),
                Ok(None) => break,
                Err(_) => {
                    debug!(
                        unresolved = pending.len(),
                        budget_ms = self.config.join_timeout.as_millis() as u64,
                        "status lookups missed the cycle deadline"
                    );
                    break;
                }
            }
        }
        // Dropping the set cancels lookups that are still waiting on the runtime
        drop(pending);

        let mut report = StatusReport::default();
        for (service, slot) in services.iter().zip(slots) {
            let status = match slot {
                Some(lookup) => {
                    if lookup.matches > 1 {
                        report.ambiguous.push(service.container_id.clone());
                    }
                    lookup.status
                }
                None => {
                    report.timed_out.push(service.container_id.clone());
                    ContainerStatus::not_found(&service.container_id)
                }
            };
            report.statuses.insert(service.container_id.clone(), status);
        }

        report
    }

    async fn resolve<R>(&self, runtime: &R, service: &Service, live: &[RuntimeContainer]) -> Lookup
    where
        R: ContainerRuntime + ?Sized,
    {
        let (matched, matches) = find_container(live, &service.container_id);
        let Some(container) = matched else {
            return Lookup {
                status: ContainerStatus::not_found(&service.container_id),
                matches,
            };
        };

        if matches > 1 {
            warn!(
                service = %service.name,
                container = %service.container_id,
                matches,
                "identifier matches several containers, using the first listed"
            );
        }

        let mut status = ContainerStatus::observed(&service.container_id, &container.state);
        if status.is_running {
            status.health = self.inspect(runtime, container).await;
        }

        Lookup { status, matches }
    }

    async fn inspect<R>(&self, runtime: &R, container: &RuntimeContainer) -> Health
    where
        R: ContainerRuntime + ?Sized,
    {
        match timeout(self.config.inspect_timeout, runtime.inspect_health(&container.id)).await {
            Ok(Ok(Some(health))) => Health::from(health.as_str()),
            Ok(Ok(None)) => Health::NoHealthcheck,
            Ok(Err(err)) => {
                debug!(container = %container.id, error = %err, "health inspection failed");
                Health::NoHealthcheck
            }
            Err(_) => {
                debug!(container = %container.id, "health inspection timed out");
                Health::NoHealthcheck
            }
        }
    }
}
