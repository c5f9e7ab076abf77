use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use vmdock_infra::types::{RawHostStats, RawVm};
use vmdock_infra::{Error as InfraError, HypervisorConnector};

use crate::model::{Endpoint, HostMetric, VmRecord};

pub const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(20);
/// Logout gets its own budget so it still runs after the endpoint's deadline.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything one endpoint contributed to a cycle.
#[derive(Debug, Clone)]
pub struct EndpointInventory {
    pub endpoint: Endpoint,
    pub vms: Vec<VmRecord>,
    pub host: Option<HostMetric>,
}

/// Result of one poll cycle, in endpoint order.
///
/// VM listing and host metrics fail independently: `failed` names endpoints
/// whose VM list was lost this cycle, `metrics_failed` those whose host
/// metrics were. An endpoint that could not be connected to (or cleanly
/// disconnected from) is in both and contributes nothing.
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub endpoints: Vec<EndpointInventory>,
    pub failed: Vec<String>,
    pub metrics_failed: Vec<String>,
}

impl PollReport {
    pub fn vm_count(&self) -> usize {
        self.endpoints.iter().map(|e| e.vms.len()).sum()
    }
}

/// What one session yielded; each half may have failed on its own.
struct Collected {
    vms: Result<Vec<RawVm>, InfraError>,
    stats: Result<Option<RawHostStats>, InfraError>,
}

/// Polls every configured endpoint once per cycle, one after the other, each
/// with a fresh session.
pub struct Poller {
    connector: Arc<dyn HypervisorConnector>,
    endpoint_timeout: Duration,
}

impl Poller {
    pub fn new(connector: Arc<dyn HypervisorConnector>) -> Self {
        Self {
            connector,
            endpoint_timeout: DEFAULT_ENDPOINT_TIMEOUT,
        }
    }

    pub fn with_endpoint_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint_timeout = timeout;
        self
    }

    pub async fn poll(&self, endpoints: &[Endpoint], show_running_only: bool) -> PollReport {
        let mut report = PollReport::default();

        for endpoint in endpoints {
            let host = &endpoint.host;
            let collected = match self.collect(endpoint).await {
                Ok(collected) => collected,
                Err(e) => {
                    tracing::warn!(endpoint = %host, error = %e, "inventory: endpoint skipped this cycle");
                    report.failed.push(host.clone());
                    report.metrics_failed.push(host.clone());
                    continue;
                }
            };

            let vms = match collected.vms {
                Ok(raw) => records(host, raw, show_running_only),
                Err(e) => {
                    tracing::warn!(endpoint = %host, error = %e, "inventory: vm list unavailable this cycle");
                    report.failed.push(host.clone());
                    Vec::new()
                }
            };
            let stats = match collected.stats {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::warn!(endpoint = %host, error = %e, "inventory: host metrics unavailable this cycle");
                    report.metrics_failed.push(host.clone());
                    None
                }
            };

            tracing::info!(
                endpoint = %host,
                vms = vms.len(),
                host_metrics = stats.is_some(),
                "inventory: endpoint polled"
            );
            report.endpoints.push(EndpointInventory {
                endpoint: endpoint.clone(),
                vms,
                host: stats.map(|s| HostMetric::from_raw(host, &s)),
            });
        }

        report
    }

    /// One session: connect, list VMs, read host stats, disconnect. The first
    /// three share the endpoint deadline; once a session exists, disconnect
    /// always runs under its own timeout.
    async fn collect(&self, endpoint: &Endpoint) -> Result<Collected, InfraError> {
        let host = &endpoint.host;
        let deadline = Instant::now() + self.endpoint_timeout;

        let mut session = tokio::time::timeout_at(deadline, self.connector.connect(&endpoint.credentials()))
            .await
            .map_err(|_| timed_out(host, self.endpoint_timeout))??;

        let vms = tokio::time::timeout_at(deadline, session.list_vms())
            .await
            .unwrap_or_else(|_| Err(timed_out(host, self.endpoint_timeout)));
        let stats = tokio::time::timeout_at(deadline, session.host_stats())
            .await
            .unwrap_or_else(|_| Err(timed_out(host, self.endpoint_timeout)));

        tokio::time::timeout(DISCONNECT_TIMEOUT, session.disconnect())
            .await
            .unwrap_or_else(|_| Err(timed_out(host, DISCONNECT_TIMEOUT)))?;

        Ok(Collected { vms, stats })
    }
}

fn timed_out(host: &str, after: Duration) -> InfraError {
    InfraError::Timeout {
        host: host.to_string(),
        after,
    }
}

fn records(host: &str, raw: Vec<RawVm>, show_running_only: bool) -> Vec<VmRecord> {
    raw.into_iter()
        .filter(|vm| !show_running_only || is_running(vm))
        .filter_map(|vm| match VmRecord::from_raw(host, vm) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(endpoint = %host, error = %e, "inventory: skipping vm");
                None
            }
        })
        .collect()
}

fn is_running(vm: &RawVm) -> bool {
    vm.power_state
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("poweredon"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, FakeHost, endpoint, vm};
    use vmdock_infra::types::RawHostStats;

    fn poller(connector: &FakeConnector) -> Poller {
        Poller::new(Arc::new(connector.clone()))
    }

    #[tokio::test]
    async fn failing_endpoint_does_not_affect_others() {
        let connector = FakeConnector::with([
            (
                "a",
                FakeHost::with_vms(vec![vm("vm-1", "web", "poweredOn"), vm("vm-2", "db", "poweredOn")]),
            ),
            ("b", FakeHost::failing()),
        ]);

        let report = poller(&connector)
            .poll(&[endpoint("a"), endpoint("b")], false)
            .await;

        assert_eq!(report.vm_count(), 2);
        assert_eq!(report.endpoints.len(), 1);
        assert_eq!(report.endpoints[0].endpoint.host, "a");
        assert_eq!(report.failed, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn failure_order_does_not_matter() {
        let connector = FakeConnector::with([
            ("a", FakeHost::failing()),
            ("b", FakeHost::with_vms(vec![vm("vm-7", "x", "poweredOff")])),
            (
                "c",
                FakeHost {
                    fail_list: true,
                    ..Default::default()
                },
            ),
        ]);

        let report = poller(&connector)
            .poll(&[endpoint("a"), endpoint("b"), endpoint("c")], false)
            .await;

        assert_eq!(report.vm_count(), 1);
        assert_eq!(report.failed, vec!["a".to_string(), "c".to_string()]);
        // c's session was still closed.
        assert!(connector
            .calls()
            .contains(&("c".to_string(), "disconnect", String::new())));
    }

    #[tokio::test]
    async fn running_only_filter_ignores_case_and_drops_other_states() {
        let connector = FakeConnector::with([(
            "a",
            FakeHost::with_vms(vec![
                vm("vm-1", "on", "poweredOn"),
                vm("vm-2", "shouty", "POWEREDON"),
                vm("vm-3", "off", "poweredOff"),
                vm("vm-4", "paused", "suspended"),
            ]),
        )]);
        let poller = poller(&connector);

        let running = poller.poll(&[endpoint("a")], true).await;
        let names: Vec<_> = running.endpoints[0].vms.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["on", "shouty"]);

        let all = poller.poll(&[endpoint("a")], false).await;
        assert_eq!(all.vm_count(), 4);
    }

    #[tokio::test]
    async fn malformed_vm_is_skipped() {
        let mut broken = vm("vm-2", "", "poweredOn");
        broken.name = None;
        let connector = FakeConnector::with([(
            "a",
            FakeHost::with_vms(vec![vm("vm-1", "ok", "poweredOn"), broken, vm("vm-3", "ok2", "poweredOn")]),
        )]);

        let report = poller(&connector).poll(&[endpoint("a")], false).await;
        let ids: Vec<_> = report.endpoints[0].vms.iter().map(|v| v.key.id.0.as_str()).collect();
        assert_eq!(ids, ["vm-1", "vm-3"]);
    }

    #[tokio::test]
    async fn host_stats_failure_keeps_vms() {
        let connector = FakeConnector::with([(
            "a",
            FakeHost {
                vms: vec![vm("vm-1", "web", "poweredOn")],
                fail_stats: true,
                ..Default::default()
            },
        )]);

        let report = poller(&connector).poll(&[endpoint("a")], false).await;
        assert_eq!(report.vm_count(), 1);
        assert!(report.endpoints[0].host.is_none());
        assert!(report.failed.is_empty());
        assert_eq!(report.metrics_failed, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn vm_list_failure_still_reports_host_metrics() {
        let connector = FakeConnector::with([(
            "a",
            FakeHost {
                fail_list: true,
                stats: Some(RawHostStats {
                    vms_on: 2,
                    vms_off: 5,
                    ..Default::default()
                }),
                ..Default::default()
            },
        )]);

        let report = poller(&connector).poll(&[endpoint("a")], false).await;
        assert_eq!(report.vm_count(), 0);
        assert_eq!(report.failed, vec!["a".to_string()]);
        assert!(report.metrics_failed.is_empty());
        let host = report.endpoints[0].host.as_ref().unwrap();
        assert_eq!((host.vms_on, host.vms_off), (2, 5));
    }

    #[tokio::test]
    async fn failed_disconnect_discards_the_endpoint() {
        let connector = FakeConnector::with([
            (
                "a",
                FakeHost {
                    vms: vec![vm("vm-1", "web", "poweredOn")],
                    fail_disconnect: true,
                    ..Default::default()
                },
            ),
            ("b", FakeHost::with_vms(vec![vm("vm-2", "db", "poweredOn")])),
        ]);

        let report = poller(&connector)
            .poll(&[endpoint("a"), endpoint("b")], false)
            .await;
        assert_eq!(report.failed, vec!["a".to_string()]);
        assert_eq!(report.metrics_failed, vec!["a".to_string()]);
        assert_eq!(report.endpoints.len(), 1);
        assert_eq!(report.endpoints[0].endpoint.host, "b");
        assert_eq!(report.vm_count(), 1);
    }

    #[tokio::test]
    async fn host_metrics_are_derived() {
        let connector = FakeConnector::with([(
            "a",
            FakeHost {
                stats: Some(RawHostStats {
                    cpu_mhz_per_core: Some(1000),
                    cpu_cores: Some(1),
                    cpu_used_mhz: Some(950),
                    vms_on: 3,
                    vms_off: 1,
                    ..Default::default()
                }),
                ..Default::default()
            },
        )]);

        let report = poller(&connector).poll(&[endpoint("a")], true).await;
        let host = report.endpoints[0].host.as_ref().unwrap();
        assert_eq!(host.cpu_pct, 95.0);
        assert_eq!((host.vms_on, host.vms_off), (3, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_endpoint_times_out() {
        let connector = FakeConnector::with([
            (
                "slow",
                FakeHost {
                    vms: vec![vm("vm-1", "web", "poweredOn")],
                    stall: Some(Duration::from_secs(60)),
                    ..Default::default()
                },
            ),
            ("fast", FakeHost::with_vms(vec![vm("vm-2", "db", "poweredOn")])),
        ]);

        let report = poller(&connector)
            .with_endpoint_timeout(Duration::from_secs(5))
            .poll(&[endpoint("slow"), endpoint("fast")], false)
            .await;

        assert_eq!(report.failed, vec!["slow".to_string()]);
        assert_eq!(report.vm_count(), 1);
        // The timed-out session is still logged out.
        assert_eq!(connector.count("connect"), 2);
        assert_eq!(connector.count("disconnect"), 2);
    }

    #[tokio::test]
    async fn no_endpoints_is_an_empty_report() {
        let report = poller(&FakeConnector::default()).poll(&[], false).await;
        assert_eq!(report.vm_count(), 0);
        assert!(report.failed.is_empty());
    }
}
