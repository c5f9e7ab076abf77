use serde_json::Value;
use vmdock_infra::types::PowerState;

use crate::config::Theme;
use crate::model::{GaugeLevel, HostMetric, ResourceSnapshot, VmKey};
use crate::poller::PollReport;

const FALLBACK_OK: &str = "#4CAF50";
const FALLBACK_WARN: &str = "#FFC107";
const FALLBACK_ERR: &str = "#F44336";

/// One card.
#[derive(Debug, Clone, PartialEq)]
pub struct VmItem {
    pub key: VmKey,
    pub name: String,
    pub uuid: String,
    pub power_state: PowerState,
    pub resources: ResourceSnapshot,
    /// Endpoint friendly name, or its host address.
    pub label: String,
    pub accent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub percent: f64,
    pub level: GaugeLevel,
    pub color: String,
}

/// One host metrics tile.
#[derive(Debug, Clone, PartialEq)]
pub struct HostItem {
    pub endpoint: String,
    pub label: String,
    pub accent: Option<String>,
    pub cpu: Gauge,
    pub memory: Gauge,
    pub disk_free: Gauge,
    pub vms_on: u32,
    pub vms_off: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    pub vms: Vec<VmItem>,
    pub hosts: Vec<HostItem>,
}

impl ViewModel {
    /// Flatten a poll report: endpoint order first, then the order each
    /// endpoint listed its VMs in.
    pub fn build(report: &PollReport, theme: &Theme) -> Self {
        let mut model = Self::default();

        for inventory in &report.endpoints {
            let label = inventory.endpoint.label().to_string();
            let accent = inventory.endpoint.accent().map(str::to_string);

            model.vms.extend(inventory.vms.iter().map(|vm| VmItem {
                key: vm.key.clone(),
                name: vm.name.clone(),
                uuid: vm.uuid.clone(),
                power_state: vm.power_state.clone(),
                resources: vm.resources,
                label: label.clone(),
                accent: accent.clone(),
            }));

            if let Some(host) = &inventory.host {
                model.hosts.push(host_item(host, label.clone(), accent.clone(), theme));
            }
        }

        model
    }

    pub fn find(&self, key: &VmKey) -> Option<&VmItem> {
        self.vms.iter().find(|vm| &vm.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.vms.is_empty() && self.hosts.is_empty()
    }
}

fn host_item(host: &HostMetric, label: String, accent: Option<String>, theme: &Theme) -> HostItem {
    let gauge = |percent: f64, level: GaugeLevel| Gauge {
        percent,
        level,
        color: gauge_color(theme, level),
    };
    HostItem {
        endpoint: host.endpoint.clone(),
        label,
        accent,
        cpu: gauge(host.cpu_pct, host.cpu_level()),
        memory: gauge(host.mem_pct, host.mem_level()),
        disk_free: gauge(host.disk_free_pct, host.disk_level()),
        vms_on: host.vms_on,
        vms_off: host.vms_off,
    }
}

/// Colour for a gauge level: the theme's `metrics_gauge_*` key, then its
/// `status_*` key, then a built-in colour.
pub fn gauge_color(theme: &Theme, level: GaugeLevel) -> String {
    let (specific, status, fallback) = match level {
        GaugeLevel::Ok => ("metrics_gauge_ok", "status_ok", FALLBACK_OK),
        GaugeLevel::Warn => ("metrics_gauge_warn", "status_warn", FALLBACK_WARN),
        GaugeLevel::Err => ("metrics_gauge_err", "status_err", FALLBACK_ERR),
    };
    [specific, status]
        .into_iter()
        .find_map(|key| theme.get(key).and_then(Value::as_str))
        .filter(|c| !c.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
