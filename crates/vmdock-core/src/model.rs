use std::fmt;

use serde::{Deserialize, Serialize};
use vmdock_infra::types::{Credentials, PowerState, RawHostStats, RawVm, VmId};

// ── Endpoints ───────────────────────────────────────────────────────

/// A configured hypervisor management endpoint. `host` is the join key for
/// everything polled from it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Endpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: String::new(),
            password: String::new(),
            thumbprint: None,
            name: None,
            color: None,
        }
    }

    /// Friendly name, falling back to the host address.
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.host,
        }
    }

    pub fn accent(&self) -> Option<&str> {
        self.color.as_deref().filter(|c| !c.is_empty())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            thumbprint: self.thumbprint.clone(),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("name", &self.name)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

// ── VMs ─────────────────────────────────────────────────────────────

/// Identifies a VM for actions: ids are only unique per endpoint, so the
/// endpoint host is always part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VmKey {
    pub endpoint: String,
    pub id: VmId,
}

impl VmKey {
    pub fn new(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            id: VmId(id.into()),
        }
    }

    /// False for VMs the endpoint reported without a managed-object id;
    /// they are shown but cannot be acted on.
    pub fn has_id(&self) -> bool {
        !self.id.0.trim().is_empty()
    }
}

impl fmt::Display for VmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSnapshot {
    pub cpu_mhz: u32,
    pub memory_mb: u32,
    /// Committed disk, GiB rounded to two decimals.
    pub disk_gb: f64,
}

/// One VM as observed from one endpoint in one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct VmRecord {
    pub key: VmKey,
    pub name: String,
    /// Hardware uuid; empty when the endpoint did not report one.
    pub uuid: String,
    pub power_state: PowerState,
    pub resources: ResourceSnapshot,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("vm record is missing `{0}`")]
    MissingField(&'static str),
}

impl VmRecord {
    /// Validate a raw record. Name and power state are required. A missing id
    /// leaves the key's id empty; resource figures default to zero.
    pub fn from_raw(endpoint: &str, raw: RawVm) -> Result<Self, RecordError> {
        let id = non_empty(raw.id).unwrap_or_default();
        let name = non_empty(raw.name).ok_or(RecordError::MissingField("name"))?;
        let power_state = raw
            .power_state
            .as_deref()
            .map(PowerState::parse)
            .ok_or(RecordError::MissingField("power_state"))?;

        let disk_gb = raw
            .disk_committed_bytes
            .filter(|b| *b > 0)
            .map(|b| round2(b as f64 / (1024.0 * 1024.0 * 1024.0)))
            .unwrap_or(0.0);

        Ok(Self {
            key: VmKey::new(endpoint, id),
            name,
            uuid: raw.uuid.unwrap_or_default(),
            power_state,
            resources: ResourceSnapshot {
                cpu_mhz: to_u32(raw.cpu_mhz),
                memory_mb: to_u32(raw.memory_mb),
                disk_gb,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn to_u32(value: Option<i64>) -> u32 {
    value
        .and_then(|v| u32::try_from(v.max(0)).ok())
        .unwrap_or(0)
}

// ── Host metrics ────────────────────────────────────────────────────

/// Threshold band for a host gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaugeLevel {
    Ok,
    Warn,
    Err,
}

impl GaugeLevel {
    /// For usage gauges: err at 90% and above, warn at 80%.
    pub fn for_usage(percent: f64) -> Self {
        if percent >= 90.0 {
            Self::Err
        } else if percent >= 80.0 {
            Self::Warn
        } else {
            Self::Ok
        }
    }

    /// For free-space gauges: err at 10% free and below, warn at 20%.
    pub fn for_free(percent: f64) -> Self {
        if percent <= 10.0 {
            Self::Err
        } else if percent <= 20.0 {
            Self::Warn
        } else {
            Self::Ok
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostMetric {
    pub endpoint: String,
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub disk_free_pct: f64,
    pub vms_on: u32,
    pub vms_off: u32,
}

impl HostMetric {
    pub fn from_raw(endpoint: &str, raw: &RawHostStats) -> Self {
        let cpu_capacity = match (raw.cpu_mhz_per_core, raw.cpu_cores) {
            (Some(mhz), Some(cores)) => mhz as f64 * cores as f64,
            _ => 0.0,
        };
        let cpu_pct = percent(raw.cpu_used_mhz.map(|v| v as f64), cpu_capacity);

        let mem_capacity_mb = raw
            .memory_bytes
            .map(|b| b as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);
        let mem_pct = percent(raw.memory_used_mb.map(|v| v as f64), mem_capacity_mb);

        let (capacity, free) = raw
            .datastores
            .iter()
            .fold((0i64, 0i64), |(c, f), ds| {
                (c.saturating_add(ds.capacity_bytes), f.saturating_add(ds.free_bytes))
            });
        let disk_free_pct = percent(Some(free as f64), capacity as f64);

        Self {
            endpoint: endpoint.to_string(),
            cpu_pct,
            mem_pct,
            disk_free_pct,
            vms_on: raw.vms_on,
            vms_off: raw.vms_off,
        }
    }

    pub fn cpu_level(&self) -> GaugeLevel {
        GaugeLevel::for_usage(self.cpu_pct)
    }

    pub fn mem_level(&self) -> GaugeLevel {
        GaugeLevel::for_usage(self.mem_pct)
    }

    pub fn disk_level(&self) -> GaugeLevel {
        GaugeLevel::for_free(self.disk_free_pct)
    }
}

/// `used / capacity` as a percentage clamped to [0, 100] and rounded to two
/// decimals. Unknown usage or a zero/unknown capacity yields 0.
pub fn percent(used: Option<f64>, capacity: f64) -> f64 {
    let Some(used) = used else {
        return 0.0;
    };
    if !(capacity > 0.0) || !used.is_finite() {
        return 0.0;
    }
    round2((used / capacity * 100.0).clamp(0.0, 100.0))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmdock_infra::types::DatastoreUsage;

    fn raw_vm(id: &str, name: &str, state: &str) -> RawVm {
        RawVm {
            id: Some(id.into()),
            name: Some(name.into()),
            power_state: Some(state.into()),
            ..Default::default()
        }
    }

    #[test]
    fn record_requires_name_but_not_id() {
        let mut raw = raw_vm("vm-1", "web", "poweredOn");
        raw.id = None;
        let record = VmRecord::from_raw("esx01", raw).unwrap();
        assert!(!record.key.has_id());
        assert_eq!(record.name, "web");

        let raw = raw_vm("vm-1", "  ", "poweredOn");
        assert_eq!(
            VmRecord::from_raw("esx01", raw),
            Err(RecordError::MissingField("name"))
        );
    }

    #[test]
    fn record_defaults_missing_resources() {
        let mut raw = raw_vm("vm-1", "web", "poweredOff");
        raw.cpu_mhz = Some(-5);
        raw.disk_committed_bytes = Some(3 * 1024 * 1024 * 1024 / 2);
        let record = VmRecord::from_raw("esx01", raw).unwrap();
        assert_eq!(record.key, VmKey::new("esx01", "vm-1"));
        assert_eq!(record.uuid, "");
        assert_eq!(record.power_state, PowerState::PoweredOff);
        assert_eq!(record.resources.cpu_mhz, 0);
        assert_eq!(record.resources.memory_mb, 0);
        assert_eq!(record.resources.disk_gb, 1.5);
    }

    #[test]
    fn same_id_on_two_endpoints_is_two_keys() {
        let a = VmRecord::from_raw("esx-a", raw_vm("vm-9", "db", "poweredOn")).unwrap();
        let b = VmRecord::from_raw("esx-b", raw_vm("vm-9", "db", "poweredOn")).unwrap();
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn cpu_at_95_percent_is_err() {
        let raw = RawHostStats {
            cpu_mhz_per_core: Some(250),
            cpu_cores: Some(4),
            cpu_used_mhz: Some(950),
            ..Default::default()
        };
        let metric = HostMetric::from_raw("esx01", &raw);
        assert_eq!(metric.cpu_pct, 95.0);
        assert_eq!(metric.cpu_level(), GaugeLevel::Err);
    }

    #[test]
    fn five_percent_disk_free_is_err() {
        let raw = RawHostStats {
            datastores: vec![
                DatastoreUsage {
                    capacity_bytes: 600,
                    free_bytes: 20,
                },
                DatastoreUsage {
                    capacity_bytes: 400,
                    free_bytes: 30,
                },
            ],
            ..Default::default()
        };
        let metric = HostMetric::from_raw("esx01", &raw);
        assert_eq!(metric.disk_free_pct, 5.0);
        assert_eq!(metric.disk_level(), GaugeLevel::Err);
    }

    #[test]
    fn unknown_capacity_yields_zero_and_usage_is_clamped() {
        let raw = RawHostStats {
            cpu_used_mhz: Some(1200),
            memory_bytes: Some(1024 * 1024 * 1024),
            memory_used_mb: Some(4096),
            ..Default::default()
        };
        let metric = HostMetric::from_raw("esx01", &raw);
        assert_eq!(metric.cpu_pct, 0.0);
        assert_eq!(metric.mem_pct, 100.0);
        assert_eq!(metric.disk_free_pct, 0.0);
    }

    #[test]
    fn gauge_bands() {
        assert_eq!(GaugeLevel::for_usage(79.99), GaugeLevel::Ok);
        assert_eq!(GaugeLevel::for_usage(80.0), GaugeLevel::Warn);
        assert_eq!(GaugeLevel::for_usage(90.0), GaugeLevel::Err);
        assert_eq!(GaugeLevel::for_free(20.0), GaugeLevel::Warn);
        assert_eq!(GaugeLevel::for_free(10.0), GaugeLevel::Err);
        assert_eq!(GaugeLevel::for_free(20.01), GaugeLevel::Ok);
    }

    #[test]
    fn label_falls_back_to_host() {
        let mut ep = Endpoint::new("10.0.0.5");
        assert_eq!(ep.label(), "10.0.0.5");
        ep.name = Some(String::new());
        assert_eq!(ep.label(), "10.0.0.5");
        ep.name = Some("Lab".into());
        assert_eq!(ep.label(), "Lab");
        ep.color = Some(String::new());
        assert_eq!(ep.accent(), None);
    }
}
