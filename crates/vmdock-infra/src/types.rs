use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque endpoint-side VM identifier (a managed object id such as `vm-42`).
///
/// Only unique within one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VmId(pub String);

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a connector needs to open a session against one endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
    pub thumbprint: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("thumbprint", &self.thumbprint)
            .finish_non_exhaustive()
    }
}

/// Endpoint-reported VM power state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    /// Suspended or anything the endpoint invents later. Keeps the raw string.
    Other(String),
}

impl PowerState {
    /// Case-insensitive parse of the endpoint's power-state string.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("poweredon") {
            Self::PoweredOn
        } else if raw.eq_ignore_ascii_case("poweredoff") {
            Self::PoweredOff
        } else {
            Self::Other(raw.to_string())
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::PoweredOn)
    }
}

/// One VM as enumerated from an endpoint, before validation.
///
/// Every field is optional: the poller decides which absences are fatal for
/// the record and which map to defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVm {
    pub id: Option<String>,
    pub name: Option<String>,
    pub uuid: Option<String>,
    pub power_state: Option<String>,
    pub cpu_mhz: Option<i64>,
    pub memory_mb: Option<i64>,
    pub disk_committed_bytes: Option<i64>,
}

/// Capacity and usage figures for one endpoint's host, before percentages
/// are derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHostStats {
    pub cpu_mhz_per_core: Option<i64>,
    pub cpu_cores: Option<i64>,
    pub cpu_used_mhz: Option<i64>,
    pub memory_bytes: Option<i64>,
    pub memory_used_mb: Option<i64>,
    pub datastores: Vec<DatastoreUsage>,
    pub vms_on: u32,
    pub vms_off: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatastoreUsage {
    pub capacity_bytes: i64,
    pub free_bytes: i64,
}
