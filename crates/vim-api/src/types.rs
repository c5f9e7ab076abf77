use serde::{Deserialize, Serialize};

// ── References ──────────────────────────────────────────────────────

fn moref_type_name() -> String {
    "ManagedObjectReference".into()
}

/// Pointer to a managed object on the server (`vm-42`, `ha-host`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectReference {
    #[serde(rename = "_typeName", default = "moref_type_name")]
    pub type_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ManagedObjectReference {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_name: moref_type_name(),
            kind: kind.into(),
            value: value.into(),
        }
    }
}

// ── Service content ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContent {
    pub root_folder: ManagedObjectReference,
    #[serde(default)]
    pub session_manager: Option<ManagedObjectReference>,
    #[serde(default)]
    pub view_manager: Option<ManagedObjectReference>,
    #[serde(default)]
    pub about: Option<AboutInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutInfo {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateContainerViewRequest<'a> {
    pub container: &'a ManagedObjectReference,
    #[serde(rename = "type")]
    pub kinds: Vec<String>,
    pub recursive: bool,
}

// ── Virtual machines ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSummary {
    #[serde(default)]
    pub vm: Option<ManagedObjectReference>,
    #[serde(default)]
    pub runtime: Option<VirtualMachineRuntimeInfo>,
    #[serde(default)]
    pub config: Option<VirtualMachineConfigSummary>,
    #[serde(default)]
    pub quick_stats: Option<VirtualMachineQuickStats>,
    #[serde(default)]
    pub storage: Option<VirtualMachineStorageSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineRuntimeInfo {
    /// `poweredOn`, `poweredOff` or `suspended`.
    #[serde(default)]
    pub power_state: Option<String>,
    #[serde(default)]
    pub host: Option<ManagedObjectReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineConfigSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineQuickStats {
    /// MHz.
    #[serde(default)]
    pub overall_cpu_usage: Option<i64>,
    /// MB.
    #[serde(default)]
    pub guest_memory_usage: Option<i64>,
    /// MB.
    #[serde(default)]
    pub host_memory_usage: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineStorageSummary {
    /// Bytes.
    #[serde(default)]
    pub committed: Option<i64>,
}

// ── Hosts ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostListSummary {
    #[serde(default)]
    pub host: Option<ManagedObjectReference>,
    #[serde(default)]
    pub hardware: Option<HostHardwareSummary>,
    #[serde(default)]
    pub quick_stats: Option<HostListSummaryQuickStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostHardwareSummary {
    #[serde(default)]
    pub cpu_mhz: Option<i64>,
    #[serde(default)]
    pub num_cpu_cores: Option<i64>,
    /// Bytes.
    #[serde(default)]
    pub memory_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostListSummaryQuickStats {
    /// MHz.
    #[serde(default)]
    pub overall_cpu_usage: Option<i64>,
    /// MB.
    #[serde(default)]
    pub overall_memory_usage: Option<i64>,
}

// ── Datastores ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastoreSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub free_space: Option<i64>,
}
