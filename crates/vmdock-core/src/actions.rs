//! VM actions: power, guest lifecycle and console launch.
//!
//! Every action is addressed by `(endpoint, id)` and goes through
//! [`ActionDispatcher::dispatch`], which opens a session with the endpoint's
//! stored credentials, runs the operation and closes the session again.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vmdock_infra::console;
use vmdock_infra::{Error as InfraError, HypervisorConnector};

use crate::config::ConfigStore;
use crate::model::{Endpoint, VmKey};
use crate::poller::DEFAULT_ENDPOINT_TIMEOUT;

pub const NO_CREDENTIALS: &str = "No credentials for host.";
pub const NO_MOID: &str = "VM does not have a MoRef ID (moid).";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PowerOn,
    PowerOff,
    ShutdownGuest,
    RebootGuest,
    OpenConsole,
}

impl ActionKind {
    /// Delay before the inventory is refreshed to show the new state.
    pub fn follow_up(self) -> Option<Duration> {
        match self {
            Self::PowerOn | Self::PowerOff | Self::ShutdownGuest => Some(Duration::from_millis(1000)),
            Self::RebootGuest => Some(Duration::from_millis(1500)),
            Self::OpenConsole => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::PowerOn => "Start VM",
            Self::PowerOff => "Power Off",
            Self::ShutdownGuest => "Guest Shutdown",
            Self::RebootGuest => "Guest Restart",
            Self::OpenConsole => "VMRC",
        }
    }

    fn failure_notice(self) -> &'static str {
        match self {
            Self::PowerOn => "Power on failed.",
            Self::PowerOff => "Power off failed.",
            Self::ShutdownGuest => {
                "Guest shutdown failed. Ensure VMware Tools is installed and running in the guest."
            }
            Self::RebootGuest => {
                "Guest restart failed. Ensure VMware Tools is installed and running in the guest."
            }
            Self::OpenConsole => {
                "Failed to launch VMRC. Ensure VMware Remote Console is installed or set vmrc_path in config."
            }
        }
    }

    /// Command-word form: `on`, `off`, `shutdown`, `reboot`, `console`.
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "on" | "start" => Some(Self::PowerOn),
            "off" | "stop" => Some(Self::PowerOff),
            "shutdown" => Some(Self::ShutdownGuest),
            "reboot" | "restart" => Some(Self::RebootGuest),
            "console" | "vmrc" => Some(Self::OpenConsole),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PowerOn => "power-on",
            Self::PowerOff => "power-off",
            Self::ShutdownGuest => "guest-shutdown",
            Self::RebootGuest => "guest-reboot",
            Self::OpenConsole => "console",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmAction {
    pub key: VmKey,
    pub kind: ActionKind,
}

impl VmAction {
    pub fn new(key: VmKey, kind: ActionKind) -> Self {
        Self { key, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: VmAction,
    /// One-line message for the user when the action did not go through.
    pub notice: Option<String>,
    /// Schedule a refresh this far out.
    pub follow_up: Option<Duration>,
}

impl ActionOutcome {
    pub fn succeeded(&self) -> bool {
        self.notice.is_none()
    }
}

/// Opens a remote console for a `vmrc://` URL.
pub trait ConsoleLauncher: Send + Sync {
    fn launch(&self, url: &str, alternate: &str, launcher: Option<&Path>) -> vmdock_infra::Result<()>;
}

/// Launches the installed remote console application.
pub struct VmrcLauncher;

impl ConsoleLauncher for VmrcLauncher {
    fn launch(&self, url: &str, alternate: &str, launcher: Option<&Path>) -> vmdock_infra::Result<()> {
        console::launch(url, alternate, launcher)
    }
}

pub struct ActionDispatcher {
    connector: Arc<dyn HypervisorConnector>,
    config: Arc<ConfigStore>,
    console: Arc<dyn ConsoleLauncher>,
    timeout: Duration,
}

impl ActionDispatcher {
    pub fn new(
        connector: Arc<dyn HypervisorConnector>,
        config: Arc<ConfigStore>,
        console: Arc<dyn ConsoleLauncher>,
    ) -> Self {
        Self {
            connector,
            config,
            console,
            timeout: DEFAULT_ENDPOINT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one action. Never retries; failures come back as a notice.
    pub async fn dispatch(&self, action: &VmAction) -> ActionOutcome {
        let key = &action.key;
        tracing::info!(endpoint = %key.endpoint, vm = %key.id, action = %action.kind, "action: requested");

        let outcome = |notice: Option<String>, follow_up: Option<Duration>| ActionOutcome {
            action: action.clone(),
            notice,
            follow_up,
        };

        if !key.has_id() {
            return outcome(Some(notice(action.kind, NO_MOID)), None);
        }

        let Some(endpoint) = self.config.endpoint_for(&key.endpoint) else {
            tracing::warn!(endpoint = %key.endpoint, "action: no credentials configured for host");
            return outcome(Some(notice(action.kind, NO_CREDENTIALS)), None);
        };

        let result = tokio::time::timeout(self.timeout, self.execute(&endpoint, action))
            .await
            .unwrap_or_else(|_| {
                Err(InfraError::Timeout {
                    host: endpoint.host.clone(),
                    after: self.timeout,
                })
            });

        match result {
            Ok(()) => outcome(None, action.kind.follow_up()),
            Err(e) => {
                tracing::warn!(endpoint = %key.endpoint, vm = %key.id, action = %action.kind, error = %e, "action: failed");
                outcome(
                    Some(notice(action.kind, action.kind.failure_notice())),
                    action.kind.follow_up(),
                )
            }
        }
    }

    async fn execute(&self, endpoint: &Endpoint, action: &VmAction) -> vmdock_infra::Result<()> {
        let id = &action.key.id;
        let mut session = self.connector.connect(&endpoint.credentials()).await?;

        let result = match action.kind {
            ActionKind::PowerOn => session.power_on(id).await.map(|()| None),
            ActionKind::PowerOff => session.power_off(id).await.map(|()| None),
            ActionKind::ShutdownGuest => session.shutdown_guest(id).await.map(|()| None),
            ActionKind::RebootGuest => session.reboot_guest(id).await.map(|()| None),
            ActionKind::OpenConsole => session.clone_ticket().await.map(Some),
        };

        if let Err(e) = session.disconnect().await {
            tracing::debug!(endpoint = %endpoint.host, error = %e, "action: disconnect failed");
        }

        let Some(ticket) = result? else {
            return Ok(());
        };
        let url = console::console_url(&endpoint.host, &ticket, id);
        let alternate = console::alternate_console_url(&endpoint.host, &ticket, id);
        let launcher = self.config.vmrc_path();
        self.console.launch(&url, &alternate, launcher.as_deref())
    }
}

fn notice(kind: ActionKind, message: &str) -> String {
    format!("{}: {message}", kind.title())
}
