pub mod console;
pub mod types;
pub mod vsphere;

use std::time::Duration;

use async_trait::async_trait;
use types::{Credentials, RawHostStats, RawVm, VmId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vim api error: {0}")]
    Vim(#[from] vim_api::Error),

    #[error("endpoint {0} does not expose a {1}")]
    MissingService(String, &'static str),

    #[error("vm not found: {0}")]
    VmNotFound(VmId),

    #[error("endpoint {host} timed out after {after:?}")]
    Timeout { host: String, after: Duration },

    #[error("console launch failed: {0}")]
    Launch(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Opens sessions against hypervisor management endpoints.
///
/// One session is opened per endpoint per poll cycle or action and closed
/// again afterwards; connectors hold no pooled connections.
#[async_trait]
pub trait HypervisorConnector: Send + Sync + 'static {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn HypervisorSession>>;

    /// Backend identifier for logs.
    fn name(&self) -> &'static str;
}

/// A logged-in session on one endpoint.
#[async_trait]
pub trait HypervisorSession: Send {
    /// Enumerate every VM the session can see. VMs the endpoint fails to
    /// describe are left out rather than failing the whole listing.
    async fn list_vms(&mut self) -> Result<Vec<RawVm>>;

    /// Capacity/usage of the endpoint's host, `None` when it reports no host.
    async fn host_stats(&mut self) -> Result<Option<RawHostStats>>;

    async fn power_on(&mut self, id: &VmId) -> Result<()>;

    async fn power_off(&mut self, id: &VmId) -> Result<()>;

    /// Request a clean guest OS shutdown through the guest tools.
    async fn shutdown_guest(&mut self, id: &VmId) -> Result<()>;

    async fn reboot_guest(&mut self, id: &VmId) -> Result<()>;

    /// Ticket a remote console can use to join this session.
    async fn clone_ticket(&mut self) -> Result<String>;

    async fn disconnect(self: Box<Self>) -> Result<()>;
}
