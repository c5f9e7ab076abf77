//! In-memory hypervisor for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use vmdock_infra::types::{Credentials, RawHostStats, RawVm, VmId};
use vmdock_infra::{Error, HypervisorConnector, HypervisorSession, Result};

use crate::model::Endpoint;

#[derive(Clone, Default)]
pub struct FakeHost {
    pub vms: Vec<RawVm>,
    pub stats: Option<RawHostStats>,
    pub fail_connect: bool,
    pub fail_list: bool,
    pub fail_stats: bool,
    pub fail_actions: bool,
    pub fail_disconnect: bool,
    /// Sleep this long inside `list_vms`.
    pub stall: Option<Duration>,
}

impl FakeHost {
    pub fn with_vms(vms: Vec<RawVm>) -> Self {
        Self {
            vms,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Default::default()
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    pub hosts: Arc<Mutex<HashMap<String, FakeHost>>>,
    /// `(host, operation, vm id)` for every call made through a session.
    pub calls: Arc<Mutex<Vec<(String, &'static str, String)>>>,
}

impl FakeConnector {
    pub fn with(hosts: impl IntoIterator<Item = (&'static str, FakeHost)>) -> Self {
        let connector = Self::default();
        connector
            .hosts
            .lock()
            .extend(hosts.into_iter().map(|(h, f)| (h.to_string(), f)));
        connector
    }

    pub fn calls(&self) -> Vec<(String, &'static str, String)> {
        self.calls.lock().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|(_, o, _)| *o == op).count()
    }
}

#[async_trait]
impl HypervisorConnector for FakeConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn HypervisorSession>> {
        let host = self
            .hosts
            .lock()
            .get(&credentials.host)
            .cloned()
            .unwrap_or_else(FakeHost::failing);
        self.calls
            .lock()
            .push((credentials.host.clone(), "connect", String::new()));
        if host.fail_connect {
            return Err(Error::MissingService(credentials.host.clone(), "session manager"));
        }
        Ok(Box::new(FakeSession {
            name: credentials.host.clone(),
            host,
            calls: self.calls.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeSession {
    name: String,
    host: FakeHost,
    calls: Arc<Mutex<Vec<(String, &'static str, String)>>>,
}

impl FakeSession {
    fn record(&self, op: &'static str, id: &VmId) -> Result<()> {
        self.calls.lock().push((self.name.clone(), op, id.0.clone()));
        if self.host.fail_actions {
            return Err(Error::VmNotFound(id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl HypervisorSession for FakeSession {
    async fn list_vms(&mut self) -> Result<Vec<RawVm>> {
        if let Some(stall) = self.host.stall {
            tokio::time::sleep(stall).await;
        }
        if self.host.fail_list {
            return Err(Error::MissingService(self.name.clone(), "view manager"));
        }
        Ok(self.host.vms.clone())
    }

    async fn host_stats(&mut self) -> Result<Option<RawHostStats>> {
        if self.host.fail_stats {
            return Err(Error::MissingService(self.name.clone(), "host system"));
        }
        Ok(self.host.stats.clone())
    }

    async fn power_on(&mut self, id: &VmId) -> Result<()> {
        self.record("power_on", id)
    }

    async fn power_off(&mut self, id: &VmId) -> Result<()> {
        self.record("power_off", id)
    }

    async fn shutdown_guest(&mut self, id: &VmId) -> Result<()> {
        self.record("shutdown_guest", id)
    }

    async fn reboot_guest(&mut self, id: &VmId) -> Result<()> {
        self.record("reboot_guest", id)
    }

    async fn clone_ticket(&mut self) -> Result<String> {
        self.calls
            .lock()
            .push((self.name.clone(), "clone_ticket", String::new()));
        if self.host.fail_actions {
            return Err(Error::MissingService(self.name.clone(), "session manager"));
        }
        Ok("cst-test".into())
    }

    async fn disconnect(self: Box<Self>) -> Result<()> {
        self.calls
            .lock()
            .push((self.name.clone(), "disconnect", String::new()));
        if self.host.fail_disconnect {
            return Err(Error::MissingService(self.name.clone(), "session manager"));
        }
        Ok(())
    }
}

pub fn vm(id: &str, name: &str, state: &str) -> RawVm {
    RawVm {
        id: Some(id.into()),
        name: Some(name.into()),
        power_state: Some(state.into()),
        ..Default::default()
    }
}

pub fn endpoint(host: &str) -> Endpoint {
    Endpoint {
        username: "root".into(),
        password: "secret".into(),
        ..Endpoint::new(host)
    }
}
