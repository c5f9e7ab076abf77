use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use vim_api::{ManagedObjectReference, ServiceContent, VimClient};

use crate::types::{Credentials, DatastoreUsage, RawHostStats, RawVm, VmId};
use crate::{Error, HypervisorConnector, HypervisorSession, Result};

/// vSphere (ESXi / vCenter) connector over the VI/JSON API.
pub struct VsphereConnector {
    request_timeout: Duration,
    accept_invalid_certs: bool,
}

impl VsphereConnector {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            accept_invalid_certs: true,
        }
    }

    pub fn verify_certificates(mut self, verify: bool) -> Self {
        self.accept_invalid_certs = !verify;
        self
    }
}

#[async_trait]
impl HypervisorConnector for VsphereConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn HypervisorSession>> {
        let mut client = VimClient::new(
            credentials.host.clone(),
            self.accept_invalid_certs,
            self.request_timeout,
        )?;

        let content = client.service_content().await?;
        let session_manager = content
            .session_manager
            .clone()
            .ok_or_else(|| Error::MissingService(credentials.host.clone(), "session manager"))?;

        client
            .login(&session_manager, &credentials.username, &credentials.password)
            .await?;

        debug!(host = %credentials.host, "vsphere: session opened");

        Ok(Box::new(VsphereSession {
            client,
            content,
            session_manager,
        }))
    }

    fn name(&self) -> &'static str {
        "vsphere"
    }
}

pub struct VsphereSession {
    client: VimClient,
    content: ServiceContent,
    session_manager: ManagedObjectReference,
}

impl VsphereSession {
    fn vm_ref(id: &VmId) -> ManagedObjectReference {
        ManagedObjectReference::new("VirtualMachine", id.0.clone())
    }

    /// List every object of `kind` below the root folder.
    ///
    /// The view is destroyed before returning, whether or not the listing
    /// succeeded.
    async fn list_objects(&self, kind: &'static str) -> Result<Vec<ManagedObjectReference>> {
        let view_manager = self
            .content
            .view_manager
            .as_ref()
            .ok_or_else(|| Error::MissingService(self.client.host().to_string(), "view manager"))?;

        let view = self
            .client
            .create_container_view(view_manager, &self.content.root_folder, &[kind], true)
            .await?;

        let listed = self.client.view_contents(&view).await;

        if let Err(e) = self.client.destroy_view(&view).await {
            debug!(host = %self.client.host(), kind, error = %e, "vsphere: destroy view failed");
        }

        Ok(listed?)
    }

    /// Maps a fault for an unknown managed object to `VmNotFound`.
    fn not_found_or(id: &VmId, err: vim_api::Error) -> Error {
        if let vim_api::Error::Api { body, .. } = &err
            && body.contains("ManagedObjectNotFound")
        {
            return Error::VmNotFound(id.clone());
        }
        Error::Vim(err)
    }
}

#[async_trait]
impl HypervisorSession for VsphereSession {
    async fn list_vms(&mut self) -> Result<Vec<RawVm>> {
        let refs = self.list_objects("VirtualMachine").await?;
        let mut vms = Vec::with_capacity(refs.len());

        for vm in &refs {
            let summary = match self.client.vm_summary(vm).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(host = %self.client.host(), vm = %vm.value, error = %e, "vsphere: vm summary failed, skipping");
                    continue;
                }
            };

            let runtime = summary.runtime.unwrap_or_default();
            let config = summary.config.unwrap_or_default();
            let stats = summary.quick_stats.unwrap_or_default();

            // Guest-reported memory is preferred; an idle guest reports 0.
            let memory_mb = match stats.guest_memory_usage {
                Some(mb) if mb > 0 => Some(mb),
                _ => stats.host_memory_usage,
            };

            vms.push(RawVm {
                id: Some(summary.vm.map(|r| r.value).unwrap_or_else(|| vm.value.clone())),
                name: config.name,
                uuid: config.uuid,
                power_state: runtime.power_state,
                cpu_mhz: stats.overall_cpu_usage,
                memory_mb,
                disk_committed_bytes: summary.storage.and_then(|s| s.committed),
            });
        }

        Ok(vms)
    }

    async fn host_stats(&mut self) -> Result<Option<RawHostStats>> {
        let hosts = self.list_objects("HostSystem").await?;

        let mut stats = None;
        let mut host_id = None;
        for host in &hosts {
            match self.client.host_summary(host).await {
                Ok(summary) => {
                    let hardware = summary.hardware.unwrap_or_default();
                    let quick = summary.quick_stats.unwrap_or_default();
                    host_id = Some(host.value.clone());
                    stats = Some(RawHostStats {
                        cpu_mhz_per_core: hardware.cpu_mhz,
                        cpu_cores: hardware.num_cpu_cores,
                        cpu_used_mhz: quick.overall_cpu_usage,
                        memory_bytes: hardware.memory_size,
                        memory_used_mb: quick.overall_memory_usage,
                        ..Default::default()
                    });
                    break;
                }
                Err(e) => {
                    debug!(host = %self.client.host(), system = %host.value, error = %e, "vsphere: host summary failed");
                }
            }
        }

        let Some(mut stats) = stats else {
            return Ok(None);
        };

        // Counts cover every VM on the host, not only the ones shown.
        for vm in self.list_objects("VirtualMachine").await? {
            let Ok(summary) = self.client.vm_summary(&vm).await else {
                continue;
            };
            let Some(runtime) = summary.runtime else {
                continue;
            };
            if let (Some(target), Some(owner)) = (&host_id, &runtime.host)
                && &owner.value != target
            {
                continue;
            }
            match runtime.power_state.as_deref() {
                Some(s) if s.eq_ignore_ascii_case("poweredon") => stats.vms_on += 1,
                Some(s) if s.eq_ignore_ascii_case("poweredoff") => stats.vms_off += 1,
                _ => {}
            }
        }

        for ds in self.list_objects("Datastore").await? {
            match self.client.datastore_summary(&ds).await {
                Ok(summary) => {
                    if let (Some(capacity), Some(free)) = (summary.capacity, summary.free_space)
                        && capacity > 0
                    {
                        stats.datastores.push(DatastoreUsage {
                            capacity_bytes: capacity,
                            free_bytes: free,
                        });
                    }
                }
                Err(e) => {
                    debug!(host = %self.client.host(), datastore = %ds.value, error = %e, "vsphere: datastore summary failed");
                }
            }
        }

        Ok(Some(stats))
    }

    async fn power_on(&mut self, id: &VmId) -> Result<()> {
        self.client
            .power_on_vm(&Self::vm_ref(id))
            .await
            .map_err(|e| Self::not_found_or(id, e))?;
        info!(host = %self.client.host(), vm = %id, "vsphere: power on requested");
        Ok(())
    }

    async fn power_off(&mut self, id: &VmId) -> Result<()> {
        self.client
            .power_off_vm(&Self::vm_ref(id))
            .await
            .map_err(|e| Self::not_found_or(id, e))?;
        info!(host = %self.client.host(), vm = %id, "vsphere: power off requested");
        Ok(())
    }

    async fn shutdown_guest(&mut self, id: &VmId) -> Result<()> {
        self.client
            .shutdown_guest(&Self::vm_ref(id))
            .await
            .map_err(|e| Self::not_found_or(id, e))?;
        info!(host = %self.client.host(), vm = %id, "vsphere: guest shutdown requested");
        Ok(())
    }

    async fn reboot_guest(&mut self, id: &VmId) -> Result<()> {
        self.client
            .reboot_guest(&Self::vm_ref(id))
            .await
            .map_err(|e| Self::not_found_or(id, e))?;
        info!(host = %self.client.host(), vm = %id, "vsphere: guest reboot requested");
        Ok(())
    }

    async fn clone_ticket(&mut self) -> Result<String> {
        Ok(self
            .client
            .acquire_clone_ticket(&self.session_manager)
            .await?)
    }

    async fn disconnect(self: Box<Self>) -> Result<()> {
        let mut this = self;
        let session_manager = this.session_manager.clone();
        this.client.logout(&session_manager).await?;
        debug!(host = %this.client.host(), "vsphere: session closed");
        Ok(())
    }
}
