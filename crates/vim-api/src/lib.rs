//! Typed Rust client for the vSphere VI/JSON API.
//!
//! Covers the subset needed to dock VMs on a desktop:
//! sessions (login, logout, clone tickets), container views,
//! VM/host/datastore summaries, and power and guest operations.

mod types;

pub use reqwest::StatusCode;
pub use types::*;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// API release used in the `/sdk/vim25/{release}` path.
pub const DEFAULT_RELEASE: &str = "8.0.1.0";

const SESSION_HEADER: &str = "vmware-api-session-id";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vim api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vim api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("vim api {0} requires a logged-in session")]
    NoSession(&'static str),

    #[error("vim api login returned no session id")]
    MissingSessionId,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for one vSphere management endpoint (ESXi host or vCenter).
///
/// Holds at most one session; `login` replaces it and `logout` clears it.
pub struct VimClient {
    host: String,
    release: String,
    http: reqwest::Client,
    session: Option<String>,
}

impl VimClient {
    /// Build a client for `host`. Self-signed endpoint certificates are the
    /// norm for standalone hosts, so `accept_invalid_certs` is usually true.
    pub fn new(host: impl Into<String>, accept_invalid_certs: bool, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            host: host.into(),
            release: DEFAULT_RELEASE.into(),
            http,
            session: None,
        })
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn url(&self, moref: &ManagedObjectReference, path: &str) -> String {
        format!(
            "https://{}/sdk/vim25/{}/{}/{}/{path}",
            self.host, self.release, moref.kind, moref.value
        )
    }

    fn session(&self, endpoint: &'static str) -> Result<&str> {
        self.session.as_deref().ok_or(Error::NoSession(endpoint))
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    async fn get<T: DeserializeOwned>(&self, url: String, endpoint: &'static str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .header(SESSION_HEADER, self.session(endpoint)?)
            .send()
            .await?;

        Self::check(resp, endpoint)
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    async fn invoke<B: Serialize + ?Sized>(
        &self,
        url: String,
        body: Option<&B>,
        endpoint: &'static str,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .post(url)
            .header(SESSION_HEADER, self.session(endpoint)?);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        Self::check(resp, endpoint).await
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Fetch the service content. Works without a session.
    pub async fn service_content(&self) -> Result<ServiceContent> {
        let service_instance = ManagedObjectReference::new("ServiceInstance", "ServiceInstance");
        let resp = self
            .http
            .get(self.url(&service_instance, "content"))
            .send()
            .await?;

        Self::check(resp, "service content")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn login(
        &mut self,
        session_manager: &ManagedObjectReference,
        user_name: &str,
        password: &str,
    ) -> Result<()> {
        let resp = self
            .http
            .post(self.url(session_manager, "Login"))
            .json(&LoginRequest { user_name, password })
            .send()
            .await?;

        let resp = Self::check(resp, "login").await?;
        let token = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(Error::MissingSessionId)?;

        self.session = Some(token);
        Ok(())
    }

    pub async fn logout(&mut self, session_manager: &ManagedObjectReference) -> Result<()> {
        let result = self
            .invoke::<()>(self.url(session_manager, "Logout"), None, "logout")
            .await;
        self.session = None;
        result.map(|_| ())
    }

    /// One-shot ticket that lets a console client clone this session.
    pub async fn acquire_clone_ticket(&self, session_manager: &ManagedObjectReference) -> Result<String> {
        self.invoke::<()>(
            self.url(session_manager, "AcquireCloneTicket"),
            None,
            "acquire clone ticket",
        )
        .await?
        .json()
        .await
        .map_err(Error::from)
    }

    // ── Views ────────────────────────────────────────────────────────

    pub async fn create_container_view(
        &self,
        view_manager: &ManagedObjectReference,
        container: &ManagedObjectReference,
        kinds: &[&str],
        recursive: bool,
    ) -> Result<ManagedObjectReference> {
        let req = CreateContainerViewRequest {
            container,
            kinds: kinds.iter().map(|k| k.to_string()).collect(),
            recursive,
        };
        self.invoke(
            self.url(view_manager, "CreateContainerView"),
            Some(&req),
            "create container view",
        )
        .await?
        .json()
        .await
        .map_err(Error::from)
    }

    pub async fn view_contents(&self, view: &ManagedObjectReference) -> Result<Vec<ManagedObjectReference>> {
        self.get(self.url(view, "view"), "container view contents")
            .await
    }

    pub async fn destroy_view(&self, view: &ManagedObjectReference) -> Result<()> {
        self.invoke::<()>(self.url(view, "DestroyView"), None, "destroy view")
            .await?;
        Ok(())
    }

    // ── Summaries ────────────────────────────────────────────────────

    pub async fn vm_summary(&self, vm: &ManagedObjectReference) -> Result<VirtualMachineSummary> {
        self.get(self.url(vm, "summary"), "vm summary").await
    }

    pub async fn host_summary(&self, host: &ManagedObjectReference) -> Result<HostListSummary> {
        self.get(self.url(host, "summary"), "host summary").await
    }

    pub async fn datastore_summary(&self, datastore: &ManagedObjectReference) -> Result<DatastoreSummary> {
        self.get(self.url(datastore, "summary"), "datastore summary")
            .await
    }

    // ── Power & guest ────────────────────────────────────────────────

    /// Starts a power-on task and returns its reference without waiting.
    pub async fn power_on_vm(&self, vm: &ManagedObjectReference) -> Result<ManagedObjectReference> {
        self.invoke(
            self.url(vm, "PowerOnVM_Task"),
            Some(&serde_json::json!({})),
            "power on vm",
        )
        .await?
        .json()
        .await
        .map_err(Error::from)
    }

    pub async fn power_off_vm(&self, vm: &ManagedObjectReference) -> Result<ManagedObjectReference> {
        self.invoke::<()>(self.url(vm, "PowerOffVM_Task"), None, "power off vm")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    /// Asks the guest tools to shut the OS down. Returns once the request
    /// is accepted, not when the guest is off.
    pub async fn shutdown_guest(&self, vm: &ManagedObjectReference) -> Result<()> {
        self.invoke::<()>(self.url(vm, "ShutdownGuest"), None, "shutdown guest")
            .await?;
        Ok(())
    }

    pub async fn reboot_guest(&self, vm: &ManagedObjectReference) -> Result<()> {
        self.invoke::<()>(self.url(vm, "RebootGuest"), None, "reboot guest")
            .await?;
        Ok(())
    }
}
