//! The refresh pipeline: poll → view model → card rebuild → dock → placement.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;

use crate::actions::{ActionDispatcher, ActionOutcome, VmAction};
use crate::config::{ConfigError, ConfigStore, DockEdge, Flag};
use crate::dock::{DockController, DockRequest, DockState, GeometryPlan, ScreenReservation};
use crate::geometry::{Rect, ScreenSource};
use crate::poller::Poller;
use crate::surface::Surface;
use crate::view_model::ViewModel;

pub const STARTUP_REFRESH_DELAY: Duration = Duration::from_millis(200);
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// What to schedule after the window is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Startup {
    /// `None` when inventory is skipped on startup: no refresh, no timer.
    pub first_refresh: Option<Duration>,
    pub poll_interval: Option<Duration>,
}

pub struct Controller {
    config: Arc<ConfigStore>,
    poller: Poller,
    dispatcher: ActionDispatcher,
    dock: DockController,
    screens: Box<dyn ScreenSource>,
    surface: Box<dyn Surface>,
    view: ViewModel,
    window: Option<Rect>,
}

impl Controller {
    pub fn new(
        config: Arc<ConfigStore>,
        poller: Poller,
        dispatcher: ActionDispatcher,
        reservation: Box<dyn ScreenReservation>,
        screens: Box<dyn ScreenSource>,
        surface: Box<dyn Surface>,
    ) -> Self {
        let dock = DockController::new(surface.handle(), reservation, GeometryPlan::default());
        Self {
            config,
            poller,
            dispatcher,
            dock,
            screens,
            surface,
            view: ViewModel::default(),
            window: None,
        }
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn dock_state(&self) -> Option<DockState> {
        self.dock.state()
    }

    pub fn window(&self) -> Option<Rect> {
        self.window
    }

    fn dock_request(&self) -> DockRequest {
        DockRequest {
            layout: self.config.layout(),
            item_count: self.view.vms.len(),
            reservation_disabled: self.config.flag(Flag::DisableAppbar),
        }
    }

    /// Dock the (still empty) window and report what to schedule next.
    pub fn show(&mut self) -> Startup {
        let req = self.dock_request();
        let rect = self.dock.show(&*self.screens, &req);
        self.apply_window(rect, &req);

        if self.config.flag(Flag::SkipInventoryOnStartup) {
            tracing::info!("inventory: skipped on startup");
            return Startup {
                first_refresh: None,
                poll_interval: None,
            };
        }
        Startup {
            first_refresh: Some(STARTUP_REFRESH_DELAY),
            poll_interval: Some(POLL_INTERVAL),
        }
    }

    /// One full reconciliation cycle. A defect anywhere in polling or model
    /// building is logged and treated as an empty inventory.
    pub async fn refresh(&mut self) -> &ViewModel {
        let servers = self.config.servers();
        let running_only = self.config.flag(Flag::ShowRunningOnly);
        let theme = self.config.active_theme();
        tracing::debug!(servers = servers.len(), running_only, "inventory: refresh started");

        let poller = &self.poller;
        let pipeline = async move {
            let report = poller.poll(&servers, running_only).await;
            ViewModel::build(&report, &theme)
        };

        self.view = match AssertUnwindSafe(pipeline).catch_unwind().await {
            Ok(view) => view,
            Err(panic) => {
                tracing::error!(cause = panic_message(&*panic), "inventory: refresh pipeline panicked");
                ViewModel::default()
            }
        };

        self.surface.rebuild(&self.view);
        self.relayout();

        tracing::info!(vms = self.view.vms.len(), hosts = self.view.hosts.len(), "inventory: refresh complete");
        &self.view
    }

    /// Re-dock and re-place cards for the current model, e.g. after a card
    /// size or panel width change.
    pub fn relayout(&mut self) {
        let req = self.dock_request();
        let rect = self.dock.redock(&*self.screens, &req);
        self.apply_window(rect, &req);
    }

    pub async fn perform(&mut self, action: VmAction) -> ActionOutcome {
        let outcome = self.dispatcher.dispatch(&action).await;
        if let Some(notice) = &outcome.notice {
            self.surface.notify(notice);
        }
        outcome
    }

    /// Persist a new dock edge and/or monitor and dock again from scratch.
    pub fn apply_layout_change(&mut self, edge: DockEdge, monitor: Option<usize>) -> Result<(), ConfigError> {
        let monitor = monitor.unwrap_or(self.config.layout().monitor_index);
        self.config.set_docking(edge, monitor)?;

        let req = self.dock_request();
        let rect = self.dock.reconfigure(&*self.screens, &req);
        self.apply_window(rect, &req);
        tracing::info!(%edge, monitor, "dock: layout changed");
        Ok(())
    }

    pub fn close(&mut self) {
        self.dock.release();
    }

    fn apply_window(&mut self, rect: Option<Rect>, req: &DockRequest) {
        let Some(rect) = rect else {
            return;
        };
        self.surface.set_geometry(rect);
        let cards = self.dock.plan().place_cards(&req.layout, req.item_count, rect);
        self.surface.place_cards(&cards);
        self.window = Some(rect);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use vmdock_infra::types::Credentials;
    use vmdock_infra::{HypervisorConnector, HypervisorSession};

    use super::*;
    use crate::actions::{ActionKind, ConsoleLauncher};
    use crate::dock::tests::{ScriptedReservation, screen_1080p};
    use crate::dock::{DockPhase, WindowHandle};
    use crate::model::VmKey;
    use crate::testing::{FakeConnector, FakeHost, endpoint, vm};

    #[derive(Default)]
    pub(crate) struct SurfaceLog {
        pub rebuilds: Vec<usize>,
        pub geometry: Vec<Rect>,
        pub cards: Vec<Vec<Rect>>,
        pub notices: Vec<String>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct RecordingSurface(pub Arc<Mutex<SurfaceLog>>);

    impl Surface for RecordingSurface {
        fn handle(&self) -> WindowHandle {
            WindowHandle(42)
        }

        fn rebuild(&mut self, model: &ViewModel) {
            self.0.lock().rebuilds.push(model.vms.len());
        }

        fn set_geometry(&mut self, window: Rect) {
            self.0.lock().geometry.push(window);
        }

        fn place_cards(&mut self, cards: &[Rect]) {
            self.0.lock().cards.push(cards.to_vec());
        }

        fn notify(&mut self, notice: &str) {
            self.0.lock().notices.push(notice.to_string());
        }
    }

    struct NoConsole;

    impl ConsoleLauncher for NoConsole {
        fn launch(&self, _: &str, _: &str, _: Option<&std::path::Path>) -> vmdock_infra::Result<()> {
            Ok(())
        }
    }

    pub(crate) struct Harness {
        pub _dir: tempfile::TempDir,
        pub config: Arc<ConfigStore>,
        pub surface: RecordingSurface,
        pub reservation: ScriptedReservation,
        pub controller: Controller,
    }

    pub(crate) fn harness(
        connector: Arc<dyn HypervisorConnector>,
        hosts: &[&str],
        configure: impl FnOnce(&mut crate::config::AppConfig),
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(ConfigStore::open(dir.path()).unwrap());
        config
            .update(|c| {
                c.servers = hosts.iter().map(|h| endpoint(h)).collect();
                c.show_running_only = false;
                configure(c);
            })
            .unwrap();

        let surface = RecordingSurface::default();
        let reservation = ScriptedReservation::default();
        let controller = Controller::new(
            config.clone(),
            Poller::new(connector.clone()),
            ActionDispatcher::new(connector, config.clone(), Arc::new(NoConsole)),
            Box::new(reservation.clone()),
            Box::new(screen_1080p()),
            Box::new(surface.clone()),
        );
        Harness {
            _dir: dir,
            config,
            surface,
            reservation,
            controller,
        }
    }

    #[tokio::test]
    async fn refresh_rebuilds_redocks_and_places_every_card() {
        let connector = FakeConnector::with([
            (
                "a",
                FakeHost::with_vms((0..6).map(|i| vm(&format!("vm-{i}"), "x", "poweredOn")).collect()),
            ),
            (
                "b",
                FakeHost::with_vms((0..5).map(|i| vm(&format!("vm-{i}"), "y", "poweredOff")).collect()),
            ),
        ]);
        let mut h = harness(Arc::new(connector), &["a", "b"], |_| {});

        let startup = h.controller.show();
        assert_eq!(startup.first_refresh, Some(STARTUP_REFRESH_DELAY));
        assert_eq!(h.controller.dock_state().unwrap().phase, DockPhase::Registered);

        let vms = h.controller.refresh().await.vms.len();
        assert_eq!(vms, 11);

        let log = h.surface.0.lock();
        assert_eq!(log.rebuilds, vec![11]);
        // 11 cards wrap onto two rows of the top bar.
        assert_eq!(log.geometry.last().unwrap().height, 120);
        assert_eq!(log.cards.last().unwrap().len(), 11);
        let bottom = log.cards.last().unwrap().iter().map(Rect::bottom).max().unwrap();
        assert_eq!(bottom + 8, log.geometry.last().unwrap().bottom());
    }

    #[tokio::test]
    async fn skip_inventory_on_startup_schedules_nothing() {
        let mut h = harness(Arc::new(FakeConnector::default()), &[], |c| {
            c.skip_inventory_on_startup = true;
        });
        let startup = h.controller.show();
        assert_eq!(
            startup,
            Startup {
                first_refresh: None,
                poll_interval: None
            }
        );
        assert_eq!(h.surface.0.lock().geometry.len(), 1);
    }

    struct PanickingConnector;

    #[async_trait]
    impl HypervisorConnector for PanickingConnector {
        async fn connect(&self, _: &Credentials) -> vmdock_infra::Result<Box<dyn HypervisorSession>> {
            panic!("connector bug");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn pipeline_panic_becomes_empty_cycle() {
        let mut h = harness(Arc::new(PanickingConnector), &["a"], |_| {});
        h.controller.show();
        assert!(h.controller.refresh().await.is_empty());
        assert_eq!(h.surface.0.lock().rebuilds, vec![0]);
    }

    #[tokio::test]
    async fn failed_action_is_surfaced_as_notice() {
        let connector = FakeConnector::with([(
            "a",
            FakeHost {
                fail_actions: true,
                ..Default::default()
            },
        )]);
        let mut h = harness(Arc::new(connector), &["a"], |_| {});

        let outcome = h
            .controller
            .perform(VmAction::new(VmKey::new("a", "vm-1"), ActionKind::ShutdownGuest))
            .await;

        assert!(!outcome.succeeded());
        assert_eq!(h.surface.0.lock().notices.len(), 1);
    }

    #[tokio::test]
    async fn layout_change_persists_and_docks_on_new_edge() {
        let mut h = harness(Arc::new(FakeConnector::default()), &[], |_| {});
        h.controller.show();
        h.controller.apply_layout_change(DockEdge::Right, Some(3)).unwrap();

        let layout = h.config.layout();
        assert_eq!(layout.dock_position, DockEdge::Right);
        assert_eq!(layout.monitor_index, 3);

        let state = h.controller.dock_state().unwrap();
        assert_eq!(state.edge, DockEdge::Right);
        // monitor 3 does not exist; clamped to the only screen
        assert_eq!(state.screen_index, 0);
        assert_eq!(h.controller.window().unwrap().right(), 1920);

        h.controller.close();
        assert!(h.controller.dock_state().is_none());
        assert!(h.reservation.calls.lock().len() >= 3);
    }

    #[tokio::test]
    async fn vm_without_id_is_shown_but_actions_explain_why_not() {
        let mut anonymous = vm("", "template", "poweredOn");
        anonymous.id = None;
        let connector = FakeConnector::with([(
            "a",
            FakeHost::with_vms(vec![vm("vm-1", "web", "poweredOn"), anonymous]),
        )]);
        let mut h = harness(Arc::new(connector.clone()), &["a"], |_| {});
        h.controller.show();

        let key = {
            let view = h.controller.refresh().await;
            assert_eq!(view.vms.len(), 2);
            view.vms[1].key.clone()
        };
        assert!(!key.has_id());

        let outcome = h.controller.perform(VmAction::new(key, ActionKind::PowerOn)).await;
        assert_eq!(outcome.follow_up, None);
        assert!(outcome.notice.as_deref().unwrap().contains(crate::actions::NO_MOID));
        assert_eq!(h.surface.0.lock().notices.len(), 1);
        assert_eq!(connector.count("power_on"), 0);
    }
}
