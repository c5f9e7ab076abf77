//! Edge docking.
//!
//! The dock controller turns "how much room do the cards need" into a window
//! rectangle and keeps the OS screen-space reservation in step with it. When
//! the reservation is unavailable or breaks, the window falls back to a plain
//! window inside the screen's available area for the rest of the session.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::{DockEdge, LayoutSettings};
use crate::geometry::{Rect, Screen, ScreenSource, Size};
use crate::layout::WrapLayout;

/// Opaque native window identifier handed to the reservation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("screen reservation is not supported on this platform")]
    Unsupported,

    #[error("screen reservation rejected: {0}")]
    Rejected(String),
}

/// OS screen-space reservation (an "app bar"): other windows are kept out of
/// the reserved strip along a screen edge.
pub trait ScreenReservation: Send {
    fn is_supported(&self) -> bool;

    /// Reserve `desired` along `edge`. Returns the rectangle actually granted.
    fn register(
        &mut self,
        window: WindowHandle,
        edge: DockEdge,
        desired: Rect,
    ) -> Result<Rect, ReservationError>;

    /// Resize or move an existing reservation without registering again.
    fn reposition(
        &mut self,
        window: WindowHandle,
        edge: DockEdge,
        desired: Rect,
    ) -> Result<Rect, ReservationError>;

    fn unregister(&mut self, window: WindowHandle) -> Result<(), ReservationError>;
}

/// Backend for platforms without reservations: the window is always placed
/// as a normal window.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReservation;

impl ScreenReservation for NoReservation {
    fn is_supported(&self) -> bool {
        false
    }

    fn register(&mut self, _: WindowHandle, _: DockEdge, _: Rect) -> Result<Rect, ReservationError> {
        Err(ReservationError::Unsupported)
    }

    fn reposition(&mut self, _: WindowHandle, _: DockEdge, _: Rect) -> Result<Rect, ReservationError> {
        Err(ReservationError::Unsupported)
    }

    fn unregister(&mut self, _: WindowHandle) -> Result<(), ReservationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockPhase {
    /// Plain window, reservation disabled or unsupported.
    Undocked,
    PendingRegister,
    Registered,
    /// Reservation failed once; plain window until the process exits.
    RegisterFailed,
}

impl DockPhase {
    fn reserves(self) -> bool {
        matches!(self, Self::PendingRegister | Self::Registered)
    }
}

impl fmt::Display for DockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Undocked => "undocked",
            Self::PendingRegister => "pending-register",
            Self::Registered => "registered",
            Self::RegisterFailed => "register-failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockState {
    pub edge: DockEdge,
    pub screen_index: usize,
    pub phase: DockPhase,
    /// Last rectangle the reservation granted.
    pub reserved: Option<Rect>,
}

/// Inputs for one docking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockRequest {
    pub layout: LayoutSettings,
    pub item_count: usize,
    /// `disable_appbar`: never touch the reservation.
    pub reservation_disabled: bool,
}

/// Window and card-panel geometry for a dock edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryPlan {
    pub wrap: WrapLayout,
}

impl GeometryPlan {
    pub fn new(wrap: WrapLayout) -> Self {
        Self { wrap }
    }

    fn card_sizes(layout: &LayoutSettings, count: usize) -> Vec<Size> {
        vec![Size::new(layout.button_width, layout.button_height); count]
    }

    fn panels_width(layout: &LayoutSettings) -> i32 {
        layout.side_panel_width + layout.metrics_panel_width
    }

    /// Height of a top bar spanning `area`. Never less than one card row.
    pub fn top_height(&self, layout: &LayoutSettings, item_count: usize, area_width: i32) -> i32 {
        let panel_width = (area_width - Self::panels_width(layout)).max(0);
        let required = self
            .wrap
            .required_height(&Self::card_sizes(layout, item_count), panel_width);
        required.max(self.wrap.margins.vertical().saturating_add(layout.button_height))
    }

    /// Width of a left/right bar: one card column plus both side panels.
    pub fn column_width(&self, layout: &LayoutSettings) -> i32 {
        self.wrap
            .required_column_width(layout.button_width)
            .saturating_add(Self::panels_width(layout))
    }

    /// Window rectangle for `edge` inside `area`.
    pub fn window_rect(&self, edge: DockEdge, layout: &LayoutSettings, item_count: usize, area: Rect) -> Rect {
        match edge {
            DockEdge::Top => Rect::new(
                area.x,
                area.y,
                area.width,
                self.top_height(layout, item_count, area.width),
            ),
            DockEdge::Left => Rect::new(area.x, area.y, self.column_width(layout), area.height),
            DockEdge::Right => {
                let width = self.column_width(layout);
                Rect::new(area.right() - width, area.y, width, area.height)
            }
        }
    }

    /// Part of the window the cards flow in; the metrics and side panels
    /// take the right-hand strip.
    pub fn panel_rect(&self, layout: &LayoutSettings, window: Rect) -> Rect {
        Rect::new(
            window.x,
            window.y,
            (window.width - Self::panels_width(layout)).max(0),
            window.height,
        )
    }

    pub fn place_cards(&self, layout: &LayoutSettings, item_count: usize, window: Rect) -> Vec<Rect> {
        self.wrap.place(
            &Self::card_sizes(layout, item_count),
            self.panel_rect(layout, window),
        )
    }
}

/// Owns the reservation for one window.
pub struct DockController {
    window: WindowHandle,
    reservation: Box<dyn ScreenReservation>,
    plan: GeometryPlan,
    state: Option<DockState>,
    /// Survives `reconfigure`: a failed reservation stays failed.
    degraded: bool,
}

impl DockController {
    pub fn new(window: WindowHandle, reservation: Box<dyn ScreenReservation>, plan: GeometryPlan) -> Self {
        Self {
            window,
            reservation,
            plan,
            state: None,
            degraded: false,
        }
    }

    pub fn state(&self) -> Option<DockState> {
        self.state
    }

    pub fn plan(&self) -> &GeometryPlan {
        &self.plan
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Initial dock. Registers the reservation against the target screen's
    /// full bounds unless it is disabled, unsupported or already failed this
    /// session. Returns the window rectangle, `None` without screens.
    pub fn show(&mut self, screens: &dyn ScreenSource, req: &DockRequest) -> Option<Rect> {
        if self.state.is_some_and(|s| s.phase == DockPhase::Registered) {
            debug!("dock: show while registered, repositioning instead");
            return self.redock(screens, req);
        }

        let Some((index, screen)) = screens.target(req.layout.monitor_index) else {
            warn!("dock: no screens attached, skipping");
            return None;
        };
        let edge = req.layout.dock_position;

        if self.degraded {
            self.state = Some(DockState {
                edge,
                screen_index: index,
                phase: DockPhase::RegisterFailed,
                reserved: None,
            });
            return Some(self.undocked_rect(&screen, req));
        }

        if req.reservation_disabled || !self.reservation.is_supported() {
            debug!(disabled = req.reservation_disabled, "dock: running as a normal window");
            self.state = Some(DockState {
                edge,
                screen_index: index,
                phase: DockPhase::Undocked,
                reserved: None,
            });
            return Some(self.undocked_rect(&screen, req));
        }

        self.state = Some(DockState {
            edge,
            screen_index: index,
            phase: DockPhase::PendingRegister,
            reserved: None,
        });
        Some(self.register(&screen, req))
    }

    /// Bring the window in line with the current content. Repositions a live
    /// reservation; otherwise sets plain window geometry.
    pub fn redock(&mut self, screens: &dyn ScreenSource, req: &DockRequest) -> Option<Rect> {
        let Some(state) = self.state else {
            return self.show(screens, req);
        };
        let Some((index, screen)) = screens.target(req.layout.monitor_index) else {
            warn!("dock: no screens attached, skipping");
            return None;
        };
        if let Some(s) = self.state.as_mut() {
            s.screen_index = index;
            s.edge = req.layout.dock_position;
        }

        if req.reservation_disabled && state.phase.reserves() {
            info!("dock: reservation disabled, releasing");
            self.unregister_quietly();
            self.set_phase(DockPhase::Undocked, None);
        }

        let phase = self.state.map(|s| s.phase).unwrap_or(DockPhase::Undocked);
        match phase {
            DockPhase::Registered => {
                let desired = self.desired_rect(&screen, req);
                match self
                    .reservation
                    .reposition(self.window, req.layout.dock_position, desired)
                {
                    Ok(granted) => {
                        debug!(?granted, "dock: reservation repositioned");
                        self.set_phase(DockPhase::Registered, Some(granted));
                        Some(granted)
                    }
                    Err(e) => {
                        self.demote(&e);
                        self.unregister_quietly();
                        Some(self.undocked_rect(&screen, req))
                    }
                }
            }
            DockPhase::PendingRegister => Some(self.register(&screen, req)),
            DockPhase::Undocked
                if !req.reservation_disabled && !self.degraded && self.reservation.is_supported() =>
            {
                info!("dock: reservation enabled, registering");
                self.set_phase(DockPhase::PendingRegister, None);
                Some(self.register(&screen, req))
            }
            DockPhase::Undocked | DockPhase::RegisterFailed => Some(self.undocked_rect(&screen, req)),
        }
    }

    /// Release the reservation; the window is closing.
    pub fn release(&mut self) {
        if self.state.is_some_and(|s| s.phase.reserves()) {
            self.unregister_quietly();
            info!("dock: reservation released");
        }
        self.state = None;
    }

    /// Dock edge or monitor changed: drop the current reservation and dock
    /// again from scratch.
    pub fn reconfigure(&mut self, screens: &dyn ScreenSource, req: &DockRequest) -> Option<Rect> {
        self.release();
        self.show(screens, req)
    }

    fn desired_rect(&self, screen: &Screen, req: &DockRequest) -> Rect {
        self.plan
            .window_rect(req.layout.dock_position, &req.layout, req.item_count, screen.geometry)
    }

    fn undocked_rect(&self, screen: &Screen, req: &DockRequest) -> Rect {
        self.plan
            .window_rect(req.layout.dock_position, &req.layout, req.item_count, screen.available)
    }

    fn register(&mut self, screen: &Screen, req: &DockRequest) -> Rect {
        let desired = self.desired_rect(screen, req);
        match self
            .reservation
            .register(self.window, req.layout.dock_position, desired)
        {
            Ok(granted) => {
                info!(edge = %req.layout.dock_position, ?granted, "dock: reservation registered");
                self.set_phase(DockPhase::Registered, Some(granted));
                granted
            }
            Err(e) => {
                self.demote(&e);
                self.undocked_rect(screen, req)
            }
        }
    }

    fn demote(&mut self, cause: &ReservationError) {
        if !self.degraded {
            error!(error = %cause, "dock: screen reservation failed, running undocked for this session");
        }
        self.degraded = true;
        self.set_phase(DockPhase::RegisterFailed, None);
    }

    fn unregister_quietly(&mut self) {
        if let Err(e) = self.reservation.unregister(self.window) {
            debug!(error = %e, "dock: unregister failed");
        }
    }

    fn set_phase(&mut self, phase: DockPhase, reserved: Option<Rect>) {
        if let Some(state) = self.state.as_mut() {
            state.phase = phase;
            state.reserved = reserved;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::geometry::StaticScreens;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Register(DockEdge, Rect),
        Reposition(DockEdge, Rect),
        Unregister,
    }

    /// Grants whatever is asked for unless told to fail.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedReservation {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub fail_register: bool,
        pub fail_reposition: bool,
    }

    impl ScreenReservation for ScriptedReservation {
        fn is_supported(&self) -> bool {
            true
        }

        fn register(&mut self, _: WindowHandle, edge: DockEdge, desired: Rect) -> Result<Rect, ReservationError> {
            self.calls.lock().push(Call::Register(edge, desired));
            if self.fail_register {
                return Err(ReservationError::Rejected("register".into()));
            }
            Ok(desired)
        }

        fn reposition(&mut self, _: WindowHandle, edge: DockEdge, desired: Rect) -> Result<Rect, ReservationError> {
            self.calls.lock().push(Call::Reposition(edge, desired));
            if self.fail_reposition {
                return Err(ReservationError::Rejected("reposition".into()));
            }
            Ok(desired)
        }

        fn unregister(&mut self, _: WindowHandle) -> Result<(), ReservationError> {
            self.calls.lock().push(Call::Unregister);
            Ok(())
        }
    }

    pub(crate) fn screen_1080p() -> StaticScreens {
        StaticScreens(vec![Screen {
            geometry: Rect::new(0, 0, 1920, 1080),
            available: Rect::new(0, 0, 1920, 1040),
        }])
    }

    fn request(edge: DockEdge, items: usize) -> DockRequest {
        DockRequest {
            layout: LayoutSettings {
                dock_position: edge,
                ..LayoutSettings::default()
            },
            item_count: items,
            reservation_disabled: false,
        }
    }

    fn controller(res: ScriptedReservation) -> DockController {
        DockController::new(WindowHandle(1), Box::new(res), GeometryPlan::default())
    }

    #[test]
    fn left_dock_is_one_column_plus_panels_full_height() {
        let res = ScriptedReservation::default();
        let mut dock = controller(res.clone());
        let rect = dock.show(&screen_1080p(), &request(DockEdge::Left, 5)).unwrap();

        assert_eq!(rect, Rect::new(0, 0, 8 + 160 + 8 + 50 + 180, 1080));
        assert_eq!(rect.width, 406);
        assert_eq!(dock.state().unwrap().phase, DockPhase::Registered);
        assert_eq!(*res.calls.lock(), vec![Call::Register(DockEdge::Left, rect)]);
    }

    #[test]
    fn right_dock_hugs_right_edge() {
        let mut dock = controller(ScriptedReservation::default());
        let rect = dock.show(&screen_1080p(), &request(DockEdge::Right, 0)).unwrap();
        assert_eq!(rect.right(), 1920);
        assert_eq!(rect.width, 406);
    }

    #[test]
    fn top_dock_grows_with_rows_and_never_below_one_row() {
        let plan = GeometryPlan::default();
        let layout = LayoutSettings::default();
        // panel 1920 - 230 = 1690; content 1674; 10 per row (10*160 + 9*8 = 1672)
        assert_eq!(plan.top_height(&layout, 0, 1920), 64);
        assert_eq!(plan.top_height(&layout, 10, 1920), 64);
        assert_eq!(plan.top_height(&layout, 11, 1920), 8 + 48 + 8 + 48 + 8);
    }

    #[test]
    fn registered_dock_repositions_without_registering_again() {
        let res = ScriptedReservation::default();
        let mut dock = controller(res.clone());
        let screens = screen_1080p();
        dock.show(&screens, &request(DockEdge::Top, 0)).unwrap();
        let rect = dock.redock(&screens, &request(DockEdge::Top, 11)).unwrap();

        assert_eq!(rect.height, 120);
        let calls = res.calls.lock();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[1], Call::Reposition(DockEdge::Top, _)));
    }

    #[test]
    fn register_failure_falls_back_to_available_area_for_good() {
        let res = ScriptedReservation {
            fail_register: true,
            ..Default::default()
        };
        let mut dock = controller(res.clone());
        let screens = screen_1080p();
        let req = request(DockEdge::Left, 3);

        let first = dock.show(&screens, &req).unwrap();
        assert_eq!(first, Rect::new(0, 0, 406, 1040));
        assert_eq!(dock.state().unwrap().phase, DockPhase::RegisterFailed);

        let calls_after_show = res.calls.lock().len();
        let again = dock.redock(&screens, &req).unwrap();
        let and_again = dock.redock(&screens, &req).unwrap();
        assert_eq!(first, again);
        assert_eq!(again, and_again);
        assert_eq!(res.calls.lock().len(), calls_after_show);
    }

    #[test]
    fn reposition_failure_demotes_and_recomputes_undocked() {
        let res = ScriptedReservation {
            fail_reposition: true,
            ..Default::default()
        };
        let mut dock = controller(res.clone());
        let screens = screen_1080p();
        let req = request(DockEdge::Right, 2);

        dock.show(&screens, &req).unwrap();
        let rect = dock.redock(&screens, &req).unwrap();
        assert_eq!(rect, Rect::new(1920 - 406, 0, 406, 1040));
        assert_eq!(dock.state().unwrap().phase, DockPhase::RegisterFailed);
        assert!(dock.is_degraded());

        // Changing edge later does not bring the reservation back.
        let n = res.calls.lock().len();
        dock.reconfigure(&screens, &request(DockEdge::Left, 2)).unwrap();
        assert_eq!(dock.state().unwrap().phase, DockPhase::RegisterFailed);
        assert_eq!(res.calls.lock().len(), n);
    }

    #[test]
    fn disabled_reservation_never_calls_backend() {
        let res = ScriptedReservation::default();
        let mut dock = controller(res.clone());
        let mut req = request(DockEdge::Top, 4);
        req.reservation_disabled = true;

        let rect = dock.show(&screen_1080p(), &req).unwrap();
        assert_eq!(rect.y, 0);
        assert_eq!(rect.width, 1920);
        assert_eq!(dock.state().unwrap().phase, DockPhase::Undocked);
        dock.release();
        assert!(res.calls.lock().is_empty());
    }

    #[test]
    fn reconfigure_releases_then_registers_on_new_edge() {
        let res = ScriptedReservation::default();
        let mut dock = controller(res.clone());
        let screens = screen_1080p();
        dock.show(&screens, &request(DockEdge::Top, 1)).unwrap();
        dock.reconfigure(&screens, &request(DockEdge::Left, 1)).unwrap();

        let calls = res.calls.lock();
        assert!(matches!(calls[0], Call::Register(DockEdge::Top, _)));
        assert_eq!(calls[1], Call::Unregister);
        assert!(matches!(calls[2], Call::Register(DockEdge::Left, _)));
    }

    #[test]
    fn no_screens_is_a_no_op() {
        let mut dock = controller(ScriptedReservation::default());
        assert_eq!(
            dock.show(&StaticScreens::default(), &request(DockEdge::Top, 1)),
            None
        );
    }

    #[test]
    fn unsupported_platform_runs_undocked() {
        let mut dock = DockController::new(WindowHandle(7), Box::new(NoReservation), GeometryPlan::default());
        let rect = dock.show(&screen_1080p(), &request(DockEdge::Left, 0)).unwrap();
        assert_eq!(rect.height, 1040);
        assert_eq!(dock.state().unwrap().phase, DockPhase::Undocked);
        assert!(!dock.is_degraded());
    }

    #[test]
    fn reenabling_reservation_registers_on_next_redock() {
        let res = ScriptedReservation::default();
        let mut dock = controller(res.clone());
        let screens = screen_1080p();
        let mut req = request(DockEdge::Top, 2);
        req.reservation_disabled = true;
        dock.show(&screens, &req).unwrap();
        assert_eq!(dock.state().unwrap().phase, DockPhase::Undocked);

        req.reservation_disabled = false;
        let rect = dock.redock(&screens, &req).unwrap();
        assert_eq!(rect.y, 0);
        assert_eq!(dock.state().unwrap().phase, DockPhase::Registered);
        assert_eq!(*res.calls.lock(), vec![Call::Register(DockEdge::Top, rect)]);
    }

    #[test]
    fn oversized_card_settings_are_clamped_before_geometry() {
        let mut config = crate::config::AppConfig::default();
        config.button_width = i32::MAX;
        config.button_height = i32::MAX;
        let layout = config.layout();
        let plan = GeometryPlan::default();

        let height = plan.top_height(&layout, 3, 1920);
        assert!(height > 0);
        assert_eq!(plan.column_width(&layout), 8 + 4096 + 8 + 50 + 180);
    }
}
