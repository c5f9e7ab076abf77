//! Inventory reconciliation and edge docking for the VM dock.
//!
//! The [`Scheduler`] feeds timer ticks, refresh requests and user actions one
//! at a time into the [`Controller`], which polls every endpoint, rebuilds the
//! [`ViewModel`], and lets the [`DockController`] size and reserve the window.

pub mod actions;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod dock;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod poller;
pub mod scheduler;
pub mod surface;
pub mod view_model;

#[cfg(test)]
mod testing;

pub use actions::{ActionDispatcher, ActionKind, ActionOutcome, ConsoleLauncher, VmAction, VmrcLauncher};
pub use config::{AppConfig, ConfigError, ConfigStore, DockEdge, Flag, LayoutSettings};
pub use controller::{Controller, Startup};
pub use diagnostics::DiagnosticsBuffer;
pub use dock::{DockController, DockPhase, DockState, NoReservation, ReservationError, ScreenReservation, WindowHandle};
pub use geometry::{Rect, Screen, ScreenSource, Size, StaticScreens};
pub use model::{Endpoint, GaugeLevel, HostMetric, VmKey, VmRecord};
pub use poller::{PollReport, Poller};
pub use scheduler::{Command, Scheduler, SchedulerHandle};
pub use surface::Surface;
pub use view_model::{HostItem, ViewModel, VmItem};
