mod console;
mod headless;
mod logging;
mod screens;

use std::sync::Arc;
use std::time::Duration;

use vmdock_core::{ActionDispatcher, ConfigStore, Controller, DiagnosticsBuffer, Flag, NoReservation, Poller, VmrcLauncher, WindowHandle, scheduler};
use vmdock_infra::vsphere::VsphereConnector;

use crate::console::Console;
use crate::headless::HeadlessWindow;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Arc::new(ConfigStore::open_default().expect("failed to open configuration"));

    let diagnostics = DiagnosticsBuffer::default();
    let log_switch = logging::init(config.flag(Flag::DebugLogging), diagnostics.clone());
    tracing::info!(path = %config.path().display(), servers = config.servers().len(), "configuration loaded");

    let connector = Arc::new(VsphereConnector::new(REQUEST_TIMEOUT));
    let poller = Poller::new(connector.clone());
    let dispatcher = ActionDispatcher::new(connector, config.clone(), Arc::new(VmrcLauncher));

    let window = HeadlessWindow::new(WindowHandle(u64::from(std::process::id())));
    let mut controller = Controller::new(
        config.clone(),
        poller,
        dispatcher,
        Box::new(NoReservation),
        Box::new(screens::from_env()),
        Box::new(window),
    );

    let (handle, scheduler) = scheduler::channel();

    tokio::spawn(
        Console {
            handle: handle.clone(),
            config,
            diagnostics,
            logging: log_switch,
        }
        .run(),
    );

    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            interrupt.quit();
        }
    });
    drop(handle);

    println!("{}", console::HELP);
    scheduler.run(&mut controller).await;
}
