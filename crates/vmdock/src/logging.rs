use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};
use vmdock_core::DiagnosticsBuffer;

const QUIET: &str = "info";
const VERBOSE: &str = "info,vmdock=debug,vmdock_core=debug,vmdock_infra=debug,vim_api=debug";

/// Runtime switch between normal and verbose logging.
#[derive(Clone)]
pub struct LogSwitch {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogSwitch {
    pub fn set_debug(&self, on: bool) {
        let directives = if on { VERBOSE } else { QUIET };
        if let Err(e) = self.handle.modify(|filter| *filter = EnvFilter::new(directives)) {
            tracing::warn!(error = %e, "logging: could not change level");
        }
    }
}

/// Install the global subscriber: `RUST_LOG` if set, else info (or debug for
/// our own crates when `debug` is on). Every event also lands in
/// `diagnostics`.
pub fn init(debug: bool, diagnostics: DiagnosticsBuffer) -> LogSwitch {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { VERBOSE } else { QUIET }));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(diagnostics)
        .init();

    LogSwitch { handle }
}

#[cfg(test)]
impl LogSwitch {
    /// A switch not wired to any installed subscriber.
    pub fn detached() -> Self {
        let (_layer, handle) = reload::Layer::new(EnvFilter::new(QUIET));
        Self { handle }
    }
}
