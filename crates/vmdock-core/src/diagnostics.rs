//! In-memory log tail that can be dumped to a file on request.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

pub const DEFAULT_CAPACITY: usize = 5000;

/// Bounded buffer of formatted log lines; oldest lines are dropped first.
///
/// Cloning shares the buffer, so one clone can be installed as a layer while
/// another is kept to save from.
#[derive(Clone)]
pub struct DiagnosticsBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for DiagnosticsBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiagnosticsBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }

    pub fn push(&self, line: String) {
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn text(&self) -> String {
        let lines = self.lines.lock();
        let mut out = String::new();
        for line in lines.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Write the buffer to `<dir>/diagnostics/diagnostics_<YYYYmmdd_HHMMSS>.log`
    /// and return the file's path.
    pub fn save(&self, dir: &Path) -> io::Result<PathBuf> {
        let diag_dir = dir.join("diagnostics");
        fs::create_dir_all(&diag_dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = diag_dir.join(format!("diagnostics_{stamp}.log"));
        fs::write(&path, self.text())?;
        Ok(path)
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticsBuffer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut line = format!(
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            meta.level(),
            meta.target(),
            visitor.message
        );
        if !visitor.fields.is_empty() {
            line.push(' ');
            line.push_str(&visitor.fields);
        }
        self.push(line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.append(field, format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.append(field, format_args!("{value:?}"));
        }
    }
}

impl LineVisitor {
    fn append(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}
