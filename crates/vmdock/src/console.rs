//! Line-oriented control from stdin.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use vmdock_core::{ActionKind, Command, ConfigStore, DiagnosticsBuffer, DockEdge, Flag, SchedulerHandle, VmAction, VmKey};

use crate::logging::LogSwitch;

pub const HELP: &str = "\
commands:
  refresh                                  poll every endpoint now
  on|off|shutdown|reboot|console <host> <vm-id>
  dock <top|left|right> [monitor]          move the dock
  debug [on|off]                           toggle verbose logging
  diag                                     save the diagnostics log
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Send(Command),
    Debug(Option<bool>),
    SaveDiagnostics,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    Usage(&'static str),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("empty command"),
            Self::Unknown(word) => write!(f, "unknown command {word:?}, try `help`"),
            Self::Usage(usage) => write!(f, "usage: {usage}"),
        }
    }
}

pub fn parse(line: &str) -> Result<Input, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let rest: Vec<&str> = words.collect();

    match head.to_ascii_lowercase().as_str() {
        "refresh" | "r" => Ok(Input::Send(Command::Refresh)),
        "quit" | "exit" | "q" => Ok(Input::Send(Command::Quit)),
        "help" | "?" => Ok(Input::Help),
        "diag" => Ok(Input::SaveDiagnostics),
        "debug" => match rest.as_slice() {
            [] => Ok(Input::Debug(None)),
            ["on"] => Ok(Input::Debug(Some(true))),
            ["off"] => Ok(Input::Debug(Some(false))),
            _ => Err(ParseError::Usage("debug [on|off]")),
        },
        "dock" => {
            const USAGE: &str = "dock <top|left|right> [monitor]";
            let (edge, monitor) = match rest.as_slice() {
                [edge] => (*edge, None),
                [edge, monitor] => (*edge, Some(monitor.parse::<usize>().map_err(|_| ParseError::Usage(USAGE))?)),
                _ => return Err(ParseError::Usage(USAGE)),
            };
            let edge = DockEdge::parse(edge).ok_or(ParseError::Usage(USAGE))?;
            Ok(Input::Send(Command::Dock { edge, monitor }))
        }
        word => {
            let kind = ActionKind::parse(word).ok_or_else(|| ParseError::Unknown(word.to_string()))?;
            match rest.as_slice() {
                [host, id] => Ok(Input::Send(Command::Action(VmAction::new(VmKey::new(*host, *id), kind)))),
                _ => Err(ParseError::Usage("<action> <host> <vm-id>")),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Quit,
    /// The scheduler is gone.
    Stopped,
    InputClosed,
}

/// Local state the console acts on directly, without going through the
/// scheduler.
pub struct Console {
    pub handle: SchedulerHandle,
    pub config: Arc<ConfigStore>,
    pub diagnostics: DiagnosticsBuffer,
    pub logging: LogSwitch,
}

impl Console {
    /// Read commands until stdin closes or the scheduler stops. Closing stdin
    /// only ends the console; the dock keeps running until interrupted.
    pub async fn run(self) {
        if self.serve(BufReader::new(tokio::io::stdin())).await == Exit::InputClosed {
            tracing::info!("console: stdin closed, commands disabled; interrupt to quit");
        }
    }

    async fn serve<R: AsyncBufRead + Unpin>(&self, input: R) -> Exit {
        let mut lines = input.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Exit::InputClosed,
                Err(e) => {
                    tracing::warn!(error = %e, "console: stdin read failed");
                    return Exit::InputClosed;
                }
            };

            match parse(&line) {
                Ok(Input::Send(command)) => {
                    let quitting = command == Command::Quit;
                    if !self.handle.send(command) {
                        return Exit::Stopped;
                    }
                    if quitting {
                        return Exit::Quit;
                    }
                }
                Ok(Input::Debug(value)) => self.set_debug(value),
                Ok(Input::SaveDiagnostics) => match self.diagnostics.save(self.config.dir()) {
                    Ok(path) => println!("diagnostics saved to {}", path.display()),
                    Err(e) => println!("could not save diagnostics: {e}"),
                },
                Ok(Input::Help) => println!("{HELP}"),
                Err(ParseError::Empty) => {}
                Err(e) => println!("{e}"),
            }
        }
    }

    fn set_debug(&self, value: Option<bool>) {
        let on = value.unwrap_or_else(|| !self.config.flag(Flag::DebugLogging));
        if let Err(e) = self.config.set_flag(Flag::DebugLogging, on) {
            tracing::warn!(error = %e, "console: could not persist debug flag");
        }
        self.logging.set_debug(on);
        tracing::info!(debug = on, "logging: level changed");
    }
}
