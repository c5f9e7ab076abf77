//! Event loop driving the controller.
//!
//! Timer ticks, manual refreshes, action follow-ups and user commands all
//! land here and run one at a time against the controller, so a cycle never
//! overlaps another. Refresh requests that pile up while a cycle runs are
//! folded into one.

use std::collections::VecDeque;
use std::future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};

use crate::actions::VmAction;
use crate::config::DockEdge;
use crate::controller::Controller;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Action(VmAction),
    Dock {
        edge: DockEdge,
        monitor: Option<usize>,
    },
    Quit,
}

/// Cheap, cloneable sender for [`Command`]s.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Returns false once the loop has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn refresh(&self) -> bool {
        self.send(Command::Refresh)
    }

    pub fn quit(&self) -> bool {
        self.send(Command::Quit)
    }
}

pub struct Scheduler {
    rx: mpsc::UnboundedReceiver<Command>,
    backlog: VecDeque<Command>,
}

pub fn channel() -> (SchedulerHandle, Scheduler) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        SchedulerHandle { tx },
        Scheduler {
            rx,
            backlog: VecDeque::new(),
        },
    )
}

enum Event {
    Command(Command),
    Tick,
    FollowUp,
    Closed,
}

impl Scheduler {
    /// Show the window, then serve events until `Quit` or every handle is
    /// dropped. The reservation is released on the way out.
    pub async fn run(mut self, controller: &mut Controller) {
        let startup = controller.show();

        let mut follow_up: Option<Pin<Box<Sleep>>> = startup
            .first_refresh
            .map(|delay| Box::pin(tokio::time::sleep(delay)));
        let mut timer: Option<Interval> = startup.poll_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            let event = match self.backlog.pop_front() {
                Some(command) => Event::Command(command),
                None => tokio::select! {
                    command = self.rx.recv() => command.map_or(Event::Closed, Event::Command),
                    _ = tick(&mut timer) => Event::Tick,
                    _ = fire(&mut follow_up) => Event::FollowUp,
                },
            };

            match event {
                Event::FollowUp => {
                    follow_up = None;
                    self.cycle(controller, timer.as_mut()).await;
                }
                Event::Command(Command::Refresh) | Event::Tick => {
                    self.cycle(controller, timer.as_mut()).await;
                }
                Event::Command(Command::Action(action)) => {
                    let outcome = controller.perform(action).await;
                    if let Some(delay) = outcome.follow_up {
                        tracing::debug!(?delay, "scheduler: follow-up refresh scheduled");
                        follow_up = Some(Box::pin(tokio::time::sleep(delay)));
                    }
                }
                Event::Command(Command::Dock { edge, monitor }) => {
                    if let Err(e) = controller.apply_layout_change(edge, monitor) {
                        tracing::warn!(error = %e, "scheduler: could not apply dock change");
                    }
                }
                Event::Command(Command::Quit) | Event::Closed => break,
            }
        }

        controller.close();
        tracing::info!("scheduler: stopped");
    }

    /// Run one refresh and restart the poll period from its end.
    async fn cycle(&mut self, controller: &mut Controller, timer: Option<&mut Interval>) {
        self.absorb_pending_refreshes();
        controller.refresh().await;
        if let Some(timer) = timer {
            timer.reset();
        }
    }

    /// Drop queued refreshes; the cycle about to run covers them. Anything
    /// else keeps its place in line.
    fn absorb_pending_refreshes(&mut self) {
        self.backlog.retain(|c| *c != Command::Refresh);
        while let Ok(command) = self.rx.try_recv() {
            if command != Command::Refresh {
                self.backlog.push_back(command);
            }
        }
    }
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

async fn fire(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}
