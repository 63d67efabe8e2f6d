//! Screen state machine.
//!
//! The controller owns everything a measurement cycle touches: the current
//! screen, its button bindings, the scheduler, the serial channel, the
//! capture sink and the captures taken so far. The device loop drives it
//! with two calls:
//!
//! - [`Controller::handle_button`] for every accepted press,
//! - [`Controller::tick`] on every loop iteration, which runs the timers
//!   and serial polls that are due.
//!
//! Every transition goes through [`Controller::transition`], which clears
//! the old bindings, bumps the scheduler epoch (cancelling the old screen's
//! timers and polls), installs the new screen with its bindings and then
//! schedules whatever the new screen waits for. Only one serial poll is
//! ever live, because each screen schedules at most one.

use super::bindings::{Action, HandlerBinding};
use super::scheduler::{Scheduler, Task};
use super::{ButtonEvent, HomeItem, Screen, ScreenState};
use crate::acquisition::{
    parse_ambient, AcquisitionChannel, CapturePhase, Command, Protocol, SweepCapture, Transport,
};
use crate::analysis::Analyzer;
use crate::config::{Timing, PROGRESS_FULL_PERMILLE};
use crate::error::MalformedCapture;
use crate::storage::CaptureSink;
use tracing::{debug, error, info, trace, warn};

/// Captures of the measurement cycle in progress.
#[derive(Default)]
struct Session {
    initial: Option<SweepCapture>,
    normal: Option<SweepCapture>,
}

pub struct Controller<T, S> {
    screen: Screen,
    bindings: HandlerBinding,
    scheduler: Scheduler,
    channel: AcquisitionChannel<T>,
    sink: S,
    analyzer: Analyzer,
    timing: Timing,
    session: Session,
}

impl<T: Transport, S: CaptureSink> Controller<T, S> {
    /// Start on the boot splash at time `now_ms`.
    pub fn new(
        channel: AcquisitionChannel<T>,
        sink: S,
        analyzer: Analyzer,
        timing: Timing,
        now_ms: u64,
    ) -> Self {
        let mut controller = Self {
            screen: Screen::Boot,
            bindings: HandlerBinding::empty(),
            scheduler: Scheduler::new(),
            channel,
            sink,
            analyzer,
            timing,
            session: Session::default(),
        };
        controller.enter(now_ms);
        controller
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn state(&self) -> ScreenState {
        self.screen.state()
    }

    pub fn bindings(&self) -> &HandlerBinding {
        &self.bindings
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn initial_capture(&self) -> Option<&SweepCapture> {
        self.session.initial.as_ref()
    }

    pub fn normal_capture(&self) -> Option<&SweepCapture> {
        self.session.normal.as_ref()
    }

    pub fn channel(&self) -> &AcquisitionChannel<T> {
        &self.channel
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Take the serial channel and sink back (used on shutdown).
    pub fn into_parts(self) -> (AcquisitionChannel<T>, S) {
        (self.channel, self.sink)
    }

    /// Dispatch a debounced press to the current screen's binding.
    ///
    /// Presses on unbound buttons are dropped.
    pub fn handle_button(&mut self, event: ButtonEvent) {
        match self.bindings.action_for(event.button) {
            Some(action) => {
                debug!("ui: {} -> {:?} on {:?}", event.button.name(), action, self.state());
                self.perform(action, event.at_ms);
            }
            None => trace!("ui: {} unbound on {:?}", event.button.name(), self.state()),
        }
    }

    /// Run every timer and poll due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        while let Some(task) = self.scheduler.pop_due(now_ms) {
            self.run(task, now_ms);
        }
    }

    fn perform(&mut self, action: Action, now_ms: u64) {
        match action {
            Action::FocusNext => {
                if let Screen::Home { focus } = &mut self.screen {
                    *focus = focus.next();
                }
            }
            Action::FocusBack => match &mut self.screen {
                Screen::MeasurementResult { back_focused, .. }
                | Screen::MeasurementFailed { back_focused, .. }
                | Screen::TemperatureResult { back_focused, .. } => *back_focused = true,
                _ => {}
            },
            Action::Confirm => self.confirm(now_ms),
        }
    }

    fn confirm(&mut self, now_ms: u64) {
        match self.screen {
            Screen::Home { focus } => match focus {
                HomeItem::NewMeasurement => {
                    if self.begin_exchange(Command::InitStart) {
                        self.session = Session::default();
                        self.transition(
                            Screen::Loading {
                                progress_permille: 0,
                                capturing: false,
                            },
                            now_ms,
                        );
                    }
                }
                HomeItem::Temperature => {
                    if self.begin_exchange(Command::Temp) {
                        self.transition(Screen::TemperatureLoading, now_ms);
                    }
                }
                HomeItem::TurnOff => self.transition(Screen::Blank, now_ms),
            },
            Screen::Examination => {
                if self.send(Command::Start) {
                    self.discard_input();
                    self.transition(
                        Screen::Countdown {
                            remaining: self.timing.countdown_start,
                            capturing: false,
                        },
                        now_ms,
                    );
                }
            }
            Screen::MeasurementResult { back_focused, .. }
            | Screen::MeasurementFailed { back_focused, .. }
            | Screen::TemperatureResult { back_focused, .. } => {
                if back_focused {
                    self.session = Session::default();
                    self.transition(Screen::home(), now_ms);
                }
            }
            _ => {}
        }
    }

    /// Start a new request/response exchange.
    ///
    /// Lines left over from an earlier exchange (surplus or rejected
    /// responses) are dropped first so they cannot answer this one.
    fn begin_exchange(&mut self, command: Command) -> bool {
        self.discard_input();
        self.send(command)
    }

    fn discard_input(&mut self) {
        if let Err(e) = self.channel.discard_input() {
            warn!("serial: could not flush input: {}", e);
        }
    }

    /// Write a command; on failure stay put so the user can retry.
    fn send(&mut self, command: Command) -> bool {
        match self.channel.send(command) {
            Ok(()) => true,
            Err(e) => {
                error!("serial: {:?} not sent: {}", command, e);
                false
            }
        }
    }

    fn run(&mut self, task: Task, now_ms: u64) {
        debug!("scheduler: {:?} on {:?}", task, self.state());
        match task {
            Task::BootDone | Task::BlankDone => self.transition(Screen::home(), now_ms),
            Task::ProgressStep => self.progress_step(now_ms),
            Task::CountdownStep => self.countdown_step(now_ms),
            Task::PollSweep(phase) => self.poll_sweep(phase, now_ms),
            Task::PollTemperature => self.poll_temperature(now_ms),
        }
    }

    fn progress_step(&mut self, now_ms: u64) {
        let Screen::Loading {
            progress_permille,
            capturing,
        } = &mut self.screen
        else {
            return;
        };
        *progress_permille =
            (*progress_permille + self.timing.progress_step_permille).min(PROGRESS_FULL_PERMILLE);
        if *progress_permille >= PROGRESS_FULL_PERMILLE {
            *capturing = true;
            self.scheduler
                .schedule(now_ms, 0, Task::PollSweep(CapturePhase::Initial));
        } else {
            self.scheduler
                .schedule(now_ms, self.timing.progress_tick_ms.max(1), Task::ProgressStep);
        }
    }

    fn countdown_step(&mut self, now_ms: u64) {
        let Screen::Countdown {
            remaining,
            capturing,
        } = &mut self.screen
        else {
            return;
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            *capturing = true;
            self.scheduler
                .schedule(now_ms, 0, Task::PollSweep(CapturePhase::Normal));
        } else {
            self.scheduler
                .schedule(now_ms, self.timing.countdown_tick_ms.max(1), Task::CountdownStep);
        }
    }

    /// Read `protocol`'s response if complete, otherwise poll again later.
    fn read_or_reschedule(
        &mut self,
        protocol: Protocol,
        retry: Task,
        now_ms: u64,
    ) -> Option<Vec<String>> {
        match self.channel.try_read_block(protocol.line_count()) {
            Ok(Some(lines)) => return Some(lines),
            Ok(None) => {}
            Err(e) => warn!("serial: read failed while waiting for {:?}: {}", protocol, e),
        }
        self.scheduler
            .schedule(now_ms, self.timing.serial_poll_ms.max(1), retry);
        None
    }

    fn poll_sweep(&mut self, phase: CapturePhase, now_ms: u64) {
        let Some(lines) = self.read_or_reschedule(phase.protocol(), Task::PollSweep(phase), now_ms)
        else {
            return;
        };

        let capture = match SweepCapture::from_lines(&lines) {
            Ok(capture) => capture,
            Err(reason) => {
                error!("acquisition: {:?} sweep rejected: {}", phase, reason);
                self.fail(reason, now_ms);
                return;
            }
        };
        info!(
            "acquisition: {:?} sweep, {} samples/channel",
            phase,
            capture.samples()
        );
        if let Err(e) = self.sink.persist(phase, &capture) {
            error!("{}", e);
        }

        match phase {
            CapturePhase::Initial => {
                self.session.initial = Some(capture);
                self.transition(Screen::Examination, now_ms);
            }
            CapturePhase::Normal => {
                self.session.normal = Some(capture);
                self.score(now_ms);
            }
        }
    }

    fn score(&mut self, now_ms: u64) {
        let outcome = match (&self.session.initial, &self.session.normal) {
            (Some(initial), Some(normal)) => self.analyzer.quality_diff(initial, normal),
            _ => Err(MalformedCapture::MissingBaseline),
        };
        match outcome {
            Ok(result) => {
                info!(
                    "analysis: quality {:?} (magnitude {:?})",
                    result.phase, result.magnitude
                );
                self.transition(
                    Screen::MeasurementResult {
                        result,
                        back_focused: true,
                    },
                    now_ms,
                );
            }
            Err(reason) => {
                error!("analysis: {}", reason);
                self.fail(reason, now_ms);
            }
        }
    }

    fn fail(&mut self, reason: MalformedCapture, now_ms: u64) {
        self.session = Session::default();
        self.transition(
            Screen::MeasurementFailed {
                reason,
                back_focused: true,
            },
            now_ms,
        );
    }

    fn poll_temperature(&mut self, now_ms: u64) {
        let Some(lines) =
            self.read_or_reschedule(Protocol::Temperature, Task::PollTemperature, now_ms)
        else {
            return;
        };
        let ambient = parse_ambient(&lines[0]);
        info!(
            "acquisition: temperature {} humidity {:?}",
            ambient.temperature, ambient.humidity
        );
        self.transition(
            Screen::TemperatureResult {
                ambient,
                back_focused: true,
            },
            now_ms,
        );
    }

    /// Replace the current screen.
    fn transition(&mut self, next: Screen, now_ms: u64) {
        let from = self.state();
        self.bindings = HandlerBinding::empty();
        self.scheduler.advance_epoch();
        self.screen = next;
        self.bindings = HandlerBinding::for_screen(&self.screen);
        info!("ui: {:?} -> {:?}", from, self.state());
        self.enter(now_ms);
    }

    /// Schedule what the current screen is waiting for.
    fn enter(&mut self, now_ms: u64) {
        let (after_ms, task) = match self.screen {
            Screen::Boot => (self.timing.boot_splash_ms, Task::BootDone),
            Screen::Blank => (self.timing.blank_screen_ms, Task::BlankDone),
            Screen::Loading { .. } => (self.timing.progress_tick_ms.max(1), Task::ProgressStep),
            Screen::Countdown { .. } => (self.timing.countdown_tick_ms.max(1), Task::CountdownStep),
            Screen::TemperatureLoading => (0, Task::PollTemperature),
            _ => return,
        };
        self.scheduler.schedule(now_ms, after_ms, task);
    }
}
