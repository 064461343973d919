//! Automation controller - owns the state machine and drives every task.
//!
//! Everything runs on the thread that owns the controller. Control commands
//! from other threads arrive through a [`ControlHandle`] and status goes out
//! through the [`StatusReporter`]. Task failures never escape the
//! controller; they are reported and mapped onto state changes.

use anyhow::Error;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::Duration;

use crate::automation::config::{AutomationConfig, ConfigSource};
use crate::automation::cycle::{CycleOutcome, run_action_cycle};
use crate::automation::docking::{
    DockingMode, DockingProgress, DockingResult, DockingSequencer, DockingStep,
};
use crate::automation::monitor::{MiningState, MiningStateMonitor, MiningTick, SampleWindow};
use crate::automation::scheduler::{Cadence, Scheduler, Task};
use crate::automation::session::Session;
use crate::automation::state::AutomationState;
use crate::automation::status::StatusReporter;
use crate::clock::{Clock, SystemClock};
use crate::error::{ConfigError, InputError, PrivilegeError, ShutdownError};
use crate::platform::Desktop;

/// Commands accepted by [`AutomationController::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Toggle,
    /// Halts everything and returns from `run`.
    Quit,
}

/// Sends control commands to a running controller from any thread.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    sender: Sender<ControlCommand>,
}

impl ControlHandle {
    /// Returns false once the controller has gone away.
    pub fn send(&self, command: ControlCommand) -> bool {
        self.sender.send(command).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(ControlCommand::Start)
    }

    pub fn stop(&self) -> bool {
        self.send(ControlCommand::Stop)
    }

    pub fn toggle(&self) -> bool {
        self.send(ControlCommand::Toggle)
    }

    pub fn quit(&self) -> bool {
        self.send(ControlCommand::Quit)
    }
}

/// Creates a control channel for [`AutomationController::run`].
pub fn control_channel() -> (ControlHandle, Receiver<ControlCommand>) {
    let (sender, receiver) = channel();
    (ControlHandle { sender }, receiver)
}

/// Per-run state, rebuilt from config on every start.
struct ActiveRun {
    config: AutomationConfig,
    monitor: MiningStateMonitor,
    docking: DockingSequencer,
}

pub struct AutomationController {
    desktop: Desktop,
    source: Box<dyn ConfigSource>,
    clock: Rc<dyn Clock>,
    rng: StdRng,
    status: StatusReporter,
    scheduler: Scheduler,
    state: AutomationState,
    active: Option<ActiveRun>,
    /// Stop arrived while docking; honored once the procedure ends.
    stop_requested: bool,
}

impl AutomationController {
    pub fn new(desktop: Desktop, source: Box<dyn ConfigSource>, status: StatusReporter) -> Self {
        Self {
            desktop,
            source,
            clock: Rc::new(SystemClock::new()),
            rng: StdRng::from_entropy(),
            status,
            scheduler: Scheduler::new(),
            state: AutomationState::Idle,
            active: None,
            stop_requested: false,
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Makes every random draw reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> AutomationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Mining state of the current run, if one was started.
    pub fn mining_state(&self) -> Option<MiningState> {
        self.active.as_ref().map(|active| active.monitor.state())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Validates config and schedules both cycles.
    ///
    /// A no-op while running. A config error is reported once and leaves
    /// the controller Idle with nothing scheduled.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        if self.state == AutomationState::ShutdownPending {
            self.status.warn("Shutdown already requested - not starting");
            return Ok(());
        }
        if self.state.is_running() {
            return Ok(());
        }

        let config = match AutomationConfig::from_source(self.source.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                self.status.error(format!("Invalid configuration: {}", e));
                return Err(e);
            }
        };

        let tuning = &config.tuning;
        let window = SampleWindow::with_tolerance(tuning.sample_window, tuning.color_tolerance);
        let monitor = MiningStateMonitor::new(config.mining_point, window);
        let docking = DockingSequencer::new(
            tuning.docking,
            config.dock_button,
            config.verification_point,
            tuning.color_tolerance,
        );
        tracing::info!(
            interval = ?config.loop_interval,
            mining_point = %config.mining_point,
            "Starting automation"
        );

        self.active = Some(ActiveRun {
            config,
            monitor,
            docking,
        });
        self.stop_requested = false;
        self.scheduler.cancel_all();
        self.schedule_cycles();
        self.transition(AutomationState::Running);
        self.status.info("Running");
        Ok(())
    }

    /// Halts both cycles. During docking the stop is deferred until the
    /// procedure reaches its final branch.
    pub fn stop(&mut self) {
        match self.state {
            AutomationState::Idle | AutomationState::ShutdownPending => {}
            AutomationState::Docking => {
                self.stop_requested = true;
                self.status.info("Stop requested - finishing docking first");
            }
            _ => self.halt_to_idle(),
        }
    }

    pub fn toggle(&mut self) -> Result<(), ConfigError> {
        if self.state.is_running() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Runs every task that is due now. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(self.clock.now()) {
            tracing::debug!(?task, state = %self.state, "Dispatching");
            self.dispatch(task);
            let now = self.clock.now();
            self.scheduler.rearm(task, now, &mut self.rng);
            ran += 1;
        }
        ran
    }

    /// Runs tasks for `duration` of clock time, sleeping between them.
    pub fn run_for(&mut self, duration: Duration) {
        let deadline = self.clock.now() + duration;
        loop {
            self.run_pending();
            let now = self.clock.now();
            match self.scheduler.next_due() {
                Some(due) if due <= deadline => {
                    if due > now {
                        self.clock.sleep(due - now);
                    }
                }
                _ => {
                    if deadline > now {
                        self.clock.sleep(deadline - now);
                    }
                    return;
                }
            }
        }
    }

    /// Serves control commands and due tasks until `Quit` or until every
    /// [`ControlHandle`] is dropped.
    ///
    /// Waits on the channel between tasks, so it needs a clock that moves
    /// with wall time.
    pub fn run(&mut self, commands: &Receiver<ControlCommand>) {
        loop {
            self.run_pending();

            let received = match self.scheduler.next_due() {
                Some(due) => commands.recv_timeout(due.saturating_sub(self.clock.now())),
                None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(ControlCommand::Quit) => {
                    if self.state.is_running() {
                        self.halt_to_idle();
                    }
                    return;
                }
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("Control channel closed");
                    return;
                }
            }
        }
    }

    fn handle(&mut self, command: ControlCommand) {
        let result = match command {
            ControlCommand::Start => self.start(),
            ControlCommand::Toggle => self.toggle(),
            ControlCommand::Stop => {
                self.stop();
                Ok(())
            }
            ControlCommand::Quit => Ok(()),
        };
        if let Err(e) = result {
            tracing::debug!("{:?} refused: {}", command, e);
        }
    }

    fn dispatch(&mut self, task: Task) {
        match task {
            Task::ActionCycle => self.action_tick(),
            Task::MiningCheck => self.mining_tick(),
            Task::Docking(step) => self.docking_step(step),
        }
    }

    fn schedule_cycles(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let interval = active.config.loop_interval;
        let check = active.config.tuning.mining_check;
        let now = self.clock.now();

        self.scheduler.start_periodic(
            Task::ActionCycle,
            Cadence::Fixed(interval),
            now,
            Duration::ZERO,
        );
        let first_check = check.sample(&mut self.rng);
        self.scheduler.start_periodic(
            Task::MiningCheck,
            Cadence::Jittered {
                min: check.min(),
                max: check.max(),
            },
            now,
            first_check,
        );
    }

    fn action_tick(&mut self) {
        if !self.state.is_cycling() {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let tuning = &active.config.tuning;
        let mut session = Session::new(
            &self.desktop,
            self.clock.as_ref(),
            &mut self.rng,
            &self.status,
            tuning.pacing,
            tuning.motion,
        );
        let result = run_action_cycle(&mut session, &active.config, active.monitor.state());
        self.finish_action_cycle(result);
    }

    fn finish_action_cycle(&mut self, result: Result<CycleOutcome, InputError>) {
        match result {
            Ok(CycleOutcome::Compressed) | Ok(CycleOutcome::Dismissed) => {}
            Ok(CycleOutcome::Escalate) => self.request_shutdown(),
            Err(e) => {
                self.status.error(format!("Automation error: {}", e));
                self.halt_to_idle();
            }
        }
    }

    fn mining_tick(&mut self) {
        if !self.state.is_cycling() {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        match active.monitor.tick(self.desktop.capture.as_ref()) {
            Err(e) => self.status.error(format!("Color check error: {}", e)),
            Ok(MiningTick::Active(color)) => {
                tracing::debug!(%color, "Mining indicator changed");
                self.transition(AutomationState::MiningActive);
            }
            Ok(MiningTick::Stopped(_)) => {}
            Ok(MiningTick::Stalled(color)) => {
                tracing::debug!(%color, "Mining indicator stalled");
                self.status.warn("Mining stopped - initiating docking");
                self.transition(AutomationState::MiningStopped);
                self.scheduler.stop_periodic(Task::ActionCycle);
                self.begin_docking();
            }
        }
    }

    fn begin_docking(&mut self) {
        self.transition(AutomationState::Docking);
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let tuning = &active.config.tuning;
        let mut session = Session::new(
            &self.desktop,
            self.clock.as_ref(),
            &mut self.rng,
            &self.status,
            tuning.pacing,
            tuning.motion,
        );
        let result = active.docking.begin(&mut session, &mut self.scheduler);
        self.advance_docking(result);
    }

    fn docking_step(&mut self, step: DockingStep) {
        if self.state != AutomationState::Docking {
            tracing::debug!(?step, state = %self.state, "Ignoring stale docking step");
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let tuning = &active.config.tuning;
        let mut session = Session::new(
            &self.desktop,
            self.clock.as_ref(),
            &mut self.rng,
            &self.status,
            tuning.pacing,
            tuning.motion,
        );
        let result = active.docking.resume(step, &mut session, &mut self.scheduler);
        self.advance_docking(result);
    }

    fn advance_docking(&mut self, result: anyhow::Result<DockingProgress>) {
        match result {
            Ok(DockingProgress::AlreadyInFlight) | Ok(DockingProgress::Waiting(_)) => {}
            Ok(DockingProgress::Finished(DockingResult::Docked(_))) => {
                self.status.info("Docking successful - stopping automation");
                self.request_shutdown();
            }
            Ok(DockingProgress::Finished(DockingResult::Unconfirmed(_))) => {
                self.status.warn("Docking failed - initiating shutdown");
                self.request_shutdown();
            }
            Ok(DockingProgress::Finished(DockingResult::ClickedUnverified)) => {
                self.resume_after_docking();
            }
            Err(e) => self.docking_failed(e),
        }
    }

    fn docking_failed(&mut self, e: Error) {
        self.status.error(format!("Docking error: {:#}", e));
        self.scheduler
            .cancel_matching(|task| matches!(task, Task::Docking(_)));

        let mode = match self.active.as_mut() {
            Some(active) => {
                active.docking.abandon();
                active.monitor.reset();
                active.docking.mode()
            }
            None => DockingMode::Verified,
        };

        match mode {
            DockingMode::ClickOnly => self.resume_after_docking(),
            DockingMode::Verified => self.halt_to_idle(),
        }
    }

    fn resume_after_docking(&mut self) {
        if self.stop_requested {
            self.halt_to_idle();
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.monitor.reset();
        }
        self.schedule_cycles();
        self.transition(AutomationState::Running);
        self.status.info("Resuming automation");
    }

    /// Halts everything, then asks the power collaborator to shut down.
    fn request_shutdown(&mut self) {
        self.halt();
        self.status.info("Shutting down...");

        if !self.desktop.power.is_elevated() {
            self.shutdown_denied(PrivilegeError);
            return;
        }
        match self.desktop.power.request_shutdown() {
            Ok(()) => self.transition(AutomationState::ShutdownPending),
            Err(ShutdownError::Privilege(e)) => self.shutdown_denied(e),
            Err(e) => {
                self.status.error(format!("Shutdown failed: {}", e));
                self.transition(AutomationState::Idle);
            }
        }
    }

    fn shutdown_denied(&mut self, e: PrivilegeError) {
        self.status.warn(format!("{} - automation stopped", e));
        self.transition(AutomationState::Idle);
    }

    fn halt(&mut self) {
        self.scheduler.cancel_all();
        self.stop_requested = false;
        if let Some(active) = self.active.as_mut() {
            active.docking.abandon();
            active.monitor.reset();
        }
    }

    fn halt_to_idle(&mut self) {
        self.halt();
        self.transition(AutomationState::Idle);
        self.status.info("Stopped");
    }

    fn transition(&mut self, next: AutomationState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            tracing::warn!("Refusing state change {} -> {}", self.state, next);
            return;
        }
        tracing::info!("State: {} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::JsonConfigSource;
    use crate::automation::status::{StatusLevel, StatusMessage, drain, status_channel};
    use crate::capture::ColorSample;
    use crate::clock::VirtualClock;
    use crate::geometry::ScreenPoint;
    use crate::platform::KeyCommand;
    use crate::testing::{FakePower, Fakes, InputEvent};
    use serde_json::{Value, json};

    const MINING: ScreenPoint = ScreenPoint::new(960, 1010);
    const RED: ColorSample = ColorSample::new(200, 30, 30);
    const GREEN: ColorSample = ColorSample::new(30, 200, 30);

    fn config_json() -> Value {
        json!({
            "selection_box_top_left_x": 100,
            "selection_box_top_left_y": 200,
            "selection_box_bottom_right_x": 300,
            "selection_box_bottom_right_y": 260,
            "dock_button_top_left_x": 1500,
            "dock_button_top_left_y": 80,
            "dock_button_bottom_right_x": 1560,
            "dock_button_bottom_right_y": 110,
            "mining_module_x": MINING.x,
            "mining_module_y": MINING.y,
            "loop_interval_seconds": "10",
            "tuning": { "sample_window": 3 }
        })
    }

    struct Harness {
        fakes: Fakes,
        clock: Rc<VirtualClock>,
        controller: AutomationController,
        receiver: Receiver<StatusMessage>,
    }

    impl Harness {
        fn new(fakes: Fakes, config: Value) -> Self {
            let clock = Rc::new(VirtualClock::new());
            let (status, receiver) = status_channel();
            let source = JsonConfigSource::from_value(config).unwrap();
            let controller = AutomationController::new(fakes.desktop(), Box::new(source), status)
                .with_clock(clock.clone())
                .with_seed(42);
            Self {
                fakes,
                clock,
                controller,
                receiver,
            }
        }

        fn standard() -> Self {
            Self::new(Fakes::new(), config_json())
        }

        fn messages(&self) -> Vec<StatusMessage> {
            drain(&self.receiver)
        }

        /// Runs in small slices until `done` holds or `limit` passes.
        fn run_until_state(&mut self, done: impl Fn(AutomationState) -> bool, limit: Duration) {
            let deadline = self.clock.now() + limit;
            while !done(self.controller.state()) && self.clock.now() < deadline {
                self.controller.run_for(Duration::from_millis(250));
            }
        }

        fn run_until_docking(&mut self) {
            self.run_until_state(|s| s == AutomationState::Docking, Duration::from_secs(60));
        }

        fn run_while_docking(&mut self) {
            self.run_until_state(|s| s != AutomationState::Docking, Duration::from_secs(120));
        }

        fn retreats(&self) -> usize {
            self.fakes.input.count(InputEvent::Keys(KeyCommand::Retreat))
        }
    }

    fn texts(messages: &[StatusMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn test_start_and_stop() {
        let mut h = Harness::standard();

        h.controller.start().unwrap();
        assert_eq!(h.controller.state(), AutomationState::Running);
        assert!(h.controller.scheduler().is_active(Task::ActionCycle));
        assert!(h.controller.scheduler().is_active(Task::MiningCheck));

        // Second start is a no-op
        h.controller.start().unwrap();
        assert_eq!(texts(&h.messages()), vec!["Running"]);

        h.controller.stop();
        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert!(h.controller.scheduler().is_idle());

        h.controller.stop();
        assert_eq!(texts(&h.messages()), vec!["Stopped"]);

        h.controller.toggle().unwrap();
        assert!(h.controller.is_running());
        h.controller.toggle().unwrap();
        assert!(!h.controller.is_running());
    }

    #[test]
    fn test_bad_loop_interval_blocks_start() {
        let mut config = config_json();
        config["loop_interval_seconds"] = json!("abc");
        let mut h = Harness::new(Fakes::new(), config);

        let err = h.controller.start().unwrap_err();
        assert!(matches!(err, ConfigError::NotNumeric { .. }));
        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert!(h.controller.scheduler().is_idle());

        let messages = h.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, StatusLevel::Error);

        h.controller.run_for(Duration::from_secs(30));
        assert!(h.fakes.input.events().is_empty());
    }

    #[test]
    fn test_changing_indicator_keeps_mining() {
        let mut h = Harness::standard();
        h.fakes
            .screen
            .script(MINING, [RED, GREEN].into_iter().cycle().take(200));

        h.controller.start().unwrap();
        h.controller.run_for(Duration::from_secs(60));

        assert_eq!(h.controller.state(), AutomationState::MiningActive);
        assert_eq!(h.controller.mining_state(), Some(MiningState::Active));
        assert_eq!(h.retreats(), 0);
        assert!(h.fakes.input.count(InputEvent::SecondaryClick) >= 3);
    }

    #[test]
    fn test_stall_starts_docking_once() {
        let mut h = Harness::standard();

        h.controller.start().unwrap();
        h.run_until_docking();

        assert_eq!(h.controller.state(), AutomationState::Docking);
        assert_eq!(h.controller.mining_state(), Some(MiningState::Stopped));
        assert_eq!(h.retreats(), 1);
        assert!(!h.controller.scheduler().is_active(Task::ActionCycle));
        assert!(!h.controller.scheduler().is_active(Task::MiningCheck));
        assert!(
            texts(&h.messages()).contains(&"Mining stopped - initiating docking")
        );

        // The screen never changes, so verification fails and shuts down anyway
        h.run_while_docking();
        assert_eq!(h.controller.state(), AutomationState::ShutdownPending);
        assert_eq!(h.retreats(), 1);
        assert_eq!(h.fakes.power.shutdown_requests(), 1);
        assert!(h.controller.scheduler().is_idle());

        let texts = texts(&h.messages()).join("\n");
        assert!(texts.contains("Docking initiated"));
        assert!(texts.contains("Docking failed - initiating shutdown"));
        assert!(texts.contains("Shutting down..."));

        // Terminal
        h.controller.start().unwrap();
        assert_eq!(h.controller.state(), AutomationState::ShutdownPending);
    }

    #[test]
    fn test_docking_success_shuts_down() {
        let mut config = config_json();
        config["verification_point_x"] = json!(40);
        config["verification_point_y"] = json!(50);
        let mut h = Harness::new(Fakes::new(), config);
        h.fakes
            .screen
            .script(ScreenPoint::new(40, 50), [ColorSample::new(0, 90, 255)]);

        h.controller.start().unwrap();
        h.run_until_docking();
        h.run_while_docking();

        assert_eq!(h.controller.state(), AutomationState::ShutdownPending);
        assert_eq!(h.fakes.power.shutdown_requests(), 1);
        assert!(
            texts(&h.messages()).contains(&"Docking successful - stopping automation")
        );
    }

    #[test]
    fn test_stop_during_docking_lets_procedure_finish() {
        let mut h = Harness::standard();

        h.controller.start().unwrap();
        h.run_until_docking();
        assert_eq!(h.controller.state(), AutomationState::Docking);

        h.controller.stop();
        assert_eq!(h.controller.state(), AutomationState::Docking);
        assert!(
            h.controller
                .scheduler()
                .is_active(Task::Docking(DockingStep::ClickDock))
        );

        h.run_while_docking();
        assert!(h.fakes.input.count(InputEvent::PrimaryClick) > 0);
        assert_eq!(h.controller.state(), AutomationState::ShutdownPending);
    }

    #[test]
    fn test_unprivileged_shutdown_degrades_to_idle() {
        let fakes = Fakes {
            power: FakePower::unprivileged(),
            ..Fakes::new()
        };
        let mut h = Harness::new(fakes, config_json());

        h.controller.start().unwrap();
        h.run_until_docking();
        h.run_while_docking();

        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert_eq!(h.fakes.power.shutdown_requests(), 0);
        assert!(h.controller.scheduler().is_idle());
        let messages = h.messages();
        let warning = messages
            .iter()
            .filter(|m| m.level == StatusLevel::Warning)
            .find(|m| m.text.contains("administrator"));
        assert!(warning.is_some());
    }

    #[test]
    fn test_refused_shutdown_request_degrades_to_idle() {
        let mut h = Harness::standard();
        h.fakes.power.deny_requests();

        h.controller.start().unwrap();
        h.run_until_docking();
        h.run_while_docking();

        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert_eq!(h.fakes.power.shutdown_requests(), 0);
        let messages = h.messages();
        assert!(messages.iter().any(|m| {
            m.level == StatusLevel::Warning && m.text.contains("administrator")
        }));
        assert!(!messages.iter().any(|m| m.level == StatusLevel::Error));
    }

    #[test]
    fn test_failed_shutdown_request_is_reported() {
        let mut h = Harness::standard();
        h.fakes.power.fail_requests();

        h.controller.start().unwrap();
        h.run_until_docking();
        h.run_while_docking();

        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert!(
            h.messages()
                .iter()
                .any(|m| m.level == StatusLevel::Error && m.text.starts_with("Shutdown failed"))
        );
    }

    #[test]
    fn test_input_failure_stops_automation() {
        let mut h = Harness::standard();
        h.fakes.input.fail_after(5);

        h.controller.start().unwrap();
        h.controller.run_for(Duration::from_secs(1));

        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert!(h.controller.scheduler().is_idle());
        let messages = h.messages();
        assert!(
            messages
                .iter()
                .any(|m| m.level == StatusLevel::Error && m.text.starts_with("Automation error"))
        );

        // No retry on later ticks
        h.controller.run_for(Duration::from_secs(60));
        assert_eq!(h.fakes.input.events().len(), 5);
    }

    #[test]
    fn test_capture_errors_are_reported_and_retried() {
        let mut h = Harness::standard();
        h.fakes.screen.fail_captures(true);

        h.controller.start().unwrap();
        h.controller.run_for(Duration::from_secs(30));

        assert_eq!(h.controller.state(), AutomationState::Running);
        assert!(h.controller.scheduler().is_active(Task::MiningCheck));
        let errors = h
            .messages()
            .iter()
            .filter(|m| m.text.starts_with("Color check error"))
            .count();
        assert!(errors >= 2, "only {} color check errors", errors);
        // The OCR gate fails open, so the action cycle keeps compressing
        assert!(h.fakes.input.count(InputEvent::SecondaryClick) >= 2);
    }

    #[test]
    fn test_verification_capture_error_goes_idle() {
        let mut h = Harness::standard();

        h.controller.start().unwrap();
        h.run_until_docking();
        assert_eq!(h.controller.state(), AutomationState::Docking);

        h.fakes.screen.fail_captures(true);
        h.run_while_docking();

        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert_eq!(h.controller.mining_state(), Some(MiningState::Active));
        assert_eq!(h.fakes.power.shutdown_requests(), 0);
        assert!(h.controller.scheduler().is_idle());
        assert!(
            h.messages()
                .iter()
                .any(|m| m.text.starts_with("Docking error: Failed to sample verification color"))
        );
    }

    #[test]
    fn test_click_only_docking_resumes() {
        let mut config = config_json();
        config["tuning"]["docking"] = json!({ "mode": "click_only" });
        let mut h = Harness::new(Fakes::new(), config);

        h.controller.start().unwrap();
        h.run_until_docking();
        assert_eq!(h.controller.state(), AutomationState::Docking);
        h.run_while_docking();

        // The first mining check may already have moved Running to MiningActive
        assert!(h.controller.state().is_cycling());
        assert_eq!(h.controller.mining_state(), Some(MiningState::Active));
        assert!(h.controller.scheduler().is_active(Task::ActionCycle));
        assert!(h.controller.scheduler().is_active(Task::MiningCheck));
        assert_eq!(h.fakes.power.shutdown_requests(), 0);
        assert!(texts(&h.messages()).contains(&"Resuming automation"));
    }

    #[test]
    fn test_click_only_honors_stop_after_docking() {
        let mut config = config_json();
        config["tuning"]["docking"] = json!({ "mode": "click_only" });
        let mut h = Harness::new(Fakes::new(), config);

        h.controller.start().unwrap();
        h.run_until_docking();
        h.controller.stop();
        h.run_while_docking();

        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert!(h.controller.scheduler().is_idle());
    }

    #[test]
    fn test_run_serves_control_commands() {
        let mut h = Harness::standard();
        let (handle, commands) = control_channel();

        assert!(handle.start());
        assert!(handle.quit());
        h.controller.run(&commands);

        assert_eq!(h.controller.state(), AutomationState::Idle);
        assert!(h.controller.scheduler().is_idle());
        // The action cycle ran once between start and quit
        assert!(h.fakes.input.count(InputEvent::SecondaryClick) >= 1);
        assert_eq!(texts(&h.messages()).last(), Some(&"Stopped"));

        drop(commands);
        assert!(!handle.stop());
    }
}
