//! Polling driver
//!
//! Owns an [`Engine`] and drives it from a tokio task: a regular poll on
//! every tick, a full poll every `full_update_every` ticks, and write or
//! command requests from a [`DriverHandle`] in between. Requests are
//! serialized with polls, so the engine never sees two calls at once.

use crate::config::PollConfig;
use crate::engine::{Engine, PollKind};
use crate::error::{BridgeError, Result};
use crate::logging::{StructuredLogger, get_device_logger};
use crate::store::StateStore;
use crate::transfer::TransferMode;
use crate::transport::RawValueSource;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, interval_at};

/// Main driver state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverState {
    /// Driver is initializing
    Initializing,
    /// Driver is polling
    Running,
    /// Driver is shutting down
    ShuttingDown,
}

/// Requests accepted by the driver
#[derive(Debug)]
pub enum DriverCommand {
    SetVariable {
        name: String,
        value: String,
        reply: oneshot::Sender<Result<()>>,
    },
    InstantCommand {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Run a full poll out of schedule
    FullRefresh,
    Shutdown,
}

/// Cloneable sender side of a running driver
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::UnboundedSender<DriverCommand>,
}

impl DriverHandle {
    fn send(&self, command: DriverCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| BridgeError::generic("driver is not running"))
    }

    async fn request<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(oneshot::Sender<Result<()>>) -> DriverCommand,
    {
        let (reply, response) = oneshot::channel();
        self.send(build(reply))?;
        response
            .await
            .map_err(|_| BridgeError::generic("driver stopped before replying"))?
    }

    /// Write `value` to the variable `name`
    pub async fn set_variable(&self, name: &str, value: &str) -> Result<()> {
        let (name, value) = (name.to_string(), value.to_string());
        self.request(|reply| DriverCommand::SetVariable { name, value, reply })
            .await
    }

    /// Run the instant command `name`
    pub async fn instant_command(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.request(|reply| DriverCommand::InstantCommand { name, reply })
            .await
    }

    pub fn full_refresh(&self) -> Result<()> {
        self.send(DriverCommand::FullRefresh)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(DriverCommand::Shutdown)
    }
}

/// Polling driver for one UPS
pub struct UpsDriver<D, S> {
    engine: Engine<D, S>,
    poll: PollConfig,
    commands_tx: mpsc::UnboundedSender<DriverCommand>,
    commands_rx: mpsc::UnboundedReceiver<DriverCommand>,
    state: watch::Sender<DriverState>,
    logger: StructuredLogger,
    total_polls: u64,
    overrun_count: u64,
}

impl<D: RawValueSource, S: StateStore> UpsDriver<D, S> {
    pub fn new(engine: Engine<D, S>, poll: PollConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(DriverState::Initializing);
        let logger = get_device_logger("driver", &engine.session().profile.display_name);
        Self {
            engine,
            poll,
            commands_tx,
            commands_rx,
            state,
            logger,
            total_polls: 0,
            overrun_count: 0,
        }
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            commands: self.commands_tx.clone(),
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    pub fn engine(&self) -> &Engine<D, S> {
        &self.engine
    }

    /// Kind of poll for the `tick`-th regular tick, counted from 1
    fn poll_kind(&self, tick: u64) -> PollKind {
        if tick % u64::from(self.poll.full_update_every.max(1)) == 0 {
            PollKind::Full
        } else {
            PollKind::Regular
        }
    }

    fn run_poll(&mut self, kind: PollKind) {
        let started = std::time::Instant::now();
        let report = self.engine.poll(kind);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.total_polls = self.total_polls.saturating_add(1);
        if elapsed_ms > self.poll.interval_ms {
            self.overrun_count = self.overrun_count.saturating_add(1);
            self.logger.warn(&format!(
                "Poll took {} ms, longer than the {} ms interval ({} overruns)",
                elapsed_ms, self.poll.interval_ms, self.overrun_count
            ));
        }
        self.logger.trace(&format!(
            "{:?} poll #{}: {} variables published, status {}, bypass {:?}, eco {:?}",
            kind,
            self.total_polls,
            report.published(),
            if report.status_published { "published" } else { "unresolved" },
            report.transfer.get(TransferMode::Bypass),
            report.transfer.get(TransferMode::Eco),
        ));
    }

    /// Returns true when the driver must stop
    fn handle_command(&mut self, command: DriverCommand) -> bool {
        match command {
            DriverCommand::SetVariable { name, value, reply } => {
                let result = self.engine.set_variable(&name, &value);
                if let Err(e) = &result {
                    self.logger.warn(&format!("set {} = {} refused: {}", name, value, e));
                }
                let _ = reply.send(result);
            }
            DriverCommand::InstantCommand { name, reply } => {
                let result = self.engine.instant_command(&name);
                if let Err(e) = &result {
                    self.logger.warn(&format!("command {} refused: {}", name, e));
                }
                let _ = reply.send(result);
            }
            DriverCommand::FullRefresh => self.run_poll(PollKind::Full),
            DriverCommand::Shutdown => return true,
        }
        false
    }

    /// Initialize the engine and poll until shut down. Hands the engine
    /// back so callers can inspect the final state.
    pub async fn run(mut self) -> Result<Engine<D, S>> {
        let report = self.engine.init();
        self.logger.info(&format!(
            "Driver started: {} variables published, polling every {} ms",
            report.published(),
            self.poll.interval_ms
        ));
        self.state.send_replace(DriverState::Running);

        let period = Duration::from_millis(self.poll.interval_ms.max(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tick = tick.wrapping_add(1);
                    let kind = self.poll_kind(tick);
                    self.run_poll(kind);
                }
                command = self.commands_rx.recv() => {
                    // The driver holds a sender itself, so the channel never closes
                    let Some(command) = command else { break };
                    if self.handle_command(command) {
                        self.logger.info("Shutdown requested");
                        break;
                    }
                }
            }
        }

        self.state.send_replace(DriverState::ShuttingDown);
        self.logger.info(&format!(
            "Driver stopped after {} polls ({} overruns)",
            self.total_polls, self.overrun_count
        ));
        Ok(self.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DeviceFamily;
    use crate::registry::Registry;
    use crate::session::{DeviceProfile, Session};
    use crate::store::MemoryStore;
    use crate::transport::SimulatedDevice;

    const SWITCHABLE: &str = "UPS.PowerSummary.PresentStatus.Switchable";

    fn driver(device: SimulatedDevice, full_update_every: u32) -> UpsDriver<SimulatedDevice, MemoryStore> {
        let session = Session::new(DeviceProfile::new(DeviceFamily::Eaton9E, "Test UPS"));
        let engine = Engine::new(Registry::builtin(), session, device, MemoryStore::new());
        UpsDriver::new(
            engine,
            PollConfig {
                interval_ms: 10,
                full_update_every,
            },
        )
    }

    #[test]
    fn test_full_poll_cadence() {
        let driver = driver(SimulatedDevice::new(), 3);
        let kinds: Vec<PollKind> = (1..=6).map(|tick| driver.poll_kind(tick)).collect();
        assert_eq!(
            kinds,
            vec![
                PollKind::Regular,
                PollKind::Regular,
                PollKind::Full,
                PollKind::Regular,
                PollKind::Regular,
                PollKind::Full,
            ]
        );
    }

    #[tokio::test]
    async fn test_requests_are_served_between_polls() {
        let driver = driver(SimulatedDevice::new().with_value(SWITCHABLE, 1.0), 2);
        let handle = driver.handle();
        let mut state = driver.subscribe_state();
        let task = tokio::spawn(driver.run());

        handle.set_variable("ups.shutdown", "disabled").await.unwrap();
        assert!(matches!(
            handle.set_variable("battery.charge", "50").await,
            Err(BridgeError::UnknownVariable { .. }) | Err(BridgeError::NotWritable { .. })
        ));
        assert!(matches!(
            handle.instant_command("no.such.command").await,
            Err(BridgeError::UnknownCommand { .. })
        ));
        handle.full_refresh().unwrap();
        assert_eq!(*state.borrow_and_update(), DriverState::Running);

        handle.shutdown().unwrap();
        let engine = task.await.unwrap().unwrap();
        assert_eq!(
            engine.store().variables().get("ups.shutdown").map(String::as_str),
            Some("disabled")
        );
        assert_eq!(engine.device().writes(), &[(SWITCHABLE.to_string(), 0.0)]);
        assert!(handle.full_refresh().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_hands_back_engine() {
        let driver = driver(SimulatedDevice::new().with_value("UPS.PowerSummary.RemainingCapacity", 80.0), 2);
        let handle = driver.handle();
        let task = tokio::spawn(driver.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().unwrap();
        let engine = task.await.unwrap().unwrap();
        assert_eq!(
            engine.store().variables().get("battery.charge").map(String::as_str),
            Some("80")
        );
    }
}
