//! Translation engine
//!
//! Runs the registry against a device once per poll tick and once per write
//! or command request. All state lives in the [`Session`] owned here; every
//! call runs to completion before the next one starts.

use crate::convert::ConvertContext;
use crate::error::{BridgeError, Result};
use crate::logging::{StructuredLogger, get_device_logger};
use crate::registry::{CommandAction, EntryKind, FallbackChain, MappingEntry, Registry};
use crate::session::Session;
use crate::session::status::UPS_STATUS_VAR;
use crate::store::StateStore;
use crate::transfer::sequence::{self, ModeActuator};
use crate::transfer::{self, Evaluation, TransferMode, TransferStates};
use crate::transport::{RawValueSource, WriteError};
use std::collections::{BTreeMap, BTreeSet};

/// Result of evaluating one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Converted and published
    Published(String),
    /// The converter declined; nothing to publish this cycle
    Suppressed,
    /// The device does not expose the raw path
    MissingPath,
    /// Not evaluated this cycle (cached, absent or not due)
    Skipped,
}

/// Which entries a poll refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// Everything, including evaluate-occasionally entries
    Full,
    /// Regular tick
    Regular,
}

/// Per-chain outcomes of one poll, in evaluation order
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub chains: Vec<(String, Vec<EntryOutcome>)>,
    pub status: Vec<(String, EntryOutcome)>,
    pub status_published: bool,
    /// Bypass and ECO transfer states reached this cycle
    pub transfer: TransferStates,
}

impl PollReport {
    pub fn outcomes(&self, name: &str) -> Option<&[EntryOutcome]> {
        self.chains
            .iter()
            .find(|(chain, _)| chain == name)
            .map(|(_, outcomes)| outcomes.as_slice())
    }

    pub fn published(&self) -> usize {
        self.chains
            .iter()
            .filter(|(_, outcomes)| {
                outcomes
                    .iter()
                    .any(|o| matches!(o, EntryOutcome::Published(_)))
            })
            .count()
    }
}

/// Engine bound to one device and one state store
pub struct Engine<D, S> {
    registry: Registry,
    session: Session,
    device: D,
    store: S,
    /// Chains whose winning entry was evaluate-once
    cached: BTreeSet<String>,
    /// Index of the entry that last published each chain
    winners: BTreeMap<String, usize>,
    enums_published: BTreeSet<String>,
    logger: StructuredLogger,
}

fn evaluate_entry<D: RawValueSource>(
    entry: &MappingEntry,
    device: &mut D,
    ctx: &mut ConvertContext<'_>,
    logger: &StructuredLogger,
) -> EntryOutcome {
    if entry.flags.absent {
        return EntryOutcome::Skipped;
    }
    let Some(raw) = device.read(&entry.path) else {
        logger.trace(&format!("{} not exposed ({})", entry.name, entry.path));
        return EntryOutcome::MissingPath;
    };
    match render(entry, raw, ctx) {
        Some(label) => EntryOutcome::Published(label),
        None => {
            logger.debug(&format!("{} suppressed (raw {})", entry.name, raw));
            EntryOutcome::Suppressed
        }
    }
}

/// Label `entry` publishes for `raw`
fn render(entry: &MappingEntry, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
    match &entry.converter {
        Some(converter) => converter.forward(raw, ctx),
        None => Some(entry.formatter.format(raw)),
    }
}

fn backward(
    entry: &MappingEntry,
    label: &str,
    ctx: &mut ConvertContext<'_>,
) -> Result<f64> {
    let converted = match &entry.converter {
        Some(converter) => converter.backward(label, ctx),
        None => entry.formatter.parse(label),
    };
    converted.map_err(|e| BridgeError::invalid_write(entry.name.as_str(), e.to_string()))
}

impl<D: RawValueSource, S: StateStore> Engine<D, S> {
    pub fn new(registry: Registry, session: Session, device: D, store: S) -> Self {
        let logger = get_device_logger("engine", &session.profile.display_name);
        Self {
            registry,
            session,
            device,
            store,
            cached: BTreeSet::new(),
            winners: BTreeMap::new(),
            enums_published: BTreeSet::new(),
            logger,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Announce commands, writable variables and absent defaults, then run a
    /// full poll
    pub fn init(&mut self) -> PollReport {
        for chain in self.registry.commands() {
            self.store.register_command(&chain.name);
        }
        for chain in self.registry.variables() {
            if chain.is_writable() {
                self.store.set_writable(&chain.name);
            }
            let default = chain
                .entries
                .iter()
                .filter(|entry| entry.flags.absent)
                .find_map(|entry| entry.formatter.literal_text());
            if let Some(default) = default {
                self.store.set(&chain.name, default.to_string());
            }
        }
        self.logger.info(&format!(
            "Engine initialized: {} variables, {} status entries, {} commands",
            self.registry.variables().len(),
            self.registry.status_entries().len(),
            self.registry.commands().len()
        ));
        self.poll(PollKind::Full)
    }

    /// Whether `chain` is evaluated this cycle
    fn chain_due(&self, chain: &FallbackChain, kind: PollKind) -> bool {
        if chain.is_absent() || self.cached.contains(&chain.name) {
            return false;
        }
        match (kind, self.winners.get(&chain.name)) {
            (PollKind::Regular, Some(&index)) => chain
                .entries
                .get(index)
                .is_none_or(|entry| !entry.flags.semi_static),
            _ => true,
        }
    }

    fn poll_chain(&mut self, index: usize, kind: PollKind) -> (String, Vec<EntryOutcome>) {
        let Self {
            registry,
            session,
            device,
            store,
            cached,
            winners,
            enums_published,
            logger,
        } = self;
        let chain = &registry.variables()[index];
        let mut outcomes = Vec::new();
        let mut winner = None;
        {
            let mut ctx = ConvertContext::new(session, store);
            for (position, entry) in chain.entries.iter().enumerate() {
                let outcome = evaluate_entry(entry, device, &mut ctx, logger);
                if let EntryOutcome::Published(label) = &outcome {
                    ctx.store.set(&chain.name, label.clone());
                    winner = Some(position);
                }
                outcomes.push(outcome);
                if winner.is_some() {
                    break;
                }
            }
        }

        let name = chain.name.clone();
        match winner {
            Some(position) => {
                let entry = &chain.entries[position];
                if entry.flags.static_value {
                    cached.insert(name.clone());
                }
                if entry.flags.enumerated && enums_published.insert(name.clone())
                    && let Some(converter) = &entry.converter
                {
                    store.set_enum(&name, &converter.labels());
                }
                winners.insert(name.clone(), position);
            }
            None if kind == PollKind::Full => {
                logger.debug(&format!("{}: no entry published", name));
            }
            None => {}
        }
        (name, outcomes)
    }

    /// One poll cycle
    pub fn poll(&mut self, kind: PollKind) -> PollReport {
        let previous = self.session.transfer.clone();
        self.session.begin_cycle();
        let mut report = PollReport::default();

        let chains = self.registry.variables();
        let (first, rest): (Vec<usize>, Vec<usize>) =
            (0..chains.len()).partition(|&index| chains[index].precedes());
        for index in first.into_iter().chain(rest) {
            let chain = &self.registry.variables()[index];
            if !self.chain_due(chain, kind) {
                report.chains.push((chain.name.clone(), vec![EntryOutcome::Skipped]));
                continue;
            }
            report.chains.push(self.poll_chain(index, kind));
        }

        let Self {
            registry,
            session,
            device,
            store,
            logger,
            ..
        } = self;
        for entry in registry.status_entries() {
            let outcome = {
                let mut ctx = ConvertContext::new(session, store);
                evaluate_entry(entry, device, &mut ctx, logger)
            };
            if let EntryOutcome::Published(token) = &outcome
                && !session.status.apply(token)
            {
                logger.debug(&format!("unknown status token '{}' from {}", token, entry.path));
            }
            report.status.push((entry.path.clone(), outcome));
        }
        if session.status.is_resolved() {
            store.set(UPS_STATUS_VAR, session.status.render());
            report.status_published = true;
        }
        for mode in [TransferMode::Bypass, TransferMode::Eco] {
            let (before, now) = (previous.get(mode), session.transfer.get(mode));
            if before != now {
                logger.info(&format!("{:?} transfer {:?} -> {:?}", mode, before, now));
            }
        }
        report.transfer = session.transfer.clone();
        report
    }

    /// Convert `label` and write it to the device. The store is only
    /// updated once the device accepted the value.
    pub fn set_variable(&mut self, name: &str, label: &str) -> Result<()> {
        let Self {
            registry,
            session,
            device,
            store,
            logger,
            ..
        } = self;
        let chain = registry
            .variable(name)
            .ok_or_else(|| BridgeError::unknown_variable(name))?;
        if !chain.is_writable() {
            return Err(BridgeError::not_writable(name));
        }
        if chain.is_absent() {
            let value = label.trim();
            if !matches!(value.parse::<f64>(), Ok(v) if v.is_finite()) {
                return Err(BridgeError::invalid_write(name, format!("'{}' is not a number", label)));
            }
            store.set(name, value.to_string());
            logger.info(&format!("{} set to {} (not sent to device)", name, value));
            return Ok(());
        }

        for entry in chain
            .entries
            .iter()
            .filter(|entry| entry.flags.writable && !entry.flags.absent)
        {
            let raw = {
                let mut ctx = ConvertContext::new(session, store);
                backward(entry, label, &mut ctx)?
            };
            match device.write(&entry.path, raw) {
                Ok(()) => {
                    // publish what a poll would read back, not the request text
                    let published = {
                        let mut ctx = ConvertContext::new(session, store);
                        render(entry, raw, &mut ctx)
                    }
                    .unwrap_or_else(|| label.trim().to_string());
                    logger.info(&format!(
                        "{} set to {} ({} = {})",
                        name, published, entry.path, raw
                    ));
                    store.set(name, published);
                    return Ok(());
                }
                Err(WriteError::UnknownPath { .. }) => continue,
                Err(e) => {
                    logger.warn(&format!("Writing {} failed: {}", name, e));
                    return Err(e.into());
                }
            }
        }
        Err(BridgeError::transport(format!(
            "device exposes no writable path for {}",
            name
        )))
    }

    /// Run an instant command. Entries of the command are tried in order;
    /// the first path the device knows wins.
    pub fn instant_command(&mut self, name: &str) -> Result<()> {
        let chain = self
            .registry
            .command(name)
            .cloned()
            .ok_or_else(|| BridgeError::unknown_command(name))?;

        for entry in &chain.entries {
            let EntryKind::Command(action) = entry.kind else {
                continue;
            };
            match action {
                CommandAction::Sequence(direction) => {
                    let state = sequence::run(direction, self)?;
                    self.logger.info(&format!("{} completed, bypass {}", name, state));
                    return Ok(());
                }
                CommandAction::Write => {
                    let raw = entry
                        .formatter
                        .parse("")
                        .map_err(|e| BridgeError::config(format!("command {}: {}", name, e)))?;
                    match self.device.write(&entry.path, raw) {
                        Ok(()) => {
                            self.logger.info(&format!("Command {} sent ({} = {})", name, entry.path, raw));
                            return Ok(());
                        }
                        Err(WriteError::UnknownPath { .. }) => continue,
                        Err(e) => {
                            self.logger.warn(&format!("Command {} failed: {}", name, e));
                            return Err(e.into());
                        }
                    }
                }
            }
        }
        Err(BridgeError::transport(format!(
            "device supports no path for command {}",
            name
        )))
    }
}

impl<D: RawValueSource, S: StateStore> ModeActuator for Engine<D, S> {
    fn published(&self, name: &str) -> Option<String> {
        self.store.get(name)
    }

    fn evaluate(&mut self, mode: TransferMode) -> Evaluation {
        let mut ctx = ConvertContext::new(&mut self.session, &mut self.store);
        transfer::evaluate(mode, 1.0, &mut ctx)
    }

    fn apply(&mut self, name: &str, label: &str) -> Result<()> {
        self.set_variable(name, label)
    }

    fn publish(&mut self, name: &str, value: &str) {
        self.store.set(name, value.to_string());
    }
}
