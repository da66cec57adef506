//! The tick scheduler: the single-threaded resolution core.
//!
//! One scheduler task owns the world, the intent queue, and the lease
//! manager. Each tick walks a fixed state machine:
//!
//! ```text
//! IDLE -> OPEN -> (deadline) -> RESOLVING -> ENACTING -> EMITTING -> IDLE
//! ```
//!
//! - **OPEN**: observations for the tick are pushed once, at tick start,
//!   so controllers can act on them within the same tick; the command
//!   inbox is served until the intent deadline.
//! - **RESOLVING / ENACTING**: the queue is drained and [`run_tick`]
//!   resolves movement, applies actions, and verifies invariants. This
//!   stretch never suspends.
//! - **EMITTING**: the snapshot is refreshed and `tick_completed` goes to
//!   viewers before the next tick can open.
//! - **IDLE**: the inbox is served until the period boundary; intents
//!   arriving here are rejected (`late_tick` for the tick that just
//!   closed, `wrong_tick` otherwise). If resolution overran the period,
//!   the next tick starts immediately and the overrun counter increments.
//!
//! Shutdown completes the in-flight tick, emits `shutdown` to all
//! subscribers, and returns. No partial tick state is ever exposed.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;

use glade_types::{
    AcquireLeaseRequest, DiscoveryEntry, Intent, LeaseGrantResponse, ObservationFrame,
    RejectReason, ReleaseLeaseResponse, SubmitIntentRequest, SubmitIntentResponse, TickAnnounce,
    ViewerMessage, WorldSize, WorldSnapshot,
};
use glade_world::{World, WorldError};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clock::{self, ClockError, TickTiming};
use crate::command::CoreCommand;
use crate::config::GladeConfig;
use crate::hub::BroadcastHub;
use crate::lease::LeaseManager;
use crate::observe::{self, ObservationSettings};
use crate::queue::IntentQueue;
use crate::tick::{self, TickError, TickOutcome};

/// Errors that can occur while the scheduler runs.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A world operation failed outside resolution (tick counter).
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A tick aborted on an invariant violation. State was rolled back;
    /// the process must exit.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Scheduler settings, decoupled from the full config surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Tick cadence and deadline.
    pub timing: TickTiming,
    /// Lease time-to-live in milliseconds.
    pub lease_ttl_ms: i64,
    /// Observation radii.
    pub observation: ObservationSettings,
    /// Maximum ticks before a clean stop (0 = unlimited).
    pub max_ticks: u64,
}

impl SchedulerConfig {
    /// Derive scheduler settings from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for an unusable tick cadence.
    pub fn from_config(config: &GladeConfig) -> Result<Self, ClockError> {
        Ok(Self {
            timing: TickTiming::new(config.tick.duration_ms, config.tick.deadline_ms)?,
            lease_ttl_ms: i64::try_from(config.lease.ttl_ms).unwrap_or(i64::MAX),
            observation: ObservationSettings {
                radius: config.observation.radius,
                hearing_radius: config.hearing_radius(),
            },
            max_ticks: config.run.max_ticks,
        })
    }
}

/// Why and how a scheduler run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Ticks fully completed.
    pub ticks_completed: u64,
    /// Ticks whose resolution overran the period.
    pub overruns: u64,
}

/// The resolution core. Owns all mutable simulation state.
#[derive(Debug)]
pub struct Scheduler {
    /// The authoritative world.
    world: World,
    /// Scheduler settings.
    config: SchedulerConfig,
    /// Lease bookkeeping.
    leases: LeaseManager,
    /// The per-tick intent inbox.
    queue: IntentQueue,
    /// Fan-out to observers and viewers.
    hub: Arc<BroadcastHub>,
    /// Command inbox from boundary adapters.
    commands: mpsc::Receiver<CoreCommand>,
    /// Shutdown signal.
    shutdown: watch::Receiver<bool>,
    /// The previous tick's outcome, feeding observation events.
    prev: TickOutcome,
    /// Whether any command sender is still alive.
    commands_open: bool,
}

impl Scheduler {
    /// Create a scheduler over a prepared world.
    pub fn new(
        world: World,
        config: SchedulerConfig,
        hub: Arc<BroadcastHub>,
        commands: mpsc::Receiver<CoreCommand>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let prev = TickOutcome::empty(world.tick());
        let leases = LeaseManager::new(config.lease_ttl_ms);
        Self {
            world,
            config,
            leases,
            queue: IntentQueue::new(),
            hub,
            commands,
            shutdown,
            prev,
            commands_open: true,
        }
    }

    /// Drive ticks until shutdown, the tick bound, or a fatal error.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when the tick counter overflows or a
    /// tick aborts on an invariant violation. In the latter case the world
    /// was rolled back and the caller must terminate the process.
    pub async fn run(mut self) -> Result<SchedulerReport, SchedulerError> {
        let mut ticks_completed: u64 = 0;
        let mut overruns: u64 = 0;
        let mut last_tick = self.world.tick();

        info!(
            tick_duration_ms = self.config.timing.duration_ms(),
            deadline_offset_ms = self.config.timing.deadline_offset_ms(),
            max_ticks = self.config.max_ticks,
            entities = self.world.entity_count(),
            "Scheduler starting"
        );

        loop {
            if *self.shutdown.borrow() {
                info!(last_tick, "Shutdown requested");
                break;
            }

            // --- Tick start ---
            let tick_start = Instant::now();
            let tick_id = self.world.advance_tick()?;
            last_tick = tick_id;
            let tick_start_ms = clock::now_ms();
            let deadline_ms = tick_start_ms.saturating_add(
                i64::try_from(self.config.timing.deadline_offset_ms()).unwrap_or(i64::MAX),
            );

            let reclaimed = self.leases.sweep_expired(tick_start_ms);
            if !reclaimed.is_empty() {
                debug!(tick_id, count = reclaimed.len(), "Expired leases reclaimed");
            }

            self.hub.publish_tick(TickAnnounce {
                tick_id,
                tick_start_ms,
                intent_deadline_ms: deadline_ms,
                tick_duration_ms: self.config.timing.duration_ms(),
                world_version: tick_id,
            });
            self.hub.publish_viewer(ViewerMessage::TickStarted {
                tick_id,
                tick_start_ms,
                deadline_ms,
                tick_duration_ms: self.config.timing.duration_ms(),
            });

            // Observations go out at tick start, never after resolution,
            // so controllers can submit for this same tick.
            self.emit_observations(tick_start_ms, deadline_ms);

            // --- OPEN: serve commands until the deadline ---
            self.queue.open_for(tick_id);
            let deadline = self.config.timing.deadline_instant(tick_start);
            self.serve_until(deadline).await;
            self.queue.close();

            // --- RESOLVING / ENACTING ---
            let intents = self.queue.drain();
            debug!(tick_id, intents = intents.len(), "Deadline fired, resolving");
            let outcome = tick::run_tick(&mut self.world, &intents)?;

            // --- EMITTING ---
            self.hub.update_snapshot(self.build_snapshot()).await;
            for entity in &outcome.result.spawns {
                self.hub.publish_viewer(ViewerMessage::EntitySpawned {
                    tick_id,
                    entity: entity.clone(),
                });
            }
            for entity in &outcome.result.despawns {
                self.hub.publish_viewer(ViewerMessage::EntityDespawned {
                    tick_id,
                    entity_id: entity.entity_id.clone(),
                });
            }
            self.hub
                .publish_viewer(ViewerMessage::tick_completed(&outcome.result));
            self.prev = outcome;
            ticks_completed = ticks_completed.saturating_add(1);

            if self.config.max_ticks > 0 && ticks_completed >= self.config.max_ticks {
                info!(tick_id, max_ticks = self.config.max_ticks, "Tick limit reached");
                break;
            }

            // --- IDLE until the period boundary ---
            let period_end = self.config.timing.period_end(tick_start);
            if Instant::now() >= period_end {
                overruns = overruns.saturating_add(1);
                self.hub.record_overrun();
                warn!(tick_id, "Tick overran its period; starting next tick immediately");
            } else {
                self.serve_until(period_end).await;
            }
        }

        self.hub
            .publish_viewer(ViewerMessage::Shutdown { tick_id: last_tick });
        info!(ticks_completed, overruns, "Scheduler stopped");
        Ok(SchedulerReport {
            ticks_completed,
            overruns,
        })
    }

    /// Serve the command inbox until `until`.
    ///
    /// This is one of the scheduler's two suspension points; resolution
    /// itself never awaits.
    async fn serve_until(&mut self, until: Instant) {
        loop {
            if !self.commands_open {
                tokio::time::sleep_until(until).await;
                return;
            }
            tokio::select! {
                () = tokio::time::sleep_until(until) => return,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("Command inbox closed; continuing on timers only");
                        self.commands_open = false;
                    }
                }
            }
        }
    }

    /// Apply one boundary command. Replies are best-effort: a vanished
    /// requester just drops the oneshot receiver.
    fn handle_command(&mut self, command: CoreCommand) {
        let now_ms = clock::now_ms();
        match command {
            CoreCommand::SubmitIntent { request, reply } => {
                let response = self.submit_intent(request, now_ms);
                if response.accepted {
                    self.hub.record_intent_accepted();
                } else {
                    self.hub.record_intent_rejected();
                }
                let _ = reply.send(response);
            }
            CoreCommand::AcquireLease { request, reply } => {
                let _ = reply.send(self.acquire_lease(&request, now_ms));
            }
            CoreCommand::RenewLease { lease_id, reply } => {
                let response = match self.leases.renew(lease_id, now_ms) {
                    Ok(lease) => LeaseGrantResponse {
                        success: true,
                        lease_id: Some(lease.lease_id),
                        expires_at_ms: Some(lease.expires_at_ms),
                        reason: None,
                    },
                    Err(denied) => LeaseGrantResponse::denied(denied.reason()),
                };
                let _ = reply.send(response);
            }
            CoreCommand::ReleaseLease { lease_id, reply } => {
                let _ = reply.send(ReleaseLeaseResponse {
                    success: self.leases.release(lease_id),
                });
            }
            CoreCommand::ListEntities { reply } => {
                let _ = reply.send(self.discovery(now_ms));
            }
        }
    }

    /// Validate and queue an intent submission.
    ///
    /// Checks run in a fixed order so each rejection has one unambiguous
    /// reason: entity existence, lease validity, intent legality, then
    /// tick targeting and the deadline.
    fn submit_intent(&mut self, request: SubmitIntentRequest, now_ms: i64) -> SubmitIntentResponse {
        if self.world.get_entity(&request.entity_id).is_none() {
            return SubmitIntentResponse::rejected(RejectReason::UnknownEntity);
        }
        if !self
            .leases
            .validate(request.lease_id, &request.entity_id, now_ms)
        {
            return SubmitIntentResponse::rejected(RejectReason::InvalidLease);
        }
        if let Err(reason) = check_intent_legality(&request.intent) {
            return SubmitIntentResponse::rejected(reason);
        }
        match self
            .queue
            .submit(request.entity_id, request.tick_id, request.intent)
        {
            Ok(()) => SubmitIntentResponse::accepted(),
            Err(reason) => SubmitIntentResponse::rejected(reason),
        }
    }

    /// Handle a lease acquisition.
    fn acquire_lease(&mut self, request: &AcquireLeaseRequest, now_ms: i64) -> LeaseGrantResponse {
        if self.world.get_entity(&request.entity_id).is_none() {
            return LeaseGrantResponse::denied("unknown_entity");
        }
        match self
            .leases
            .acquire(&request.entity_id, &request.controller_id, now_ms)
        {
            Ok(lease) => LeaseGrantResponse {
                success: true,
                lease_id: Some(lease.lease_id),
                expires_at_ms: Some(lease.expires_at_ms),
                reason: None,
            },
            Err(denied) => LeaseGrantResponse::denied(denied.reason()),
        }
    }

    /// Push one observation frame per entity for the tick that just
    /// opened. Each frame carries the entity's currently active lease so
    /// adapters can terminate streams whose lease ended.
    fn emit_observations(&self, now_ms: i64, deadline_ms: i64) {
        for entity in self.world.entities() {
            let observation = observe::build_observation(
                &self.world,
                entity,
                self.config.observation,
                &self.prev.result,
                &self.prev.utterances,
                deadline_ms,
            );
            let lease_id = self.leases.active_lease_id(&entity.entity_id, now_ms);
            self.hub.publish_observation(ObservationFrame {
                entity_id: entity.entity_id.clone(),
                lease_id,
                observation,
            });
        }
    }

    /// The discovery listing for `GET /api/entities`.
    fn discovery(&self, now_ms: i64) -> Vec<DiscoveryEntry> {
        self.world
            .entities()
            .map(|entity| DiscoveryEntry {
                entity_id: entity.entity_id.clone(),
                entity_type: entity.entity_type.clone(),
                tags: entity.tags.iter().cloned().collect(),
                spawn_tick: entity.spawn_tick,
                has_active_lease: self
                    .leases
                    .active_lease_id(&entity.entity_id, now_ms)
                    .is_some(),
            })
            .collect()
    }

    /// Build the viewer snapshot of the committed world.
    fn build_snapshot(&self) -> WorldSnapshot {
        let (width, height) = self.world.dims();
        WorldSnapshot {
            tick_id: self.world.tick(),
            entities: self.world.entities().cloned().collect(),
            objects: self.world.objects().cloned().collect(),
            world_size: WorldSize { width, height },
            tick_duration_ms: self.config.timing.duration_ms(),
        }
    }
}

/// Structural legality of an intent, independent of world state.
const fn check_intent_legality(intent: &Intent) -> Result<(), RejectReason> {
    match intent {
        Intent::Collect { quantity, .. }
        | Intent::Eat { quantity, .. }
        | Intent::Pickup { quantity, .. }
        | Intent::Use { quantity, .. } => {
            if *quantity == 0 {
                return Err(RejectReason::IllegalAction);
            }
            Ok(())
        }
        Intent::Move { .. } | Intent::Say { .. } | Intent::Wait => Ok(()),
    }
}
