//! Probe Scheduler: periodic GPS sensor probe with fix-gated publishing
//!
//! Each probe is a one-shot timer. When it fires, the next one-shot is armed
//! *before* any fallible work, so a failed read, decode or publish never
//! stalls the schedule, and slow probes do not push later ones back.
//!
//! State machine: `Idle -> Armed -> (fire) -> Armed ... -> Idle` on `stop()`.
//!
//! Cycle: read sensor -> strip `"<label>: "` -> decode RMC or GGA -> validity
//! gate -> publish on `out`, or warn and skip. The cycle body runs on the
//! blocking pool since device sensor reads are blocking I/O; a fire that finds
//! the previous cycle still running is skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::acquisition::nmea_parser::{self, DecodeError};
use crate::acquisition::sensors::{RawSensorReading, SensorAccess, SensorError};
use crate::config::defaults::OUTPUT_CHANNEL;
use crate::config::{ConfigError, ProbeConfig};
use crate::publish::{reading_message, PublishError, Publisher};
use crate::types::GpsReading;

/// Why a single probe cycle produced nothing.
///
/// Always local to one cycle; the scheduler logs it and keeps running.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Sensor access failed: {0}")]
    Sensor(#[from] SensorError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),

    /// The blocking cycle body panicked
    #[error("Probe worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// Result of a cycle that decoded a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Reading passed the validity gate and was published
    Published(GpsReading),
    /// Reading was void (RMC) or unlocked (GGA) and `require_valid` is set
    Rejected(GpsReading),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    Armed,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "IDLE"),
            SchedulerState::Armed => write!(f, "ARMED"),
        }
    }
}

/// Probe counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeStats {
    /// Timer fires that ran a cycle
    pub fires: u64,
    /// Fixes published
    pub published: u64,
    /// Void fixes withheld by the validity gate
    pub rejected: u64,
    /// Cycles that failed to read, decode or publish
    pub failed: u64,
    /// Fires dropped because the previous cycle was still running
    pub skipped: u64,
}

#[derive(Default)]
struct Counters {
    fires: AtomicU64,
    published: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// The one live one-shot timer.
struct TimerHandle {
    /// Distinguishes this arm from any earlier, already-replaced one
    generation: u64,
    deadline: Instant,
    task: JoinHandle<()>,
}

impl TimerHandle {
    fn cancel(self) {
        self.task.abort();
    }
}

#[derive(Default)]
struct TimerSlot {
    handle: Option<TimerHandle>,
    generation: u64,
}

struct Inner<S, P> {
    config: ProbeConfig,
    sensor: S,
    publisher: P,
    timer: Mutex<TimerSlot>,
    /// At most one cycle in flight, timer-driven or on demand
    cycle_lock: tokio::sync::Mutex<()>,
    counters: Counters,
}

/// Periodic GPS probe.
///
/// Owns its timer: dropping the scheduler stops it.
pub struct ProbeScheduler<S: SensorAccess, P: Publisher> {
    inner: Arc<Inner<S, P>>,
}

impl<S: SensorAccess, P: Publisher> ProbeScheduler<S, P> {
    /// Create an idle scheduler. Fails if the config does not validate.
    pub fn new(config: ProbeConfig, sensor: S, publisher: P) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            sensor = %config.sensor_id,
            interval_ms = config.interval_ms,
            require_valid = config.require_valid,
            "GPS probe scheduler created"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                sensor,
                publisher,
                timer: Mutex::new(TimerSlot::default()),
                cycle_lock: tokio::sync::Mutex::new(()),
                counters: Counters::default(),
            }),
        })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.inner.config
    }

    /// Arm the first probe if the device exposes the configured sensor.
    ///
    /// Always returns `true`. An absent sensor just means no probing happens
    /// (check `is_armed()`). Calling `start()` while already armed is a no-op.
    /// Outside a tokio runtime no timer can be armed; that is logged as an
    /// error and the scheduler stays idle.
    pub fn start(&self) -> bool {
        let inner = &self.inner;
        let sensor_id = &inner.config.sensor_id;

        let available = inner.sensor.names();
        if !available.contains(sensor_id) {
            let mut names: Vec<&String> = available.iter().collect();
            names.sort();
            info!(
                sensor = %sensor_id,
                available = ?names,
                "Configured GPS sensor not exposed by device — probing disabled"
            );
            return true;
        }

        let Ok(runtime) = Handle::try_current() else {
            error!("ProbeScheduler::start() called outside a tokio runtime — timer not armed");
            return true;
        };

        let mut slot = inner.lock_timer();
        if slot.handle.is_some() {
            debug!(sensor = %sensor_id, "GPS probe already armed — start() ignored");
            return true;
        }
        let deadline = Instant::now() + inner.config.interval();
        inner.arm(&mut slot, &runtime, deadline);

        info!(
            sensor = %sensor_id,
            interval_ms = inner.config.interval_ms,
            state = %SchedulerState::Armed,
            "GPS probe armed"
        );
        true
    }

    /// Cancel the pending timer and return to `Idle`. Idempotent.
    ///
    /// A cycle already running may finish, but it has already re-armed and
    /// that timer is cancelled here, so nothing fires after this returns.
    pub fn stop(&self) -> bool {
        let handle = self.inner.lock_timer().handle.take();
        if let Some(handle) = handle {
            handle.cancel();
            info!(
                sensor = %self.inner.config.sensor_id,
                fires = self.inner.counters.fires.load(Ordering::Relaxed),
                state = %SchedulerState::Idle,
                "GPS probe stopped"
            );
        }
        true
    }

    /// Run one probe cycle now, outside the timer.
    ///
    /// Serialized with timer fires; does not touch the schedule.
    pub async fn probe(&self) -> Result<CycleOutcome, ProbeError> {
        self.inner.serialized_cycle().await
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock_timer().handle.is_some()
    }

    pub fn state(&self) -> SchedulerState {
        if self.is_armed() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    /// Deadline of the pending fire, if armed
    pub fn next_fire(&self) -> Option<Instant> {
        self.inner.lock_timer().handle.as_ref().map(|h| h.deadline)
    }

    pub fn stats(&self) -> ProbeStats {
        let c = &self.inner.counters;
        ProbeStats {
            fires: c.fires.load(Ordering::Relaxed),
            published: c.published.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            skipped: c.skipped.load(Ordering::Relaxed),
        }
    }
}

impl<S: SensorAccess, P: Publisher> Drop for ProbeScheduler<S, P> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<S: SensorAccess, P: Publisher> Inner<S, P> {
    fn lock_timer(&self) -> MutexGuard<'_, TimerSlot> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn a one-shot timer for `deadline` and make it the live handle.
    fn arm(self: &Arc<Self>, slot: &mut TimerSlot, runtime: &Handle, deadline: Instant) {
        slot.generation += 1;
        let generation = slot.generation;
        let inner = Arc::clone(self);
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            inner.fire(generation, deadline).await;
        });
        // The replaced handle belongs to the task currently firing
        slot.handle = Some(TimerHandle {
            generation,
            deadline,
            task,
        });
    }

    /// Timer callback body: re-arm first, then probe unless a cycle is in flight.
    async fn fire(self: Arc<Self>, generation: u64, scheduled: Instant) {
        if !self.rearm(generation, scheduled) {
            return;
        }
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            warn!(
                sensor = %self.config.sensor_id,
                "Previous GPS probe still running — skipping this fire"
            );
            return;
        };
        self.counters.fires.fetch_add(1, Ordering::Relaxed);
        // Errors are already logged and counted
        let _ = self.locked_cycle().await;
    }

    /// Arm the successor of fire `generation`, unless it was stopped or superseded.
    fn rearm(self: &Arc<Self>, generation: u64, scheduled: Instant) -> bool {
        let mut slot = self.lock_timer();
        match slot.handle {
            Some(ref live) if live.generation == generation => {}
            _ => return false,
        }

        let interval = self.config.interval();
        let now = Instant::now();
        let mut next = scheduled + interval;
        if next <= now {
            warn!(
                behind_ms = u64::try_from((now - scheduled).as_millis()).unwrap_or(u64::MAX),
                "GPS probe fell behind schedule — skipping missed fires"
            );
            next = now + interval;
        }
        self.arm(&mut slot, &Handle::current(), next);
        true
    }

    async fn serialized_cycle(self: &Arc<Self>) -> Result<CycleOutcome, ProbeError> {
        let _guard = self.cycle_lock.lock().await;
        self.locked_cycle().await
    }

    /// Run and record one cycle. Caller holds `cycle_lock`.
    async fn locked_cycle(self: &Arc<Self>) -> Result<CycleOutcome, ProbeError> {
        let inner = Arc::clone(self);
        let outcome = match tokio::task::spawn_blocking(move || inner.run_cycle()).await {
            Ok(outcome) => outcome,
            Err(e) => Err(ProbeError::Worker(e)),
        };
        self.record(&outcome);
        outcome
    }

    /// fetch -> decode -> gate -> publish
    fn run_cycle(&self) -> Result<CycleOutcome, ProbeError> {
        let raw = self.sensor.read(&self.config.sensor_id)?;
        let sentence = RawSensorReading::parse(&raw)?;
        let reading = nmea_parser::decode_reading(sentence.value)?;

        if reading.is_valid() || !self.config.require_valid {
            self.publisher
                .publish(OUTPUT_CHANNEL, reading_message(&reading))?;
            Ok(CycleOutcome::Published(reading))
        } else {
            Ok(CycleOutcome::Rejected(reading))
        }
    }

    fn record(&self, outcome: &Result<CycleOutcome, ProbeError>) {
        let sensor = &self.config.sensor_id;
        match outcome {
            Ok(CycleOutcome::Published(reading)) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
                debug!(
                    sensor = %sensor,
                    valid = reading.is_valid(),
                    latitude = %reading.latitude(),
                    longitude = %reading.longitude(),
                    "GPS position published"
                );
            }
            Ok(CycleOutcome::Rejected(reading)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(
                    sensor = %sensor,
                    time = %reading.time(),
                    "Not emitting GPS message, fix invalid"
                );
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(sensor = %sensor, error = %e, "GPS probe cycle failed — skipping");
            }
        }
    }
}
