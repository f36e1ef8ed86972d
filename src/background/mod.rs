//! Background services: the periodic GPS probe
//!
//! The probe runs as self-re-arming one-shot tokio timers, independent of
//! whatever task called `start()`.

pub mod probe_scheduler;

pub use probe_scheduler::{CycleOutcome, ProbeError, ProbeScheduler, ProbeStats, SchedulerState};
