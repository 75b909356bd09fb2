//! Phased tick scheduler.
//!
//! A [`RunLoop`] collects deferred tasks into ordered [`Phase`] queues and
//! runs them all when the host calls [`RunLoop::run_tick`], or periodically
//! from a driver task started with [`RunLoop::spawn_driver`].
//!
//! # Tick boundaries
//!
//! Each tick takes ownership of everything queued so far. Tasks scheduled
//! while a tick is running (including from inside another task) land in the
//! next tick, never the current one.
//!
//! # Once-per-tick tasks
//!
//! [`Scheduler::schedule_once`] keys a task by `(phase, OnceKey)`. Repeated
//! requests with the same key within one tick collapse to the first task; the
//! key is released when the tick runs, so the next tick can be armed again.

mod config;
mod driver;
mod error;
mod phase;
mod run_loop;
mod scheduler;

pub use config::{RunLoopConfig, load_toml, parse_toml};
pub use driver::DriverHandle;
pub use error::{ConfigError, Result};
pub use phase::Phase;
pub use run_loop::{RunLoop, TickReport};
pub use scheduler::{OnceKey, Scheduler, Task, next_owner_id};
