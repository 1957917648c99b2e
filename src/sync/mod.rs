//! Sync Executor: the bounded-concurrency worker pool that applies
//! PlanEntries to the filesystem via the VCS Driver registry.

pub mod executor;
pub mod semaphore;

pub use executor::{ExecutorOptions, execute};
