//! Background workers that drain the job queue.
//!
//! A [`Worker`] claims one job at a time, dispatches it through a
//! [`HandlerRegistry`], and settles the result back on the queue. Handler
//! errors, timeouts, and panics all go through the queue's retry schedule;
//! only the store itself can make a worker back off. [`WorkerPool`] runs
//! several workers over the same queue behind one shutdown switch.
//!
//! This crate has no main: the embedding application builds the collaborator
//! backends, wires them into [`handlers::standard_registry`], and starts a
//! pool with its loaded [`WorkerAppConfig`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod runner;
pub mod worker;

pub use config::{WorkerAppConfig, WorkerSettings};
pub use error::{Result, WorkerError};
pub use registry::{HandlerRegistry, JobHandler};
pub use runner::{PoolHandle, WorkerPool};
pub use worker::Worker;
