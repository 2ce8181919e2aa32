//! Job runner: wires configuration, credentials, the interpreter, the
//! warehouse and output storage into one run.
//!
//! - [`config`] -- environment-driven [`RunnerConfig`](config::RunnerConfig).
//! - [`orchestrator`] -- the run itself and failure reporting.
//! - [`collector`] -- moving or uploading produced files.
//! - [`warehouse`] -- the produced-files catalogue.
//! - [`discovery`] -- parameter discovery for catalogue scripts.

pub mod collector;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod warehouse;
