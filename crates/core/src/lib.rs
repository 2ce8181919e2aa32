//! Domain logic for the R transformation runner.
//!
//! Everything in this crate is free of network and database access:
//! descriptor loading, the script materializer, command construction,
//! subprocess execution and outcome classification, parameter discovery
//! parsing, and local output handling. The I/O-bound collaborators
//! (credential provisioning, warehouse, storage, events) live in their own
//! crates and are wired together by `lgr-runner`.

pub mod command;
pub mod credentials;
pub mod error;
pub mod job;
pub mod manifest;
pub mod output;
pub mod script;
pub mod scripting;
