//! Interpreter execution and output interpretation.
//!
//! [`subprocess`] spawns the interpreter and captures its output,
//! [`outcome`] turns a finished job run into success or a composed failure
//! report, and [`params`] parses the parameter-discovery listing.

pub mod executor;
pub mod outcome;
pub mod params;
pub mod subprocess;
