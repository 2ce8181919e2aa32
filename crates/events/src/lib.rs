//! Remote audit events.
//!
//! Local diagnostics go through `tracing`. Events that the job's owner
//! should see in the monitoring service are emitted explicitly through an
//! [`EventSink`]; nothing is intercepted from the log stream.
//!
//! - [`Event`] -- the event envelope and its [`EventLevel`].
//! - [`EventSink`] -- delivery trait, with [`NoopSink`] and [`MemorySink`].
//! - [`EventLog`] -- call-site helper that never lets delivery fail a job.
//! - [`delivery`] -- the Storage API sink.

pub mod delivery;
pub mod event;
pub mod log;
pub mod sink;

pub use delivery::storage_api::StorageApiEventSink;
pub use event::{Event, EventLevel};
pub use log::EventLog;
pub use sink::{EventError, EventSink, MemorySink, NoopSink};
