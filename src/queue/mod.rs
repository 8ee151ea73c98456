//! File-based request queues.
//!
//! The management process writes `{ "requests": [...] }` into a queue file.
//! Each poll, a [`QueueProcessor`] dispatches every unsettled request to its
//! [`RequestHandler`], appends the annotated requests to a capped results
//! log and replaces the queue with an empty one.

mod failure;
mod processor;
mod request;

pub use failure::{Failure, FailureKind};
pub use processor::{enqueue, CycleReport, QueueProcessor, RequestHandler};
pub use request::{QueueFile, Request, RequestStatus, ResultsLog};
pub(crate) use request::null_as_default;
