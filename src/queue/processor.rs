use super::request::{reject_raw, QueueEntry, RawQueue};
use super::{Failure, QueueFile, Request, RequestStatus, ResultsLog};
use crate::event_log::BoundedLog;
use crate::persistence::{load_json, save_json};
use crate::scheduler::PollJob;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Per-kind request logic plugged into a [`QueueProcessor`].
pub trait RequestHandler: Send + Sync {
    type Payload: Serialize + DeserializeOwned + Clone + Send + Sync;

    /// Queue name used in logs
    fn name(&self) -> &str;

    /// Validate and apply one request.
    ///
    /// Returns the `result` text on success. The payload may be rewritten
    /// (e.g. a resolved coordinate) and is stored with the result.
    fn handle(&self, payload: &mut Self::Payload) -> Result<String, Failure>;
}

/// Counts for one processing cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Unsettled requests whose id already appears in the results log
    pub duplicates: usize,
}

impl CycleReport {
    /// Nothing was dispatched or dropped; the queue file was not rewritten
    pub fn is_idle(&self) -> bool {
        self.processed == 0 && self.duplicates == 0
    }
}

/// Generic request-lifecycle engine for one queue file.
pub struct QueueProcessor<H: RequestHandler> {
    queue_path: PathBuf,
    results: BoundedLog<ResultsLog>,
    handler: H,
}

impl<H: RequestHandler> QueueProcessor<H> {
    pub fn new(
        queue_path: impl Into<PathBuf>,
        results_path: impl Into<PathBuf>,
        results_cap: usize,
        handler: H,
    ) -> Self {
        Self {
            queue_path: queue_path.into(),
            results: BoundedLog::single(results_path, results_cap),
            handler,
        }
    }

    pub fn queue_path(&self) -> &Path {
        &self.queue_path
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Retained results that decode as this queue's requests.
    ///
    /// Entries rejected as `INVALID_REQUEST` only show up in
    /// [`raw_results`](Self::raw_results).
    pub fn results(&self) -> Vec<Request<H::Payload>> {
        self.raw_results()
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }

    /// Everything retained in the results log, as stored
    pub fn raw_results(&self) -> Vec<Value> {
        self.results.get("").map(|log| log.requests).unwrap_or_default()
    }

    /// Run one cycle.
    ///
    /// A missing, empty or fully settled queue is left untouched. Otherwise
    /// newly processed requests are appended to the results log and the
    /// queue is replaced by an empty one. Only a file that is not JSON at
    /// all is an error; a single request that does not decode is failed
    /// with `INVALID_REQUEST` and the rest still run.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let queue = match load_json::<Option<RawQueue>>(&self.queue_path)? {
            Some(Some(queue)) if !queue.requests.is_empty() => queue,
            _ => return Ok(report),
        };
        let entries: Vec<QueueEntry<H::Payload>> =
            queue.requests.into_iter().map(QueueEntry::decode).collect();

        let known_ids = self.known_ids(&entries);
        let mut processed = Vec::new();

        for entry in entries {
            if entry.is_settled() {
                continue;
            }
            let request_id = entry.request_id();
            if !request_id.is_empty() && known_ids.contains(request_id) {
                warn!(
                    queue = %self.handler.name(),
                    request_id = %request_id,
                    "Dropping request already present in results"
                );
                report.duplicates += 1;
                continue;
            }

            let (status, stored) = match entry {
                QueueEntry::Valid(mut request) => {
                    self.dispatch(&mut request);
                    let stored = serde_json::to_value(&request)
                        .context("Failed to encode processed request")?;
                    (request.status, stored)
                }
                QueueEntry::Invalid { raw, reason } => {
                    (RequestStatus::Failed, self.reject(raw, reason))
                }
            };
            match status {
                RequestStatus::Completed => report.completed += 1,
                _ => report.failed += 1,
            }
            processed.push(stored);
        }

        report.processed = processed.len();
        if report.is_idle() {
            debug!(queue = %self.handler.name(), "No pending requests");
            return Ok(report);
        }

        if !processed.is_empty() {
            self.results.append_all("", "", processed);
        }
        save_json(&self.queue_path, &QueueFile::<H::Payload>::empty())?;

        info!(
            queue = %self.handler.name(),
            processed = report.processed,
            completed = report.completed,
            failed = report.failed,
            duplicates = report.duplicates,
            "Queue cycle complete"
        );
        Ok(report)
    }

    fn known_ids(&self, entries: &[QueueEntry<H::Payload>]) -> HashSet<String> {
        let wanted = entries
            .iter()
            .any(|e| !e.is_settled() && !e.request_id().is_empty());
        if !wanted {
            return HashSet::new();
        }
        self.raw_results()
            .iter()
            .filter_map(|r| r.get("requestId").and_then(Value::as_str))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn reject(&self, raw: Map<String, Value>, reason: String) -> Value {
        let failure = Failure::invalid("INVALID_REQUEST", reason);
        warn!(
            queue = %self.handler.name(),
            request_id = %raw.get("requestId").and_then(serde_json::Value::as_str).unwrap_or(""),
            detail = %failure.detail,
            "Request could not be decoded"
        );
        reject_raw(raw, &failure)
    }

    fn dispatch(&self, request: &mut Request<H::Payload>) {
        // Marked first so a failing handler can never cause a retry
        request.processed = true;
        request.processed_at = Some(Utc::now());

        let handler = &self.handler;
        let payload = &mut request.payload;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(payload)));

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    queue = %handler.name(),
                    request_id = %request.request_id,
                    result = %result,
                    "Request completed"
                );
                request.complete(result);
            }
            Ok(Err(failure)) => {
                warn!(
                    queue = %handler.name(),
                    request_id = %request.request_id,
                    code = %failure.code,
                    detail = %failure.detail,
                    "Request failed"
                );
                request.fail(&failure);
            }
            Err(_) => {
                error!(
                    queue = %handler.name(),
                    request_id = %request.request_id,
                    "Handler panicked"
                );
                request.fail(&Failure::operation("HANDLER_PANIC", "handler panicked"));
            }
        }
    }
}

impl<H: RequestHandler> PollJob for QueueProcessor<H> {
    fn name(&self) -> &str {
        self.handler.name()
    }

    fn poll(&self) -> Result<()> {
        self.run_cycle().map(|_| ())
    }
}

/// Append a request to a queue file, as the management process would.
///
/// A blank `requestId` is replaced with a time-ordered UUID. Returns the id.
pub fn enqueue<P>(path: &Path, mut request: Request<P>) -> Result<String>
where
    P: Serialize + DeserializeOwned,
{
    if request.request_id.trim().is_empty() {
        request.request_id = Uuid::now_v7().to_string();
    }
    let request_id = request.request_id.clone();

    // Other entries are carried over as-is, decodable or not
    let mut queue = load_json::<Option<RawQueue>>(path)?
        .flatten()
        .unwrap_or_default();
    queue
        .requests
        .push(serde_json::to_value(&request).context("Failed to encode request")?);
    save_json(path, &queue)?;

    debug!(path = %path.display(), request_id = %request_id, "Request enqueued");
    Ok(request_id)
}
