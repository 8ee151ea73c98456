use super::{Failure, FailureKind};
use crate::event_log::SubjectLog;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state; `pending` is the only non-terminal one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

// Absent, null, blank and unrecognized values all read as pending
impl<'de> Deserialize<'de> for RequestStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => RequestStatus::Completed,
            "failed" => RequestStatus::Failed,
            _ => RequestStatus::Pending,
        })
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One unit of work plus the outcome fields the bridge fills in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<P> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(flatten)]
    pub payload: P,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processed: bool,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl<P> Request<P> {
    pub fn new(payload: P) -> Self {
        Self {
            request_id: String::new(),
            payload,
            processed: false,
            status: RequestStatus::Pending,
            result: String::new(),
            processed_at: None,
            error_kind: None,
        }
    }

    pub fn with_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Already handled in an earlier cycle
    pub fn is_settled(&self) -> bool {
        self.processed || self.status.is_terminal()
    }

    pub fn complete(&mut self, result: impl Into<String>) {
        self.status = RequestStatus::Completed;
        self.result = result.into();
        self.error_kind = None;
    }

    pub fn fail(&mut self, failure: &Failure) {
        self.status = RequestStatus::Failed;
        self.result = failure.code.clone();
        self.error_kind = Some(failure.kind);
    }
}

/// Queue document: `{ "requests": [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
pub struct QueueFile<P> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub requests: Vec<Request<P>>,
}

impl<P> QueueFile<P> {
    pub fn empty() -> Self {
        Self {
            requests: Vec::new(),
        }
    }
}

impl<P> Default for QueueFile<P> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Queue document with each request left undecoded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RawQueue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: Vec<Value>,
}

/// One queue element, decoded or rejected as it stood in the file
pub(crate) enum QueueEntry<P> {
    Valid(Request<P>),
    Invalid {
        raw: Map<String, Value>,
        reason: String,
    },
}

impl<P: DeserializeOwned> QueueEntry<P> {
    pub fn decode(value: Value) -> Self {
        match serde_json::from_value::<Request<P>>(value.clone()) {
            Ok(request) => QueueEntry::Valid(request),
            Err(e) => {
                let raw = match value {
                    Value::Object(map) => map,
                    other => {
                        let mut map = Map::new();
                        map.insert("entry".to_string(), other);
                        map
                    }
                };
                QueueEntry::Invalid {
                    raw,
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl<P> QueueEntry<P> {
    pub fn request_id(&self) -> &str {
        match self {
            QueueEntry::Valid(request) => &request.request_id,
            QueueEntry::Invalid { raw, .. } => {
                raw.get("requestId").and_then(Value::as_str).unwrap_or("")
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        match self {
            QueueEntry::Valid(request) => request.is_settled(),
            QueueEntry::Invalid { raw, .. } => {
                let processed = raw
                    .get("processed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let terminal = raw
                    .get("status")
                    .and_then(|status| RequestStatus::deserialize(status).ok())
                    .is_some_and(|status| status.is_terminal());
                processed || terminal
            }
        }
    }
}

/// Stamp an undecodable queue element as failed, keeping its other fields
pub(crate) fn reject_raw(mut raw: Map<String, Value>, failure: &Failure) -> Value {
    raw.insert("processed".to_string(), Value::Bool(true));
    raw.insert(
        "status".to_string(),
        serde_json::to_value(RequestStatus::Failed).unwrap_or_default(),
    );
    raw.insert("result".to_string(), Value::String(failure.code.clone()));
    raw.insert(
        "processedAt".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );
    raw.insert(
        "errorKind".to_string(),
        serde_json::to_value(failure.kind).unwrap_or_default(),
    );
    Value::Object(raw)
}

/// Capped history of processed requests, same shape as the queue.
///
/// Entries are kept as JSON so rejected requests retain whatever fields
/// they arrived with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsLog {
    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: Vec<Value>,
}

impl ResultsLog {
    pub fn contains_id(&self, request_id: &str) -> bool {
        self.requests
            .iter()
            .any(|r| r.get("requestId").and_then(Value::as_str) == Some(request_id))
    }
}

impl SubjectLog for ResultsLog {
    type Entry = Value;

    fn create(_subject_id: &str, _subject_name: &str) -> Self {
        Self::default()
    }

    fn entries(&self) -> &[Value] {
        &self.requests
    }

    fn entries_mut(&mut self) -> &mut Vec<Value> {
        &mut self.requests
    }
}
