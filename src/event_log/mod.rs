//! Bounded append logs.
//!
//! A [`BoundedLog`] keeps one capped document per subject (or a single
//! shared document), cached in memory and written through to disk after
//! every append. The oldest entries are evicted once the cap is exceeded.
//! Persistence failures are logged and never roll back the cached state.

use crate::persistence::{load_json, save_json};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, warn};

pub mod inventory;
pub mod life;
pub mod trade;

pub use inventory::{classify_transfer, InventoryEvent, InventoryEventLogger, InventoryEventType, Owner};
pub use life::{Killer, LifeEvent, LifeEventLogger, LifeEventType};
pub use trade::{TradeEvent, TradeEventType, TradeLog, TradeLogger, TradedItem, Trader};

#[cfg(test)]
mod tests;

/// A persisted document holding an ordered list of entries.
pub trait SubjectLog: Serialize + DeserializeOwned + Clone + Send + Sync {
    type Entry;

    /// Empty document for a subject seen for the first time
    fn create(subject_id: &str, subject_name: &str) -> Self;

    fn entries(&self) -> &[Self::Entry];

    fn entries_mut(&mut self) -> &mut Vec<Self::Entry>;

    /// Update running aggregates for a newly appended entry.
    fn record(&mut self, _entry: &Self::Entry) {}
}

/// Where documents live on disk
#[derive(Debug, Clone)]
pub enum LogLayout {
    /// `<dir>/<subject><suffix>`
    PerSubject { dir: PathBuf, suffix: String },
    /// One document regardless of subject
    Single(PathBuf),
}

/// Capacity-limited, write-through log keyed by subject.
pub struct BoundedLog<L: SubjectLog> {
    layout: LogLayout,
    cap: usize,
    cache: DashMap<String, L>,
}

impl<L: SubjectLog> BoundedLog<L> {
    pub fn new(layout: LogLayout, cap: usize) -> Self {
        Self {
            layout,
            cap,
            cache: DashMap::new(),
        }
    }

    pub fn per_subject(dir: impl Into<PathBuf>, suffix: &str, cap: usize) -> Self {
        Self::new(
            LogLayout::PerSubject {
                dir: dir.into(),
                suffix: suffix.to_string(),
            },
            cap,
        )
    }

    pub fn single(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self::new(LogLayout::Single(path.into()), cap)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// File backing `subject`'s document
    pub fn path_for(&self, subject: &str) -> PathBuf {
        match &self.layout {
            LogLayout::PerSubject { dir, suffix } => dir.join(format!("{}{}", subject, suffix)),
            LogLayout::Single(path) => path.clone(),
        }
    }

    fn cache_key<'a>(&self, subject: &'a str) -> &'a str {
        match self.layout {
            LogLayout::PerSubject { .. } => subject,
            LogLayout::Single(_) => "",
        }
    }

    /// Append one entry and persist. Returns the retained length.
    pub fn append(&self, subject: &str, subject_name: &str, entry: L::Entry) -> usize {
        self.append_all(subject, subject_name, std::iter::once(entry))
    }

    /// Append entries in order, evict down to the cap and persist once.
    pub fn append_all(
        &self,
        subject: &str,
        subject_name: &str,
        entries: impl IntoIterator<Item = L::Entry>,
    ) -> usize {
        let key = self.cache_key(subject);
        let path = self.path_for(subject);

        // The entry guard serializes writers of the same document
        let mut doc = self
            .cache
            .entry(key.to_string())
            .or_insert_with(|| self.load_or_create(subject, subject_name));

        for entry in entries {
            doc.record(&entry);
            doc.entries_mut().push(entry);
        }

        let len = doc.entries().len();
        if len > self.cap {
            let excess = len - self.cap;
            doc.entries_mut().drain(..excess);
            debug!(path = %path.display(), evicted = excess, "Evicted oldest log entries");
        }

        if let Err(e) = save_json(&path, &*doc) {
            error!(error = %e, path = %path.display(), "Failed to persist log");
        }

        doc.entries().len()
    }

    /// Current document for `subject`, from cache or disk.
    pub fn get(&self, subject: &str) -> Option<L> {
        let key = self.cache_key(subject);
        if let Some(doc) = self.cache.get(key) {
            return Some(doc.clone());
        }
        match load_json::<L>(&self.path_for(subject)) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, subject = %subject, "Failed to load log");
                None
            }
        }
    }

    fn load_or_create(&self, subject: &str, subject_name: &str) -> L {
        let path = self.path_for(subject);
        match load_json::<L>(&path) {
            Ok(Some(doc)) => doc,
            Ok(None) => L::create(subject, subject_name),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Unreadable log, starting fresh");
                L::create(subject, subject_name)
            }
        }
    }
}
