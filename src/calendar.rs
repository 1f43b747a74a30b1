//! Calendar mirroring interface.
//!
//! The reconciler keeps at most one external calendar event per due-dated
//! work item. Calls are best-effort: a mirror failure is logged by the
//! caller and never rolls back local row mutations. A real API client is
//! out of scope; embedders supply their own implementation.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    /// The calendar service rejected the request.
    #[error("calendar request rejected: {0}")]
    Rejected(String),
    /// The calendar service could not be reached.
    #[error("calendar unavailable: {0}")]
    Unavailable(String),
}

/// Result of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The event was already gone. Treated as success so that retries and
    /// out-of-band deletions stay harmless.
    NotFound,
}

/// One-way mirror of due-dated work items into an external calendar.
pub trait CalendarMirror: Send + Sync {
    /// Create an all-day event, returning the external event identifier.
    fn create_event(
        &self,
        summary: &str,
        description: &str,
        date: NaiveDate,
    ) -> Result<String, CalendarError>;

    /// Delete an event by its external identifier.
    fn delete_event(&self, event_id: &str) -> Result<DeleteOutcome, CalendarError>;
}

/// A stored calendar event, as recorded by [`InMemoryMirror`].
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredEvent {
    pub summary: String,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Default)]
struct MirrorState {
    events: HashMap<String, MirroredEvent>,
    delete_log: Vec<String>,
    next_id: u64,
    fail_create: bool,
    fail_delete: bool,
}

/// In-memory [`CalendarMirror`] for tests and embedding without an
/// external service. Records every delete call and supports failure
/// injection.
#[derive(Default)]
pub struct InMemoryMirror {
    state: Mutex<MirrorState>,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `create_event` calls fail.
    pub fn fail_creates(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    /// Make subsequent `delete_event` calls fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete = fail;
    }

    pub fn event(&self, event_id: &str) -> Option<MirroredEvent> {
        self.state.lock().unwrap().events.get(event_id).cloned()
    }

    pub fn event_count(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    /// Every event identifier `delete_event` has been called with, in
    /// call order, whether or not the event existed.
    pub fn delete_log(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_log.clone()
    }
}

impl CalendarMirror for InMemoryMirror {
    fn create_event(
        &self,
        summary: &str,
        description: &str,
        date: NaiveDate,
    ) -> Result<String, CalendarError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(CalendarError::Unavailable("injected failure".into()));
        }
        state.next_id += 1;
        let event_id = format!("evt-{}", state.next_id);
        state.events.insert(
            event_id.clone(),
            MirroredEvent {
                summary: summary.to_string(),
                description: description.to_string(),
                date,
            },
        );
        Ok(event_id)
    }

    fn delete_event(&self, event_id: &str) -> Result<DeleteOutcome, CalendarError> {
        let mut state = self.state.lock().unwrap();
        state.delete_log.push(event_id.to_string());
        if state.fail_delete {
            return Err(CalendarError::Unavailable("injected failure".into()));
        }
        match state.events.remove(event_id) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn create_then_delete_round_trips() {
        let mirror = InMemoryMirror::new();
        let id = mirror
            .create_event("Write report", "Quarterly report", date("2026-09-01"))
            .unwrap();

        assert_eq!(mirror.event(&id).unwrap().summary, "Write report");
        assert_eq!(mirror.delete_event(&id).unwrap(), DeleteOutcome::Deleted);
        assert_eq!(mirror.event_count(), 0);
    }

    #[test]
    fn deleting_missing_event_is_not_found() {
        let mirror = InMemoryMirror::new();
        assert_eq!(
            mirror.delete_event("evt-nope").unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(mirror.delete_log(), vec!["evt-nope".to_string()]);
    }

    #[test]
    fn injected_failures_surface_as_errors() {
        let mirror = InMemoryMirror::new();
        mirror.fail_creates(true);
        assert!(mirror
            .create_event("x", "", date("2026-01-01"))
            .is_err());

        mirror.fail_creates(false);
        let id = mirror.create_event("x", "", date("2026-01-01")).unwrap();
        mirror.fail_deletes(true);
        assert!(mirror.delete_event(&id).is_err());
        // The failed call is still logged.
        assert_eq!(mirror.delete_log(), vec![id]);
    }
}
