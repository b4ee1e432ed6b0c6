//! Persistence boundary for analysis moments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use visage_core::{AnalysisMoment, Error, Result, SessionId};

/// Where a moment's narrative stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStatus {
    /// Handed to the oracle, no answer yet
    Pending,
    Completed,
    /// Oracle failed; the moment is kept without narrative
    Failed,
    /// Replaced in the pending slot by a newer moment before narration
    Superseded,
    /// Session closed before narration
    Cancelled,
}

impl NarrativeStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, NarrativeStatus::Pending)
    }
}

/// One persisted moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentRecord {
    pub id: Uuid,
    pub session_id: SessionId,
    pub recorded_at: DateTime<Utc>,
    pub moment: AnalysisMoment,
    pub status: NarrativeStatus,
    /// Oracle failure message when `status` is `Failed`
    pub error: Option<String>,
}

impl MomentRecord {
    pub fn new(session_id: SessionId, moment: AnalysisMoment, status: NarrativeStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            recorded_at: Utc::now(),
            moment,
            status,
            error: None,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.moment.labels()
    }
}

/// Final outcome written over a pending record
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeOutcome {
    pub status: NarrativeStatus,
    pub narrative: Option<String>,
    pub error: Option<String>,
}

impl NarrativeOutcome {
    pub fn completed(narrative: String) -> Self {
        Self {
            status: NarrativeStatus::Completed,
            narrative: Some(narrative),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: NarrativeStatus::Failed,
            narrative: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait MomentSink: Send + Sync {
    async fn record(&self, record: MomentRecord) -> Result<()>;

    /// Settle a previously recorded moment
    async fn finish(&self, session_id: SessionId, id: Uuid, outcome: NarrativeOutcome) -> Result<()>;
}

/// Process-local sink keyed by session
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: RwLock<HashMap<SessionId, Vec<MomentRecord>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of one session in arrival order
    pub fn records(&self, session_id: SessionId) -> Vec<MomentRecord> {
        self.records
            .read()
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear_session(&self, session_id: SessionId) {
        self.records.write().remove(&session_id);
    }
}

#[async_trait]
impl MomentSink for InMemorySink {
    async fn record(&self, record: MomentRecord) -> Result<()> {
        self.records
            .write()
            .entry(record.session_id)
            .or_default()
            .push(record);
        Ok(())
    }

    async fn finish(&self, session_id: SessionId, id: Uuid, outcome: NarrativeOutcome) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&session_id)
            .and_then(|r| r.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| Error::InvalidInput(format!("no pending moment {id} in session {session_id}")))?;

        record.status = outcome.status;
        record.moment.narrative = outcome.narrative;
        record.error = outcome.error;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::DetectionSet;

    fn moment(t: f64) -> AnalysisMoment {
        AnalysisMoment::new(t, 0, DetectionSet::from_names(["smile"]), 1.0)
    }

    #[tokio::test]
    async fn test_record_and_finish() {
        let sink = InMemorySink::new();
        let session = SessionId::new();
        let record = MomentRecord::new(session, moment(1.0), NarrativeStatus::Pending);
        let id = record.id;

        sink.record(record).await.unwrap();
        sink.finish(session, id, NarrativeOutcome::completed("calm".to_string()))
            .await
            .unwrap();

        let records = sink.records(session);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, NarrativeStatus::Completed);
        assert_eq!(records[0].moment.narrative.as_deref(), Some("calm"));
    }

    #[tokio::test]
    async fn test_sessions_are_separate() {
        let sink = InMemorySink::new();
        let (a, b) = (SessionId::new(), SessionId::new());
        sink.record(MomentRecord::new(a, moment(1.0), NarrativeStatus::Superseded))
            .await
            .unwrap();

        assert_eq!(sink.records(a).len(), 1);
        assert!(sink.records(b).is_empty());

        sink.clear_session(a);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_finish_unknown_record() {
        let sink = InMemorySink::new();
        let result = sink
            .finish(SessionId::new(), Uuid::new_v4(), NarrativeOutcome::failed("boom"))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
