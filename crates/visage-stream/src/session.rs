//! One analysis stream.
//!
//! Frame processing is synchronous and does no I/O. Narration happens on a
//! single worker task per session fed through a one-moment pending slot:
//!
//! ```text
//! process_frame ──► gate ──accepted──► slot [latest] ──► worker ──► oracle
//!                                        │ replaced               │
//!                                        ▼                        ▼
//!                                    Superseded             Completed/Failed
//! ```
//!
//! At most one narrative is in flight; while it runs, only the newest
//! accepted moment waits. Closing or dropping the session hands a waiting
//! moment back to the worker, which records it as `Cancelled` before exiting.
//! Only `close` joins the worker.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use visage_agents::{narrate_with_timeout, NarrativeOracle, NarrativeRequest};
use visage_analysis::{
    BodyLanguageReport, DeceptionReport, FidgetTracker, StressHistory, StressInput, StressReport, FIDGETING,
};
use visage_core::{
    AnalysisMoment, Detection, DetectionSet, FrameLandmarks, Result, SessionId, SubjectKind,
};
use visage_gestures::FrameEvaluation;

use crate::engine::VisageEngine;
use crate::gate::{GateDecision, GateInput, SignificanceGate};
use crate::sink::{MomentRecord, MomentSink, NarrativeOutcome, NarrativeStatus};
use crate::summary::MomentSummary;

/// Everything derived from one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_number: u64,
    pub timestamp: f64,
    pub evaluation: FrameEvaluation,
    /// Face, pose and hand primitives plus fidgeting and body-language patterns
    pub detections: DetectionSet,
    /// Present only when the frame has a pose
    pub body_language: Option<BodyLanguageReport>,
    pub stress: StressReport,
    pub gate: GateDecision,
    /// Scored for accepted moments only
    pub deception: Option<DeceptionReport>,
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<AnalysisMoment>,
    superseded: Vec<AnalysisMoment>,
    /// Waiting moment taken at close, recorded by the worker on exit
    cancelled: Option<AnalysisMoment>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Notify,
}

impl Shared {
    /// Stop accepting work; returns the frame number of a cancelled moment
    fn close(&self) -> Option<u64> {
        let cancelled = {
            let mut slot = self.slot.lock();
            slot.closed = true;
            if let Some(moment) = slot.latest.take() {
                slot.cancelled = Some(moment);
            }
            slot.cancelled.as_ref().map(|m| m.frame_number)
        };
        self.wake.notify_one();
        cancelled
    }
}

/// Per-session state; never shared between streams
pub struct StreamSession {
    id: SessionId,
    engine: Arc<VisageEngine>,
    gate: SignificanceGate,
    fidget: FidgetTracker,
    stress_history: StressHistory,
    expression_history: VecDeque<String>,
    moments: Vec<AnalysisMoment>,
    frames: u64,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl StreamSession {
    pub(crate) fn start(engine: Arc<VisageEngine>, runtime: &Handle) -> Result<Self> {
        let id = SessionId::new();
        let config = &engine.config;
        let gate = SignificanceGate::new(config.gate.clone())?;
        let fidget = FidgetTracker::new(config.fidget.clone());
        let stress_history = StressHistory::new(config.stress.history_len);

        let shared = Arc::new(Shared::default());
        let worker = NarrativeWorker {
            session_id: id,
            shared: Arc::clone(&shared),
            oracle: Arc::clone(&engine.oracle),
            sink: Arc::clone(&engine.sink),
            timeout: config.narrative.timeout(),
        };
        let handle = runtime.spawn(worker.run());

        info!(session = %id, "Session started");

        Ok(Self {
            id,
            engine,
            gate,
            fidget,
            stress_history,
            expression_history: VecDeque::new(),
            moments: Vec::new(),
            frames: 0,
            shared,
            worker: Some(handle),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn gate(&self) -> &SignificanceGate {
        &self.gate
    }

    pub fn stress_history(&self) -> &StressHistory {
        &self.stress_history
    }

    /// Accepted moments so far, without narratives
    pub fn moments(&self) -> &[AnalysisMoment] {
        &self.moments
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Evaluate, score and gate one frame
    pub fn process_frame(&mut self, frame: &FrameLandmarks) -> FrameReport {
        let frame_number = self.frames;
        self.frames += 1;

        let engine = Arc::clone(&self.engine);
        let evaluation = engine.evaluator.evaluate_frame(frame);
        let face = frame.primary(SubjectKind::Face);
        let pose = frame.primary(SubjectKind::Pose);
        let hands = frame.hands();

        let mut detections = evaluation.merged();
        let fidget = self.fidget.observe(pose);
        let fidgeting = (fidget > 0.0).then(|| Detection::new(FIDGETING, fidget));
        if let Some(d) = &fidgeting {
            detections.insert(d.clone());
        }

        let body_language = pose.map(|_| {
            let mut primitives = evaluation.body();
            if let Some(d) = &fidgeting {
                primitives.insert(d.clone());
            }
            engine.body_language.analyze(&primitives)
        });
        if let Some(report) = &body_language {
            for pattern in &report.patterns {
                detections.insert(pattern.clone());
            }
        }

        let stress = engine.stress.score(
            &StressInput {
                face,
                pose,
                hands: &hands,
            },
            &self.stress_history,
        );
        if !frame.sets.is_empty() {
            self.stress_history.record(&stress);
        }

        let gate = self.gate.observe(GateInput {
            timestamp: frame.timestamp,
            frame_number,
            face,
            detections: &detections,
        });

        let deception = match &gate {
            GateDecision::Accepted(moment) => {
                let report = self.score_deception(&evaluation, body_language.as_ref());
                self.remember(moment);
                Some(report)
            }
            GateDecision::Rejected(_) => None,
        };

        debug!(
            session = %self.id,
            frame = frame_number,
            labels = detections.len(),
            skipped = evaluation.skipped,
            stress = stress.percentage,
            "Frame processed"
        );

        FrameReport {
            frame_number,
            timestamp: frame.timestamp,
            evaluation,
            detections,
            body_language,
            stress,
            gate,
            deception,
        }
    }

    fn score_deception(
        &self,
        evaluation: &FrameEvaluation,
        body_language: Option<&BodyLanguageReport>,
    ) -> DeceptionReport {
        let facial: Vec<String> = evaluation
            .primary(SubjectKind::Face)
            .map(|set| set.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default();
        let patterns = body_language.map(|r| r.patterns.as_slice()).unwrap_or_default();
        let history: Vec<String> = self.expression_history.iter().cloned().collect();

        self.engine.deception.analyze(&facial, patterns, &history)
    }

    fn remember(&mut self, moment: &AnalysisMoment) {
        self.expression_history.push_back(moment.detections.label_text());
        while self.expression_history.len() > self.engine.config.session.expression_history {
            self.expression_history.pop_front();
        }
        self.moments.push(moment.clone());
        self.enqueue(moment.clone());
    }

    /// Keep only the most recent waiting moment
    fn enqueue(&self, moment: AnalysisMoment) {
        {
            let mut slot = self.shared.slot.lock();
            if let Some(replaced) = slot.latest.replace(moment) {
                warn!(
                    session = %self.id,
                    frame = replaced.frame_number,
                    "Pending moment superseded"
                );
                slot.superseded.push(replaced);
            }
        }
        self.shared.wake.notify_one();
    }

    pub fn summary(&self) -> MomentSummary {
        MomentSummary::from_moments(&self.moments)
    }

    /// Cancel what is still waiting, join the worker and drop the stream state
    pub async fn close(mut self) -> MomentSummary {
        if let Some(frame) = self.shared.close() {
            debug!(session = %self.id, frame, "Cancelling waiting moment");
        }

        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.await {
                warn!(session = %self.id, error = %e, "Narrative worker ended abnormally");
            }
        }

        self.gate.reset();
        let summary = self.summary();
        info!(
            session = %self.id,
            frames = self.frames,
            moments = summary.total_analyses,
            "Session closed"
        );
        summary
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        // lets the worker drain and exit when close() was skipped
        if self.worker.is_some() {
            if let Some(frame) = self.shared.close() {
                warn!(
                    session = %self.id,
                    frame,
                    "Session dropped without close; waiting moment cancelled"
                );
            }
        }
    }
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("frames", &self.frames)
            .field("moments", &self.moments.len())
            .finish()
    }
}

struct NarrativeWorker {
    session_id: SessionId,
    shared: Arc<Shared>,
    oracle: Arc<dyn NarrativeOracle>,
    sink: Arc<dyn MomentSink>,
    timeout: Duration,
}

impl NarrativeWorker {
    async fn run(self) {
        loop {
            let (superseded, latest, cancelled, closed) = {
                let mut slot = self.shared.slot.lock();
                (
                    std::mem::take(&mut slot.superseded),
                    slot.latest.take(),
                    slot.cancelled.take(),
                    slot.closed,
                )
            };

            for moment in superseded {
                self.persist(MomentRecord::new(self.session_id, moment, NarrativeStatus::Superseded))
                    .await;
            }

            if let Some(moment) = latest {
                self.narrate(moment).await;
                continue;
            }
            if closed {
                if let Some(moment) = cancelled {
                    self.persist(MomentRecord::new(self.session_id, moment, NarrativeStatus::Cancelled))
                        .await;
                }
                break;
            }
            self.shared.wake.notified().await;
        }
        debug!(session = %self.session_id, "Narrative worker stopped");
    }

    async fn persist(&self, record: MomentRecord) {
        if let Err(e) = self.sink.record(record).await {
            warn!(session = %self.session_id, error = %e, "Failed to record moment");
        }
    }

    async fn narrate(&self, moment: AnalysisMoment) {
        let request = NarrativeRequest::new(moment.labels());
        let record = MomentRecord::new(self.session_id, moment, NarrativeStatus::Pending);
        let id = record.id;
        self.persist(record).await;

        let outcome = match narrate_with_timeout(self.oracle.as_ref(), &request, self.timeout).await {
            Ok(response) => {
                info!(
                    session = %self.session_id,
                    generation_time_ms = response.generation_time_ms,
                    "Narrative completed"
                );
                NarrativeOutcome::completed(response.content)
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "Narrative failed");
                NarrativeOutcome::failed(e.to_string())
            }
        };

        if let Err(e) = self.sink.finish(self.session_id, id, outcome).await {
            warn!(session = %self.session_id, error = %e, "Failed to settle moment");
        }
    }
}
