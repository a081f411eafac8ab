use crate::error::{RemoteError, ValidationError};
use crate::mate::audit;
use crate::mate::heuristic;
use crate::mate::history::{HistoryRecord, HistoryStore};
use crate::mate::remote::RemoteSummarizer;
use crate::mate::summary::{ProducedBy, SummaryOutcome, SummaryRequest};
use crate::mate::text_metrics::{self, ValidatedText};
use crate::mate::warn;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

pub const WATCHDOG_SECS: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    AttemptingPrimary,
    AttemptingSecondary,
    Finalizing,
    Done,
    Rejected,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Validating => "validating",
            Phase::AttemptingPrimary => "attempting_primary",
            Phase::AttemptingSecondary => "attempting_secondary",
            Phase::Finalizing => "finalizing",
            Phase::Done => "done",
            Phase::Rejected => "rejected",
        }
    }
}

/// Result of one accepted request. `record` is `None` when history
/// persistence failed.
#[derive(Debug, Clone)]
pub struct Summarization {
    pub outcome: SummaryOutcome,
    pub record: Option<HistoryRecord>,
}

type RemoteResult = Result<(String, ProducedBy), RemoteError>;

pub struct Orchestrator {
    remote: Arc<dyn RemoteSummarizer>,
    history: Arc<HistoryStore>,
    watchdog: Duration,
    audit_log: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(remote: Arc<dyn RemoteSummarizer>, history: Arc<HistoryStore>) -> Self {
        Self {
            remote,
            history,
            watchdog: Duration::from_secs(WATCHDOG_SECS),
            audit_log: None,
        }
    }

    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    pub fn with_audit_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_log = Some(path.into());
        self
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Validate, summarize through the remote chain or the heuristic, and
    /// record the outcome in history. Only validation failures are returned
    /// as errors.
    pub fn summarize(&self, request: &SummaryRequest) -> Result<Summarization, ValidationError> {
        tracing::debug!(phase = Phase::Validating.label(), kind = %request.summary_kind);
        let validated = match text_metrics::validate(&request.text) {
            Ok(validated) => validated,
            Err(err) => {
                tracing::debug!(phase = Phase::Rejected.label(), %err);
                return Err(err);
            }
        };

        let finalized = Arc::new(AtomicBool::new(false));
        let remote_result = self.race_remote(&validated, &finalized);
        // late worker results after this point are dropped
        finalized.store(true, Ordering::SeqCst);
        tracing::debug!(phase = Phase::Finalizing.label());

        let (summary_text, produced_by) = match remote_result {
            Some(Ok(produced)) => produced,
            Some(Err(err)) => {
                warn::emit(
                    err.code(),
                    "remote",
                    "fallback_heuristic",
                    "remote summarization failed",
                    &err.to_string(),
                );
                self.heuristic(&validated, request)
            }
            None => self.heuristic(&validated, request),
        };

        let outcome = SummaryOutcome {
            summary_text,
            produced_by,
            original_text: validated.original.clone(),
            word_count: validated.word_count,
            summary_kind: request.summary_kind,
        };

        let record = match self.history.create(&outcome) {
            Ok(record) => Some(record),
            Err(err) => {
                warn::emit(
                    "E202_HISTORY_WRITE",
                    "finalize",
                    "skip_history",
                    "history record not saved",
                    &err.to_string(),
                );
                None
            }
        };

        self.audit(&outcome);
        tracing::info!(
            phase = Phase::Done.label(),
            produced_by = outcome.produced_by.label(),
            words = outcome.word_count,
            "summary ready"
        );
        Ok(Summarization { outcome, record })
    }

    /// Run the remote chain on a worker thread and wait at most the watchdog
    /// delay. `None` means no remote result is usable.
    fn race_remote(
        &self,
        validated: &ValidatedText,
        finalized: &Arc<AtomicBool>,
    ) -> Option<RemoteResult> {
        let (tx, rx) = mpsc::channel();
        let remote = Arc::clone(&self.remote);
        let worker_flag = Arc::clone(finalized);
        let text = validated.cleaned.clone();

        let spawned = thread::Builder::new()
            .name("mate-remote".to_string())
            .spawn(move || {
                let result = run_remote_chain(remote.as_ref(), &text, &worker_flag);
                // receiver is gone once the watchdog has fired
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            warn::emit(
                "E106_WORKER_SPAWN",
                "remote",
                "fallback_heuristic",
                "could not start remote worker",
                &err.to_string(),
            );
            return None;
        }

        match rx.recv_timeout(self.watchdog) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => {
                warn::emit(
                    "E107_WATCHDOG",
                    "remote",
                    "fallback_heuristic",
                    "watchdog fired before remote result",
                    &format!("{}ms", self.watchdog.as_millis()),
                );
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn::emit(
                    "E108_WORKER_LOST",
                    "remote",
                    "fallback_heuristic",
                    "remote worker exited without a result",
                    "disconnected",
                );
                None
            }
        }
    }

    fn heuristic(&self, validated: &ValidatedText, request: &SummaryRequest) -> (String, ProducedBy) {
        (
            heuristic::generate(&validated.cleaned, request.summary_kind),
            ProducedBy::Heuristic,
        )
    }

    fn audit(&self, outcome: &SummaryOutcome) {
        let Some(path) = &self.audit_log else {
            return;
        };
        let message = format!(
            "kind={} words={}",
            outcome.summary_kind, outcome.word_count
        );
        if let Err(err) = audit::append_event(path, "summarize", outcome.produced_by.label(), &message) {
            warn::emit(
                "E204_AUDIT_WRITE",
                "finalize",
                "skip_audit",
                "audit event not written",
                &format!("{err:#}"),
            );
        }
    }
}

/// Blank text from any summarizer counts as an empty result.
fn non_empty(result: Result<String, RemoteError>) -> Result<String, RemoteError> {
    let summary = result?;
    let trimmed = summary.trim();
    if trimmed.is_empty() {
        return Err(RemoteError::EmptyResult);
    }
    Ok(trimmed.to_string())
}

fn run_remote_chain(remote: &dyn RemoteSummarizer, text: &str, finalized: &AtomicBool) -> RemoteResult {
    tracing::debug!(phase = Phase::AttemptingPrimary.label());
    let primary_err = match non_empty(remote.summarize_primary(text)) {
        Ok(summary) => return Ok((summary, ProducedBy::PrimaryModel)),
        Err(err) => err,
    };
    if !primary_err.routes_to_secondary() || finalized.load(Ordering::SeqCst) {
        return Err(primary_err);
    }

    warn::emit(
        primary_err.code(),
        "primary",
        "try_secondary",
        "primary model unusable",
        &primary_err.to_string(),
    );
    tracing::debug!(phase = Phase::AttemptingSecondary.label());
    non_empty(remote.summarize_secondary(text)).map(|summary| (summary, ProducedBy::SecondaryModel))
}
