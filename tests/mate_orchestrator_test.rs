use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use summarize_mate::{
    HistoryStore, MemoryBackend, Orchestrator, ProducedBy, RemoteError, RemoteSummarizer,
    StorageBackend, StorageError, SummaryKind, SummaryRequest, ValidationError,
};

const PHOENIX: &str =
    "Project Phoenix launch is scheduled for next spring across all regional offices.";

struct FakeRemote {
    primary: Result<String, RemoteError>,
    secondary: Result<String, RemoteError>,
    primary_delay: Duration,
    primary_calls: AtomicUsize,
    secondary_calls: AtomicUsize,
}

impl FakeRemote {
    fn new(primary: Result<String, RemoteError>, secondary: Result<String, RemoteError>) -> Self {
        Self {
            primary,
            secondary,
            primary_delay: Duration::ZERO,
            primary_calls: AtomicUsize::new(0),
            secondary_calls: AtomicUsize::new(0),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.primary_delay = delay;
        self
    }
}

impl RemoteSummarizer for FakeRemote {
    fn summarize_primary(&self, _text: &str) -> Result<String, RemoteError> {
        self.primary_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.primary_delay);
        self.primary.clone()
    }

    fn summarize_secondary(&self, _text: &str) -> Result<String, RemoteError> {
        self.secondary_calls.fetch_add(1, Ordering::SeqCst);
        self.secondary.clone()
    }
}

#[derive(Default)]
struct CountingBackend {
    inner: MemoryBackend,
    writes: AtomicUsize,
}

impl StorageBackend for &'static CountingBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key)
    }
}

fn wire(remote: &Arc<FakeRemote>) -> (Orchestrator, &'static CountingBackend) {
    let backend: &'static CountingBackend = Box::leak(Box::new(CountingBackend::default()));
    let history = Arc::new(HistoryStore::new(Box::new(backend)));
    let remote: Arc<dyn RemoteSummarizer> = Arc::clone(remote) as Arc<dyn RemoteSummarizer>;
    (Orchestrator::new(remote, history), backend)
}

fn request(kind: SummaryKind) -> SummaryRequest {
    SummaryRequest::new(PHOENIX, kind)
}

#[test]
fn mate_orchestrator_offline_phoenix_produces_heuristic_record() {
    let remote = Arc::new(FakeRemote::new(
        Err(RemoteError::Network("offline".into())),
        Err(RemoteError::Network("offline".into())),
    ));
    let (orch, backend) = wire(&remote);

    let got = orch.summarize(&request(SummaryKind::Brief)).expect("summarize");
    assert_eq!(got.outcome.produced_by, ProducedBy::Heuristic);
    assert_eq!(got.outcome.word_count, 12);
    assert!(got.outcome.summary_text.contains("Project Phoenix"));

    let record = got.record.expect("record");
    assert!(record.tags.iter().any(|t| t == "project"));
    assert_eq!(record.read_time_minutes, 1);
    assert_eq!(record.original_text, PHOENIX);
    assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn mate_orchestrator_empty_primary_result_uses_secondary() {
    let remote = Arc::new(FakeRemote::new(
        Err(RemoteError::EmptyResult),
        Ok("Phoenix launches next spring.".into()),
    ));
    let (orch, backend) = wire(&remote);

    let got = orch.summarize(&request(SummaryKind::Brief)).expect("summarize");
    assert_eq!(got.outcome.produced_by, ProducedBy::SecondaryModel);
    assert_eq!(got.outcome.summary_text, "Phoenix launches next spring.");
    assert_eq!(remote.secondary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn mate_orchestrator_secondary_failure_falls_back_to_heuristic() {
    let remote = Arc::new(FakeRemote::new(
        Err(RemoteError::HttpError {
            status: 400,
            body: "bad input".into(),
        }),
        Err(RemoteError::HttpError {
            status: 503,
            body: "loading".into(),
        }),
    ));
    let (orch, _) = wire(&remote);

    let got = orch.summarize(&request(SummaryKind::Bullet)).expect("summarize");
    assert_eq!(got.outcome.produced_by, ProducedBy::Heuristic);
    assert!(got.outcome.summary_text.starts_with("• Primary focus: Project Phoenix"));
    assert_eq!(remote.secondary_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn mate_orchestrator_primary_timeout_skips_secondary() {
    let remote = Arc::new(FakeRemote::new(
        Err(RemoteError::Timeout(15)),
        Ok("unused".into()),
    ));
    let (orch, _) = wire(&remote);

    let got = orch.summarize(&request(SummaryKind::Detailed)).expect("summarize");
    assert_eq!(got.outcome.produced_by, ProducedBy::Heuristic);
    assert_eq!(remote.secondary_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn mate_orchestrator_rejects_out_of_range_input_without_side_effects() {
    let remote = Arc::new(FakeRemote::new(Ok("unused".into()), Ok("unused".into())));
    let (orch, backend) = wire(&remote);

    let too_long = vec!["word"; 1001].join(" ");
    for (text, want_empty) in [("   ", true), (too_long.as_str(), false)] {
        let err = orch
            .summarize(&SummaryRequest::new(text, SummaryKind::Brief))
            .expect_err("rejected");
        assert_eq!(matches!(err, ValidationError::Empty), want_empty);
    }
    assert_eq!(remote.primary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
}

#[test]
fn mate_orchestrator_watchdog_wins_and_late_result_is_discarded() {
    let remote = Arc::new(
        FakeRemote::new(Err(RemoteError::EmptyResult), Ok("late secondary".into()))
            .slow(Duration::from_millis(300)),
    );
    let (orch, backend) = wire(&remote);
    let orch = orch.with_watchdog(Duration::from_millis(50));

    let started = Instant::now();
    let got = orch.summarize(&request(SummaryKind::Brief)).expect("summarize");
    assert!(started.elapsed() < Duration::from_millis(280));
    assert_eq!(got.outcome.produced_by, ProducedBy::Heuristic);

    // let the abandoned worker finish its primary attempt
    thread::sleep(Duration::from_millis(600));
    assert_eq!(remote.secondary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    assert_eq!(orch.history().list().expect("list").len(), 1);
}

#[test]
fn mate_orchestrator_each_request_writes_exactly_once() {
    let remote = Arc::new(FakeRemote::new(Ok("Phoenix summary.".into()), Ok("unused".into())));
    let (orch, backend) = wire(&remote);

    for _ in 0..3 {
        orch.summarize(&request(SummaryKind::Brief)).expect("summarize");
    }
    assert_eq!(backend.writes.load(Ordering::SeqCst), 3);
    assert_eq!(orch.history().list().expect("list").len(), 3);
}
