pub mod app;
pub mod env_loader;
pub mod error;
pub mod logging;
pub mod mate;

pub use app::App;
pub use error::{RemoteError, StorageError, ValidationError};
pub use mate::history::{HistoryPatch, HistoryQuery, HistoryRecord, HistoryStore, SortOrder};
pub use mate::orchestrator::{Orchestrator, Summarization};
pub use mate::remote::{InferenceClient, RemoteSummarizer};
pub use mate::storage::{FileBackend, MemoryBackend, StorageBackend};
pub use mate::summary::{ProducedBy, SummaryKind, SummaryOutcome, SummaryRequest};
