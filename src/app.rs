use crate::env_loader;
use crate::mate::config::{self, MateConfig};
use crate::mate::history::HistoryStore;
use crate::mate::orchestrator::Orchestrator;
use crate::mate::paths::{self, MatePaths};
use crate::mate::remote::{InferenceClient, RemoteSummarizer};
use crate::mate::storage::FileBackend;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Wired summarization core: one orchestrator sharing its history store
/// with the caller.
pub struct App {
    pub config: MateConfig,
    pub paths: MatePaths,
    pub orchestrator: Orchestrator,
    pub history: Arc<HistoryStore>,
}

impl App {
    /// Load `.env`, configuration and paths from the environment, then wire
    /// the production inference client.
    pub fn from_env() -> Result<Self> {
        env_loader::load_dotenv();
        let config = config::load_config().context("failed to load mate config")?;
        let paths = paths::resolve_paths().context("failed to resolve mate paths")?;
        let client = InferenceClient::new(&config.inference, config.api_key.clone())
            .context("failed to build inference client")?;
        Self::build(config, paths, Arc::new(client))
    }

    pub fn build(
        config: MateConfig,
        paths: MatePaths,
        remote: Arc<dyn RemoteSummarizer>,
    ) -> Result<Self> {
        let history = Arc::new(open_history(&config, &paths)?);
        let mut orchestrator = Orchestrator::new(remote, Arc::clone(&history));
        if config.history.audit_enabled {
            orchestrator = orchestrator.with_audit_log(paths.audit_log());
        }
        tracing::info!(
            backend = %config.history.backend,
            data_dir = %paths.data_dir.display(),
            "summarize mate ready"
        );

        Ok(Self {
            config,
            paths,
            orchestrator,
            history,
        })
    }
}

fn open_history(config: &MateConfig, paths: &MatePaths) -> Result<HistoryStore> {
    if config.history.backend == "memory" {
        return Ok(HistoryStore::in_memory());
    }
    let backend = FileBackend::create(&paths.data_dir)
        .with_context(|| format!("failed to create {}", paths.data_dir.display()))?;
    Ok(HistoryStore::new(Box::new(backend)))
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::error::RemoteError;
    use crate::mate::config::MateConfig;
    use crate::mate::paths::MatePaths;
    use crate::mate::remote::RemoteSummarizer;
    use crate::mate::summary::{ProducedBy, SummaryKind, SummaryRequest};
    use std::fs;
    use std::sync::Arc;

    struct Offline;

    impl RemoteSummarizer for Offline {
        fn summarize_primary(&self, _text: &str) -> Result<String, RemoteError> {
            Err(RemoteError::Network("offline".to_string()))
        }

        fn summarize_secondary(&self, _text: &str) -> Result<String, RemoteError> {
            Err(RemoteError::Network("offline".to_string()))
        }
    }

    const TEXT: &str = "The council approved the new library budget after a long public hearing on Tuesday.";

    #[test]
    fn file_backend_persists_and_audits() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let paths = MatePaths::rooted_at(tmp.path());
        let app = App::build(MateConfig::default(), paths.clone(), Arc::new(Offline)).expect("app");

        let got = app
            .orchestrator
            .summarize(&SummaryRequest::new(TEXT, SummaryKind::Bullet))
            .expect("summarize");
        assert_eq!(got.outcome.produced_by, ProducedBy::Heuristic);
        assert!(!app.history.is_degraded());
        assert_eq!(app.history.list().expect("list").len(), 1);
        assert!(paths.data_dir.join("_SummarizeMate_history.json").is_file());

        let audit = fs::read_to_string(paths.audit_log()).expect("audit log");
        assert!(audit.contains("\"status\":\"heuristic\""));
    }

    #[test]
    fn memory_backend_leaves_data_dir_untouched() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let paths = MatePaths::rooted_at(tmp.path());
        let mut config = MateConfig::default();
        config.history.backend = "memory".to_string();
        config.history.audit_enabled = false;
        let app = App::build(config, paths.clone(), Arc::new(Offline)).expect("app");

        app.orchestrator
            .summarize(&SummaryRequest::new(TEXT, SummaryKind::Brief))
            .expect("summarize");
        assert_eq!(app.history.list().expect("list").len(), 1);
        assert!(!paths.data_dir.exists());
        assert!(!paths.audit_log().exists());
    }
}
