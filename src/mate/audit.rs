use crate::mate::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(log_path: &Path, phase: &str, status: &str, message: &str) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AuditEvent, append_event};
    use std::fs;

    #[test]
    fn appends_one_json_line_per_event() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = tmp.path().join("logs/audit.log");
        append_event(&log, "summarize", "heuristic", "watchdog fired").expect("first");
        append_event(&log, "summarize", "primary_model", "ok").expect("second");

        let raw = fs::read_to_string(&log).expect("read log");
        let events: Vec<AuditEvent> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, "heuristic");
        assert_eq!(events[1].message, "ok");
    }
}
