use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MatePaths {
    pub mate_home: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl MatePaths {
    /// Layout rooted at an explicit directory, ignoring the environment.
    pub fn rooted_at(mate_home: impl Into<PathBuf>) -> Self {
        let mate_home = mate_home.into();
        Self {
            data_dir: mate_home.join("data"),
            logs_dir: mate_home.join("logs"),
            mate_home,
        }
    }

    pub fn audit_log(&self) -> PathBuf {
        self.logs_dir.join("audit.log")
    }
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<MatePaths> {
    let mate_home = match env::var("MATE_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".summarize_mate"),
    };
    let defaults = MatePaths::rooted_at(&mate_home);

    Ok(MatePaths {
        data_dir: env_or_default_path("MATE_DATA_DIR", defaults.data_dir),
        logs_dir: env_or_default_path("MATE_LOGS_DIR", defaults.logs_dir),
        mate_home,
    })
}
