use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    #[default]
    Brief,
    Detailed,
    Bullet,
    /// Any label other than the three above; kept so foreign records still load.
    #[serde(other)]
    Unknown,
}

impl SummaryKind {
    pub fn label(self) -> &'static str {
        match self {
            SummaryKind::Brief => "brief",
            SummaryKind::Detailed => "detailed",
            SummaryKind::Bullet => "bullet",
            SummaryKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SummaryKind {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "brief" => SummaryKind::Brief,
            "detailed" => SummaryKind::Detailed,
            "bullet" | "bullets" => SummaryKind::Bullet,
            _ => SummaryKind::Unknown,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducedBy {
    PrimaryModel,
    SecondaryModel,
    Heuristic,
}

impl ProducedBy {
    pub fn label(self) -> &'static str {
        match self {
            ProducedBy::PrimaryModel => "primary_model",
            ProducedBy::SecondaryModel => "secondary_model",
            ProducedBy::Heuristic => "heuristic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub text: String,
    pub summary_kind: SummaryKind,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>, summary_kind: SummaryKind) -> Self {
        Self {
            text: text.into(),
            summary_kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub summary_text: String,
    pub produced_by: ProducedBy,
    pub original_text: String,
    pub word_count: usize,
    pub summary_kind: SummaryKind,
}

#[cfg(test)]
mod tests {
    use super::SummaryKind;

    #[test]
    fn unknown_labels_deserialize_to_catch_all() {
        let kind: SummaryKind = serde_json::from_str("\"outline\"").expect("parse");
        assert_eq!(kind, SummaryKind::Unknown);
        let kind: SummaryKind = serde_json::from_str("\"detailed\"").expect("parse");
        assert_eq!(kind, SummaryKind::Detailed);
    }

    #[test]
    fn from_str_accepts_loose_labels() {
        assert_eq!("Bullets".parse::<SummaryKind>(), Ok(SummaryKind::Bullet));
        assert_eq!(" brief ".parse::<SummaryKind>(), Ok(SummaryKind::Brief));
        assert_eq!("essay".parse::<SummaryKind>(), Ok(SummaryKind::Unknown));
    }
}
