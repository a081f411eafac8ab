use crate::error::StorageError;
use crate::mate::heuristic::{self, FALLBACK_TAG};
use crate::mate::storage::{MemoryBackend, StorageBackend};
use crate::mate::summary::{SummaryKind, SummaryOutcome};
use crate::mate::warn;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

pub const HISTORY_KEY: &str = "@SummarizeMate:history";
const MAX_TAGS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Text,
    Url,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub original_text: String,
    pub created_at: DateTime<Utc>,
    pub summary_kind: SummaryKind,
    pub word_count: usize,
    pub read_time_minutes: u32,
    pub source_kind: SourceKind,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

/// Partial update merged into one record. `id` and `created_at` are not
/// patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub original_text: Option<String>,
    pub summary_kind: Option<SummaryKind>,
    pub source_kind: Option<SourceKind>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

impl HistoryPatch {
    pub fn favorite(is_favorite: bool) -> Self {
        Self {
            is_favorite: Some(is_favorite),
            ..Self::default()
        }
    }

    fn apply(&self, record: &mut HistoryRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(summary) = &self.summary {
            record.summary = summary.clone();
            record.read_time_minutes = heuristic::estimate_read_time(summary);
        }
        if let Some(original_text) = &self.original_text {
            record.original_text = original_text.clone();
        }
        if let Some(kind) = self.summary_kind {
            record.summary_kind = kind;
        }
        if let Some(source) = self.source_kind {
            record.source_kind = source;
        }
        if let Some(tags) = &self.tags {
            record.tags = normalize_tags(tags.clone());
        }
        if let Some(is_favorite) = self.is_favorite {
            record.is_favorite = is_favorite;
        }
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
        if out.len() == MAX_TAGS {
            break;
        }
    }
    if out.is_empty() {
        out.push(FALLBACK_TAG.to_string());
    }
    out
}

/// On-disk shape. Legacy field names from earlier app versions are read
/// into their own fields and never written; the current name wins when a
/// record carries both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    original_text: String,
    #[serde(default)]
    created_at: Value,
    #[serde(default, skip_serializing)]
    date: Value,
    #[serde(default)]
    summary_kind: Option<SummaryKind>,
    #[serde(default, rename = "type", skip_serializing)]
    legacy_kind: Option<SummaryKind>,
    #[serde(default)]
    word_count: usize,
    #[serde(default)]
    read_time_minutes: Value,
    #[serde(default, skip_serializing)]
    read_time: Value,
    #[serde(default)]
    source_kind: Option<SourceKind>,
    #[serde(default, rename = "source", skip_serializing)]
    legacy_source: Option<SourceKind>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_favorite: bool,
}

impl From<&HistoryRecord> for StoredRecord {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            summary: record.summary.clone(),
            original_text: record.original_text.clone(),
            created_at: Value::String(
                record
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            date: Value::Null,
            summary_kind: Some(record.summary_kind),
            legacy_kind: None,
            word_count: record.word_count,
            read_time_minutes: Value::from(record.read_time_minutes),
            read_time: Value::Null,
            source_kind: Some(record.source_kind),
            legacy_source: None,
            tags: record.tags.clone(),
            is_favorite: record.is_favorite,
        }
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(millis) => millis.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_read_time(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        // "3 min"
        Value::String(raw) => {
            let digits: String = raw
                .trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn current_or_legacy(current: Value, legacy: Value) -> Value {
    if current.is_null() { legacy } else { current }
}

impl StoredRecord {
    fn materialize(self) -> HistoryRecord {
        let raw_created_at = current_or_legacy(self.created_at, self.date);
        let created_at = parse_timestamp(&raw_created_at).unwrap_or_else(|| {
            warn::emit(
                "E203_BAD_TIMESTAMP",
                "history_read",
                "use_epoch",
                &format!("record {}", self.id),
                &raw_created_at.to_string(),
            );
            DateTime::<Utc>::UNIX_EPOCH
        });
        let raw_read_time = current_or_legacy(self.read_time_minutes, self.read_time);
        let read_time_minutes = parse_read_time(&raw_read_time)
            .unwrap_or_else(|| heuristic::estimate_read_time(&self.summary))
            .max(1);
        let title = if self.title.trim().is_empty() {
            heuristic::derive_title(&self.summary)
        } else {
            self.title
        };

        HistoryRecord {
            id: self.id,
            title,
            summary: self.summary,
            original_text: self.original_text,
            created_at,
            summary_kind: self.summary_kind.or(self.legacy_kind).unwrap_or_default(),
            word_count: self.word_count,
            read_time_minutes,
            source_kind: self.source_kind.or(self.legacy_source).unwrap_or_default(),
            tags: normalize_tags(self.tags),
            is_favorite: self.is_favorite,
        }
    }
}

pub fn decode_records(raw: &str) -> Result<Vec<HistoryRecord>, StorageError> {
    let stored: Vec<StoredRecord> = serde_json::from_str(raw).map_err(StorageError::Decode)?;
    Ok(stored.into_iter().map(StoredRecord::materialize).collect())
}

pub fn encode_records(records: &[HistoryRecord]) -> Result<String, StorageError> {
    let stored: Vec<StoredRecord> = records.iter().map(StoredRecord::from).collect();
    serde_json::to_string(&stored).map_err(StorageError::Serialize)
}

/// Creation-time id, bumped past any id already present.
fn next_id(created_at: DateTime<Utc>, records: &[HistoryRecord]) -> String {
    let mut candidate = created_at.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !records.iter().any(|r| r.id == id) {
            return id;
        }
        candidate += 1;
    }
}

/// History persistence over a durable backend, degrading permanently to an
/// in-memory backend once the durable one fails.
///
/// Every operation reads and rewrites the whole collection. Nothing is held
/// across the read and the write, so overlapping writers can lose updates.
pub struct HistoryStore {
    durable: Box<dyn StorageBackend>,
    memory: MemoryBackend,
    probed: OnceLock<()>,
    degraded: AtomicBool,
}

impl HistoryStore {
    pub fn new(durable: Box<dyn StorageBackend>) -> Self {
        Self {
            durable,
            memory: MemoryBackend::new(),
            probed: OnceLock::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Store that never touches durable storage.
    pub fn in_memory() -> Self {
        let store = Self::new(Box::new(MemoryBackend::new()));
        store.degraded.store(true, AtomicOrdering::SeqCst);
        store
    }

    pub fn is_degraded(&self) -> bool {
        self.probe();
        self.degraded.load(AtomicOrdering::SeqCst)
    }

    fn probe(&self) {
        self.probed.get_or_init(|| {
            if self.degraded.load(AtomicOrdering::SeqCst) {
                return;
            }
            if let Err(err) = self.durable.get_item(HISTORY_KEY) {
                self.degrade("probe", &err);
            }
        });
    }

    fn degrade(&self, stage: &str, err: &StorageError) {
        if !self.degraded.swap(true, AtomicOrdering::SeqCst) {
            warn::emit(
                "E201_HISTORY_DEGRADED",
                stage,
                "fallback_memory",
                "durable history storage failed",
                &err.to_string(),
            );
        }
    }

    /// Run `op` against the active backend; a durable failure degrades the
    /// store and reruns `op` against memory.
    fn with_fallback<T>(
        &self,
        stage: &str,
        op: impl Fn(&dyn StorageBackend) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        self.probe();
        if !self.degraded.load(AtomicOrdering::SeqCst) {
            match op(self.durable.as_ref()) {
                Ok(out) => return Ok(out),
                Err(err) => self.degrade(stage, &err),
            }
        }
        op(&self.memory as &dyn StorageBackend)
    }

    fn read_all(backend: &dyn StorageBackend) -> Result<Vec<HistoryRecord>, StorageError> {
        match backend.get_item(HISTORY_KEY)? {
            Some(raw) if !raw.trim().is_empty() => decode_records(&raw),
            _ => Ok(Vec::new()),
        }
    }

    fn write_all(
        backend: &dyn StorageBackend,
        records: &[HistoryRecord],
    ) -> Result<(), StorageError> {
        backend.set_item(HISTORY_KEY, &encode_records(records)?)
    }

    fn modify(
        &self,
        stage: &str,
        change: impl Fn(&mut Vec<HistoryRecord>),
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        self.with_fallback(stage, |backend| {
            let mut records = Self::read_all(backend)?;
            change(&mut records);
            Self::write_all(backend, &records)?;
            Ok(records)
        })
    }

    /// Persist a new record for `outcome`, newest first.
    pub fn create(&self, outcome: &SummaryOutcome) -> Result<HistoryRecord, StorageError> {
        // stored timestamps carry millisecond precision
        let created_at = Utc::now().trunc_subsecs(3);
        let template = HistoryRecord {
            id: String::new(),
            title: heuristic::derive_title(&outcome.summary_text),
            summary: outcome.summary_text.clone(),
            original_text: outcome.original_text.clone(),
            created_at,
            summary_kind: outcome.summary_kind,
            word_count: outcome.word_count,
            read_time_minutes: heuristic::estimate_read_time(&outcome.summary_text),
            source_kind: SourceKind::Text,
            tags: heuristic::derive_tags(&outcome.original_text, &outcome.summary_text),
            is_favorite: false,
        };

        let record = self.with_fallback("create", |backend| {
            let mut records = Self::read_all(backend)?;
            let mut record = template.clone();
            record.id = next_id(created_at, &records);
            records.insert(0, record.clone());
            Self::write_all(backend, &records)?;
            Ok(record)
        })?;
        tracing::debug!(id = %record.id, title = %record.title, "history record created");
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        self.with_fallback("list", Self::read_all)
    }

    pub fn get(&self, id: &str) -> Result<Option<HistoryRecord>, StorageError> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    pub fn update(&self, id: &str, patch: &HistoryPatch) -> Result<Vec<HistoryRecord>, StorageError> {
        self.modify("update", |records| {
            for record in records.iter_mut().filter(|r| r.id == id) {
                patch.apply(record);
            }
        })
    }

    pub fn toggle_favorite(&self, id: &str) -> Result<Vec<HistoryRecord>, StorageError> {
        self.modify("toggle_favorite", |records| {
            for record in records.iter_mut().filter(|r| r.id == id) {
                record.is_favorite = !record.is_favorite;
            }
        })
    }

    pub fn mark_favorites(&self, ids: &[String]) -> Result<Vec<HistoryRecord>, StorageError> {
        if ids.is_empty() {
            return self.list();
        }
        self.modify("mark_favorites", |records| {
            for record in records.iter_mut().filter(|r| ids.contains(&r.id)) {
                record.is_favorite = true;
            }
        })
    }

    pub fn delete_many(&self, ids: &[String]) -> Result<Vec<HistoryRecord>, StorageError> {
        if ids.is_empty() {
            return self.list();
        }
        self.modify("delete", |records| records.retain(|r| !ids.contains(&r.id)))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let result = self.with_fallback("clear", |backend| backend.remove_item(HISTORY_KEY));
        self.memory.remove_item(HISTORY_KEY)?;
        result
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
    ReadTime,
}

fn compare_titles(a: &HistoryRecord, b: &HistoryRecord) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

/// Search, kind filter and ordering for the history list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub search: String,
    /// `None` matches every kind.
    pub kind: Option<SummaryKind>,
    pub sort: SortOrder,
}

impl HistoryQuery {
    pub fn matches(&self, record: &HistoryRecord) -> bool {
        if let Some(kind) = self.kind
            && record.summary_kind != kind
        {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        record.title.to_lowercase().contains(&needle)
            || record.summary.to_lowercase().contains(&needle)
            || record
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }

    pub fn apply(&self, records: &[HistoryRecord]) -> Vec<HistoryRecord> {
        let mut out: Vec<HistoryRecord> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        match self.sort {
            SortOrder::Newest => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => out.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::TitleAsc => out.sort_by(compare_titles),
            SortOrder::TitleDesc => out.sort_by(|a, b| compare_titles(b, a)),
            SortOrder::ReadTime => out.sort_by_key(|r| r.read_time_minutes),
        }
        out
    }
}

/// Bucket records by calendar day (UTC) in order of first appearance.
pub fn group_by_day(records: &[HistoryRecord]) -> Vec<(NaiveDate, Vec<HistoryRecord>)> {
    let mut groups: Vec<(NaiveDate, Vec<HistoryRecord>)> = Vec::new();
    for record in records {
        let day = record.created_at.date_naive();
        match groups.iter_mut().find(|(d, _)| *d == day) {
            Some((_, bucket)) => bucket.push(record.clone()),
            None => groups.push((day, vec![record.clone()])),
        }
    }
    groups
}

/// Plain-text export of the selected records for sharing.
pub fn share_text(records: &[HistoryRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}\n{}\n", r.title, r.summary))
        .collect::<Vec<_>>()
        .join("\n---\n")
}
