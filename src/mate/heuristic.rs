//! Offline summary generation and history metadata derivation.
//!
//! Everything here is a pure function of its inputs: identical text and kind
//! always produce identical output.

use crate::mate::summary::SummaryKind;
use crate::mate::text_metrics::word_count;
use crate::mate::util::truncate_with_ellipsis;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "can", "this", "that", "these", "those", "a",
    "an", "from", "into", "about", "than", "then", "them", "they", "their", "there", "what",
    "when", "where", "which", "while", "also", "just", "very", "some", "such", "each", "your",
];

/// Narrower stop list used for tags.
const TAG_STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is", "are",
    "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "can", "this", "that", "these", "those", "a", "an",
];

const MAX_TOPICS: usize = 3;
const MAX_TAGS: usize = 3;
const BRIEF_LEAD_CHARS: usize = 100;
const DETAILED_EXCERPT_CHARS: usize = 200;
const BULLET_CONTENT_CHARS: usize = 80;
const TITLE_WORDS: usize = 6;
const TITLE_CLAUSE_WORDS: usize = 4;
const WORDS_PER_MINUTE: usize = 200;
pub const FALLBACK_TAG: &str = "summary";

const TITLE_LEAD_INS: &[&str] = &[
    "this text discusses",
    "this comprehensive text",
    "• main topic:",
    "• primary focus:",
    "the key insight is that",
    "overall,",
];

const GENERIC_TITLE_PHRASES: &[&str] = &[
    "important information",
    "valuable perspective",
    "the main topic",
    "primary subject discussed",
];

fn capitalized_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("capitalized run regex")
    })
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").expect("word regex"))
}

fn subject_clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:discusses|about|focuses on|examines|explores|analyzes)\s+(.+?)(?:\.|,|$)")
            .expect("subject clause regex")
    })
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Lowercased words longer than three characters outside `stop_words`,
/// most frequent first; ties keep first-seen order.
fn ranked_terms(text: &str, limit: usize, stop_words: &[&str]) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in word_regex().find_iter(&lower) {
        let word = m.as_str();
        if word.chars().count() <= 3 || stop_words.contains(&word) {
            continue;
        }
        match index.get(word) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(word.to_string(), order.len());
                order.push((word.to_string(), 1));
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.into_iter().take(limit).map(|(word, _)| word).collect()
}

fn capitalized_phrases(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for m in capitalized_run_regex().find_iter(text) {
        let words: Vec<&str> = m
            .as_str()
            .split_whitespace()
            .skip_while(|w| is_stop_word(&w.to_lowercase()))
            .take(2)
            .collect();
        if !words.is_empty() {
            out.push(words.join(" "));
        }
    }
    out
}

fn topic_already_covered(topics: &[String], candidate: &str) -> bool {
    topics.iter().any(|topic| {
        topic.eq_ignore_ascii_case(candidate)
            || topic
                .split_whitespace()
                .any(|word| word.eq_ignore_ascii_case(candidate))
    })
}

/// Up to three topics: capitalized phrases first, then frequent content words.
pub fn key_topics(text: &str) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    let candidates = capitalized_phrases(text)
        .into_iter()
        .chain(ranked_terms(text, MAX_TOPICS, STOP_WORDS));
    for candidate in candidates {
        if topics.len() >= MAX_TOPICS {
            break;
        }
        if !topic_already_covered(&topics, &candidate) {
            topics.push(candidate);
        }
    }
    topics
}

fn as_sentence(fragment: &str) -> String {
    if fragment.ends_with("...") {
        fragment.to_string()
    } else {
        format!("{fragment}.")
    }
}

fn brief(sentences: &[String], topics: &[String]) -> String {
    let top = topics.first().map(String::as_str).unwrap_or("the main topic");
    let lead = sentences
        .first()
        .map(|s| truncate_with_ellipsis(s, BRIEF_LEAD_CHARS))
        .unwrap_or_else(|| "The text introduces its subject".to_string());
    let closing = if topics.is_empty() {
        "the central ideas".to_string()
    } else {
        topics.iter().take(2).cloned().collect::<Vec<_>>().join(" and ")
    };
    format!(
        "This text focuses on {top}. {} Key themes include {closing}.",
        as_sentence(&lead)
    )
}

fn detailed(sentences: &[String], topics: &[String], words: usize) -> String {
    let covered = if topics.is_empty() {
        "its central subject".to_string()
    } else {
        topics.join(", ")
    };
    let excerpt = if sentences.is_empty() {
        "No further detail was provided".to_string()
    } else {
        let joined = sentences.iter().take(3).cloned().collect::<Vec<_>>().join(". ");
        truncate_with_ellipsis(&joined, DETAILED_EXCERPT_CHARS)
    };
    format!(
        "This comprehensive text contains approximately {words} words and examines {covered}. {} Together these points outline the main ideas of the content.",
        as_sentence(&excerpt)
    )
}

fn bullet(sentences: &[String], topics: &[String], words: usize) -> String {
    let focus = topics
        .first()
        .map(String::as_str)
        .unwrap_or("Primary subject discussed");
    let content = sentences
        .first()
        .map(|s| truncate_with_ellipsis(s, BULLET_CONTENT_CHARS))
        .unwrap_or_else(|| "Supporting information provided".to_string());
    let supporting = if topics.len() > 1 {
        topics[1..].join(", ")
    } else {
        "Additional context and details".to_string()
    };
    [
        format!("• Primary focus: {focus}"),
        format!("• Key content: {content}"),
        format!("• Supporting topics: {supporting}"),
        format!("• Word count: Approximately {words} words"),
        "• Conclusion: Core ideas condensed for quick review".to_string(),
    ]
    .join("\n")
}

/// Local fallback summary for `text`.
pub fn generate(text: &str, kind: SummaryKind) -> String {
    let sentences = split_sentences(text);
    let topics = key_topics(text);
    let words = word_count(text);

    match kind {
        SummaryKind::Brief => brief(&sentences, &topics),
        SummaryKind::Detailed => detailed(&sentences, &topics, words),
        SummaryKind::Bullet => bullet(&sentences, &topics, words),
        SummaryKind::Unknown => {
            let top = topics.first().map(String::as_str).unwrap_or("Content");
            format!("Summary of {top} generated successfully.")
        }
    }
}

fn strip_lead_ins(summary: &str) -> &str {
    let mut rest = summary.trim_start();
    loop {
        let lower = rest.to_lowercase();
        let Some(prefix) = TITLE_LEAD_INS.iter().find(|p| lower.starts_with(**p)) else {
            return rest;
        };
        // lowercasing can change byte lengths outside ASCII; re-slice by chars
        let cut = rest
            .char_indices()
            .nth(prefix.chars().count())
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        rest = rest[cut..].trim_start();
    }
}

pub fn derive_title(summary: &str) -> String {
    let cleaned = strip_lead_ins(summary);

    if let Some(caps) = subject_clause_regex().captures(cleaned)
        && let Some(subject) = caps.get(1)
    {
        let words: Vec<&str> = subject.as_str().split_whitespace().collect();
        if !words.is_empty() {
            let mut title = words
                .iter()
                .take(TITLE_CLAUSE_WORDS)
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            if words.len() > TITLE_CLAUSE_WORDS {
                title.push_str("...");
            }
            return title;
        }
    }

    let mut title = cleaned
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    let lower = title.to_lowercase();
    if title.is_empty() || GENERIC_TITLE_PHRASES.iter().any(|p| lower.contains(p)) {
        let capitalized: Vec<&str> = capitalized_run_regex()
            .find_iter(summary)
            .map(|m| m.as_str())
            .take(3)
            .collect();
        if !capitalized.is_empty() {
            title = capitalized.join(" ");
        }
    }

    if summary.split_whitespace().count() > TITLE_WORDS {
        title.push_str("...");
    }
    title
}

/// At most three tags ranked by frequency across both texts; never empty.
pub fn derive_tags(original_text: &str, summary: &str) -> Vec<String> {
    let combined = format!("{original_text} {summary}");
    let tags = ranked_terms(&combined, MAX_TAGS, TAG_STOP_WORDS);
    if tags.is_empty() {
        vec![FALLBACK_TAG.to_string()]
    } else {
        tags
    }
}

pub fn estimate_read_time(text: &str) -> u32 {
    let minutes = word_count(text).div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
