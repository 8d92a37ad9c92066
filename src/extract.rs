use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::{LocalStore, PAGE_KEY, TIMESTAMP_KEY};
use crate::utils::{trim_line, truncate_chars, word_count};

static HIDDEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?is)<!--.*?-->|<head\b.*?</head\s*>",
        r"|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
        r"|<noscript\b.*?</noscript\s*>|<template\b.*?</template\s*>",
    ))
    .unwrap()
});
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)<br\s*/?>|</?(?:p|div|li|ul|ol|h[1-6]|tr|table|section|article",
        r"|header|footer|nav|aside|main|blockquote|pre|dt|dd)\b[^>]*>",
    ))
    .unwrap()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").unwrap());
static CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</t[dh]\s*>").unwrap());

/// Visible text captured from one page, stored under `quizData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub title: String,
    pub url: String,
    pub text_content: String,
    pub word_count: usize,
}

impl PageSnapshot {
    pub fn from_text(title: &str, url: &str, text: &str) -> Self {
        let text_content = clean_text(text);
        Self {
            title: title.trim().to_string(),
            url: url.to_string(),
            word_count: word_count(&text_content),
            text_content,
        }
    }

    pub fn preview(&self, chars: usize) -> String {
        let cut = truncate_chars(&self.text_content, chars);
        if cut.len() < self.text_content.len() {
            format!("{cut}...")
        } else {
            cut.to_string()
        }
    }
}

pub fn snapshot_from_html(html: &str, url: &str) -> PageSnapshot {
    let title = TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_html_entities(TAG_RE.replace_all(m.as_str(), "").trim()).to_string())
        .unwrap_or_default();

    let visible = HIDDEN_RE.replace_all(html, "");
    let with_breaks = BLOCK_RE.replace_all(&visible, "\n");
    let with_cells = CELL_RE.replace_all(&with_breaks, " ");
    let without_tags = TAG_RE.replace_all(&with_cells, "");
    let text = decode_html_entities(&without_tags);

    PageSnapshot::from_text(&title, url, &text)
}

/// Trims every line and drops the empty ones.
pub fn clean_text(text: &str) -> String {
    text.lines()
        .filter_map(trim_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn fetch_page(http: &reqwest::Client, url: &str) -> Result<PageSnapshot> {
    debug!(url, "fetching page");
    let unreachable = |source| Error::PageUnreachable {
        url: url.to_string(),
        source,
    };
    let response = http.get(url).send().await.map_err(unreachable)?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::PageFetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let html = response.text().await.map_err(unreachable)?;
    Ok(snapshot_from_html(&html, &final_url))
}

pub fn save_snapshot(store: &LocalStore, snapshot: &PageSnapshot) -> Result<()> {
    save_snapshot_at(store, snapshot, Utc::now())
}

fn save_snapshot_at(
    store: &LocalStore,
    snapshot: &PageSnapshot,
    captured_at: DateTime<Utc>,
) -> Result<()> {
    store.set_many([
        (PAGE_KEY, json!(snapshot)),
        (TIMESTAMP_KEY, json!(captured_at.timestamp_millis())),
    ])?;
    info!(
        url = %snapshot.url,
        words = snapshot.word_count,
        "stored extracted page text"
    );
    Ok(())
}

pub fn load_snapshot(store: &LocalStore) -> Result<Option<PageSnapshot>> {
    store.get(PAGE_KEY)
}

pub fn captured_at(store: &LocalStore) -> Result<Option<DateTime<Utc>>> {
    let millis: Option<i64> = store.get(TIMESTAMP_KEY)?;
    Ok(millis.and_then(DateTime::from_timestamp_millis))
}

pub fn get_extracted_text(store: &LocalStore) -> Result<String> {
    load_snapshot(store)?
        .map(|snapshot| snapshot.text_content)
        .ok_or(Error::NoExtractedText)
}
