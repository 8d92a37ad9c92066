use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;

use crate::error::Error;
use crate::extract::{
    PageSnapshot, captured_at, fetch_page, load_snapshot, save_snapshot, snapshot_from_html,
};
use crate::palette::Palette;
use crate::store::LocalStore;
use crate::utils::{pluralize, pluralize_with};

const PREVIEW_CHARS: usize = 200;

pub async fn run(store: &LocalStore, source: &str) -> Result<()> {
    let snapshot = load_source(source).await?;
    if snapshot.word_count == 0 {
        bail!("No visible text found in {}", source);
    }

    save_snapshot(store, &snapshot)?;

    println!(
        "Text extracted! {} found.",
        pluralize_with("word", snapshot.word_count, |n| Palette::paint(
            Palette::WARNING,
            n
        ))
    );
    println!("{}", Palette::dim(snapshot.preview(PREVIEW_CHARS)));
    Ok(())
}

pub fn view(store: &LocalStore, full: bool) -> Result<()> {
    let Some(snapshot) = load_snapshot(store)? else {
        return Err(Error::NoExtractedText.into());
    };

    let title = if snapshot.title.is_empty() {
        "(untitled)"
    } else {
        snapshot.title.as_str()
    };
    println!("{} {}", Palette::bold("Title:"), title);
    println!(
        "{} {}",
        Palette::bold("URL:"),
        Palette::paint(Palette::ACCENT, &snapshot.url)
    );
    println!(
        "{} {}",
        Palette::bold("Word Count:"),
        pluralize("word", snapshot.word_count)
    );
    if let Some(when) = captured_at(store)? {
        let minutes = Utc::now().signed_duration_since(when).num_minutes();
        println!(
            "{} {} ({} min ago)",
            Palette::bold("Captured:"),
            when.format("%Y-%m-%d %H:%M UTC"),
            minutes.max(0)
        );
    }
    println!();

    if full {
        println!("{}", snapshot.text_content);
    } else {
        println!("{}", snapshot.preview(PREVIEW_CHARS * 5));
    }
    Ok(())
}

async fn load_source(source: &str) -> Result<PageSnapshot> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let http = reqwest::Client::new();
        return fetch_page(&http, source)
            .await
            .with_context(|| format!("Error extracting page text from {source}"));
    }

    let path = Path::new(source);
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let url = format!("file://{}", display_path(path));

    if is_html(path) {
        Ok(snapshot_from_html(&contents, &url))
    } else {
        let title = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        Ok(PageSnapshot::from_text(title, &url, &contents))
    }
}

fn display_path(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_html() {
        assert!(is_html(Path::new("page.html")));
        assert!(is_html(Path::new("PAGE.HTM")));
        assert!(!is_html(Path::new("notes.txt")));
        assert!(!is_html(Path::new("README")));
    }

    #[tokio::test]
    async fn local_html_file_is_extracted_and_stored() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("lesson.html");
        fs::write(
            &page,
            "<html><head><title>Lesson</title></head><body><p>Cells divide.</p></body></html>",
        )
        .unwrap();
        let store = LocalStore::at(dir.path().join("storage.json"));

        run(&store, page.to_str().unwrap()).await.unwrap();

        let snapshot = load_snapshot(&store).unwrap().unwrap();
        assert_eq!(snapshot.title, "Lesson");
        assert_eq!(snapshot.text_content, "Cells divide.");
        assert!(snapshot.url.starts_with("file://"));
        assert!(captured_at(&store).unwrap().is_some());
    }

    #[tokio::test]
    async fn plain_text_file_uses_stem_as_title() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("biology.txt");
        fs::write(&notes, "  mitosis \n\n meiosis\n").unwrap();

        let snapshot = load_source(notes.to_str().unwrap()).await.unwrap();
        assert_eq!(snapshot.title, "biology");
        assert_eq!(snapshot.text_content, "mitosis\nmeiosis");
        assert_eq!(snapshot.word_count, 2);
    }

    #[tokio::test]
    async fn blank_page_is_rejected_without_storing() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("blank.html");
        fs::write(&page, "<html><body><script>x()</script></body></html>").unwrap();
        let store = LocalStore::at(dir.path().join("storage.json"));

        assert!(run(&store, page.to_str().unwrap()).await.is_err());
        assert!(load_snapshot(&store).unwrap().is_none());
    }
}
