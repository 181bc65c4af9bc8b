//! `markin build`: compile a Markin file into a static page with its source
//! published alongside.
//!
//! Output files whose content has not changed are left untouched, so a
//! watching web server or sync tool only sees real edits.

use anyhow::{Context, Result};
use colored::Colorize;
use markin_parse::{PageConfig, ParseOptions, Parser};
use notify::{EventKind, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::config::HtmlConfig;

/// Everything a build needs besides the input file.
pub struct BuildOpts<'a> {
    pub out_dir: &'a Path,
    pub title: Option<&'a str>,
    pub html: &'a HtmlConfig,
    pub options: ParseOptions,
    pub quiet: bool,
}

/// Result status for a single output file.
#[derive(Debug, PartialEq)]
pub enum WriteStatus {
    New,
    Updated,
    Unchanged,
}

impl WriteStatus {
    fn label(&self) -> colored::ColoredString {
        match self {
            WriteStatus::New => "new".green(),
            WriteStatus::Updated => "updated".cyan(),
            WriteStatus::Unchanged => "unchanged".dimmed(),
        }
    }
}

pub fn handle_build(file: &str, opts: &BuildOpts) -> Result<()> {
    let file_path = Path::new(file);
    let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read '{file}'"))?;

    let doc = Parser::new(opts.options).parse(&content).map_err(|e| {
        let location = e.location();
        anyhow::anyhow!("{}:{}:{}: {}", file, location.line, location.column, e)
    })?;

    // The source is published under its own name for discovery links
    let source_filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "source.markin".to_string());

    let config = PageConfig {
        title: opts
            .title
            .map(|t| t.to_string())
            .or_else(|| opts.html.title.clone()),
        lang: opts.html.lang.clone(),
        stylesheet: opts.html.stylesheet.clone(),
        source_path: Some(source_filename.clone()),
    };
    let html = doc.to_html_page(&config);

    fs::create_dir_all(opts.out_dir)
        .with_context(|| format!("Failed to create '{}'", opts.out_dir.display()))?;

    let index_path = opts.out_dir.join("index.html");
    let index_status = write_if_changed(&index_path, html.as_bytes())?;

    let source_dest = opts.out_dir.join(&source_filename);
    let source_status = write_if_changed(&source_dest, content.as_bytes())?;

    if !opts.quiet {
        println!("{} {}", "Built".green().bold(), index_path.display());
        println!("  {} {} ({})", "page:".dimmed(), index_path.display(), index_status.label());
        println!("  {} {} ({})", "source:".dimmed(), source_dest.display(), source_status.label());
        println!(
            "  {} <link rel=\"alternate\" type=\"text/markin\" href=\"{}\">",
            "discovery:".dimmed(),
            source_filename
        );
    }

    Ok(())
}

/// Write `content` to `dst` unless the file already holds exactly that
/// content (compared by SHA-256).
pub fn write_if_changed(dst: &Path, content: &[u8]) -> Result<WriteStatus> {
    if !dst.exists() {
        fs::write(dst, content).with_context(|| format!("Failed to write '{}'", dst.display()))?;
        return Ok(WriteStatus::New);
    }

    if file_hash(dst)? == content_hash(content) {
        return Ok(WriteStatus::Unchanged);
    }

    fs::write(dst, content).with_context(|| format!("Failed to write '{}'", dst.display()))?;
    Ok(WriteStatus::Updated)
}

/// Compute SHA-256 hash of file contents.
fn file_hash(path: &Path) -> Result<String> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content_hash(&content))
}

fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Watch the source file for changes and rebuild on each save.
///
/// Debounces rapid events (e.g. editors that write in stages) with a 200ms window.
/// Ctrl+C exits.
pub fn watch_and_rebuild(file: &str, opts: &BuildOpts) -> Result<()> {
    let file_path = fs::canonicalize(file).with_context(|| format!("Cannot resolve path '{file}'"))?;

    let watch_dir = file_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine parent directory of '{}'", file))?;

    println!("{} {} for changes (Ctrl+C to stop)", "Watching".cyan().bold(), file);

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let mut last_rebuild = Instant::now();
    let debounce = Duration::from_millis(200);

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => {
                let is_write = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
                let affects_our_file = event
                    .paths
                    .iter()
                    .any(|p| p.canonicalize().ok().as_ref() == Some(&file_path));

                if is_write && affects_our_file && last_rebuild.elapsed() > debounce {
                    // Let the editor finish writing
                    std::thread::sleep(Duration::from_millis(50));

                    // A parse error keeps the previous output and waits for the next save
                    match handle_build(file, opts) {
                        Ok(()) => last_rebuild = Instant::now(),
                        Err(e) => eprintln!("{} {}", "Build error:".red().bold(), e),
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("markin-build-unit").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_write_if_changed_statuses() {
        let dir = temp_dir("statuses");
        let path = dir.join("out.txt");

        assert_eq!(write_if_changed(&path, b"one").unwrap(), WriteStatus::New);
        assert_eq!(write_if_changed(&path, b"one").unwrap(), WriteStatus::Unchanged);
        assert_eq!(write_if_changed(&path, b"two").unwrap(), WriteStatus::Updated);
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_build_writes_page_and_source() {
        let dir = temp_dir("page");
        let src = dir.join("notes.markin");
        fs::write(&src, "# Notes\n\nHello *world*").unwrap();
        let out = dir.join("dist");

        let html = HtmlConfig::default();
        let opts = BuildOpts {
            out_dir: &out,
            title: None,
            html: &html,
            options: ParseOptions::default(),
            quiet: true,
        };
        handle_build(src.to_str().unwrap(), &opts).unwrap();

        let page = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(page.contains("<title>Notes</title>"));
        assert!(page.contains("<strong>world</strong>"));
        assert!(page.contains("href=\"notes.markin\""));
        assert_eq!(
            fs::read_to_string(out.join("notes.markin")).unwrap(),
            "# Notes\n\nHello *world*"
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_build_reports_parse_error_location() {
        let dir = temp_dir("broken");
        let src = dir.join("broken.markin");
        fs::write(&src, "fine\n*open").unwrap();

        let out = dir.join("dist");
        let html = HtmlConfig::default();
        let opts = BuildOpts {
            out_dir: &out,
            title: None,
            html: &html,
            options: ParseOptions::default(),
            quiet: true,
        };
        let err = handle_build(src.to_str().unwrap(), &opts).unwrap_err();
        assert!(err.to_string().contains(":2:1: "), "got {err}");
        assert!(!out.join("index.html").exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
