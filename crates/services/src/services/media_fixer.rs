//! Rewrites broken embedded media in page sources.
//!
//! Handles `<img>` and `<iframe>` tags in HTML/JSX text:
//! - YouTube watch/short/`youtu.be` links become `/embed/` URLs in iframes
//!   and thumbnail URLs in images
//! - `http://` image sources are upgraded to `https://`
//! - empty image sources and the retired `source.unsplash.com` host are
//!   replaced with a fallback image
//!
//! Every rewrite produces a URL that no rule matches, so fixing is idempotent.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_FALLBACK_IMAGE: &str =
    "https://images.unsplash.com/photo-1499750310107-5fef28a66643?auto=format&fit=crop&w=1200&q=80";

const PAGE_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js", "html", "htm", "md", "mdx"];
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "target"];

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?P<name>img|iframe)\b[^>]*>").expect("valid tag regex"));

static SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bsrc\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).expect("valid src regex")
});

static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?:)?//(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|live/)|youtu\.be/)(?P<id>[A-Za-z0-9_-]{11})",
    )
    .expect("valid youtube regex")
});

static RETIRED_HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?:)?//source\.unsplash\.com(?:/|$)").expect("valid host regex")
});

#[derive(Debug, Error)]
pub enum MediaFixError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaIssueKind {
    YoutubeWatchUrl,
    YoutubeImage,
    InsecureImage,
    RetiredImageHost,
    EmptyImageSrc,
}

impl fmt::Display for MediaIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::YoutubeWatchUrl => "youtube link not embeddable",
            Self::YoutubeImage => "youtube link used as image",
            Self::InsecureImage => "insecure image url",
            Self::RetiredImageHost => "retired image host",
            Self::EmptyImageSrc => "empty image src",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaIssue {
    pub kind: MediaIssueKind,
    pub line: usize,
    pub original: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub text: String,
    pub issues: Vec<MediaIssue>,
}

impl FixOutcome {
    pub fn changed(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileIssues {
    pub path: PathBuf,
    pub issues: Vec<MediaIssue>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaFixReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub files: Vec<FileIssues>,
}

impl MediaFixReport {
    pub fn issue_count(&self) -> usize {
        self.files.iter().map(|f| f.issues.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct MediaFixer {
    fallback_image: String,
}

impl Default for MediaFixer {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_IMAGE)
    }
}

impl MediaFixer {
    /// Blank fallbacks become `DEFAULT_FALLBACK_IMAGE`; `http://` ones are
    /// upgraded.
    pub fn new(fallback_image: &str) -> Self {
        let fallback_image = match fallback_image.trim() {
            "" => DEFAULT_FALLBACK_IMAGE.to_string(),
            url if url.starts_with("http://") => format!("https://{}", &url["http://".len()..]),
            url => url.to_string(),
        };
        Self { fallback_image }
    }

    pub fn scan(&self, text: &str) -> Vec<MediaIssue> {
        self.fix(text).issues
    }

    pub fn fix(&self, text: &str) -> FixOutcome {
        let mut issues = Vec::new();
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in TAG_RE.captures_iter(text) {
            let Some(tag) = caps.get(0) else { continue };
            let is_img = caps
                .name("name")
                .is_some_and(|n| n.as_str().eq_ignore_ascii_case("img"));

            out.push_str(&text[last..tag.start()]);
            match self.rewrite_tag(tag.as_str(), is_img) {
                Some((rewritten, mut issue)) => {
                    issue.line = line_of(text, tag.start());
                    out.push_str(&rewritten);
                    issues.push(issue);
                }
                None => out.push_str(tag.as_str()),
            }
            last = tag.end();
        }
        out.push_str(&text[last..]);

        FixOutcome { text: out, issues }
    }

    fn rewrite_tag(&self, tag: &str, is_img: bool) -> Option<(String, MediaIssue)> {
        let caps = SRC_RE.captures(tag)?;
        let url = caps.name("dq").or_else(|| caps.name("sq"))?;
        let (kind, replacement) = self.fix_url(url.as_str(), is_img)?;

        let rewritten = format!("{}{}{}", &tag[..url.start()], replacement, &tag[url.end()..]);
        let issue = MediaIssue {
            kind,
            line: 0,
            original: url.as_str().to_string(),
            replacement,
        };
        Some((rewritten, issue))
    }

    fn fix_url(&self, url: &str, is_img: bool) -> Option<(MediaIssueKind, String)> {
        let trimmed = url.trim();

        if let Some(id) = YOUTUBE_RE.captures(trimmed).and_then(|c| c.name("id")) {
            let id = id.as_str();
            return Some(if is_img {
                (
                    MediaIssueKind::YoutubeImage,
                    format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"),
                )
            } else {
                (
                    MediaIssueKind::YoutubeWatchUrl,
                    format!("https://www.youtube.com/embed/{id}"),
                )
            });
        }

        if !is_img {
            return None;
        }
        if trimmed.is_empty() {
            return Some((MediaIssueKind::EmptyImageSrc, self.fallback_image.clone()));
        }
        if RETIRED_HOST_RE.is_match(trimmed) {
            return Some((MediaIssueKind::RetiredImageHost, self.fallback_image.clone()));
        }
        if let Some(rest) = trimmed.strip_prefix("http://") {
            return Some((MediaIssueKind::InsecureImage, format!("https://{rest}")));
        }
        None
    }

    /// Fixes every page file under `paths` (files or directories). With
    /// `dry_run`, files are only scanned.
    pub fn fix_paths(
        &self,
        paths: &[PathBuf],
        dry_run: bool,
    ) -> Result<MediaFixReport, MediaFixError> {
        let mut report = MediaFixReport::default();

        for root in paths {
            let walker = WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !is_skipped_dir(e));

            for entry in walker {
                let entry = entry?;
                if !entry.file_type().is_file() || !is_page_file(entry.path()) {
                    continue;
                }
                self.fix_file(entry.path(), dry_run, &mut report)?;
            }
        }

        info!(
            files_scanned = report.files_scanned,
            files_changed = report.files_changed,
            issues = report.issue_count(),
            dry_run,
            "Media scan complete"
        );
        Ok(report)
    }

    fn fix_file(
        &self,
        path: &Path,
        dry_run: bool,
        report: &mut MediaFixReport,
    ) -> Result<(), MediaFixError> {
        let io_err = |source| MediaFixError::Io {
            path: path.to_path_buf(),
            source,
        };

        let text = std::fs::read_to_string(path).map_err(io_err)?;
        report.files_scanned += 1;

        let outcome = self.fix(&text);
        if !outcome.changed() {
            debug!(path = %path.display(), "No media issues");
            return Ok(());
        }

        if !dry_run {
            std::fs::write(path, &outcome.text).map_err(io_err)?;
            report.files_changed += 1;
            info!(path = %path.display(), issues = outcome.issues.len(), "Fixed media");
        }
        report.files.push(FileIssues {
            path: path.to_path_buf(),
            issues: outcome.issues,
        });
        Ok(())
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.iter().any(|p| p.eq_ignore_ascii_case(ext)))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}
