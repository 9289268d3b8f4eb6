//! README acquisition and Markdown scanning.
//!
//! [`fetch_readme`] downloads a README over HTTP, trying the common file
//! name variants under a raw-content base URL. [`scan_markdown`] turns the
//! text into [`Section`]s (one per heading of level 1–3) holding paragraphs,
//! bullet items, and code blocks (fenced or indented). The scanner is line
//! oriented and only understands the subset of Markdown READMEs actually use; inline
//! markup (links, images, emphasis, HTML tags) is reduced to plain text.

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// File names tried under `{repo_url}/{branch}/`, in order.
pub const README_CANDIDATES: [&str; 7] = [
    "README.md",
    "README.MD",
    "Readme.md",
    "readme.md",
    "README.rst",
    "docs/README.md",
    "README",
];

/// Responses this short are error pages or placeholders, not READMEs.
const MIN_README_BYTES: usize = 120;

// ═══════════════════════════════════════════════════════════════════════
// Fetching
// ═══════════════════════════════════════════════════════════════════════

/// URLs to try for `repo_url` at `branch`.
///
/// A `repo_url` that already points at a README file is tried first (with
/// `/main/` swapped for `branch` as a second attempt), then every entry of
/// [`README_CANDIDATES`] under `{repo_url}/{branch}/`.
pub fn candidate_urls(repo_url: &str, branch: &str) -> Vec<String> {
    let base = repo_url.trim_end_matches('/');
    let lower = base.to_lowercase();
    let mut urls = Vec::new();

    let is_direct = [".md", ".rst", ".txt"].iter().any(|ext| lower.ends_with(ext))
        || lower.contains("/readme");
    if is_direct {
        urls.push(base.to_string());
        if base.contains("/main/") && !branch.is_empty() && branch != "main" {
            urls.push(base.replace("/main/", &format!("/{}/", branch)));
        }
    }

    urls.extend(
        README_CANDIDATES
            .iter()
            .map(|name| format!("{}/{}/{}", base, branch, name)),
    );
    urls
}

/// Fetch README text, returning the first acceptable response.
pub fn fetch_readme(repo_url: &str, branch: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("readme-kg/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let mut tried = Vec::new();
    for url in candidate_urls(repo_url, branch) {
        let response = match client
            .get(&url)
            .header(ACCEPT, "text/plain, text/markdown, */*")
            .send()
        {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "README request failed");
                tried.push(format!("{} -> {}", url, e));
                continue;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url = %url, status = status.as_u16(), "README not found");
            tried.push(format!("{} -> {}", url, status.as_u16()));
            continue;
        }

        match response.text() {
            Ok(body) if body.len() > MIN_README_BYTES => {
                info!(url = %url, bytes = body.len(), "fetched README");
                return Ok(body);
            }
            Ok(body) => {
                debug!(url = %url, bytes = body.len(), "README response too short");
                tried.push(format!("{} -> {} bytes", url, body.len()));
            }
            Err(e) => {
                warn!(url = %url, error = %e, "failed to read README body");
                tried.push(format!("{} -> {}", url, e));
            }
        }
    }

    anyhow::bail!(
        "Could not fetch README from {}/{}. Tried: {}. Use --readme PATH to parse a local file.",
        repo_url.trim_end_matches('/'),
        branch,
        tried.join(", ")
    )
}

// ═══════════════════════════════════════════════════════════════════════
// Scanning
// ═══════════════════════════════════════════════════════════════════════

static HEADING_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").ok());
static BULLET_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.*)$").ok());
static RULE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").ok());
static SETEXT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^(=+|-+)$").ok());
static IMAGE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").ok());
static LINK_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").ok());
static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]+>").ok());

/// A heading and everything under it up to the next heading of level 1–3.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    /// `None` for text before the first heading.
    pub heading: Option<String>,
    /// 1–3; 0 for the preamble.
    pub level: u8,
    pub paragraphs: Vec<String>,
    pub bullets: Vec<String>,
    pub code_blocks: Vec<String>,
}

/// A scanned README.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadmeDoc {
    pub sections: Vec<Section>,
}

impl ReadmeDoc {
    /// First non-empty paragraph anywhere in the document.
    pub fn first_paragraph(&self) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.paragraphs.iter())
            .map(String::as_str)
            .next()
    }

    /// All fenced code blocks in document order.
    pub fn code_blocks(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.code_blocks.iter())
            .map(String::as_str)
    }

    /// All bullet items in document order.
    pub fn bullets(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.bullets.iter())
            .map(String::as_str)
    }
}

/// Scan Markdown text into sections.
pub fn scan_markdown(text: &str) -> ReadmeDoc {
    let mut scanner = Scanner::new();
    for line in text.lines() {
        scanner.feed(line);
    }
    scanner.finish()
}

/// Reduce inline Markdown/HTML to plain text with collapsed whitespace.
pub fn clean_inline(text: &str) -> String {
    let mut out = text.to_string();
    if let Some(re) = compiled(&IMAGE_RE) {
        out = re.replace_all(&out, "").into_owned();
    }
    if let Some(re) = compiled(&LINK_RE) {
        out = re.replace_all(&out, "$1").into_owned();
    }
    if let Some(re) = compiled(&TAG_RE) {
        out = re.replace_all(&out, " ").into_owned();
    }
    let out = out.replace('`', "").replace("**", "").replace("__", "");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The compiled pattern, or `None` if it failed to compile.
fn compiled(re: &'static LazyLock<Option<Regex>>) -> Option<&'static Regex> {
    (**re).as_ref()
}

fn is_match(re: &'static LazyLock<Option<Regex>>, text: &str) -> bool {
    compiled(re).is_some_and(|r| r.is_match(text))
}

/// Columns of indentation that start an indented code block.
const CODE_INDENT: usize = 4;

/// Leading indentation in columns, tabs counting to the next multiple of 4.
fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += CODE_INDENT - width % CODE_INDENT,
            _ => break,
        }
    }
    width
}

/// `line` without its first [`CODE_INDENT`] columns of indentation.
fn strip_indent(line: &str) -> String {
    let mut width = 0;
    for (i, c) in line.char_indices() {
        if width >= CODE_INDENT {
            return line[i..].to_string();
        }
        match c {
            ' ' => width += 1,
            '\t' => width += CODE_INDENT - width % CODE_INDENT,
            _ => return line[i..].to_string(),
        }
    }
    String::new()
}

struct OpenFence {
    marker: &'static str,
    body: Vec<String>,
}

struct Scanner {
    sections: Vec<Section>,
    paragraph: Vec<String>,
    fence: Option<OpenFence>,
    /// Lines of an open indented code block, indentation removed.
    indented: Vec<String>,
    in_bullet: bool,
}

impl Scanner {
    fn new() -> Self {
        Self {
            sections: vec![Section::default()],
            paragraph: Vec::new(),
            fence: None,
            indented: Vec::new(),
            in_bullet: false,
        }
    }

    fn current(&mut self) -> &mut Section {
        // `sections` starts with the preamble and is never emptied.
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    fn feed(&mut self, line: &str) {
        if let Some(fence) = self.fence.as_mut() {
            if line.trim_start().starts_with(fence.marker) {
                self.close_fence();
            } else {
                fence.body.push(line.to_string());
            }
            return;
        }

        let trimmed = line.trim();
        let indent = indent_width(line);

        if !self.indented.is_empty() {
            if trimmed.is_empty() || indent >= CODE_INDENT {
                self.indented.push(strip_indent(line));
                return;
            }
            self.close_indented();
        }

        // Indented code cannot interrupt a paragraph or a bullet item.
        if indent >= CODE_INDENT
            && !trimmed.is_empty()
            && self.paragraph.is_empty()
            && !self.in_bullet
        {
            self.indented.push(strip_indent(line));
            return;
        }

        if let Some(marker) = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(m)) {
            self.flush_paragraph();
            self.in_bullet = false;
            self.fence = Some(OpenFence {
                marker,
                body: Vec::new(),
            });
            return;
        }

        if trimmed.is_empty() {
            self.flush_paragraph();
            self.in_bullet = false;
            return;
        }

        let heading = compiled(&HEADING_RE)
            .filter(|_| indent < CODE_INDENT)
            .and_then(|re| re.captures(trimmed));
        if let Some(caps) = heading {
            self.flush_paragraph();
            self.in_bullet = false;
            let level = caps[1].len() as u8;
            if level <= 3 {
                self.open_section(clean_inline(&caps[2]), level);
            }
            return;
        }

        if !self.paragraph.is_empty() && !self.in_bullet && is_match(&SETEXT_RE, trimmed) {
            let title = clean_inline(&self.paragraph.join(" "));
            self.paragraph.clear();
            let level = if trimmed.starts_with('=') { 1 } else { 2 };
            self.open_section(title, level);
            return;
        }

        if is_match(&RULE_RE, trimmed) {
            self.flush_paragraph();
            self.in_bullet = false;
            return;
        }

        if let Some(caps) = compiled(&BULLET_RE).and_then(|re| re.captures(line)) {
            self.flush_paragraph();
            let item = clean_inline(&caps[1]);
            if !item.is_empty() {
                self.current().bullets.push(item);
                self.in_bullet = true;
            }
            return;
        }

        if self.in_bullet && line.starts_with(char::is_whitespace) {
            let extra = clean_inline(trimmed);
            if let Some(last) = self.current().bullets.last_mut() {
                last.push(' ');
                last.push_str(&extra);
            }
            return;
        }

        self.in_bullet = false;
        let text = trimmed.trim_start_matches('>').trim();
        self.paragraph.push(text.to_string());
    }

    fn open_section(&mut self, heading: String, level: u8) {
        self.sections.push(Section {
            heading: Some(heading),
            level,
            ..Section::default()
        });
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = clean_inline(&self.paragraph.join(" "));
        self.paragraph.clear();
        if !text.is_empty() {
            self.current().paragraphs.push(text);
        }
    }

    fn close_fence(&mut self) {
        if let Some(fence) = self.fence.take() {
            let code = fence.body.join("\n").trim().to_string();
            if !code.is_empty() {
                self.current().code_blocks.push(code);
            }
        }
    }

    fn close_indented(&mut self) {
        let code = std::mem::take(&mut self.indented).join("\n").trim_end().to_string();
        if !code.trim().is_empty() {
            self.current().code_blocks.push(code);
        }
    }

    fn finish(mut self) -> ReadmeDoc {
        // An unterminated fence runs to the end of the file.
        self.close_fence();
        self.close_indented();
        self.flush_paragraph();
        ReadmeDoc {
            sections: self.sections,
        }
    }
}
