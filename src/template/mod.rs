//! In-place placeholder substitution.
//!
//! Placeholders are `prefix (?P<var>[^suffix]*) suffix`, where `prefix` and
//! `suffix` are regular expression fragments supplied by the caller (escape
//! metacharacters yourself, e.g. `\$\{`). Files are scanned line by line and
//! rewritten atomically; directories expand to their immediate children only.

pub mod rewrite;
pub mod walker;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, FileFailure, Result};
use crate::secrets::{Environment, OrderPolicy, ResolvedSecrets};

/// A counted repetition (`{n}`, `{n,}`, `{n,m}`) at the start of the input.
static COUNTED_REPETITION: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"^\{\d+(,\d*)?\}").unwrap());

/// Outcome of one templating run.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Files that had at least one substitution and were rewritten.
    pub rewritten: Vec<PathBuf>,
    /// Regular files with nothing to substitute.
    pub unchanged: Vec<PathBuf>,
    /// Nested directories and special files that were not processed.
    pub skipped: Vec<PathBuf>,
    /// Total number of placeholders replaced.
    pub substitutions: usize,
    pub failures: Vec<FileFailure>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse all failures into a single [`Error::Template`].
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::Template(self.failures))
        }
    }

    fn fail(&mut self, path: &Path, error: Error) {
        warn!(path = %path.display(), error = %error, "Failed to template file");
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            error,
        });
    }
}

#[derive(Debug, Clone)]
pub struct TemplateEngine {
    pattern: Regex,
    order: OrderPolicy,
}

impl TemplateEngine {
    /// Compile the placeholder pattern. Fails before any file is touched if
    /// `prefix`/`suffix` do not form a valid expression.
    ///
    /// A brace that does not form a counted repetition matches literally, so
    /// the default `{`/`}` delimiters need no escaping.
    pub fn new(prefix: &str, suffix: &str, order: OrderPolicy) -> Result<Self> {
        let prefix = escape_literal_braces(prefix);
        let suffix = escape_literal_braces(suffix);
        let expression = format!("{prefix}(?P<var>[^{suffix}]*){suffix}");
        let pattern = Regex::new(&expression).map_err(|e| {
            Error::config(format!("invalid placeholder pattern '{expression}': {e}"))
        })?;
        debug!(expression = %expression, "Compiled placeholder pattern");
        Ok(Self { pattern, order })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn order(&self) -> OrderPolicy {
        self.order
    }

    /// Substitute `secrets` into every file in `paths`.
    ///
    /// A directory is expanded to its immediate children; directories found
    /// inside it are skipped and must be listed explicitly. Every path is
    /// handled independently: a failure is recorded in the report and the
    /// run moves on to the next path.
    pub fn apply(
        &self,
        paths: &[PathBuf],
        secrets: &ResolvedSecrets,
        env: &dyn Environment,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        self.apply_paths(paths, secrets, env, false, &mut report);
        info!(
            rewritten = report.rewritten.len(),
            unchanged = report.unchanged.len(),
            substitutions = report.substitutions,
            failed = report.failures.len(),
            "Templating complete"
        );
        report
    }

    fn apply_paths(
        &self,
        paths: &[PathBuf],
        secrets: &ResolvedSecrets,
        env: &dyn Environment,
        skip_directories: bool,
        report: &mut ApplyReport,
    ) {
        for path in paths {
            let metadata = match std::fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    report.fail(path, Error::io(path, e));
                    continue;
                }
            };

            if metadata.is_dir() {
                if skip_directories {
                    debug!(path = %path.display(), "Skipping nested directory");
                    report.skipped.push(path.clone());
                    continue;
                }
                match walker::immediate_children(path) {
                    Ok(children) => self.apply_paths(&children, secrets, env, true, report),
                    Err(e) => report.fail(path, e),
                }
                continue;
            }

            if !metadata.is_file() {
                warn!(path = %path.display(), "Skipping special file");
                report.skipped.push(path.clone());
                continue;
            }

            match self.render_file(path, metadata.permissions(), secrets, env) {
                Ok(0) => report.unchanged.push(path.clone()),
                Ok(count) => {
                    report.substitutions += count;
                    report.rewritten.push(path.clone());
                }
                Err(e) => report.fail(path, e),
            }
        }
    }

    /// Render one file and rewrite it when anything was substituted.
    /// Returns the number of substitutions.
    fn render_file(
        &self,
        path: &Path,
        permissions: std::fs::Permissions,
        secrets: &ResolvedSecrets,
        env: &dyn Environment,
    ) -> Result<usize> {
        let content = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let (rendered, count) = self.render(&content, secrets, env);
        if count == 0 {
            debug!(path = %path.display(), "No placeholders substituted");
            return Ok(0);
        }
        rewrite::atomic_write(path, &rendered, permissions)?;
        debug!(path = %path.display(), count, "Rewrote file");
        Ok(count)
    }

    /// Render a whole buffer, keeping every line terminator as it was.
    pub fn render(
        &self,
        content: &[u8],
        secrets: &ResolvedSecrets,
        env: &dyn Environment,
    ) -> (Vec<u8>, usize) {
        let mut output = Vec::with_capacity(content.len());
        let mut total = 0;
        for chunk in content.split_inclusive(|&b| b == b'\n') {
            let (line, terminator) = split_terminator(chunk);
            let (rendered, count) = self.render_line(line, secrets, env);
            output.extend_from_slice(&rendered);
            output.extend_from_slice(terminator);
            total += count;
        }
        (output, total)
    }

    /// Replace each placeholder found in `line`, left to right.
    ///
    /// Every match replaces the first remaining occurrence of its exact token
    /// text. Names that are unknown or resolve to an empty value are left as
    /// they are.
    pub fn render_line(
        &self,
        line: &[u8],
        secrets: &ResolvedSecrets,
        env: &dyn Environment,
    ) -> (Vec<u8>, usize) {
        let mut output = line.to_vec();
        let mut count = 0;

        for caps in self.pattern.captures_iter(line) {
            let (Some(token), Some(var)) = (caps.get(0), caps.name("var")) else {
                continue;
            };
            let Ok(name) = std::str::from_utf8(var.as_bytes()) else {
                continue;
            };
            match self.lookup(name, secrets, env) {
                Some(value) => {
                    if replace_first(&mut output, token.as_bytes(), value.as_bytes()) {
                        count += 1;
                    }
                }
                None => debug!(
                    token = %String::from_utf8_lossy(token.as_bytes()),
                    "Unknown key"
                ),
            }
        }
        (output, count)
    }

    /// The value to substitute for `name`, honouring the order policy.
    fn lookup(&self, name: &str, secrets: &ResolvedSecrets, env: &dyn Environment) -> Option<String> {
        let resolved = secrets.get(name).filter(|v| !v.is_empty())?;
        if self.order == OrderPolicy::Env {
            if let Some(value) = env.get(name).filter(|v| !v.is_empty()) {
                return Some(value);
            }
        }
        Some(resolved.clone())
    }
}

/// Escape every `{` and `}` in a pattern fragment that is not part of a
/// counted repetition following something repeatable.
fn escape_literal_braces(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 4);
    let mut chars = fragment.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            }
            '{' => {
                let repeatable = !matches!(out.chars().last(), None | Some('(' | '|'));
                match COUNTED_REPETITION.find(&fragment[i..]) {
                    Some(m) if repeatable => {
                        out.push_str(m.as_str());
                        // the repetition is ASCII, one char per byte
                        for _ in 1..m.len() {
                            chars.next();
                        }
                    }
                    _ => out.push_str(r"\{"),
                }
            }
            '}' => out.push_str(r"\}"),
            _ => out.push(c),
        }
    }
    out
}

fn split_terminator(chunk: &[u8]) -> (&[u8], &[u8]) {
    if let Some(line) = chunk.strip_suffix(b"\r\n") {
        (line, &chunk[line.len()..])
    } else if let Some(line) = chunk.strip_suffix(b"\n") {
        (line, &chunk[line.len()..])
    } else {
        (chunk, &[])
    }
}

fn replace_first(haystack: &mut Vec<u8>, needle: &[u8], replacement: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    match haystack.windows(needle.len()).position(|w| w == needle) {
        Some(start) => {
            haystack.splice(start..start + needle.len(), replacement.iter().copied());
            true
        }
        None => false,
    }
}
