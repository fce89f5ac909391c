//! Export marker extraction for C source code
//!
//! Scans raw source text for invocations of the export marker:
//!
//! ```c
//! CAPSULE_API(loop_api, int)
//! loop_run(uv_loop_t *loop, int mode);
//! ```
//!
//! The declaration tail runs up to the first `{` or `;` and must be a name
//! followed by one balanced parenthesized argument list, optionally trailed
//! by a comment. Occurrences on preprocessor lines (the marker's own
//! `#define`, `#ifdef` tests) and inside comments are ignored. Any other
//! malformed marker is a hard error.

use capsule_api::{CapsuleError, CapsuleResult, FunctionSignature, GeneratorConfig};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// (<key>, <return type>)<declaration tail>
static RE_MARKER_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\s*([^,()]*?)\s*,\s*([^()]*?)\s*\)([^{;]*)").unwrap());

// Export keys need at least two characters
static RE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]+$").unwrap());

static RE_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Functions exported by one source file, grouped by key in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileExtraction {
    /// Source file path
    pub file_path: PathBuf,

    /// Key -> functions, in source order
    pub groups: Vec<(String, Vec<FunctionSignature>)>,
}

impl FileExtraction {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            groups: Vec::new(),
        }
    }

    /// Append a function to its group, opening the group if needed
    pub fn push(&mut self, key: String, function: FunctionSignature) {
        match self.groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, functions)) => functions.push(function),
            None => self.groups.push((key, vec![function])),
        }
    }

    /// Functions for one key
    pub fn group(&self, key: &str) -> Option<&[FunctionSignature]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, f)| f.as_slice())
    }

    /// Total number of markers found
    pub fn marker_count(&self) -> usize {
        self.groups.iter().map(|(_, f)| f.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Extract every exported function from one file's source text.
pub fn extract(
    source: &str,
    file_path: &Path,
    config: &GeneratorConfig,
) -> CapsuleResult<FileExtraction> {
    let mut result = FileExtraction::new(file_path);
    let marker = config.marker.as_str();

    for (start, _) in source.match_indices(marker) {
        if !is_invocation(source, start, marker)
            || is_ignored_line(source, start)
            || in_block_comment(source, start)
        {
            continue;
        }

        let rest = source[start + marker.len()..].trim_start();
        let caps = RE_MARKER_ARGS.captures(rest).ok_or_else(|| {
            CapsuleError::InvalidDeclaration {
                file: file_path.to_path_buf(),
                key: raw_key(rest).to_string(),
                declaration: first_line(rest).to_string(),
            }
        })?;

        let key = caps[1].trim();
        let return_type = caps[2].trim();
        let declaration = caps[3].trim();

        if !RE_KEY.is_match(key) {
            return Err(CapsuleError::InvalidKey {
                file: file_path.to_path_buf(),
                key: key.to_string(),
                declaration: declaration.to_string(),
            });
        }

        let function = parse_declaration(declaration, return_type, &config.sentinel)
            .ok_or_else(|| CapsuleError::InvalidDeclaration {
                file: file_path.to_path_buf(),
                key: key.to_string(),
                declaration: declaration.to_string(),
            })?;

        debug!("{}: {} -> {}", file_path.display(), key, function.name);
        result.push(key.to_lowercase(), function);
    }

    Ok(result)
}

/// Parse `name(args)` into a signature; `None` when the shape is wrong.
fn parse_declaration(
    declaration: &str,
    return_type: &str,
    sentinel: &str,
) -> Option<FunctionSignature> {
    let open = declaration.find('(')?;
    let close = matching_paren(declaration, open)?;
    if !only_comments(&declaration[close + 1..]) {
        return None;
    }
    let inner = &declaration[open + 1..close];

    let name = declaration[..open].trim();
    if !RE_IDENT.is_match(name) {
        return None;
    }

    let mut args = split_args(inner);
    if args.len() == 1 && (args[0].is_empty() || args[0] == "void") {
        args.clear();
    }
    if args.iter().any(String::is_empty) {
        return None;
    }

    let before = args.len();
    args.retain(|a| a != sentinel);

    let mut function = FunctionSignature::new(name, return_type).with_args(args);
    if function.args.len() != before {
        function = function.with_implicit_context();
    }
    Some(function)
}

/// Byte index of the `)` closing the `(` at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Nothing but whitespace and complete comments.
fn only_comments(mut text: &str) -> bool {
    loop {
        text = text.trim_start();
        if text.is_empty() {
            return true;
        }
        if let Some(line) = text.strip_prefix("//") {
            text = line.split_once('\n').map_or("", |(_, next)| next);
        } else if let Some(block) = text.strip_prefix("/*") {
            match block.split_once("*/") {
                Some((_, next)) => text = next,
                None => return false,
            }
        } else {
            return false;
        }
    }
}

/// Split an argument list on commas outside any brackets, trimming each item.
fn split_args(inner: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in inner.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    args.push(current.trim().to_string());
    args
}

/// The marker at `start` is a whole word followed by `(`.
fn is_invocation(source: &str, start: usize, marker: &str) -> bool {
    let word_char = |c: char| c.is_ascii_alphanumeric() || c == '_';

    let preceded = source[..start].chars().next_back().is_some_and(word_char);
    let rest = &source[start + marker.len()..];
    let followed = rest.chars().next().is_some_and(word_char);

    !preceded && !followed && rest.trim_start().starts_with('(')
}

/// Preprocessor directives and line comments never carry exports.
fn is_ignored_line(source: &str, start: usize) -> bool {
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &source[line_start..start];
    prefix.trim_start().starts_with('#') || prefix.contains("//")
}

/// The marker at `start` sits inside an unterminated `/* ... */`.
fn in_block_comment(source: &str, start: usize) -> bool {
    let before = &source[..start];
    before
        .rfind("/*")
        .is_some_and(|open| !before[open..].contains("*/"))
}

/// Text between the marker's `(` and the first `,` or `)`, for error reports.
fn raw_key(rest: &str) -> &str {
    let inner = rest.strip_prefix('(').unwrap_or(rest);
    let end = inner.find([',', ')', '\n']).unwrap_or(inner.len());
    inner[..end].trim()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
