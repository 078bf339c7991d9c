//! Source tree inspection.
//!
//! Only the immediate files of an artifact's source directory are
//! inspected; subdirectories are ignored. Line counts and the digest skip
//! hidden files, while extension-based scans ([`list_all_files`]) see them.

use crate::error::Result;
use crate::types::FileLineCount;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Language labels by lower-cased extension.
const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("jsx", "JSX"),
    ("tsx", "TSX"),
    ("py", "Python"),
    ("json", "JSON"),
    ("md", "Markdown"),
    ("svg", "SVG"),
    ("xml", "XML"),
];

/// Immediate files of `dir`, hidden ones included, sorted by file name.
pub fn list_all_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Immediate, non-hidden files of `dir`, sorted by file name.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_all_files(dir)?
        .into_iter()
        .filter(|path| !file_name(path).starts_with('.'))
        .collect())
}

/// Number of lines in `text`.
///
/// Besides `\n` and `\r\n`, a bare `\r`, the vertical tab, form feed,
/// the file/group/record separators, NEL and the Unicode line and paragraph
/// separators all end a line. A trailing terminator does not start a new one.
pub fn count_lines(text: &str) -> u64 {
    let mut lines = 0;
    let mut pending = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines += 1;
                pending = false;
            }
            '\n' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}'
            | '\u{2028}' | '\u{2029}' => {
                lines += 1;
                pending = false;
            }
            _ => pending = true,
        }
    }
    lines + u64::from(pending)
}

/// Language label for a file: a known language, the upper-cased raw
/// extension, or "Unknown" when there is none.
pub fn language_for(path: &Path) -> String {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "Unknown".to_string();
    };
    let lower = ext.to_ascii_lowercase();
    EXTENSION_LANGUAGES
        .iter()
        .find(|(known, _)| *known == lower)
        .map(|(_, language)| language.to_string())
        .unwrap_or_else(|| {
            if ext.is_empty() {
                "Unknown".to_string()
            } else {
                ext.to_uppercase()
            }
        })
}

/// Read a file as text, replacing invalid UTF-8.
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Per-file line counts of a source directory.
///
/// A missing directory yields an empty list. Unreadable files are skipped.
pub fn count_source_lines(dir: &Path) -> Result<Vec<FileLineCount>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut counts = Vec::new();
    for path in list_source_files(dir)? {
        let text = match read_lossy(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable source file");
                continue;
            }
        };
        counts.push(FileLineCount {
            file: file_name(&path),
            lines: count_lines(&text),
            language: language_for(&path),
        });
    }
    Ok(counts)
}

/// SHA-256 over the names and contents of the immediate source files.
///
/// Unreadable files are left out of the digest.
pub fn source_digest(dir: &Path) -> Result<String> {
    Ok(digest_files(&list_source_files(dir)?))
}

fn digest_files(paths: &[PathBuf]) -> String {
    let mut hasher = Sha256::new();
    for path in paths {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Leaving unreadable file out of source digest");
                continue;
            }
        };
        hasher.update(file_name(path).as_bytes());
        hasher.update([0u8]);
        hasher.update(contents);
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
