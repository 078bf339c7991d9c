//! Declared runtime dependencies from a project manifest.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKAGE_JSON: &str = "package.json";
pub const REQUIREMENTS_TXT: &str = "requirements.txt";

/// Dependency scan result (`raw_metrics.dependency_analysis`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub has_package_json: bool,
    pub has_requirements_txt: bool,
    /// Declared names in document order
    pub production_dependencies: Vec<String>,
    pub dependency_count: u32,
}

impl DependencyReport {
    fn with_names(mut self, names: Vec<String>) -> Self {
        self.dependency_count = names.len() as u32;
        self.production_dependencies = names;
        self
    }
}

/// Directories searched for a manifest: the source directory, then its parent.
pub(crate) fn manifest_dirs(src_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![src_dir.to_path_buf()];
    if let Some(parent) = src_dir.parent() {
        dirs.push(parent.to_path_buf());
    }
    dirs
}

/// First `package.json` found in the manifest search path.
pub(crate) fn find_package_json(src_dir: &Path) -> Option<PathBuf> {
    manifest_dirs(src_dir)
        .into_iter()
        .map(|dir| dir.join(PACKAGE_JSON))
        .find(|p| p.is_file())
}

/// Count declared dependencies.
///
/// The first directory holding a manifest ends the search, and within it
/// `package.json` is preferred over `requirements.txt`. A manifest that
/// cannot be read or parsed contributes no names.
pub fn count_dependencies(src_dir: &Path) -> DependencyReport {
    for dir in manifest_dirs(src_dir) {
        let package_json = dir.join(PACKAGE_JSON);
        if package_json.is_file() {
            let report = DependencyReport {
                has_package_json: true,
                ..Default::default()
            };
            return match package_dependencies(&package_json) {
                Some(names) => report.with_names(names),
                None => {
                    tracing::warn!(path = %package_json.display(), "Malformed package.json, counting no dependencies");
                    report
                }
            };
        }

        let requirements = dir.join(REQUIREMENTS_TXT);
        if requirements.is_file() {
            let report = DependencyReport {
                has_requirements_txt: true,
                ..Default::default()
            };
            return match fs::read_to_string(&requirements) {
                Ok(text) => report.with_names(parse_requirements(&text)),
                Err(e) => {
                    tracing::warn!(path = %requirements.display(), error = %e, "Unreadable requirements.txt");
                    report
                }
            };
        }
    }

    DependencyReport::default()
}

/// Keys of the `dependencies` object, in document order.
fn package_dependencies(path: &Path) -> Option<Vec<String>> {
    let text = fs::read_to_string(path).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&text).ok()?;
    let names = match manifest.get("dependencies") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Object(deps)) => deps.keys().cloned().collect(),
        Some(_) => return None,
    };
    Some(names)
}

/// Requirement names, one per non-empty non-comment line.
///
/// The name ends at the first version specifier, extras bracket,
/// environment marker or whitespace.
pub fn parse_requirements(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let end = line
                .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | '[' | ';') || c.is_whitespace())
                .unwrap_or(line.len());
            line[..end].to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// `scripts.build` is declared in the given manifest.
pub(crate) fn has_build_script(package_json: &Path) -> bool {
    fs::read_to_string(package_json)
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|manifest| manifest.get("scripts").cloned())
        .map(|scripts| scripts.get("build").is_some())
        .unwrap_or(false)
}
