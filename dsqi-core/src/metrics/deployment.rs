//! Deployment-step estimation from project structure.

use crate::error::Result;
use crate::metrics::dependencies::{find_package_json, has_build_script};
use crate::metrics::source::list_all_files;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const STATIC_METHOD: &str = "GitHub Pages (static)";
pub const BUILD_METHOD: &str = "Build + Deploy";
pub const UNKNOWN_METHOD: &str = "Unknown";
pub const CUSTOM_METHOD: &str = "custom";

const STATIC_STEPS: &[&str] = &["git add .", "git commit -m 'deploy'", "git push origin main"];

const BUILD_STEPS: &[&str] = &[
    "npm install",
    "npm run build",
    "git add dist/",
    "git commit -m 'deploy'",
    "git push origin main",
];

const UNKNOWN_STEPS: &[&str] = &["Manual deployment, steps unknown"];

/// How an artifact is shipped (`raw_metrics.deployment`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub method: String,
    pub steps_description: Vec<String>,
    /// Scored value; may differ from the description length when overridden
    pub steps_count: u32,
}

impl DeploymentPlan {
    fn from_steps(method: &str, steps: &[&str]) -> Self {
        Self {
            method: method.to_string(),
            steps_description: steps.iter().map(|s| s.to_string()).collect(),
            steps_count: steps.len() as u32,
        }
    }
}

/// Caller-supplied deployment facts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentOverride {
    /// Replaces the heuristic method label
    pub method: Option<String>,
    /// Explicit step list; wins over every heuristic when non-empty
    pub steps: Vec<String>,
    /// Replaces only the scored count
    pub steps_count: Option<u32>,
}

impl DeploymentOverride {
    /// Build from a comma-separated step description.
    pub fn with_steps_csv(mut self, csv: &str) -> Self {
        self.steps = csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        self
    }
}

/// Estimate the deployment plan of a source directory.
pub fn estimate_deployment(src_dir: &Path, overrides: &DeploymentOverride) -> Result<DeploymentPlan> {
    let mut plan = if !overrides.steps.is_empty() {
        DeploymentPlan {
            method: CUSTOM_METHOD.to_string(),
            steps_count: overrides.steps.len() as u32,
            steps_description: overrides.steps.clone(),
        }
    } else {
        heuristic_plan(src_dir)?
    };

    if let Some(method) = &overrides.method {
        plan.method = method.clone();
    }
    if let Some(count) = overrides.steps_count {
        plan.steps_count = count;
    }

    tracing::debug!(method = %plan.method, steps = plan.steps_count, "Estimated deployment");
    Ok(plan)
}

fn heuristic_plan(src_dir: &Path) -> Result<DeploymentPlan> {
    let package_json = find_package_json(src_dir);
    let build_script = package_json
        .as_deref()
        .map(has_build_script)
        .unwrap_or(false);

    let has_html = list_all_files(src_dir)?
        .iter()
        .any(|p| p.extension().and_then(|e| e.to_str()) == Some("html"));

    let plan = if has_html && package_json.is_none() {
        DeploymentPlan::from_steps(STATIC_METHOD, STATIC_STEPS)
    } else if build_script {
        DeploymentPlan::from_steps(BUILD_METHOD, BUILD_STEPS)
    } else {
        DeploymentPlan::from_steps(UNKNOWN_METHOD, UNKNOWN_STEPS)
    };
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn src_with(files: &[(&str, &str)]) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        for (name, contents) in files {
            fs::write(src.join(name), contents).unwrap();
        }
        (dir, src)
    }

    #[test]
    fn test_static_site() {
        let (_dir, src) = src_with(&[("index.html", "<html></html>"), ("app.js", "")]);
        let plan = estimate_deployment(&src, &DeploymentOverride::default()).unwrap();
        assert_eq!(plan.method, STATIC_METHOD);
        assert_eq!(plan.steps_count, 3);
        assert_eq!(plan.steps_description[2], "git push origin main");
    }

    #[test]
    fn test_build_script() {
        let (_dir, src) = src_with(&[
            ("index.html", "<html></html>"),
            ("package.json", r#"{"scripts": {"build": "vite build"}}"#),
        ]);
        let plan = estimate_deployment(&src, &DeploymentOverride::default()).unwrap();
        assert_eq!(plan.method, BUILD_METHOD);
        assert_eq!(plan.steps_count, 5);
    }

    #[test]
    fn test_build_script_in_parent_manifest() {
        let (dir, src) = src_with(&[("main.ts", "")]);
        fs::write(
            dir.path().join("package.json"),
            r#"{"scripts": {"build": "tsc"}}"#,
        )
        .unwrap();
        let plan = estimate_deployment(&src, &DeploymentOverride::default()).unwrap();
        assert_eq!(plan.method, BUILD_METHOD);
    }

    #[test]
    fn test_manifest_without_build_is_unknown() {
        let (_dir, src) = src_with(&[
            ("index.html", "<html></html>"),
            ("package.json", r#"{"dependencies": {}}"#),
        ]);
        let plan = estimate_deployment(&src, &DeploymentOverride::default()).unwrap();
        assert_eq!(plan.method, UNKNOWN_METHOD);
        assert_eq!(plan.steps_count, 1);
    }

    #[test]
    fn test_explicit_steps_win() {
        let (_dir, src) = src_with(&[("index.html", "<html></html>")]);
        let overrides =
            DeploymentOverride::default().with_steps_csv("git add, git commit ,git push,enable Pages");
        let plan = estimate_deployment(&src, &overrides).unwrap();
        assert_eq!(plan.method, CUSTOM_METHOD);
        assert_eq!(plan.steps_count, 4);
        assert_eq!(plan.steps_description[1], "git commit");
    }

    #[test]
    fn test_method_label_and_count_overrides() {
        let (_dir, src) = src_with(&[("index.html", "<html></html>")]);
        let overrides = DeploymentOverride {
            method: Some("GitHub Pages".to_string()),
            steps: Vec::new(),
            steps_count: Some(2),
        };
        let plan = estimate_deployment(&src, &overrides).unwrap();
        assert_eq!(plan.method, "GitHub Pages");
        assert_eq!(plan.steps_count, 2);
        assert_eq!(plan.steps_description.len(), 3);
    }
}
