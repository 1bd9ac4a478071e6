//! Path-level exclusion decisions.
//!
//! The classifier is evaluated against paths relative to the bundle root, both
//! for directories (where a positive answer prunes the subtree) and for files
//! (where it produces a `policy` skip).

use crate::error::BundleError;
use crate::options::{ExclusionPolicy, normalize_ext};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// The rule that matched, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRule {
    IgnoredDir,
    ExcludedName,
    ExcludedExt,
    ExcludeGlob,
}

impl PolicyRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyRule::IgnoredDir => "ignored_dir",
            PolicyRule::ExcludedName => "excluded_name",
            PolicyRule::ExcludedExt => "excluded_ext",
            PolicyRule::ExcludeGlob => "exclude_glob",
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Glob patterns plus the same patterns as literal string prefixes.
#[derive(Debug, Clone)]
struct Matcher {
    globs: GlobSet,
    prefixes: Vec<String>,
}

impl Matcher {
    /// With `tail` set, a pattern is also registered as `**/<pattern>` so that
    /// it matches the trailing components of a path, not only the whole path.
    fn build<'a>(patterns: impl Iterator<Item = &'a String>, tail: bool) -> Result<Self, BundleError> {
        let mut builder = GlobSetBuilder::new();
        let mut prefixes = Vec::new();
        for pattern in patterns {
            builder.add(compile(pattern, pattern)?);
            if tail && !pattern.starts_with("**") {
                builder.add(compile(pattern, &format!("**/{pattern}"))?);
            }
            prefixes.push(pattern.clone());
        }
        let globs = builder.build().map_err(|e| BundleError::InvalidGlob {
            pattern: String::from("<set>"),
            message: e.to_string(),
        })?;
        Ok(Self { globs, prefixes })
    }

    fn is_match(&self, path: &Path) -> bool {
        let as_str = path.to_string_lossy();
        self.globs.is_match(path) || self.prefixes.iter().any(|p| as_str.starts_with(p.as_str()))
    }
}

/// An [`ExclusionPolicy`] with its globs compiled. Side-effect free and `Sync`.
///
/// Relative patterns are matched against the root-relative path. Absolute
/// patterns are matched against the root joined with it, and only when the
/// classifier was built [`with_root`](Self::with_root).
#[derive(Debug, Clone)]
pub struct PathClassifier {
    policy: ExclusionPolicy,
    relative: Matcher,
    absolute: Matcher,
    root: Option<PathBuf>,
}

impl PathClassifier {
    /// Compiles the policy's glob patterns. `*` never crosses a `/`.
    pub fn new(policy: &ExclusionPolicy) -> Result<Self, BundleError> {
        let (absolute, relative): (Vec<&String>, Vec<&String>) = policy
            .exclude_globs
            .iter()
            .partition(|p| Path::new(p.as_str()).is_absolute());
        Ok(Self {
            policy: policy.clone(),
            relative: Matcher::build(relative.into_iter(), true)?,
            absolute: Matcher::build(absolute.into_iter(), false)?,
            root: None,
        })
    }

    /// Like [`new`](Self::new), enabling absolute patterns under `root`.
    pub fn with_root(policy: &ExclusionPolicy, root: &Path) -> Result<Self, BundleError> {
        let mut classifier = Self::new(policy)?;
        classifier.root = Some(root.to_path_buf());
        Ok(classifier)
    }

    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    /// Returns the first rule that excludes `relative`, if any.
    pub fn classify(&self, relative: &Path) -> Option<PolicyRule> {
        let in_ignored_dir = relative.components().any(|c| match c {
            Component::Normal(seg) => self.policy.is_ignored_dir(&seg.to_string_lossy()),
            _ => false,
        });
        if in_ignored_dir {
            return Some(PolicyRule::IgnoredDir);
        }

        if let Some(name) = relative.file_name() {
            if self
                .policy
                .excluded_names
                .contains(&name.to_string_lossy().to_lowercase())
            {
                return Some(PolicyRule::ExcludedName);
            }
        }
        if let Some(ext) = relative.extension() {
            if self
                .policy
                .excluded_exts
                .contains(&normalize_ext(&ext.to_string_lossy()))
            {
                return Some(PolicyRule::ExcludedExt);
            }
        }

        if self.relative.is_match(relative) {
            return Some(PolicyRule::ExcludeGlob);
        }
        if let Some(root) = &self.root {
            if self.absolute.is_match(&root.join(relative)) {
                return Some(PolicyRule::ExcludeGlob);
            }
        }
        None
    }

    pub fn should_skip(&self, relative: &Path) -> bool {
        self.classify(relative).is_some()
    }
}

fn compile(original: &str, pattern: &str) -> Result<Glob, BundleError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| BundleError::InvalidGlob {
            pattern: original.to_string(),
            message: e.to_string(),
        })
}
