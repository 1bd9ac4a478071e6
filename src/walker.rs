//! Phase 1: enumerate and prune the tree into a sorted candidate list.

use crate::classify::PathClassifier;
use crate::types::{Candidate, SkipCategory, SkipRecord};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of walking the tree.
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Files eligible for content classification, sorted case-insensitively.
    pub candidates: Vec<Candidate>,
    /// File-level policy skips, in the same order as candidates would be.
    pub policy_skips: Vec<SkipRecord>,
}

struct Walker {
    inner: ignore::Walk,
    root: PathBuf,
    follow_links: bool,
}

impl Walker {
    fn new(root: &Path, classifier: &PathClassifier) -> Self {
        let follow_links = classifier.policy().follow_symlinks;
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(follow_links);

        let prune = classifier.clone();
        let base = root.to_path_buf();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if entry.depth() == 0 || !is_dir {
                return true;
            }
            let relative = entry.path().strip_prefix(&base).unwrap_or(entry.path());
            match prune.classify(relative) {
                Some(rule) => {
                    debug!("Pruned {} ({})", relative.display(), rule);
                    false
                }
                None => true,
            }
        });

        Self {
            inner: builder.build(),
            root: root.to_path_buf(),
            follow_links,
        }
    }

    /// Visits every file in a surviving directory.
    fn files(self) -> impl Iterator<Item = PathBuf> {
        let follow_links = self.follow_links;
        self.inner.filter_map(move |result| {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    return None;
                }
            };
            if !follow_links && entry.path_is_symlink() {
                // Directory links are not descended; file links are read through.
                return match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_dir() => {
                        debug!("Not following symlink {}", entry.path().display());
                        None
                    }
                    _ => Some(entry.into_path()),
                };
            }
            entry
                .file_type()
                .filter(|t| t.is_file())
                .map(|_| entry.into_path())
        })
    }
}

/// Walks `root` (already resolved) and splits its files into candidates and
/// policy skips. A file resolving to `exclude` is dropped without a record.
pub fn enumerate(root: &Path, classifier: &PathClassifier, exclude: Option<&Path>) -> Enumeration {
    let walker = Walker::new(root, classifier);
    let root = walker.root.clone();
    let mut out = Enumeration::default();

    for path in walker.files() {
        let resolved = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if exclude.is_some_and(|e| e == resolved.as_path()) {
            debug!("Excluding output file {}", path.display());
            continue;
        }
        let relative = path.strip_prefix(&root).unwrap_or(&path).to_path_buf();
        if let Some(rule) = classifier.classify(&relative) {
            debug!("Policy skip {} ({})", relative.display(), rule);
            out.policy_skips
                .push(SkipRecord::new(relative, SkipCategory::Policy, rule.as_str()));
            continue;
        }
        out.candidates.push(Candidate {
            path,
            relative,
            resolved,
        });
    }

    sort_candidates(&mut out.candidates);
    out.policy_skips
        .sort_by_cached_key(|r| (r.path.to_string_lossy().to_lowercase(), r.path.clone()));
    out
}

/// Orders candidates by case-folded relative path, ties broken by the raw
/// path, then drops duplicates of the same resolved file.
///
/// A link is dropped in favor of the file it points to when both are
/// candidates; otherwise the first in sort order wins.
pub fn sort_candidates(candidates: &mut Vec<Candidate>) {
    candidates.sort_by_cached_key(|c| (c.sort_key(), c.relative.clone()));
    let direct: HashSet<PathBuf> = candidates
        .iter()
        .filter(|c| c.path == c.resolved)
        .map(|c| c.resolved.clone())
        .collect();
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates.retain(|c| {
        let aliased = c.path != c.resolved && direct.contains(&c.resolved);
        !aliased && seen.insert(c.resolved.clone())
    });
}
