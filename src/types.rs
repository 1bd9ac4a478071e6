use crate::sniff::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A file that survived traversal-time filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Path as produced by the walk (root joined with the relative part).
    pub path: PathBuf,
    /// Path relative to the bundle root.
    pub relative: PathBuf,
    /// Resolved absolute form, used for self-exclusion and de-duplication.
    pub resolved: PathBuf,
}

impl Candidate {
    /// Case-folded ordering key.
    pub fn sort_key(&self) -> String {
        self.relative.to_string_lossy().to_lowercase()
    }
}

/// Why a file was left out of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCategory {
    Policy,
    Binary,
    TooLarge,
    Other,
}

impl SkipCategory {
    /// Inventory order.
    pub const ALL: [SkipCategory; 4] = [
        SkipCategory::Policy,
        SkipCategory::Binary,
        SkipCategory::TooLarge,
        SkipCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipCategory::Policy => "policy",
            SkipCategory::Binary => "binary",
            SkipCategory::TooLarge => "too_large",
            SkipCategory::Other => "other",
        }
    }
}

impl fmt::Display for SkipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the skip inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    /// Path relative to the bundle root.
    pub path: PathBuf,
    pub category: SkipCategory,
    /// Specific reason, e.g. `binary_ext` or `Error:NotFound:...`.
    pub reason: String,
}

impl SkipRecord {
    pub fn new(path: impl Into<PathBuf>, category: SkipCategory, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category,
            reason: reason.into(),
        }
    }
}

/// A text file whose decoded content goes into the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedFile {
    /// Path relative to the bundle root.
    pub relative_path: PathBuf,
    /// Decoded content.
    pub content: String,
    /// Which step of the decode chain produced `content`.
    pub encoding: Encoding,
}

/// Everything gathered by a run, ready to be rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    /// Resolved root directory.
    pub root: PathBuf,
    /// Resolved output path.
    pub output: PathBuf,
    /// Number of candidates handed to the content phase.
    pub candidates: usize,
    /// Accepted files in candidate order.
    pub files: Vec<AcceptedFile>,
    /// Skip records: policy skips in walk order, then content-phase skips in
    /// candidate order.
    pub skipped: Vec<SkipRecord>,
}

impl Bundle {
    pub fn skipped_in(&self, category: SkipCategory) -> impl Iterator<Item = &SkipRecord> {
        self.skipped.iter().filter(move |r| r.category == category)
    }
}

/// Per-category skip counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub policy: usize,
    pub binary: usize,
    pub too_large: usize,
    pub other: usize,
}

impl SkipCounts {
    pub fn from_records(records: &[SkipRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.category {
                SkipCategory::Policy => counts.policy += 1,
                SkipCategory::Binary => counts.binary += 1,
                SkipCategory::TooLarge => counts.too_large += 1,
                SkipCategory::Other => counts.other += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.policy + self.binary + self.too_large + self.other
    }
}

/// Outcome of [`run`](crate::run), suitable for printing or JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSummary {
    pub root: PathBuf,
    pub output: PathBuf,
    pub candidates: usize,
    pub included: usize,
    pub skipped: SkipCounts,
    pub elapsed_ms: u64,
}
