use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Directories never descended into.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    "node_modules",
    "bower_components",
    ".venv",
    "venv",
    "env",
    ".pytest_cache",
    ".mypy_cache",
    "__pycache__",
    "dist",
    "build",
    "target",
    "out",
    ".next",
    ".nuxt",
    ".expo",
];

/// Extensions of media and binary formats that are skipped without being opened.
pub const DEFAULT_BINARY_EXTS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "svg", "ico", "webp", "mp3", "wav", "flac", "mp4", "m4v",
    "mov", "avi", "mkv", "pdf", "zip", "rar", "7z", "gz", "bz2", "xz", "tar", "iso", "ttf", "otf",
    "woff", "woff2", "exe", "dll", "so", "dylib", "bin", "class", "jar", "ds_store",
];

/// Secrets.
pub const DEFAULT_EXCLUDED_NAMES: &[&str] = &[".env"];

/// Verbose logs.
pub const DEFAULT_EXCLUDED_EXTS: &[&str] = &["log"];

pub const DEFAULT_MAX_BYTES: i64 = 2_000_000;

pub const DEFAULT_OUTPUT: &str = "repositorio.txt";

/// Normalizes an extension to lower case without a leading dot.
pub fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Strategy used to sniff file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryDetection {
    /// Null byte or more than 30% control characters in the first 4 KiB.
    #[default]
    Heuristic,
    /// `content_inspector` BOM and null-byte inspection.
    Accurate,
    /// Never treat content as binary.
    None,
}

/// The rules that decide what gets skipped. Immutable for the duration of a run.
///
/// All name and extension sets are stored case-folded; extensions carry no
/// leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionPolicy {
    pub ignored_dir_names: BTreeSet<String>,
    pub excluded_names: BTreeSet<String>,
    pub excluded_exts: BTreeSet<String>,
    pub exclude_globs: BTreeSet<String>,
    /// Overrides the known-binary extension skip.
    pub force_include_exts: BTreeSet<String>,
    /// Known-binary extensions, skipped without opening the file.
    pub binary_exts: BTreeSet<String>,
    /// Extensions rejected during the content phase and reported as `other`.
    pub late_excluded_exts: BTreeSet<String>,
    /// Size cap in bytes; negative means unlimited.
    pub max_bytes: i64,
    pub follow_symlinks: bool,
}

impl ExclusionPolicy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Size cap as an optional byte count.
    pub fn size_cap(&self) -> Option<u64> {
        u64::try_from(self.max_bytes).ok()
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dir_names.contains(&name.to_lowercase())
    }

    pub fn is_binary_ext(&self, ext: &str) -> bool {
        let ext = normalize_ext(ext);
        self.binary_exts.contains(&ext) && !self.force_include_exts.contains(&ext)
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        PolicyBuilder::default().build()
    }
}

/// Builds an [`ExclusionPolicy`] from the built-in defaults plus caller extras.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    use_defaults: bool,
    ignored_dir_names: Vec<String>,
    excluded_names: Vec<String>,
    excluded_exts: Vec<String>,
    exclude_globs: Vec<String>,
    force_include_exts: Vec<String>,
    late_excluded_exts: Vec<String>,
    max_bytes: i64,
    follow_symlinks: bool,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self {
            use_defaults: true,
            ignored_dir_names: Vec::new(),
            excluded_names: Vec::new(),
            excluded_exts: Vec::new(),
            exclude_globs: Vec::new(),
            force_include_exts: Vec::new(),
            late_excluded_exts: Vec::new(),
            max_bytes: DEFAULT_MAX_BYTES,
            follow_symlinks: false,
        }
    }
}

impl PolicyBuilder {
    /// When false, the default ignored directories, names and extensions are
    /// replaced by the caller-supplied extras alone.
    pub fn use_defaults(mut self, yes: bool) -> Self {
        self.use_defaults = yes;
        self
    }
    pub fn ignored_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_dir_names.extend(names.into_iter().map(Into::into));
        self
    }
    pub fn excluded_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_names.extend(names.into_iter().map(Into::into));
        self
    }
    pub fn excluded_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_exts.extend(exts.into_iter().map(Into::into));
        self
    }
    pub fn exclude_globs<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_globs.extend(globs.into_iter().map(Into::into));
        self
    }
    pub fn force_include_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force_include_exts.extend(exts.into_iter().map(Into::into));
        self
    }
    pub fn late_excluded_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.late_excluded_exts.extend(exts.into_iter().map(Into::into));
        self
    }
    pub fn max_bytes(mut self, max_bytes: i64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
    pub fn unlimited_size(mut self) -> Self {
        self.max_bytes = -1;
        self
    }
    pub fn follow_symlinks(mut self, yes: bool) -> Self {
        self.follow_symlinks = yes;
        self
    }

    pub fn build(self) -> ExclusionPolicy {
        let defaults = |set: &[&str]| -> Vec<String> {
            if self.use_defaults {
                set.iter().map(|s| s.to_string()).collect()
            } else {
                Vec::new()
            }
        };
        let names = |extra: &[String], base: Vec<String>| -> BTreeSet<String> {
            base.iter()
                .chain(extra)
                .map(|s| normalize_name(s))
                .filter(|s| !s.is_empty())
                .collect()
        };
        let exts = |extra: &[String], base: Vec<String>| -> BTreeSet<String> {
            base.iter()
                .chain(extra)
                .map(|s| normalize_ext(s))
                .filter(|s| !s.is_empty())
                .collect()
        };
        ExclusionPolicy {
            ignored_dir_names: names(&self.ignored_dir_names, defaults(DEFAULT_IGNORED_DIRS)),
            excluded_names: names(&self.excluded_names, defaults(DEFAULT_EXCLUDED_NAMES)),
            excluded_exts: exts(&self.excluded_exts, defaults(DEFAULT_EXCLUDED_EXTS)),
            exclude_globs: self
                .exclude_globs
                .iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            force_include_exts: exts(&self.force_include_exts, Vec::new()),
            binary_exts: exts(&[], DEFAULT_BINARY_EXTS.iter().map(|s| s.to_string()).collect()),
            late_excluded_exts: exts(&self.late_excluded_exts, Vec::new()),
            max_bytes: self.max_bytes,
            follow_symlinks: self.follow_symlinks,
        }
    }
}

/// Full configuration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    pub policy: ExclusionPolicy,
    /// Line written under each file's path.
    pub separator: String,
    /// Append the skip inventory to the document.
    pub list_skips: bool,
    pub binary_detection: BinaryDetection,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT),
            policy: ExclusionPolicy::default(),
            separator: "-".repeat(64),
            list_skips: false,
            binary_detection: BinaryDetection::Heuristic,
        }
    }
}

#[derive(Debug, Default)]
pub struct BundleBuilder {
    options: BundleOptions,
}

impl BundleBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            options: BundleOptions {
                root: root.into(),
                ..Default::default()
            },
        }
    }
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.output = path.into();
        self
    }
    pub fn policy(mut self, policy: ExclusionPolicy) -> Self {
        self.options.policy = policy;
        self
    }
    pub fn separator(mut self, line: impl Into<String>) -> Self {
        self.options.separator = line.into();
        self
    }
    pub fn list_skips(mut self, yes: bool) -> Self {
        self.options.list_skips = yes;
        self
    }
    pub fn binary_detection(mut self, method: BinaryDetection) -> Self {
        self.options.binary_detection = method;
        self
    }
    pub fn build(self) -> BundleOptions {
        self.options
    }
}
