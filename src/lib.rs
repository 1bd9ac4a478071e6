//! # srcbundle
//!
//! `srcbundle` walks a directory tree, classifies every file as included,
//! excluded, binary or too large, and concatenates the accepted files into a
//! single ordered text document with per-file headers and an optional
//! inventory of what was skipped.
//!
//! A run has two phases. The walk prunes ignored directories and produces a
//! sorted candidate list; only then are candidates opened, sniffed and decoded.
//! Knowing the candidate count up front keeps progress reporting exact, and
//! sorting keeps the output identical across runs and platforms.
//!
//! # Features
//!
//! - `parallel` (default): reads candidates on a Rayon pool. Results are
//!   collected in candidate order, so the document is unchanged.
//!
//! # Example
//!
//! ```no_run
//! use srcbundle::{BundleBuilder, ExclusionPolicy, Silent, run};
//!
//! let policy = ExclusionPolicy::builder()
//!     .exclude_globs(["tests/fixtures"])
//!     .max_bytes(1_000_000)
//!     .build();
//! let options = BundleBuilder::new(".")
//!     .output("repositorio.txt")
//!     .policy(policy)
//!     .list_skips(true)
//!     .build();
//!
//! let summary = run(&options, &Silent).expect("collection failed");
//! println!("{} files written to {}", summary.included, summary.output.display());
//! ```

pub mod classify;
mod engine;
mod error;
mod options;
pub mod output;
mod progress;
pub mod sniff;
mod types;
pub mod walker;

pub use classify::{PathClassifier, PolicyRule};
pub use engine::{collect, run};
pub use error::BundleError;
pub use options::{
    BinaryDetection, BundleBuilder, BundleOptions, DEFAULT_BINARY_EXTS, DEFAULT_EXCLUDED_EXTS,
    DEFAULT_EXCLUDED_NAMES, DEFAULT_IGNORED_DIRS, DEFAULT_MAX_BYTES, DEFAULT_OUTPUT, ExclusionPolicy,
    PolicyBuilder,
};
pub use progress::{ProgressReporter, Silent, progress_bar};
pub use types::{AcceptedFile, Bundle, BundleSummary, Candidate, SkipCategory, SkipCounts, SkipRecord};
