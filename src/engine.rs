use crate::classify::PathClassifier;
use crate::error::BundleError;
use crate::options::{BinaryDetection, BundleOptions, ExclusionPolicy, normalize_ext};
use crate::output::write_document;
use crate::progress::ProgressReporter;
use crate::sniff::{self, ContentKind, SAMPLE_LEN};
use crate::types::{AcceptedFile, Bundle, BundleSummary, Candidate, SkipCategory, SkipCounts, SkipRecord};
use crate::walker;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::env;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info};

enum Outcome {
    Accepted(AcceptedFile),
    Skipped(SkipRecord),
}

enum Content {
    Text(sniff::Decoded),
    Binary,
    TooLarge(u64),
}

/// Stats, sniffs and reads one file. Reads never go past `size_cap + 1` bytes.
fn read_file_content(
    path: &Path,
    size_cap: Option<u64>,
    binary_detection: BinaryDetection,
) -> io::Result<Content> {
    let len = fs::metadata(path)?.len();
    if let Some(cap) = size_cap {
        if len > cap {
            return Ok(Content::TooLarge(len));
        }
    }
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut data = Vec::with_capacity(len.min(SAMPLE_LEN as u64) as usize);
    reader
        .by_ref()
        .take(SAMPLE_LEN as u64)
        .read_to_end(&mut data)?;
    if sniff::classify_with(&data, binary_detection) == ContentKind::Binary {
        return Ok(Content::Binary);
    }
    let limit = size_cap.map_or(u64::MAX, |cap| cap.saturating_add(1));
    reader
        .take(limit.saturating_sub(data.len() as u64))
        .read_to_end(&mut data)?;
    // The file grew between stat and read.
    if size_cap.is_some_and(|cap| data.len() as u64 > cap) {
        return Ok(Content::TooLarge(data.len() as u64));
    }
    Ok(Content::Text(sniff::decode(&data)))
}

fn process_candidate(
    candidate: &Candidate,
    policy: &ExclusionPolicy,
    binary_detection: BinaryDetection,
) -> Outcome {
    let skip = |category, reason: String| {
        debug!("Skipped {} [{}]", candidate.relative.display(), reason);
        Outcome::Skipped(SkipRecord::new(&candidate.relative, category, reason))
    };

    if let Some(ext) = candidate.relative.extension() {
        let ext = normalize_ext(&ext.to_string_lossy());
        if policy.late_excluded_exts.contains(&ext) {
            return skip(SkipCategory::Other, "ext_excluded_cli".into());
        }
        if policy.is_binary_ext(&ext) {
            return skip(SkipCategory::Binary, "binary_ext".into());
        }
    }

    match read_file_content(&candidate.path, policy.size_cap(), binary_detection) {
        Ok(Content::Text(decoded)) => Outcome::Accepted(AcceptedFile {
            relative_path: candidate.relative.clone(),
            content: decoded.text,
            encoding: decoded.encoding,
        }),
        Ok(Content::Binary) => skip(SkipCategory::Binary, "binary_heuristic".into()),
        Ok(Content::TooLarge(len)) => {
            debug!("{} bytes exceeds cap", len);
            skip(SkipCategory::TooLarge, "too_large".into())
        }
        Err(e) => skip(SkipCategory::Other, format!("Error:{:?}:{}", e.kind(), e)),
    }
}

#[cfg(not(feature = "parallel"))]
fn process_files(
    candidates: &[Candidate],
    options: &BundleOptions,
    progress: &dyn ProgressReporter,
) -> Vec<Outcome> {
    let total = candidates.len();
    let mut outcomes = Vec::with_capacity(total);
    for (i, candidate) in candidates.iter().enumerate() {
        outcomes.push(process_candidate(
            candidate,
            &options.policy,
            options.binary_detection,
        ));
        progress.report(i + 1, total);
    }
    outcomes
}

/// Reads in parallel; `collect` keeps the candidate order.
#[cfg(feature = "parallel")]
fn process_files(
    candidates: &[Candidate],
    options: &BundleOptions,
    progress: &dyn ProgressReporter,
) -> Vec<Outcome> {
    let total = candidates.len();
    let processed = AtomicUsize::new(0);
    candidates
        .par_iter()
        .map(|candidate| {
            let outcome = process_candidate(candidate, &options.policy, options.binary_detection);
            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            progress.report(done, total);
            outcome
        })
        .collect()
}

fn resolve_root(root: &Path) -> Result<PathBuf, BundleError> {
    let resolved = fs::canonicalize(root).map_err(|_| BundleError::RootNotFound(root.to_path_buf()))?;
    if !resolved.is_dir() {
        return Err(BundleError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(resolved)
}

/// Absolute form of the output path, which need not exist yet.
fn resolve_output(output: &Path) -> Result<PathBuf, BundleError> {
    if let Ok(resolved) = fs::canonicalize(output) {
        return Ok(resolved);
    }
    let absolute = if output.is_absolute() {
        output.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| BundleError::io(output, e))?
            .join(output)
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(fs::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or(absolute.clone())),
        _ => Ok(absolute),
    }
}

struct Prepared {
    root: PathBuf,
    output: PathBuf,
    classifier: PathClassifier,
}

fn prepare(options: &BundleOptions) -> Result<Prepared, BundleError> {
    let root = resolve_root(&options.root)?;
    let output = resolve_output(&options.output)?;
    let classifier = PathClassifier::with_root(&options.policy, &root)?;
    Ok(Prepared {
        root,
        output,
        classifier,
    })
}

fn collect_prepared(
    prepared: &Prepared,
    options: &BundleOptions,
    progress: &dyn ProgressReporter,
) -> Bundle {
    info!("Collecting sources from {}", prepared.root.display());
    let enumeration = walker::enumerate(&prepared.root, &prepared.classifier, Some(prepared.output.as_path()));
    let total = enumeration.candidates.len();
    info!(
        "{} candidates, {} policy skips",
        total,
        enumeration.policy_skips.len()
    );

    let mut files = Vec::new();
    let mut skipped = enumeration.policy_skips;
    for outcome in process_files(&enumeration.candidates, options, progress) {
        match outcome {
            Outcome::Accepted(file) => files.push(file),
            Outcome::Skipped(record) => skipped.push(record),
        }
    }
    info!("{} files accepted, {} skipped", files.len(), skipped.len());

    Bundle {
        root: prepared.root.clone(),
        output: prepared.output.clone(),
        candidates: total,
        files,
        skipped,
    }
}

/// Runs both phases and returns the gathered bundle without writing it.
pub fn collect(options: &BundleOptions, progress: &dyn ProgressReporter) -> Result<Bundle, BundleError> {
    let prepared = prepare(options)?;
    Ok(collect_prepared(&prepared, options, progress))
}

/// Runs both phases and writes the document to the configured output.
///
/// The output file is created before traversal so that an unwritable
/// destination fails the run before any file is read.
pub fn run(options: &BundleOptions, progress: &dyn ProgressReporter) -> Result<BundleSummary, BundleError> {
    let started = Instant::now();
    let prepared = prepare(options)?;
    let file = File::create(&prepared.output).map_err(|e| BundleError::output(&prepared.output, e))?;

    let bundle = collect_prepared(&prepared, options, progress);

    let mut writer = BufWriter::new(file);
    write_document(&mut writer, &bundle, &options.separator, options.list_skips)
        .and_then(|_| writer.flush())
        .map_err(|e| BundleError::output(&prepared.output, e))?;

    Ok(BundleSummary {
        root: bundle.root,
        output: bundle.output,
        candidates: bundle.candidates,
        included: bundle.files.len(),
        skipped: SkipCounts::from_records(&bundle.skipped),
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_candidate(dir: &Path) -> Candidate {
        let path = dir.join("vanished.rs");
        Candidate {
            relative: PathBuf::from("vanished.rs"),
            resolved: path.clone(),
            path,
        }
    }

    #[test]
    fn test_missing_file_is_recorded_as_other() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = missing_candidate(dir.path());
        let outcome = process_candidate(&candidate, &ExclusionPolicy::default(), BinaryDetection::Heuristic);
        match outcome {
            Outcome::Skipped(record) => {
                assert_eq!(record.category, SkipCategory::Other);
                assert_eq!(record.path, PathBuf::from("vanished.rs"));
                assert!(record.reason.starts_with("Error:NotFound:"), "{}", record.reason);
            }
            Outcome::Accepted(_) => panic!("missing file was accepted"),
        }
    }

    #[test]
    fn test_failing_file_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("kept.rs"), "fn kept() {}").unwrap();
        let kept = Candidate {
            path: dir.path().join("kept.rs"),
            relative: PathBuf::from("kept.rs"),
            resolved: dir.path().join("kept.rs"),
        };
        let candidates = vec![kept, missing_candidate(dir.path())];
        let options = BundleOptions::default();
        let outcomes = process_files(&candidates, &options, &crate::Silent);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(&outcomes[0], Outcome::Accepted(f) if f.content == "fn kept() {}"));
        assert!(matches!(&outcomes[1], Outcome::Skipped(r) if r.category == SkipCategory::Other));
    }
}
