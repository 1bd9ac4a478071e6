//! Progress observation for the content phase.

use indicatif::{ProgressBar, ProgressStyle};

/// Receives `(processed, total)` after each candidate is handled.
///
/// Purely observational. `Sync` because the parallel content phase reports
/// from worker threads. In that mode reports may arrive out of order, so
/// `processed` is not monotonic across calls; every value from 1 to `total`
/// is reported exactly once.
pub trait ProgressReporter: Sync {
    fn report(&self, processed: usize, total: usize);
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ProgressReporter for Silent {
    fn report(&self, _processed: usize, _total: usize) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(usize, usize) + Sync,
{
    fn report(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}

impl ProgressReporter for ProgressBar {
    fn report(&self, processed: usize, total: usize) {
        if self.length() != Some(total as u64) {
            self.set_length(total as u64);
        }
        if processed as u64 > self.position() {
            self.set_position(processed as u64);
        }
    }
}

/// A bar styled like `[#####.....] 42% (123/291)`.
pub fn progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:30}] {percent:>3}% ({pos}/{len})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>.");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}
