//! Command-line interface for srcbundle.
//!
//! Collects every source file under a root into a single text document.

use clap::{Parser, ValueEnum};
use srcbundle::{
    BinaryDetection, BundleBuilder, BundleOptions, BundleSummary, DEFAULT_MAX_BYTES,
    DEFAULT_OUTPUT, ExclusionPolicy, ProgressReporter, Silent, progress_bar, run,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

/// srcbundle — gather a project's sources into one text file
#[derive(Parser)]
#[command(name = "srcbundle", version, about, long_about = None)]
struct Cli {
    /// Project root
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Extensions to include even if known binary (csv). Ex: .svg,.bin
    #[arg(long, value_delimiter = ',')]
    include_ext: Vec<String>,

    /// Extensions rejected while reading, listed under "other" (csv). Ex: .lock,.tmp
    #[arg(long, value_delimiter = ',')]
    exclude_ext: Vec<String>,

    /// Globs or path prefixes to exclude (csv). Ex: tests/screenshots,**/*.snap
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Directory names to ignore, added to the defaults (csv)
    #[arg(long, value_delimiter = ',')]
    ignored_dirs: Vec<String>,

    /// Extra file names to exclude (csv). Ex: .env.local,.env.production
    #[arg(long, value_delimiter = ',')]
    extra_excluded_names: Vec<String>,

    /// Extra extensions to exclude (csv). Ex: .db,.sqlite
    #[arg(long, value_delimiter = ',')]
    extra_excluded_exts: Vec<String>,

    /// Drop the built-in ignored directories, names and extensions
    #[arg(long)]
    no_default_excludes: bool,

    /// Maximum bytes per file (-1 for unlimited)
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES, allow_negative_numbers = true)]
    max_bytes: i64,

    /// Follow symlinks
    #[arg(long)]
    follow_symlinks: bool,

    /// Separator written under each file name
    #[arg(long, default_value_t = "-".repeat(64))]
    header_line: String,

    /// Append the inventory of skipped files
    #[arg(long, visible_alias = "list-skips")]
    list_binaries: bool,

    /// Binary detection strategy
    #[arg(long, value_enum, default_value_t = Detection::Heuristic)]
    binary_detection: Detection,

    /// Print only the final line
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Detection {
    Heuristic,
    Accurate,
    None,
}

impl From<Detection> for BinaryDetection {
    fn from(d: Detection) -> Self {
        match d {
            Detection::Heuristic => BinaryDetection::Heuristic,
            Detection::Accurate => BinaryDetection::Accurate,
            Detection::None => BinaryDetection::None,
        }
    }
}

impl Cli {
    fn to_options(&self) -> BundleOptions {
        let policy = ExclusionPolicy::builder()
            .use_defaults(!self.no_default_excludes)
            .ignored_dirs(self.ignored_dirs.iter().cloned())
            .excluded_names(self.extra_excluded_names.iter().cloned())
            .excluded_exts(self.extra_excluded_exts.iter().cloned())
            .exclude_globs(self.exclude.iter().cloned())
            .force_include_exts(self.include_ext.iter().cloned())
            .late_excluded_exts(self.exclude_ext.iter().cloned())
            .max_bytes(self.max_bytes)
            .follow_symlinks(self.follow_symlinks)
            .build();

        BundleBuilder::new(&self.root)
            .output(&self.output)
            .policy(policy)
            .separator(&self.header_line)
            .list_skips(self.list_binaries)
            .binary_detection(self.binary_detection.into())
            .build()
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn human_time(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("{} ms", elapsed.as_millis())
    } else if secs < 60.0 {
        format!("{:.2} s", secs)
    } else {
        let total = elapsed.as_secs();
        format!("{} min {} s", total / 60, total % 60)
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    let options = cli.to_options();
    let chatty = !cli.quiet && !cli.json;

    if chatty {
        println!("Collecting sources from: {}", options.root.display());
        println!("Output file: {}", options.output.display());
    }

    let bar = (chatty && std::io::stdout().is_terminal()).then(|| progress_bar("Processing"));
    let progress: &dyn ProgressReporter = match &bar {
        Some(bar) => bar as &dyn ProgressReporter,
        None => &Silent,
    };

    let summary = match run(&options, progress) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if cli.json {
        print_json(&summary);
        return;
    }
    if chatty {
        print_summary(&summary);
    }
    println!("Listo. Salida: {}", summary.output.display());
}

fn print_summary(summary: &BundleSummary) {
    let name = summary
        .output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("Done.");
    println!("Candidates: {}", summary.candidates);
    println!("Included in {}: {} files", name, summary.included);
    println!(
        "Skipped: {} (policy {}, binary {}, too large {}, other {})",
        summary.skipped.total(),
        summary.skipped.policy,
        summary.skipped.binary,
        summary.skipped.too_large,
        summary.skipped.other
    );
    println!(
        "Duration: {}",
        human_time(Duration::from_millis(summary.elapsed_ms))
    );
}

fn print_json(summary: &BundleSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("JSON serialization error: {}", e);
            exit(1);
        }
    }
}
