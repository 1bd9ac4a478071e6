use srcbundle::output::render_document;
use srcbundle::sniff::Encoding;
use srcbundle::{
    BundleBuilder, BundleError, BundleOptions, ExclusionPolicy, SkipCategory, Silent, collect, run,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

fn options_for(root: &Path) -> BundleOptions {
    BundleBuilder::new(root)
        .output(root.join("repositorio.txt"))
        .list_skips(true)
        .build()
}

fn included(options: &BundleOptions) -> Vec<PathBuf> {
    collect(options, &Silent)
        .unwrap()
        .files
        .into_iter()
        .map(|f| f.relative_path)
        .collect()
}

#[test]
fn integration_full_flow() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), "pub fn test() {}\n").unwrap();

    let options = options_for(dir.path());
    let summary = run(&options, &Silent).unwrap();
    assert_eq!(summary.included, 2);
    assert_eq!(summary.candidates, 2);

    let doc = fs::read_to_string(dir.path().join("repositorio.txt")).unwrap();
    let sep = "-".repeat(64);
    let root = fs::canonicalize(dir.path()).unwrap();
    let expected = format!(
        "# Repositorio de fuentes\n# Raíz: {}\n# Archivos incluidos: 2\n\n\
         main.rs\n{sep}\nfn main() {{}}\n\n\
         {}\n{sep}\npub fn test() {{}}\n\n\
         \n# --- Archivos omitidos (referencia) ---\n",
        root.display(),
        Path::new("src").join("lib.rs").display(),
    );
    assert_eq!(doc, expected);
}

#[test]
fn test_case_insensitive_order() {
    let dir = tempdir().unwrap();
    for name in ["b.txt", "A.txt", "c.TXT"] {
        fs::write(dir.path().join(name), name).unwrap();
    }
    let order = included(&options_for(dir.path()));
    assert_eq!(
        order,
        vec![PathBuf::from("A.txt"), PathBuf::from("b.txt"), PathBuf::from("c.TXT")]
    );
}

#[test]
fn test_pruned_dirs_leave_no_record_but_policy_skips_do() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
    fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();
    fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
    fs::write(dir.path().join("app.py"), "print(1)").unwrap();

    let options = options_for(dir.path());
    let bundle = collect(&options, &Silent).unwrap();
    assert_eq!(bundle.files.len(), 1);
    assert_eq!(bundle.skipped.len(), 1);
    assert_eq!(bundle.skipped[0].path, PathBuf::from(".env"));
    assert_eq!(bundle.skipped[0].category, SkipCategory::Policy);
    assert_eq!(bundle.skipped[0].reason, "excluded_name");

    let doc = render_document(&bundle, &options.separator, true);
    assert!(!doc.contains("node_modules"));
    assert!(doc.contains("# Excluidos por política (.env, *.log, y extras):\n- .env [excluded_name]\n"));
}

#[test]
fn test_glob_prefix_prunes_directory_but_records_files() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("tests/screenshots")).unwrap();
    fs::write(dir.path().join("tests/screenshots/home.txt"), "x").unwrap();
    fs::write(dir.path().join("tests/screenshots.txt"), "x").unwrap();
    fs::write(dir.path().join("tests/unit.rs"), "x").unwrap();

    let policy = ExclusionPolicy::builder()
        .exclude_globs(["tests/screenshots"])
        .build();
    let options = BundleBuilder::new(dir.path()).policy(policy).build();
    let bundle = collect(&options, &Silent).unwrap();
    assert_eq!(bundle.files.len(), 1);
    assert_eq!(bundle.files[0].relative_path, Path::new("tests").join("unit.rs"));
    assert_eq!(bundle.skipped.len(), 1);
    assert_eq!(bundle.skipped[0].path, Path::new("tests").join("screenshots.txt"));
    assert_eq!(bundle.skipped[0].reason, "exclude_glob");
}

#[cfg(unix)]
#[test]
fn test_absolute_exclude_pattern_under_root() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("gen")).unwrap();
    fs::write(dir.path().join("gen/a.txt"), "generated").unwrap();
    fs::write(dir.path().join("keep.txt"), "kept").unwrap();

    let root = fs::canonicalize(dir.path()).unwrap();
    let pattern = root.join("gen").to_string_lossy().into_owned();
    let policy = ExclusionPolicy::builder().exclude_globs([pattern]).build();
    let options = BundleBuilder::new(dir.path()).policy(policy).build();
    let bundle = collect(&options, &Silent).unwrap();
    let order: Vec<_> = bundle.files.iter().map(|f| f.relative_path.clone()).collect();
    assert_eq!(order, vec![PathBuf::from("keep.txt")]);
    assert!(bundle.skipped.is_empty());
}

#[test]
fn test_root_named_like_ignored_dir_is_still_walked() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("build");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    let order = included(&options_for(&root));
    assert_eq!(order, vec![PathBuf::from("a.txt")]);
}

#[test]
fn test_output_is_excluded_and_runs_are_idempotent() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    fs::write(dir.path().join("b.md"), "# beta\n").unwrap();
    let options = options_for(dir.path());

    let first = run(&options, &Silent).unwrap();
    let first_doc = fs::read(dir.path().join("repositorio.txt")).unwrap();
    let second = run(&options, &Silent).unwrap();
    let second_doc = fs::read(dir.path().join("repositorio.txt")).unwrap();

    assert_eq!(first.included, 2);
    assert_eq!(second.included, 2);
    assert_eq!(second.skipped.total(), 0);
    assert_eq!(first_doc, second_doc);

    let bundle = collect(&options, &Silent).unwrap();
    assert!(bundle.files.iter().all(|f| f.relative_path != Path::new("repositorio.txt")));
    assert!(bundle.skipped.is_empty());
}

#[test]
fn test_size_boundary() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("exact.txt"), "a".repeat(1000)).unwrap();
    fs::write(dir.path().join("over.txt"), "a".repeat(1001)).unwrap();

    let capped = BundleBuilder::new(dir.path())
        .policy(ExclusionPolicy::builder().max_bytes(1000).build())
        .build();
    let bundle = collect(&capped, &Silent).unwrap();
    assert_eq!(bundle.files.len(), 1);
    assert_eq!(bundle.files[0].relative_path, PathBuf::from("exact.txt"));
    let large: Vec<_> = bundle.skipped_in(SkipCategory::TooLarge).collect();
    assert_eq!(large.len(), 1);
    assert_eq!(large[0].path, PathBuf::from("over.txt"));
    assert_eq!(large[0].reason, "too_large");

    let unlimited = BundleBuilder::new(dir.path())
        .policy(ExclusionPolicy::builder().unlimited_size().build())
        .build();
    let bundle = collect(&unlimited, &Silent).unwrap();
    assert_eq!(bundle.files.len(), 2);
    assert!(bundle.skipped.is_empty());
}

#[test]
fn test_binary_skips() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("logo.png"), "not really a png").unwrap();
    fs::write(dir.path().join("blob.dat"), vec![0u8, 1, 2, 3]).unwrap();
    fs::write(dir.path().join("icon.svg"), "<svg/>").unwrap();

    let options = options_for(dir.path());
    let bundle = collect(&options, &Silent).unwrap();
    assert!(bundle.files.is_empty());
    let reasons: Vec<_> = bundle
        .skipped_in(SkipCategory::Binary)
        .map(|r| (r.path.clone(), r.reason.as_str()))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (PathBuf::from("blob.dat"), "binary_heuristic"),
            (PathBuf::from("icon.svg"), "binary_ext"),
            (PathBuf::from("logo.png"), "binary_ext"),
        ]
    );

    let doc = render_document(&bundle, &options.separator, true);
    assert!(doc.contains("# Binarios/medios:\n- blob.dat [binary_heuristic]\n- icon.svg [binary_ext]\n"));

    let forced = BundleBuilder::new(dir.path())
        .policy(ExclusionPolicy::builder().force_include_exts([".svg"]).build())
        .build();
    let bundle = collect(&forced, &Silent).unwrap();
    assert_eq!(bundle.files.len(), 1);
    assert_eq!(bundle.files[0].content, "<svg/>");
}

#[test]
fn test_late_excluded_extension_is_reported_as_other() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Cargo.lock"), "lock").unwrap();
    let options = BundleBuilder::new(dir.path())
        .policy(ExclusionPolicy::builder().late_excluded_exts([".lock"]).build())
        .build();
    let bundle = collect(&options, &Silent).unwrap();
    assert_eq!(bundle.candidates, 1);
    assert_eq!(bundle.skipped[0].category, SkipCategory::Other);
    assert_eq!(bundle.skipped[0].reason, "ext_excluded_cli");
    let doc = render_document(&bundle, &options.separator, true);
    assert!(doc.contains("# Otros omitidos/errores:\n- Cargo.lock [ext_excluded_cli]\n"));
}

#[test]
fn test_invalid_utf8_is_decoded() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), b"caf\xe9 au lait".to_vec()).unwrap();
    let bundle = collect(&options_for(dir.path()), &Silent).unwrap();
    assert_eq!(bundle.files.len(), 1);
    assert_eq!(bundle.files[0].content, "café au lait");
    assert_eq!(bundle.files[0].encoding, Encoding::Latin1);
}

#[test]
fn test_content_gets_exactly_one_trailing_newline() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "no newline").unwrap();
    fs::write(dir.path().join("b.txt"), "has newline\n").unwrap();
    let options = BundleBuilder::new(dir.path()).separator("====").build();
    let bundle = collect(&options, &Silent).unwrap();
    let doc = render_document(&bundle, &options.separator, false);
    assert!(doc.contains("a.txt\n====\nno newline\n\nb.txt\n====\nhas newline\n\n"));
    assert!(doc.ends_with("has newline\n\n"));
    assert!(!doc.contains("Archivos omitidos"));
}

#[test]
fn test_progress_reports_every_candidate() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        fs::write(dir.path().join(format!("f{i}.txt")), "x").unwrap();
    }
    fs::write(dir.path().join(".env"), "x").unwrap();

    let reports = Mutex::new(Vec::new());
    let record = |processed: usize, total: usize| reports.lock().unwrap().push((processed, total));
    let bundle = collect(&options_for(dir.path()), &record).unwrap();

    let mut reports = reports.into_inner().unwrap();
    reports.sort();
    assert_eq!(bundle.candidates, 5);
    assert_eq!(reports, (1..=5).map(|i| (i, 5)).collect::<Vec<_>>());
}

#[cfg(unix)]
#[test]
fn test_symlinks_followed_only_on_request() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("linked.txt"), "linked").unwrap();
    fs::write(dir.path().join("own.txt"), "own").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("shared")).unwrap();

    let default = BundleBuilder::new(dir.path()).build();
    assert_eq!(included(&default), vec![PathBuf::from("own.txt")]);

    let follow = BundleBuilder::new(dir.path())
        .policy(ExclusionPolicy::builder().follow_symlinks(true).build())
        .build();
    assert_eq!(
        included(&follow),
        vec![PathBuf::from("own.txt"), Path::new("shared").join("linked.txt")]
    );
}

#[cfg(unix)]
#[test]
fn test_file_symlinks_are_read_through() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(dir.path().join("real.txt"), "real").unwrap();
    fs::write(outside.path().join("notes.txt"), "notes").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("alias.txt")).unwrap();
    std::os::unix::fs::symlink(outside.path().join("notes.txt"), dir.path().join("notes.txt")).unwrap();

    let bundle = collect(&BundleBuilder::new(dir.path()).build(), &Silent).unwrap();
    let order: Vec<_> = bundle.files.iter().map(|f| f.relative_path.clone()).collect();
    assert_eq!(order, vec![PathBuf::from("notes.txt"), PathBuf::from("real.txt")]);
    assert_eq!(bundle.files[0].content, "notes");
    assert!(bundle.skipped.is_empty());
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_reported_as_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("ok.txt"), "ok").unwrap();
    std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("broken.txt")).unwrap();

    let options = options_for(dir.path());
    let bundle = collect(&options, &Silent).unwrap();
    assert_eq!(bundle.files.len(), 1);
    let other: Vec<_> = bundle.skipped_in(SkipCategory::Other).collect();
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].path, PathBuf::from("broken.txt"));
    assert!(other[0].reason.starts_with("Error:NotFound:"), "{}", other[0].reason);

    let doc = render_document(&bundle, &options.separator, true);
    assert!(doc.contains("# Otros omitidos/errores:\n- broken.txt [Error:NotFound:"));
}

#[test]
fn test_bad_root_is_fatal() {
    let dir = tempdir().unwrap();
    let missing = BundleBuilder::new(dir.path().join("missing")).build();
    assert!(matches!(collect(&missing, &Silent), Err(BundleError::RootNotFound(_))));

    let file = dir.path().join("file.txt");
    fs::write(&file, "x").unwrap();
    let not_dir = BundleBuilder::new(&file).build();
    assert!(matches!(run(&not_dir, &Silent), Err(BundleError::RootNotDirectory(_))));
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let options = BundleBuilder::new(dir.path())
        .output(dir.path().join("no/such/dir/out.txt"))
        .build();
    assert!(matches!(run(&options, &Silent), Err(BundleError::Output { .. })));
}
