use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use otapack_core::{
    create_archive, extract_archive, list_archive_contents, list_nested_archive_contents,
    ArchiveCreationProgress, ArchiveError, CancelToken, CompressionLevel, ExtractSession,
    ExtractionProgress, ExtractionState,
};

/// Lay down a small source tree:
///
/// ```text
/// src/alpha.txt
/// src/data/blob.bin
/// src/docs/empty/        (empty directory)
/// src/docs/readme.md
/// ```
fn make_tree(root: &Path) -> Vec<PathBuf> {
    fs::create_dir_all(root.join("docs/empty")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(root.join("alpha.txt"), b"alpha contents").unwrap();
    fs::write(root.join("docs/readme.md"), b"# readme\nbody\n").unwrap();
    fs::write(root.join("data/blob.bin"), vec![0x42u8; 3000]).unwrap();
    vec![
        root.join("alpha.txt"),
        root.join("data"),
        root.join("docs"),
    ]
}

fn create_quiet(output: &Path, files: &[PathBuf], base: &Path, level: CompressionLevel) {
    let cancel = CancelToken::new();
    create_archive(output, files, base, level, &cancel, |_| {}).unwrap();
}

fn extract_collecting(archive: &Path, out_dir: &Path) -> Vec<ExtractionProgress> {
    let cancel = CancelToken::new();
    let mut snapshots = Vec::new();
    extract_archive(archive, out_dir, &cancel, |p| snapshots.push(p)).unwrap();
    snapshots
}

fn assert_tree_extracted(out: &Path) {
    assert_eq!(fs::read(out.join("alpha.txt")).unwrap(), b"alpha contents");
    assert_eq!(
        fs::read(out.join("docs/readme.md")).unwrap(),
        b"# readme\nbody\n"
    );
    assert_eq!(fs::read(out.join("data/blob.bin")).unwrap(), vec![0x42u8; 3000]);
    assert!(out.join("docs/empty").is_dir());
}

#[test]
fn test_zip_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let files = make_tree(&src);

    let archive = dir.path().join("out.zip");
    create_quiet(&archive, &files, &src, CompressionLevel::Normal);

    let names: Vec<String> = list_archive_contents(&archive)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert!(names.contains(&"alpha.txt".to_string()));
    assert!(names.contains(&"data/".to_string()));
    assert!(names.contains(&"data/blob.bin".to_string()));
    assert!(names.contains(&"docs/".to_string()));
    assert!(names.contains(&"docs/empty/".to_string()));
    assert!(names.contains(&"docs/readme.md".to_string()));

    // Directory names carry exactly one trailing slash
    for name in &names {
        assert!(!name.ends_with("//"), "double slash in {}", name);
    }

    let out = dir.path().join("out");
    extract_collecting(&archive, &out);
    assert_tree_extracted(&out);
}

#[test]
fn test_tar_gz_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let files = make_tree(&src);

    let archive = dir.path().join("out.tar.gz");
    create_quiet(&archive, &files, &src, CompressionLevel::Normal);

    let entries = list_archive_contents(&archive).unwrap();
    let readme = entries
        .iter()
        .find(|e| e.name == "docs/readme.md")
        .expect("readme entry");
    assert!(!readme.is_directory);
    assert_eq!(readme.size, b"# readme\nbody\n".len() as u64);
    let empty = entries
        .iter()
        .find(|e| e.name == "docs/empty/")
        .expect("empty dir entry");
    assert!(empty.is_directory);

    let out = dir.path().join("out");
    extract_collecting(&archive, &out);
    assert_tree_extracted(&out);
}

#[test]
fn test_tar_bz2_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let files = make_tree(&src);

    let archive = dir.path().join("out.tar.bz2");
    create_quiet(&archive, &files, &src, CompressionLevel::Normal);

    let out = dir.path().join("out");
    extract_collecting(&archive, &out);
    assert_tree_extracted(&out);
}

#[test]
fn test_creation_progress_is_monotonic_and_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let files = make_tree(&src);

    let archive = dir.path().join("out.zip");
    let cancel = CancelToken::new();
    let mut snapshots: Vec<ArchiveCreationProgress> = Vec::new();
    create_archive(
        &archive,
        &files,
        &src,
        CompressionLevel::Fast,
        &cancel,
        |p| snapshots.push(p),
    )
    .unwrap();

    assert!(!snapshots.is_empty());
    for pair in snapshots.windows(2) {
        assert!(pair[1].bytes_processed >= pair[0].bytes_processed);
        assert!(pair[1].percentage >= pair[0].percentage);
    }
    let last = snapshots.last().unwrap();
    assert_eq!(last.percentage, 100);
    assert_eq!(last.files_processed, last.total_files);
    assert_eq!(last.bytes_processed, last.total_bytes);
    assert_eq!(last.total_files, 3);
}

#[test]
fn test_extraction_progress_states_and_large_file_cadence() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("empty.bin"), b"").unwrap();
    fs::write(src.join("big.bin"), vec![0u8; 5 * 1024 * 1024]).unwrap();

    let archive = dir.path().join("two.zip");
    create_quiet(
        &archive,
        &[src.join("empty.bin"), src.join("big.bin")],
        &src,
        CompressionLevel::Fastest,
    );

    let out = dir.path().join("out");
    let snapshots = extract_collecting(&archive, &out);

    assert_eq!(fs::read(out.join("empty.bin")).unwrap().len(), 0);
    assert_eq!(
        fs::metadata(out.join("big.bin")).unwrap().len(),
        5 * 1024 * 1024
    );

    assert_eq!(snapshots.first().unwrap().state, ExtractionState::Started);
    let completed: Vec<_> = snapshots
        .iter()
        .filter(|s| s.state == ExtractionState::Completed)
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].percentage, 100);
    assert!(snapshots.last().unwrap().state == ExtractionState::Completed);

    // One snapshot per ~MiB written for the large file
    let big_ticks = snapshots
        .iter()
        .filter(|s| s.state == ExtractionState::Extracting && s.current_file == "big.bin")
        .count();
    assert!(big_ticks >= 5, "got {} snapshots for big.bin", big_ticks);

    // Monotonic, and capped below 100 until the terminal snapshot
    let mut last_pct = 0u8;
    for s in &snapshots {
        assert!(s.percentage >= last_pct);
        if s.state == ExtractionState::Extracting {
            assert!(s.percentage <= 99);
        }
        last_pct = s.percentage;
    }
}

#[test]
fn test_nested_archive_listing_returns_inner_entries_only() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("inner_a.txt"), b"A").unwrap();
    fs::write(src.join("inner_b.txt"), b"B").unwrap();

    let inner = dir.path().join("stage/inner.zip");
    create_quiet(
        &inner,
        &[src.join("inner_a.txt"), src.join("inner_b.txt")],
        &src,
        CompressionLevel::Normal,
    );

    let outer_src = dir.path().join("stage");
    fs::write(outer_src.join("outer_note.txt"), b"outer").unwrap();
    let outer = dir.path().join("outer.zip");
    create_quiet(
        &outer,
        &[outer_src.join("inner.zip"), outer_src.join("outer_note.txt")],
        &outer_src,
        CompressionLevel::Normal,
    );

    let names: Vec<String> = list_nested_archive_contents(&outer, "inner.zip")
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["inner_a.txt", "inner_b.txt"]);
    assert!(!names.contains(&"outer_note.txt".to_string()));

    let err = list_nested_archive_contents(&outer, "missing.zip").unwrap_err();
    assert!(matches!(err, ArchiveError::EntryNotFound { .. }));
}

#[test]
fn test_traversal_entry_aborts_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("evil.zip");
    {
        let file = fs::File::create(&archive).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("../evil.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"boom").unwrap();
        writer.finish().unwrap();
    }

    let out = dir.path().join("deep/out");
    let cancel = CancelToken::new();
    let mut snapshots = Vec::new();
    let err = extract_archive(&archive, &out, &cancel, |p| snapshots.push(p)).unwrap_err();
    assert!(matches!(err, ArchiveError::PathTraversal { .. }));
    assert_eq!(snapshots.last().unwrap().state, ExtractionState::Error);
    assert!(snapshots.last().unwrap().error.is_some());
    assert!(!dir.path().join("deep/evil.txt").exists());
}

#[test]
fn test_unsupported_extension_is_explicit_error() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.7z");
    fs::write(&archive, b"not really 7z").unwrap();

    let cancel = CancelToken::new();
    let mut snapshots = Vec::new();
    let err =
        extract_archive(&archive, &dir.path().join("out"), &cancel, |p| snapshots.push(p))
            .unwrap_err();
    assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
    assert_eq!(snapshots.last().unwrap().state, ExtractionState::Error);

    let err = list_archive_contents(&archive).unwrap_err();
    assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
}

#[test]
fn test_cancelled_extraction_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), b"aaa").unwrap();

    let archive = dir.path().join("a.zip");
    create_quiet(&archive, &[src.join("a.txt")], &src, CompressionLevel::Normal);

    let cancel = CancelToken::new();
    cancel.cancel();
    let out = dir.path().join("out");
    let err = extract_archive(&archive, &out, &cancel, |_| {}).unwrap_err();
    assert!(matches!(err, ArchiveError::Cancelled));
    assert!(!out.join("a.txt").exists());
}

#[test]
fn test_create_refuses_existing_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), b"aaa").unwrap();

    let archive = dir.path().join("a.zip");
    fs::write(&archive, b"already here").unwrap();

    let cancel = CancelToken::new();
    let err = create_archive(
        &archive,
        &[src.join("a.txt")],
        &src,
        CompressionLevel::Normal,
        &cancel,
        |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, ArchiveError::DestinationExists(_)));
}

#[test]
fn test_extract_session_drains_to_terminal_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), b"session bytes").unwrap();

    let archive = dir.path().join("a.zip");
    create_quiet(&archive, &[src.join("a.txt")], &src, CompressionLevel::Normal);

    let out = dir.path().join("out");
    let session = ExtractSession::spawn(archive, out.clone());
    let snapshots: Vec<ExtractionProgress> = session.progress().iter().collect();
    session.wait().unwrap();

    assert_eq!(snapshots.first().unwrap().state, ExtractionState::Started);
    assert_eq!(snapshots.last().unwrap().state, ExtractionState::Completed);
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"session bytes");
}
