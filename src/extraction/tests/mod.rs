use crate::error::{Error, ExtractionError};
use crate::extraction::shared::{
    collect_extracted_files, is_password_error, sanitize_entry_path, validate_extracted_paths,
};
use crate::extraction::*;
use crate::test_helpers::*;
use crate::types::ArchiveFormat;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

#[test]
fn sanitize_entry_path_strips_traversal_components() {
    assert_eq!(
        sanitize_entry_path(Path::new("../../etc/passwd")),
        Some(PathBuf::from("etc/passwd"))
    );
    assert_eq!(
        sanitize_entry_path(Path::new("/abs/file.txt")),
        Some(PathBuf::from("abs/file.txt"))
    );
    assert_eq!(sanitize_entry_path(Path::new("..")), None);
    assert_eq!(sanitize_entry_path(Path::new("./")), None);
}

#[test]
fn password_errors_are_detected_case_insensitively() {
    assert!(is_password_error("Password required to decrypt file"));
    assert!(is_password_error("entry is ENCRYPTED"));
    assert!(!is_password_error("invalid central directory"));
}

#[test]
fn collect_extracted_files_returns_only_files_sorted() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir_all(root.join("sub/deeper")).unwrap();
    std::fs::write(root.join("b.txt"), b"b").unwrap();
    std::fs::write(root.join("a.txt"), b"a").unwrap();
    std::fs::write(root.join("sub/deeper/c.txt"), b"c").unwrap();

    let files = collect_extracted_files(root).unwrap();
    assert_eq!(
        files,
        vec![
            root.join("a.txt"),
            root.join("b.txt"),
            root.join("sub/deeper/c.txt")
        ]
    );
}

#[test]
fn validate_extracted_paths_accepts_normal_files() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("sub")).unwrap();
    std::fs::write(temp_dir.path().join("sub/file.txt"), b"ok").unwrap();

    validate_extracted_paths(Path::new("x.7z"), temp_dir.path()).unwrap();
}

#[cfg(unix)]
#[test]
fn validate_extracted_paths_rejects_symlink_traversal() {
    let outside = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    std::os::unix::fs::symlink(outside.path(), dest.path().join("escape")).unwrap();

    let err = validate_extracted_paths(Path::new("evil.7z"), dest.path()).unwrap_err();
    match err {
        Error::Extraction(ExtractionError::UnsafePath { archive, entry }) => {
            assert_eq!(archive, PathBuf::from("evil.7z"));
            assert!(entry.ends_with("escape"));
        }
        other => panic!("expected UnsafePath, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// ZIP
// ---------------------------------------------------------------------------

#[test]
fn zip_try_extract_extracts_nested_entries() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.zip");
    create_zip_archive(
        &archive_path,
        &[("top.txt", b"top"), ("dir/inner.txt", b"inner")],
    );

    let dest = temp_dir.path().join("out");
    let files = ZipExtractor::try_extract(&archive_path, &dest).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(std::fs::read_to_string(dest.join("top.txt")).unwrap(), "top");
    assert_eq!(
        std::fs::read_to_string(dest.join("dir/inner.txt")).unwrap(),
        "inner"
    );
}

#[test]
fn zip_try_extract_merges_into_existing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.zip");
    create_zip_archive(&archive_path, &[("new.txt", b"new")]);

    let dest = temp_dir.path().join("out");
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(dest.join("old.txt"), b"old").unwrap();

    ZipExtractor::try_extract(&archive_path, &dest).unwrap();

    assert!(dest.join("old.txt").exists());
    assert!(dest.join("new.txt").exists());
}

#[test]
fn zip_try_extract_missing_archive_is_filesystem_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ZipExtractor::try_extract(Path::new("/no/such/a.zip"), &temp_dir.path().join("o"));
    let err = result.unwrap_err();
    assert!(err.is_filesystem_failure(), "got: {err:?}");
}

#[test]
fn zip_try_extract_corrupt_archive_returns_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("corrupt.zip");
    std::fs::write(&archive_path, b"this is not a zip archive").unwrap();

    match ZipExtractor::try_extract(&archive_path, &temp_dir.path().join("out")) {
        Err(Error::Extraction(ExtractionError::Failed { archive, reason })) => {
            assert_eq!(archive, archive_path);
            assert!(!reason.is_empty());
        }
        other => panic!("expected Failed, got: {other:?}"),
    }
}

#[test]
fn zip_try_extract_encrypted_returns_password_protected() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("locked.zip");
    create_encrypted_zip(&archive_path, "secret.txt", b"classified");

    match ZipExtractor::try_extract(&archive_path, &temp_dir.path().join("out")) {
        Err(Error::Extraction(ExtractionError::PasswordProtected { archive })) => {
            assert_eq!(archive, archive_path);
        }
        other => panic!("expected PasswordProtected, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 7z
// ---------------------------------------------------------------------------

#[test]
fn sevenz_try_extract_extracts_real_archive() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.7z");
    create_7z_archive(
        &archive_path,
        &[("hello.txt", b"Hello, world!"), ("data.bin", b"\x00\x01\x02\x03")],
    );

    let dest = temp_dir.path().join("extracted");
    let files = SevenZipExtractor::try_extract(&archive_path, &dest).unwrap();

    assert_eq!(files.len(), 2, "should extract exactly 2 files");

    let hello_file = files.iter().find(|p| p.ends_with("hello.txt")).unwrap();
    assert_eq!(std::fs::read_to_string(hello_file).unwrap(), "Hello, world!");

    let data_file = files.iter().find(|p| p.ends_with("data.bin")).unwrap();
    assert_eq!(std::fs::read(data_file).unwrap(), b"\x00\x01\x02\x03");
}

#[test]
fn sevenz_try_extract_corrupt_archive_returns_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("corrupt.7z");
    std::fs::write(&archive_path, b"this is not a valid 7z archive").unwrap();

    let result = SevenZipExtractor::try_extract(&archive_path, &temp_dir.path().join("out"));
    let err = result.unwrap_err();
    assert!(err.is_extraction_failure(), "got: {err:?}");
}

// ---------------------------------------------------------------------------
// RAR
// ---------------------------------------------------------------------------

#[test]
fn rar_try_extract_corrupt_archive_returns_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("corrupt.rar");
    std::fs::write(&archive_path, b"this is not a rar archive").unwrap();

    let result = RarExtractor::try_extract(&archive_path, &temp_dir.path().join("out"));
    let err = result.unwrap_err();
    assert!(err.is_extraction_failure(), "got: {err:?}");
}

// ---------------------------------------------------------------------------
// tar
// ---------------------------------------------------------------------------

#[test]
fn tar_try_extract_plain_tarball() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("bundle.tar");
    create_tar_archive(
        &archive_path,
        &[("a.txt", b"alpha"), ("nested/dir/b.txt", b"beta")],
    );

    let dest = temp_dir.path().join("out");
    let files = TarExtractor::try_extract(&archive_path, &dest, TarCompression::None).unwrap();

    assert_eq!(files, vec![dest.join("a.txt"), dest.join("nested/dir/b.txt")]);
    assert_eq!(
        std::fs::read_to_string(dest.join("nested/dir/b.txt")).unwrap(),
        "beta"
    );
}

#[test]
fn tar_try_extract_gzip_tarball() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("bundle.tgz");
    create_tgz_archive(&archive_path, &[("inside.txt", b"compressed")]);

    let dest = temp_dir.path().join("out");
    TarExtractor::try_extract(&archive_path, &dest, TarCompression::Gzip).unwrap();

    assert_eq!(
        std::fs::read_to_string(dest.join("inside.txt")).unwrap(),
        "compressed"
    );
}

#[test]
fn tar_try_extract_garbage_returns_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("garbage.tar");
    std::fs::write(&archive_path, vec![b'x'; 700]).unwrap();

    let result = TarExtractor::try_extract(
        &archive_path,
        &temp_dir.path().join("out"),
        TarCompression::None,
    );
    assert!(result.unwrap_err().is_extraction_failure());
}

// ---------------------------------------------------------------------------
// Single streams
// ---------------------------------------------------------------------------

#[test]
fn stream_output_name_strips_last_suffix() {
    assert_eq!(StreamExtractor::output_name(Path::new("notes.txt.gz")), "notes.txt");
    assert_eq!(StreamExtractor::output_name(Path::new("data.tar.xz")), "data.tar");
    assert_eq!(StreamExtractor::output_name(Path::new("plain.bz2")), "plain");
    assert_eq!(StreamExtractor::output_name(Path::new(".gz")), "data");
}

#[test]
fn stream_try_extract_gzip() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("notes.txt.gz");
    create_gz_file(&archive_path, b"gzip content");

    let dest = temp_dir.path().join("out");
    let files = StreamExtractor::try_extract(&archive_path, &dest, ArchiveFormat::Gzip).unwrap();

    assert_eq!(files, vec![dest.join("notes.txt")]);
    assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), "gzip content");
}

#[test]
fn stream_try_extract_bzip2_and_xz() {
    let temp_dir = TempDir::new().unwrap();
    let bz2 = temp_dir.path().join("a.txt.bz2");
    let xz = temp_dir.path().join("b.txt.xz");
    create_bz2_file(&bz2, b"bzip2 content");
    create_xz_file(&xz, b"xz content");

    let dest = temp_dir.path().join("out");
    StreamExtractor::try_extract(&bz2, &dest, ArchiveFormat::Bzip2).unwrap();
    StreamExtractor::try_extract(&xz, &dest, ArchiveFormat::Xz).unwrap();

    assert_eq!(std::fs::read_to_string(dest.join("a.txt")).unwrap(), "bzip2 content");
    assert_eq!(std::fs::read_to_string(dest.join("b.txt")).unwrap(), "xz content");
}

#[test]
fn stream_try_extract_corrupt_gzip_leaves_no_partial_output() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("broken.txt.gz");
    std::fs::write(&archive_path, b"definitely not gzip").unwrap();

    let dest = temp_dir.path().join("out");
    let err = StreamExtractor::try_extract(&archive_path, &dest, ArchiveFormat::Gzip).unwrap_err();

    assert!(err.is_extraction_failure());
    assert!(!dest.join("broken.txt").exists());
}

#[test]
fn stream_try_extract_rejects_container_format() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("x.zip");
    std::fs::write(&archive_path, b"irrelevant").unwrap();

    let result =
        StreamExtractor::try_extract(&archive_path, &temp_dir.path().join("o"), ArchiveFormat::Zip);
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// External fallback
// ---------------------------------------------------------------------------

#[test]
fn external_from_path_uses_which_result() {
    let expected = SEVEN_ZIP_BINARIES
        .iter()
        .find_map(|name| which::which(name).ok());
    let found = ExternalExtractor::from_path();

    match expected {
        Some(path) => assert_eq!(found.unwrap().binary_path(), path.as_path()),
        None => assert!(found.is_none()),
    }
}

#[test]
fn external_missing_binary_returns_external_tool_error() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("disk.iso");
    std::fs::write(&archive_path, b"iso").unwrap();

    let extractor = ExternalExtractor::new(PathBuf::from("/nonexistent/bin/7z-xyz"));
    let err = extractor
        .try_extract(&archive_path, &temp_dir.path().join("out"))
        .unwrap_err();
    assert!(matches!(err, Error::ExternalTool(_)), "got: {err:?}");
}

// ---------------------------------------------------------------------------
// NativeExtractor dispatch
// ---------------------------------------------------------------------------

#[test]
fn native_dispatches_by_suffix() {
    let temp_dir = TempDir::new().unwrap();
    let jar = temp_dir.path().join("lib.jar");
    create_zip_archive(&jar, &[("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0")]);

    let dest = temp_dir.path().join("lib.unpack-jar");
    let files = NativeExtractor::native_only().extract(&jar, &dest).unwrap();

    assert_eq!(files, vec![dest.join("META-INF/MANIFEST.MF")]);
}

#[test]
fn native_unknown_suffix_is_unsupported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("notes.txt");
    std::fs::write(&path, b"plain").unwrap();

    match NativeExtractor::native_only().extract(&path, &temp_dir.path().join("out")) {
        Err(Error::Extraction(ExtractionError::UnsupportedFormat { archive })) => {
            assert_eq!(archive, path);
        }
        other => panic!("expected UnsupportedFormat, got: {other:?}"),
    }
}

#[test]
fn native_only_rejects_formats_without_decoder() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("old.zoo");
    std::fs::write(&path, b"zoo").unwrap();

    let extractor = NativeExtractor::native_only();
    assert!(!extractor.supports(ArchiveFormat::Other));
    assert!(extractor.supports(ArchiveFormat::Rar));
    assert_eq!(extractor.name(), "native");

    let err = extractor.extract(&path, &temp_dir.path().join("out")).unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::UnsupportedFormat { .. })
    ));
}

#[test]
fn native_with_external_supports_everything() {
    let extractor = NativeExtractor::with_external(ExternalExtractor::new(PathBuf::from("7z")));
    assert!(extractor.supports(ArchiveFormat::Other));
    assert_eq!(extractor.name(), "native+7z");
}
