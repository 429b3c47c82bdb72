//! Archive fixtures authored at test time

use std::io::Write;
use std::path::Path;

/// `(entry name, content)` pairs; names may contain `/` for nested directories
pub type Entries<'a> = &'a [(&'a str, &'a [u8])];

pub fn zip_archive(path: &Path, entries: Entries<'_>) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

pub fn tar_archive(path: &Path, entries: Entries<'_>) {
    let file = std::fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(file);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.finish().unwrap();
}

pub fn gz_file(path: &Path, content: &[u8]) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap();
}

/// 7z archive of the given entries, staged through a scratch directory
pub fn sevenz_archive(path: &Path, entries: Entries<'_>) {
    let staging = tempfile::tempdir().unwrap();
    for (name, content) in entries {
        let file = staging.path().join(name);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }
    sevenz_rust::compress_to_path(staging.path(), path).unwrap();
}

/// Build an archive with `build` in a scratch directory and return its bytes
pub fn archive_bytes(file_name: &str, build: impl FnOnce(&Path)) -> Vec<u8> {
    let scratch = tempfile::tempdir().unwrap();
    let path = scratch.path().join(file_name);
    build(&path);
    std::fs::read(path).unwrap()
}
