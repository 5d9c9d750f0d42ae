use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;
use zipscan::{ErrorScope, ScanConfig};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Build a deflated archive with the given entries, in order.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    zip_bytes_with(CompressionMethod::Deflated, entries)
}

pub fn zip_bytes_with(method: CompressionMethod, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn write_zip(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, zip_bytes(entries)).unwrap();
    path
}

/// Flip one byte inside the first occurrence of `marker`.
pub fn corrupt(bytes: &mut [u8], marker: &[u8]) {
    let at = bytes
        .windows(marker.len())
        .position(|w| w == marker)
        .expect("marker present");
    bytes[at] ^= 0x20;
}

pub fn config(folder: &Path, output: &Path, filter: &str) -> ScanConfig {
    ScanConfig {
        folder: folder.to_path_buf(),
        filter: filter.to_string(),
        output: output.to_path_buf(),
        entry_suffix: "definition.json".to_string(),
        extension: ".zip".to_string(),
        error_scope: ErrorScope::Archive,
    }
}
