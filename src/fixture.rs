//! On-disk source data for the memory-copy family
//!
//! A fixed, read-only byte payload loaded from a known relative path and
//! padded to a 64-byte multiple before use. The only persisted state the
//! harness touches

use std::fs;
use std::io;
use std::path::Path;

/// Path of the fixture relative to the crate root
pub const FIXTURE_PATH: &str = "data/sample_text.txt";

/// Load the fixture payload, padded with `.` bytes to a 64-byte multiple
pub fn load() -> io::Result<Vec<u8>> {
    load_from(Path::new(FIXTURE_PATH))
}

/// Load an arbitrary payload file with the same padding rule
pub fn load_from(path: &Path) -> io::Result<Vec<u8>> {
    let mut data = fs::read(path)?;

    while data.len() % 64 != 0 {
        data.push(b'.');
    }

    Ok(data)
}
