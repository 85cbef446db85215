//! Streaming SHA-256 content hashes.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Length of a hex-encoded SHA-256 digest.
pub const CONTENT_HASH_HEX_LEN: usize = 64;

/// Hash everything a reader yields, `buffer_size` bytes at a time.
///
/// Memory use is bounded by the buffer regardless of content size.
/// Returns the hex digest and the number of bytes read.
pub fn hash_reader<R: Read>(mut reader: R, buffer_size: usize) -> io::Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }
    Ok((hex::encode(hasher.finalize()), total))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path, buffer_size: usize) -> io::Result<(String, u64)> {
    let file = File::open(path)?;
    hash_reader(file, buffer_size)
}

/// Hash an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
