use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::RecorderError;

/// SHA-256 hex digest of a file, read in fixed-size blocks.
pub fn sha256_file(path: &Path) -> Result<String, RecorderError> {
    let mut file = File::open(path)
        .map_err(|e| RecorderError::FileError(format!("failed to open file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut block)
            .map_err(|e| RecorderError::FileError(format!("failed to read file for checksum: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
