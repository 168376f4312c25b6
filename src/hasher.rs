//! This module contains functions for hashing files and checking if an installed copy is current.
use crate::error::{InstallError, Result};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Hashes a file and returns the hash as a lowercase hex string.
/// # Arguments
/// * `path` - The path of the file to hash.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| hash_error(path, e))?;
    let mut buffer = vec![0; CHUNK_SIZE];
    let mut hasher = Sha1::new();

    loop {
        let read = file.read(&mut buffer).map_err(|e| hash_error(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[0..read]);
    }
    let result = hasher.finalize();
    let mut hash = String::with_capacity(result.len() * 2);
    for byte in result {
        hash.push_str(&format!("{:02x}", byte));
    }
    Ok(hash)
}

/// Checks whether two files hold the same content.
/// Files of different length are never hashed.
/// Errors name whichever of the two files could not be read.
/// # Arguments
/// * `source` - The file about to be installed.
/// * `target` - The installed copy.
pub fn same_content(source: &Path, target: &Path) -> Result<bool> {
    let source_len = source.metadata().map_err(|e| hash_error(source, e))?.len();
    let target_len = target.metadata().map_err(|e| hash_error(target, e))?.len();
    if source_len != target_len {
        return Ok(false);
    }
    Ok(hash_file(source)? == hash_file(target)?)
}

fn hash_error(path: &Path, source: std::io::Error) -> InstallError {
    InstallError::Io {
        action: "hash",
        path: path.to_path_buf(),
        source,
    }
}
