//! crates/dh_io/src/hasher.rs
//!
//! SHA-256 digests of the raw input files, so a report can name exactly which
//! bytes it was computed from. Hex digests are lowercase.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::LoadResult;

/// One input file and its digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputDigest {
    pub path: PathBuf,
    pub sha256: String,
}

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over a reader stream.
pub fn sha256_stream<R: Read>(reader: &mut R) -> LoadResult<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 of a file on disk.
pub fn sha256_file(path: &Path) -> LoadResult<InputDigest> {
    let mut reader = BufReader::new(File::open(path)?);
    Ok(InputDigest { path: path.to_path_buf(), sha256: sha256_stream(&mut reader)? })
}
