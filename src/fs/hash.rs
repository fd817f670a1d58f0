// src/fs/hash.rs

//! Content digests used to skip copies whose destination is already current.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;

use crate::fs::FileSystem;

/// Compute the hex digest of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading {:?} for hashing", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// True when `dest` exists and has exactly the same content as `src`.
///
/// Any read error counts as "not identical" so the caller falls back to
/// copying.
pub fn same_content(fs: &dyn FileSystem, src: &Path, dest: &Path) -> bool {
    if !fs.is_file(dest) {
        return false;
    }
    match (compute_file_hash(fs, src), compute_file_hash(fs, dest)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::path::PathBuf;

    #[test]
    fn hashes_file_contents_with_blake3() {
        let fs = MockFileSystem::new();
        fs.add_file("test.txt", b"hello world");

        let hash = compute_file_hash(&fs, &PathBuf::from("test.txt")).unwrap();
        assert_eq!(
            hash,
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn same_content_requires_an_existing_identical_destination() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.js", b"var a;");
        fs.add_file("./b.js", b"var a;");
        fs.add_file("./c.js", b"var c;");

        assert!(same_content(&fs, Path::new("./a.js"), Path::new("./b.js")));
        assert!(!same_content(&fs, Path::new("./a.js"), Path::new("./c.js")));
        assert!(!same_content(&fs, Path::new("./a.js"), Path::new("./missing.js")));
    }
}
