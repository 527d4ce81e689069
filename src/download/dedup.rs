//! Collision-safe writer.
//!
//! A write never replaces an existing file. When the target name is taken the
//! writer walks the alternate-name chain (`img.jpg`, `img (1).jpg`,
//! `img (2).jpg`, ...) until it reaches either a free name, where the bytes
//! are stored, or a file with identical content, in which case nothing is
//! stored because the content is already present.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::paths;

const COMPARE_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The bytes were stored at this path.
    Written(PathBuf),
    /// Identical content already exists at this path; nothing was written.
    Duplicate { of: PathBuf },
}

/// Store `bytes` at `path` or the first free alternate of it, unless the
/// same content is already stored somewhere along that chain.
pub async fn write_safely(path: &Path, bytes: &[u8]) -> std::io::Result<WriteOutcome> {
    let mut candidate = path.to_path_buf();

    // Invariant: every name visited before `candidate` is occupied by content
    // different from `bytes`.
    loop {
        if !fs::try_exists(&candidate).await? {
            match write_new(&candidate, bytes).await {
                Ok(()) => {
                    tracing::debug!("Wrote {}", candidate.display());
                    return Ok(WriteOutcome::Written(candidate));
                }
                // Someone created it between the check and the open; compare instead.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }

        if same_content(&candidate, bytes).await? {
            tracing::info!(
                "Skipped duplicate of {} ({} bytes)",
                candidate.display(),
                bytes.len()
            );
            return Ok(WriteOutcome::Duplicate { of: candidate });
        }

        candidate = paths::alternate_path(&candidate);
    }
}

/// Create `path` (failing if it exists) and write `bytes` to it. A partially
/// written file is removed before the error is returned.
async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let result = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = result {
        drop(file);
        let _ = fs::remove_file(path).await;
        return Err(e);
    }
    Ok(())
}

/// Byte-for-byte comparison of the file at `path` with `expected`.
///
/// Anything that is not a regular file never matches.
pub async fn same_content(path: &Path, expected: &[u8]) -> std::io::Result<bool> {
    let metadata = fs::metadata(path).await?;
    if !metadata.is_file() || metadata.len() != expected.len() as u64 {
        return Ok(false);
    }

    let mut file = fs::File::open(path).await?;
    let mut buf = vec![0u8; COMPARE_CHUNK_SIZE];
    let mut offset = 0usize;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(offset == expected.len());
        }
        let end = offset + n;
        if end > expected.len() || buf[..n] != expected[offset..end] {
            return Ok(false);
        }
        offset = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("gphotos_sync_tests")
            .join("dedup")
            .join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_write_to_free_path() {
        let dir = test_dir("free");
        let p = dir.join("img.jpg");
        let outcome = write_safely(&p, b"A").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Written(p.clone()));
        assert_eq!(std::fs::read(&p).unwrap(), b"A");
    }

    #[tokio::test]
    async fn test_identical_collision_keeps_single_copy() {
        let dir = test_dir("identical");
        let p = dir.join("img.jpg");
        write_safely(&p, b"A").await.unwrap();
        let outcome = write_safely(&p, b"A").await.unwrap();

        assert_eq!(outcome, WriteOutcome::Duplicate { of: p.clone() });
        assert_eq!(file_names(&dir), vec!["img.jpg"]);
        assert_eq!(std::fs::read(&p).unwrap(), b"A");
    }

    #[tokio::test]
    async fn test_distinct_collision_keeps_both() {
        let dir = test_dir("distinct");
        let p = dir.join("img.jpg");
        write_safely(&p, b"A").await.unwrap();
        let outcome = write_safely(&p, b"B").await.unwrap();

        let alt = dir.join("img (1).jpg");
        assert_eq!(outcome, WriteOutcome::Written(alt.clone()));
        assert_eq!(std::fs::read(&p).unwrap(), b"A");
        assert_eq!(std::fs::read(&alt).unwrap(), b"B");
    }

    #[tokio::test]
    async fn test_chain_dedups_against_original() {
        let dir = test_dir("chain_original");
        let p = dir.join("img.jpg");
        write_safely(&p, b"A").await.unwrap();
        write_safely(&p, b"B").await.unwrap();
        let outcome = write_safely(&p, b"A").await.unwrap();

        assert_eq!(outcome, WriteOutcome::Duplicate { of: p.clone() });
        assert_eq!(file_names(&dir), vec!["img (1).jpg", "img.jpg"]);
        assert_eq!(std::fs::read(dir.join("img (1).jpg")).unwrap(), b"B");
    }

    #[tokio::test]
    async fn test_chain_dedups_against_alternate() {
        let dir = test_dir("chain_alternate");
        let p = dir.join("img.jpg");
        write_safely(&p, b"A").await.unwrap();
        write_safely(&p, b"B").await.unwrap();
        let outcome = write_safely(&p, b"B").await.unwrap();

        assert_eq!(
            outcome,
            WriteOutcome::Duplicate {
                of: dir.join("img (1).jpg")
            }
        );
        assert_eq!(file_names(&dir), vec!["img (1).jpg", "img.jpg"]);
    }

    #[tokio::test]
    async fn test_chain_extends_for_new_content() {
        let dir = test_dir("chain_extend");
        let p = dir.join("img.jpg");
        let contents: [&[u8]; 5] = [b"A", b"B", b"C", b"B", b"A"];
        for content in contents {
            write_safely(&p, content).await.unwrap();
        }

        assert_eq!(
            file_names(&dir),
            vec!["img (1).jpg", "img (2).jpg", "img.jpg"]
        );
        assert_eq!(std::fs::read(dir.join("img (2).jpg")).unwrap(), b"C");
    }

    #[tokio::test]
    async fn test_same_length_different_bytes() {
        let dir = test_dir("same_length");
        let p = dir.join("clip.mp4");
        write_safely(&p, b"abcd").await.unwrap();
        let outcome = write_safely(&p, b"abce").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Written(dir.join("clip (1).mp4")));
    }

    #[tokio::test]
    async fn test_directory_in_the_way_is_skipped() {
        let dir = test_dir("dir_in_way");
        let p = dir.join("img.jpg");
        std::fs::create_dir(&p).unwrap();
        let outcome = write_safely(&p, b"A").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Written(dir.join("img (1).jpg")));
    }

    #[tokio::test]
    async fn test_same_content_large_file() {
        let dir = test_dir("large");
        let p = dir.join("big.bin");
        let data: Vec<u8> = (0..(COMPARE_CHUNK_SIZE * 3 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        std::fs::write(&p, &data).unwrap();
        assert!(same_content(&p, &data).await.unwrap());

        let mut altered = data.clone();
        let last = altered.len() - 1;
        altered[last] ^= 0xFF;
        assert!(!same_content(&p, &altered).await.unwrap());
        assert!(!same_content(&p, &data[..data.len() - 1]).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_content() {
        let dir = test_dir("empty");
        let p = dir.join("empty.txt");
        write_safely(&p, b"").await.unwrap();
        let outcome = write_safely(&p, b"").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Duplicate { of: p });
    }
}
