//! Per-column binary file I/O.
//!
//! Each column is exactly `rows` little-endian `f64` values starting at
//! offset 0, no header. `FileStore` mints file names under a caller-chosen
//! directory/prefix and performs whole-column or positional-slice I/O.
//! Cross-machine portability of the byte layout is not a goal — the same
//! process that writes a file is expected to be the one that reads it back.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{BufmatError, BufmatResult};

const BYTES_PER_VALUE: usize = std::mem::size_of::<f64>();

/// Mints and operates on per-column binary files under a directory/prefix.
pub struct FileStore {
    directory: PathBuf,
    prefix: String,
    next_suffix: AtomicU64,
}

impl FileStore {
    /// Create a store rooted at `directory`, minting file names as
    /// `{prefix}{suffix}.bmx`.
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            next_suffix: AtomicU64::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn set_directory(&mut self, directory: PathBuf) {
        self.directory = directory;
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Mint a file name that does not currently exist in `directory`.
    ///
    /// Re-checks the filesystem on every attempt so a directory that already
    /// has files from a prior run (or another store sharing the directory
    /// with a different prefix) cannot collide silently.
    fn mint_path(&self) -> PathBuf {
        loop {
            let suffix = self.next_suffix.fetch_add(1, Ordering::Relaxed);
            let candidate = self.directory.join(format!("{}{:016x}.bmx", self.prefix, suffix));
            if !candidate.exists() {
                return candidate;
            }
        }
    }

    /// Create a new column file of `rows` zeroed doubles, returning its path.
    pub fn create_zero(&self, rows: usize) -> BufmatResult<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.mint_path();
        let zeros = vec![0.0f64; rows];
        self.write_whole(&path, &zeros)?;
        tracing::trace!(path = %path.display(), rows, "created zero-filled column file");
        Ok(path)
    }

    /// Read all `buf.len()` rows from `path`, starting at offset 0.
    pub fn read_whole(&self, path: &Path, buf: &mut [f64]) -> BufmatResult<()> {
        self.read_slice(path, 0, buf)
    }

    /// Overwrite all of `path` with `buf`, starting at offset 0.
    pub fn write_whole(&self, path: &Path, buf: &[f64]) -> BufmatResult<()> {
        let mut file = OpenOptions::new().write(true).create(true).open(path)?;
        file.set_len((buf.len() * BYTES_PER_VALUE) as u64)?;
        write_slice_to(&mut file, 0, buf)?;
        tracing::trace!(path = %path.display(), rows = buf.len(), "wrote whole column");
        Ok(())
    }

    /// Read `buf.len()` rows from `path` starting at row `offset_rows`.
    pub fn read_slice(&self, path: &Path, offset_rows: usize, buf: &mut [f64]) -> BufmatResult<()> {
        let mut file = File::open(path)?;
        read_slice_from(&mut file, offset_rows, buf)
    }

    /// Write `buf` into `path` starting at row `offset_rows`, without
    /// touching the rest of the file.
    pub fn write_slice(&self, path: &Path, offset_rows: usize, buf: &[f64]) -> BufmatResult<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;
        write_slice_to(&mut file, offset_rows, buf)?;
        tracing::trace!(
            path = %path.display(),
            offset_rows,
            rows = buf.len(),
            "wrote column slice"
        );
        Ok(())
    }

    /// Move the file at `path` into `new_dir`, minting a fresh name there.
    /// Returns the new path.
    pub fn rename(&self, path: &Path, new_dir: &Path) -> BufmatResult<PathBuf> {
        fs::create_dir_all(new_dir)?;
        let mut suffix = self.next_suffix.load(Ordering::Relaxed);
        let new_path = loop {
            let candidate = new_dir.join(format!("{}{:016x}.bmx", self.prefix, suffix));
            suffix += 1;
            if !candidate.exists() {
                break candidate;
            }
        };
        self.next_suffix.store(suffix, Ordering::Relaxed);
        match fs::rename(path, &new_path) {
            Ok(()) => {}
            // Cross-device rename: fall back to copy + remove.
            Err(_) => {
                fs::copy(path, &new_path)?;
                fs::remove_file(path)?;
            }
        }
        tracing::debug!(from = %path.display(), to = %new_path.display(), "moved column file");
        Ok(new_path)
    }

    /// Delete the file at `path`.
    pub fn delete(&self, path: &Path) -> BufmatResult<()> {
        fs::remove_file(path)?;
        tracing::trace!(path = %path.display(), "deleted column file");
        Ok(())
    }
}

fn read_slice_from(file: &mut File, offset_rows: usize, buf: &mut [f64]) -> BufmatResult<()> {
    file.seek(SeekFrom::Start((offset_rows * BYTES_PER_VALUE) as u64))?;
    let mut raw = vec![0u8; buf.len() * BYTES_PER_VALUE];
    let read = file.read(&mut raw)?;
    if read != raw.len() {
        return Err(BufmatError::ShortRead {
            expected: raw.len(),
            actual: read,
        });
    }
    for (chunk, out) in raw.chunks_exact(BYTES_PER_VALUE).zip(buf.iter_mut()) {
        let mut bytes = [0u8; BYTES_PER_VALUE];
        bytes.copy_from_slice(chunk);
        *out = f64::from_le_bytes(bytes);
    }
    Ok(())
}

fn write_slice_to(file: &mut File, offset_rows: usize, buf: &[f64]) -> BufmatResult<()> {
    file.seek(SeekFrom::Start((offset_rows * BYTES_PER_VALUE) as u64))?;
    let mut raw = Vec::with_capacity(buf.len() * BYTES_PER_VALUE);
    for v in buf {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    file.write_all(&raw)?;
    Ok(())
}
