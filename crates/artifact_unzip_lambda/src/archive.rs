use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use zip::read::ZipFile;
use zip::ZipArchive;

use crate::runtime::error::JobError;

/// Forward-only reader over the entries of a zip artifact.
///
/// Entries come back in container order. Each [`ArchiveEntry`] mutably
/// borrows the archive, so the next entry can only be opened once the
/// previous reader has been dropped.
pub struct ArtifactArchive {
    archive: ZipArchive<File>,
    next_index: usize,
}

pub struct ArchiveEntry<'a> {
    name: String,
    size: u64,
    reader: ZipFile<'a>,
    read_error: Option<String>,
}

impl ArtifactArchive {
    pub fn open(path: &Path) -> Result<Self, JobError> {
        let file = File::open(path).map_err(|error| {
            JobError::extraction(format!(
                "failed to open artifact {}: {error}",
                path.display()
            ))
        })?;
        let archive = ZipArchive::new(file)
            .map_err(|error| JobError::extraction(format!("invalid zip artifact: {error}")))?;

        Ok(Self {
            archive,
            next_index: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    pub fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>, JobError>> {
        if self.next_index >= self.archive.len() {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;

        let entry = self
            .archive
            .by_index(index)
            .map(|reader| ArchiveEntry {
                name: reader.name().to_string(),
                size: reader.size(),
                reader,
                read_error: None,
            })
            .map_err(|error| {
                JobError::extraction(format!("failed to open zip entry #{index}: {error}"))
            });
        Some(entry)
    }
}

impl ArchiveEntry<'_> {
    /// Entry path exactly as recorded in the container.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// First decompression or checksum failure hit while reading the body.
    /// Consumers see these as plain `io::Error`s, so callers use this to tell
    /// a damaged entry apart from a failing sink.
    pub fn read_error(&self) -> Option<&str> {
        self.read_error.as_deref()
    }
}

impl Read for ArchiveEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.reader.read(buf);
        if let Err(error) = &result {
            self.read_error.get_or_insert_with(|| error.to_string());
        }
        result
    }
}
